//! Programmatic construction of [`RunnerConfig`]
//!
//! Embedders and tests use the builder instead of going through the
//! environment.

use std::path::PathBuf;

use crate::model::RunnerConfig;

/// Builder for [`RunnerConfig`], starting from the defaults.
///
/// ```rust
/// use rolerun_config::RunnerConfigBuilder;
///
/// let config = RunnerConfigBuilder::new()
///     .api_key("test-key")
///     .redact_values("secret123")
///     .build();
/// assert_eq!(config.auth.api_key.as_deref(), Some("test-key"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn auth_mode(mut self, mode: impl Into<String>) -> Self {
        self.config.auth.mode = mode.into().trim().to_lowercase();
        self
    }

    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.auth.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.config.auth.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.config.auth.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.auth.credentials_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn ambient_project(mut self, project: impl Into<String>) -> Self {
        self.config.auth.ambient_project = Some(project.into());
        self
    }

    #[must_use]
    pub fn gcloud_config_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.auth.gcloud_config_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn redact_values(mut self, values: impl Into<String>) -> Self {
        self.config.redaction.values = Some(values.into());
        self
    }

    #[must_use]
    pub fn redact_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.config.redaction.replacement = replacement.into();
        self
    }

    #[must_use]
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    #[must_use]
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_starts_from_defaults() {
        assert_eq!(RunnerConfigBuilder::new().build(), RunnerConfig::default());
    }

    #[test]
    fn test_builder_normalizes_auth_mode() {
        let config = RunnerConfigBuilder::new().auth_mode("ADC").build();
        assert_eq!(config.auth.mode, "adc");
    }

    #[test]
    fn test_builder_sets_vertex_fields() {
        let config = RunnerConfigBuilder::new()
            .project("p")
            .location("global")
            .credentials_file("/tmp/c.json")
            .build();

        assert_eq!(config.auth.project.as_deref(), Some("p"));
        assert_eq!(config.auth.location_or_default(), "global");
        assert_eq!(config.auth.credentials_file, Some(PathBuf::from("/tmp/c.json")));
    }
}
