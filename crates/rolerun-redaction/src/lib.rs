//! Literal-value redaction for streamed output
//!
//! A [`RedactionSet`] is an ordered list of literal strings plus a single
//! replacement. It is built once per run and applied to every chunk that is
//! shown to a human (stdout) or written to the streaming log. The persisted
//! output file is never passed through it.
//!
//! # Replacement order
//!
//! Entries are replaced one after another in list order, each as a
//! whole-substring replacement over the result of the previous one. This is
//! deterministic but order-sensitive: when one entry is a substring of
//! another, whichever comes first in the list wins. There is no
//! longest-match resolution.
//!
//! Chunks are redacted independently, so a value split across two streamed
//! fragments is not caught.

mod error_message;

pub use error_message::redact_error_message;

/// Where a [`RedactionSet`] gets its inputs from.
///
/// Implemented by the configuration crate so this crate stays independent of
/// the concrete config type.
pub trait RedactionSource {
    /// Raw comma-separated list of values to mask
    fn redact_values(&self) -> Option<&str>;
    /// Replacement string
    fn redact_replacement(&self) -> &str;
    /// The API key in use, masked implicitly
    fn active_api_key(&self) -> Option<&str>;
}

/// Ordered, deduplicated set of literal values to mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionSet {
    values: Vec<String>,
    replacement: String,
}

impl RedactionSet {
    /// Build a set from explicit values. Entries are trimmed, empty entries
    /// dropped and duplicates removed, keeping first-seen order.
    pub fn new<I, S>(values: I, replacement: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            values: Vec::new(),
            replacement: replacement.into(),
        };
        for value in values {
            set.push(value.as_ref());
        }
        set
    }

    /// Build the run's set from configuration.
    ///
    /// The comma-separated list is parsed first; the active API key is then
    /// appended when present and not already listed, so the credential is
    /// never echoed even if the caller forgot to list it.
    pub fn from_config(source: &impl RedactionSource) -> Self {
        let listed = source.redact_values().unwrap_or_default().split(',');
        let mut set = Self::new(listed, source.redact_replacement());
        if let Some(key) = source.active_api_key() {
            set.push(key);
        }
        set
    }

    fn push(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() || self.values.iter().any(|v| v == value) {
            return;
        }
        self.values.push(value.to_string());
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Mask every entry in `text`. See [`redact`].
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        redact(text, self)
    }
}

/// Replace every entry of `set` in `text`, in list order.
///
/// Empty text or an empty set returns the text unchanged.
#[must_use]
pub fn redact(text: &str, set: &RedactionSet) -> String {
    if text.is_empty() || set.is_empty() {
        return text.to_string();
    }
    set.values
        .iter()
        .fold(text.to_string(), |masked, value| {
            masked.replace(value.as_str(), &set.replacement)
        })
}
