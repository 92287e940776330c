use std::fmt;

use camino::Utf8Path;

use crate::reader::{read_file_reporting, read_file_safe};

/// Separator placed between rendered sections
pub const SECTION_SEPARATOR: &str = "\n\n";

/// One input file's contribution to the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSection {
    /// File name without directories
    pub name: String,
    /// Trimmed, non-empty content
    pub content: String,
}

impl ContextSection {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    fn from_path(path: &Utf8Path, content: String) -> Self {
        let name = path.file_name().unwrap_or(path.as_str());
        Self::new(name, content)
    }
}

impl fmt::Display for ContextSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "=== {} ===\n{}", self.name, self.content)
    }
}

/// Collect a section for every input that has content, preserving order.
/// Unreadable files are warned about on stderr.
pub fn assemble_sections<P: AsRef<Utf8Path>>(paths: &[P]) -> Vec<ContextSection> {
    paths
        .iter()
        .filter_map(|path| {
            let path = path.as_ref();
            read_file_safe(path).map(|content| ContextSection::from_path(path, content))
        })
        .collect()
}

/// [`assemble_sections`] with read warnings routed to `report`.
pub fn assemble_sections_reporting<P: AsRef<Utf8Path>>(
    paths: &[P],
    report: &mut dyn FnMut(&str),
) -> Vec<ContextSection> {
    let mut sections = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        if let Some(content) = read_file_reporting(path, report) {
            sections.push(ContextSection::from_path(path, content));
        }
    }
    tracing::debug!(
        inputs = paths.len(),
        sections = sections.len(),
        "Assembled context sections"
    );
    sections
}

/// Render sections into the final context string, or `None` when there are
/// none.
#[must_use]
pub fn render_sections(sections: &[ContextSection]) -> Option<String> {
    if sections.is_empty() {
        return None;
    }
    let rendered: Vec<String> = sections.iter().map(ToString::to_string).collect();
    Some(rendered.join(SECTION_SEPARATOR))
}

/// Build the context string for `paths`. `None` means no input had content.
pub fn build_context<P: AsRef<Utf8Path>>(paths: &[P]) -> Option<String> {
    render_sections(&assemble_sections(paths))
}
