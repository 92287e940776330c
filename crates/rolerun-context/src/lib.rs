//! Context assembly for rolerun
//!
//! Turns an ordered list of input files into the single user message sent
//! to the model. Each readable, non-blank file becomes one section:
//!
//! ```text
//! === notes.md ===
//! <trimmed file content>
//! ```
//!
//! Sections are joined with a blank line, in the order the caller gave.
//! Missing, empty and whitespace-only files are skipped silently; files that
//! exist but cannot be read are skipped with a warning. When no section
//! survives, there is nothing to send and the assembler returns `None`.

mod reader;
mod section;

pub use reader::{read_file_reporting, read_file_safe, read_trimmed};
pub use section::{
    ContextSection, SECTION_SEPARATOR, assemble_sections, assemble_sections_reporting,
    build_context, render_sections,
};
