//! Atomic file writes for the persisted output file
//!
//! Content is written to a temporary file in the target directory, fsynced,
//! and renamed over the destination. A reader never observes a partially
//! written output file, and an interrupted run leaves the previous content
//! (or no file) in place.
//!
//! Unlike receipt-style writers, content is persisted byte-for-byte: line
//! endings are not normalized because the output is handed to downstream
//! tooling as the model produced it.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Number of rename retries that occurred (Windows only)
    pub rename_retry_count: u32,
    /// Bytes written to the destination
    pub bytes_written: usize,
}

/// Atomically write content to a file using temp file + fsync + rename.
///
/// Parent directories are created when missing. An existing file at `path`
/// is replaced.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();

    let temp_dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory: {parent}"))?;
            parent
        }
        _ => Utf8Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("Failed to create temporary file in: {temp_dir}"))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    let retry_count = atomic_rename(temp_file, path.as_std_path())
        .with_context(|| format!("Failed to atomically write file: {path}"))?;

    result.rename_retry_count = retry_count;
    result.bytes_written = content.len();
    if retry_count > 0 {
        warn!(
            path = %path,
            retries = retry_count,
            "Rename required retries due to transient filesystem locks"
        );
    }

    Ok(result)
}

/// Attempt atomic rename, retrying transient sharing violations.
///
/// Returns the number of retries that were needed. Total backoff stays
/// under 250ms.
#[cfg(target_os = "windows")]
fn atomic_rename(mut temp_file: NamedTempFile, target: &Path) -> Result<u32> {
    use std::io::ErrorKind;

    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;
    const MAX_TOTAL_DELAY_MS: u64 = 250;

    let mut retry_count = 0;
    let mut total_delay_ms = 0;

    loop {
        match temp_file.persist(target) {
            Ok(_) => return Ok(retry_count),
            Err(persist_error) => {
                if retry_count >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(persist_error.error));
                }

                let is_retryable = matches!(
                    persist_error.error.kind(),
                    ErrorKind::PermissionDenied | ErrorKind::Other
                );
                if !is_retryable {
                    return Err(anyhow::anyhow!(persist_error.error));
                }

                let delay_ms = INITIAL_DELAY_MS * 2_u64.pow(retry_count);
                if total_delay_ms + delay_ms > MAX_TOTAL_DELAY_MS {
                    let remaining = MAX_TOTAL_DELAY_MS.saturating_sub(total_delay_ms);
                    if remaining > 0 {
                        thread::sleep(Duration::from_millis(remaining));
                    }
                    return persist_error
                        .file
                        .persist(target)
                        .map(|_| retry_count + 1)
                        .map_err(|e| anyhow::anyhow!(e.error));
                }

                thread::sleep(Duration::from_millis(delay_ms));
                total_delay_ms += delay_ms;
                retry_count += 1;
                temp_file = persist_error.file;
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn atomic_rename(temp_file: NamedTempFile, target: &Path) -> Result<u32> {
    temp_file
        .persist(target)
        .map(|_| 0)
        .map_err(|e| anyhow::anyhow!(e.error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_temp_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_atomic_write_basic() {
        let temp_dir = create_temp_dir();
        let path_buf = temp_dir.path().join("output.md");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        let content = "Hello world\nsecond line";
        let write_result = write_file_atomic(file_path, content).unwrap();

        assert_eq!(write_result.rename_retry_count, 0);
        assert_eq!(write_result.bytes_written, content.len());

        let read_content = fs::read_to_string(file_path.as_std_path()).unwrap();
        assert_eq!(read_content, content);
    }

    #[test]
    fn test_atomic_write_preserves_line_endings() {
        let temp_dir = create_temp_dir();
        let path_buf = temp_dir.path().join("crlf.txt");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        write_file_atomic(file_path, "line1\r\nline2\r").unwrap();

        let read_content = fs::read_to_string(file_path.as_std_path()).unwrap();
        assert_eq!(read_content, "line1\r\nline2\r");
    }

    #[test]
    fn test_atomic_write_creates_parent_directory() {
        let temp_dir = create_temp_dir();
        let path_buf = temp_dir.path().join("nested").join("dir").join("out.txt");
        let nested_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        write_file_atomic(nested_path, "content").unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_atomic_write_overwrites_existing() {
        let temp_dir = create_temp_dir();
        let path_buf = temp_dir.path().join("overwrite.txt");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        write_file_atomic(file_path, "a much longer initial content").unwrap();
        write_file_atomic(file_path, "new").unwrap();

        let read_content = fs::read_to_string(file_path.as_std_path()).unwrap();
        assert_eq!(read_content, "new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = create_temp_dir();
        let path_buf = temp_dir.path().join("only.txt");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        write_file_atomic(file_path, "x").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_atomic_write_unicode_content() {
        let temp_dir = create_temp_dir();
        let path_buf = temp_dir.path().join("unicode.txt");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        let unicode_content = "こんにちは 世界 🌍";
        write_file_atomic(file_path, unicode_content).unwrap();

        let read_content = fs::read_to_string(file_path.as_std_path()).unwrap();
        assert_eq!(read_content, unicode_content);
    }
}
