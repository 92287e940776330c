use std::fs;
use std::io;

use camino::Utf8Path;

/// Read a file and trim it.
///
/// `Ok(None)` covers the "nothing here" cases: the path does not exist, the
/// file is zero bytes long, or it contains only whitespace. Any other I/O
/// failure, including invalid UTF-8, is returned as an error.
pub fn read_trimmed(path: &Utf8Path) -> io::Result<Option<String>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if metadata.is_file() && metadata.len() == 0 {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

/// Like [`read_trimmed`], but read failures are downgraded to a warning line
/// handed to `report` and the file is treated as absent.
pub fn read_file_reporting(path: &Utf8Path, report: &mut dyn FnMut(&str)) -> Option<String> {
    match read_trimmed(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "Skipping unreadable file");
            report(&format!("[Warning] Could not read {path}: {e}"));
            None
        }
    }
}

/// Read a file for use as prompt material, warning on stderr if it exists
/// but cannot be read.
pub fn read_file_safe(path: &Utf8Path) -> Option<String> {
    read_file_reporting(path, &mut |line| eprintln!("{line}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("nope.md");
        assert_eq!(read_trimmed(&path).unwrap(), None);
        assert_eq!(read_file_safe(&path), None);
    }

    #[test]
    fn test_empty_and_blank_files_are_absent() {
        let dir = TempDir::new().unwrap();
        let base = utf8_dir(&dir);
        fs::write(base.join("empty.md"), "").unwrap();
        fs::write(base.join("blank.md"), "  \n\t\n").unwrap();

        assert_eq!(read_file_safe(&base.join("empty.md")), None);
        assert_eq!(read_file_safe(&base.join("blank.md")), None);
    }

    #[test]
    fn test_content_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("role.md");
        fs::write(&path, "\n  You are a reviewer.\n\n").unwrap();
        assert_eq!(read_file_safe(&path).as_deref(), Some("You are a reviewer."));
    }

    #[test]
    fn test_unreadable_file_reports_warning() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("binary.bin");
        fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

        let mut warnings = Vec::new();
        let content = read_file_reporting(&path, &mut |line| warnings.push(line.to_string()));

        assert_eq!(content, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with(&format!("[Warning] Could not read {path}: ")));
    }

    #[test]
    fn test_directory_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);

        let mut warnings = Vec::new();
        assert_eq!(
            read_file_reporting(&path, &mut |line| warnings.push(line.to_string())),
            None
        );
        assert_eq!(warnings.len(), 1);
    }
}
