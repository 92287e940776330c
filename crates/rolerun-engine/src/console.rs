//! Console and log sinks
//!
//! Every user-facing line of a run goes through a [`Console`]: stdout for
//! streamed text and announcements, stderr for warnings and errors, and an
//! optional append-only log file that mirrors the streamed text plus retry
//! and error lines. Each write is flushed immediately so a `tail -f` on the
//! log follows the stream live.
//!
//! The log handle is owned here and released when the console is dropped or
//! [`Console::close_log`] is called, on every exit path.

use std::fs::OpenOptions;
use std::io::{self, Write};

use camino::Utf8Path;
use tracing::debug;

type Sink = Box<dyn Write + Send>;

pub struct Console {
    stdout: Sink,
    stderr: Sink,
    log: Option<Sink>,
}

impl Console {
    pub fn new(stdout: impl Write + Send + 'static, stderr: impl Write + Send + 'static) -> Self {
        Self {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            log: None,
        }
    }

    /// Console bound to the process's standard streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Open `path` for appending (creating it if needed) and mirror output to
    /// it from now on.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened; the console keeps
    /// working without a log.
    pub fn open_log(&mut self, path: &Utf8Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path, "Opened streaming log");
        self.log = Some(Box::new(file));
        Ok(())
    }

    /// Mirror output to an arbitrary writer.
    pub fn attach_log(&mut self, log: impl Write + Send + 'static) {
        self.log = Some(Box::new(log));
    }

    #[cfg(test)]
    fn has_log(&self) -> bool {
        self.log.is_some()
    }

    /// Flush and release the log handle.
    pub fn close_log(&mut self) {
        if let Some(mut log) = self.log.take() {
            let _ = log.flush();
        }
    }

    /// Streamed model text: stdout and log, no newline added.
    pub fn stream(&mut self, text: &str) {
        write_flushed(&mut self.stdout, text, "stdout");
        self.log_raw(text);
    }

    /// A line on stdout only.
    pub fn out_line(&mut self, line: &str) {
        write_flushed(&mut self.stdout, &format!("{line}\n"), "stdout");
    }

    /// A line on stderr only.
    pub fn err_line(&mut self, line: &str) {
        write_flushed(&mut self.stderr, &format!("{line}\n"), "stderr");
    }

    /// A line on stdout, mirrored to the log.
    pub fn announce(&mut self, line: &str) {
        self.out_line(line);
        self.log_raw(&format!("{line}\n"));
    }

    /// A line on stderr, mirrored to the log.
    pub fn report(&mut self, line: &str) {
        self.err_line(line);
        self.log_raw(&format!("{line}\n"));
    }

    fn log_raw(&mut self, text: &str) {
        if let Some(log) = self.log.as_mut() {
            write_flushed(log, text, "log");
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.close_log();
        let _ = self.stdout.flush();
        let _ = self.stderr.flush();
    }
}

fn write_flushed(sink: &mut Sink, text: &str, name: &str) {
    if let Err(e) = sink.write_all(text.as_bytes()).and_then(|()| sink.flush()) {
        debug!(sink = name, error = %e, "Console write failed");
    }
}

/// Append a single line to `path` without keeping it open.
///
/// # Errors
///
/// Returns the I/O error from opening or writing the file.
pub fn append_line(path: &Utf8Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SharedBuffer;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn console() -> (Console, SharedBuffer, SharedBuffer, SharedBuffer) {
        let (out, err, log) = (SharedBuffer::new(), SharedBuffer::new(), SharedBuffer::new());
        let mut console = Console::new(out.clone(), err.clone());
        console.attach_log(log.clone());
        (console, out, err, log)
    }

    #[test]
    fn test_stream_goes_to_stdout_and_log() {
        let (mut console, out, err, log) = console();
        console.stream("He");
        console.stream("llo");
        assert_eq!(out.contents(), "Hello");
        assert_eq!(log.contents(), "Hello");
        assert_eq!(err.contents(), "");
    }

    #[test]
    fn test_line_routing() {
        let (mut console, out, err, log) = console();
        console.out_line("[Auth] mode");
        console.err_line("[Warning] careful");
        console.announce("[Retry] again");
        console.report("[Error] broke");

        assert_eq!(out.contents(), "[Auth] mode\n[Retry] again\n");
        assert_eq!(err.contents(), "[Warning] careful\n[Error] broke\n");
        assert_eq!(log.contents(), "[Retry] again\n[Error] broke\n");
    }

    #[test]
    fn test_without_log_nothing_is_mirrored() {
        let (out, err) = (SharedBuffer::new(), SharedBuffer::new());
        let mut console = Console::new(out.clone(), err);
        assert!(!console.has_log());
        console.announce("x");
        assert_eq!(out.contents(), "x\n");
    }

    #[test]
    fn test_open_log_appends() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("run.log")).unwrap();
        std::fs::write(&path, "earlier\n").unwrap();

        let mut console = Console::new(SharedBuffer::new(), SharedBuffer::new());
        console.open_log(&path).unwrap();
        console.stream("chunk");
        drop(console);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nchunk");
    }

    #[test]
    fn test_open_log_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("no/such/dir/run.log")).unwrap();
        let mut console = Console::new(SharedBuffer::new(), SharedBuffer::new());
        assert!(console.open_log(&path).is_err());
        assert!(!console.has_log());
    }

    #[test]
    fn test_append_line() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("skip.log")).unwrap();
        append_line(&path, "one").unwrap();
        append_line(&path, "two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
