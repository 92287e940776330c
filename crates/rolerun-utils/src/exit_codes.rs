//! Exit code constants for rolerun.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Output generated and persisted |
//! | 1 | `FAILURE` | Missing role, no usable input, auth failure, retries exhausted |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments (reported by clap) |
//! | 130 | `INTERRUPTED` | Operator interrupt (SIGINT / SIGTERM) |

/// Exit codes matching the documented exit code table.
///
/// The numeric values are part of the public contract: callers such as
/// pipeline scripts branch on them.
///
/// ```rust
/// use rolerun_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::INTERRUPTED.as_i32(), 130);
/// assert_eq!(ExitCode::from_i32(0), ExitCode::SUCCESS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - output generated and persisted
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Any resolvable failure
    pub const FAILURE: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid or missing command-line arguments
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Operator interrupt
    pub const INTERRUPTED: ExitCode = ExitCode(130);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::FAILURE.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::INTERRUPTED.as_i32(), 130);
    }

    #[test]
    fn test_exit_code_conversions() {
        let raw: i32 = ExitCode::INTERRUPTED.into();
        assert_eq!(raw, 130);
        assert_eq!(ExitCode::from(1), ExitCode::FAILURE);
    }
}
