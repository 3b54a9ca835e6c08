use std::process::ExitCode;

/// Exit status for CLI commands.
///
/// - `Success` (0): Every input was processed
/// - `Error` (2): Command failed (unreadable input, import or export failure, config error)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
