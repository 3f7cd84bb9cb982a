//! Typed errors for the OS-facing services.

use thiserror::Error;

/// One attempt at installing the keyboard hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAttempt {
    pub strategy: String,
    pub outcome: String,
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error(
        "failed to install keyboard hook (os error {os_code:#010x}); attempts: {}",
        format_attempts(.attempts)
    )]
    Registration {
        attempts: Vec<RegistrationAttempt>,
        os_code: i32,
    },
    #[error("keyboard hook is already installed in this process")]
    AlreadyInstalled,
    #[error("failed to start translator thread: {0}")]
    Worker(#[from] std::io::Error),
}

fn format_attempts(attempts: &[RegistrationAttempt]) -> String {
    if attempts.is_empty() {
        return "none".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{} => {}", a.strategy, a.outcome))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("audio endpoint unavailable: {0}")]
    Endpoint(String),
    #[error("volume call failed: {0}")]
    Call(String),
}

#[cfg(windows)]
impl From<windows::core::Error> for VolumeError {
    fn from(e: windows::core::Error) -> Self {
        VolumeError::Call(e.to_string())
    }
}
