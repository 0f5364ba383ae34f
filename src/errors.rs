// Error handling framework for the polling engine

use thiserror::Error;

/// Errors produced while evaluating one polling cycle
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Invalid trigger configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Script execution errors
///
/// An exit-code mismatch is not an error: the script ran and the condition
/// simply was not met. Every variant here means the condition could not be
/// evaluated at all, and the cycle must fail rather than report "no change".
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The script file path '{0}' doesn't exist.")]
    ScriptNotFound(String),

    #[error("Script I/O failed: {0}")]
    Io(String),

    #[error("Failed to spawn script process: {0}")]
    Spawn(String),

    #[error("Script execution interrupted: {0}")]
    Interrupted(String),

    #[error("SSH connection failed: {0}")]
    Connection(String),

    #[error("SSH authentication failed: {0}")]
    Authentication(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),
}

/// Variable substitution errors
#[derive(Error, Debug)]
pub enum SubstitutionError {
    #[error("Regex compilation error: {0}")]
    Regex(String),
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io(err.to_string())
    }
}
