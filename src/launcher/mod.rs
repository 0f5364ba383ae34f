// Command-execution capability for execution targets

pub mod local;
pub mod ssh;

use crate::errors::RunnerError;
use crate::models::TargetPlatform;
use std::io::Write;
use std::path::Path;

pub use local::LocalLauncher;
pub use ssh::{SshAuth, SshLauncher};

/// Script artifact convention for a target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// POSIX shell script, run with `sh -xe`
    Shell,
    /// Windows batch file, run with `cmd /c call`
    Batch,
}

impl ScriptKind {
    pub fn for_platform(platform: TargetPlatform) -> Self {
        match platform {
            TargetPlatform::Posix => ScriptKind::Shell,
            TargetPlatform::Windows => ScriptKind::Batch,
        }
    }

    /// File extension of the temp script artifact, dot included.
    pub fn file_extension(&self) -> &'static str {
        match self {
            ScriptKind::Shell => ".sh",
            ScriptKind::Batch => ".bat",
        }
    }

    /// Command line that executes the artifact at `script_path`.
    pub fn command_line(&self, script_path: &str) -> Vec<String> {
        match self {
            ScriptKind::Shell => vec![
                "/bin/sh".to_string(),
                "-xe".to_string(),
                script_path.to_string(),
            ],
            ScriptKind::Batch => vec![
                "cmd".to_string(),
                "/c".to_string(),
                "call".to_string(),
                script_path.to_string(),
            ],
        }
    }
}

/// Abstract "run a script on this target" capability.
///
/// The runner's logic is identical for local and remote targets; only where
/// the filesystem checks and the process spawn happen differs. Implementations
/// write a cycle-scoped script artifact, execute it with the given working
/// directory, stream output to the sink, block until exit, and remove the
/// artifact on every exit path.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptLauncher: Send + Sync {
    /// Whether `path` exists on the target's filesystem.
    fn script_exists(&self, path: &str) -> Result<bool, RunnerError>;

    /// Full text content of `path`, read from the target's filesystem with
    /// original line breaks preserved.
    fn read_script(&self, path: &str) -> Result<String, RunnerError>;

    /// Execute `script` as an artifact of the given kind, with `cwd` as the
    /// working directory, and return the process exit code.
    fn launch(
        &self,
        script: &str,
        kind: ScriptKind,
        cwd: &Path,
        sink: &mut dyn Write,
    ) -> Result<i32, RunnerError>;
}
