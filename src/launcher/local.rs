// Local-process launcher: temp script artifact + blocking child process

use crate::errors::RunnerError;
use crate::launcher::{ScriptKind, ScriptLauncher};
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, instrument};

/// Runs scripts on the controller machine itself.
///
/// The script is written to a temp artifact inside the working directory,
/// executed with the platform's interpreter convention, and removed when the
/// call returns, on every exit path.
#[derive(Debug, Default)]
pub struct LocalLauncher;

impl LocalLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptLauncher for LocalLauncher {
    fn script_exists(&self, path: &str) -> Result<bool, RunnerError> {
        Ok(Path::new(path).exists())
    }

    fn read_script(&self, path: &str) -> Result<String, RunnerError> {
        std::fs::read_to_string(path)
            .map_err(|e| RunnerError::Io(format!("Failed to read script file '{}': {}", path, e)))
    }

    #[instrument(skip(self, script, sink), fields(kind = ?kind, cwd = %cwd.display()))]
    fn launch(
        &self,
        script: &str,
        kind: ScriptKind,
        cwd: &Path,
        sink: &mut dyn Write,
    ) -> Result<i32, RunnerError> {
        let mut artifact = tempfile::Builder::new()
            .prefix("script-trigger-")
            .suffix(kind.file_extension())
            .tempfile_in(cwd)
            .map_err(|e| RunnerError::Io(format!("Failed to create script artifact: {}", e)))?;
        artifact
            .write_all(script.as_bytes())
            .and_then(|_| artifact.flush())
            .map_err(|e| RunnerError::Io(format!("Failed to write script artifact: {}", e)))?;

        let artifact_path = artifact.path().display().to_string();
        let command_line = kind.command_line(&artifact_path);
        debug!(command = ?command_line, "Launching script process");

        let mut child = Command::new(&command_line[0])
            .args(&command_line[1..])
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunnerError::Spawn(e.to_string()))?;

        // Drain the pipes on dedicated threads to avoid pipe-buffer deadlocks
        // while blocking on the child
        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();
        let stdout_thread = std::thread::spawn(move || -> String {
            let mut buf = String::new();
            if let Some(mut r) = stdout_handle {
                let _ = r.read_to_string(&mut buf);
            }
            buf
        });
        let stderr_thread = std::thread::spawn(move || -> String {
            let mut buf = String::new();
            if let Some(mut r) = stderr_handle {
                let _ = r.read_to_string(&mut buf);
            }
            buf
        });

        let status = child
            .wait()
            .map_err(|e| RunnerError::Interrupted(e.to_string()))?;

        let stdout_buf = stdout_thread.join().unwrap_or_default();
        let stderr_buf = stderr_thread.join().unwrap_or_default();
        sink.write_all(stdout_buf.as_bytes())?;
        sink.write_all(stderr_buf.as_bytes())?;

        // The temp artifact is removed when `artifact` drops, including on
        // the error paths above
        match status.code() {
            Some(code) => Ok(code),
            None => Err(RunnerError::Interrupted(
                "The script process was terminated by a signal before exiting.".to_string(),
            )),
        }
    }
}
