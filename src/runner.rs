// Script runner: inline and file-path execution on an execution target

use crate::errors::RunnerError;
use crate::launcher::{ScriptKind, ScriptLauncher};
use crate::models::{EnvironmentSnapshot, ExecutionOutcome, ExecutionTarget};
use crate::poll_log::PollLog;
use crate::substitution::VariableSubstitutor;
use std::sync::Arc;
use tracing::instrument;

/// Executes trigger scripts on a target and reports the exit code.
///
/// Location-transparent: the same logic runs against a local or remote
/// launcher; the launcher decides where the filesystem reads and the process
/// spawn happen.
pub struct ScriptRunner {
    launcher: Arc<dyn ScriptLauncher>,
    substitutor: VariableSubstitutor,
}

impl ScriptRunner {
    pub fn new(launcher: Arc<dyn ScriptLauncher>) -> Self {
        Self {
            launcher,
            substitutor: VariableSubstitutor::default(),
        }
    }

    /// Run inline script text and return its exit code.
    ///
    /// `${VAR}` placeholders are resolved against the snapshot before
    /// execution; unresolved placeholders stay literal. The call blocks for
    /// the full duration of the script.
    #[instrument(skip_all, fields(target = %target.name))]
    pub fn run_inline(
        &self,
        target: &ExecutionTarget,
        script_content: &str,
        env: &EnvironmentSnapshot,
        log: &mut PollLog,
    ) -> Result<ExecutionOutcome, RunnerError> {
        if script_content.trim().is_empty() {
            return Err(RunnerError::InvalidArgument(
                "A script content must be set.".to_string(),
            ));
        }

        log.info("Resolving environment variables for the script content.");
        let resolved = self.substitutor.resolve(script_content, env);

        log.info(format!("Evaluating the script:\n{}", resolved));
        let kind = ScriptKind::for_platform(target.platform);
        let exit_code = self
            .launcher
            .launch(&resolved, kind, &target.root_dir, log)?;

        Ok(ExecutionOutcome { exit_code })
    }

    /// Run a script referenced by a path on the target's filesystem.
    ///
    /// Existence is evaluated where the script will run, not on the
    /// controller. The content is read with its original line breaks and
    /// then executed exactly like inline text.
    #[instrument(skip_all, fields(target = %target.name, path = %script_file_path))]
    pub fn run_path(
        &self,
        target: &ExecutionTarget,
        script_file_path: &str,
        env: &EnvironmentSnapshot,
        log: &mut PollLog,
    ) -> Result<ExecutionOutcome, RunnerError> {
        if script_file_path.trim().is_empty() {
            return Err(RunnerError::InvalidArgument(
                "The script file path must be set.".to_string(),
            ));
        }

        if !self.launcher.script_exists(script_file_path)? {
            log.info(format!(
                "Can't load the file '{}'. It doesn't exist.",
                script_file_path
            ));
            return Err(RunnerError::ScriptNotFound(script_file_path.to_string()));
        }

        let script_content = self.launcher.read_script(script_file_path)?;
        self.run_inline(target, &script_content, env, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::MockScriptLauncher;
    use crate::models::TargetPlatform;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn posix_target() -> ExecutionTarget {
        ExecutionTarget::new("worker-1", TargetPlatform::Posix, PathBuf::from("/work"))
    }

    #[test]
    fn test_run_inline_rejects_empty_script() {
        let runner = ScriptRunner::new(Arc::new(MockScriptLauncher::new()));
        let mut log = PollLog::in_memory();
        let err = runner
            .run_inline(&posix_target(), "  ", &HashMap::new(), &mut log)
            .unwrap_err();
        assert!(matches!(err, RunnerError::InvalidArgument(_)));
    }

    #[test]
    fn test_run_inline_resolves_macros_before_launch() {
        let mut launcher = MockScriptLauncher::new();
        launcher
            .expect_launch()
            .withf(|script, kind, cwd, _| {
                script == "exit 7" && *kind == ScriptKind::Shell && cwd == Path::new("/work")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(7));

        let runner = ScriptRunner::new(Arc::new(launcher));
        let mut env = HashMap::new();
        env.insert("CODE".to_string(), "7".to_string());
        let mut log = PollLog::in_memory();

        let outcome = runner
            .run_inline(&posix_target(), "exit ${CODE}", &env, &mut log)
            .unwrap();
        assert_eq!(outcome.exit_code, 7);
    }

    #[test]
    fn test_run_inline_leaves_unresolved_macros_literal() {
        let mut launcher = MockScriptLauncher::new();
        launcher
            .expect_launch()
            .withf(|script, _, _, _| script == "echo ${MISSING}")
            .times(1)
            .returning(|_, _, _, _| Ok(0));

        let runner = ScriptRunner::new(Arc::new(launcher));
        let mut log = PollLog::in_memory();
        runner
            .run_inline(&posix_target(), "echo ${MISSING}", &HashMap::new(), &mut log)
            .unwrap();
    }

    #[test]
    fn test_run_path_rejects_empty_path() {
        let runner = ScriptRunner::new(Arc::new(MockScriptLauncher::new()));
        let mut log = PollLog::in_memory();
        let err = runner
            .run_path(&posix_target(), "", &HashMap::new(), &mut log)
            .unwrap_err();
        assert!(matches!(err, RunnerError::InvalidArgument(_)));
    }

    #[test]
    fn test_run_path_missing_file_is_script_not_found() {
        let mut launcher = MockScriptLauncher::new();
        launcher
            .expect_script_exists()
            .withf(|path| path == "/opt/check.sh")
            .times(1)
            .returning(|_| Ok(false));
        launcher.expect_read_script().times(0);
        launcher.expect_launch().times(0);

        let runner = ScriptRunner::new(Arc::new(launcher));
        let mut log = PollLog::in_memory();
        let err = runner
            .run_path(&posix_target(), "/opt/check.sh", &HashMap::new(), &mut log)
            .unwrap_err();
        assert!(matches!(err, RunnerError::ScriptNotFound(_)));
        assert!(log
            .lines()
            .iter()
            .any(|l| l.contains("Can't load the file '/opt/check.sh'")));
    }

    #[test]
    fn test_run_path_reads_then_delegates_to_inline() {
        let mut launcher = MockScriptLauncher::new();
        launcher
            .expect_script_exists()
            .returning(|_| Ok(true));
        launcher
            .expect_read_script()
            .withf(|path| path == "/opt/check.sh")
            .times(1)
            .returning(|_| Ok("echo one\nexit 2\n".to_string()));
        launcher
            .expect_launch()
            .withf(|script, _, _, _| script == "echo one\nexit 2\n")
            .times(1)
            .returning(|_, _, _, _| Ok(2));

        let runner = ScriptRunner::new(Arc::new(launcher));
        let mut log = PollLog::in_memory();
        let outcome = runner
            .run_path(&posix_target(), "/opt/check.sh", &HashMap::new(), &mut log)
            .unwrap();
        assert_eq!(outcome.exit_code, 2);
    }

    #[test]
    fn test_run_inline_uses_batch_kind_on_windows_targets() {
        let mut launcher = MockScriptLauncher::new();
        launcher
            .expect_launch()
            .withf(|_, kind, _, _| *kind == ScriptKind::Batch)
            .times(1)
            .returning(|_, _, _, _| Ok(0));

        let runner = ScriptRunner::new(Arc::new(launcher));
        let target =
            ExecutionTarget::new("win-1", TargetPlatform::Windows, PathBuf::from(r"C:\work"));
        let mut log = PollLog::in_memory();
        runner
            .run_inline(&target, "echo ok", &HashMap::new(), &mut log)
            .unwrap();
    }
}
