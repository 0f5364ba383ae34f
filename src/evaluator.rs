// Condition evaluator: one polling cycle, one boolean decision

use crate::environment::EnvironmentProvider;
use crate::errors::EvaluationError;
use crate::models::{ExecutionTarget, TriggerConfig};
use crate::poll_log::PollLog;
use crate::runner::ScriptRunner;
use std::sync::Arc;
use tracing::instrument;

/// Reason text handed to the caller when a cycle reports a change.
pub const CHANGE_REASON: &str = "The script returned the expected code.";

/// Decides, once per polling cycle, whether the trigger condition is met.
///
/// The inline script is checked before the file-path script, and evaluation
/// stops at the first exit code matching the expected one: once the condition
/// is confirmed there is no reason to spawn another process. A `false` result
/// is the normal "no change detected" outcome, never an error.
pub struct ConditionEvaluator {
    runner: ScriptRunner,
    env_provider: Arc<dyn EnvironmentProvider>,
}

impl ConditionEvaluator {
    pub fn new(runner: ScriptRunner, env_provider: Arc<dyn EnvironmentProvider>) -> Self {
        Self {
            runner,
            env_provider,
        }
    }

    /// Run one polling cycle against `target` and return whether the
    /// condition is met.
    ///
    /// A malformed expected exit code aborts the cycle before any script
    /// runs. Runner failures propagate as cycle failures; they are never
    /// reported as "no change".
    #[instrument(skip(self, config, log), fields(target = %target.name))]
    pub fn evaluate(
        &self,
        target: &ExecutionTarget,
        config: &TriggerConfig,
        log: &mut PollLog,
    ) -> Result<bool, EvaluationError> {
        let expected_exit_code = config.expected_exit_code()?;
        log.info(format!(
            "The expected script execution code is {}",
            expected_exit_code
        ));

        if config.script.is_none() && config.script_file_path.is_none() {
            return Ok(false);
        }

        let env = self.env_provider.env_vars(target, log);

        if let Some(script) = &config.script {
            let outcome = self.runner.run_inline(target, script, &env, log)?;
            if test_expected_exit_code(outcome.exit_code, expected_exit_code, log) {
                return Ok(true);
            }
        }

        if let Some(script_file_path) = &config.script_file_path {
            let outcome = self.runner.run_path(target, script_file_path, &env, log)?;
            if test_expected_exit_code(outcome.exit_code, expected_exit_code, log) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Decision line written by the caller when a cycle returned `true`.
    pub fn log_changes(&self, log: &mut PollLog) {
        log.info("The script returns the expected code. Scheduling a build.");
    }

    /// Decision line written by the caller when a cycle returned `false`.
    pub fn log_no_changes(&self, log: &mut PollLog) {
        log.info(
            "No changes. The script doesn't return the expected code or it can't be evaluated.",
        );
    }
}

/// Log the observed and expected codes, in that order, and compare them.
fn test_expected_exit_code(exit_code: i32, expected_exit_code: i32, log: &mut PollLog) -> bool {
    log.info(format!("The exit code is '{}'.", exit_code));
    log.info(format!(
        "Testing if the script execution code returns '{}'.",
        expected_exit_code
    ));
    expected_exit_code == exit_code
}
