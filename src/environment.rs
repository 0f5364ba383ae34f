// Environment snapshot assembly for macro substitution

use crate::models::{EnvironmentSnapshot, ExecutionTarget};
use crate::poll_log::PollLog;
use crate::substitution::merge_variables;
use std::collections::HashMap;

/// Supplies the per-cycle environment snapshot used for macro substitution.
///
/// Injected into the evaluator so tests and embedders control exactly what
/// the scripts see; the engine never reads ambient global state on its own.
pub trait EnvironmentProvider: Send + Sync {
    fn env_vars(&self, target: &ExecutionTarget, log: &mut PollLog) -> EnvironmentSnapshot;
}

/// Default provider: the controller's process environment merged with the
/// target's own variables, target-level values taking precedence.
#[derive(Debug, Default)]
pub struct SystemEnvironmentProvider;

impl EnvironmentProvider for SystemEnvironmentProvider {
    fn env_vars(&self, target: &ExecutionTarget, log: &mut PollLog) -> EnvironmentSnapshot {
        let process_env: HashMap<String, String> = std::env::vars().collect();
        let snapshot = merge_variables(process_env, target.env.clone());
        log.info(format!(
            "Retrieved {} environment variable(s) for target '{}'.",
            snapshot.len(),
            target.name
        ));
        snapshot
    }
}

/// Fixed snapshot, independent of the process environment.
#[derive(Debug, Default)]
pub struct StaticEnvironmentProvider {
    vars: EnvironmentSnapshot,
}

impl StaticEnvironmentProvider {
    pub fn new(vars: EnvironmentSnapshot) -> Self {
        Self { vars }
    }
}

impl EnvironmentProvider for StaticEnvironmentProvider {
    fn env_vars(&self, target: &ExecutionTarget, _log: &mut PollLog) -> EnvironmentSnapshot {
        merge_variables(self.vars.clone(), target.env.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetPlatform;
    use std::path::PathBuf;

    fn target_with_env(env: HashMap<String, String>) -> ExecutionTarget {
        ExecutionTarget::new("worker-1", TargetPlatform::Posix, PathBuf::from("/tmp"))
            .with_env(env)
    }

    #[test]
    fn test_system_provider_includes_target_env() {
        let mut env = HashMap::new();
        env.insert("TRIGGER_VAR".to_string(), "per-target".to_string());
        let target = target_with_env(env);

        let mut log = PollLog::in_memory();
        let snapshot = SystemEnvironmentProvider.env_vars(&target, &mut log);

        assert_eq!(snapshot.get("TRIGGER_VAR").unwrap(), "per-target");
        assert_eq!(log.lines().len(), 1);
    }

    #[test]
    fn test_target_env_overrides_static_vars() {
        let mut base = HashMap::new();
        base.insert("SHARED".to_string(), "workload".to_string());
        let provider = StaticEnvironmentProvider::new(base);

        let mut target_env = HashMap::new();
        target_env.insert("SHARED".to_string(), "target".to_string());
        let target = target_with_env(target_env);

        let mut log = PollLog::in_memory();
        let snapshot = provider.env_vars(&target, &mut log);
        assert_eq!(snapshot.get("SHARED").unwrap(), "target");
    }
}
