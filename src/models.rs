// Data model for trigger configuration and execution targets

use crate::errors::EvaluationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variables used for macro substitution, assembled fresh every
/// polling cycle and never cached across cycles.
pub type EnvironmentSnapshot = HashMap<String, String>;

/// Normalize a configuration string: whitespace-only values become `None`.
pub fn fix_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trigger configuration, supplied externally and immutable for the engine.
///
/// At least one of `script` / `script_file_path` must be present for a cycle
/// to be able to report a change; with neither set every cycle yields
/// "no change" without running anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Inline script text, checked before the file-path script
    pub script: Option<String>,

    /// Path to a script on the execution target's filesystem
    pub script_file_path: Option<String>,

    /// Expected exit code as configured text; `None` defaults to 0
    pub exit_code: Option<String>,
}

impl TriggerConfig {
    pub fn new(
        script: Option<String>,
        script_file_path: Option<String>,
        exit_code: Option<String>,
    ) -> Self {
        Self {
            script: fix_empty(script),
            script_file_path: fix_empty(script_file_path),
            exit_code: fix_empty(exit_code),
        }
    }

    /// Resolve the expected exit code, defaulting to 0 when not configured.
    ///
    /// A non-numeric value is a configuration error and aborts the cycle
    /// before any script runs.
    pub fn expected_exit_code(&self) -> Result<i32, EvaluationError> {
        match &self.exit_code {
            None => Ok(0),
            Some(code) => code.trim().parse::<i32>().map_err(|_| {
                EvaluationError::Configuration(format!(
                    "The given exit code must be a numeric value. The given value is '{}'.",
                    code
                ))
            }),
        }
    }
}

/// Script-interpreter convention of an execution target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    Posix,
    Windows,
}

impl TargetPlatform {
    /// Derive the platform from the target's path-list separator convention
    /// (`:` on POSIX-like systems, `;` elsewhere).
    pub fn from_path_list_separator(separator: char) -> Self {
        if separator == ':' {
            TargetPlatform::Posix
        } else {
            TargetPlatform::Windows
        }
    }

    /// Platform of the machine this process runs on.
    pub fn current() -> Self {
        if cfg!(windows) {
            TargetPlatform::Windows
        } else {
            TargetPlatform::Posix
        }
    }
}

/// Opaque handle to the machine where scripts run. Supplied per polling
/// cycle by the external scheduler; the engine never caches it.
#[derive(Debug, Clone)]
pub struct ExecutionTarget {
    /// Display name used in log lines
    pub name: String,

    /// Interpreter convention (shell vs. batch)
    pub platform: TargetPlatform,

    /// Execution root: working directory for spawned processes and the
    /// location of cycle-scoped script artifacts
    pub root_dir: PathBuf,

    /// Target-level environment variables, merged over the workload's
    pub env: HashMap<String, String>,
}

impl ExecutionTarget {
    pub fn new(name: impl Into<String>, platform: TargetPlatform, root_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            platform,
            root_dir,
            env: HashMap::new(),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Local target rooted at the given directory.
    pub fn local(root_dir: PathBuf) -> Self {
        Self::new("local", TargetPlatform::current(), root_dir)
    }
}

/// Result of running one script source during one cycle. Ephemeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub exit_code: i32,
}

/// Build-cause record handed to the caller when a cycle reports a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerCause {
    pub short_description: String,
}

impl Default for TriggerCause {
    fn default() -> Self {
        Self {
            short_description: "[ScriptTrigger] - The script returned the expected code"
                .to_string(),
        }
    }
}
