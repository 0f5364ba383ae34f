// Exit-code polling engine: runs a configured shell/batch script on an
// execution target each cycle and reports whether the trigger condition
// (script exits with the expected code) is met.

pub mod config;
pub mod environment;
pub mod errors;
pub mod evaluator;
pub mod launcher;
pub mod models;
pub mod poll_log;
pub mod runner;
pub mod substitution;
pub mod telemetry;

pub use evaluator::ConditionEvaluator;
pub use models::{ExecutionTarget, TriggerConfig};
pub use runner::ScriptRunner;
