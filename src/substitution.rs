// Macro substitution for inline script text

use crate::errors::SubstitutionError;
use crate::models::EnvironmentSnapshot;
use regex::Regex;
use std::collections::HashMap;

/// Resolves `${VAR_NAME}` placeholders in script text against an environment
/// snapshot.
///
/// Substitution is best-effort: a placeholder whose variable is absent from
/// the snapshot is left as literal text. The snapshot is a substitution map,
/// not a strict template contract, so an unset variable never fails a cycle.
pub struct VariableSubstitutor {
    placeholder_regex: Regex,
}

impl VariableSubstitutor {
    pub fn new() -> Result<Self, SubstitutionError> {
        // Matches ${VAR_NAME} and captures the name inside the braces
        let placeholder_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| SubstitutionError::Regex(e.to_string()))?;

        Ok(Self { placeholder_regex })
    }

    /// Substitute every resolvable placeholder in `template`, leaving
    /// unresolved ones untouched.
    pub fn resolve(&self, template: &str, variables: &EnvironmentSnapshot) -> String {
        self.placeholder_regex
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                match variables.get(var_name) {
                    Some(value) => value.clone(),
                    None => {
                        tracing::debug!(variable = var_name, "Placeholder left unresolved");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// True if `template` contains at least one placeholder.
    pub fn has_variables(&self, template: &str) -> bool {
        self.placeholder_regex.is_match(template)
    }
}

impl Default for VariableSubstitutor {
    fn default() -> Self {
        // The pattern is a compile-time constant; construction cannot fail
        Self::new().expect("placeholder regex must compile")
    }
}

/// Merge workload-level and target-level variables; target-level wins.
pub fn merge_variables(
    workload_vars: HashMap<String, String>,
    target_vars: HashMap<String, String>,
) -> EnvironmentSnapshot {
    let mut merged = workload_vars;
    merged.extend(target_vars);
    merged
}
