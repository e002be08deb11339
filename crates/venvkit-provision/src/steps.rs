//! The ordered provisioning steps and their failure policy.

use serde::Serialize;
use std::fmt;

/// One step of the provisioning procedure, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ResolveTarget,
    RemoveExisting,
    CreateEnv,
    Verify,
    Activate,
    UpgradeInstaller,
    InstallDependencies,
    CheckDependencies,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ResolveTarget => "resolve target",
            Step::RemoveExisting => "remove existing environment",
            Step::CreateEnv => "create environment",
            Step::Verify => "verify environment",
            Step::Activate => "activate environment",
            Step::UpgradeInstaller => "upgrade pip",
            Step::InstallDependencies => "install dependencies",
            Step::CheckDependencies => "check dependencies",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a failing step affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Failure stops the run.
    #[default]
    Checked,
    /// Failure is logged as a warning and the run continues.
    BestEffort,
}

impl StepPolicy {
    pub fn from_allow_failure(allow: bool) -> Self {
        if allow {
            StepPolicy::BestEffort
        } else {
            StepPolicy::Checked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_labels() {
        assert_eq!(Step::UpgradeInstaller.to_string(), "upgrade pip");
        assert_eq!(
            serde_json::to_value(Step::UpgradeInstaller).unwrap(),
            "upgrade_installer"
        );
        assert!(Step::Verify < Step::InstallDependencies);
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(StepPolicy::from_allow_failure(false), StepPolicy::Checked);
        assert_eq!(StepPolicy::from_allow_failure(true), StepPolicy::BestEffort);
        assert_eq!(StepPolicy::default(), StepPolicy::Checked);
    }
}
