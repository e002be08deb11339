//! What a run did (or, for a dry run, would do).

use serde::Serialize;
use std::path::PathBuf;

use crate::steps::{Step, StepPolicy};

/// Result of a successful provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub env_dir: PathBuf,
    /// System interpreter that created the environment.
    pub interpreter: PathBuf,
    /// The environment's own interpreter.
    pub python: PathBuf,
    pub manifest: PathBuf,
    /// `None` when the manifest could not be read for counting.
    pub manifest_entries: Option<usize>,
    /// Whether a previous environment was removed.
    pub replaced_existing: bool,
    pub steps: Vec<Step>,
    /// Best-effort steps that failed without stopping the run.
    pub warnings: Vec<String>,
    pub activation_command: String,
}

impl ProvisionReport {
    /// Operator-facing summary lines.
    pub fn summary_lines(&self) -> Vec<String> {
        let installed = match self.manifest_entries {
            Some(n) => format!("{} requirement entries installed", n),
            None => format!("installed from {}", self.manifest.display()),
        };
        let mut lines = vec![format!(
            "Virtual environment '{}' is ready ({}).",
            self.env_dir.display(),
            installed
        )];
        for warning in &self.warnings {
            lines.push(format!("warning: {}", warning));
        }
        lines.push("To activate it later, run:".to_string());
        lines.push(format!("  {}", self.activation_command));
        lines
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub step: Step,
    pub policy: StepPolicy,
    pub detail: String,
}

/// Dry-run output: resolved inputs and the steps a run would take.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionPlan {
    pub env_dir: PathBuf,
    pub target_exists: bool,
    /// `None` when no interpreter could be found.
    pub interpreter: Option<PathBuf>,
    pub manifest: PathBuf,
    pub manifest_exists: bool,
    pub steps: Vec<PlannedStep>,
}

impl ProvisionPlan {
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("target:      {}", self.env_dir.display()),
            format!(
                "interpreter: {}",
                self.interpreter
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<not found>".to_string())
            ),
            format!(
                "manifest:    {}{}",
                self.manifest.display(),
                if self.manifest_exists { "" } else { " (missing)" }
            ),
        ];
        for (i, planned) in self.steps.iter().enumerate() {
            let policy = match planned.policy {
                StepPolicy::Checked => "",
                StepPolicy::BestEffort => " [best effort]",
            };
            lines.push(format!(
                "{}. {}{}: {}",
                i + 1,
                planned.step,
                policy,
                planned.detail
            ));
        }
        lines
    }
}
