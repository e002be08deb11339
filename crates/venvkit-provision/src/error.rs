use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::steps::Step;

/// Errors that stop a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Invalid environment name '{0}': it must name a directory below the base directory")]
    InvalidEnvName(String),

    #[error("Failed to remove existing environment at {}: {source}", .path.display())]
    RemoveFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No usable interpreter to run `-m venv` with.
    #[error("Cannot create environment: {0}")]
    CreationFailure(String),

    #[error(
        "Virtual environment creation failed: {} not found. Make sure Python is installed and on your PATH.",
        .expected.display()
    )]
    VerificationFailure { expected: PathBuf },

    #[error("{} not found. Cannot install dependencies.", .path.display())]
    MissingManifest { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to {step}: could not run `{program}`: {source}")]
    Spawn {
        step: Step,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to {step}: `{program}` {}", describe_code(.code))]
    InvocationFailure {
        step: Step,
        program: String,
        code: Option<i32>,
    },

    #[error("Cannot determine the base directory: {0}")]
    BaseDir(#[source] io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exited with status {}", c),
        None => "was terminated by a signal".to_string(),
    }
}

impl ProvisionError {
    /// Process exit status for this error.
    ///
    /// Child exit codes are propagated; everything else maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::InvocationFailure {
                code: Some(c), ..
            } if *c != 0 => *c,
            _ => 1,
        }
    }

    /// The step this error stopped, when it is tied to one.
    pub fn step(&self) -> Option<Step> {
        match self {
            ProvisionError::InvalidEnvName(_) | ProvisionError::BaseDir(_) => {
                Some(Step::ResolveTarget)
            }
            ProvisionError::RemoveFailure { .. } => Some(Step::RemoveExisting),
            ProvisionError::CreationFailure(_) => Some(Step::CreateEnv),
            ProvisionError::VerificationFailure { .. } => Some(Step::Verify),
            ProvisionError::MissingManifest { .. } | ProvisionError::ManifestRead { .. } => {
                Some(Step::InstallDependencies)
            }
            ProvisionError::Spawn { step, .. } | ProvisionError::InvocationFailure { step, .. } => {
                Some(*step)
            }
        }
    }
}
