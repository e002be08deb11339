//! Environment provisioner: (re)create an isolated Python environment and
//! install a requirements manifest into it.
//!
//! The procedure is strictly ordered and single-attempt. Every step returns a
//! `Result`; the first error stops the run with no rollback. Child processes are
//! spawned through [`runner::ProcessRunner`] so the procedure can be exercised
//! without a Python toolchain.

pub mod error;
pub mod interpreter;
pub mod layout;
pub mod manifest;
pub mod provisioner;
pub mod report;
pub mod runner;
pub mod steps;

#[cfg(all(test, unix))]
mod tests;

pub use error::ProvisionError;
pub use layout::EnvLayout;
pub use manifest::Manifest;
pub use provisioner::{ProvisionOptions, Provisioner};
pub use report::{ProvisionPlan, ProvisionReport};
pub use runner::{Invocation, ProcessRunner, RunOutcome, SystemRunner};
pub use steps::{Step, StepPolicy};
