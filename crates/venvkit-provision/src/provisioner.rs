//! The provisioning procedure.
//!
//! Order: resolve target, remove existing, create, verify, activate, upgrade
//! pip, install manifest, optionally `pip check`. The first failing checked
//! step ends the run; nothing is rolled back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use venvkit_core::config::ProvisionConfig;

use crate::error::ProvisionError;
use crate::interpreter;
use crate::layout::{self, EnvLayout};
use crate::manifest::Manifest;
use crate::report::{PlannedStep, ProvisionPlan, ProvisionReport};
use crate::runner::{Invocation, ProcessRunner};
use crate::steps::{Step, StepPolicy};

/// Fully resolved inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOptions {
    pub env_name: String,
    /// Directory the environment is created under.
    pub base_dir: PathBuf,
    /// Manifest path; relative paths are resolved against `cwd`.
    pub manifest: PathBuf,
    pub cwd: PathBuf,
    /// Interpreter name or path for `-m venv`; `None` searches PATH.
    pub python: Option<String>,
    pub upgrade_policy: StepPolicy,
    pub check_dependencies: bool,
}

impl ProvisionOptions {
    /// Fill in the executable's directory and the current directory where the
    /// config leaves them open.
    pub fn from_config(cfg: &ProvisionConfig) -> Result<Self, ProvisionError> {
        let base_dir = match &cfg.base_dir {
            Some(dir) => dir.clone(),
            None => layout::default_base_dir()?,
        };
        let cwd = std::env::current_dir().map_err(ProvisionError::BaseDir)?;
        Ok(Self {
            env_name: cfg.env_name.clone(),
            base_dir,
            manifest: cfg.requirements.clone(),
            cwd,
            python: cfg.python.clone(),
            upgrade_policy: StepPolicy::from_allow_failure(cfg.allow_upgrade_failure),
            check_dependencies: false,
        })
    }

    pub fn with_check_dependencies(mut self, check: bool) -> Self {
        self.check_dependencies = check;
        self
    }
}

pub struct Provisioner<R> {
    options: ProvisionOptions,
    runner: R,
}

impl<R: ProcessRunner> Provisioner<R> {
    pub fn new(options: ProvisionOptions, runner: R) -> Self {
        Self { options, runner }
    }

    pub fn options(&self) -> &ProvisionOptions {
        &self.options
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn manifest(&self) -> Manifest {
        Manifest::at(&self.options.manifest, &self.options.cwd)
    }

    /// Resolve everything a run would use without touching the filesystem or
    /// spawning anything.
    pub fn plan(&self) -> Result<ProvisionPlan, ProvisionError> {
        let layout = EnvLayout::resolve(&self.options.base_dir, &self.options.env_name)?;
        let manifest = self.manifest();
        let env_python = layout.python();

        let mut steps = vec![
            PlannedStep {
                step: Step::ResolveTarget,
                policy: StepPolicy::Checked,
                detail: layout.root().display().to_string(),
            },
            PlannedStep {
                step: Step::RemoveExisting,
                policy: StepPolicy::Checked,
                detail: format!("rm -rf {}", layout.root().display()),
            },
            PlannedStep {
                step: Step::CreateEnv,
                policy: StepPolicy::Checked,
                detail: format!("<python> -m venv {}", layout.root().display()),
            },
            PlannedStep {
                step: Step::Verify,
                policy: StepPolicy::Checked,
                detail: format!("expect {}", env_python.display()),
            },
            PlannedStep {
                step: Step::Activate,
                policy: StepPolicy::Checked,
                detail: format!("invoke {} directly", env_python.display()),
            },
            PlannedStep {
                step: Step::UpgradeInstaller,
                policy: self.options.upgrade_policy,
                detail: upgrade_invocation(&layout).command_line(),
            },
            PlannedStep {
                step: Step::InstallDependencies,
                policy: StepPolicy::Checked,
                detail: install_invocation(&layout, manifest.path()).command_line(),
            },
        ];
        if self.options.check_dependencies {
            steps.push(PlannedStep {
                step: Step::CheckDependencies,
                policy: StepPolicy::Checked,
                detail: check_invocation(&layout).command_line(),
            });
        }

        Ok(ProvisionPlan {
            target_exists: fs::symlink_metadata(layout.root()).is_ok(),
            env_dir: layout.root().to_path_buf(),
            interpreter: interpreter::find_interpreter(self.options.python.as_deref()).ok(),
            manifest: manifest.path().to_path_buf(),
            manifest_exists: manifest.exists(),
            steps,
        })
    }

    /// Run the whole procedure.
    pub fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let mut steps = Vec::new();
        let mut warnings = Vec::new();

        let layout = EnvLayout::resolve(&self.options.base_dir, &self.options.env_name)?;
        info!(env_dir = %layout.root().display(), "resolved target environment");
        steps.push(Step::ResolveTarget);

        // Looked up before removal so a missing interpreter leaves the old environment intact.
        let system_python = interpreter::find_interpreter(self.options.python.as_deref())?;
        info!(interpreter = %system_python.display(), "using system python");

        let replaced_existing = remove_existing(layout.root())?;
        if replaced_existing {
            info!(env_dir = %layout.root().display(), "removed existing environment");
        }
        steps.push(Step::RemoveExisting);

        info!("creating virtual environment");
        self.invoke(
            Step::CreateEnv,
            &Invocation::new(&system_python)
                .args(["-m", "venv"])
                .arg(layout.root()),
        )?;
        steps.push(Step::CreateEnv);

        let env_python = layout.python();
        if !env_python.exists() {
            return Err(ProvisionError::VerificationFailure {
                expected: env_python,
            });
        }
        steps.push(Step::Verify);

        // Later steps call the environment's interpreter by absolute path with
        // VIRTUAL_ENV/PATH set on the child only.
        info!(python = %env_python.display(), "activated environment");
        steps.push(Step::Activate);

        info!("upgrading pip");
        match self.invoke(Step::UpgradeInstaller, &upgrade_invocation(&layout)) {
            Ok(()) => steps.push(Step::UpgradeInstaller),
            Err(e) if self.options.upgrade_policy == StepPolicy::BestEffort => {
                warn!(error = %e, "pip upgrade failed, continuing");
                warnings.push(e.to_string());
            }
            Err(e) => return Err(e),
        }

        let manifest = self.manifest();
        manifest.require()?;
        // Counting entries only feeds the report; pip reads the file itself.
        let manifest_entries = match manifest.entries() {
            Ok(entries) => Some(entries.len()),
            Err(e) => {
                warn!(error = %e, "could not count manifest entries");
                None
            }
        };
        info!(
            manifest = %manifest.path().display(),
            entries = ?manifest_entries,
            "installing dependencies"
        );
        self.invoke(
            Step::InstallDependencies,
            &install_invocation(&layout, manifest.path()),
        )?;
        steps.push(Step::InstallDependencies);

        if self.options.check_dependencies {
            info!("checking installed dependencies");
            self.invoke(Step::CheckDependencies, &check_invocation(&layout))?;
            steps.push(Step::CheckDependencies);
        }

        info!(env_dir = %layout.root().display(), "environment ready");
        Ok(ProvisionReport {
            env_dir: layout.root().to_path_buf(),
            interpreter: system_python,
            python: env_python,
            manifest: manifest.path().to_path_buf(),
            manifest_entries,
            replaced_existing,
            steps,
            warnings,
            activation_command: layout.activation_command(),
        })
    }

    fn invoke(&self, step: Step, invocation: &Invocation) -> Result<(), ProvisionError> {
        tracing::debug!(step = %step, command = %invocation.command_line(), "invoking");
        let program = invocation.program.display().to_string();
        let outcome = self
            .runner
            .run(invocation)
            .map_err(|source| ProvisionError::Spawn {
                step,
                program: program.clone(),
                source,
            })?;
        if outcome.success {
            Ok(())
        } else {
            Err(ProvisionError::InvocationFailure {
                step,
                program,
                code: outcome.code,
            })
        }
    }
}

/// Remove whatever is at `root`. Returns whether anything was there.
/// Symlinks are unlinked, not followed.
fn remove_existing(root: &Path) -> Result<bool, ProvisionError> {
    let fail = |source: io::Error| ProvisionError::RemoveFailure {
        path: root.to_path_buf(),
        source,
    };
    let meta = match fs::symlink_metadata(root) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(fail(e)),
    };
    if meta.file_type().is_dir() {
        fs::remove_dir_all(root).map_err(fail)?;
    } else {
        fs::remove_file(root).map_err(fail)?;
    }
    Ok(true)
}

/// `<env python> -m pip ...` with the environment activated for the child.
fn env_pip(layout: &EnvLayout) -> Invocation {
    Invocation::new(layout.python())
        .args(["-m", "pip"])
        .envs(layout.activation_env())
        .env_remove("PYTHONHOME")
}

fn upgrade_invocation(layout: &EnvLayout) -> Invocation {
    env_pip(layout).args(["install", "--upgrade", "pip"])
}

fn install_invocation(layout: &EnvLayout, manifest: &Path) -> Invocation {
    env_pip(layout)
        .args(["install", "--disable-pip-version-check", "-r"])
        .arg(manifest)
}

fn check_invocation(layout: &EnvLayout) -> Invocation {
    env_pip(layout).args(["check", "--disable-pip-version-check"])
}
