//! End-to-end runs of the procedure against a fake process runner.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::layout::EnvLayout;
use crate::runner::{Invocation, ProcessRunner, RunOutcome};
use crate::{ProvisionError, ProvisionOptions, Provisioner, Step, StepPolicy};

/// Records invocations. `-m venv <dir>` fabricates the environment interpreter
/// unless `create_python` is off; `fail_on` makes matching command lines fail.
struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    create_python: bool,
    fail_on: Option<(&'static str, i32)>,
}

impl FakeRunner {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            create_python: true,
            fail_on: None,
        }
    }

    fn without_python(mut self) -> Self {
        self.create_python = false;
        self
    }

    fn failing(mut self, needle: &'static str, code: i32) -> Self {
        self.fail_on = Some((needle, code));
        self
    }

    fn command_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(Invocation::command_line)
            .collect()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<RunOutcome> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.command_line();
        if let Some((needle, code)) = self.fail_on {
            if line.contains(needle) {
                return Ok(RunOutcome::failed(code));
            }
        }
        let is_venv = invocation.args.iter().any(|a| a == "venv");
        if is_venv && self.create_python {
            let root = PathBuf::from(invocation.args.last().expect("venv target"));
            let python = EnvLayout::from_root(&root).python();
            fs::create_dir_all(python.parent().expect("bin dir"))?;
            fs::write(&python, "")?;
            fs::write(root.join("pyvenv.cfg"), "home = /usr/bin\n")?;
        }
        Ok(RunOutcome::ok())
    }
}

struct Fixture {
    base: TempDir,
    cwd: TempDir,
    system_python: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let base = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let system_python = cwd.path().join("python3");
        fs::write(&system_python, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&system_python, fs::Permissions::from_mode(0o755)).unwrap();
        Self {
            base,
            cwd,
            system_python,
        }
    }

    fn with_manifest_bytes(self, content: &[u8]) -> Self {
        fs::write(self.cwd.path().join("requirements.txt"), content).unwrap();
        self
    }

    fn with_manifest(self, content: &str) -> Self {
        fs::write(self.cwd.path().join("requirements.txt"), content).unwrap();
        self
    }

    fn options(&self) -> ProvisionOptions {
        ProvisionOptions {
            env_name: ".venv_jos3".to_string(),
            base_dir: self.base.path().to_path_buf(),
            manifest: PathBuf::from("requirements.txt"),
            cwd: self.cwd.path().to_path_buf(),
            python: Some(self.system_python.to_string_lossy().into_owned()),
            upgrade_policy: StepPolicy::Checked,
            check_dependencies: false,
        }
    }

    fn env_dir(&self, name: &str) -> PathBuf {
        self.base.path().join(name)
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_fresh_environment() {
    let fx = Fixture::new().with_manifest("jos3\npandas\n");
    let runner = FakeRunner::new();
    let provisioner = Provisioner::new(fx.options(), runner);

    let report = provisioner.run().unwrap();

    let env_dir = fx.env_dir(".venv_jos3");
    assert_eq!(report.env_dir, env_dir);
    assert_eq!(report.manifest_entries, Some(2));
    assert!(!report.replaced_existing);
    assert!(report.warnings.is_empty());
    assert_eq!(
        report.steps,
        vec![
            Step::ResolveTarget,
            Step::RemoveExisting,
            Step::CreateEnv,
            Step::Verify,
            Step::Activate,
            Step::UpgradeInstaller,
            Step::InstallDependencies,
        ]
    );
    assert!(EnvLayout::from_root(&env_dir).python().exists());

    let lines = provisioner_lines(&provisioner);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(&format!("-m venv {}", env_dir.display())));
    assert!(lines[1].ends_with("-m pip install --upgrade pip"));
    assert!(lines[2].ends_with(&format!(
        "-r {}",
        fx.cwd.path().join("requirements.txt").display()
    )));
}

fn provisioner_lines(p: &Provisioner<FakeRunner>) -> Vec<String> {
    p.runner().command_lines()
}

#[test]
fn test_existing_environment_is_replaced() {
    let fx = Fixture::new().with_manifest("numpy\n");
    let env_dir = fx.env_dir(".venv_jos3");
    fs::create_dir_all(env_dir.join("lib").join("old-package")).unwrap();
    fs::write(env_dir.join("leftover.txt"), "stale").unwrap();

    let report = Provisioner::new(fx.options(), FakeRunner::new())
        .run()
        .unwrap();

    assert!(report.replaced_existing);
    assert_eq!(list_dir(&env_dir), vec!["bin", "pyvenv.cfg"]);
}

#[test]
fn test_existing_empty_dir_and_file_are_replaced() {
    let fx = Fixture::new().with_manifest("");
    fs::create_dir_all(fx.env_dir(".venv_jos3")).unwrap();
    let report = Provisioner::new(fx.options(), FakeRunner::new())
        .run()
        .unwrap();
    assert!(report.replaced_existing);
    assert_eq!(report.manifest_entries, Some(0));

    let mut opts = fx.options();
    opts.env_name = "was_a_file".to_string();
    fs::write(fx.env_dir("was_a_file"), "x").unwrap();
    Provisioner::new(opts, FakeRunner::new()).run().unwrap();
    assert!(fx.env_dir("was_a_file").is_dir());
}

#[test]
fn test_name_override() {
    let fx = Fixture::new().with_manifest("xarray\n");
    let mut opts = fx.options();
    opts.env_name = "envA".to_string();

    let report = Provisioner::new(opts, FakeRunner::new()).run().unwrap();

    assert_eq!(report.env_dir, fx.env_dir("envA"));
    assert!(fx.env_dir("envA").is_dir());
    assert!(!fx.env_dir(".venv_jos3").exists());
}

#[test]
fn test_missing_manifest_stops_before_install() {
    let fx = Fixture::new();
    let runner = FakeRunner::new();
    let provisioner = Provisioner::new(fx.options(), runner);

    let err = provisioner.run().unwrap_err();

    match &err {
        ProvisionError::MissingManifest { path } => {
            assert_eq!(path, &fx.cwd.path().join("requirements.txt"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("requirements.txt not found"));
    assert!(fx.env_dir(".venv_jos3").is_dir(), "environment is created");
    let lines = provisioner_lines(&provisioner);
    assert!(lines.iter().all(|l| !l.contains(" -r ")));
}

#[test]
fn test_verification_failure_stops_before_pip() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new().without_python());

    let err = provisioner.run().unwrap_err();

    assert!(matches!(err, ProvisionError::VerificationFailure { .. }));
    assert_eq!(err.exit_code(), 1);
    let lines = provisioner_lines(&provisioner);
    assert_eq!(lines.len(), 1, "only venv creation ran: {lines:?}");
}

#[test]
fn test_no_interpreter_keeps_old_environment() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let env_dir = fx.env_dir(".venv_jos3");
    fs::create_dir_all(&env_dir).unwrap();
    fs::write(env_dir.join("marker"), "old").unwrap();
    let mut opts = fx.options();
    opts.python = Some(fx.cwd.path().join("no-such-python").to_string_lossy().into_owned());
    let provisioner = Provisioner::new(opts, FakeRunner::new());

    let err = provisioner.run().unwrap_err();

    assert!(matches!(err, ProvisionError::CreationFailure(_)));
    assert_ne!(err.exit_code(), 0);
    assert!(provisioner_lines(&provisioner).is_empty());
    assert!(env_dir.join("marker").exists());
}

#[test]
fn test_venv_failure_propagates_exit_code() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new().failing("-m venv", 2));

    let err = provisioner.run().unwrap_err();

    assert_eq!(err.step(), Some(Step::CreateEnv));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_checked_upgrade_failure_stops_run() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new().failing("--upgrade", 1));

    let err = provisioner.run().unwrap_err();

    assert_eq!(err.step(), Some(Step::UpgradeInstaller));
    let lines = provisioner_lines(&provisioner);
    assert!(lines.iter().all(|l| !l.contains(" -r ")));
}

#[test]
fn test_best_effort_upgrade_failure_continues() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let mut opts = fx.options();
    opts.upgrade_policy = StepPolicy::BestEffort;
    let provisioner = Provisioner::new(opts, FakeRunner::new().failing("--upgrade", 1));

    let report = provisioner.run().unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(!report.steps.contains(&Step::UpgradeInstaller));
    assert!(report.steps.contains(&Step::InstallDependencies));
}

#[test]
fn test_install_failure_propagates() {
    let fx = Fixture::new().with_manifest("definitely-not-a-package\n");
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new().failing(" -r ", 1));

    let err = provisioner.run().unwrap_err();

    assert!(matches!(
        err,
        ProvisionError::InvocationFailure {
            step: Step::InstallDependencies,
            code: Some(1),
            ..
        }
    ));
}

#[test]
fn test_pip_steps_use_env_interpreter() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let opts = fx.options().with_check_dependencies(true);
    let provisioner = Provisioner::new(opts, FakeRunner::new());

    let report = provisioner.run().unwrap();

    assert_eq!(report.steps.last(), Some(&Step::CheckDependencies));
    let env_python = EnvLayout::from_root(fx.env_dir(".venv_jos3")).python();
    let calls = provisioner.runner().calls.borrow();
    assert_eq!(calls[0].program, fx.system_python);
    for call in calls.iter().skip(1) {
        assert_eq!(call.program, env_python);
    }
    assert_eq!(calls.len(), 4);
}

#[test]
fn test_plan_has_no_side_effects() {
    let fx = Fixture::new();
    let env_dir = fx.env_dir(".venv_jos3");
    fs::create_dir_all(&env_dir).unwrap();
    fs::write(env_dir.join("marker"), "keep").unwrap();
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new());

    let plan = provisioner.plan().unwrap();

    assert!(plan.target_exists);
    assert!(!plan.manifest_exists);
    assert_eq!(plan.interpreter.as_deref(), Some(fx.system_python.as_path()));
    assert_eq!(plan.steps.len(), 7);
    assert!(env_dir.join("marker").exists());
    assert!(provisioner_lines(&provisioner).is_empty());
}

#[test]
fn test_invalid_name_touches_nothing() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let mut opts = fx.options();
    opts.env_name = "..".to_string();
    let provisioner = Provisioner::new(opts, FakeRunner::new());

    assert!(matches!(
        provisioner.run(),
        Err(ProvisionError::InvalidEnvName(_))
    ));
    assert!(fx.base.path().exists());
    assert!(provisioner_lines(&provisioner).is_empty());
}

#[test]
fn test_utf16_manifest_still_installs() {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend("jos3\r\n".encode_utf16().flat_map(u16::to_le_bytes));
    let fx = Fixture::new().with_manifest_bytes(&bytes);
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new());

    let report = provisioner.run().unwrap();

    assert_eq!(report.manifest_entries, Some(1));
    assert!(report.steps.contains(&Step::InstallDependencies));
    let lines = provisioner_lines(&provisioner);
    assert!(lines.iter().any(|l| l.contains(" -r ")));
}

#[test]
fn test_latin1_comment_still_installs() {
    let fx = Fixture::new().with_manifest_bytes(b"# depend\xeancias\njos3\n");
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new());

    let report = provisioner.run().unwrap();

    assert_eq!(report.manifest_entries, Some(1));
    let lines = provisioner_lines(&provisioner);
    assert!(lines.last().unwrap().ends_with(&format!(
        "-r {}",
        fx.cwd.path().join("requirements.txt").display()
    )));
}

#[test]
fn test_unreadable_manifest_count_does_not_block_install() {
    let fx = Fixture::new().with_manifest("jos3\n");
    let manifest = fx.cwd.path().join("requirements.txt");
    fs::set_permissions(&manifest, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&manifest).is_ok() {
        // Running as root; permission bits do not stop reads.
        return;
    }
    let provisioner = Provisioner::new(fx.options(), FakeRunner::new());

    let report = provisioner.run().unwrap();

    assert_eq!(report.manifest_entries, None);
    assert!(provisioner_lines(&provisioner).iter().any(|l| l.contains(" -r ")));
}
