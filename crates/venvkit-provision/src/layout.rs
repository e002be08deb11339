//! Where an environment lives and the conventional paths inside it.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::ProvisionError;

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

#[cfg(windows)]
const PYTHON_EXE: &str = "python.exe";
#[cfg(not(windows))]
const PYTHON_EXE: &str = "python";

/// Resolved paths of one environment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLayout {
    root: PathBuf,
}

impl EnvLayout {
    /// Join `name` onto `base_dir` and make the result absolute.
    ///
    /// The name must stay strictly below `base_dir`: empty names, absolute
    /// names and `..` components are rejected. `.` components are dropped.
    pub fn resolve(base_dir: &Path, name: &str) -> Result<Self, ProvisionError> {
        let invalid = || ProvisionError::InvalidEnvName(name.to_string());
        if name.trim().is_empty() {
            return Err(invalid());
        }
        let mut relative = PathBuf::new();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid())
                }
            }
        }
        if relative.as_os_str().is_empty() {
            return Err(invalid());
        }
        let base = std::path::absolute(base_dir).map_err(ProvisionError::BaseDir)?;
        Ok(Self {
            root: base.join(relative),
        })
    }

    /// Wrap an already-resolved environment directory.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    /// The environment's own interpreter.
    pub fn python(&self) -> PathBuf {
        self.bin_dir().join(PYTHON_EXE)
    }

    pub fn activate_script(&self) -> PathBuf {
        self.bin_dir().join("activate")
    }

    /// Shell command an operator runs to enter the environment later.
    pub fn activation_command(&self) -> String {
        if cfg!(windows) {
            self.activate_script().display().to_string()
        } else {
            format!("source {}", self.activate_script().display())
        }
    }

    /// Variables an activated shell would see: `VIRTUAL_ENV` and `PATH` with the
    /// environment's bin dir first. Applied per child process only.
    pub fn activation_env(&self) -> Vec<(OsString, OsString)> {
        let mut env = vec![(
            OsString::from("VIRTUAL_ENV"),
            self.root.clone().into_os_string(),
        )];
        let current = std::env::var_os("PATH").unwrap_or_default();
        let paths = std::iter::once(self.bin_dir()).chain(std::env::split_paths(&current));
        if let Ok(joined) = std::env::join_paths(paths) {
            env.push((OsString::from("PATH"), joined));
        }
        env
    }
}

/// Directory holding the running executable, used when no base dir is configured.
pub fn default_base_dir() -> Result<PathBuf, ProvisionError> {
    let exe = std::env::current_exe().map_err(ProvisionError::BaseDir)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        ProvisionError::BaseDir(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })
}
