//! Locate the system Python interpreter used to create environments.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;

/// Interpreter names tried on PATH, in order.
pub const CANDIDATES: &[&str] = &["python3", "python"];

/// Find an interpreter on the process PATH.
///
/// `explicit` may be a bare name (looked up on PATH) or a path to an executable.
pub fn find_interpreter(explicit: Option<&str>) -> Result<PathBuf, ProvisionError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_interpreter_in(explicit, std::env::var_os("PATH"), &cwd)
}

/// Same as [`find_interpreter`] with an explicit search path and working directory.
pub fn find_interpreter_in<P: AsRef<OsStr>>(
    explicit: Option<&str>,
    search_path: Option<P>,
    cwd: &Path,
) -> Result<PathBuf, ProvisionError> {
    let search_path = search_path.map(|p| p.as_ref().to_os_string());
    if let Some(name) = explicit {
        return which::which_in(name, search_path, cwd).map_err(|e| {
            ProvisionError::CreationFailure(format!("Python interpreter '{}' not found: {}", name, e))
        });
    }
    for name in CANDIDATES {
        if let Ok(path) = which::which_in(name, search_path.clone(), cwd) {
            tracing::debug!(interpreter = %path.display(), "found python on PATH");
            return Ok(path);
        }
    }
    Err(ProvisionError::CreationFailure(format!(
        "no Python interpreter found on PATH (tried {})",
        CANDIDATES.join(", ")
    )))
}
