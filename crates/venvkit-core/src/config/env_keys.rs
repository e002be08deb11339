//! Environment variable keys.
//!
//! Primary keys are `VENVKIT_*`. `JOS3_ENV_NAME` is accepted as an alias for the
//! environment name so existing pipeline checkouts keep working.

/// Provisioning
pub mod provision {
    pub const VENVKIT_ENV_NAME: &str = "VENVKIT_ENV_NAME";
    pub const ENV_NAME_ALIASES: &[&str] = &["JOS3_ENV_NAME"];

    /// Directory the environment is created under (default: the executable's directory)
    pub const VENVKIT_BASE_DIR: &str = "VENVKIT_BASE_DIR";

    /// Manifest path, resolved against the current working directory when relative
    pub const VENVKIT_REQUIREMENTS: &str = "VENVKIT_REQUIREMENTS";

    /// Interpreter used to create the environment (default: python3, then python on PATH)
    pub const VENVKIT_PYTHON: &str = "VENVKIT_PYTHON";

    pub const VENVKIT_ALLOW_UPGRADE_FAILURE: &str = "VENVKIT_ALLOW_UPGRADE_FAILURE";
}

/// Observability and logging
pub mod observability {
    pub const VENVKIT_QUIET: &str = "VENVKIT_QUIET";
    pub const VENVKIT_LOG_LEVEL: &str = "VENVKIT_LOG_LEVEL";
    pub const VENVKIT_LOG_JSON: &str = "VENVKIT_LOG_JSON";
}
