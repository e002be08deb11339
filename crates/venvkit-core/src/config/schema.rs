//! Config structs grouped by concern, loaded from the environment.

use super::env_keys::{observability as obv_keys, provision as prov_keys};
use super::loader::{env_bool, env_optional, env_or};
use std::path::PathBuf;

/// Environment directory name used when nothing else is configured.
pub const DEFAULT_ENV_NAME: &str = ".venv_jos3";

/// Dependency manifest file name, looked up in the current working directory.
pub const DEFAULT_MANIFEST: &str = "requirements.txt";

/// Provisioning settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub env_name: String,
    /// `None` means "the directory of the running executable".
    pub base_dir: Option<PathBuf>,
    pub requirements: PathBuf,
    /// Explicit interpreter for `-m venv`; `None` searches PATH.
    pub python: Option<String>,
    pub allow_upgrade_failure: bool,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            env_name: DEFAULT_ENV_NAME.to_string(),
            base_dir: None,
            requirements: PathBuf::from(DEFAULT_MANIFEST),
            python: None,
            allow_upgrade_failure: false,
        }
    }
}

/// Values supplied on the command line. `None` / `false` leave the config untouched.
#[derive(Debug, Clone, Default)]
pub struct ProvisionOverrides {
    pub env_name: Option<String>,
    pub base_dir: Option<PathBuf>,
    pub requirements: Option<PathBuf>,
    pub python: Option<String>,
    pub allow_upgrade_failure: bool,
}

impl ProvisionConfig {
    /// Load from environment variables (and `.env`), empty values fall back to defaults.
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            env_name: env_or(
                prov_keys::VENVKIT_ENV_NAME,
                prov_keys::ENV_NAME_ALIASES,
                || DEFAULT_ENV_NAME.to_string(),
            ),
            base_dir: env_optional(prov_keys::VENVKIT_BASE_DIR, &[]).map(PathBuf::from),
            requirements: env_optional(prov_keys::VENVKIT_REQUIREMENTS, &[])
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
            python: env_optional(prov_keys::VENVKIT_PYTHON, &[]),
            allow_upgrade_failure: env_bool(prov_keys::VENVKIT_ALLOW_UPGRADE_FAILURE, &[], false),
        }
    }

    /// Command-line values win over environment values.
    pub fn with_cli_overrides(mut self, overrides: ProvisionOverrides) -> Self {
        if let Some(name) = overrides.env_name {
            self.env_name = name;
        }
        if let Some(dir) = overrides.base_dir {
            self.base_dir = Some(dir);
        }
        if let Some(req) = overrides.requirements {
            self.requirements = req;
        }
        if let Some(python) = overrides.python {
            self.python = Some(python);
        }
        if overrides.allow_upgrade_failure {
            self.allow_upgrade_failure = true;
        }
        self
    }
}

/// Logging settings: quiet, log_level, log_json.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::VENVKIT_QUIET, &[], false),
                log_level: env_or(obv_keys::VENVKIT_LOG_LEVEL, &[], || {
                    "venvkit=info".to_string()
                }),
                log_json: env_bool(obv_keys::VENVKIT_LOG_JSON, &[], false),
            }
        })
    }
}
