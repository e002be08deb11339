use std::path::PathBuf;

use clap::Parser;
use venvkit_core::config::ProvisionOverrides;

/// venvkit - recreate an isolated Python environment and install requirements.txt
///
/// Any existing directory at the target path is deleted without confirmation.
#[derive(Parser, Debug)]
#[command(name = "venvkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Environment directory name (default: from VENVKIT_ENV_NAME or .venv_jos3)
    #[arg(value_name = "ENV_NAME", conflicts_with = "name")]
    pub env_name: Option<String>,

    /// Environment directory name, same as the positional argument
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Directory to create the environment in (default: the venvkit executable's directory)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Dependency manifest, relative to the current directory (default: requirements.txt)
    #[arg(short = 'r', long, value_name = "FILE")]
    pub requirements: Option<PathBuf>,

    /// Python used to create the environment (default: python3, then python on PATH)
    #[arg(long, value_name = "EXE")]
    pub python: Option<String>,

    /// Continue when `pip install --upgrade pip` fails
    #[arg(long, default_value = "false")]
    pub allow_upgrade_failure: bool,

    /// Run `pip check` after installing
    #[arg(long, default_value = "false")]
    pub check: bool,

    /// Print the resolved plan without changing anything
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Print the report (or plan) as JSON on stdout
    #[arg(long, default_value = "false")]
    pub json: bool,
}

impl Cli {
    pub fn overrides(&self) -> ProvisionOverrides {
        ProvisionOverrides {
            env_name: self.env_name.clone().or_else(|| self.name.clone()),
            base_dir: self.base_dir.clone(),
            requirements: self.requirements.clone(),
            python: self.python.clone(),
            allow_upgrade_failure: self.allow_upgrade_failure,
        }
    }
}
