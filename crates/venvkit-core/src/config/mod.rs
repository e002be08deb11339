//! venvkit configuration layer
//!
//! All environment variable reads live here; the provisioner and the CLI only
//! see structured config, never `std::env::var` directly.
//!
//! - `loader`: `.env` loading and the `env_or` / `env_optional` / `env_bool` helpers
//! - `schema`: `ProvisionConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{
    env_bool, env_optional, env_or, load_dotenv, load_dotenv_from_dir, parse_dotenv_line,
};
pub use schema::{
    ObservabilityConfig, ProvisionConfig, ProvisionOverrides, DEFAULT_ENV_NAME, DEFAULT_MANIFEST,
};
