//! Plugin configuration loading and validation
//! (`opencode-historian.json[c]`, user-global and project-local).

pub mod config;
mod config_merge;
pub mod init;
pub mod integrations;
pub mod paths;
pub mod validate;

pub use config::{LogLevel, PluginConfig};
pub use init::install_default_config;
pub use integrations::{IntegrationConfig, builtin_integrations};
pub use validate::validate_config;
