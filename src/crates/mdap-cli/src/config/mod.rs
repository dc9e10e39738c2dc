//! Configuration management for the `mdap` CLI.
//!
//! Supports dual-location configuration:
//! - User-level: `~/.mdap/mdap.toml`
//! - Project-level: `./.mdap/mdap.toml` (overrides user-level)

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::{BudgetConfig, LlmConfig, LoggingConfig, MdapCliConfig, VotingConfig};

use crate::error::Result;

/// Load configuration from both locations, project config taking
/// precedence.
pub async fn load_config() -> Result<MdapCliConfig> {
    ConfigLoader::new().load().await
}
