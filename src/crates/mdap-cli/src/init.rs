//! First-time setup for the `mdap` CLI: home directory and default config.

use crate::error::{CliError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration directory name, under the user's home directory.
pub const CONFIG_DIR: &str = ".mdap";

/// Default configuration file name.
pub const CONFIG_FILE: &str = "mdap.toml";

/// Get the `mdap` home directory (`~/.mdap`).
pub fn get_mdap_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR))
        .ok_or_else(|| CliError::Config("could not determine home directory".to_string()))
}

/// Path to the user-level configuration file.
pub fn get_user_config_path() -> Result<PathBuf> {
    Ok(get_mdap_home()?.join(CONFIG_FILE))
}

/// Path to the project-level configuration file (`./.mdap/mdap.toml`).
pub fn get_project_config_path() -> Result<PathBuf> {
    Ok(PathBuf::from(".").join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Directory holding one JSON record per completed/failed run, plus
/// `last_run.json` (read by the `status`/`explain`/`history`/`resources`
/// commands — see `run_record.rs`).
pub fn get_runs_dir() -> Result<PathBuf> {
    Ok(get_mdap_home()?.join("runs"))
}

/// Path to the pidfile written by a live `mdap run`, read by
/// `pause`/`resume`/`cancel` to find the process to signal.
pub fn get_pidfile_path() -> Result<PathBuf> {
    Ok(get_mdap_home()?.join("run.pid"))
}

/// Whether `mdap init` has been run before.
pub fn is_initialized() -> bool {
    get_mdap_home().map(|home| home.join(CONFIG_FILE).exists()).unwrap_or(false)
}

/// Initialize the `~/.mdap` directory and default configuration.
///
/// `force` overwrites an existing configuration file.
pub fn initialize(force: bool) -> Result<()> {
    let home = get_mdap_home()?;
    info!(path = %home.display(), "initializing mdap");

    if !home.exists() {
        fs::create_dir_all(&home)?;
        info!(path = %home.display(), "created mdap home directory");
    }

    let runs_dir = home.join("runs");
    if !runs_dir.exists() {
        fs::create_dir_all(&runs_dir)?;
    }

    let config_path = home.join(CONFIG_FILE);
    if !config_path.exists() || force {
        create_default_config(&config_path)?;
        info!(path = %config_path.display(), "wrote default configuration");
    } else {
        warn!(path = %config_path.display(), "configuration already exists (use --force to overwrite)");
    }

    Ok(())
}

fn create_default_config(path: &Path) -> Result<()> {
    let default_config = r#"# mdap configuration
#
# User-level settings live here; project-level overrides go in
# ./.mdap/mdap.toml and take precedence field-by-field.

[llm]
# Provider: "ollama" (local) or "remote" (any OpenAI-compatible endpoint).
provider = "ollama"
model = "llama3"
base_url = "http://localhost:11434"
# api_key_env = "MDAP_LLM_API_KEY"   # required when provider = "remote"
call_timeout_secs = 60
max_retries = 3

[mdap]
# First-to-ahead-by-k margin.
k = 3
# Hard cap on accepted candidates per vote.
max_samples = 20
# Red-flag length threshold (char-count proxy for tokens).
max_tokens_response = 500
temperature = 0.1
# Maximum recursion depth for nested sub-function generation.
max_depth = 3

[budget]
# Optional hard limits. Omit a field (or leave it unset) for unbounded.
# max_tokens = 100000
# max_cost_usd = 5.0
# max_time_secs = 1800

[logging]
level = "info"
format = "compact"
colored = true
"#;

    fs::write(path, default_config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mdap_home() {
        let home = get_mdap_home().unwrap();
        assert!(home.to_string_lossy().contains(CONFIG_DIR));
    }

    #[test]
    fn test_config_paths() {
        assert!(get_user_config_path().unwrap().to_string_lossy().contains(CONFIG_FILE));
        assert!(get_project_config_path().unwrap().to_string_lossy().contains(CONFIG_FILE));
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        create_default_config(&config_path).unwrap();
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[llm]"));
        assert!(content.contains("[mdap]"));
        assert!(content.contains("[budget]"));
        assert!(content.contains("[logging]"));
    }
}
