//! Configuration loader with dual-location support.
//!
//! Loads from, in priority order: defaults, user-level config
//! (`~/.mdap/mdap.toml`), then project-level config (`./.mdap/mdap.toml`),
//! each overriding the previous. `${VAR}` references anywhere in either
//! file are expanded against the process environment before parsing, so
//! a remote provider's API key can live in `MDAP_LLM_API_KEY` rather
//! than the file itself (though `mdap-llm::RemoteLlmConfig::from_env`
//! reads that variable directly too — this expansion covers any other
//! field an operator wants to keep out of the file).

use crate::config::schema::MdapCliConfig;
use crate::error::{CliError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::fs;
use tracing::{debug, info, warn};

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

/// Replace every `${VAR}` in `content` with the value of the matching
/// environment variable. A reference to an unset variable is left
/// untouched (and logged) rather than silently emptied, since an empty
/// string would otherwise look like valid config.
fn resolve_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    warn!(var = var_name, "referenced environment variable is not set");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

pub struct ConfigLoader {
    user_config_path: PathBuf,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            user_config_path: Self::user_config_path(),
            project_config_path: Self::project_config_path(),
        }
    }

    fn user_config_path() -> PathBuf {
        dirs::home_dir()
            .expect("failed to get home directory")
            .join(".mdap")
            .join("mdap.toml")
    }

    fn project_config_path() -> PathBuf {
        std::env::current_dir()
            .expect("failed to get current directory")
            .join(".mdap")
            .join("mdap.toml")
    }

    pub async fn load(&self) -> Result<MdapCliConfig> {
        let mut config = MdapCliConfig::default();
        info!("loading configuration with defaults");

        match self.load_from_path(&self.user_config_path).await {
            Ok(user_config) => {
                debug!(path = %self.user_config_path.display(), "loaded user-level config");
                config.merge(user_config);
            }
            Err(e) => debug!(path = %self.user_config_path.display(), error = %e, "user-level config not found"),
        }

        match self.load_from_path(&self.project_config_path).await {
            Ok(project_config) => {
                debug!(path = %self.project_config_path.display(), "loaded project-level config");
                config.merge(project_config);
            }
            Err(e) => debug!(path = %self.project_config_path.display(), error = %e, "project-level config not found"),
        }

        Ok(config)
    }

    async fn load_from_path(&self, path: &PathBuf) -> Result<MdapCliConfig> {
        if !path.exists() {
            return Err(CliError::Config(format!("config file not found: {}", path.display())));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CliError::Config(format!("failed to read config: {}", e)))?;
        let content = resolve_env_vars(&content);

        toml::from_str(&content).map_err(|e| CliError::Config(format!("failed to parse config: {}", e)))
    }

    pub fn get_user_config_path(&self) -> &PathBuf {
        &self.user_config_path
    }

    pub fn get_project_config_path(&self) -> &PathBuf {
        &self.project_config_path
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
