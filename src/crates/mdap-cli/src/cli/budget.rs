//! `mdap budget <kind> <value>` — sets a hard resource limit (§4.7) by
//! writing it into the project-level config file, so it takes effect on
//! the next `run`/`expand` invocation in this project.
//!
//! Writes the TOML file directly rather than through a generic
//! serializer, which keeps the file's comments and section ordering
//! stable across edits.

use std::fs;

use crate::config::MdapCliConfig;
use crate::error::{CliError, Result};
use crate::init;

/// The three budget kinds named in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetKind {
    Tokens,
    Cost,
    Time,
}

impl BudgetKind {
    fn parse(kind: &str) -> Result<Self> {
        match kind {
            "tokens" => Ok(BudgetKind::Tokens),
            "cost" => Ok(BudgetKind::Cost),
            "time" => Ok(BudgetKind::Time),
            other => Err(CliError::UnknownBudgetKind(other.to_string())),
        }
    }
}

/// Parse `kind` and `value`, merge the new limit into the project-level
/// `./.mdap/mdap.toml`, creating the file (and its default siblings) if
/// this is the first override written in this project.
pub async fn handle_budget(kind: &str, value: &str) -> Result<()> {
    let kind = BudgetKind::parse(kind)?;

    let project_path = init::get_project_config_path()?;
    let mut config = if project_path.exists() {
        let content = fs::read_to_string(&project_path)?;
        toml::from_str(&content).map_err(|e| CliError::Config(format!("failed to parse {}: {e}", project_path.display())))?
    } else {
        MdapCliConfig::default()
    };

    match kind {
        BudgetKind::Tokens => {
            let tokens: u64 = value.parse().map_err(|_| CliError::Config(format!("invalid token count: {value}")))?;
            config.budget.max_tokens = Some(tokens);
        }
        BudgetKind::Cost => {
            let cost: f64 = value.parse().map_err(|_| CliError::Config(format!("invalid cost value: {value}")))?;
            config.budget.max_cost_usd = Some(cost);
        }
        BudgetKind::Time => {
            let seconds: u64 = value.parse().map_err(|_| CliError::Config(format!("invalid time in seconds: {value}")))?;
            config.budget.max_time_secs = Some(seconds);
        }
    }

    if let Some(parent) = project_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(&config).map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(&project_path, serialized)?;

    println!(
        "set budget.{} = {} ({})",
        match kind {
            BudgetKind::Tokens => "max_tokens",
            BudgetKind::Cost => "max_cost_usd",
            BudgetKind::Time => "max_time_secs",
        },
        value,
        project_path.display(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(BudgetKind::parse("tokens").unwrap(), BudgetKind::Tokens);
        assert_eq!(BudgetKind::parse("cost").unwrap(), BudgetKind::Cost);
        assert_eq!(BudgetKind::parse("time").unwrap(), BudgetKind::Time);
    }

    #[test]
    fn test_parse_unknown_kind_errors() {
        assert!(BudgetKind::parse("bananas").is_err());
    }
}
