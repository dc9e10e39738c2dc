//! Handlers for the CLI surface named in §6: `run`, `expand`, `pause`,
//! `resume`, `cancel`, `status`, `explain`, `history`, `resources`,
//! `budget`. Each submodule owns one or a closely related group of
//! commands; `crate::bin::mdap` only parses `clap` arguments and
//! dispatches here.

pub mod budget;
pub mod inspect;
pub mod pidfile;
pub mod run;

use crate::error::{CliError, Result};

pub fn get_init_instructions() -> String {
    "mdap has not been initialized. Run `mdap init` first.".to_string()
}

pub async fn build_pipeline(
    config: &crate::config::MdapCliConfig,
) -> Result<mdap_engine::Pipeline> {
    let chat_model = crate::client::build_chat_model(&config.llm)?;
    let llm_client_config = mdap_engine::LlmClientConfig {
        timeout: config.llm.call_timeout(),
        max_retries: config.llm.max_retries,
        ..Default::default()
    };
    let client = std::sync::Arc::new(mdap_engine::LlmClient::new(chat_model, llm_client_config));

    let mdap_config = config.mdap.to_mdap_config(config.llm.model.clone());
    let budgets = config.budget.to_resource_budgets();
    let pricing = mdap_engine::PricingTable::default();

    Ok(mdap_engine::Pipeline::new(mdap_config, client, budgets, pricing))
}

pub fn require_initialized() -> Result<()> {
    if !crate::init::is_initialized() {
        return Err(CliError::Config(get_init_instructions()));
    }
    Ok(())
}

/// `mdap pause`/`mdap resume`/`mdap cancel` — signal a running `mdap
/// run`/`mdap expand` via its pidfile. See `pidfile.rs` for why this is
/// a signal rather than an in-process call.
pub fn handle_pause() -> Result<()> {
    pidfile::signal_pause(&crate::init::get_pidfile_path()?)?;
    println!("sent pause signal");
    Ok(())
}

pub fn handle_resume() -> Result<()> {
    pidfile::signal_resume(&crate::init::get_pidfile_path()?)?;
    println!("sent resume signal");
    Ok(())
}

pub fn handle_cancel() -> Result<()> {
    pidfile::signal_cancel(&crate::init::get_pidfile_path()?)?;
    println!("sent cancel signal");
    Ok(())
}
