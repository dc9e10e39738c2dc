//! # mdap - MDAP pipeline CLI
//!
//! A standalone command-line driver for the Massively Decomposed Agentic
//! Process (MDAP) voting pipeline. `mdap` runs entirely in one process per
//! invocation, with no background server: `run`/`expand` drive a pipeline
//! to completion and persist a JSON run record, while `status`/`explain`/
//! `history`/`resources` read that record back from a separate invocation,
//! and `pause`/`resume`/`cancel` signal a running `mdap run` by pidfile.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example() -> anyhow::Result<()> {
//! use mdap_cli::config::load_config;
//!
//! let config = load_config().await?;
//! let mut pipeline = mdap_cli::cli::build_pipeline(&config).await?;
//! let result = pipeline.run("implement a stack", "rust").await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod init;
pub mod run_record;
pub mod version;

mod error;

pub use config::{load_config, ConfigLoader, MdapCliConfig};
pub use error::{CliError, ExitOutcome, Result};
pub use run_record::RunRecord;
pub use version::{full_version as version_info, short_version, VersionInfo};
