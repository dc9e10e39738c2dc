//! `mdap` CLI entry point: parses arguments and dispatches to the
//! handlers in `mdap_cli::cli`.

use clap::{Parser, Subcommand};
use mdap_cli::cli;
use mdap_cli::config::load_config;
use mdap_cli::Result;
use mdap_cli::init;

/// Command-line driver for the MDAP voting pipeline.
#[derive(Parser)]
#[command(name = "mdap", version = mdap_cli::version::VERSION, about = "Run and inspect MDAP voting pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create `~/.mdap` and a default configuration file.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },
    /// Run the full EXPAND -> DECOMPOSE -> GENERATE -> VALIDATE pipeline on a task.
    Run {
        task: String,
        #[arg(long, default_value = "rust")]
        language: String,
    },
    /// Preview the EXPAND phase's requirements for a task.
    Expand {
        task: String,
        #[arg(long, default_value = "rust")]
        language: String,
    },
    /// Pause a running `mdap run`/`mdap expand`.
    Pause,
    /// Resume a paused `mdap run`/`mdap expand`.
    Resume,
    /// Cancel a running `mdap run`/`mdap expand`.
    Cancel,
    /// Show the last (or a named) run's final state and resource usage.
    Status {
        #[arg(long)]
        id: Option<String>,
    },
    /// Show the rationale behind each vote in a run.
    Explain {
        id: Option<String>,
    },
    /// Show the last `n` decision-tracker entries.
    History {
        #[arg(default_value_t = 20)]
        n: usize,
        #[arg(long)]
        id: Option<String>,
    },
    /// Show a run's resource-manager counters.
    Resources {
        #[arg(long)]
        id: Option<String>,
    },
    /// Set a hard resource limit: `budget tokens 100000`, `budget cost 5.0`, `budget time 1800`.
    Budget {
        kind: String,
        value: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", mdap_tooling::error::format_error_chain(&e));
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Init { force } => {
            init::initialize(force)?;
            println!("initialized {}", init::get_mdap_home()?.display());
            Ok(0)
        }
        Commands::Run { task, language } => {
            cli::require_initialized()?;
            let config = load_config().await?;
            init_logging(&config);
            Ok(cli::run::handle_run(config, task, language).await?.code())
        }
        Commands::Expand { task, language } => {
            cli::require_initialized()?;
            let config = load_config().await?;
            init_logging(&config);
            Ok(cli::run::handle_expand(config, task, language).await?.code())
        }
        Commands::Pause => {
            cli::handle_pause()?;
            Ok(0)
        }
        Commands::Resume => {
            cli::handle_resume()?;
            Ok(0)
        }
        Commands::Cancel => {
            cli::handle_cancel()?;
            Ok(0)
        }
        Commands::Status { id } => {
            cli::inspect::handle_status(id.as_deref())?;
            Ok(0)
        }
        Commands::Explain { id } => {
            cli::inspect::handle_explain(id.as_deref())?;
            Ok(0)
        }
        Commands::History { n, id } => {
            cli::inspect::handle_history(id.as_deref(), n)?;
            Ok(0)
        }
        Commands::Resources { id } => {
            cli::inspect::handle_resources(id.as_deref())?;
            Ok(0)
        }
        Commands::Budget { kind, value } => {
            cli::budget::handle_budget(&kind, &value).await?;
            Ok(0)
        }
    }
}

fn init_logging(config: &mdap_cli::config::MdapCliConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if config.logging.format == "json" {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
