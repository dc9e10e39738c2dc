//! `mdap run <task>` and `mdap expand <task>`.
//!
//! Bridges OS signals to a live pipeline's `InterruptHandler`, extended
//! with a second pair of signals for pause/resume (§4.8) beyond plain
//! cancellation.

use mdap_engine::{InterruptHandler, PersistedResult, Pipeline};

use crate::config::MdapCliConfig;
use crate::error::{ExitOutcome, Result};
use crate::run_record::RunRecord;

use super::pidfile;

/// Drive a full pipeline run to completion (or to `ERROR`/cancellation),
/// writing a `RunRecord` sidecar and printing the persisted result or
/// failure to stdout/stderr, per §6's `Persisted result` contract.
pub async fn handle_run(config: MdapCliConfig, task: String, language: String) -> Result<ExitOutcome> {
    let mut pipeline = super::build_pipeline(&config).await?;
    let interrupt = pipeline.interrupt_handler().clone();

    let pidfile_path = crate::init::get_pidfile_path()?;
    pidfile::write(&pidfile_path)?;
    let signal_task = install_signal_bridge(interrupt);

    let run_id = run_id();
    let started_at = chrono::Utc::now();

    let outcome = pipeline.run(task.clone(), language).await;

    signal_task.abort();
    pidfile::remove(&pidfile_path);

    let exit = match &outcome {
        Ok(_) => ExitOutcome::Completed,
        Err(e) => ExitOutcome::from_engine_error(e),
    };

    let result = outcome.as_ref().ok().cloned();
    let error = outcome.as_ref().err().map(|e| e.to_string());
    save_record(&pipeline, run_id, task, started_at, result, error);

    match outcome {
        Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        Err(e) => eprintln!("run failed: {e}"),
    }

    Ok(exit)
}

/// Preview just the EXPAND phase's requirements, without committing to a
/// full run.
pub async fn handle_expand(config: MdapCliConfig, task: String, language: String) -> Result<ExitOutcome> {
    let mut pipeline = super::build_pipeline(&config).await?;
    let interrupt = pipeline.interrupt_handler().clone();
    let signal_task = install_signal_bridge(interrupt);

    let run_id = run_id();
    let started_at = chrono::Utc::now();

    let outcome = pipeline.expand_only(task.clone(), language).await;
    signal_task.abort();

    let exit = match &outcome {
        Ok(_) => ExitOutcome::Completed,
        Err(e) => ExitOutcome::from_engine_error(e),
    };

    let error = outcome.as_ref().err().map(|e| e.to_string());
    save_record(&pipeline, run_id, task, started_at, None, error);

    match &outcome {
        Ok(requirements) => println!("{}", serde_json::to_string_pretty(requirements)?),
        Err(e) => eprintln!("expand failed: {e}"),
    }

    Ok(exit)
}

fn run_id() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f").to_string()
}

fn save_record(
    pipeline: &Pipeline,
    id: String,
    task: String,
    started_at: chrono::DateTime<chrono::Utc>,
    result: Option<PersistedResult>,
    error: Option<String>,
) {
    let record = RunRecord {
        id,
        task,
        started_at,
        config: pipeline.config().clone(),
        final_state: pipeline.state().label().to_string(),
        history: pipeline.history(usize::MAX),
        resources: pipeline.resources().metrics(),
        result,
        error,
    };
    if let Err(e) = record.save() {
        eprintln!("warning: failed to write run record: {e}");
    }
}

/// Spawns a task that turns OS signals into `InterruptHandler` calls.
/// `SIGINT`/`SIGTERM` cancel (same as any other CLI tool's Ctrl+C);
/// `SIGUSR1`/`SIGUSR2` pause/resume so a separate `mdap pause`/`mdap
/// resume` invocation (see `pidfile.rs`) can steer a run in progress.
fn install_signal_bridge(interrupt: InterruptHandler) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
            let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            let mut sigusr1 = signal(SignalKind::user_defined1()).expect("failed to install SIGUSR1 handler");
            let mut sigusr2 = signal(SignalKind::user_defined2()).expect("failed to install SIGUSR2 handler");

            loop {
                tokio::select! {
                    _ = sigint.recv() => { interrupt.cancel(); break; }
                    _ = sigterm.recv() => { interrupt.cancel(); break; }
                    _ = sigusr1.recv() => { interrupt.pause(); }
                    _ = sigusr2.recv() => { interrupt.resume(); }
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            interrupt.cancel();
        }
    })
}
