//! Lets `pause`/`resume`/`cancel`, invoked as their own process, signal a
//! running `mdap run`. There is no daemon (§1: one pipeline per process
//! instance) — a live `run` writes its pid to `~/.mdap/run.pid` on start
//! and removes it on exit; these commands read that file and deliver the
//! matching Unix signal. `SIGINT`/`SIGTERM` already mean cancel (handled
//! by `run.rs`'s signal bridge); `SIGUSR1`/`SIGUSR2` are repurposed here
//! for pause/resume since POSIX reserves them for application use.

use crate::error::{CliError, Result};
use std::path::PathBuf;

pub fn write(path: &PathBuf) -> Result<()> {
    std::fs::write(path, std::process::id().to_string())?;
    Ok(())
}

pub fn remove(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
}

fn read_pid(path: &PathBuf) -> Result<u32> {
    if !path.exists() {
        return Err(CliError::Other("no running `mdap run` found (no pidfile)".to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    content
        .trim()
        .parse::<u32>()
        .map_err(|_| CliError::Other(format!("malformed pidfile: {path:?}")))
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: &str) -> Result<()> {
    let status = std::process::Command::new("kill")
        .arg(format!("-{signal}"))
        .arg(pid.to_string())
        .status()?;
    if !status.success() {
        return Err(CliError::Other(format!("failed to signal pid {pid} with {signal} (process may have exited)")));
    }
    Ok(())
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: &str) -> Result<()> {
    Err(CliError::Other("pause/resume/cancel by signal are only supported on unix".to_string()))
}

pub fn signal_pause(path: &PathBuf) -> Result<()> {
    send_signal(read_pid(path)?, "USR1")
}

pub fn signal_resume(path: &PathBuf) -> Result<()> {
    send_signal(read_pid(path)?, "USR2")
}

pub fn signal_cancel(path: &PathBuf) -> Result<()> {
    send_signal(read_pid(path)?, "INT")
}
