//! `status`, `explain [id]`, `history [n]`, `resources` — read-only
//! queries against the last (or a named) run's `RunRecord` sidecar.
//!
//! There is no live process to query (§1 non-goal: one pipeline per
//! process instance), so every command here is a separate invocation
//! that loads the JSON written by `mdap run`/`mdap expand` and prints a
//! view of it: load persisted state, print a view, exit.

use colored::Colorize;

use crate::error::Result;
use crate::run_record::RunRecord;
use mdap_engine::TrackedEntry;

fn load(id: Option<&str>) -> Result<RunRecord> {
    match id {
        Some(id) => RunRecord::load(id),
        None => RunRecord::load_last(),
    }
}

/// `mdap status` — the last run's task, final state, and resource usage.
pub fn handle_status(id: Option<&str>) -> Result<()> {
    let record = load(id)?;

    println!("{}", "Run status".bold());
    println!("  id:           {}", record.id);
    println!("  task:         {}", record.task);
    println!("  started at:   {}", record.started_at);
    println!("  final state:  {}", colorize_state(&record.final_state));
    if let Some(err) = &record.error {
        println!("  error:        {}", err.red());
    }
    println!(
        "  resources:    {} in / {} out tokens, {} calls, {:.2}s, ${:.4}",
        record.resources.input_tokens,
        record.resources.output_tokens,
        record.resources.api_calls,
        record.resources.elapsed_seconds,
        record.resources.estimated_cost_usd,
    );

    Ok(())
}

fn colorize_state(state: &str) -> colored::ColoredString {
    match state {
        "COMPLETED" => state.green(),
        "ERROR" => state.red(),
        _ => state.yellow(),
    }
}

/// `mdap explain [id]` — the rationale behind each vote in the run,
/// per §4.6's `Decision` record.
pub fn handle_explain(id: Option<&str>) -> Result<()> {
    let record = load(id)?;

    println!("{} {}", "Explaining run".bold(), record.id);
    let mut any = false;
    for entry in &record.history {
        if let TrackedEntry::Vote(decision) = entry {
            any = true;
            println!(
                "  [{}] {:?}: {} (margin {}, {} samples, {} tokens, ${:.4})",
                decision.timestamp.format("%H:%M:%S"),
                decision.phase,
                decision.rationale,
                decision.winning_margin,
                decision.samples_used,
                decision.tokens,
                decision.cost_estimate,
            );
        }
    }
    if !any {
        println!("  (no votes recorded)");
    }

    Ok(())
}

/// `mdap history [n]` — the last `n` decision-tracker entries (votes and
/// transitions), most recent last.
pub fn handle_history(id: Option<&str>, n: usize) -> Result<()> {
    let record = load(id)?;
    let start = record.history.len().saturating_sub(n);

    println!("{} (showing {} of {})", "Run history".bold(), record.history.len() - start, record.history.len());
    for entry in &record.history[start..] {
        match entry {
            TrackedEntry::Vote(decision) => {
                println!("  vote       {:?} -> {}", decision.phase, decision.rationale);
            }
            TrackedEntry::Transition { from, event, to, accepted, .. } => {
                let arrow = if *accepted { "->".green() } else { "-x>".red() };
                println!("  transition {from} {arrow} {} ({event})", to.as_deref().unwrap_or("<rejected>"));
            }
        }
    }

    Ok(())
}

/// `mdap resources` — the run's resource-manager counters.
pub fn handle_resources(id: Option<&str>) -> Result<()> {
    let record = load(id)?;

    println!("{}", "Resource usage".bold());
    println!("  input tokens:   {}", record.resources.input_tokens);
    println!("  output tokens:  {}", record.resources.output_tokens);
    println!("  api calls:      {}", record.resources.api_calls);
    println!("  elapsed:        {:.2}s", record.resources.elapsed_seconds);
    println!("  estimated cost: ${:.4}", record.resources.estimated_cost_usd);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_state_does_not_panic_on_unknown_state() {
        let _ = colorize_state("SOME_NEW_STATE");
    }
}
