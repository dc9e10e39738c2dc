//! The append-only record of every MDAP decision: each vote, and each
//! state-machine transition (accepted or rejected).
//!
//! Grounded on `orchestrator/src/lib.rs`'s `Orchestrator` holding a
//! `HashMap` of tasks behind `&mut self` — re-homed here behind a mutex
//! so it can be shared (`Arc<DecisionTracker>`) across concurrently
//! running phase executors and the state machine, per §5's "guarded by a
//! single mutex" requirement for cross-phase shared state.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use mdap_core::{Decision, StepType, VoteResult};

/// One append-only entry: either a vote's `Decision`, or a record of a
/// state-machine transition attempt (accepted or rejected).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum TrackedEntry {
    Vote(Decision),
    Transition {
        timestamp: DateTime<Utc>,
        from: String,
        event: String,
        to: Option<String>,
        accepted: bool,
    },
}

impl TrackedEntry {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TrackedEntry::Vote(d) => d.timestamp,
            TrackedEntry::Transition { timestamp, .. } => *timestamp,
        }
    }
}

/// Append-only decision log for one pipeline run.
#[derive(Default)]
pub struct DecisionTracker {
    entries: Mutex<Vec<TrackedEntry>>,
}

impl DecisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_vote(&self, phase: StepType, result: &VoteResult, cost_estimate: f64) {
        let decision = Decision::from_vote(phase, result, cost_estimate);
        self.entries.lock().push(TrackedEntry::Vote(decision));
    }

    pub fn record_transition(
        &self,
        from: impl Into<String>,
        event: impl Into<String>,
        to: Option<String>,
        accepted: bool,
    ) {
        self.entries.lock().push(TrackedEntry::Transition {
            timestamp: Utc::now(),
            from: from.into(),
            event: event.into(),
            to,
            accepted,
        });
    }

    /// The last `n` entries, most recent last (causal order, per §5).
    pub fn last_n(&self, n: usize) -> Vec<TrackedEntry> {
        let entries = self.entries.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    pub fn votes_for_phase(&self, phase: StepType) -> Vec<Decision> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackedEntry::Vote(d) if d.phase == phase => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn aggregate_samples_used(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackedEntry::Vote(d) => Some(d.samples_used),
                _ => None,
            })
            .sum()
    }

    pub fn aggregate_rejections(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackedEntry::Vote(d) => Some(d.rejections),
                _ => None,
            })
            .sum()
    }

    pub fn total_entries(&self) -> usize {
        self.entries.lock().len()
    }
}
