//! The Voter: `vote(step, snapshot, generator, cfg) -> VoteResult`, the
//! first-to-ahead-by-k algorithm (§4.3).
//!
//! New code — this algorithm has no teacher analogue. It composes three
//! collaborators the Design Notes require be explicit, not ambient:
//! [`Discriminator`] (pairwise equivalence), [`ResourceManager`] (budget
//! enforcement), and [`InterruptHandler`] (cancel/pause checkpoints). The
//! suspension-point ordering below reconciles §4.3's literal algorithm
//! steps with §5's more specific checkpoint semantics: cancellation is
//! checked both before the request is issued and immediately on arrival
//! (discarding the candidate without classifying it); pause is only
//! honored after a candidate has been fully classified, so an in-flight
//! classification is never abandoned mid-way.

use std::collections::HashMap;

use async_trait::async_trait;
use mdap_core::{Candidate, Group, MDAPConfig, Step, TerminationReason, VoteResult};
use tracing::{debug, trace};

use crate::discriminator::Discriminator;
use crate::interrupt::{InterruptHandler, Signal};
use crate::red_flag;
use crate::resource::ResourceManager;

/// One sample drawn from the model for a step, plus its accounting data.
#[derive(Debug, Clone)]
pub struct GeneratedSample {
    pub text: String,
    pub model_id: String,
    pub usage: Option<mdap_core::llm::UsageMetadata>,
}

impl GeneratedSample {
    pub fn new(text: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_id: model_id.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: mdap_core::llm::UsageMetadata) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Produces one candidate sample at a time for a step. Implemented by each
/// phase executor's prompt-rendering + LLM-call logic; the Voter never
/// knows about prompts.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    async fn generate(&self, step: &Step, snapshot: &mdap_core::ContextSnapshot) -> crate::error::Result<GeneratedSample>;
}

/// The collaborators every vote needs, bundled so call sites don't thread
/// four separate references through every phase executor.
pub struct VoterContext<'a> {
    pub discriminator: &'a Discriminator,
    pub resources: &'a ResourceManager,
    pub interrupt: &'a InterruptHandler,
}

/// An optional, phase-specific semantic check layered on top of the
/// generic red-flag filter (e.g. Decompose's "dependencies must be a
/// subset of prior signatures" invariant, §4.4). Returning `Some(reason)`
/// rejects the candidate exactly as a red flag would.
pub type ExtraCheck<'a> = &'a (dyn Fn(&str) -> Option<String> + Sync);

/// Run one vote to completion. Never panics: every failure path returns a
/// `VoteResult` with an explanatory `terminated_by`.
pub async fn vote(
    step: &Step,
    snapshot: &mdap_core::ContextSnapshot,
    generator: &dyn CandidateGenerator,
    cfg: &MDAPConfig,
    ctx: &VoterContext<'_>,
    extra_check: Option<ExtraCheck<'_>>,
) -> VoteResult {
    let mut groups: HashMap<usize, Group> = HashMap::new();
    let mut next_group_id: usize = 0;
    let mut samples = 0usize;
    let mut rejections = 0usize;
    let max_rejections = cfg.max_rejections();
    let language = snapshot.get().language.clone();

    loop {
        if ctx.interrupt.checkpoint_before_request() == Signal::Cancel {
            return finalize(groups, samples, rejections, TerminationReason::Cancelled, None);
        }

        let outcome = generator.generate(step, snapshot).await;

        if ctx.interrupt.is_cancelled() {
            return finalize(groups, samples, rejections, TerminationReason::Cancelled, None);
        }

        let sample = match outcome {
            Ok(sample) => sample,
            Err(e) => {
                trace!("candidate generation failed, counting as a rejection: {e}");
                rejections += 1;
                if rejections >= max_rejections {
                    return finalize(groups, samples, rejections, TerminationReason::BudgetExhausted, None);
                }
                if ctx.interrupt.checkpoint_after_candidate().await == Signal::Cancel {
                    return finalize(groups, samples, rejections, TerminationReason::Cancelled, None);
                }
                continue;
            }
        };

        let red_flag_reason = red_flag::check(step, &language, &sample.text, cfg)
            .or_else(|| extra_check.and_then(|f| f(&sample.text)));

        if let Some(reason) = red_flag_reason {
            debug!("candidate rejected: {reason}");
            rejections += 1;
            let exhausted = rejections >= max_rejections;
            if ctx.interrupt.checkpoint_after_candidate().await == Signal::Cancel {
                return finalize(groups, samples, rejections, TerminationReason::Cancelled, None);
            }
            if exhausted {
                return finalize(groups, samples, rejections, TerminationReason::BudgetExhausted, None);
            }
            continue;
        }

        samples += 1;
        let mut candidate = Candidate::new(sample.text.clone(), sample.usage);

        let mut group_ids: Vec<usize> = groups.keys().copied().collect();
        group_ids.sort_unstable();

        let mut matched_group = None;
        for gid in group_ids {
            let representative_text = groups[&gid].representative.raw_text.clone();
            if ctx
                .discriminator
                .equivalent(snapshot, &representative_text, &sample.text)
                .await
            {
                matched_group = Some(gid);
                break;
            }
        }

        match matched_group {
            Some(gid) => {
                candidate.assign_group(gid);
                groups.get_mut(&gid).expect("matched group id must exist").push(candidate);
            }
            None => {
                let gid = next_group_id;
                next_group_id += 1;
                candidate.assign_group(gid);
                groups.insert(gid, Group::new(gid, candidate));
            }
        }

        let resource_breached = match sample.usage {
            Some(usage) => ctx.resources.record_call(&sample.model_id, usage),
            None => ctx.resources.is_breached(),
        };

        if let Some(result) = check_ahead_by_k(&groups, cfg.k, samples, rejections) {
            return result;
        }
        if samples >= cfg.max_samples {
            return finalize_with_leader(groups, samples, rejections, TerminationReason::MaxSamples);
        }
        if resource_breached {
            return finalize_with_leader(groups, samples, rejections, TerminationReason::BudgetExhausted);
        }

        if ctx.interrupt.checkpoint_after_candidate().await == Signal::Cancel {
            return finalize(groups, samples, rejections, TerminationReason::Cancelled, None);
        }
    }
}

/// Find the top and runner-up groups (by member count, tie-broken by
/// earliest `group_id`) and check the ahead-by-k condition (§4.3 step f).
fn check_ahead_by_k(
    groups: &HashMap<usize, Group>,
    k: usize,
    samples: usize,
    rejections: usize,
) -> Option<VoteResult> {
    let (top_id, top_len, runner_up_len) = leader_and_runner_up(groups)?;
    if top_len.saturating_sub(runner_up_len) >= k {
        let winner = groups[&top_id].representative.clone();
        let margin = top_len as i64 - runner_up_len as i64;
        return Some(VoteResult {
            winner: Some(winner),
            total_samples: samples,
            groups: groups.clone(),
            votes_per_group: member_counts(groups),
            winning_margin: margin,
            terminated_by: TerminationReason::AheadByK,
            rejections,
        });
    }
    None
}

/// Returns `(top_group_id, top_len, runner_up_len)`, ties broken by
/// earliest `group_id` for both ranks.
fn leader_and_runner_up(groups: &HashMap<usize, Group>) -> Option<(usize, usize, usize)> {
    let mut ordered: Vec<(usize, usize)> = groups.iter().map(|(id, g)| (*id, g.len())).collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let (top_id, top_len) = *ordered.first()?;
    let runner_up_len = ordered.get(1).map(|(_, len)| *len).unwrap_or(0);
    Some((top_id, top_len, runner_up_len))
}

fn member_counts(groups: &HashMap<usize, Group>) -> HashMap<usize, usize> {
    groups.iter().map(|(id, g)| (*id, g.len())).collect()
}

/// A `MaxSamples` or resource-triggered `BudgetExhausted` termination: the
/// largest group's representative wins, tie-broken by earliest group id.
/// `None` winner only if no candidate was ever accepted.
fn finalize_with_leader(
    groups: HashMap<usize, Group>,
    samples: usize,
    rejections: usize,
    reason: TerminationReason,
) -> VoteResult {
    let winner = leader_and_runner_up(&groups).map(|(id, _, _)| groups[&id].representative.clone());
    let margin = leader_and_runner_up(&groups)
        .map(|(_, top, runner_up)| top as i64 - runner_up as i64)
        .unwrap_or(0);
    finalize(groups, samples, rejections, reason, winner.map(|w| (w, margin)))
}

fn finalize(
    groups: HashMap<usize, Group>,
    samples: usize,
    rejections: usize,
    reason: TerminationReason,
    winner_and_margin: Option<(Candidate, i64)>,
) -> VoteResult {
    let votes_per_group = member_counts(&groups);
    let (winner, margin) = match winner_and_margin {
        Some((w, m)) => (Some(w), m),
        None => (None, 0),
    };
    VoteResult {
        winner,
        total_samples: samples,
        groups,
        votes_per_group,
        winning_margin: margin,
        terminated_by: reason,
        rejections,
    }
}
