//! Token, call, time, and cost counters, with optional hard budgets.
//!
//! A static per-model rate table plus a `should_warn`/`is_breached`
//! threshold pattern, held as a single in-process counter guarded by one
//! mutex, per §5's "guarded by a single mutex (or equivalent atomic
//! discipline)".

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use mdap_core::llm::UsageMetadata;

/// Input/output per-token rates for one model id.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub cost_per_input_token: f64,
    pub cost_per_output_token: f64,
}

impl ModelPricing {
    pub fn cost(&self, usage: UsageMetadata) -> f64 {
        usage.input_tokens as f64 * self.cost_per_input_token
            + usage.output_tokens as f64 * self.cost_per_output_token
    }
}

/// A static price table keyed by model id, with a fallback default entry
/// for unlisted models (open question (c), see DESIGN.md).
#[derive(Debug, Clone)]
pub struct PricingTable {
    rates: HashMap<String, ModelPricing>,
    default_rate: ModelPricing,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PricingTable {
    pub fn with_defaults() -> Self {
        let mut rates = HashMap::new();
        let entries: &[(&str, f64, f64)] = &[
            ("gpt-4o", 0.000_005, 0.000_015),
            ("gpt-4-turbo", 0.000_010, 0.000_030),
            ("gpt-3.5-turbo", 0.000_0005, 0.000_0015),
            ("claude-3-opus", 0.000_015, 0.000_075),
            ("claude-3-sonnet", 0.000_003, 0.000_015),
            ("claude-3-haiku", 0.000_000_25, 0.000_001_25),
            ("gemini-1.5-pro", 0.000_001_25, 0.000_005),
            ("llama2", 0.0, 0.0),
            ("mistral", 0.0, 0.0),
        ];
        for (model, input, output) in entries {
            rates.insert(
                model.to_string(),
                ModelPricing {
                    cost_per_input_token: *input,
                    cost_per_output_token: *output,
                },
            );
        }
        Self {
            rates,
            default_rate: ModelPricing {
                cost_per_input_token: 0.000_001,
                cost_per_output_token: 0.000_002,
            },
        }
    }

    pub fn rate_for(&self, model_id: &str) -> ModelPricing {
        self.rates.get(model_id).copied().unwrap_or(self.default_rate)
    }

    pub fn insert(&mut self, model_id: impl Into<String>, rate: ModelPricing) {
        self.rates.insert(model_id.into(), rate);
    }
}

/// Optional hard limits. `None` means unbounded for that dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceBudgets {
    pub max_tokens: Option<u64>,
    pub max_cost_usd: Option<f64>,
    pub max_time: Option<Duration>,
}

/// A point-in-time read of the running counters, as persisted in the
/// final result document's `metrics` field (§6).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ResourceMetrics {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub api_calls: u64,
    pub elapsed_seconds: f64,
    pub estimated_cost_usd: f64,
}

impl ResourceMetrics {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Default)]
struct Counters {
    input_tokens: u64,
    output_tokens: u64,
    api_calls: u64,
    cost_estimate: f64,
}

/// Process-wide running counters for one pipeline run, with optional hard
/// budgets. Treated as an explicit, injected collaborator with a lifetime
/// tied to the run (per Design Notes, not a global singleton).
pub struct ResourceManager {
    counters: Mutex<Counters>,
    budgets: ResourceBudgets,
    pricing: PricingTable,
    start: Instant,
}

impl ResourceManager {
    pub fn new(budgets: ResourceBudgets, pricing: PricingTable) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            budgets,
            pricing,
            start: Instant::now(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(ResourceBudgets::default(), PricingTable::default())
    }

    /// Record one completed LLM call's usage. Returns `true` if this call
    /// pushed any configured budget over its limit — the caller (the
    /// Voter) terminates the current vote with `BudgetExhausted` when this
    /// is true.
    pub fn record_call(&self, model_id: &str, usage: UsageMetadata) -> bool {
        let cost = self.pricing.rate_for(model_id).cost(usage);
        let mut counters = self.counters.lock();
        counters.input_tokens += usage.input_tokens;
        counters.output_tokens += usage.output_tokens;
        counters.api_calls += 1;
        counters.cost_estimate += cost;
        drop(counters);
        self.is_breached()
    }

    pub fn is_breached(&self) -> bool {
        let counters = self.counters.lock();
        if let Some(max_tokens) = self.budgets.max_tokens {
            if counters.input_tokens + counters.output_tokens > max_tokens {
                return true;
            }
        }
        if let Some(max_cost) = self.budgets.max_cost_usd {
            if counters.cost_estimate > max_cost {
                return true;
            }
        }
        drop(counters);
        if let Some(max_time) = self.budgets.max_time {
            if self.start.elapsed() > max_time {
                return true;
            }
        }
        false
    }

    /// Warn threshold: 80% of any configured budget.
    pub fn should_warn(&self) -> bool {
        let counters = self.counters.lock();
        if let Some(max_tokens) = self.budgets.max_tokens {
            if max_tokens > 0 {
                let used = counters.input_tokens + counters.output_tokens;
                if used as f64 / max_tokens as f64 >= 0.8 {
                    return true;
                }
            }
        }
        if let Some(max_cost) = self.budgets.max_cost_usd {
            if max_cost > 0.0 && counters.cost_estimate / max_cost >= 0.8 {
                return true;
            }
        }
        false
    }

    pub fn metrics(&self) -> ResourceMetrics {
        let counters = self.counters.lock();
        ResourceMetrics {
            input_tokens: counters.input_tokens,
            output_tokens: counters.output_tokens,
            api_calls: counters.api_calls,
            elapsed_seconds: self.start.elapsed().as_secs_f64(),
            estimated_cost_usd: counters.cost_estimate,
        }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_known_model() {
        let table = PricingTable::with_defaults();
        let rate = table.rate_for("gpt-4o");
        let cost = rate.cost(UsageMetadata {
            input_tokens: 1000,
            output_tokens: 1000,
        });
        assert!((cost - 0.020).abs() < 1e-9);
    }

    #[test]
    fn test_pricing_unknown_model_uses_default() {
        let table = PricingTable::with_defaults();
        let rate = table.rate_for("some-unlisted-model");
        assert_eq!(rate.cost_per_input_token, 0.000_001);
    }

    #[test]
    fn test_record_call_accumulates() {
        let mgr = ResourceManager::unbounded();
        mgr.record_call(
            "gpt-4o",
            UsageMetadata {
                input_tokens: 10,
                output_tokens: 5,
            },
        );
        mgr.record_call(
            "gpt-4o",
            UsageMetadata {
                input_tokens: 10,
                output_tokens: 5,
            },
        );
        let metrics = mgr.metrics();
        assert_eq!(metrics.input_tokens, 20);
        assert_eq!(metrics.output_tokens, 10);
        assert_eq!(metrics.api_calls, 2);
    }

    #[test]
    fn test_token_budget_breach() {
        let budgets = ResourceBudgets {
            max_tokens: Some(100),
            ..Default::default()
        };
        let mgr = ResourceManager::new(budgets, PricingTable::default());
        let breached = mgr.record_call(
            "gpt-4o",
            UsageMetadata {
                input_tokens: 60,
                output_tokens: 60,
            },
        );
        assert!(breached);
        assert!(mgr.is_breached());
    }

    #[test]
    fn test_cost_budget_breach() {
        let budgets = ResourceBudgets {
            max_cost_usd: Some(0.001),
            ..Default::default()
        };
        let mgr = ResourceManager::new(budgets, PricingTable::default());
        let breached = mgr.record_call(
            "claude-3-opus",
            UsageMetadata {
                input_tokens: 1000,
                output_tokens: 0,
            },
        );
        assert!(breached);
    }

    #[test]
    fn test_unbounded_never_breaches() {
        let mgr = ResourceManager::unbounded();
        mgr.record_call(
            "gpt-4o",
            UsageMetadata {
                input_tokens: 1_000_000,
                output_tokens: 1_000_000,
            },
        );
        assert!(!mgr.is_breached());
    }

    #[test]
    fn test_should_warn_at_80_percent() {
        let budgets = ResourceBudgets {
            max_tokens: Some(100),
            ..Default::default()
        };
        let mgr = ResourceManager::new(budgets, PricingTable::default());
        mgr.record_call(
            "gpt-4o",
            UsageMetadata {
                input_tokens: 40,
                output_tokens: 40,
            },
        );
        assert!(mgr.should_warn());
        assert!(!mgr.is_breached());
    }
}
