//! Token budget management for provider calls.
//!
//! Enforces per-capability and global token budgets to control costs.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::providers::TokenUsage;
use crate::Capability;

/// Token budget for a scope (capability or global).
pub struct TokenBudget {
    /// Maximum tokens allowed
    pub max_tokens: u32,

    used: AtomicU32,
}

impl TokenBudget {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            used: AtomicU32::new(0),
        }
    }

    /// Check if we can afford to use tokens.
    pub fn can_afford(&self, tokens: u32) -> bool {
        self.remaining() >= tokens
    }

    pub fn record(&self, tokens: u32) {
        self.used.fetch_add(tokens, Ordering::SeqCst);
    }

    pub fn remaining(&self) -> u32 {
        self.max_tokens.saturating_sub(self.used.load(Ordering::SeqCst))
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }
}

/// Accumulated provider usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmUsage {
    pub total_tokens: u32,

    pub prompt_tokens: u32,

    pub completion_tokens: u32,

    /// Number of provider calls that returned a completion
    pub llm_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,

    /// Calls that were served partly from the provider's prompt cache
    pub cache_hits: u32,

    pub cached_tokens: u32,
}

impl LlmUsage {
    /// Add token usage from a provider response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.llm_calls += 1;
        self.cached_tokens += usage.cached_tokens;

        if usage.cached_tokens > 0 {
            self.cache_hits += 1;
        }

        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // USD per million tokens: input, output, cached input
        let (input_rate, output_rate, cached_rate) = match model {
            m if m.contains("gpt-4o-mini") => (0.15, 0.6, 0.075),
            m if m.contains("gpt-4o") => (2.5, 10.0, 1.25),
            m if m.contains("gpt-4.1-mini") => (0.4, 1.6, 0.1),
            m if m.contains("gpt-4.1") => (2.0, 8.0, 0.5),
            _ => (0.15, 0.6, 0.075),
        };

        let uncached = usage.prompt_tokens.saturating_sub(usage.cached_tokens);
        let input_cost = (uncached as f64 / 1_000_000.0) * input_rate;
        let cached_cost = (usage.cached_tokens as f64 / 1_000_000.0) * cached_rate;
        let output_cost = (usage.completion_tokens as f64 / 1_000_000.0) * output_rate;

        input_cost + cached_cost + output_cost
    }
}

/// Budget tracker shared by every review an orchestrator runs.
pub struct BudgetTracker {
    capability_budgets: HashMap<Capability, TokenBudget>,

    global_budget: TokenBudget,

    usage: RwLock<LlmUsage>,
}

impl BudgetTracker {
    /// Create a tracker where each capability may use up to the global cap.
    pub fn new(global_max: u32) -> Self {
        Self::with_capability_budgets(
            global_max,
            Capability::ALL.iter().map(|c| (*c, global_max)).collect(),
        )
    }

    pub fn with_capability_budgets(global_max: u32, budgets: HashMap<Capability, u32>) -> Self {
        let capability_budgets = budgets
            .into_iter()
            .map(|(capability, max)| (capability, TokenBudget::new(max)))
            .collect();

        Self {
            capability_budgets,
            global_budget: TokenBudget::new(global_max),
            usage: RwLock::new(LlmUsage::default()),
        }
    }

    /// Check if we can afford a call for a capability.
    pub fn can_afford(&self, capability: Capability, estimated_tokens: u32) -> bool {
        let capability_ok = self
            .capability_budgets
            .get(&capability)
            .map(|b| b.can_afford(estimated_tokens))
            .unwrap_or(true);

        capability_ok && self.global_budget.can_afford(estimated_tokens)
    }

    /// Record usage after a call.
    pub fn record_usage(&self, capability: Capability, usage: &TokenUsage, model: &str) {
        let total = usage.total();

        if let Some(budget) = self.capability_budgets.get(&capability) {
            budget.record(total);
        }
        self.global_budget.record(total);

        self.usage.write().add(usage, model);
    }

    pub fn get_usage(&self) -> LlmUsage {
        self.usage.read().clone()
    }

    pub fn remaining_global(&self) -> u32 {
        self.global_budget.remaining()
    }

    pub fn remaining(&self, capability: Capability) -> u32 {
        self.capability_budgets
            .get(&capability)
            .map(|b| b.remaining())
            .unwrap_or(0)
    }
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::new(20_000)
    }
}
