//! Ordered trigger-phrase matching shared by the classifier and risk scorer.
//!
//! A table is a list of `(label, triggers)` rules. Rules are tested in
//! order, triggers within a rule in order, and the first hit decides the
//! label. Matching is case-insensitive literal substring search.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::policy::PolicyError;

/// The trigger phrase that decided a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMatch<L> {
    /// The label the trigger belongs to
    pub label: L,

    /// The trigger phrase as written in the policy
    pub trigger: String,

    /// Byte offset of the match in the clause
    pub start: usize,

    /// Byte offset one past the match
    pub end: usize,
}

#[derive(Debug, Clone)]
struct CompiledTrigger {
    phrase: String,
    pattern: Regex,
}

#[derive(Debug, Clone)]
pub(crate) struct RuleTable<L> {
    rules: Vec<(L, Vec<CompiledTrigger>)>,
}

impl<L: Copy> RuleTable<L> {
    /// Compile rules into case-insensitive literal patterns.
    pub(crate) fn compile<'a, I>(rules: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (L, &'a [String])>,
    {
        let mut compiled = Vec::new();
        for (label, triggers) in rules {
            let mut patterns = Vec::with_capacity(triggers.len());
            for phrase in triggers {
                let pattern = RegexBuilder::new(&regex::escape(phrase))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        PolicyError::ValidationError(format!(
                            "Trigger '{}' cannot be compiled: {}",
                            phrase, e
                        ))
                    })?;
                patterns.push(CompiledTrigger {
                    phrase: phrase.clone(),
                    pattern,
                });
            }
            compiled.push((label, patterns));
        }
        Ok(Self { rules: compiled })
    }

    /// Find the first rule, in table order, with a trigger present in `text`.
    pub(crate) fn first_match(&self, text: &str) -> Option<TriggerMatch<L>> {
        for (label, triggers) in &self.rules {
            for trigger in triggers {
                if let Some(m) = trigger.pattern.find(text) {
                    return Some(TriggerMatch {
                        label: *label,
                        trigger: trigger.phrase.clone(),
                        start: m.start(),
                        end: m.end(),
                    });
                }
            }
        }
        None
    }

    /// Labels in precedence order.
    pub(crate) fn labels(&self) -> impl Iterator<Item = L> + '_ {
        self.rules.iter().map(|(label, _)| *label)
    }
}
