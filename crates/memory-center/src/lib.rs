//! Per-session agent memory.
//!
//! Four stores feed the model context:
//! - short-term: a fixed-capacity ring of recent actions
//! - working: the sub-task plan, current step and optional loop counter
//! - facts: append-only key/value notes, newest value per key wins
//! - observations: a bounded list of free-text notes
//!
//! [`AgentMemory::context`] renders them in that order, plan first.

mod records;
mod working;

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use records::{ActionRecord, Fact, Observation};
pub use working::WorkingMemory;

pub const DEFAULT_SHORT_TERM_CAPACITY: usize = 10;
pub const DEFAULT_OBSERVATION_CAPACITY: usize = 20;
/// Identical failures in a row before the context carries a warning.
pub const REPEATED_FAILURE_THRESHOLD: usize = 3;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentMemory {
    short_term: VecDeque<ActionRecord>,
    short_term_capacity: usize,
    pub working: WorkingMemory,
    facts: Vec<Fact>,
    observations: VecDeque<Observation>,
    observation_capacity: usize,
}

impl Default for AgentMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SHORT_TERM_CAPACITY, DEFAULT_OBSERVATION_CAPACITY)
    }

    pub fn with_capacity(short_term: usize, observations: usize) -> Self {
        let short_term_capacity = short_term.max(1);
        let observation_capacity = observations.max(1);
        Self {
            short_term: VecDeque::with_capacity(short_term_capacity),
            short_term_capacity,
            working: WorkingMemory::default(),
            facts: Vec::new(),
            observations: VecDeque::with_capacity(observation_capacity),
            observation_capacity,
        }
    }

    pub fn record_action(&mut self, record: ActionRecord) {
        if self.short_term.len() == self.short_term_capacity {
            self.short_term.pop_front();
        }
        self.short_term.push_back(record);
    }

    /// Recent actions, oldest first.
    pub fn recent_actions(&self) -> impl Iterator<Item = &ActionRecord> {
        self.short_term.iter()
    }

    pub fn last_action(&self) -> Option<&ActionRecord> {
        self.short_term.back()
    }

    /// Length of the trailing run of failures that share the newest record's summary.
    pub fn repeated_failures(&self) -> usize {
        let Some(last) = self.short_term.back() else {
            return 0;
        };
        if last.success {
            return 0;
        }
        self.short_term
            .iter()
            .rev()
            .take_while(|record| !record.success && record.summary == last.summary)
            .count()
    }

    pub fn remember_fact(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        debug!(key = %key, "Fact recorded");
        self.facts.push(Fact {
            key,
            value,
            recorded_at: Utc::now(),
        });
    }

    /// Newest value recorded for `key`.
    pub fn fact(&self, key: &str) -> Option<&str> {
        self.facts
            .iter()
            .rev()
            .find(|fact| fact.key == key)
            .map(|fact| fact.value.as_str())
    }

    /// Newest entry per key, in order of first appearance.
    pub fn facts(&self) -> Vec<&Fact> {
        let mut keys: Vec<&str> = Vec::new();
        for fact in &self.facts {
            if !keys.contains(&fact.key.as_str()) {
                keys.push(&fact.key);
            }
        }
        keys.into_iter()
            .filter_map(|key| self.facts.iter().rev().find(|fact| fact.key == key))
            .collect()
    }

    /// Every fact ever recorded, oldest first.
    pub fn fact_history(&self) -> &[Fact] {
        &self.facts
    }

    pub fn observe(&mut self, note: impl Into<String>) {
        let note = note.into();
        if note.trim().is_empty() {
            return;
        }
        if self.observations.len() == self.observation_capacity {
            self.observations.pop_front();
        }
        self.observations.push_back(Observation {
            note,
            recorded_at: Utc::now(),
        });
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    /// Prompt section: step progress, loop progress, facts, observations, recent actions.
    pub fn context(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        if let Some(progress) = self.working.step_progress() {
            sections.push(progress);
        }
        if let Some(progress) = self.working.loop_progress() {
            sections.push(progress);
        }

        let facts = self.facts();
        if !facts.is_empty() {
            let mut block = String::from("KNOWN FACTS:");
            for fact in facts {
                block.push_str(&format!("\n- {}: {}", fact.key, fact.value));
            }
            sections.push(block);
        }

        if !self.observations.is_empty() {
            let mut block = String::from("RECENT OBSERVATIONS:");
            for observation in &self.observations {
                block.push_str(&format!("\n- {}", observation.note));
            }
            sections.push(block);
        }

        if !self.short_term.is_empty() {
            let mut block = String::from("RECENT ACTIONS:");
            for record in &self.short_term {
                block.push_str(&format!("\n- {}", record.render()));
            }
            let repeated = self.repeated_failures();
            if repeated >= REPEATED_FAILURE_THRESHOLD {
                if let Some(last) = self.short_term.back() {
                    block.push_str(&format!(
                        "\nWARNING: \"{}\" failed {} times in a row. Try a different element or action.",
                        last.summary, repeated
                    ));
                }
            }
            sections.push(block);
        }

        sections.join("\n\n")
    }
}
