//! Engine configuration.
//!
//! Hosts configure a session at creation time via [`EngineConfig`].
//! Every field has a default, so `EventSystem::new()` is enough for most
//! uses.

use serde::{Deserialize, Serialize};

/// Default bound on pending-trigger batches per flush.
pub const DEFAULT_MAX_TRIGGER_ITERATIONS: usize = 128;

/// Configuration for one resolution session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of trigger batches a single flush may run before it
    /// reports a trigger loop.
    pub max_trigger_iterations: usize,

    /// Whether resolved events are retained in the history tree.
    ///
    /// With this off, history queries return nothing.
    pub record_history: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_trigger_iterations: DEFAULT_MAX_TRIGGER_ITERATIONS,
            record_history: true,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trigger-loop bound (builder pattern).
    #[must_use]
    pub fn with_max_trigger_iterations(mut self, iterations: usize) -> Self {
        self.max_trigger_iterations = iterations;
        self
    }

    /// Enable or disable history recording (builder pattern).
    #[must_use]
    pub fn with_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }
}
