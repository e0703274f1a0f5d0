//! Error types.
//!
//! The engine itself never rejects a well-formed event. Invalid events are
//! skipped and domain failures are modelled as events that resolve to
//! nothing. The only engine-level failure is a runaway trigger chain.

/// Errors surfaced by a resolution session.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("trigger loop detected: pending triggers still queued after {iterations} batches")]
    TriggerLoop { iterations: usize },
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, ResolutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_loop_message() {
        let err = ResolutionError::TriggerLoop { iterations: 128 };
        assert_eq!(
            err.to_string(),
            "trigger loop detected: pending triggers still queued after 128 batches"
        );
    }
}
