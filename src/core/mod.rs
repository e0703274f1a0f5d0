//! Core engine types: identifiers, configuration, errors.
//!
//! These are shared by every other module and carry no behaviour of their
//! own.

pub mod ids;
pub mod config;
pub mod error;

pub use ids::{EffectId, EventId, EventName, Priority, SourceId, StateKey};
pub use config::{EngineConfig, DEFAULT_MAX_TRIGGER_ITERATIONS};
pub use error::{ResolutionError, Result};
