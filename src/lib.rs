//! # effect-engine
//!
//! A re-entrant effect-resolution runtime for rules engines.
//!
//! Domain code describes *events* (things that happen) and registers
//! *effects* that rewrite, react to, observe or modify them. The engine
//! decides the order everything runs in.
//!
//! ## Design Principles
//!
//! 1. **Content-Agnostic**: No units, damage or terrain. Games define event
//!    kinds and effects; the engine only dispatches.
//!
//! 2. **Deterministic Order**: Every choice is made by priority, then
//!    registration order. Nothing depends on hash iteration order.
//!
//! 3. **Explicit Sessions**: All state lives in an [`EventSystem`] passed by
//!    reference. Independent sessions never share anything.
//!
//! ## Effect Kinds
//!
//! - **Replacement**: supersedes an event, usually by resolving a branch of it
//! - **Trigger**: queues a deferred reaction, run on the next flush
//! - **Hook**: observes completed events for bookkeeping
//! - **StateModifier**: folds over a modifiable attribute or method value
//!
//! ## Example
//!
//! ```
//! use effect_engine::{Effect, Event, EventKind, EventSystem, Replacement};
//!
//! #[derive(Clone, Debug)]
//! struct Hit { value: i64 }
//!
//! impl EventKind for Hit {
//!     type Output = i64;
//!     fn resolve(&self, _system: &EventSystem) -> i64 {
//!         self.value
//!     }
//! }
//!
//! struct Double;
//!
//! impl Replacement<Hit> for Double {
//!     fn resolve(&self, system: &EventSystem, event: &Event<Hit>) -> Option<i64> {
//!         system.resolve(&mut event.branch(|hit| hit.value *= 2))
//!     }
//! }
//!
//! let system = EventSystem::new();
//! system.register(Effect::replacement(Double));
//! assert_eq!(system.resolve_payload(Hit { value: 3 }), Some(6));
//! ```
//!
//! ## Modules
//!
//! - `core`: identifiers, configuration, errors
//! - `events`: event definitions, branching, history tree
//! - `effects`: effect kinds and the registry
//! - `triggers`: pending-trigger queue
//! - `engine`: the resolution session
//! - `state`: modifiable attributes and methods

pub mod core;
pub mod events;
pub mod effects;
pub mod triggers;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use crate::core::{
    EffectId, EventId, EventName, Priority, SourceId, StateKey,
    EngineConfig, ResolutionError, Result, DEFAULT_MAX_TRIGGER_ITERATIONS,
};

pub use crate::events::{Event, EventKind, HistoryTree};

pub use crate::effects::{
    Effect, EffectBinding, EffectKind, EffectRegistry,
    Hook, HookSet, Replacement, StateModifier, Trigger,
};

pub use crate::triggers::{defer, PendingTrigger, PendingTriggerQueue, TriggerAction};

pub use crate::engine::EventSystem;

pub use crate::state::{Modifiable, ModifiableMethod};
