//! Effect system.
//!
//! Effects are the building blocks of rules content:
//! - [`Effect`]: a registrable effect of one of the four [`EffectKind`]s
//! - [`Replacement`], [`Trigger`], [`Hook`], [`StateModifier`]: per-kind behaviour
//! - [`EffectRegistry`]: keyed, insertion-ordered storage for dispatch
//!
//! ## Design Philosophy
//!
//! The set of kinds is closed. Domain content never adds a fifth kind; it
//! implements one of the four traits and lets the engine decide when to
//! call it.

mod effect;
mod registry;

pub use effect::{
    Effect, EffectBinding, EffectKind, Hook, HookSet, Replacement, StateModifier, Trigger,
};
pub use registry::EffectRegistry;

pub(crate) use registry::Candidate;
