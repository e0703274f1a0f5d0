//! Modifiable values.
//!
//! - [`Modifiable`]: an attribute with a stored base and an effective value
//! - [`ModifiableMethod`]: a capability query whose answer modifiers can change
//!
//! Both route reads through `EventSystem::state_value`, so the answer always
//! reflects the modifiers registered at the time of the read. Modifiers may
//! themselves read other modifiable values; each read recomputes from the
//! current base values, which makes mutually dependent values resolve to
//! an evaluation-order-dependent result instead of an error.

mod modifiable;

pub use modifiable::{Modifiable, ModifiableMethod};
