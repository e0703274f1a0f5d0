//! Events and resolution history.
//!
//! - [`EventKind`]: definition contract implemented by payload types
//! - [`Event`]: a payload plus its resolution bookkeeping
//! - [`HistoryTree`]: parent/child record of everything resolved in a session
//!
//! ## Design Philosophy
//!
//! The engine knows nothing about damage, movement or turns. Domain code
//! defines its own event kinds and the engine only supplies naming,
//! branching and ancestry.

mod event;
mod history;

pub use event::{Event, EventKind};
pub use history::HistoryTree;
