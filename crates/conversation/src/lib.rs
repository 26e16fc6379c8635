//! Per-user conversation state and reference resolution.
//!
//! When the assistant shows a list of wines, this crate remembers it per
//! user ([`ContextStore`]) and later turns "position 2", "второе" or
//! "мерло" back into concrete wines ([`ReferenceResolver`]). Context is
//! ephemeral: it expires after inactivity and is replaced wholesale by each
//! new result list.

pub mod context;
pub mod reference;
pub mod resolver;

pub use context::{ContextEntry, ContextStore, PendingAction, DEFAULT_TTL};
pub use reference::{parse_position_reference, PositionReference};
pub use resolver::{entry_from_brief, ReferenceResolver, Resolution};
