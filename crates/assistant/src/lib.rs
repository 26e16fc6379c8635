//! Wine chat orchestration.
//!
//! Glues the pieces together: detects record intents, resolves which wine a
//! message refers to, and routes open questions through a [`Brain`] whose
//! SQL answers are gated, rewritten and executed against the catalog. The
//! [`Assistant`] is the single entry point the HTTP layer calls per chat
//! message.

pub mod api_types;
pub mod assistant;
pub mod brain;
pub mod chat_model;
pub mod error;
pub mod intent;
pub mod reply;

#[doc(hidden)]
pub mod testing;

pub use assistant::Assistant;
pub use brain::{classify_reply, Brain, BrainRequest, BrainTurn};
pub use chat_model::{ChatModelBrain, ChatModelConfig};
pub use error::{AssistantError, BrainError, Result};
pub use intent::{detect, Intent};
