//! Collaborator traits for the lead agent
//!
//! The engine talks to the outside world only through these traits, so
//! every backend can be swapped or mocked in tests.
//!
//! ```text
//! Generation:
//!   - GenerativeResponder: prompt + context window → reply text
//!
//! Delivery:
//!   - OutboundSender: deliver one reply to a recipient
//!   - HandoffSink: receive the once-per-conversation escalation event
//!
//! Storage:
//!   - ConversationStore: keyed conversation records
//! ```

mod delivery;
mod responder;
mod store;

pub use delivery::{HandoffSink, OutboundSender};
pub use responder::GenerativeResponder;
pub use store::ConversationStore;
