//! Agent runtime
//!
//! Session state machine, the live conversation, the chat driver and the
//! event bus it reports progress on.

pub mod conversation;
pub mod driver;
pub mod events;
pub mod state;

// Re-export commonly used types
pub use conversation::Conversation;
pub use driver::{ChatDriver, DriverConfig};
pub use events::{AgentEvent, EventBus, LedgerKind};
pub use state::{SessionEvent, SessionState};
