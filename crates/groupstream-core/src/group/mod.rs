//! Group state: membership registry and conversation history.

pub mod history;
pub mod registry;

pub use history::GroupHistoryStore;
pub use registry::GroupRegistry;
