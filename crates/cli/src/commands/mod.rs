//! Command handlers for the hybrid-rag CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod check;
pub mod query;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use check::CheckCommand;
pub use query::QueryCommand;
