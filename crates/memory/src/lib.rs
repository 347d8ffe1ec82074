//! Conversation log backends for Pixie.
//!
//! - **InMemoryLog** — process memory, for tests and throwaway runs
//! - **FileLog** — JSON file on disk, compatible with `conversations.json`

pub mod in_memory;
pub mod file_backend;

pub use in_memory::InMemoryLog;
pub use file_backend::{FileLog, ReadPolicy};
