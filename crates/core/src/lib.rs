//! # Pixie Core
//!
//! Domain types, traits, and error definitions for the Pixie SMS persona
//! bridge. This crate has **no framework dependencies**: it defines the
//! domain model that the other crates implement against.
//!
//! Every external collaborator is a trait here:
//! - [`Provider`] — the language-model completion service
//! - [`ImageGenerator`] — the image-generation service
//! - [`Channel`] — outbound message delivery
//! - [`ConversationLog`] — bounded conversation storage
//!
//! Implementations live in their respective crates, so tests can swap in
//! in-memory or scripted versions.

pub mod error;
pub mod message;
pub mod provider;
pub mod channel;
pub mod identity;
pub mod conversation;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{PromptMessage, PromptRole};
pub use provider::{
    CompletionRequest, CompletionResponse, GeneratedImage, ImageGenerator, ImageRequest, Provider,
};
pub use channel::{Channel, OutboundMessage};
pub use identity::{Directory, Participant, ParticipantRole};
pub use conversation::{ConversationLog, LogEntry, LOG_CAPACITY};
