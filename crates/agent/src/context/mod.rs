//! Prompt context assembly.
//!
//! | Source | Role | Label |
//! |--------|------|-------|
//! | Persona entries | assistant | none |
//! | Primary participant | user | none |
//! | Guardians, unknown senders | user | sender tag + background marker |
//!
//! Entries that carried media get a trailing ` [sent image]` marker.

pub mod builder;

pub use builder::{label, ContextBuilder, Speaker, CONTEXT_WINDOW, MEDIA_MARKER};
