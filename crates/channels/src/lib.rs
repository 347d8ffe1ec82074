//! Outbound channel implementations for Pixie.
//!
//! Every reply leaves the process through a `pixie_core::Channel`.
//!
//! Available channels:
//! - **Twilio** — Programmable Messaging REST API (SMS + MMS)
//! - **Recording** — keeps every message in memory; used for dry runs and tests

pub mod recording;
pub mod twilio;

pub use recording::RecordingChannel;
pub use twilio::{TwilioChannel, TwilioCredentials};
