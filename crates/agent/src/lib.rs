//! The reply engine for Pixie.
//!
//! An inbound SMS goes through the [`Bridge`]:
//!
//! 1. **Authorize** the sender against the participant directory
//! 2. **Log** the message in the bounded conversation log
//! 3. **Build context** from the last 20 entries ([`ContextBuilder`])
//! 4. **Complete** with the persona prompt ([`Persona`])
//! 5. **Maybe attach an image** under the daily quota ([`image_policy`])
//! 6. **Reply** through the outbound channel
//!
//! Guardians can also send `!` commands ([`admin`]) that read the log
//! without involving the model.

pub mod admin;
pub mod bridge;
pub mod context;
pub mod image_policy;
pub mod persona;

pub use admin::AdminCommand;
pub use bridge::{
    Bridge, BridgeSettings, HealthReport, ImageSettings, InboundMessage, Outcome, FALLBACK_TEXT,
};
pub use context::{ContextBuilder, Speaker};
pub use image_policy::{ImagePolicy, Quota, Scene};
pub use persona::{Persona, DEFAULT_SOUL};
