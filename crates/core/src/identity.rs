//! Identity resolution — who is texting, and what may they do.
//!
//! The bridge serves a fixed, small set of participants configured at
//! startup. Exactly one of them is normally the *primary* user (the person
//! the persona is talking to); the others are *guardians* who may issue
//! admin commands and whose messages are passed to the model as background.
//!
//! Lookups are exact-match on the address. There is no fuzzy matching and
//! no normalization: `+15550001111` and `15550001111` are different senders.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Display name used for addresses that are not in the directory.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// What a participant is allowed to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// The person the persona is talking to
    Primary,
    /// An observer who may issue admin commands
    Guardian,
    /// Not in the directory
    #[default]
    Unknown,
}

/// A configured participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Configuration key, e.g. `ava`
    pub name: String,

    /// Contact address (phone number)
    pub address: String,

    pub role: ParticipantRole,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        role: ParticipantRole,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            role,
        }
    }

    /// The placeholder returned for an unresolved address.
    pub fn unknown(address: impl Into<String>) -> Self {
        Self {
            name: UNKNOWN_SENDER.to_lowercase(),
            address: address.into(),
            role: ParticipantRole::Unknown,
        }
    }

    /// Name as written to the conversation log: first letter upper-cased.
    pub fn display_name(&self) -> String {
        capitalize(&self.name)
    }

    pub fn is_primary(&self) -> bool {
        self.role == ParticipantRole::Primary
    }

    pub fn is_guardian(&self) -> bool {
        self.role == ParticipantRole::Guardian
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// The static allow-list of participants.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    participants: Vec<Participant>,
}

impl Directory {
    /// Build a directory. Participants without an address are dropped.
    pub fn new(participants: impl IntoIterator<Item = Participant>) -> Self {
        let participants: Vec<Participant> = participants
            .into_iter()
            .filter(|p| {
                let keep = !p.address.trim().is_empty();
                if !keep {
                    debug!(name = %p.name, "Dropping participant with no address");
                }
                keep
            })
            .collect();
        Self { participants }
    }

    /// Map an address to a participant, or to `Participant::unknown`.
    pub fn resolve(&self, address: &str) -> Participant {
        self.participants
            .iter()
            .find(|p| p.address == address)
            .cloned()
            .unwrap_or_else(|| Participant::unknown(address))
    }

    /// Whether the address belongs to a configured participant.
    pub fn is_allowed(&self, address: &str) -> bool {
        self.participants.iter().any(|p| p.address == address)
    }

    /// Whether the address belongs to a guardian.
    pub fn is_guardian(&self, address: &str) -> bool {
        self.participants
            .iter()
            .any(|p| p.address == address && p.is_guardian())
    }

    /// Classify a display name as stored in the conversation log.
    pub fn role_of_display_name(&self, display_name: &str) -> ParticipantRole {
        self.participants
            .iter()
            .find(|p| p.display_name() == display_name)
            .map(|p| p.role)
            .unwrap_or(ParticipantRole::Unknown)
    }

    /// The primary participant, if one is configured.
    pub fn primary(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_primary())
    }

    /// All guardians, in configuration order.
    pub fn guardians(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_guardian())
    }

    /// Configured participant names, in configuration order.
    pub fn names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> Directory {
        Directory::new(vec![
            Participant::new("ava", "+17035550001", ParticipantRole::Primary),
            Participant::new("dan", "+17035550002", ParticipantRole::Guardian),
            Participant::new("wife", "+17035550003", ParticipantRole::Guardian),
        ])
    }

    #[test]
    fn resolves_exact_address() {
        let dir = family();
        let p = dir.resolve("+17035550001");
        assert_eq!(p.name, "ava");
        assert_eq!(p.display_name(), "Ava");
        assert!(p.is_primary());
    }

    #[test]
    fn unresolved_address_is_unknown_not_error() {
        let dir = family();
        let p = dir.resolve("+19995550000");
        assert_eq!(p.role, ParticipantRole::Unknown);
        assert_eq!(p.display_name(), UNKNOWN_SENDER);
        assert!(!dir.is_allowed("+19995550000"));
    }

    #[test]
    fn no_fuzzy_matching() {
        let dir = family();
        assert!(!dir.is_allowed("17035550001"));
        assert!(!dir.is_allowed("+17035550001 "));
    }

    #[test]
    fn guardian_check_is_role_based() {
        let dir = family();
        assert!(dir.is_guardian("+17035550002"));
        assert!(dir.is_guardian("+17035550003"));
        assert!(!dir.is_guardian("+17035550001"));
        assert!(!dir.is_guardian("+19995550000"));
    }

    #[test]
    fn empty_addresses_are_dropped() {
        let dir = Directory::new(vec![
            Participant::new("ava", "+17035550001", ParticipantRole::Primary),
            Participant::new("dan", "", ParticipantRole::Guardian),
        ]);
        assert_eq!(dir.names(), vec!["ava".to_string()]);
        assert!(!dir.is_allowed(""));
    }

    #[test]
    fn role_lookup_by_display_name() {
        let dir = family();
        assert_eq!(dir.role_of_display_name("Ava"), ParticipantRole::Primary);
        assert_eq!(dir.role_of_display_name("Wife"), ParticipantRole::Guardian);
        assert_eq!(dir.role_of_display_name("Tooth Fairy"), ParticipantRole::Unknown);
    }

    #[test]
    fn capitalize_handles_edge_cases() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("dAN"), "Dan");
        assert_eq!(capitalize("élodie"), "Élodie");
    }
}
