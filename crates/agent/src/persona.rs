//! Persona system prompt.
//!
//! The prompt is the persona's "soul" document followed by two generated
//! sections: who is texting right now, and how to phrase picture offers so
//! the image policy can pick them up.

use std::path::Path;

use pixie_core::identity::Directory;
use tracing::{info, warn};

/// Used when no soul file is available, and written by `pixie init`.
pub const DEFAULT_SOUL: &str = "# The Tooth Fairy

You are the Tooth Fairy, texting with a young child. You are warm, playful
and gentle. You love collecting teeth, flying through the night sky and
living in your sparkling palace. Keep replies short (two or three
sentences), use simple words, and sprinkle in the occasional ✨. Never
break character, never ask for personal information, and keep everything
age-appropriate.";

/// The persona's system prompt source.
#[derive(Debug, Clone)]
pub struct Persona {
    name: String,
    soul: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, soul: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            soul: soul.into(),
        }
    }

    /// Read the soul document, falling back to a built-in one if the file
    /// is missing or unreadable.
    pub fn load(name: impl Into<String>, soul_path: &Path) -> Self {
        let soul = match std::fs::read_to_string(soul_path) {
            Ok(s) if !s.trim().is_empty() => {
                info!(path = %soul_path.display(), "Loaded persona soul");
                s
            }
            Ok(_) => {
                warn!(path = %soul_path.display(), "Soul file is empty, using built-in persona");
                DEFAULT_SOUL.to_string()
            }
            Err(e) => {
                warn!(path = %soul_path.display(), error = %e, "Soul file unreadable, using built-in persona");
                DEFAULT_SOUL.to_string()
            }
        };
        Self::new(name, soul)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn soul(&self) -> &str {
        &self.soul
    }

    /// Full system prompt for a reply to `sender` (a display name).
    pub fn system_prompt(&self, sender: &str, directory: &Directory) -> String {
        let primary = directory
            .primary()
            .map(|p| p.display_name())
            .unwrap_or_else(|| "the child".to_string());
        let guardians: Vec<String> = directory.guardians().map(|g| g.display_name()).collect();

        let mut prompt = String::with_capacity(self.soul.len() + 1024);
        prompt.push_str(self.soul.trim_end());

        prompt.push_str("\n\n## Current Conversation Context\n");
        prompt.push_str(&format!(
            "You are currently responding to a message from {sender}.\n"
        ));
        prompt.push_str(&format!(
            "- If it's from {primary}, respond as you normally would\n"
        ));
        if !guardians.is_empty() {
            prompt.push_str(&format!(
                "- If it's from {} ({primary}'s grown-ups), acknowledge them subtly but stay in character\n",
                guardians.join(" or ")
            ));
            prompt.push_str("  - You might say things like \"I know you're checking in on us! 😊\"\n");
            prompt.push_str(&format!(
                "  - Or \"Thanks for helping me understand {primary} better!\"\n"
            ));
            prompt.push_str("  - Keep it magical but acknowledge the adult in the room\n");
        }

        prompt.push_str("\n## Image Capabilities\n");
        prompt.push_str("You can send pictures. When it fits, offer a picture or a selfie.\n");
        prompt.push_str(&format!(
            "- If {primary} asks for a picture or selfie, answer warmly and say you'll send one\n"
        ));
        prompt.push_str("- Now and then you may offer pictures of your adventures\n");
        prompt.push_str("- Not every message needs a picture\n");
        prompt.push_str("- When you do send one, use a phrase such as:\n");
        prompt.push_str("  - \"Let me send you a selfie!\"\n");
        prompt.push_str("  - \"Here's a picture of what I'm seeing\"\n");
        prompt.push_str("  - \"Want to see where I am?\"\n");

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixie_core::identity::{Participant, ParticipantRole};
    use tempfile::TempDir;

    fn directory() -> Directory {
        Directory::new([
            Participant::new("ava", "+1", ParticipantRole::Primary),
            Participant::new("dan", "+2", ParticipantRole::Guardian),
            Participant::new("wife", "+3", ParticipantRole::Guardian),
        ])
    }

    #[test]
    fn prompt_has_soul_and_sections() {
        let persona = Persona::new("Tooth Fairy", "# Soul\nBe kind.");
        let prompt = persona.system_prompt("Dan", &directory());
        assert!(prompt.starts_with("# Soul\nBe kind."));
        assert!(prompt.contains("## Current Conversation Context"));
        assert!(prompt.contains("responding to a message from Dan."));
        assert!(prompt.contains("If it's from Dan or Wife (Ava's grown-ups)"));
        assert!(prompt.contains("## Image Capabilities"));
        assert!(prompt.contains("Let me send you a selfie!"));
    }

    #[test]
    fn no_guardian_lines_without_guardians() {
        let dir = Directory::new([Participant::new("ava", "+1", ParticipantRole::Primary)]);
        let prompt = Persona::new("Tooth Fairy", "soul").system_prompt("Ava", &dir);
        assert!(!prompt.contains("grown-ups"));
    }

    #[test]
    fn load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("soul.md");
        std::fs::write(&path, "I am sparkly.").unwrap();
        let persona = Persona::load("Tooth Fairy", &path);
        assert_eq!(persona.soul(), "I am sparkly.");
        assert_eq!(persona.name(), "Tooth Fairy");
    }

    #[test]
    fn missing_file_uses_builtin() {
        let dir = TempDir::new().unwrap();
        let persona = Persona::load("Tooth Fairy", &dir.path().join("nope.md"));
        assert!(persona.soul().contains("You are the Tooth Fairy"));
    }
}
