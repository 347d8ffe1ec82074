//! Turns the tail of the conversation log into the prompt message sequence.
//!
//! Role mapping: entries written by the persona become `assistant`
//! messages, everything else becomes `user`. Content from anyone other than
//! the persona or the primary participant is labeled so the model treats it
//! as background rather than as the child speaking.

use std::sync::Arc;

use pixie_core::conversation::{ConversationLog, LogEntry};
use pixie_core::error::MemoryError;
use pixie_core::identity::{Directory, ParticipantRole};
use pixie_core::message::PromptMessage;
use tracing::debug;

/// Log entries considered per request.
pub const CONTEXT_WINDOW: usize = 20;

/// Appended to the content of any entry that carried media.
pub const MEDIA_MARKER: &str = " [sent image]";

const BACKGROUND_PREFIX: &str = "[BACKGROUND INFO - Don't mention this explicitly]: ";

/// How a sender's content is presented to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The persona itself
    Persona,
    /// The primary participant
    Primary,
    /// Guardians and unknown senders
    Background,
}

impl Speaker {
    /// Classify a sender by the display name stored in the log.
    pub fn classify(display_name: &str, persona: &str, directory: &Directory) -> Self {
        if display_name == persona {
            return Speaker::Persona;
        }
        match directory.role_of_display_name(display_name) {
            ParticipantRole::Primary => Speaker::Primary,
            _ => Speaker::Background,
        }
    }
}

/// Apply the labeling rule to one piece of content.
///
/// Background content is wrapped twice: first with the sender tag, then
/// with the background marker.
pub fn label(sender: &str, speaker: Speaker, content: &str) -> String {
    match speaker {
        Speaker::Persona | Speaker::Primary => content.to_string(),
        Speaker::Background => {
            format!("{BACKGROUND_PREFIX}[Message from {sender}]: {content}")
        }
    }
}

/// Builds prompt messages from the conversation log.
pub struct ContextBuilder {
    log: Arc<dyn ConversationLog>,
    directory: Arc<Directory>,
    persona: String,
    window: usize,
}

impl ContextBuilder {
    pub fn new(
        log: Arc<dyn ConversationLog>,
        directory: Arc<Directory>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            log,
            directory,
            persona: persona.into(),
            window: CONTEXT_WINDOW,
        }
    }

    fn to_prompt(&self, entry: &LogEntry) -> PromptMessage {
        let speaker = Speaker::classify(&entry.from, &self.persona, &self.directory);
        let mut content = label(&entry.from, speaker, &entry.message);
        if entry.has_media() {
            content.push_str(MEDIA_MARKER);
        }
        match speaker {
            Speaker::Persona => PromptMessage::assistant(content),
            _ => PromptMessage::user(content),
        }
    }

    /// Build the message sequence for a reply to `current_message` from
    /// `current_sender` (a display name).
    ///
    /// The inbound message is normally already the newest log entry, in
    /// which case it is not repeated. At most `CONTEXT_WINDOW + 1`
    /// messages are returned.
    pub async fn build(
        &self,
        current_sender: &str,
        current_message: &str,
    ) -> Result<Vec<PromptMessage>, MemoryError> {
        let tail = self.log.tail(self.window).await?;
        let mut messages: Vec<PromptMessage> = tail.iter().map(|e| self.to_prompt(e)).collect();

        let speaker = Speaker::classify(current_sender, &self.persona, &self.directory);
        let current = label(current_sender, speaker, current_message);

        let already_present = messages.last().is_some_and(|last| {
            last.content == current
                || last.content.strip_suffix(MEDIA_MARKER) == Some(current.as_str())
        });

        if already_present {
            debug!(count = messages.len(), "Inbound message already in context");
        } else {
            messages.push(PromptMessage::user(current));
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixie_core::identity::Participant;
    use pixie_core::message::PromptRole;
    use pixie_memory::InMemoryLog;

    const FAIRY: &str = "Tooth Fairy";

    fn directory() -> Arc<Directory> {
        Arc::new(Directory::new([
            Participant::new("ava", "+17035550001", ParticipantRole::Primary),
            Participant::new("dan", "+17035550002", ParticipantRole::Guardian),
        ]))
    }

    fn builder(log: &InMemoryLog) -> ContextBuilder {
        ContextBuilder::new(Arc::new(log.clone()), directory(), FAIRY)
    }

    #[test]
    fn primary_and_persona_are_unlabeled() {
        assert_eq!(label("Ava", Speaker::Primary, "hi"), "hi");
        assert_eq!(label(FAIRY, Speaker::Persona, "hello"), "hello");
    }

    #[test]
    fn background_is_double_wrapped() {
        assert_eq!(
            label("Dan", Speaker::Background, "She lost a molar"),
            "[BACKGROUND INFO - Don't mention this explicitly]: [Message from Dan]: She lost a molar"
        );
    }

    #[test]
    fn classify_by_display_name() {
        let dir = directory();
        assert_eq!(Speaker::classify("Ava", FAIRY, &dir), Speaker::Primary);
        assert_eq!(Speaker::classify("Dan", FAIRY, &dir), Speaker::Background);
        assert_eq!(Speaker::classify("Unknown", FAIRY, &dir), Speaker::Background);
        assert_eq!(Speaker::classify(FAIRY, FAIRY, &dir), Speaker::Persona);
    }

    #[tokio::test]
    async fn empty_log_yields_only_current_message() {
        let log = InMemoryLog::new();
        let messages = builder(&log).build("Ava", "Hi fairy!").await.unwrap();
        assert_eq!(messages, vec![PromptMessage::user("Hi fairy!")]);
    }

    #[tokio::test]
    async fn roles_and_labels_follow_sender() {
        let log = InMemoryLog::new();
        log.append(LogEntry::new("Dan", None, "Ava lost her first molar today!", None))
            .await
            .unwrap();
        log.append(LogEntry::new(FAIRY, None, "How wonderful! ✨", None))
            .await
            .unwrap();
        log.append(LogEntry::new("Ava", None, "Can you fly?", None))
            .await
            .unwrap();

        let messages = builder(&log).build("Ava", "Can you fly?").await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, PromptRole::User);
        assert!(messages[0]
            .content
            .starts_with("[BACKGROUND INFO - Don't mention this explicitly]: [Message from Dan]: "));
        assert_eq!(messages[1].role, PromptRole::Assistant);
        assert_eq!(messages[1].content, "How wonderful! ✨");
        assert_eq!(messages[2], PromptMessage::user("Can you fly?"));
    }

    #[tokio::test]
    async fn media_marker_is_appended() {
        let log = InMemoryLog::new();
        log.append(LogEntry::new(
            FAIRY,
            None,
            "Let me send you a selfie!",
            Some("https://img.example/a.png".into()),
        ))
        .await
        .unwrap();

        let messages = builder(&log).build("Ava", "Wow!").await.unwrap();
        assert_eq!(messages[0].content, "Let me send you a selfie! [sent image]");
        assert_eq!(messages[1].content, "Wow!");
    }

    #[tokio::test]
    async fn window_is_twenty_plus_current() {
        let log = InMemoryLog::new();
        for i in 0..40 {
            log.append(LogEntry::new("Ava", None, format!("msg {i}"), None))
                .await
                .unwrap();
        }
        let messages = builder(&log).build("Ava", "brand new").await.unwrap();
        assert_eq!(messages.len(), CONTEXT_WINDOW + 1);
        assert_eq!(messages[0].content, "msg 20");
        assert_eq!(messages[CONTEXT_WINDOW].content, "brand new");
    }

    #[tokio::test]
    async fn logged_inbound_is_not_repeated() {
        let log = InMemoryLog::new();
        log.append(LogEntry::new("Dan", None, "!not a command", None))
            .await
            .unwrap();
        let messages = builder(&log).build("Dan", "!not a command").await.unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn logged_inbound_with_media_is_not_repeated() {
        let log = InMemoryLog::new();
        log.append(LogEntry::new(
            "Ava",
            None,
            "look at my tooth",
            Some("https://mms.example/1".into()),
        ))
        .await
        .unwrap();
        let messages = builder(&log).build("Ava", "look at my tooth").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "look at my tooth [sent image]");
    }

    #[tokio::test]
    async fn build_does_not_write() {
        let log = InMemoryLog::new();
        log.append(LogEntry::new("Ava", None, "hi", None)).await.unwrap();
        builder(&log).build("Ava", "again").await.unwrap();
        assert_eq!(log.len().await.unwrap(), 1);
    }
}
