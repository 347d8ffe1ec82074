//! Conversation log — the bounded, append-only history of the chat.
//!
//! Every inbound message and every persona reply becomes a `LogEntry`. The
//! log keeps only the most recent [`LOG_CAPACITY`] entries; older ones are
//! dropped, not archived. Implementations live in `pixie-memory`.
//!
//! The JSON field names (`timestamp`, `from`, `phone`, `message`,
//! `image_url`) match the `conversations.json` files written by earlier
//! deployments, so an existing file can be pointed at directly.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use crate::error::MemoryError;

/// Maximum number of entries retained after any append.
pub const LOG_CAPACITY: usize = 50;

/// A single conversation log entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time the entry was recorded
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Sender identity: the persona name, a participant display name, or "Unknown"
    pub from: String,

    /// Sender address; the carrier number for persona entries
    #[serde(default)]
    pub phone: Option<String>,

    /// Message text
    pub message: String,

    /// Attached media (an image the persona sent, or MMS media from the sender)
    #[serde(default)]
    pub image_url: Option<String>,
}

impl LogEntry {
    pub fn new(
        from: impl Into<String>,
        phone: Option<String>,
        message: impl Into<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            from: from.into(),
            phone,
            message: message.into(),
            image_url,
        }
    }

    /// Override the timestamp (tests and imports).
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Calendar date of this entry in the process-local time zone.
    pub fn local_date(&self) -> NaiveDate {
        self.timestamp.with_timezone(&Local).date_naive()
    }

    pub fn has_media(&self) -> bool {
        self.image_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Accept RFC 3339 timestamps, and the offset-less local timestamps that
/// older `conversations.json` files contain.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(serde::de::Error::custom)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| serde::de::Error::custom(format!("nonexistent local time: {raw}")))
}

/// Predicate over log entries, used for daily counting.
pub type EntryPredicate<'a> = &'a (dyn Fn(&LogEntry) -> bool + Send + Sync);

/// The conversation log trait.
///
/// `append` must be atomic with respect to other appends: the push and the
/// truncation to [`LOG_CAPACITY`] happen under one lock or transaction.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    /// Name of the backend (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Append an entry, then evict the oldest entries beyond capacity.
    async fn append(&self, entry: LogEntry) -> std::result::Result<(), MemoryError>;

    /// Every retained entry, oldest first.
    async fn all(&self) -> std::result::Result<Vec<LogEntry>, MemoryError>;

    /// The most recent `k` entries, oldest first.
    async fn tail(&self, k: usize) -> std::result::Result<Vec<LogEntry>, MemoryError> {
        let mut entries = self.all().await?;
        let start = entries.len().saturating_sub(k);
        Ok(entries.split_off(start))
    }

    /// Number of retained entries.
    async fn len(&self) -> std::result::Result<usize, MemoryError> {
        Ok(self.all().await?.len())
    }

    /// Count entries recorded on `date` (local calendar) that match `predicate`.
    async fn count_on(
        &self,
        date: NaiveDate,
        predicate: EntryPredicate<'_>,
    ) -> std::result::Result<usize, MemoryError> {
        let entries = self.all().await?;
        Ok(entries
            .iter()
            .filter(|e| e.local_date() == date && predicate(*e))
            .count())
    }

    /// Count today's entries that match `predicate`.
    async fn count_today(
        &self,
        predicate: EntryPredicate<'_>,
    ) -> std::result::Result<usize, MemoryError> {
        self.count_on(Local::now().date_naive(), predicate).await
    }
}

/// Drop the oldest entries so at most [`LOG_CAPACITY`] remain.
pub fn truncate_to_capacity(entries: &mut Vec<LogEntry>) {
    if entries.len() > LOG_CAPACITY {
        let excess = entries.len() - LOG_CAPACITY;
        entries.drain(..excess);
    }
}

/// Images the persona has sent today.
pub async fn images_sent_today(
    log: &dyn ConversationLog,
    persona: &str,
) -> std::result::Result<usize, MemoryError> {
    log.count_today(&|e: &LogEntry| e.has_media() && e.from == persona)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn truncation_keeps_newest() {
        let mut entries: Vec<LogEntry> = (0..60)
            .map(|i| LogEntry::new("Ava", None, format!("msg {i}"), None))
            .collect();
        truncate_to_capacity(&mut entries);
        assert_eq!(entries.len(), LOG_CAPACITY);
        assert_eq!(entries[0].message, "msg 10");
        assert_eq!(entries[49].message, "msg 59");
    }

    #[test]
    fn truncation_is_noop_under_capacity() {
        let mut entries = vec![LogEntry::new("Ava", None, "hi", None)];
        truncate_to_capacity(&mut entries);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn json_field_names_match_legacy_file() {
        let entry = LogEntry::new(
            "Tooth Fairy",
            Some("+18005550100".into()),
            "Hello!",
            Some("https://img.example/a.png".into()),
        );
        let json = serde_json::to_value(&entry).unwrap();
        for key in ["timestamp", "from", "phone", "message", "image_url"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn parses_legacy_naive_timestamps() {
        let raw = r#"{"timestamp":"2026-01-31T14:23:10.123456","from":"Ava","phone":"+17035550001","message":"hi","image_url":null}"#;
        let entry: LogEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(
            entry.local_date(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        );
        assert!(!entry.has_media());
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let raw = r#"{"timestamp":"2026-01-31T14:23:10Z","from":"Ava","message":"hi"}"#;
        let entry: LogEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.phone, None);
        assert_eq!(entry.timestamp.to_rfc3339(), "2026-01-31T14:23:10+00:00");
    }

    #[test]
    fn empty_media_url_is_not_media() {
        let entry = LogEntry::new("Tooth Fairy", None, "hi", Some(String::new()));
        assert!(!entry.has_media());
    }

    struct VecLog(Vec<LogEntry>);

    #[async_trait]
    impl ConversationLog for VecLog {
        fn name(&self) -> &str {
            "vec"
        }

        async fn append(&self, _entry: LogEntry) -> Result<(), MemoryError> {
            Ok(())
        }

        async fn all(&self) -> Result<Vec<LogEntry>, MemoryError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn default_tail_returns_most_recent_in_order() {
        let log = VecLog(
            (0..5)
                .map(|i| LogEntry::new("Ava", None, format!("{i}"), None))
                .collect(),
        );
        let tail = log.tail(2).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].message, "3");
        assert_eq!(tail[1].message, "4");
        assert_eq!(log.tail(10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn images_today_ignores_yesterday_and_other_senders() {
        let now = Utc::now();
        let log = VecLog(vec![
            LogEntry::new("Tooth Fairy", None, "pic", Some("https://a".into())),
            LogEntry::new("Tooth Fairy", None, "pic", Some("https://b".into()))
                .at(now - Duration::days(2)),
            LogEntry::new("Ava", None, "my drawing", Some("https://c".into())),
            LogEntry::new("Tooth Fairy", None, "no pic", None),
        ]);
        assert_eq!(images_sent_today(&log, "Tooth Fairy").await.unwrap(), 1);
    }
}
