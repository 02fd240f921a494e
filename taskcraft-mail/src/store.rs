//! File-backed mailbox storage
//!
//! One JSON file per message:
//!
//! ```text
//! {base_path}/
//!   {message_id}.json
//! ```

use crate::message::EmailMessage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use taskcraft_error::{Error, ErrorKind, Result};

/// Default number of messages returned by a listing
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Hard cap on listing size
pub const MAX_LIST_LIMIT: usize = 1000;

/// File-backed mailbox
pub struct MailStore {
    base_path: PathBuf,
    seq: AtomicU64,
}

impl MailStore {
    /// Open (creating if needed) a mailbox directory
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            Error::new(
                ErrorKind::MailboxFailed,
                format!("Failed to create mailbox directory: {}", e),
            )
            .with_operation("mailbox::new")
        })?;
        Ok(Self {
            base_path,
            seq: AtomicU64::new(0),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn message_path(&self, id: &str) -> PathBuf {
        let safe_id = id.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.base_path.join(format!("{}.json", safe_id))
    }

    fn generate_id(&self) -> String {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("msg_{:x}_{:x}", millis, seq)
    }

    /// Capture a new message into the mailbox, returning the stored record
    pub fn deliver(
        &self,
        from_addr: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<EmailMessage> {
        let date = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let message = EmailMessage {
            id: self.generate_id(),
            from_addr: from_addr.into(),
            to,
            subject: subject.into(),
            text: text.into(),
            date,
        };

        self.save(&message)?;
        Ok(message)
    }

    /// Persist a message record (overwrites an existing id)
    pub fn save(&self, message: &EmailMessage) -> Result<()> {
        let path = self.message_path(&message.id);
        let json = serde_json::to_string_pretty(message)
            .map_err(|e| Error::new(ErrorKind::SerializationFailed, e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| {
            Error::new(
                ErrorKind::MailboxFailed,
                format!("Failed to write message {}: {}", message.id, e),
            )
            .with_operation("mailbox::save")
        })?;
        Ok(())
    }

    /// List captured messages, newest first.
    ///
    /// `query` is an optional case-insensitive substring match over
    /// subject/from/recipients/body; `limit` is clamped to 1..=1000.
    pub fn list(&self, query: Option<&str>, limit: usize) -> Result<Vec<EmailMessage>> {
        let entries = std::fs::read_dir(&self.base_path).map_err(|e| {
            Error::new(
                ErrorKind::MailboxFailed,
                format!("Failed to read mailbox: {}", e),
            )
            .with_operation("mailbox::list")
        })?;

        let query = query.unwrap_or("");
        let mut messages = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Unreadable or malformed records are skipped, not fatal
            let Ok(json) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Ok(message) = serde_json::from_str::<EmailMessage>(&json) else {
                continue;
            };
            if message.matches_query(query) {
                messages.push(message);
            }
        }

        messages.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        messages.truncate(limit);
        Ok(messages)
    }

    /// Fetch one message by id
    pub fn get(&self, id: &str) -> Result<EmailMessage> {
        let path = self.message_path(id);

        let json = std::fs::read_to_string(&path)
            .map_err(|_| Error::message_not_found(id).with_operation("mailbox::get"))?;

        serde_json::from_str(&json).map_err(|e| {
            Error::new(
                ErrorKind::SerializationFailed,
                format!("Failed to parse message {}: {}", id, e),
            )
            .with_operation("mailbox::get")
        })
    }

    /// Number of stored messages
    pub fn len(&self) -> Result<usize> {
        Ok(self.list(None, MAX_LIST_LIMIT)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
