//! Broadcast messages. The message list is append-only.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{is_blank, EpochMillis, Phone, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sender: String,
    pub recipients: Vec<Phone>,
    pub timestamp: EpochMillis,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(content: impl Into<String>, sender: impl Into<String>, recipients: Vec<Phone>) -> Self {
        Self {
            content: content.into(),
            sender: sender.into(),
            recipients,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if is_blank(&self.content) {
            return Err(CoreError::Validation("Message content is required".to_string()));
        }
        if is_blank(&self.sender) {
            return Err(CoreError::Validation("Message sender is required".to_string()));
        }
        Ok(())
    }

    /// The send time, if the timestamp is in chrono's representable range.
    pub fn sent_at(&self) -> Option<Timestamp> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sent_at_decodes_millis() {
        let msg = Message {
            content: "Sports day moved".into(),
            sender: "Office".into(),
            recipients: vec![],
            timestamp: 1_700_000_000_000,
        };
        let at = msg.sent_at().unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn blank_content_rejected() {
        let msg = Message::new("  ", "Office", vec!["555".into()]);
        assert!(msg.validate().is_err());
        let msg = Message::new("Hi", "", vec![]);
        assert!(msg.validate().is_err());
        assert!(Message::new("Hi", "Office", vec![]).validate().is_ok());
    }
}
