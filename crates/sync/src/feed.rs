//! Notification feed over the append-only message list.

use iems_core::message::Message;
use iems_core::types::Phone;

/// Tracks which messages have been surfaced already.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    seen: usize,
    /// When set, only messages addressed to this phone (or to everyone)
    /// are surfaced.
    recipient: Option<Phone>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_recipient(phone: impl Into<Phone>) -> Self {
        Self {
            seen: 0,
            recipient: Some(phone.into()),
        }
    }

    /// Messages not returned by a previous call. A list shorter than what
    /// was already seen means the cache was reset, and everything counts
    /// as new again.
    pub fn observe<'a>(&mut self, messages: &'a [Message]) -> Vec<&'a Message> {
        if messages.len() < self.seen {
            self.seen = 0;
        }
        let fresh = messages[self.seen..]
            .iter()
            .filter(|m| self.is_addressed(m))
            .collect();
        self.seen = messages.len();
        fresh
    }

    fn is_addressed(&self, message: &Message) -> bool {
        match &self.recipient {
            None => true,
            Some(phone) => message.recipients.is_empty() || message.recipients.contains(phone),
        }
    }
}
