//! Grouping records into conversations.

use std::collections::HashMap;
use time::OffsetDateTime;

use crate::filter::TimeFilter;
use crate::format::{PREVIEW_CHARS, truncate};
use crate::records::MessageRecord;

/// All records sharing one chat id, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub chat_id: String,
    pub messages: Vec<MessageRecord>,
}

impl Conversation {
    /// Newest message; conversations are never built empty
    pub fn latest(&self) -> &MessageRecord {
        &self.messages[0]
    }

    pub fn latest_at(&self) -> Option<OffsetDateTime> {
        self.latest().created_at()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn sender_name(&self) -> &str {
        self.latest().sender_name()
    }

    pub fn username(&self) -> Option<&str> {
        self.latest().username()
    }

    /// Sidebar preview of the newest user message
    pub fn preview(&self) -> String {
        truncate(self.latest().user_message(), PREVIEW_CHARS)
    }

    /// Messages to show in the open thread: filtered, oldest first
    pub fn thread(&self, filter: TimeFilter, now: OffsetDateTime) -> Vec<&MessageRecord> {
        let mut visible = filter.apply(&self.messages, now);
        visible.reverse();
        visible
    }

    pub fn find_message(&self, record_id: &str) -> Option<&MessageRecord> {
        self.messages
            .iter()
            .find(|m| m.record_id().as_deref() == Some(record_id))
    }
}

fn newest_first(a: &MessageRecord, b: &MessageRecord) -> std::cmp::Ordering {
    b.created_at().cmp(&a.created_at())
}

/// Partition records by chat id and order everything newest first.
///
/// Records without a chat id are dropped. Undated records sort after dated
/// ones; ties keep their input order.
pub fn group_conversations(records: &[MessageRecord]) -> Vec<Conversation> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut conversations: Vec<Conversation> = Vec::new();

    for record in records {
        let Some(chat_id) = record.chat_id() else {
            continue;
        };
        match index.get(&chat_id) {
            Some(&idx) => conversations[idx].messages.push(record.clone()),
            None => {
                index.insert(chat_id.clone(), conversations.len());
                conversations.push(Conversation {
                    chat_id,
                    messages: vec![record.clone()],
                });
            }
        }
    }

    for conversation in &mut conversations {
        conversation.messages.sort_by(newest_first);
    }
    conversations.sort_by(|a, b| newest_first(a.latest(), b.latest()));
    conversations
}

pub fn find_conversation<'a>(
    conversations: &'a [Conversation],
    chat_id: &str,
) -> Option<&'a Conversation> {
    conversations.iter().find(|c| c.chat_id == chat_id)
}
