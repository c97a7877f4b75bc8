//! Row types read straight out of SQLite.
//! Conversion into the shared wire types happens here so callers never see
//! raw timestamp strings.

use chrono::{DateTime, Utc};
use tracing::warn;

use helpline_types::api::AdminMessage;
use helpline_types::{Message, MessageId, UserId};

pub struct MessageRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub body: String,
    pub is_from_admin: bool,
    pub read: bool,
    pub created_at: String,
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        let created_at = parse_timestamp(&self.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on message {}", self.created_at, self.id);
            DateTime::default()
        });

        Message {
            id: MessageId(self.id),
            user_id: self.user_id.map(UserId),
            body: self.body,
            is_from_admin: self.is_from_admin,
            read: self.read,
            created_at,
        }
    }

    pub fn into_admin_message(mut self) -> AdminMessage {
        let user_name = self.user_name.take();
        AdminMessage {
            message: self.into_message(),
            user_name,
        }
    }
}

/// Fixed-width UTC form so string order in SQLite matches time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
