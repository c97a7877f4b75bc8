use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Server-assigned ids are positive. The client uses negative ids for
/// placeholders that have not been acknowledged yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn is_local(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which conversation a message belongs to. Anonymous messages share one
/// bucket that can never be replied to or merged with a user's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreadKey {
    User(UserId),
    Anonymous,
}

impl From<Option<UserId>> for ThreadKey {
    fn from(user_id: Option<UserId>) -> Self {
        match user_id {
            Some(id) => Self::User(id),
            None => Self::Anonymous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub user_id: Option<UserId>,
    pub body: String,
    pub is_from_admin: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn thread_key(&self) -> ThreadKey {
        self.user_id.into()
    }

    /// Total display order within a thread: timestamp, then id.
    pub fn order_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.created_at, self.id)
    }

    /// Counts toward the admin's per-thread unread counter.
    pub fn awaits_admin(&self) -> bool {
        !self.is_from_admin && !self.read
    }

    /// Counts toward the end-user's home-screen badge.
    pub fn awaits_user(&self) -> bool {
        self.is_from_admin && !self.read
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("message body must not be empty")]
pub struct EmptyBody;

/// Trimmed, non-empty message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn parse(raw: &str) -> Result<Self, EmptyBody> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyBody);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
