use serde::{Deserialize, Serialize};

use crate::models::{Message, MessageId, UserId};

/// Longest message excerpt carried in a notification.
const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushKind {
    /// Automatic greeting after a user's first message
    Welcome,
    /// Operator answered the user
    Reply,
}

/// Notification handed to the push transport for an admin-authored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub kind: PushKind,
    pub user_id: UserId,
    pub message_id: MessageId,
    pub preview: String,
}

impl PushNotification {
    pub fn for_message(kind: PushKind, user_id: UserId, message: &Message) -> Self {
        let preview = if message.body.chars().count() > PREVIEW_CHARS {
            let cut: String = message.body.chars().take(PREVIEW_CHARS).collect();
            format!("{}…", cut)
        } else {
            message.body.clone()
        };

        Self {
            kind,
            user_id,
            message_id: message.id,
            preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(body: &str) -> Message {
        Message {
            id: MessageId(9),
            user_id: Some(UserId(1)),
            body: body.to_string(),
            is_from_admin: true,
            read: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn short_body_kept_whole() {
        let n = PushNotification::for_message(PushKind::Reply, UserId(1), &message("Salut"));
        assert_eq!(n.preview, "Salut");
        assert_eq!(n.message_id, MessageId(9));
    }

    #[test]
    fn long_body_truncated_on_char_boundary() {
        let body = "ă".repeat(PREVIEW_CHARS + 5);
        let n = PushNotification::for_message(PushKind::Welcome, UserId(1), &message(&body));
        assert_eq!(n.preview.chars().count(), PREVIEW_CHARS + 1);
        assert!(n.preview.ends_with('…'));
    }
}
