use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Message, MessageId, UserId};

// -- Auth --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// JWT claims issued by the account service and checked by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// -- Messages --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyRequest {
    pub user_id: UserId,
    pub message: String,
}

/// Flat admin listing row: a message plus the sender's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminMessage {
    #[serde(flatten)]
    pub message: Message,
    pub user_name: Option<String>,
}

// -- Read state --

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub message_ids: Option<Vec<MessageId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSelector {
    /// Every unread user-authored message in one thread.
    User(UserId),
    /// Exactly these ids, restricted to user-authored messages.
    Ids(Vec<MessageId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("either user_id or message_ids is required")]
    Missing,
    #[error("user_id and message_ids are mutually exclusive")]
    Ambiguous,
}

impl MarkReadRequest {
    pub fn selector(self) -> Result<ReadSelector, SelectorError> {
        let ids = self.message_ids.filter(|ids| !ids.is_empty());
        match (self.user_id, ids) {
            (Some(user_id), None) => Ok(ReadSelector::User(user_id)),
            (None, Some(ids)) => Ok(ReadSelector::Ids(ids)),
            (None, None) => Err(SelectorError::Missing),
            (Some(_), Some(_)) => Err(SelectorError::Ambiguous),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteThreadResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_by_user() {
        let req: MarkReadRequest = serde_json::from_str(r#"{"user_id": 7}"#).unwrap();
        assert_eq!(req.selector(), Ok(ReadSelector::User(UserId(7))));
    }

    #[test]
    fn selector_by_ids() {
        let req: MarkReadRequest = serde_json::from_str(r#"{"message_ids": [1, 2]}"#).unwrap();
        assert_eq!(
            req.selector(),
            Ok(ReadSelector::Ids(vec![MessageId(1), MessageId(2)]))
        );
    }

    #[test]
    fn selector_missing() {
        assert_eq!(MarkReadRequest::default().selector(), Err(SelectorError::Missing));

        let empty: MarkReadRequest = serde_json::from_str(r#"{"message_ids": []}"#).unwrap();
        assert_eq!(empty.selector(), Err(SelectorError::Missing));
    }

    #[test]
    fn selector_both_is_ambiguous() {
        let req: MarkReadRequest =
            serde_json::from_str(r#"{"user_id": 7, "message_ids": [1]}"#).unwrap();
        assert_eq!(req.selector(), Err(SelectorError::Ambiguous));
    }

    #[test]
    fn role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
