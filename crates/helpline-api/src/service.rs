use helpline_db::Database;
use helpline_types::api::{AdminMessage, ReadSelector};
use helpline_types::{Message, MessageBody, MessageId, UserId};

use crate::error::ApiError;
use crate::responder::AutoResponder;

/// Result of storing a user-authored message.
#[derive(Debug)]
pub struct Created {
    pub message: Message,
    /// Greeting stored behind a first message, if one was sent.
    pub welcome: Option<Message>,
}

/// Store-side rules over the message store. Every method is blocking and is
/// called from `spawn_blocking` by the handlers.
pub struct MessageService {
    db: Database,
    responder: AutoResponder,
}

impl MessageService {
    pub fn new(db: Database, responder: AutoResponder) -> Self {
        Self { db, responder }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn create_user_message(
        &self,
        user_id: Option<UserId>,
        raw: &str,
    ) -> Result<Created, ApiError> {
        let body = MessageBody::parse(raw)?;
        let message = self.db.insert_message(user_id, &body, false)?;
        let welcome = self.responder.after_user_message(&self.db, &self.db, &message);

        Ok(Created { message, welcome })
    }

    pub fn reply(&self, user_id: UserId, raw: &str) -> Result<Message, ApiError> {
        let body = MessageBody::parse(raw)?;
        Ok(self.db.insert_message(Some(user_id), &body, true)?)
    }

    pub fn list_all(&self) -> Result<Vec<AdminMessage>, ApiError> {
        Ok(self.db.list_all()?)
    }

    pub fn list_for_user(&self, user_id: UserId) -> Result<Vec<Message>, ApiError> {
        Ok(self.db.list_for_user(user_id)?)
    }

    /// Apply a read-state transition. With an `owner`, only that user's
    /// thread can be touched.
    pub fn mark_read(
        &self,
        selector: ReadSelector,
        owner: Option<UserId>,
    ) -> Result<usize, ApiError> {
        match selector {
            ReadSelector::User(user_id) => {
                if owner.is_some_and(|o| o != user_id) {
                    return Err(ApiError::Forbidden);
                }
                Ok(self.db.mark_read_by_user(user_id)?)
            }
            ReadSelector::Ids(ids) => Ok(self.db.mark_read_by_ids(&ids, owner)?),
        }
    }

    pub fn delete_message(&self, id: MessageId, owner: Option<UserId>) -> Result<(), ApiError> {
        match self.db.delete_message(id, owner)? {
            0 => Err(ApiError::NotFound(format!("message {} not found", id))),
            _ => Ok(()),
        }
    }

    pub fn delete_thread(&self, user_id: UserId) -> Result<usize, ApiError> {
        Ok(self.db.delete_thread(user_id)?)
    }
}
