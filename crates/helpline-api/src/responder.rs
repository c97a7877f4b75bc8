//! First-contact welcome reply.
//!
//! Runs right after a user-authored message is stored. When that message is
//! the first one the user ever wrote, one admin-authored greeting is stored
//! behind it. The two inserts are separate statements: a failure between
//! them leaves the user's message without a greeting, and nothing retries.

use tracing::{info, warn};

use helpline_db::Database;
use helpline_types::{Message, MessageBody, ThreadKey, UserId};

const NAME_PLACEHOLDER: &str = "{name}";

/// Source of display names used to personalise the greeting.
pub trait AccountDirectory {
    fn display_name(&self, user_id: UserId) -> anyhow::Result<Option<String>>;
}

impl AccountDirectory for Database {
    fn display_name(&self, user_id: UserId) -> anyhow::Result<Option<String>> {
        Ok(Database::display_name(self, user_id)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeTemplate {
    /// Used when the user has a display name; `{name}` is substituted.
    pub named: String,
    pub generic: String,
}

impl Default for WelcomeTemplate {
    fn default() -> Self {
        Self {
            named: "Bună, {name}! Mulțumim pentru mesaj. Un membru al echipei îți va răspunde în curând."
                .to_string(),
            generic: "Bună! Mulțumim pentru mesaj. Un membru al echipei îți va răspunde în curând."
                .to_string(),
        }
    }
}

impl WelcomeTemplate {
    pub fn compose(&self, name: Option<&str>) -> String {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => self.named.replace(NAME_PLACEHOLDER, name),
            None => self.generic.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AutoResponder {
    template: WelcomeTemplate,
}

impl AutoResponder {
    pub fn new(template: WelcomeTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &WelcomeTemplate {
        &self.template
    }

    /// Store the welcome reply if `stored` was its author's first message.
    /// Every failure is logged and swallowed: the caller's message has
    /// already been accepted.
    pub fn after_user_message<D: AccountDirectory>(
        &self,
        db: &Database,
        directory: &D,
        stored: &Message,
    ) -> Option<Message> {
        if stored.is_from_admin {
            return None;
        }
        let user_id = match stored.thread_key() {
            ThreadKey::User(id) => id,
            // Nobody to greet
            ThreadKey::Anonymous => return None,
        };

        // The count includes the message just stored.
        let prior = match db.count_user_authored(user_id) {
            Ok(n) => n,
            Err(e) => {
                warn!("Welcome check failed for user {}: {}", user_id, e);
                return None;
            }
        };
        if prior != 1 {
            return None;
        }

        let name = directory.display_name(user_id).unwrap_or_else(|e| {
            warn!("Display name lookup failed for user {}: {:#}", user_id, e);
            None
        });

        let body = match MessageBody::parse(&self.template.compose(name.as_deref())) {
            Ok(body) => body,
            Err(_) => {
                warn!("Welcome template renders empty, skipping greeting");
                return None;
            }
        };

        match db.insert_message(Some(user_id), &body, true) {
            Ok(welcome) => {
                info!("Sent welcome message {} to user {}", welcome.id, user_id);
                Some(welcome)
            }
            Err(e) => {
                warn!("Failed to store welcome message for user {}: {}", user_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenDirectory;

    impl AccountDirectory for BrokenDirectory {
        fn display_name(&self, _user_id: UserId) -> anyhow::Result<Option<String>> {
            anyhow::bail!("account service unavailable")
        }
    }

    fn store_user_message(db: &Database, user: Option<UserId>, text: &str) -> Message {
        db.insert_message(user, &MessageBody::parse(text).unwrap(), false)
            .unwrap()
    }

    #[test]
    fn compose_uses_name_when_present() {
        let t = WelcomeTemplate::default();
        assert!(t.compose(Some("Ana")).starts_with("Bună, Ana!"));
        assert_eq!(t.compose(None), t.generic);
        assert_eq!(t.compose(Some("   ")), t.generic);
    }

    #[test]
    fn first_message_gets_exactly_one_welcome() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(UserId(1), Some("Ana")).unwrap();
        let responder = AutoResponder::default();

        let first = store_user_message(&db, Some(UserId(1)), "Salut");
        let welcome = responder.after_user_message(&db, &db, &first).unwrap();
        assert!(welcome.is_from_admin);
        assert_eq!(welcome.user_id, Some(UserId(1)));
        assert!(welcome.body.contains("Ana"));
        assert!(welcome.id > first.id);

        let second = store_user_message(&db, Some(UserId(1)), "Mai am o întrebare");
        assert!(responder.after_user_message(&db, &db, &second).is_none());

        let admin_count = db
            .list_for_user(UserId(1))
            .unwrap()
            .iter()
            .filter(|m| m.is_from_admin)
            .count();
        assert_eq!(admin_count, 1);
    }

    #[test]
    fn anonymous_messages_get_no_welcome() {
        let db = Database::open_in_memory().unwrap();
        let msg = store_user_message(&db, None, "hello");
        assert!(AutoResponder::default().after_user_message(&db, &db, &msg).is_none());
        assert_eq!(db.list_all().unwrap().len(), 1);
    }

    #[test]
    fn directory_failure_falls_back_to_generic() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(UserId(3), Some("Ion")).unwrap();
        let responder = AutoResponder::default();

        let msg = store_user_message(&db, Some(UserId(3)), "Salut");
        let welcome = responder
            .after_user_message(&db, &BrokenDirectory, &msg)
            .unwrap();
        assert_eq!(welcome.body, responder.template().generic);
    }

    #[test]
    fn user_without_name_gets_generic() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(UserId(4), None).unwrap();
        let responder = AutoResponder::default();

        let msg = store_user_message(&db, Some(UserId(4)), "Salut");
        let welcome = responder.after_user_message(&db, &db, &msg).unwrap();
        assert_eq!(welcome.body, responder.template().generic);
    }
}
