//! End-user side of the support chat: keeps a local copy of the user's
//! thread in step with the server by polling, echoes outgoing messages
//! before the server acknowledges them, and maintains the home-screen
//! unread badge.

pub mod api;
pub mod config;
pub mod error;
pub mod outgoing;
pub mod receipts;
pub mod schedule;
pub mod screen;
pub mod sync;

use std::sync::Arc;

pub use api::{HttpApi, SupportApi};
pub use config::ClientConfig;
pub use error::{ClientError, SendError};
pub use screen::{BadgeMonitor, ConversationScreen};
pub use sync::ConversationSync;

/// Everything one signed-in user needs, wired from a single config.
pub struct Session<A: SupportApi> {
    pub sync: Arc<ConversationSync<A>>,
    pub conversation: ConversationScreen<A>,
    pub badge: BadgeMonitor<A>,
}

impl<A: SupportApi> Session<A> {
    pub fn new(api: A, config: &ClientConfig) -> Self {
        let api = Arc::new(api);
        let sync = Arc::new(ConversationSync::new(api.clone(), config.user_id));
        let conversation = ConversationScreen::new(sync.clone(), config.conversation_poll);
        let badge = BadgeMonitor::new(api, config.user_id, sync.receipts(), config.badge_poll);

        Self {
            sync,
            conversation,
            badge,
        }
    }
}

impl Session<HttpApi> {
    pub fn connect(config: &ClientConfig) -> Self {
        Self::new(HttpApi::from_config(config), config)
    }
}
