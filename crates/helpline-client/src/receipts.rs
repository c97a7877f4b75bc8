use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use helpline_types::{Message, MessageId};

/// Admin-authored messages the user has already seen on this device.
///
/// The server's `read` flag only tracks what the admin has read, so the app
/// keeps its own record for the other direction.
#[derive(Debug, Clone, Default)]
pub struct ReadReceipts {
    seen: Arc<Mutex<HashSet<MessageId>>>,
}

impl ReadReceipts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every admin-authored message in `messages` as seen.
    pub fn observe(&self, messages: &[Message]) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.extend(
            messages
                .iter()
                .filter(|m| m.is_from_admin && !m.id.is_local())
                .map(|m| m.id),
        );
    }

    pub fn has_seen(&self, id: MessageId) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Home-screen badge: admin messages still unread and not seen locally.
pub fn unread_from_admin(messages: &[Message], receipts: &ReadReceipts) -> usize {
    messages
        .iter()
        .filter(|m| m.awaits_user() && !receipts.has_seen(m.id))
        .count()
}
