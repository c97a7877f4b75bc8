//! Screen-owned polling. Each screen starts its timer when it gains focus
//! and cancels it when it loses focus or is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use helpline_types::UserId;

use crate::api::SupportApi;
use crate::receipts::{ReadReceipts, unread_from_admin};
use crate::schedule::ScheduledTask;
use crate::sync::ConversationSync;

/// The open conversation: refreshes right away on focus, then on a short
/// period. Whatever is loaded while focused counts as seen by the user.
pub struct ConversationScreen<A: SupportApi> {
    sync: Arc<ConversationSync<A>>,
    period: Duration,
    poller: Option<ScheduledTask>,
}

impl<A: SupportApi> ConversationScreen<A> {
    pub fn new(sync: Arc<ConversationSync<A>>, period: Duration) -> Self {
        Self {
            sync,
            period,
            poller: None,
        }
    }

    pub fn sync(&self) -> &Arc<ConversationSync<A>> {
        &self.sync
    }

    pub fn focus(&mut self) {
        if self.is_polling() {
            return;
        }

        let sync = self.sync.clone();
        self.poller = Some(ScheduledTask::every(self.period, move || {
            let sync = sync.clone();
            async move {
                match sync.refresh().await {
                    Ok(_) => sync.mark_seen(),
                    // Next tick retries; nothing to show the user
                    Err(e) => debug!("Conversation refresh failed: {}", e),
                }
            }
        }));
    }

    pub fn blur(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_cancelled())
    }
}

/// Home-screen unread badge, fed by its own coarse background fetch so it
/// stays current while the conversation screen is closed.
pub struct BadgeMonitor<A: SupportApi> {
    api: Arc<A>,
    user_id: UserId,
    receipts: ReadReceipts,
    period: Duration,
    count: Arc<watch::Sender<usize>>,
    poller: Option<ScheduledTask>,
}

impl<A: SupportApi> BadgeMonitor<A> {
    pub fn new(api: Arc<A>, user_id: UserId, receipts: ReadReceipts, period: Duration) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            api,
            user_id,
            receipts,
            period,
            count: Arc::new(count),
            poller: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let api = self.api.clone();
        let user_id = self.user_id;
        let receipts = self.receipts.clone();
        let count = self.count.clone();

        self.poller = Some(ScheduledTask::every(self.period, move || {
            let api = api.clone();
            let receipts = receipts.clone();
            let count = count.clone();
            async move {
                match api.list_messages(user_id).await {
                    Ok(messages) => {
                        count.send_replace(unread_from_admin(&messages, &receipts));
                    }
                    Err(e) => debug!("Badge refresh failed: {}", e),
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_cancelled())
    }
}
