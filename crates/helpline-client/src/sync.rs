//! Local copy of one user's thread.
//!
//! The server list is always authoritative: every successful fetch replaces
//! the local list wholesale. The only thing the client adds on top is the
//! placeholder for a message still waiting on the server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use helpline_types::{Message, MessageBody, MessageId, UserId};

use crate::api::SupportApi;
use crate::error::{ClientError, SendError};
use crate::outgoing::{OutgoingMessage, OutgoingState};
use crate::receipts::{ReadReceipts, unread_from_admin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Sending,
}

#[derive(Default)]
struct SyncState {
    /// Last applied server list, oldest first.
    messages: Vec<Message>,
    outgoing: Option<OutgoingMessage>,
    /// Most recent finished send, kept for inspection.
    last_outgoing: Option<OutgoingMessage>,
    input: String,
    last_error: Option<String>,
    /// Sequence number of the fetch whose result is on screen.
    applied_seq: u64,
    fetches_in_flight: usize,
    next_local_id: i64,
}

impl SyncState {
    fn apply(&mut self, seq: u64, messages: Vec<Message>) -> bool {
        if seq <= self.applied_seq {
            debug!("Discarding stale fetch #{} (showing #{})", seq, self.applied_seq);
            return false;
        }
        self.applied_seq = seq;
        self.messages = messages;
        true
    }

    fn allocate_local_id(&mut self) -> MessageId {
        self.next_local_id -= 1;
        MessageId(self.next_local_id)
    }

    /// Acknowledged and reloaded: the server list now carries the message.
    fn reconcile_outgoing(&mut self) {
        if let Some(mut outgoing) = self.outgoing.take() {
            if let Err(e) = outgoing.reconcile() {
                warn!("{}", e);
            }
            self.last_outgoing = Some(outgoing);
        }
    }

    /// Drop the echo and hand back the text as typed.
    fn roll_back_outgoing(&mut self) -> String {
        let Some(mut outgoing) = self.outgoing.take() else {
            return String::new();
        };
        let typed = outgoing.roll_back().unwrap_or_else(|e| {
            warn!("{}", e);
            String::new()
        });
        self.last_outgoing = Some(outgoing);
        typed
    }
}

fn lock_state(state: &Mutex<SyncState>) -> MutexGuard<'_, SyncState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counts one fetch as in flight for as long as it lives. A fetch whose
/// future is dropped mid-request (poller cancelled) still gets uncounted.
struct InFlight<'a>(&'a Mutex<SyncState>);

impl<'a> InFlight<'a> {
    fn enter(state: &'a Mutex<SyncState>) -> Self {
        lock_state(state).fetches_in_flight += 1;
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock_state(self.0).fetches_in_flight -= 1;
    }
}

pub struct ConversationSync<A> {
    api: Arc<A>,
    user_id: UserId,
    state: Mutex<SyncState>,
    /// Issued fetch sequence numbers; a result only lands if it is newer
    /// than the one on screen.
    issued: AtomicU64,
    receipts: ReadReceipts,
}

impl<A: SupportApi> ConversationSync<A> {
    pub fn new(api: Arc<A>, user_id: UserId) -> Self {
        Self {
            api,
            user_id,
            state: Mutex::new(SyncState::default()),
            issued: AtomicU64::new(0),
            receipts: ReadReceipts::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        lock_state(&self.state)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn receipts(&self) -> ReadReceipts {
        self.receipts.clone()
    }

    /// What the screen shows: the server list plus the pending echo, if any.
    pub fn messages(&self) -> Vec<Message> {
        let state = self.lock();
        let mut visible = state.messages.clone();
        if let Some(outgoing) = state.outgoing.as_ref().filter(|o| o.is_pending()) {
            visible.push(outgoing.placeholder().clone());
        }
        visible
    }

    pub fn phase(&self) -> Phase {
        let state = self.lock();
        if state.outgoing.is_some() {
            Phase::Sending
        } else if state.fetches_in_flight > 0 {
            Phase::Fetching
        } else {
            Phase::Idle
        }
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    /// User-visible error from the last failed send or reset.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn dismiss_error(&self) {
        self.lock().last_error = None;
    }

    /// State of the in-flight send, or of the last one to finish.
    pub fn outgoing_state(&self) -> Option<OutgoingState> {
        let state = self.lock();
        state
            .outgoing
            .as_ref()
            .or(state.last_outgoing.as_ref())
            .map(OutgoingMessage::state)
    }

    /// Badge contribution of what is currently loaded.
    pub fn unread_from_admin(&self) -> usize {
        unread_from_admin(&self.lock().messages, &self.receipts)
    }

    /// Record every loaded admin message as seen by the user.
    pub fn mark_seen(&self) {
        self.receipts.observe(&self.lock().messages);
    }

    /// Replace the local list with a fresh server fetch. Returns `false` when
    /// a newer fetch finished first and this result was dropped. Errors are
    /// returned, never shown: background refreshes fail silently.
    pub async fn refresh(&self) -> Result<bool, ClientError> {
        let (seq, result) = self.fetch().await;
        let messages = result?;
        Ok(self.lock().apply(seq, messages))
    }

    async fn fetch(&self) -> (u64, Result<Vec<Message>, ClientError>) {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight::enter(&self.state);

        let result = self.api.list_messages(self.user_id).await;
        (seq, result)
    }

    /// Send whatever is in the input buffer.
    ///
    /// The text is echoed immediately and the input cleared. On success the
    /// whole list is reloaded from the server; on failure the echo goes away,
    /// the text returns to the input and a visible error is set. Nothing is
    /// retried automatically.
    pub async fn send(&self) -> Result<Message, SendError> {
        let body = {
            let mut state = self.lock();
            if state.outgoing.is_some() {
                return Err(SendError::InFlight);
            }
            let body = MessageBody::parse(&state.input).map_err(|_| SendError::Empty)?;

            let local_id = state.allocate_local_id();
            let typed = std::mem::take(&mut state.input);
            state.outgoing = Some(OutgoingMessage::new(local_id, self.user_id, typed, &body));
            state.last_error = None;
            body
        };

        match self.api.send_message(self.user_id, body.as_str()).await {
            Ok(ack) => {
                self.reconcile(&ack).await;
                Ok(ack)
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                let mut state = self.lock();
                let text = state.roll_back_outgoing();
                state.input = text.clone();
                state.last_error = Some(format!("Message not sent: {}", e));
                Err(SendError::Failed { text, source: e })
            }
        }
    }

    async fn reconcile(&self, ack: &Message) {
        let (seq, result) = self.fetch().await;

        let mut state = self.lock();
        match result {
            Ok(messages) => {
                state.apply(seq, messages);
            }
            Err(e) => {
                // The store has the message; show the acknowledged copy until
                // the next poll brings the full list.
                warn!("Reload after send failed: {}", e);
                if !state.messages.iter().any(|m| m.id == ack.id) {
                    state.messages.push(ack.clone());
                }
            }
        }
        state.reconcile_outgoing();
    }

    /// Delete the whole thread on the server, then forget it locally. Local
    /// state is untouched when the server call fails.
    pub async fn reset_conversation(&self) -> Result<usize, ClientError> {
        match self.api.delete_thread(self.user_id).await {
            Ok(deleted) => {
                // Anything fetched before the delete is now stale.
                let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                let mut state = self.lock();
                state.apply(seq, Vec::new());
                state.last_error = None;
                self.receipts.clear();
                info!("Conversation reset ({} messages removed)", deleted);
                Ok(deleted)
            }
            Err(e) => {
                self.lock().last_error = Some(format!("Could not delete conversation: {}", e));
                Err(e)
            }
        }
    }
}
