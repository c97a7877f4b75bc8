//! Lifecycle of one optimistically echoed message.
//!
//! ```text
//! Pending ──ack + reload──▶ Reconciled
//!    └─────send failed────▶ RolledBack
//! ```
//! Both outcomes are terminal.

use chrono::Utc;
use thiserror::Error;

use helpline_types::{Message, MessageBody, MessageId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingState {
    Pending,
    Reconciled,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("outgoing message cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: OutgoingState,
    pub to: OutgoingState,
}

#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    placeholder: Message,
    /// Input exactly as typed, restored on rollback.
    typed: String,
    state: OutgoingState,
}

impl OutgoingMessage {
    pub fn new(local_id: MessageId, user_id: UserId, typed: String, body: &MessageBody) -> Self {
        debug_assert!(local_id.is_local());
        Self {
            placeholder: Message {
                id: local_id,
                user_id: Some(user_id),
                body: body.as_str().to_string(),
                is_from_admin: false,
                read: false,
                created_at: Utc::now(),
            },
            typed,
            state: OutgoingState::Pending,
        }
    }

    pub fn state(&self) -> OutgoingState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == OutgoingState::Pending
    }

    /// The local-only echo shown until the server list replaces it.
    pub fn placeholder(&self) -> &Message {
        &self.placeholder
    }

    pub fn reconcile(&mut self) -> Result<(), TransitionError> {
        self.transition(OutgoingState::Reconciled)
    }

    /// Returns the typed text so it can go back into the input.
    pub fn roll_back(&mut self) -> Result<String, TransitionError> {
        self.transition(OutgoingState::RolledBack)?;
        Ok(self.typed.clone())
    }

    fn transition(&mut self, to: OutgoingState) -> Result<(), TransitionError> {
        if self.state != OutgoingState::Pending {
            return Err(TransitionError {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outgoing(text: &str) -> OutgoingMessage {
        OutgoingMessage::new(
            MessageId(-1),
            UserId(7),
            text.to_string(),
            &MessageBody::parse(text).unwrap(),
        )
    }

    #[test]
    fn placeholder_shape() {
        let out = outgoing("  Salut ");
        let p = out.placeholder();
        assert!(p.id.is_local());
        assert_eq!(p.body, "Salut");
        assert_eq!(p.user_id, Some(UserId(7)));
        assert!(!p.is_from_admin);
        assert!(out.is_pending());
    }

    #[test]
    fn reconcile_is_terminal() {
        let mut out = outgoing("hi");
        out.reconcile().unwrap();
        assert_eq!(out.state(), OutgoingState::Reconciled);

        assert_eq!(
            out.roll_back(),
            Err(TransitionError {
                from: OutgoingState::Reconciled,
                to: OutgoingState::RolledBack,
            })
        );
        assert!(out.reconcile().is_err());
    }

    #[test]
    fn rollback_returns_typed_text() {
        let mut out = outgoing("  Salut ");
        assert_eq!(out.roll_back().unwrap(), "  Salut ");
        assert_eq!(out.state(), OutgoingState::RolledBack);

        assert!(out.reconcile().is_err());
        assert!(out.roll_back().is_err());
    }
}
