//! Fire-and-forget delivery of push notifications.
//!
//! Delivery never blocks the request that produced the notification and its
//! outcome never reaches the HTTP response.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use helpline_types::events::PushNotification;

pub trait PushTransport: Send + Sync {
    fn deliver(&self, notification: PushNotification);
}

/// In-process fan-out to whoever is subscribed (device gateway, tests).
#[derive(Clone)]
pub struct ChannelPush {
    tx: broadcast::Sender<PushNotification>,
}

impl ChannelPush {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushNotification> {
        self.tx.subscribe()
    }
}

impl Default for ChannelPush {
    fn default() -> Self {
        Self::new()
    }
}

impl PushTransport for ChannelPush {
    fn deliver(&self, notification: PushNotification) {
        // No subscribers is fine
        if self.tx.send(notification).is_err() {
            debug!("Push notification dropped: no subscribers");
        }
    }
}

/// POSTs each notification as JSON to an external push service.
pub struct WebhookPush {
    client: reqwest::Client,
    url: String,
}

impl WebhookPush {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl PushTransport for WebhookPush {
    fn deliver(&self, notification: PushNotification) {
        let client = self.client.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            let result = client
                .post(&url)
                .json(&notification)
                .send()
                .await
                .and_then(|resp| resp.error_for_status());

            if let Err(e) = result {
                warn!(
                    "Push delivery to user {} failed: {}",
                    notification.user_id, e
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpline_types::events::PushKind;
    use helpline_types::{MessageId, UserId};

    fn notification() -> PushNotification {
        PushNotification {
            kind: PushKind::Reply,
            user_id: UserId(1),
            message_id: MessageId(2),
            preview: "hi".into(),
        }
    }

    #[tokio::test]
    async fn channel_push_reaches_subscribers() {
        let push = ChannelPush::new();
        let mut rx = push.subscribe();

        push.deliver(notification());
        assert_eq!(rx.recv().await.unwrap(), notification());
    }

    #[test]
    fn channel_push_without_subscribers_is_silent() {
        ChannelPush::new().deliver(notification());
    }

    #[tokio::test]
    async fn webhook_failure_does_not_surface() {
        // Nothing listens on port 9; the spawned task logs and exits.
        let push = WebhookPush::new("http://127.0.0.1:9/push");
        push.deliver(notification());
        tokio::task::yield_now().await;
    }
}
