use std::future::Future;

use reqwest::{RequestBuilder, Response};

use helpline_types::api::{
    DeleteThreadResponse, ErrorBody, MarkReadRequest, MarkReadResponse, SendMessageRequest,
};
use helpline_types::{Message, MessageId, UserId};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// The slice of the REST surface the end-user app talks to.
pub trait SupportApi: Send + Sync + 'static {
    /// The user's thread, oldest first.
    fn list_messages(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Message>, ClientError>> + Send;

    fn send_message(
        &self,
        user_id: UserId,
        body: &str,
    ) -> impl Future<Output = Result<Message, ClientError>> + Send;

    /// Flag the given user-authored messages as read. Returns how many
    /// changed state.
    ///
    /// The sync engine never calls this: admin messages the user has seen are
    /// tracked locally in [`ReadReceipts`](crate::receipts::ReadReceipts).
    /// It is here for embedders that acknowledge the user's own messages on
    /// the server, e.g. a companion admin tool built on this client.
    fn mark_read(
        &self,
        ids: &[MessageId],
    ) -> impl Future<Output = Result<usize, ClientError>> + Send;

    /// Returns how many messages the server removed.
    fn delete_thread(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<usize, ClientError>> + Send;
}

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone(), config.token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Turn non-2xx responses into [`ClientError::Status`], keeping the server's
/// error text when it sent one.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

impl SupportApi for HttpApi {
    async fn list_messages(&self, user_id: UserId) -> Result<Vec<Message>, ClientError> {
        let req = self.client.get(self.url(&format!("/messages/{}", user_id)));
        let resp = check(self.authorize(req).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn send_message(&self, user_id: UserId, body: &str) -> Result<Message, ClientError> {
        let req = self.client.post(self.url("/messages")).json(&SendMessageRequest {
            user_id: Some(user_id),
            message: body.to_string(),
        });
        let resp = check(self.authorize(req).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn mark_read(&self, ids: &[MessageId]) -> Result<usize, ClientError> {
        let req = self.client.put(self.url("/messages/mark-read")).json(&MarkReadRequest {
            user_id: None,
            message_ids: Some(ids.to_vec()),
        });
        let resp = check(self.authorize(req).send().await?).await?;
        let body: MarkReadResponse = resp.json().await?;
        Ok(body.updated)
    }

    async fn delete_thread(&self, user_id: UserId) -> Result<usize, ClientError> {
        let req = self
            .client
            .delete(self.url(&format!("/messages/thread/{}", user_id)));
        let resp = check(self.authorize(req).send().await?).await?;
        let body: DeleteThreadResponse = resp.json().await?;
        Ok(body.deleted)
    }
}
