use std::time::Duration;

use anyhow::Context;

use helpline_types::UserId;

/// Refresh cadence while the conversation screen is open.
pub const DEFAULT_CONVERSATION_POLL: Duration = Duration::from_secs(3);
/// Refresh cadence for the home-screen badge.
pub const DEFAULT_BADGE_POLL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub user_id: UserId,
    pub conversation_poll: Duration,
    pub badge_poll: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, user_id: UserId) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            user_id,
            conversation_poll: DEFAULT_CONVERSATION_POLL,
            badge_poll: DEFAULT_BADGE_POLL,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Reads `HELPLINE_URL`, `HELPLINE_USER_ID` and optionally `HELPLINE_TOKEN`.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("HELPLINE_URL").context("HELPLINE_URL is not set")?;
        let raw_id = std::env::var("HELPLINE_USER_ID").context("HELPLINE_USER_ID is not set")?;
        let user_id = raw_id
            .parse()
            .map(UserId)
            .with_context(|| format!("invalid HELPLINE_USER_ID '{}'", raw_id))?;

        let mut config = Self::new(base_url, user_id);
        config.token = std::env::var("HELPLINE_TOKEN").ok();
        Ok(config)
    }
}
