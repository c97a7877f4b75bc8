use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use helpline_api::push::{ChannelPush, PushTransport, WebhookPush};
use helpline_api::responder::WelcomeTemplate;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// External push service; in-process fan-out when unset.
    pub push_webhook: Option<String>,
    pub welcome: WelcomeTemplate,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("HELPLINE_JWT_SECRET").unwrap_or_else(|| {
            warn!("HELPLINE_JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.into()
        });

        let port = match lookup("HELPLINE_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid HELPLINE_PORT '{}'", raw))?,
            None => 3000,
        };

        let defaults = WelcomeTemplate::default();
        let welcome = WelcomeTemplate {
            named: lookup("HELPLINE_WELCOME_NAMED").unwrap_or(defaults.named),
            generic: lookup("HELPLINE_WELCOME_GENERIC").unwrap_or(defaults.generic),
        };

        Ok(Self {
            host: lookup("HELPLINE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: lookup("HELPLINE_DB_PATH")
                .unwrap_or_else(|| "helpline.db".into())
                .into(),
            jwt_secret,
            push_webhook: lookup("HELPLINE_PUSH_WEBHOOK").filter(|url| !url.trim().is_empty()),
            welcome,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// Without a webhook nothing subscribes to the in-process channel, so
    /// notifications are dropped; say so at startup.
    pub fn push_transport(&self) -> Arc<dyn PushTransport> {
        match &self.push_webhook {
            Some(url) => {
                info!("Push notifications go to {}", url);
                Arc::new(WebhookPush::new(url.clone()))
            }
            None => {
                warn!("HELPLINE_PUSH_WEBHOOK not set, push notifications are disabled");
                Arc::new(ChannelPush::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.db_path, PathBuf::from("helpline.db"));
        assert!(cfg.push_webhook.is_none());
        assert_eq!(cfg.welcome, WelcomeTemplate::default());
        assert_eq!(cfg.addr().unwrap().port(), 3000);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("HELPLINE_PORT", "8080"),
            ("HELPLINE_HOST", "127.0.0.1"),
            ("HELPLINE_PUSH_WEBHOOK", "http://push.local/send"),
            ("HELPLINE_WELCOME_GENERIC", "Hello!"),
        ])
        .unwrap();
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.push_webhook.as_deref(), Some("http://push.local/send"));
        assert_eq!(cfg.welcome.generic, "Hello!");
    }

    #[test]
    fn blank_webhook_disables_push() {
        let cfg = config(&[("HELPLINE_PUSH_WEBHOOK", "   ")]).unwrap();
        assert!(cfg.push_webhook.is_none());
        let _push = cfg.push_transport();

        let cfg = config(&[("HELPLINE_PUSH_WEBHOOK", "http://push.local/send")]).unwrap();
        assert!(cfg.push_webhook.is_some());
        let _push = cfg.push_transport();
    }

    #[test]
    fn bad_port_fails() {
        assert!(config(&[("HELPLINE_PORT", "eighty")]).is_err());
    }
}
