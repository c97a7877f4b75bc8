use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header, encode};

use helpline_types::UserId;
use helpline_types::api::{Claims, Role};

use crate::push::PushTransport;
use crate::service::MessageService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: MessageService,
    pub push: Arc<dyn PushTransport>,
    pub jwt_secret: String,
}

/// Token lifetime for issued credentials.
const TOKEN_TTL_DAYS: i64 = 30;

/// Sign a bearer token. Accounts live in the wider application; this is the
/// hook it uses so tokens match what [`crate::middleware::authenticate`] expects.
pub fn issue_token(secret: &str, user_id: UserId, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
