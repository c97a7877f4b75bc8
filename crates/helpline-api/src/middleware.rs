use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use helpline_types::UserId;
use helpline_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Who is making the request. Inserted into request extensions by
/// [`authenticate`] for every route.
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    Authenticated(Claims),
}

impl Caller {
    pub fn require(&self) -> Result<&Claims, ApiError> {
        match self {
            Self::Authenticated(claims) => Ok(claims),
            Self::Anonymous => Err(ApiError::Unauthorized),
        }
    }

    pub fn require_admin(&self) -> Result<&Claims, ApiError> {
        let claims = self.require()?;
        if !claims.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(claims)
    }

    /// The user themself, or an admin acting on their thread.
    pub fn require_self_or_admin(&self, user_id: UserId) -> Result<&Claims, ApiError> {
        let claims = self.require()?;
        if !claims.is_admin() && claims.sub != user_id {
            return Err(ApiError::Forbidden);
        }
        Ok(claims)
    }

    /// Thread restriction for end-users; admins are unrestricted.
    pub fn owner_scope(&self) -> Result<Option<UserId>, ApiError> {
        let claims = self.require()?;
        Ok(if claims.is_admin() { None } else { Some(claims.sub) })
    }
}

/// Decode a bearer token when one is sent. No header means an anonymous
/// caller; a header that does not verify is rejected outright.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| ApiError::Unauthorized)?;

    let caller = match bearer {
        Some(Authorization(bearer)) => {
            let token_data = decode::<Claims>(
                bearer.token(),
                &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                ApiError::Unauthorized
            })?;
            Caller::Authenticated(token_data.claims)
        }
        None => Caller::Anonymous,
    };

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
