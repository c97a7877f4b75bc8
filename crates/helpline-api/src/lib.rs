pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod push;
pub mod responder;
pub mod service;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::auth::AppState;

/// The support-chat REST surface. Every route passes through
/// [`middleware::authenticate`]; handlers decide what each caller may do.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/messages", get(messages::list_all).post(messages::send_message))
        .route("/messages/reply", post(messages::reply))
        .route("/messages/mark-read", put(messages::mark_read))
        .route("/messages/thread/{user_id}", delete(messages::delete_thread))
        // GET reads a user's thread, DELETE removes one message by id
        .route(
            "/messages/{id}",
            get(messages::get_thread).delete(messages::delete_message),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ))
        .with_state(state)
}
