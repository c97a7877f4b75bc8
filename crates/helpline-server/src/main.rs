mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use helpline_api::auth::{AppState, AppStateInner};
use helpline_api::responder::AutoResponder;
use helpline_api::service::MessageService;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpline=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = helpline_db::Database::open(&config.db_path)?;

    let push = config.push_transport();

    let state: AppState = Arc::new(AppStateInner {
        service: MessageService::new(db, AutoResponder::new(config.welcome.clone())),
        push,
        jwt_secret: config.jwt_secret.clone(),
    });

    let app = helpline_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Helpline server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
