use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use payment_cell::{ChargeGateway, StripeClient};
use shared_config::AppConfig;
use shared_database::{InMemoryStore, RecordStore, SupabaseStore};
use shared_utils::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Doctors Portal API server");

    let config = AppConfig::from_env();

    let store: Arc<dyn RecordStore> = if config.is_configured() {
        info!("Using hosted record store at {}", config.supabase_url);
        Arc::new(SupabaseStore::new(&config))
    } else {
        warn!("Using in-memory record store; data is lost on restart");
        Arc::new(InMemoryStore::new())
    };

    if !config.is_payment_configured() {
        warn!("Payment gateway not configured - payment intents will fail");
    }
    let gateway: Arc<dyn ChargeGateway> = Arc::new(StripeClient::new(&config));

    let port = config.port;
    let state = AppState::new(config, store);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state, gateway)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Doctors portal server running on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
