use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use notification_cell::{
    EventPublisher, LoggingPublisher, NoopPublisher, NotificationDispatcher, RedisEventPublisher,
};
use shared_config::AppConfig;

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

    info!("Starting clinic scheduler API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());
    if !config.is_configured() {
        anyhow::bail!("JWT_SECRET must be set to issue and validate tokens");
    }

    let notifications = build_dispatcher(&config).await;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(config.clone(), notifications)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_dispatcher(config: &AppConfig) -> NotificationDispatcher {
    if !config.notifications_enabled {
        info!("Consultation notifications disabled");
        return NotificationDispatcher::disabled();
    }

    let publisher: Arc<dyn EventPublisher> = if config.is_messaging_configured() {
        match RedisEventPublisher::new(config).await {
            Ok(publisher) => Arc::new(publisher),
            Err(e) => {
                warn!("Redis unavailable ({}), logging notifications instead", e);
                Arc::new(LoggingPublisher)
            }
        }
    } else {
        info!("REDIS_URL not set, notifications will be dropped");
        Arc::new(NoopPublisher)
    };

    NotificationDispatcher::spawn(publisher, config.notification_queue_capacity)
}
