use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use support_api_server::config::Settings;
use support_api_server::handlers::build_router;
use support_api_server::security::RateLimiter;
use support_api_server::services::conversation::{ConversationEngine, SessionReaper, SessionStore};
use support_api_server::services::GeminiClient;
use support_api_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Console output plus a JSON file log, non-blocking
    let file_appender = tracing_appender::rolling::daily("logs", "support-bot.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,support_api_server=debug")),
        )
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().json().with_ansi(false).with_writer(file_writer))
        .init();

    info!("🚀 Starting Customer Support Bot API...");

    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    let store = Arc::new(SessionStore::new());
    let backend = Arc::new(GeminiClient::new(settings.gemini.clone()));
    let engine = Arc::new(ConversationEngine::new(
        store.clone(),
        backend,
        settings.session.velocity_threshold_seconds,
    ));
    let rate_limiter = Arc::new(RateLimiter::new(
        settings.limits.window_seconds,
        settings.limits.max_requests,
    ));

    let reaper = SessionReaper::new(
        store.clone(),
        Duration::from_secs(settings.session.sweep_interval_seconds),
        settings.session.idle_timeout_seconds,
    );
    tokio::spawn(reaper.run());
    info!("✅ Session reaper started");

    let state = AppState {
        store,
        engine,
        rate_limiter,
        settings: settings.clone(),
    };
    let app = build_router(state)?;

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
