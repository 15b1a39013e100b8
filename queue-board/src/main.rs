use std::sync::Arc;

use queue_board::api::ApiClient;
use queue_board::board::Board;
use queue_board::cache::CachedApiClient;
use queue_board::config::BoardConfig;
use queue_board::queue::QueuePoller;
use queue_board::stores::StoreResolver;
use queue_board::time::{CLOCK_TICK, Clock, ClockPrecision, hong_kong, millis};
use queue_board::web::{AppState, create_router};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging is not up yet, so config errors go straight to stderr.
    let config = BoardConfig::from_env().inspect_err(|e| eprintln!("{e}"))?;

    // RUST_LOG wins over the debug flag.
    let default_filter = if config.debug {
        "queue_board=debug,info"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    debug!(
        api_base_url = %config.api_base_url,
        cache_duration_ms = millis(config.cache_duration),
        refresh_interval_ms = millis(config.refresh_interval),
        request_timeout_ms = millis(config.request_timeout),
        default_store_id = config.default_store_id,
        region = %config.region,
        "config loaded"
    );

    let client = ApiClient::new(config.api_client_config())?;
    let api = Arc::new(CachedApiClient::new(client, &config.cache_config()));

    let resolver = StoreResolver::new(
        Arc::clone(&api),
        config.store_query(),
        config.default_store_id,
    );
    let poller = QueuePoller::new(Arc::clone(&api), config.refresh_interval, &config.region);
    let board = Arc::new(Board::new(resolver, poller));

    // Resolve the default store up front so the first page load has data.
    let view = board.show(None).await;
    info!(store_id = view.store_id, source = ?view.source, "board ready");

    let clock = Clock::spawn(hong_kong(), ClockPrecision::Minutes, CLOCK_TICK);

    let listen_addr = config.listen_addr;
    let static_dir = config.static_dir.clone();
    let state = AppState::new(Arc::clone(&board), api, clock, config);
    let app = create_router(state, &static_dir);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("queue board listening on http://{listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    board.shutdown().await;
    info!("queue board stopped");
    Ok(())
}
