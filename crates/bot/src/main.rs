//! Binary entry point: wiring and lifecycle.

mod dispatcher;
mod error;

use dispatcher::Dispatcher;
use error::BotError;
use metrics::create_metrics;
use monitor_engine::{EngineConfig, MonitorEngine};
use notify::{MessagingTransport, RetryingNotifier};
use p2p_client::P2pClient;
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramClient;
use tokio::sync::watch;
use tracing::info;

/// Interval for periodic health status logging.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    common::init_logging();

    if let Err(error) = run().await {
        tracing::error!(%error, "bot failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BotError> {
    let token = bot_token().ok_or(BotError::MissingToken)?;

    let telegram = Arc::new(TelegramClient::new(&token)?);
    let source = Arc::new(P2pClient::new()?);
    let metrics = create_metrics();

    let transport: Arc<dyn MessagingTransport> = telegram.clone();
    let notifier = Arc::new(RetryingNotifier::new(transport));

    let engine = Arc::new(MonitorEngine::new(
        source,
        notifier,
        metrics.clone(),
        EngineConfig::default(),
    ));

    info!("starting P2P monitor bot");

    // Shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Ctrl+C handler
    let shutdown_for_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, initiating shutdown");
            let _ = shutdown_for_signal.send(true);
        }
    });

    // Periodic health reporter
    let health_metrics = metrics.clone();
    let mut health_shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEALTH_LOG_INTERVAL);
        interval.tick().await; // the first tick fires immediately

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = health_metrics.snapshot();
                    info!(
                        status = %snapshot.health_status(),
                        active_monitors = snapshot.active_monitors,
                        polls = snapshot.polls_completed,
                        query_failures = snapshot.query_failures,
                        notifications = snapshot.notifications_sent,
                        "health check"
                    );
                }
                _ = health_shutdown_rx.changed() => {
                    if *health_shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    let dispatcher = Dispatcher::new(telegram, engine);
    dispatcher.run(shutdown_rx).await?;

    // Print final metrics on the way out.
    println!("\n{}", metrics.snapshot());

    info!("shutdown complete");
    Ok(())
}

/// Token from the first CLI argument, falling back to the environment.
fn bot_token() -> Option<String> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
        .filter(|t| !t.is_empty())
}
