//! `tutord` - pipeline bootstrap
//!
//! Loads credentials from the environment, sets up the sandbox
//! layout, establishes the watch subscription (fatal if it cannot be
//! established), seeds the queue, and runs the watch controller until
//! ctrl-c.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;
use tutor_agent::paths::{INPUT_DIR, OUTPUT_DIR, QUEUE_FILE};
use tutor_agent::{Config, QueueProcessor, WatchController};
use tutor_completion::{CompletionGateway, OpenAiGateway};
use tutor_sandbox::{RemoteSandbox, StorageGateway};

/// Demo questions seeded into a fresh queue
const SEED_QUESTIONS: &str = "\
What is an AI agent?
How do butterflies get their colors?
Why do we have leap years?
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("configuration")?;
    tracing::info!("tutor-agent {} starting", tutor_agent::VERSION);

    let storage: Arc<dyn StorageGateway> = Arc::new(
        RemoteSandbox::new(config.sandbox_api_key.clone())
            .with_poll_interval(config.poll_interval),
    );
    let mut openai = OpenAiGateway::new(config.openai_api_key.clone());
    if let Some(model) = &config.model {
        openai = openai.with_model(model);
    }
    let completion: Arc<dyn CompletionGateway> = Arc::new(openai);

    setup_layout(storage.as_ref()).await;

    // No subscription, no trigger mechanism: fatal.
    let subscription = storage
        .watch_dir(INPUT_DIR)
        .await
        .context("establishing watch subscription")?;

    let processor = Arc::new(QueueProcessor::new(storage.clone(), completion));
    let controller = WatchController::new(processor);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let controller_task =
        tokio::spawn(async move { controller.run(subscription, shutdown_rx).await });

    // Demo enqueue; this write is the first qualifying trigger.
    if let Err(e) = storage.write_file(QUEUE_FILE, SEED_QUESTIONS).await {
        tracing::error!("seeding the queue failed: {}", e);
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    let _ = shutdown_tx.send(());
    controller_task.await.context("joining controller")?;

    tracing::info!("tutor-agent stopped");
    Ok(())
}

/// Create the sandbox directories and make sure the queue file exists
///
/// Directory races and per-path failures are logged and skipped, like
/// every other recoverable setup step. The queue file must exist
/// before the watch snapshot is taken, so that the seed write surfaces
/// as a write event rather than a creation.
async fn setup_layout(storage: &dyn StorageGateway) {
    for dir in [OUTPUT_DIR, INPUT_DIR] {
        if let Err(e) = storage.make_dir(dir).await {
            tracing::error!("error setting up directory {}: {}", dir, e);
        }
    }

    match storage.read_file(QUEUE_FILE).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => {
            if let Err(e) = storage.write_file(QUEUE_FILE, "").await {
                tracing::error!("error creating queue file: {}", e);
            }
        }
        Err(e) => tracing::error!("error probing queue file: {}", e),
    }
}
