//! Client lifecycle.

use {
    secrecy::{ExposeSecret, Secret},
    serenity::Client,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::MediaCopyHandler;

/// Connect and process events until `cancel` fires or the connection ends.
///
/// # Errors
///
/// Returns an error when the client cannot be built or the gateway
/// connection fails (bad token, missing privileged intents, ...).
pub async fn run(
    token: &Secret<String>,
    handler: MediaCopyHandler,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut client = Client::builder(token.expose_secret(), MediaCopyHandler::intents())
        .event_handler(handler)
        .await?;

    let shard_manager = client.shard_manager.clone();
    let watcher = tokio::spawn(async move {
        cancel.cancelled().await;
        info!("shutting down discord client");
        shard_manager.shutdown_all().await;
    });

    let result = client.start().await;
    watcher.abort();
    if let Err(e) = &result {
        warn!(error = %e, "discord client stopped with an error");
    }
    Ok(result?)
}
