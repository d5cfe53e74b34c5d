//! Long-polling dispatcher: converts teloxide messages to core [`Message`]s and runs them
//! through the [`HandlerChain`].
//!
//! Teloxide's default distribution serializes updates of one chat and runs different chats
//! concurrently, so a chat never has two messages in the chain at once.
//!
//! [`Message`]: crate::core::Message

use std::sync::Arc;

use teloxide::{dispatching::ShutdownToken, prelude::*};
use tracing::{debug, error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;
use crate::chain::HandlerChain;
use crate::core::ToCoreMessage;

async fn handle_message(msg: teloxide::types::Message, chain: Arc<HandlerChain>) -> ResponseResult<()> {
    if msg.text().is_none() {
        debug!(chat_id = msg.chat.id.0, "Ignoring non-text message");
        return Ok(());
    }
    let core_msg = TelegramMessageWrapper(&msg).to_core();
    if let Err(e) = chain.handle(&core_msg).await {
        error!(
            error = %e,
            chat_id = core_msg.chat.id,
            user_id = core_msg.user.id,
            "Handler chain failed"
        );
    }
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (ctrl-c only on non-unix).
pub async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;
    Ok(())
}

/// Asks the dispatcher to stop polling and waits until in-flight handlers finish.
pub async fn stop_dispatcher(token: &ShutdownToken) {
    match token.shutdown() {
        Ok(done) => done.await,
        Err(e) => warn!(error = ?e, "Dispatcher was not running at shutdown"),
    }
}

/// Runs the dispatcher until a shutdown signal arrives, then returns once polling has stopped
/// and in-flight handlers have finished.
#[instrument(skip(bot, handler_chain))]
pub async fn run_dispatcher(bot: teloxide::Bot, handler_chain: HandlerChain) -> anyhow::Result<()> {
    if let Ok(me) = bot.get_me().await {
        if let Some(username) = &me.user.username {
            info!(username = %username, "Bot identity resolved");
        }
    }

    let handler = Update::filter_message().endpoint(handle_message);
    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::new(handler_chain)])
        .default_handler(|upd| async move {
            debug!(update_id = ?upd.id, "Unhandled update");
        })
        .build();

    let token = dispatcher.shutdown_token();
    let watcher = tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => info!("Shutdown signal received, stopping dispatcher"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signals, stopping"),
        }
        stop_dispatcher(&token).await;
    });

    info!("Starting long-polling dispatcher");
    dispatcher.dispatch().await;
    watcher.abort();
    info!("Dispatcher stopped");
    Ok(())
}
