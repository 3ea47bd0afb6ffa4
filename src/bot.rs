//! Long-polling event loop.
//!
//! Updates are fetched from Telegram and handed to the workflow handler one
//! at a time; each event runs to completion before the next is taken, so no
//! two events interleave inside this process.

use crate::telegram::TelegramClient;
use crate::workflow::WorkflowHandler;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct Bot {
    client: Arc<TelegramClient>,
    handler: WorkflowHandler,
}

impl Bot {
    pub fn new(client: Arc<TelegramClient>, handler: WorkflowHandler) -> Self {
        Self { client, handler }
    }

    /// Poll forever. Handler errors are logged and never abort the loop; a
    /// failed poll backs off for a second before the next attempt.
    pub async fn run(&self) {
        let mut offset = 0i64;

        loop {
            match self.client.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id.saturating_add(1));
                        if let Err(err) = self.handler.handle_update(update).await {
                            warn!(error = %err, "failed to handle update");
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "getUpdates poll failed");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}
