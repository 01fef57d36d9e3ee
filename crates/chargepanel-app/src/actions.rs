//! Action handlers: UpdateAction dispatch and background write tasks

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use chargepanel_core::prelude::*;
use chargepanel_device::{
    Transport, AVAILABLE_CURRENT_UPDATE_PATH, CONFIG_UPDATE_PATH, REBOOT_PATH,
};

use crate::handler::UpdateAction;
use crate::message::Message;

/// Execute an action by spawning a background task.
///
/// Completions come back through `msg_tx` in whatever order the device
/// answers; nothing here waits for a previous write.
pub fn handle_action<T>(action: UpdateAction, msg_tx: mpsc::Sender<Message>, transport: Arc<T>)
where
    T: Transport + Send + Sync + 'static,
{
    match action {
        UpdateAction::PutConfig { ticket, config } => {
            tokio::spawn(async move {
                let payload = match serde_json::to_value(&config) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("Failed to encode configuration: {}", e);
                        return;
                    }
                };

                let msg = match transport.put(CONFIG_UPDATE_PATH, payload).await {
                    Ok(()) => Message::ConfigSaved { ticket },
                    Err(failure) => Message::ConfigSaveFailed { ticket, failure },
                };
                let _ = msg_tx.send(msg).await;
            });
        }

        UpdateAction::PutAvailableCurrent { ticket, current } => {
            tokio::spawn(async move {
                let payload = json!({ "current": current });

                let msg = match transport.put(AVAILABLE_CURRENT_UPDATE_PATH, payload).await {
                    Ok(()) => Message::AvailableCurrentSet { ticket, current },
                    Err(failure) => Message::AvailableCurrentFailed { ticket, failure },
                };
                let _ = msg_tx.send(msg).await;
            });
        }

        UpdateAction::Reboot => {
            tokio::spawn(async move {
                match transport.put(REBOOT_PATH, serde_json::Value::Null).await {
                    Ok(()) => info!("Reboot requested"),
                    Err(failure) => {
                        let _ = msg_tx.send(Message::RebootFailed { failure }).await;
                    }
                }
            });
        }
    }
}
