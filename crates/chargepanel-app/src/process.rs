//! Message processing
//!
//! Runs the TEA update loop for one incoming message, including every
//! follow-up message it produces, and hands resulting actions to the
//! transport.

use std::sync::Arc;

use tokio::sync::mpsc;

use chargepanel_device::Transport;

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::state::PanelState;

/// Process a message through the TEA update function
pub fn process_message<T>(
    state: &mut PanelState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    transport: &Arc<T>,
) where
    T: Transport + Send + Sync + 'static,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            handle_action(action, msg_tx.clone(), transport.clone());
        }

        // Continue with follow-up message
        msg = result.message;
    }
}
