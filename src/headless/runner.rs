//! Headless mode runner - panel event loop without a browser
//!
//! Wires the engine to the device: HTTP writes, the configured push feed,
//! stdin commands and OS signals. DOM operations are applied to an in-memory
//! page and echoed as NDJSON.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use chargepanel_app::config::{PushKind, Settings};
use chargepanel_app::{signals, DomBinding, DomOp, ElementTree, Engine, Message};
use chargepanel_core::prelude::*;
use chargepanel_device::{run_event_stream, run_websocket, HttpTransport, PushChannel};

use super::commands::parse_command;
use super::HeadlessEvent;

/// How long the push feed gets to stop after shutdown
const FEED_STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// In-memory page that echoes every operation to stdout
#[derive(Debug, Default)]
pub struct NdjsonBinding {
    pub tree: ElementTree,
}

impl NdjsonBinding {
    pub fn new() -> Self {
        Self {
            tree: ElementTree::with_panel_skeleton(),
        }
    }
}

impl DomBinding for NdjsonBinding {
    fn apply(&mut self, op: &DomOp) {
        self.tree.apply(op);
        HeadlessEvent::dom(op.clone()).emit();
    }
}

/// Run in headless mode against the device named in `settings`
pub async fn run_headless(settings: Settings) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("chargepanel starting in HEADLESS mode");
    info!("Device: {}", settings.device.url);
    info!("═══════════════════════════════════════════════════════");

    let base = settings.device.base_url()?;
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;
    let transport =
        HttpTransport::with_client(client.clone(), base, settings.device.write_timeout());

    let mut engine = Engine::new(transport, NdjsonBinding::new(), settings);
    signals::spawn_signal_handler(engine.msg_sender());

    // Stdin reader runs on a plain thread; it blocks on reads
    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx);
    });

    engine.init()?;

    let channel = PushChannel::new();
    engine.add_event_listeners(&channel);
    engine.add_module_listener(&channel);

    let feed = spawn_push_feed(&engine.settings, client, channel, engine.shutdown_receiver())?;

    HeadlessEvent::started(
        engine.transport().base_url().as_str(),
        &engine.settings.device.push.to_string(),
    )
    .emit();

    engine.run().await;

    engine.shutdown();
    match tokio::time::timeout(FEED_STOP_TIMEOUT, feed).await {
        Ok(Ok(())) => info!("Push feed stopped"),
        Ok(Err(e)) => warn!("Push feed panicked: {}", e),
        Err(_) => warn!("Push feed stop timed out"),
    }

    HeadlessEvent::stopped().emit();
    info!("chargepanel headless mode exiting");
    Ok(())
}

fn spawn_push_feed(
    settings: &Settings,
    client: reqwest::Client,
    channel: PushChannel,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<JoinHandle<()>> {
    let delay = settings.behavior.reconnect_delay();

    let handle = match settings.device.push {
        PushKind::EventStream => {
            let url = settings.device.events_url()?;
            tokio::spawn(run_event_stream(client, url, channel, delay, shutdown_rx))
        }
        PushKind::Websocket => {
            let url = settings.device.websocket_url()?;
            tokio::spawn(run_websocket(url, channel, delay, shutdown_rx))
        }
    };

    Ok(handle)
}

/// Read operator commands from stdin and forward them (blocking)
fn spawn_stdin_reader_blocking(msg_tx: mpsc::Sender<Message>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let messages = match parse_command(&line) {
            Ok(messages) => messages,
            Err(reason) => {
                warn!("Rejected stdin command {:?}: {}", line, reason);
                HeadlessEvent::command_rejected(line.trim(), reason).emit();
                continue;
            }
        };

        let quit = messages.iter().any(|msg| matches!(msg, Message::Quit));
        for msg in messages {
            if msg_tx.blocking_send(msg).is_err() {
                info!("Engine gone, stdin reader exiting");
                return;
            }
        }
        if quit {
            break;
        }
    }

    info!("Stdin reader exiting");
}
