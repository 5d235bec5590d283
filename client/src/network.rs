//! WebSocket transport carrying JSON protocol messages.
//!
//! The socket lives on its own tokio runtime thread. The render loop never blocks
//! on it: incoming messages queue up in a channel and are drained once per render
//! callback, outgoing messages are handed to the socket task through another one.

use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start transport runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to connect: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("transport thread exited before connecting")]
    HandshakeLost,
}

pub struct Transport {
    incoming: mpsc::UnboundedReceiver<Message>,
    outgoing: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

impl Transport {
    /// Connects to `url`, blocking until the handshake succeeds or fails.
    /// `fake_ping_ms` adds half its value of delay in each direction.
    pub fn connect(url: &str, fake_ping_ms: u64) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        let url = url.to_string();
        let thread_open = Arc::clone(&open);
        thread::spawn(move || {
            runtime.block_on(run_socket(
                url,
                fake_ping_ms,
                ready_tx,
                incoming_tx,
                outgoing_rx,
                thread_open,
            ));
        });

        match ready_rx.blocking_recv() {
            Ok(Ok(())) => Ok(Self {
                incoming: incoming_rx,
                outgoing: outgoing_tx,
                open,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::HandshakeLost),
        }
    }

    pub fn send(&self, message: Message) {
        if self.outgoing.send(message).is_err() {
            warn!("Dropping outgoing message, transport is closed");
        }
    }

    /// Every message received since the last call, in arrival order.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(message) = self.incoming.try_recv() {
            messages.push(message);
        }
        messages
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

async fn run_socket(
    url: String,
    fake_ping_ms: u64,
    ready_tx: oneshot::Sender<Result<(), TransportError>>,
    incoming_tx: mpsc::UnboundedSender<Message>,
    mut outgoing_rx: mpsc::UnboundedReceiver<Message>,
    open: Arc<AtomicBool>,
) {
    info!("Connecting to {}", url);
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e.into()));
            return;
        }
    };
    open.store(true, Ordering::Release);
    let _ = ready_tx.send(Ok(()));
    info!("Connected to {}", url);

    let delay = Duration::from_millis(fake_ping_ms / 2);
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = source.next() => {
                let decoded = match frame {
                    Some(Ok(WsMessage::Text(text))) => Message::from_json(&text),
                    Some(Ok(WsMessage::Binary(_))) => Ok(Message::Unrecognized {
                        kind: "binary".to_string(),
                    }),
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        error!("Error receiving message: {}", e);
                        break;
                    }
                };

                if fake_ping_ms > 0 {
                    sleep(delay).await;
                }

                match decoded {
                    Ok(message) => {
                        if incoming_tx.send(message).is_err() {
                            debug!("Receiver dropped, closing transport");
                            break;
                        }
                    }
                    Err(e) => warn!("Discarding message: {}", e),
                }
            },

            outgoing = outgoing_rx.recv() => {
                let Some(message) = outgoing else {
                    let _ = sink.close().await;
                    break;
                };

                if fake_ping_ms > 0 {
                    sleep(delay).await;
                }

                match message.to_json() {
                    Ok(json) => {
                        if let Err(e) = sink.send(WsMessage::Text(json)).await {
                            error!("Error sending message: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode outgoing message: {}", e),
                }
            },
        }
    }

    open.store(false, Ordering::Release);
}
