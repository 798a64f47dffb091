//! WebSocket broker connection.
//!
//! One background task owns the socket: it flushes outbound frames, decodes
//! inbound ones, and reconnects with exponential backoff when the broker
//! drops us. Outbound frames queue while disconnected and flush on the next
//! connection; there is no durable queue beyond that.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use async_trait::async_trait;
use serde_json::Value;

use crate::frame::Frame;
use crate::transport::{BusEvent, Transport};
use crate::BusError;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Handle to the broker connection task.
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<Frame>,
}

impl WsTransport {
    /// Spawn the connection task. Returns the outbound handle plus the
    /// stream of inbound [`BusEvent`]s; dropping the receiver stops the
    /// task.
    pub fn connect(url: String) -> (Self, mpsc::Receiver<BusEvent>) {
        let (outbound, frame_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(run_connection(url, frame_rx, event_tx));
        (Self { outbound }, event_rx)
    }

    fn send_frame(&self, frame: Frame) -> Result<(), BusError> {
        self.outbound.send(frame).map_err(|_| BusError::Closed)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn subscribe(&self, pattern: &str) -> Result<(), BusError> {
        self.send_frame(Frame::Subscribe {
            pattern: pattern.to_string(),
        })
    }

    async fn publish(&self, topic: &str, payload: Value, retain: bool) -> Result<(), BusError> {
        self.send_frame(Frame::Publish {
            topic: topic.to_string(),
            payload,
            retain,
        })
    }
}

/// Connection loop: connect, pump frames both ways, back off and retry on
/// any failure. Exits when either channel end is gone.
async fn run_connection(
    url: String,
    mut frame_rx: mpsc::UnboundedReceiver<Frame>,
    event_tx: mpsc::Sender<BusEvent>,
) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match connect_async(&url).await {
            Ok((ws, _)) => {
                tracing::info!(%url, "connected to broker");
                backoff = INITIAL_BACKOFF;
                if event_tx.send(BusEvent::Connected).await.is_err() {
                    return;
                }

                let (mut sink, mut stream) = ws.split();
                loop {
                    tokio::select! {
                        frame = frame_rx.recv() => match frame {
                            Some(frame) => {
                                let text = match serde_json::to_string(&frame) {
                                    Ok(text) => text,
                                    Err(e) => {
                                        tracing::warn!(error = %e, "dropping unencodable frame");
                                        continue;
                                    }
                                };
                                if let Err(e) = sink.send(Message::Text(text)).await {
                                    tracing::warn!(error = %e, "broker write failed");
                                    break;
                                }
                            }
                            // Transport handle dropped — nothing left to do.
                            None => return,
                        },
                        inbound = stream.next() => match inbound {
                            Some(Ok(Message::Text(text))) => {
                                handle_inbound(&text, &event_tx).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::warn!("broker closed the connection");
                                break;
                            }
                            Some(Ok(_)) => {} // ping/pong/binary
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "broker read error");
                                break;
                            }
                        },
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "broker connect failed");
            }
        }

        if event_tx.is_closed() {
            return;
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Decode one inbound frame. An undecodable frame is logged and dropped;
/// the connection stays up.
async fn handle_inbound(text: &str, event_tx: &mpsc::Sender<BusEvent>) {
    match serde_json::from_str::<Frame>(text) {
        Ok(Frame::Message { topic, payload }) => {
            if event_tx
                .send(BusEvent::Message { topic, payload })
                .await
                .is_err()
            {
                tracing::debug!("event receiver gone, dropping inbound message");
            }
        }
        Ok(other) => {
            tracing::debug!(frame = ?other, "ignoring non-message frame from broker");
        }
        Err(e) => {
            tracing::warn!(error = %e, "undecodable broker frame dropped");
        }
    }
}
