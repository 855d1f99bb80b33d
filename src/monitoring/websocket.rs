use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::monitoring::event_source::{ChannelSource, EventSource};
use crate::monitoring::events::AgentEvent;
use crate::monitoring::frame::{parse_frame, Frame, NAMESPACE_CONNECT, PONG};
use crate::utils::ScheduledTask;

/// Base delay before reconnecting to the agent
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Buffered events between the socket actor and the consumer
const EVENT_BUFFER: usize = 1000;

/// Subscribes to the agent's push stream over a websocket.
///
/// A background actor owns the connection, reconnects after drops and
/// forwards decoded events. The server re-sends history and status after
/// every reconnect, so nothing is replayed locally.
pub struct WebSocketEventSource {
    events: ChannelSource,
    actor: Option<ScheduledTask>,
}

impl WebSocketEventSource {
    pub fn connect(url: Url) -> Self {
        let (tx, events) = ChannelSource::pair(EVENT_BUFFER);
        let actor = EventStreamActor { url, tx };
        let task = ScheduledTask::spawn("agent-events", actor.run());

        Self {
            events,
            actor: Some(task),
        }
    }
}

#[async_trait]
impl EventSource for WebSocketEventSource {
    async fn next_event(&mut self) -> Option<AgentEvent> {
        self.events.next_event().await
    }

    async fn close(&mut self) {
        info!("Closing agent event subscription");
        if let Some(actor) = self.actor.take() {
            actor.cancel();
        }
        self.events.close().await;
    }
}

/// Why a connection ended
enum Disconnect {
    Dropped,
    ReceiverGone,
}

struct EventStreamActor {
    url: Url,
    tx: mpsc::Sender<AgentEvent>,
}

impl EventStreamActor {
    async fn run(self) {
        loop {
            info!("Connecting to agent events at {}", self.url);
            match connect_async(self.url.as_str()).await {
                Ok((ws_stream, _)) => {
                    info!("Connected to agent event stream");
                    let (mut write, mut read) = ws_stream.split();
                    let mut outcome = Disconnect::Dropped;

                    while let Some(msg_result) = read.next().await {
                        let text = match msg_result {
                            Ok(Message::Text(text)) => text,
                            Ok(Message::Close(_)) => {
                                info!("Agent closed the event stream");
                                break;
                            }
                            Ok(_) => continue,
                            Err(e) => {
                                error!("Event stream error: {}", e);
                                break;
                            }
                        };

                        let reply = match parse_frame(&text) {
                            Ok(Frame::Open) => Some(NAMESPACE_CONNECT),
                            Ok(Frame::Ping) => Some(PONG),
                            Ok(Frame::Connected) => {
                                if !self.forward(AgentEvent::Connect).await {
                                    outcome = Disconnect::ReceiverGone;
                                    break;
                                }
                                None
                            }
                            Ok(Frame::Event { name, payload }) => {
                                match AgentEvent::decode(&name, payload) {
                                    Ok(Some(event)) => {
                                        if !self.forward(event).await {
                                            outcome = Disconnect::ReceiverGone;
                                            break;
                                        }
                                    }
                                    Ok(None) => debug!("Ignoring unknown event '{}'", name),
                                    Err(e) => warn!("Dropping event: {}", e),
                                }
                                None
                            }
                            Ok(Frame::Ignored) => None,
                            Err(e) => {
                                warn!("Dropping frame: {}", e);
                                None
                            }
                        };

                        if let Some(reply) = reply {
                            if let Err(e) = write.send(Message::Text(reply.to_string())).await {
                                error!("Failed to answer agent handshake: {}", e);
                                break;
                            }
                        }
                    }

                    if let Disconnect::ReceiverGone = outcome {
                        info!("Event consumer gone, stopping subscription");
                        let _ = write.close().await;
                        return;
                    }
                }
                Err(e) => {
                    error!("Connection to agent events failed: {}", e);
                }
            }

            if self.tx.is_closed() {
                return;
            }

            let jitter = Duration::from_millis(fastrand::u64(0..1_000));
            let delay = RECONNECT_DELAY + jitter;
            warn!("Disconnected from agent events. Reconnecting in {:?}...", delay);
            sleep(delay).await;
        }
    }

    /// Returns false once nobody is listening
    async fn forward(&self, event: AgentEvent) -> bool {
        debug!("Received '{}' event", event.name());
        self.tx.send(event).await.is_ok()
    }
}
