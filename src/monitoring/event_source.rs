use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::monitoring::events::AgentEvent;

/// Anything that yields agent push events in delivery order
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` once the source is exhausted or closed
    async fn next_event(&mut self) -> Option<AgentEvent>;

    /// Release the underlying subscription
    async fn close(&mut self);
}

/// Event source backed by an in-process channel
pub struct ChannelSource {
    receiver: mpsc::Receiver<AgentEvent>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<AgentEvent>) -> Self {
        Self { receiver }
    }

    /// A source plus the sender that feeds it
    pub fn pair(buffer: usize) -> (mpsc::Sender<AgentEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> Option<AgentEvent> {
        self.receiver.recv().await
    }

    async fn close(&mut self) {
        self.receiver.close();
    }
}
