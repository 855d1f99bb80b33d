use log::{debug, info};

use crate::monitoring::event_source::EventSource;
use crate::state::{ConsoleState, SharedState};
use crate::utils::ScheduledTask;

/// Pumps events from a source into console state, one at a time, in the
/// order the source delivers them
pub struct EventChannel<S: EventSource> {
    source: S,
    state: SharedState,
}

impl<S: EventSource + 'static> EventChannel<S> {
    pub fn new(source: S, state: SharedState) -> Self {
        Self { source, state }
    }

    /// Handle events until the source runs dry. Returns how many were applied.
    pub async fn run(mut self) -> usize {
        let mut handled = 0;

        while let Some(event) = self.source.next_event().await {
            debug!("Applying '{}' event", event.name());
            ConsoleState::lock(&self.state).apply(event);
            handled += 1;
        }

        info!("Agent event stream ended after {} events", handled);
        self.source.close().await;
        handled
    }

    /// Run on a background task owned by the returned guard
    pub fn spawn(self) -> ScheduledTask {
        ScheduledTask::spawn("event-channel", async move {
            self.run().await;
        })
    }
}
