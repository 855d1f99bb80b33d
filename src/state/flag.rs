use std::sync::Arc;
use tokio::sync::watch;

/// Boolean shared between the event channel, the control session and the
/// pollers. Readers can await changes through [`SharedFlag::subscribe`].
#[derive(Debug, Clone)]
pub struct SharedFlag {
    tx: Arc<watch::Sender<bool>>,
}

/// Whether the agent is scanning
pub type RunningFlag = SharedFlag;

/// Whether the console view is on screen; pollers pause while it is not
pub type VisibilityFlag = SharedFlag;

impl SharedFlag {
    pub fn new(initial: bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> bool {
        *self.tx.borrow()
    }

    /// Store a new value, returning the previous one. Subscribers are only
    /// woken when the value actually changes.
    pub fn set(&self, value: bool) -> bool {
        let mut previous = value;
        self.tx.send_if_modified(|current| {
            previous = std::mem::replace(current, value);
            previous != value
        });
        previous
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
