use anyhow::Result;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::agent::client::AgentClient;
use crate::config::Config;
use crate::models::{PortfolioSnapshot, PriceResponse, PriceSnapshot};
use crate::state::{RunningFlag, VisibilityFlag};
use crate::utils::ScheduledTask;

/// How often the read-only endpoints are polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCadence {
    pub active: Duration,
    pub idle: Duration,
}

impl PollCadence {
    pub fn new(active: Duration, idle: Duration) -> Self {
        Self { active, idle }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.active_poll_interval(), config.idle_poll_interval())
    }

    /// Delay before the next poll, or `None` while the view is hidden
    pub fn next_delay(&self, running: bool, visible: bool) -> Option<Duration> {
        match (visible, running) {
            (false, _) => None,
            (true, true) => Some(self.active),
            (true, false) => Some(self.idle),
        }
    }
}

/// Sleep until the next poll is due. The deadline is only moved when a flag
/// change alters the cadence. Returns false once the flags have been dropped.
async fn wait_turn(
    cadence: PollCadence,
    running: &mut watch::Receiver<bool>,
    visible: &mut watch::Receiver<bool>,
) -> bool {
    let mut delay = cadence.next_delay(*running.borrow_and_update(), *visible.borrow_and_update());
    let mut deadline = delay.map(|d| Instant::now() + d);

    loop {
        match deadline {
            None => {
                if visible.changed().await.is_err() {
                    return false;
                }
                // Back on screen: refresh right away
                if *visible.borrow() {
                    return true;
                }
            }
            Some(at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => return true,
                    changed = running.changed() => {
                        if changed.is_err() {
                            return false;
                        }
                    }
                    changed = visible.changed() => {
                        if changed.is_err() {
                            return false;
                        }
                    }
                }
            }
        }

        let next = cadence.next_delay(*running.borrow_and_update(), *visible.borrow_and_update());
        if next != delay {
            delay = next;
            deadline = next.map(|d| Instant::now() + d);
        }
    }
}

async fn poll_loop<T, F, Fut, P>(
    what: &'static str,
    cadence: PollCadence,
    mut running: watch::Receiver<bool>,
    mut visible: watch::Receiver<bool>,
    fetch: F,
    mut publish: P,
) where
    F: Fn() -> Fut + Send,
    Fut: Future<Output = Result<T>> + Send,
    P: FnMut(T) + Send,
    T: Send,
{
    let mut due = *visible.borrow();

    loop {
        if due {
            match fetch().await {
                Ok(value) => {
                    debug!("{} poll succeeded", what);
                    publish(value);
                }
                Err(e) => warn!("{} poll failed, keeping previous snapshot: {:#}", what, e),
            }
        }

        if !wait_turn(cadence, &mut running, &mut visible).await {
            info!("{} poller stopping", what);
            return;
        }
        due = true;
    }
}

/// Background polling of the price and portfolio endpoints
pub struct Poller {
    prices: watch::Receiver<PriceSnapshot>,
    portfolio: watch::Receiver<PortfolioSnapshot>,
    tasks: Vec<ScheduledTask>,
}

impl Poller {
    pub fn start(
        client: AgentClient,
        cadence: PollCadence,
        running: &RunningFlag,
        visibility: &VisibilityFlag,
    ) -> Self {
        let (price_tx, prices) = watch::channel(PriceSnapshot::default());
        let (portfolio_tx, portfolio) = watch::channel(PortfolioSnapshot::default());

        let price_client = client.clone();
        let price_task = ScheduledTask::spawn(
            "price-poller",
            poll_loop(
                "Price",
                cadence,
                running.subscribe(),
                visibility.subscribe(),
                move || {
                    let client = price_client.clone();
                    async move { client.fetch_prices().await }
                },
                move |response: PriceResponse| {
                    price_tx.send_modify(|snapshot| *snapshot = snapshot.merged_with(&response))
                },
            ),
        );

        let portfolio_task = ScheduledTask::spawn(
            "portfolio-poller",
            poll_loop(
                "Portfolio",
                cadence,
                running.subscribe(),
                visibility.subscribe(),
                move || {
                    let client = client.clone();
                    async move { client.fetch_portfolio().await }
                },
                move |response: PortfolioSnapshot| {
                    portfolio_tx.send_modify(|snapshot| *snapshot = snapshot.merged_with(&response))
                },
            ),
        );

        info!(
            "Polling every {}s while running, {}s while idle",
            cadence.active.as_secs(),
            cadence.idle.as_secs()
        );

        Self {
            prices,
            portfolio,
            tasks: vec![price_task, portfolio_task],
        }
    }

    /// Latest prices; clone the receiver to hand it to a `ControlSession`
    pub fn prices(&self) -> watch::Receiver<PriceSnapshot> {
        self.prices.clone()
    }

    pub fn portfolio(&self) -> watch::Receiver<PortfolioSnapshot> {
        self.portfolio.clone()
    }

    pub fn stop(self) {
        for task in self.tasks {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cadence() -> PollCadence {
        PollCadence::new(Duration::from_secs(5), Duration::from_secs(30))
    }

    #[test]
    fn test_running_polls_faster() {
        assert_eq!(cadence().next_delay(true, true), Some(Duration::from_secs(5)));
        assert_eq!(cadence().next_delay(false, true), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_hidden_view_stops_polling() {
        assert_eq!(cadence().next_delay(true, false), None);
        assert_eq!(cadence().next_delay(false, false), None);
    }

    #[test]
    fn test_cadence_from_config() {
        let config = Config {
            active_poll_seconds: 2,
            idle_poll_seconds: 20,
            ..Config::default()
        };
        assert_eq!(
            PollCadence::from_config(&config),
            PollCadence::new(Duration::from_secs(2), Duration::from_secs(20))
        );
    }

    #[tokio::test]
    async fn test_wait_turn_wakes_when_view_returns() {
        let running = RunningFlag::new(false);
        let visible = VisibilityFlag::new(false);
        let mut running_rx = running.subscribe();
        let mut visible_rx = visible.subscribe();

        let waiter = tokio::spawn(async move { wait_turn(cadence(), &mut running_rx, &mut visible_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        visible.set(true);

        let woke = tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(woke);
    }

    #[tokio::test]
    async fn test_unchanged_status_does_not_postpone_poll() {
        let cadence = PollCadence::new(Duration::from_millis(300), Duration::from_millis(300));
        let running = RunningFlag::new(false);
        let visible = VisibilityFlag::new(true);
        let mut running_rx = running.subscribe();
        let mut visible_rx = visible.subscribe();

        let chatter = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;
                running.set(false);
            }
        });

        let woke = tokio::time::timeout(
            Duration::from_millis(1_500),
            wait_turn(cadence, &mut running_rx, &mut visible_rx),
        )
        .await;
        chatter.abort();

        assert_eq!(woke.ok(), Some(true));
    }

    #[tokio::test]
    async fn test_switching_to_active_cadence_brings_poll_forward() {
        let cadence = PollCadence::new(Duration::from_millis(200), Duration::from_secs(60));
        let running = RunningFlag::new(false);
        let visible = VisibilityFlag::new(true);
        let mut running_rx = running.subscribe();
        let mut visible_rx = visible.subscribe();

        let waiter =
            tokio::spawn(async move { wait_turn(cadence, &mut running_rx, &mut visible_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Switching to the active cadence brings the next poll forward
        running.set(true);

        let woke = tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(woke);
    }

    #[tokio::test]
    async fn test_wait_turn_ends_when_flags_dropped() {
        let running = RunningFlag::new(false);
        let visible = VisibilityFlag::new(false);
        let mut running_rx = running.subscribe();
        let mut visible_rx = visible.subscribe();
        drop(running);
        drop(visible);

        assert!(!wait_turn(cadence(), &mut running_rx, &mut visible_rx).await);
    }
}
