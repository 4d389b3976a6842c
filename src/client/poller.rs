use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use tokio::{sync::oneshot, task::JoinHandle, time::Interval};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::budgets::http::reps::NotificationRep;

/// Somewhere notifications can be fetched from.
#[async_trait]
pub trait NotificationSource: Send + Sync + 'static {
    async fn fetch_notifications(&self) -> anyhow::Result<Vec<NotificationRep>>;
}

/// Receives notifications the poller has not seen before.
pub trait NotificationSink: Send + Sync + 'static {
    fn deliver(&self, notifications: Vec<NotificationRep>);
}

/// Decides when the poller runs next.
#[async_trait]
pub trait Ticker: Send + 'static {
    async fn tick(&mut self);
}

/// Ticks on a fixed interval. The first tick completes immediately.
pub struct IntervalTicker(Interval);

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self(tokio::time::interval(period))
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.0.tick().await;
    }
}

/// Logs each new notification.
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn deliver(&self, notifications: Vec<NotificationRep>) {
        for notification in notifications {
            info!(
                notification_id = %notification.id,
                kind = notification.kind.as_str(),
                "{}",
                notification.message
            );
        }
    }
}

/// Periodically fetches unread notifications and hands new ones to a sink.
pub struct NotificationPoller<S, K, T> {
    source: S,
    sink: K,
    ticker: T,
    seen: HashSet<Uuid>,
}

impl<S, K, T> NotificationPoller<S, K, T>
where
    S: NotificationSource,
    K: NotificationSink,
    T: Ticker,
{
    pub fn new(source: S, sink: K, ticker: T) -> Self {
        Self {
            source,
            sink,
            ticker,
            seen: HashSet::new(),
        }
    }

    /// Start polling in a background task.
    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(stop_rx));

        PollerHandle { stop_tx, task }
    }

    async fn run(mut self, mut stop: oneshot::Receiver<()>) {
        debug!("Notification poller started.");

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = self.ticker.tick() => self.poll().await,
            }
        }

        debug!("Notification poller stopped.");
    }

    async fn poll(&mut self) {
        let notifications = match self.source.fetch_notifications().await {
            Ok(notifications) => notifications,
            Err(error) => {
                debug!(?error, "Failed to poll notifications.");

                return;
            }
        };

        let unread: Vec<_> = notifications
            .into_iter()
            .filter(|notification| !notification.is_read)
            .collect();

        // Only ids still listed as unread need remembering.
        self.seen
            .retain(|id| unread.iter().any(|notification| notification.id == *id));

        let fresh: Vec<_> = unread
            .into_iter()
            .filter(|notification| self.seen.insert(notification.id))
            .collect();

        if !fresh.is_empty() {
            self.sink.deliver(fresh);
        }
    }
}

/// Stops a running [`NotificationPoller`]. Dropping the handle also stops
/// the poller, without waiting for it.
pub struct PollerHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for the background task to finish.
    pub async fn stop(self) {
        // An error means the task has already exited.
        let _ = self.stop_tx.send(());

        if let Err(error) = self.task.await {
            error!(?error, "Notification poller panicked.");
        }
    }
}
