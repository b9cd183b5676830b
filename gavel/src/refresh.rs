use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use gavel_contract::{Activity, Ledger};
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::{Snapshots, Synchronizer};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Background loop that keeps [`Snapshots`] fresh.
///
/// Syncs run on every interval tick, on every [`Refresher::trigger`] and on
/// every event of a [followed](Refresher::follow) activity stream.
/// A running sync is never cancelled by a newer one; whichever completes
/// last is published last. Dropping the refresher stops the loop together
/// with any sync still in flight.
#[derive(Debug)]
pub struct Refresher {
    trigger: Arc<Notify>,
    task: JoinHandle<()>,
    followers: JoinSet<()>,
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.task.abort()
    }
}

impl Refresher {
    pub fn spawn<L>(sync: Synchronizer<L>, snapshots: Snapshots, period: Duration) -> Self
    where
        L: Ledger + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let trigger = Arc::new(Notify::new());
        let task = tokio::spawn(run(sync, snapshots, period, trigger.clone()));
        Self {
            trigger,
            task,
            followers: JoinSet::new(),
        }
    }

    /// Request a sync now. Requests made while the loop is busy starting
    /// another sync coalesce into one.
    pub fn trigger(&self) {
        self.trigger.notify_one()
    }

    /// Trigger a sync for every event of `events` until it ends.
    pub fn follow<S>(&mut self, events: S)
    where
        S: Stream<Item = Activity> + Send + 'static,
    {
        let trigger = self.trigger.clone();
        self.followers.spawn(async move {
            let mut events = std::pin::pin!(events);
            while let Some(a) = events.next().await {
                debug!(auction = %a.auction(), ?a, "ledger activity");
                trigger.notify_one()
            }
            warn!("activity stream ended, falling back to periodic refresh")
        });
    }
}

async fn run<L>(sync: Synchronizer<L>, snapshots: Snapshots, period: Duration, trigger: Arc<Notify>)
where
    L: Ledger + 'static,
{
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut running = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticks.tick() => debug!("periodic refresh"),
            _ = trigger.notified() => debug!("triggered refresh"),
            Some(r) = running.join_next(), if !running.is_empty() => {
                if let Err(err) = r {
                    warn!(%err, "refresh task failed");
                }
                continue
            }
        }

        let sync = sync.clone();
        let snapshots = snapshots.clone();
        running.spawn(async move {
            match sync.sync().await {
                Ok(s) => {
                    snapshots.publish(s);
                }
                Err(err) => warn!(%err, "refresh failed, keeping previous snapshot"),
            }
        });
    }
}
