use super::{Inner, Synchronizer};
use crate::feed::FeedName;
use std::{sync::Weak, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::debug;

/// Spawn the timer task driving periodic refreshes of one feed.
///
/// The first tick fires immediately. Each tick spawns its refresh rather than awaiting it, so
/// a slow fetch neither delays the cadence nor dies with the timer on `stop_polling`; overlap
/// is suppressed by the in-flight check in `refresh`. The task holds only a weak reference and
/// exits once the last [`Synchronizer`] handle is dropped.
pub(super) fn spawn_poller(inner: Weak<Inner>, name: FeedName, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let Some(inner) = inner.upgrade() else {
                debug!(feed = %name, "synchronizer dropped, poller exiting");
                break;
            };

            Synchronizer { inner }.spawn_refresh(name);
        }
    })
}
