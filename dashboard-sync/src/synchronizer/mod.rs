//! The [`Synchronizer`]: a registry of feeds mirrored from the backend, plus the single write
//! path for user mutations.
//!
//! Concurrency rules:
//! - The registry lock is never held across an `.await`.
//! - At most one fetch per feed is outstanding; a refresh requested meanwhile is skipped.
//! - A feed's value is only written by its own refresh completion.

use crate::{
    api,
    config::SyncConfig,
    error::{ConfigError, MutationFailure, SyncError, TransportError},
    event::{Notification, SyncEvent},
    feed::{FeedName, FeedState, FeedValue, RefreshOutcome},
    mutation::{Mutation, MutationReceipt},
    render::Render,
    transport::{EndpointFetcher, Fetcher, Transport},
};
use fnv::FnvHashMap;
use futures::future::join_all;
use parking_lot::Mutex;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

mod poll;


struct FeedEntry {
    state: FeedState,
    fetcher: Arc<dyn Fetcher>,
    poller: Option<JoinHandle<()>>,
}

impl FeedEntry {
    fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|poller| !poller.is_finished())
    }
}

struct Inner {
    config: SyncConfig,
    transport: Arc<dyn Transport>,
    renderer: Option<Arc<dyn Render>>,
    feeds: Mutex<FnvHashMap<FeedName, FeedEntry>>,
    events: broadcast::Sender<SyncEvent>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for entry in self.feeds.get_mut().values_mut() {
            if let Some(poller) = entry.poller.take() {
                poller.abort();
            }
        }
    }
}

/// Keeps feed state consistent with the dashboard backend.
///
/// Cheap to clone; every clone drives the same registry.
#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut feeds = self.inner.feeds.lock().keys().copied().collect::<Vec<_>>();
        feeds.sort();
        f.debug_struct("Synchronizer")
            .field("config", &self.inner.config)
            .field("feeds", &feeds)
            .finish_non_exhaustive()
    }
}

/// Clears a feed's in-flight flag when dropped, whichever way the refresh ends.
struct InFlightGuard<'a> {
    inner: &'a Inner,
    name: FeedName,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.inner.feeds.lock().get_mut(&self.name) {
            entry.state.in_flight = false;
        }
    }
}

impl Synchronizer {
    pub fn new(config: SyncConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, transport, None)
    }

    pub fn with_renderer(
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        renderer: Arc<dyn Render>,
    ) -> Self {
        Self::build(config, transport, Some(renderer))
    }

    fn build(
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        renderer: Option<Arc<dyn Render>>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                renderer,
                feeds: Mutex::new(FnvHashMap::default()),
                events,
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Subscribe to feed updates, feed failures and user notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Install a feed with its poll interval and fetcher.
    pub fn register_feed(
        &self,
        name: FeedName,
        interval: Duration,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<(), ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidInterval(name));
        }

        let mut feeds = self.inner.feeds.lock();
        if feeds.contains_key(&name) {
            return Err(ConfigError::DuplicateFeed(name));
        }

        debug!(feed = %name, ?interval, "registered feed");
        feeds.insert(
            name,
            FeedEntry {
                state: FeedState::new(name, interval),
                fetcher,
                poller: None,
            },
        );

        Ok(())
    }

    /// Register every dashboard feed against this synchronizer's transport, using the
    /// configured intervals.
    pub fn register_default_feeds(&self) -> Result<(), ConfigError> {
        for name in FeedName::ALL {
            let fetcher = EndpointFetcher::new(Arc::clone(&self.inner.transport), name.path());
            self.register_feed(name, self.inner.config.interval_for(name), Arc::new(fetcher))?;
        }
        Ok(())
    }

    pub fn feeds(&self) -> Vec<FeedName> {
        let mut feeds = self.inner.feeds.lock().keys().copied().collect::<Vec<_>>();
        feeds.sort();
        feeds
    }

    /// Copy of the feed's current state.
    pub fn snapshot(&self, name: FeedName) -> Option<FeedState> {
        self.inner
            .feeds
            .lock()
            .get(&name)
            .map(|entry| entry.state.clone())
    }

    /// Copy of the feed's last-known value.
    pub fn value(&self, name: FeedName) -> Option<FeedValue> {
        self.inner
            .feeds
            .lock()
            .get(&name)
            .map(|entry| entry.state.value.clone())
    }

    /// Fetch the feed once and apply the result.
    ///
    /// Transport and rejection failures are recorded on the feed, never returned; the only
    /// error is asking for a feed that was never registered.
    pub async fn refresh(&self, name: FeedName) -> Result<RefreshOutcome, ConfigError> {
        let fetcher = {
            let mut feeds = self.inner.feeds.lock();
            let entry = feeds
                .get_mut(&name)
                .ok_or(ConfigError::FeedNotRegistered(name))?;

            if entry.state.in_flight {
                debug!(feed = %name, "refresh skipped, request already in flight");
                return Ok(RefreshOutcome::Skipped);
            }

            entry.state.in_flight = true;
            Arc::clone(&entry.fetcher)
        };
        let _guard = InFlightGuard {
            inner: &self.inner,
            name,
        };

        let result = match self.bounded(fetcher.fetch()).await {
            Ok(body) => decode(name, body),
            Err(error) => Err(SyncError::from(error)),
        };

        Ok(self.apply(name, result))
    }

    /// Refresh every registered feed concurrently, e.g. for the initial page load.
    pub async fn refresh_all(&self) -> Vec<(FeedName, RefreshOutcome)> {
        let refreshes = self.feeds().into_iter().map(|name| async move {
            // Registered feeds cannot be missing.
            let outcome = self.refresh(name).await.unwrap_or(RefreshOutcome::Failed);
            (name, outcome)
        });
        join_all(refreshes).await
    }

    /// One-shot refresh of the settings feed; the settings page loads once rather than polls.
    pub async fn load_settings(&self) -> Result<RefreshOutcome, ConfigError> {
        self.refresh(FeedName::Settings).await
    }

    fn apply(&self, name: FeedName, result: Result<FeedValue, SyncError>) -> RefreshOutcome {
        let (outcome, state) = {
            let mut feeds = self.inner.feeds.lock();
            let Some(entry) = feeds.get_mut(&name) else {
                return RefreshOutcome::Failed;
            };
            (entry.state.complete(result), entry.state.clone())
        };

        match (outcome, state.last_error) {
            (RefreshOutcome::Updated, _) => {
                debug!(feed = %name, "feed updated");
                if let Some(renderer) = &self.inner.renderer {
                    renderer.render(name, &state.value);
                }
                if let Some(time) = state.last_refresh {
                    self.emit(SyncEvent::FeedUpdated { feed: name, time });
                }
            }
            (outcome, Some(error)) => {
                warn!(feed = %name, %outcome, %error, "feed refresh failed");
                self.emit(SyncEvent::FeedFailed { feed: name, error });
            }
            (outcome, None) => {
                warn!(feed = %name, %outcome, "feed refresh failed without a recorded error");
            }
        }

        outcome
    }

    /// Begin periodic refresh of the feed, starting immediately.
    ///
    /// Returns `false` if the feed is already being polled.
    pub fn start_polling(&self, name: FeedName) -> Result<bool, ConfigError> {
        let mut feeds = self.inner.feeds.lock();
        let entry = feeds
            .get_mut(&name)
            .ok_or(ConfigError::FeedNotRegistered(name))?;

        if entry.is_polling() {
            debug!(feed = %name, "already polling");
            return Ok(false);
        }

        info!(feed = %name, interval = ?entry.state.interval, "start polling");
        entry.poller = Some(poll::spawn_poller(
            Arc::downgrade(&self.inner),
            name,
            entry.state.interval,
        ));

        Ok(true)
    }

    /// Cancel the feed's timer. A refresh already in flight still completes and applies.
    ///
    /// Returns `false` if the feed was not being polled.
    pub fn stop_polling(&self, name: FeedName) -> bool {
        let poller = self
            .inner
            .feeds
            .lock()
            .get_mut(&name)
            .and_then(|entry| entry.poller.take());

        match poller {
            Some(poller) => {
                let was_active = !poller.is_finished();
                poller.abort();
                info!(feed = %name, "stop polling");
                was_active
            }
            None => false,
        }
    }

    pub fn is_polling(&self, name: FeedName) -> bool {
        self.inner
            .feeds
            .lock()
            .get(&name)
            .is_some_and(FeedEntry::is_polling)
    }

    /// Start polling every registered dashboard feed. Settings load once and are left alone.
    ///
    /// Returns the feeds whose timer this call started.
    pub fn start_all(&self) -> Vec<FeedName> {
        let registered = self.feeds();
        FeedName::DASHBOARD
            .into_iter()
            .filter(|name| registered.contains(name))
            .filter(|name| matches!(self.start_polling(*name), Ok(true)))
            .collect()
    }

    pub fn stop_all(&self) {
        for name in self.feeds() {
            self.stop_polling(name);
        }
    }

    /// Issue a mutation exactly once.
    ///
    /// On success every dependent feed is refreshed in the background; the receipt is returned
    /// without waiting for those refreshes. On failure no feed is touched.
    pub async fn submit(&self, mutation: Mutation) -> Result<MutationReceipt, MutationFailure> {
        let Mutation {
            action,
            body,
            dependents,
        } = mutation;
        info!(%action, path = action.path(), "submitting");

        let result = match self
            .bounded(self.inner.transport.post_json(action.path(), &body))
            .await
        {
            Ok(reply) => api::check_status(&reply),
            Err(error) => Err(SyncError::from(error)),
        };

        if let Err(error) = result {
            let failure = MutationFailure::new(action, error);
            warn!(%action, error = %failure.error, "mutation failed");
            self.emit(SyncEvent::Notification(Notification::error(
                failure.message.clone(),
            )));
            return Err(failure);
        }

        for feed in &dependents {
            self.spawn_refresh(*feed);
        }

        let message = action.success_message().to_string();
        info!(%action, "mutation accepted");
        self.emit(SyncEvent::Notification(Notification::success(
            message.clone(),
        )));

        Ok(MutationReceipt {
            action,
            message,
            refreshing: dependents,
        })
    }

    /// Fire-and-forget refresh, used for mutation dependents and poll ticks.
    fn spawn_refresh(&self, name: FeedName) -> JoinHandle<()> {
        let synchronizer = self.clone();
        tokio::spawn(async move {
            if let Err(error) = synchronizer.refresh(name).await {
                warn!(feed = %name, %error, "background refresh not possible");
            }
        })
    }

    async fn bounded<Fut>(&self, future: Fut) -> Result<serde_json::Value, TransportError>
    where
        Fut: Future<Output = Result<serde_json::Value, TransportError>>,
    {
        let timeout = self.inner.config.fetch_timeout;
        tokio::time::timeout(timeout, future)
            .await
            .unwrap_or(Err(TransportError::Timeout(timeout)))
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is not an error.
        let _ = self.inner.events.send(event);
    }
}

/// Classify a response body: non-success status and undecodable payloads are rejections.
fn decode(name: FeedName, body: serde_json::Value) -> Result<FeedValue, SyncError> {
    api::check_status(&body)?;
    FeedValue::decode(name, body).map_err(|error| SyncError::RemoteRejected {
        message: Some(format!("malformed {name} payload: {error}")),
    })
}
