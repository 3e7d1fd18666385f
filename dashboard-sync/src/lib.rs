//! # Dashboard-Sync
//! Client-side synchronization layer for a trading dashboard. Mirrors the backend's
//! performance metrics, trading history, trade distribution, open orders and settings into
//! independently polled, typed feeds, and funnels every form submission through one
//! [`Synchronizer::submit`] contract.
//!
//! ## Guarantees
//! * At most one outstanding request per feed; a poll due while one is in flight is skipped.
//! * A rejected or failed response never changes a feed's value.
//! * Polling survives any number of consecutive failures; errors are recorded on the feed.
//! * A successful mutation refreshes its dependent feeds without blocking the caller.
//!
//! ## Example
//! ```rust,no_run
//! use dashboard_sync::{
//!     FeedName, HttpTransport, Mutation, SyncConfig, Synchronizer,
//!     api::types::{OrderType, PlaceOrderRequest, Side},
//! };
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::from_env()?;
//!     let transport = Arc::new(HttpTransport::new(&config)?);
//!     let synchronizer = Synchronizer::new(config, transport);
//!
//!     synchronizer.register_default_feeds()?;
//!     for feed in FeedName::DASHBOARD {
//!         synchronizer.start_polling(feed)?;
//!     }
//!
//!     let order = Mutation::place_order(&PlaceOrderRequest {
//!         symbol: "BTCUSDT".into(),
//!         order_type: OrderType::Market,
//!         side: Side::Buy,
//!         amount: Decimal::new(1, 1),
//!         price: None,
//!     })?;
//!
//!     match synchronizer.submit(order).await {
//!         Ok(receipt) => println!("{}", receipt.message),
//!         Err(failure) => eprintln!("{failure}"),
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Wire contract of the dashboard backend: endpoint paths, status envelope and payloads.
pub mod api;

/// [`SyncConfig`] and its environment loading.
pub mod config;

/// All errors generated in `dashboard-sync`.
pub mod error;

/// Events broadcast to the host UI.
pub mod event;

/// Feed identifiers, values and state.
pub mod feed;

/// One-shot writes and their dependents.
pub mod mutation;

/// Rendering collaborator and chart projections.
pub mod render;

/// The feed registry, polling and mutation submission.
pub mod synchronizer;

/// HTTP access to the backend.
pub mod transport;

// Re-export commonly used types for convenience
pub use config::SyncConfig;
pub use error::{ConfigError, MutationFailure, SyncError, TransportError};
pub use event::{Notification, NotificationLevel, SyncEvent};
pub use feed::{FeedName, FeedState, FeedValue, RefreshOutcome};
pub use mutation::{Mutation, MutationAction, MutationReceipt};
pub use render::{ChartSeries, Render};
pub use synchronizer::Synchronizer;
pub use transport::{EndpointFetcher, Fetcher, HttpTransport, Transport};
