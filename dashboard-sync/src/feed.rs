//! Feeds: named, independently polled units of remote state.

use crate::{
    api::{
        self,
        types::{
            HistoryPoint, OpenOrdersResponse, Order, PerformanceMetrics, Settings,
            TradeDistribution, TradingHistoryResponse,
        },
    },
    error::SyncError,
};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier of a dashboard feed.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum FeedName {
    #[display("performance_metrics")]
    PerformanceMetrics,
    #[display("trading_history")]
    TradingHistory,
    #[display("trade_distribution")]
    TradeDistribution,
    #[display("open_orders")]
    OpenOrders,
    #[display("settings")]
    Settings,
}

impl FeedName {
    pub const ALL: [FeedName; 5] = [
        FeedName::PerformanceMetrics,
        FeedName::TradingHistory,
        FeedName::TradeDistribution,
        FeedName::OpenOrders,
        FeedName::Settings,
    ];

    /// Feeds the analytics and trading pages poll continuously. Settings load once.
    pub const DASHBOARD: [FeedName; 4] = [
        FeedName::PerformanceMetrics,
        FeedName::TradingHistory,
        FeedName::TradeDistribution,
        FeedName::OpenOrders,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            FeedName::PerformanceMetrics => api::PERFORMANCE_METRICS,
            FeedName::TradingHistory => api::TRADING_HISTORY,
            FeedName::TradeDistribution => api::TRADE_DISTRIBUTION,
            FeedName::OpenOrders => api::OPEN_ORDERS,
            FeedName::Settings => api::SETTINGS,
        }
    }
}

/// Last-known value of a feed, shaped per feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "feed", content = "value", rename_all = "snake_case")]
pub enum FeedValue {
    PerformanceMetrics(PerformanceMetrics),
    TradingHistory(Vec<HistoryPoint>),
    TradeDistribution(TradeDistribution),
    OpenOrders(Vec<Order>),
    Settings(Settings),
}

impl FeedValue {
    /// Value a feed holds before its first successful refresh.
    pub fn initial(name: FeedName) -> Self {
        match name {
            FeedName::PerformanceMetrics => FeedValue::PerformanceMetrics(Default::default()),
            FeedName::TradingHistory => FeedValue::TradingHistory(Vec::new()),
            FeedName::TradeDistribution => FeedValue::TradeDistribution(Default::default()),
            FeedName::OpenOrders => FeedValue::OpenOrders(Vec::new()),
            FeedName::Settings => FeedValue::Settings(Default::default()),
        }
    }

    /// Decode a successful response body into the shape of the named feed.
    pub fn decode(name: FeedName, body: serde_json::Value) -> Result<Self, serde_json::Error> {
        let value = match name {
            FeedName::PerformanceMetrics => {
                FeedValue::PerformanceMetrics(serde_json::from_value(body)?)
            }
            FeedName::TradingHistory => FeedValue::TradingHistory(
                serde_json::from_value::<TradingHistoryResponse>(body)?.history,
            ),
            FeedName::TradeDistribution => {
                FeedValue::TradeDistribution(serde_json::from_value(body)?)
            }
            FeedName::OpenOrders => FeedValue::OpenOrders(
                serde_json::from_value::<OpenOrdersResponse>(body)?.orders,
            ),
            FeedName::Settings => FeedValue::Settings(serde_json::from_value(body)?),
        };

        Ok(value)
    }

    pub fn name(&self) -> FeedName {
        match self {
            FeedValue::PerformanceMetrics(_) => FeedName::PerformanceMetrics,
            FeedValue::TradingHistory(_) => FeedName::TradingHistory,
            FeedValue::TradeDistribution(_) => FeedName::TradeDistribution,
            FeedValue::OpenOrders(_) => FeedName::OpenOrders,
            FeedValue::Settings(_) => FeedName::Settings,
        }
    }

    pub fn as_performance_metrics(&self) -> Option<&PerformanceMetrics> {
        match self {
            FeedValue::PerformanceMetrics(metrics) => Some(metrics),
            _ => None,
        }
    }

    pub fn as_trading_history(&self) -> Option<&[HistoryPoint]> {
        match self {
            FeedValue::TradingHistory(history) => Some(history),
            _ => None,
        }
    }

    pub fn as_trade_distribution(&self) -> Option<&TradeDistribution> {
        match self {
            FeedValue::TradeDistribution(distribution) => Some(distribution),
            _ => None,
        }
    }

    pub fn as_open_orders(&self) -> Option<&[Order]> {
        match self {
            FeedValue::OpenOrders(orders) => Some(orders),
            _ => None,
        }
    }

    pub fn as_settings(&self) -> Option<&Settings> {
        match self {
            FeedValue::Settings(settings) => Some(settings),
            _ => None,
        }
    }
}

/// Mirror of one feed's remote state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub name: FeedName,
    pub interval: Duration,
    pub value: FeedValue,
    pub last_refresh: Option<DateTime<Utc>>,
    pub in_flight: bool,
    pub last_error: Option<SyncError>,
}

impl FeedState {
    pub fn new(name: FeedName, interval: Duration) -> Self {
        Self {
            name,
            interval,
            value: FeedValue::initial(name),
            last_refresh: None,
            in_flight: false,
            last_error: None,
        }
    }

    /// Apply a completed refresh. Only a success touches the value.
    ///
    /// The in-flight flag is left to the caller, which releases it once the result is applied.
    pub(crate) fn complete(&mut self, result: Result<FeedValue, SyncError>) -> RefreshOutcome {
        match result {
            Ok(value) => {
                self.value = value;
                self.last_refresh = Some(Utc::now());
                self.last_error = None;
                RefreshOutcome::Updated
            }
            Err(error) => {
                let outcome = if error.is_rejection() {
                    RefreshOutcome::Rejected
                } else {
                    RefreshOutcome::Failed
                };
                self.last_error = Some(error);
                outcome
            }
        }
    }
}

/// How a call to [`Synchronizer::refresh`](crate::Synchronizer::refresh) ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display)]
pub enum RefreshOutcome {
    /// Value and timestamp replaced.
    Updated,
    /// Backend answered with a non-success status or a malformed payload.
    Rejected,
    /// Network, HTTP, body or timeout failure.
    Failed,
    /// A refresh for this feed was already in flight.
    Skipped,
}
