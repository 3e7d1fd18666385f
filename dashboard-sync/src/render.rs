//! Presentation seam. The synchronizer pushes every fresh value through [`Render`]; widgets
//! consume the projections below.

use crate::{
    api::types::{HistoryPoint, TradeDistribution},
    feed::{FeedName, FeedValue},
};

/// Rendering collaborator injected into the [`Synchronizer`](crate::Synchronizer).
///
/// Called once per successful refresh, outside any internal lock. Implementations must not
/// block.
pub trait Render: Send + Sync {
    fn render(&self, feed: FeedName, value: &FeedValue);
}

/// `(labels, values)` pair a chart widget draws.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<&[HistoryPoint]> for ChartSeries {
    fn from(history: &[HistoryPoint]) -> Self {
        let (labels, values) = history
            .iter()
            .map(|point| (point.date.clone(), point.value))
            .unzip();
        Self { labels, values }
    }
}

impl From<&TradeDistribution> for ChartSeries {
    fn from(distribution: &TradeDistribution) -> Self {
        Self {
            labels: vec!["Winning Trades".to_string(), "Losing Trades".to_string()],
            values: vec![
                distribution.winning_trades as f64,
                distribution.losing_trades as f64,
            ],
        }
    }
}

impl FeedValue {
    /// Chart projection of the value, for feeds drawn as charts.
    pub fn chart_series(&self) -> Option<ChartSeries> {
        match self {
            FeedValue::TradingHistory(history) => Some(ChartSeries::from(history.as_slice())),
            FeedValue::TradeDistribution(distribution) => Some(ChartSeries::from(distribution)),
            _ => None,
        }
    }
}
