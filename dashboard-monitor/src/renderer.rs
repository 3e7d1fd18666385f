use dashboard_sync::{FeedName, FeedValue, Render, api::types::Settings};
use tracing::info;

/// [`Render`] implementation writing each fresh feed value to the log.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Render for LogRenderer {
    fn render(&self, feed: FeedName, value: &FeedValue) {
        match value {
            FeedValue::PerformanceMetrics(metrics) => info!(
                %feed,
                total_return = %percent(metrics.total_return),
                win_rate = %percent(metrics.win_rate),
                avg_trade = %percent(metrics.avg_trade),
                sharpe_ratio = %format!("{:.2}", metrics.sharpe_ratio),
                max_drawdown = %percent(metrics.max_drawdown),
                risk_reward = %format!("{:.2}", metrics.risk_reward),
                "metrics"
            ),
            FeedValue::TradingHistory(_) => {
                if let Some(series) = value.chart_series() {
                    info!(
                        %feed,
                        points = series.len(),
                        labels = ?series.labels,
                        values = ?series.values,
                        "chart"
                    );
                }
            }
            FeedValue::TradeDistribution(distribution) => {
                if let Some(series) = value.chart_series() {
                    info!(
                        %feed,
                        total = distribution.total(),
                        labels = ?series.labels,
                        values = ?series.values,
                        "chart"
                    );
                }
            }
            FeedValue::OpenOrders(orders) if orders.is_empty() => {
                info!(%feed, "no open orders");
            }
            FeedValue::OpenOrders(orders) => {
                for order in orders {
                    info!(
                        %feed,
                        symbol = %order.symbol,
                        side = %order.side,
                        price = %order.price,
                        amount = %order.amount,
                        "open order"
                    );
                }
            }
            FeedValue::Settings(settings) => render_settings(settings),
        }
    }
}

fn render_settings(settings: &Settings) {
    // Form view: backend values with defaults filled in, never the secret itself
    let form = settings.clone().with_form_defaults();
    info!(
        api_key_set = form.api_key.as_deref().is_some_and(|key| !key.is_empty()),
        trading_pair = ?form.trading_pair,
        position_size = ?form.position_size,
        stop_loss = ?form.stop_loss,
        take_profit = ?form.take_profit,
        max_daily_loss = ?form.max_daily_loss,
        max_positions = ?form.max_positions,
        leverage = ?form.leverage,
        "settings"
    );
}

fn percent(value: f64) -> String {
    format!("{value:.2}%")
}
