use dashboard_sync::{
    ConfigError, FeedName, HttpTransport, MutationFailure, NotificationLevel, SyncConfig,
    SyncError, SyncEvent, Synchronizer,
    api::types::{OrderType, PlaceOrderRequest, Side},
    mutation::Mutation,
};
use rust_decimal::Decimal;
use std::{process::ExitCode, str::FromStr, sync::Arc};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

mod renderer;

use renderer::LogRenderer;

const USAGE: &str = "usage: dashboard-monitor [order <symbol> <buy|sell> <market|limit> <amount> [price]]";

#[derive(Debug, Error)]
enum MonitorError {
    #[error("{0}\n{usage}", usage = USAGE)]
    Args(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Mutation(#[from] MutationFailure),

    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// Poll every dashboard feed until Ctrl-C.
    Monitor,
    /// Submit one order, then wait for the open orders refresh it triggers.
    PlaceOrder(PlaceOrderRequest),
}

impl Command {
    fn parse<Args>(args: Args) -> Result<Self, MonitorError>
    where
        Args: IntoIterator<Item = String>,
    {
        let args = args.into_iter().collect::<Vec<_>>();
        match args.split_first() {
            None => Ok(Command::Monitor),
            Some((command, rest)) if command == "order" => parse_order(rest).map(Command::PlaceOrder),
            Some((command, _)) => Err(MonitorError::Args(format!("unknown command: {command}"))),
        }
    }
}

fn parse_order(args: &[String]) -> Result<PlaceOrderRequest, MonitorError> {
    let [symbol, side, order_type, amount, rest @ ..] = args else {
        return Err(MonitorError::Args("order needs symbol, side, type and amount".to_string()));
    };

    let side = match side.to_ascii_lowercase().as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        other => return Err(MonitorError::Args(format!("invalid side: {other}"))),
    };

    let order_type = match order_type.to_ascii_lowercase().as_str() {
        "market" => OrderType::Market,
        "limit" => OrderType::Limit,
        other => return Err(MonitorError::Args(format!("invalid order type: {other}"))),
    };

    let amount = parse_positive("amount", amount)?;

    let price = match (order_type, rest) {
        (OrderType::Limit, [price]) => Some(parse_positive("price", price)?),
        (OrderType::Limit, []) => {
            return Err(MonitorError::Args("limit orders need a price".to_string()));
        }
        (OrderType::Market, []) => None,
        _ => return Err(MonitorError::Args("unexpected trailing arguments".to_string())),
    };

    Ok(PlaceOrderRequest {
        symbol: symbol.to_ascii_uppercase().into(),
        order_type,
        side,
        amount,
        price,
    })
}

fn parse_positive(field: &str, input: &str) -> Result<Decimal, MonitorError> {
    match Decimal::from_str(input) {
        Ok(value) if value.is_sign_positive() && !value.is_zero() => Ok(value),
        _ => Err(MonitorError::Args(format!("invalid {field}: {input}"))),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise logging
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "dashboard-monitor failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), MonitorError> {
    let command = Command::parse(std::env::args().skip(1))?;

    let config = SyncConfig::from_env()?;
    let transport = HttpTransport::new(&config)?;
    info!(base_url = %transport.base_url(), "connecting to dashboard backend");

    let synchronizer =
        Synchronizer::with_renderer(config, Arc::new(transport), Arc::new(LogRenderer));
    synchronizer.register_default_feeds()?;

    match command {
        Command::Monitor => monitor(synchronizer).await,
        Command::PlaceOrder(request) => place_order(synchronizer, request).await,
    }
}

async fn monitor(synchronizer: Synchronizer) -> Result<(), MonitorError> {
    let mut events = synchronizer.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    synchronizer.load_settings().await?;
    let polling = synchronizer.start_all();

    info!(?polling, "monitoring dashboard feeds, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.map_err(MonitorError::Signal)?;

    info!("shutting down");
    synchronizer.stop_all();
    event_log.abort();

    Ok(())
}

async fn place_order(
    synchronizer: Synchronizer,
    request: PlaceOrderRequest,
) -> Result<(), MonitorError> {
    let mut events = synchronizer.subscribe();

    let receipt = synchronizer.submit(Mutation::place_order(&request)?).await?;
    info!(message = %receipt.message, refreshing = ?receipt.refreshing, "order submitted");

    let wait = synchronizer.config().fetch_timeout * 2;
    let refreshed = tokio::time::timeout(wait, async {
        loop {
            match events.recv().await {
                Ok(SyncEvent::FeedUpdated {
                    feed: FeedName::OpenOrders,
                    ..
                })
                | Ok(SyncEvent::FeedFailed {
                    feed: FeedName::OpenOrders,
                    ..
                }) => break true,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break false,
            }
        }
    })
    .await;

    if !matches!(refreshed, Ok(true)) {
        warn!(?wait, "open orders not refreshed after submission");
    }

    Ok(())
}

fn log_event(event: &SyncEvent) {
    match event {
        SyncEvent::FeedUpdated { feed, time } => debug!(%feed, %time, "feed updated"),
        SyncEvent::FeedFailed { feed, error } => warn!(%feed, %error, "feed refresh failed"),
        SyncEvent::Notification(notification) => match notification.level {
            NotificationLevel::Success => info!(message = %notification.message, "notification"),
            NotificationLevel::Error => error!(message = %notification.message, "notification"),
        },
    }

    if let Ok(json) = serde_json::to_string(event) {
        debug!(event = %json, "sync event");
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(input: &str) -> Vec<String> {
        input.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_command() {
        struct TestCase {
            input: &'static str,
            expected: Option<Command>,
        }

        let tests = vec![
            TestCase {
                // TC0: no arguments monitors
                input: "",
                expected: Some(Command::Monitor),
            },
            TestCase {
                // TC1: market order
                input: "order btcusdt buy market 0.1",
                expected: Some(Command::PlaceOrder(PlaceOrderRequest {
                    symbol: "BTCUSDT".into(),
                    order_type: OrderType::Market,
                    side: Side::Buy,
                    amount: dec!(0.1),
                    price: None,
                })),
            },
            TestCase {
                // TC2: limit order with price
                input: "order ETHUSDT SELL limit 2 3500.5",
                expected: Some(Command::PlaceOrder(PlaceOrderRequest {
                    symbol: "ETHUSDT".into(),
                    order_type: OrderType::Limit,
                    side: Side::Sell,
                    amount: dec!(2),
                    price: Some(dec!(3500.5)),
                })),
            },
            TestCase {
                // TC3: limit order without price
                input: "order BTCUSDT buy limit 0.1",
                expected: None,
            },
            TestCase {
                // TC4: market order with price
                input: "order BTCUSDT buy market 0.1 30000",
                expected: None,
            },
            TestCase {
                // TC5: zero amount
                input: "order BTCUSDT buy market 0",
                expected: None,
            },
            TestCase {
                // TC6: unknown side
                input: "order BTCUSDT hold market 1",
                expected: None,
            },
            TestCase {
                // TC7: missing fields
                input: "order BTCUSDT buy",
                expected: None,
            },
            TestCase {
                // TC8: unknown command
                input: "cancel BTCUSDT",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = Command::parse(args(test.input));
            match (actual, test.expected) {
                (Ok(actual), Some(expected)) => assert_eq!(actual, expected, "TC{} failed", index),
                (Err(MonitorError::Args(_)), None) => {
                    // Test passed
                }
                (actual, expected) => {
                    panic!("TC{index} failed because actual != expected. \nActual: {actual:?}\nExpected: {expected:?}\n");
                }
            }
        }
    }
}
