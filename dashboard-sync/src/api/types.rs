use super::de::{de_f64, de_opt_bool, de_opt_decimal, de_opt_string};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Headline strategy statistics from `/api/performance_metrics`.
///
/// Percent figures are in percent units (`12.5` means 12.5%).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PerformanceMetrics {
    #[serde(deserialize_with = "de_f64")]
    pub total_return: f64,
    #[serde(deserialize_with = "de_f64")]
    pub win_rate: f64,
    #[serde(deserialize_with = "de_f64")]
    pub avg_trade: f64,
    #[serde(deserialize_with = "de_f64")]
    pub sharpe_ratio: f64,
    #[serde(deserialize_with = "de_f64")]
    pub max_drawdown: f64,
    #[serde(deserialize_with = "de_f64")]
    pub risk_reward: f64,
}

/// One point of the portfolio value line chart.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HistoryPoint {
    pub date: String,
    #[serde(deserialize_with = "de_f64")]
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TradingHistoryResponse {
    pub history: Vec<HistoryPoint>,
}

/// Win/loss counts from `/api/trade_distribution`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct TradeDistribution {
    pub winning_trades: u64,
    pub losing_trades: u64,
}

impl TradeDistribution {
    pub fn total(&self) -> u64 {
        self.winning_trades + self.losing_trades
    }
}

/// Order side (Buy or Sell)
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[serde(alias = "buy", alias = "Buy")]
    Buy,
    #[serde(alias = "sell", alias = "Sell")]
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order type. The backend only forwards a price for `"LIMIT"`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[serde(alias = "market", alias = "Market")]
    Market,
    #[serde(alias = "limit", alias = "Limit")]
    Limit,
}

/// A resting order from `/api/open_orders`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub symbol: SmolStr,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenOrdersResponse {
    pub orders: Vec<Order>,
}

/// Body of `/api/place_order`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaceOrderRequest {
    pub symbol: SmolStr,
    #[serde(rename = "orderType")]
    pub order_type: OrderType,
    pub side: Side,
    pub amount: Decimal,
    /// Absent for market orders.
    pub price: Option<Decimal>,
}

/// Everything `/api/settings` reports.
///
/// Fields the backend has never stored come back blank or missing, hence `Option`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "de_opt_string")]
    pub api_key: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub api_secret: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub trading_pair: Option<String>,
    #[serde(deserialize_with = "de_opt_decimal")]
    pub position_size: Option<Decimal>,
    #[serde(deserialize_with = "de_opt_decimal")]
    pub stop_loss: Option<Decimal>,
    #[serde(deserialize_with = "de_opt_decimal")]
    pub take_profit: Option<Decimal>,
    #[serde(deserialize_with = "de_opt_bool")]
    pub email_notifications: Option<bool>,
    #[serde(deserialize_with = "de_opt_bool")]
    pub trade_notifications: Option<bool>,
    #[serde(deserialize_with = "de_opt_bool")]
    pub error_notifications: Option<bool>,
    #[serde(deserialize_with = "de_opt_decimal")]
    pub max_daily_loss: Option<Decimal>,
    #[serde(deserialize_with = "de_opt_decimal")]
    pub max_positions: Option<Decimal>,
    #[serde(deserialize_with = "de_opt_decimal")]
    pub leverage: Option<Decimal>,
}

/// Values the settings forms show for fields the backend has not stored.
pub mod form_defaults {
    use rust_decimal::Decimal;

    pub const TRADING_PAIR: &str = "BTCUSDT";
    pub const POSITION_SIZE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
    pub const STOP_LOSS: Decimal = Decimal::from_parts(2, 0, 0, false, 0);
    pub const TAKE_PROFIT: Decimal = Decimal::from_parts(4, 0, 0, false, 0);
    pub const MAX_DAILY_LOSS: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
    pub const MAX_POSITIONS: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
    pub const LEVERAGE: Decimal = Decimal::ONE;
    pub const NOTIFICATIONS: bool = false;
}

impl Settings {
    /// Fill every absent field with the settings form's default. Credentials stay absent.
    ///
    /// These are presentation defaults; the synchronizer never applies them to feed state.
    pub fn with_form_defaults(self) -> Self {
        Self {
            api_key: self.api_key,
            api_secret: self.api_secret,
            trading_pair: self
                .trading_pair
                .or_else(|| Some(form_defaults::TRADING_PAIR.to_string())),
            position_size: self.position_size.or(Some(form_defaults::POSITION_SIZE)),
            stop_loss: self.stop_loss.or(Some(form_defaults::STOP_LOSS)),
            take_profit: self.take_profit.or(Some(form_defaults::TAKE_PROFIT)),
            email_notifications: self
                .email_notifications
                .or(Some(form_defaults::NOTIFICATIONS)),
            trade_notifications: self
                .trade_notifications
                .or(Some(form_defaults::NOTIFICATIONS)),
            error_notifications: self
                .error_notifications
                .or(Some(form_defaults::NOTIFICATIONS)),
            max_daily_loss: self.max_daily_loss.or(Some(form_defaults::MAX_DAILY_LOSS)),
            max_positions: self.max_positions.or(Some(form_defaults::MAX_POSITIONS)),
            leverage: self.leverage.or(Some(form_defaults::LEVERAGE)),
        }
    }
}

/// Body of `/api/settings/api`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct ApiSettings {
    pub api_key: String,
    pub api_secret: String,
}

/// Body of `/api/settings/trading`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct TradingSettings {
    pub trading_pair: String,
    pub position_size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// Body of `/api/settings/notifications`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub trade_notifications: bool,
    pub error_notifications: bool,
}

/// Body of `/api/settings/risk`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct RiskSettings {
    pub max_daily_loss: Decimal,
    pub max_positions: u32,
    pub leverage: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_de_order_with_string_numbers() {
        let input = json!({"symbol": "BTCUSDT", "side": "BUY", "price": "30000", "amount": "0.1"});

        let actual = serde_json::from_value::<Order>(input).unwrap();

        let expected = Order {
            symbol: SmolStr::new("BTCUSDT"),
            side: Side::Buy,
            price: dec!(30000),
            amount: dec!(0.1),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_trade_distribution_total() {
        let distribution = serde_json::from_value::<TradeDistribution>(
            json!({"status": "success", "winning_trades": 6, "losing_trades": 4}),
        )
        .unwrap();

        assert_eq!(distribution.total(), 10);
    }

    #[test]
    fn test_de_side_aliases() {
        for (input, expected) in [
            ("\"BUY\"", Side::Buy),
            ("\"buy\"", Side::Buy),
            ("\"Sell\"", Side::Sell),
        ] {
            assert_eq!(serde_json::from_str::<Side>(input).unwrap(), expected, "{input}");
        }
        assert!(serde_json::from_str::<Side>("\"HOLD\"").is_err());
    }

    #[test]
    fn test_order_type_wire_format() {
        struct TestCase {
            input: OrderType,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0
                input: OrderType::Market,
                expected: "MARKET",
            },
            TestCase {
                // TC1
                input: OrderType::Limit,
                expected: "LIMIT",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = serde_json::to_value(test.input).unwrap();
            assert_eq!(actual, json!(test.expected), "TC{} failed", index);

            let lowercase = json!(test.expected.to_ascii_lowercase());
            let parsed = serde_json::from_value::<OrderType>(lowercase).unwrap();
            assert_eq!(parsed, test.input, "TC{} failed", index);
        }
    }

    #[test]
    fn test_de_performance_metrics_ignores_status() {
        let input = json!({
            "status": "success",
            "total_return": 12.5,
            "win_rate": "61.0",
            "avg_trade": 0.4,
            "sharpe_ratio": 1.8,
            "max_drawdown": -7.25,
            "risk_reward": 2
        });

        let actual = serde_json::from_value::<PerformanceMetrics>(input).unwrap();

        assert_eq!(actual.total_return, 12.5);
        assert_eq!(actual.win_rate, 61.0);
        assert_eq!(actual.max_drawdown, -7.25);
        assert_eq!(actual.risk_reward, 2.0);
    }

    #[test]
    fn test_de_settings_from_partial_form_values() {
        let input = json!({
            "status": "success",
            "api_key": "",
            "trading_pair": "ETHUSDT",
            "position_size": "25",
            "stop_loss": null,
            "email_notifications": true,
            "trade_notifications": "",
            "max_positions": 4
        });

        let actual = serde_json::from_value::<Settings>(input).unwrap();

        assert_eq!(actual.api_key, None);
        assert_eq!(actual.trading_pair.as_deref(), Some("ETHUSDT"));
        assert_eq!(actual.position_size, Some(dec!(25)));
        assert_eq!(actual.stop_loss, None);
        assert_eq!(actual.email_notifications, Some(true));
        assert_eq!(actual.trade_notifications, None);
        assert_eq!(actual.max_positions, Some(dec!(4)));
    }

    #[test]
    fn test_settings_with_form_defaults() {
        let settings = Settings {
            trading_pair: Some("ETHUSDT".to_string()),
            stop_loss: Some(dec!(1.5)),
            ..Default::default()
        }
        .with_form_defaults();

        assert_eq!(settings.api_key, None);
        assert_eq!(settings.trading_pair.as_deref(), Some("ETHUSDT"));
        assert_eq!(settings.position_size, Some(dec!(10)));
        assert_eq!(settings.stop_loss, Some(dec!(1.5)));
        assert_eq!(settings.take_profit, Some(dec!(4)));
        assert_eq!(settings.email_notifications, Some(false));
        assert_eq!(settings.max_daily_loss, Some(dec!(5)));
        assert_eq!(settings.max_positions, Some(dec!(3)));
        assert_eq!(settings.leverage, Some(dec!(1)));
    }

    #[test]
    fn test_place_order_market_has_null_price() {
        let request = PlaceOrderRequest {
            symbol: SmolStr::new("ETHUSDT"),
            order_type: OrderType::Market,
            side: Side::Sell,
            amount: dec!(2),
            price: None,
        };

        let actual = serde_json::to_value(&request).unwrap();

        assert_eq!(
            actual,
            json!({"symbol": "ETHUSDT", "orderType": "MARKET", "side": "SELL", "amount": "2", "price": null})
        );
    }
}
