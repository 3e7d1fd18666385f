//! Wire contract of the dashboard backend.
//!
//! Every response is a JSON object carrying a `status` field. Only the literal `"success"`
//! counts as success; anything else, including a missing status, is a rejection.

use crate::error::SyncError;
use serde_json::Value;

/// Lenient deserialisers for form-originated values.
pub mod de;

/// Request and response payloads.
pub mod types;

pub const PERFORMANCE_METRICS: &str = "/api/performance_metrics";
pub const TRADING_HISTORY: &str = "/api/trading_history";
pub const TRADE_DISTRIBUTION: &str = "/api/trade_distribution";
pub const OPEN_ORDERS: &str = "/api/open_orders";
pub const PLACE_ORDER: &str = "/api/place_order";
pub const SETTINGS: &str = "/api/settings";
pub const SETTINGS_API: &str = "/api/settings/api";
pub const SETTINGS_TRADING: &str = "/api/settings/trading";
pub const SETTINGS_NOTIFICATIONS: &str = "/api/settings/notifications";
pub const SETTINGS_RISK: &str = "/api/settings/risk";

pub const STATUS_SUCCESS: &str = "success";

/// Check the response envelope, mapping anything but `status: "success"` to
/// [`SyncError::RemoteRejected`].
pub fn check_status(body: &Value) -> Result<(), SyncError> {
    match body.get("status").and_then(Value::as_str) {
        Some(STATUS_SUCCESS) => Ok(()),
        _ => Err(SyncError::RemoteRejected {
            message: server_message(body),
        }),
    }
}

/// Extract the human readable message a response carries.
///
/// The backend uses `message` on envelope rejections and `error` on early-exit error responses.
pub fn server_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .into_iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_status() {
        struct TestCase {
            input: Value,
            expected: Result<(), SyncError>,
        }

        let tests = vec![
            TestCase {
                // TC0: success
                input: json!({"status": "success", "orders": []}),
                expected: Ok(()),
            },
            TestCase {
                // TC1: explicit error with message
                input: json!({"status": "error", "message": "insufficient balance"}),
                expected: Err(SyncError::RemoteRejected {
                    message: Some("insufficient balance".to_string()),
                }),
            },
            TestCase {
                // TC2: missing status
                input: json!({"orders": []}),
                expected: Err(SyncError::RemoteRejected { message: None }),
            },
            TestCase {
                // TC3: status of the wrong type
                input: json!({"status": true}),
                expected: Err(SyncError::RemoteRejected { message: None }),
            },
            TestCase {
                // TC4: status is case sensitive
                input: json!({"status": "SUCCESS"}),
                expected: Err(SyncError::RemoteRejected { message: None }),
            },
            TestCase {
                // TC5: not an object at all
                input: json!([1, 2, 3]),
                expected: Err(SyncError::RemoteRejected { message: None }),
            },
            TestCase {
                // TC6: early-exit error shape
                input: json!({"error": "Bot not initialized"}),
                expected: Err(SyncError::RemoteRejected {
                    message: Some("Bot not initialized".to_string()),
                }),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = check_status(&test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_server_message_skips_blank() {
        let body = json!({"status": "error", "message": "  ", "error": "rate limited"});
        assert_eq!(server_message(&body).as_deref(), Some("rate limited"));
    }
}
