//! One-shot writes against the dashboard backend.
//!
//! Every form on the dashboard funnels through the same contract: serialise the form into a
//! [`Mutation`], POST it once, and on success refresh the feeds that reflect the change.

use crate::{
    api::{
        self,
        types::{ApiSettings, NotificationSettings, PlaceOrderRequest, RiskSettings, TradingSettings},
    },
    error::{SyncError, TransportError},
    feed::FeedName,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The writes the dashboard backend accepts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    #[display("place order")]
    PlaceOrder,
    #[display("save API settings")]
    SaveApiSettings,
    #[display("save trading settings")]
    SaveTradingSettings,
    #[display("save notification settings")]
    SaveNotificationSettings,
    #[display("save risk settings")]
    SaveRiskSettings,
}

impl MutationAction {
    pub fn path(&self) -> &'static str {
        match self {
            MutationAction::PlaceOrder => api::PLACE_ORDER,
            MutationAction::SaveApiSettings => api::SETTINGS_API,
            MutationAction::SaveTradingSettings => api::SETTINGS_TRADING,
            MutationAction::SaveNotificationSettings => api::SETTINGS_NOTIFICATIONS,
            MutationAction::SaveRiskSettings => api::SETTINGS_RISK,
        }
    }

    /// Feeds whose remote state changes when this action succeeds.
    pub fn dependents(&self) -> &'static [FeedName] {
        match self {
            MutationAction::PlaceOrder => &[FeedName::OpenOrders],
            _ => &[FeedName::Settings],
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            MutationAction::PlaceOrder => "Order placed successfully",
            MutationAction::SaveApiSettings => "API settings saved successfully",
            MutationAction::SaveTradingSettings => "Trading settings saved successfully",
            MutationAction::SaveNotificationSettings => "Notification settings saved successfully",
            MutationAction::SaveRiskSettings => "Risk settings saved successfully",
        }
    }

    /// "placing order", "saving risk settings", ...
    pub(crate) fn progressive(&self) -> String {
        let description = self.to_string();
        match description.split_once(' ') {
            Some(("place", rest)) => format!("placing {rest}"),
            Some(("save", rest)) => format!("saving {rest}"),
            _ => description,
        }
    }
}

/// A write request plus the feeds to refresh once the backend accepts it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub action: MutationAction,
    pub body: serde_json::Value,
    pub dependents: Vec<FeedName>,
}

impl Mutation {
    /// Construct a [`Mutation`] with the action's default dependents.
    pub fn new<Body>(action: MutationAction, body: &Body) -> Result<Self, SyncError>
    where
        Body: Serialize,
    {
        let body = serde_json::to_value(body)
            .map_err(|error| TransportError::Encode(error.to_string()))?;

        Ok(Self {
            action,
            body,
            dependents: action.dependents().to_vec(),
        })
    }

    pub fn place_order(request: &PlaceOrderRequest) -> Result<Self, SyncError> {
        Self::new(MutationAction::PlaceOrder, request)
    }

    pub fn save_api_settings(settings: &ApiSettings) -> Result<Self, SyncError> {
        Self::new(MutationAction::SaveApiSettings, settings)
    }

    pub fn save_trading_settings(settings: &TradingSettings) -> Result<Self, SyncError> {
        Self::new(MutationAction::SaveTradingSettings, settings)
    }

    pub fn save_notification_settings(settings: &NotificationSettings) -> Result<Self, SyncError> {
        Self::new(MutationAction::SaveNotificationSettings, settings)
    }

    pub fn save_risk_settings(settings: &RiskSettings) -> Result<Self, SyncError> {
        Self::new(MutationAction::SaveRiskSettings, settings)
    }

    /// Replace the default dependents.
    pub fn with_dependents(mut self, feeds: impl IntoIterator<Item = FeedName>) -> Self {
        self.dependents = feeds.into_iter().collect();
        self
    }
}

/// Result of a [`Mutation`] the backend accepted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MutationReceipt {
    pub action: MutationAction,
    pub message: String,
    /// Dependent feeds whose refresh was dispatched (not necessarily completed).
    pub refreshing: Vec<FeedName>,
}
