use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A server-issued, single-use charge intent. Ephemeral: lives only for the
/// duration of one checkout attempt and is never persisted client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// The gateway's success-callback payload. Forwarded verbatim to the backend
/// for verification; never trusted client-side as proof of payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentResult {
    #[serde(rename = "razorpay_order_id")]
    pub order_id: String,
    #[serde(rename = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(rename = "razorpay_signature")]
    pub signature: String,
}

/// Everything the hosted widget needs to present one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCheckout {
    pub key: String,
    pub amount_minor: i64,
    pub currency: String,
    /// Merchant display name shown in the widget header.
    pub name: String,
    /// Item title shown under the merchant name.
    pub description: String,
    pub order_id: String,
    pub prefill_name: Option<String>,
    pub theme_color: Option<String>,
}

/// How the widget hands control back: the success callback or the dismiss hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Completed(PaymentResult),
    Dismissed,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// True once the hosted widget script is loaded and can be opened.
    fn is_ready(&self) -> bool;

    /// Open the hosted widget and suspend until the buyer completes or
    /// dismisses it. Opened at most once per checkout attempt; the widget's
    /// internals are opaque and only these two hooks yield control back.
    async fn open(
        &self,
        checkout: &GatewayCheckout,
    ) -> Result<GatewayOutcome, Box<dyn std::error::Error + Send + Sync>>;
}
