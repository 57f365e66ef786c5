use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::SessionUser;

/// Body of the order-creation call. `amount` is in the smallest currency
/// unit (paise for INR).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of the verification call: the gateway callback triple plus the
/// buyer/item pair, exactly as the backend expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub user_id: i64,
    pub course_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Order creation and payment verification against the storefront backend.
/// The backend is a black box; these are the response contracts the
/// controller depends on.
#[async_trait]
pub trait PaymentsBackend: Send + Sync {
    async fn create_order(
        &self,
        req: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, Box<dyn std::error::Error + Send + Sync>>;

    async fn verify_payment(
        &self,
        req: &VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, Box<dyn std::error::Error + Send + Sync>>;
}

/// Login and signup against the identity service.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn login(
        &self,
        req: &LoginRequest,
    ) -> Result<AuthResponse, Box<dyn std::error::Error + Send + Sync>>;

    async fn register(
        &self,
        req: &RegisterRequest,
    ) -> Result<AuthResponse, Box<dyn std::error::Error + Send + Sync>>;
}
