use chrono::{DateTime, Utc};
use prepkart_core::gateway::PaymentOrder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phases of a single checkout attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutState {
    Idle,
    CreatingOrder,
    AwaitingGateway,
    VerifyingPayment,
    Succeeded,
    Failed,
    Cancelled,
}

impl CheckoutState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Succeeded | CheckoutState::Failed | CheckoutState::Cancelled
        )
    }

    /// The legal edges of the attempt lifecycle. Every error path lands in
    /// Failed; only an explicit widget dismiss lands in Cancelled.
    pub fn can_transition(&self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (*self, next),
            (Idle, CreatingOrder)
                | (Idle, Failed)
                | (CreatingOrder, AwaitingGateway)
                | (CreatingOrder, Failed)
                | (AwaitingGateway, VerifyingPayment)
                | (AwaitingGateway, Cancelled)
                | (AwaitingGateway, Failed)
                | (VerifyingPayment, Succeeded)
                | (VerifyingPayment, Failed)
        )
    }
}

/// One purchase attempt for one item by one buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutAttempt {
    pub id: Uuid,
    pub item_id: i64,
    pub buyer_id: Option<i64>,
    pub state: CheckoutState,
    pub order: Option<PaymentOrder>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutAttempt {
    pub fn new(item_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            item_id,
            buyer_id: None,
            state: CheckoutState::Idle,
            order: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to the next phase, rejecting edges outside the lifecycle.
    pub fn transition(&mut self, next: CheckoutState) -> Result<(), CheckoutError> {
        if !self.state.can_transition(next) {
            return Err(CheckoutError::InvalidTransition {
                from: format!("{:?}", self.state),
                to: format!("{:?}", next),
            });
        }
        tracing::debug!(attempt = %self.id, from = ?self.state, to = ?next, "checkout transition");
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Display strings on the message-carrying variants are final: the backend
/// message when one was available, the generic fallback otherwise.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Please log in to continue")]
    NotAuthenticated,

    #[error("Another purchase is already in progress")]
    AttemptInProgress,

    #[error("{0}")]
    OrderCreationFailed(String),

    #[error("{0}")]
    GatewayUnavailable(String),

    #[error("Timed out waiting for the payment gateway")]
    GatewayTimedOut,

    #[error("Payment cancelled")]
    UserCancelled,

    #[error("{0}")]
    VerificationFailed(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("{0}")]
    Unexpected(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutErrorKind {
    NotAuthenticated,
    AttemptInProgress,
    OrderCreationFailed,
    GatewayUnavailable,
    GatewayTimedOut,
    UserCancelled,
    VerificationFailed,
    Unexpected,
}

impl CheckoutError {
    pub fn kind(&self) -> CheckoutErrorKind {
        match self {
            CheckoutError::NotAuthenticated => CheckoutErrorKind::NotAuthenticated,
            CheckoutError::AttemptInProgress => CheckoutErrorKind::AttemptInProgress,
            CheckoutError::OrderCreationFailed(_) => CheckoutErrorKind::OrderCreationFailed,
            CheckoutError::GatewayUnavailable(_) => CheckoutErrorKind::GatewayUnavailable,
            CheckoutError::GatewayTimedOut => CheckoutErrorKind::GatewayTimedOut,
            CheckoutError::UserCancelled => CheckoutErrorKind::UserCancelled,
            CheckoutError::VerificationFailed(_) => CheckoutErrorKind::VerificationFailed,
            CheckoutError::InvalidTransition { .. } | CheckoutError::Unexpected(_) => {
                CheckoutErrorKind::Unexpected
            }
        }
    }
}

/// Terminal result of a checkout attempt, surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Success { message: Option<String> },
    Failed { kind: CheckoutErrorKind, message: String },
    Cancelled { message: Option<String> },
}

impl CheckoutOutcome {
    pub fn from_error(err: CheckoutError) -> Self {
        match err {
            CheckoutError::UserCancelled => CheckoutOutcome::Cancelled { message: None },
            other => CheckoutOutcome::Failed {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutOutcome::Success { .. })
    }
}
