pub mod backend;
pub mod gateway;
pub mod session;

pub use gateway::{GatewayCheckout, GatewayOutcome, PaymentGateway, PaymentOrder, PaymentResult};
pub use session::{AuthContext, MemorySessionStore, SessionStore, SessionUser};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error("Session store error: {0}")]
    SessionError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
