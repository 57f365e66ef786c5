pub mod controller;
pub mod models;

pub use controller::{CheckoutConfig, CheckoutController, SandboxGateway};
pub use models::{
    CheckoutAttempt, CheckoutError, CheckoutErrorKind, CheckoutOutcome, CheckoutState,
};
