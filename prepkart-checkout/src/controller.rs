use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prepkart_catalog::entitlements::Entitlements;
use prepkart_catalog::item::PurchasableItem;
use prepkart_core::backend::{CreateOrderRequest, PaymentsBackend, VerifyPaymentRequest};
use prepkart_core::gateway::{
    GatewayCheckout, GatewayOutcome, PaymentGateway, PaymentOrder, PaymentResult,
};
use prepkart_core::session::{AuthContext, SessionUser};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{CheckoutAttempt, CheckoutError, CheckoutOutcome, CheckoutState};

const FALLBACK_ORDER_FAILED: &str = "Could not create a payment order. Please try again.";
const FALLBACK_GATEWAY_DOWN: &str = "The payment service is currently unavailable.";
const FALLBACK_VERIFY_FAILED: &str =
    "We could not verify your payment. If you were charged, please contact support.";

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Publishable gateway key handed to the widget.
    pub gateway_key: String,
    /// Merchant display name shown in the widget header.
    pub merchant_name: String,
    pub currency: String,
    pub theme_color: Option<String>,
    /// Upper bound on the gateway suspension. The hosted widget has no
    /// timeout of its own; an abandoned widget must not pin the attempt
    /// lock forever.
    pub gateway_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            gateway_key: String::new(),
            merchant_name: "Prepkart".to_string(),
            currency: "INR".to_string(),
            theme_color: None,
            gateway_timeout: Duration::from_secs(600),
        }
    }
}

/// Drives a single purchase attempt for one item from "Buy" to a terminal
/// outcome: order creation, the hosted widget, server-side verification and
/// the entitlement update. One controller instance serves one browser-tab
/// equivalent; the attempt lock keeps a double-tap from minting two orders.
pub struct CheckoutController {
    backend: Arc<dyn PaymentsBackend>,
    gateway: Arc<dyn PaymentGateway>,
    auth: Arc<AuthContext>,
    entitlements: Arc<Entitlements>,
    config: CheckoutConfig,
    attempt_lock: Mutex<()>,
}

impl CheckoutController {
    pub fn new(
        backend: Arc<dyn PaymentsBackend>,
        gateway: Arc<dyn PaymentGateway>,
        auth: Arc<AuthContext>,
        entitlements: Arc<Entitlements>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            backend,
            gateway,
            auth,
            entitlements,
            config,
            attempt_lock: Mutex::new(()),
        }
    }

    /// Run one purchase attempt to completion. Every failure is converted
    /// into a terminal, re-triable outcome here; nothing propagates to the
    /// caller as an error or a panic.
    pub async fn buy(&self, item: &PurchasableItem) -> CheckoutOutcome {
        // The guard's lifetime is the attempt: it drops on every return
        // path below, so no terminal state can leave the lock held.
        let guard = match self.attempt_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(item_id = item.id, "buy ignored, attempt already in progress");
                return CheckoutOutcome::from_error(CheckoutError::AttemptInProgress);
            }
        };

        let mut attempt = CheckoutAttempt::new(item.id);
        let outcome = match self.drive(&mut attempt, item).await {
            Ok(()) => CheckoutOutcome::Success { message: None },
            Err(err) => {
                let terminal = match err {
                    CheckoutError::UserCancelled => CheckoutState::Cancelled,
                    _ => CheckoutState::Failed,
                };
                if let Err(bad) = attempt.transition(terminal) {
                    tracing::debug!(attempt = %attempt.id, error = %bad, "attempt already terminal");
                }
                CheckoutOutcome::from_error(err)
            }
        };

        tracing::info!(
            attempt = %attempt.id,
            item_id = item.id,
            state = ?attempt.state,
            "checkout attempt finished"
        );
        drop(guard);
        outcome
    }

    async fn drive(
        &self,
        attempt: &mut CheckoutAttempt,
        item: &PurchasableItem,
    ) -> Result<(), CheckoutError> {
        // A session user without a positive id (e.g. a stale stored record)
        // never reaches order creation.
        let buyer = self
            .auth
            .current()
            .await
            .filter(|user| user.id > 0)
            .ok_or(CheckoutError::NotAuthenticated)?;
        attempt.buyer_id = Some(buyer.id);

        if !self.gateway.is_ready() {
            return Err(CheckoutError::GatewayUnavailable(
                FALLBACK_GATEWAY_DOWN.to_string(),
            ));
        }

        let amount = item
            .price_minor_units()
            .map_err(|e| CheckoutError::Unexpected(e.to_string()))?;

        attempt.transition(CheckoutState::CreatingOrder)?;
        let order = self.create_order(amount).await?;
        attempt.order = Some(order.clone());

        attempt.transition(CheckoutState::AwaitingGateway)?;
        let result = self.open_gateway(&order, item, &buyer).await?;

        attempt.transition(CheckoutState::VerifyingPayment)?;
        self.verify_payment(&result, &buyer, item).await?;
        attempt.transition(CheckoutState::Succeeded)?;

        // Unlock access in place so listings reflect the purchase without
        // a reload.
        self.entitlements.mark_paid(item.id).await;

        Ok(())
    }

    async fn create_order(&self, amount: i64) -> Result<PaymentOrder, CheckoutError> {
        let resp = self
            .backend
            .create_order(&CreateOrderRequest { amount })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "order creation request failed");
                CheckoutError::OrderCreationFailed(FALLBACK_ORDER_FAILED.to_string())
            })?;

        if !resp.success {
            return Err(CheckoutError::OrderCreationFailed(
                resp.message
                    .unwrap_or_else(|| FALLBACK_ORDER_FAILED.to_string()),
            ));
        }

        let order_id = resp
            .order_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CheckoutError::OrderCreationFailed(FALLBACK_ORDER_FAILED.to_string()))?;

        Ok(PaymentOrder {
            order_id,
            // The widget charges what the backend minted, not what we asked for.
            amount_minor: resp.amount.unwrap_or(amount),
            currency: self.config.currency.clone(),
        })
    }

    async fn open_gateway(
        &self,
        order: &PaymentOrder,
        item: &PurchasableItem,
        buyer: &SessionUser,
    ) -> Result<PaymentResult, CheckoutError> {
        let checkout = GatewayCheckout {
            key: self.config.gateway_key.clone(),
            amount_minor: order.amount_minor,
            currency: order.currency.clone(),
            name: self.config.merchant_name.clone(),
            description: item.title.clone(),
            order_id: order.order_id.clone(),
            prefill_name: Some(buyer.name.clone()),
            theme_color: self.config.theme_color.clone(),
        };

        match tokio::time::timeout(self.config.gateway_timeout, self.gateway.open(&checkout)).await
        {
            Err(_elapsed) => Err(CheckoutError::GatewayTimedOut),
            Ok(Err(e)) => {
                tracing::error!(error = %e, order_id = %order.order_id, "gateway failed to open");
                Err(CheckoutError::GatewayUnavailable(
                    FALLBACK_GATEWAY_DOWN.to_string(),
                ))
            }
            Ok(Ok(GatewayOutcome::Dismissed)) => Err(CheckoutError::UserCancelled),
            Ok(Ok(GatewayOutcome::Completed(result))) => Ok(result),
        }
    }

    async fn verify_payment(
        &self,
        result: &PaymentResult,
        buyer: &SessionUser,
        item: &PurchasableItem,
    ) -> Result<(), CheckoutError> {
        let req = VerifyPaymentRequest {
            razorpay_order_id: result.order_id.clone(),
            razorpay_payment_id: result.payment_id.clone(),
            razorpay_signature: result.signature.clone(),
            user_id: buyer.id,
            course_id: item.id,
        };

        let resp = self.backend.verify_payment(&req).await.map_err(|e| {
            tracing::error!(error = %e, order_id = %result.order_id, "verification request failed");
            CheckoutError::VerificationFailed(FALLBACK_VERIFY_FAILED.to_string())
        })?;

        // A declined verification is authoritative; the gateway callback
        // alone is never proof of payment.
        if !resp.success {
            return Err(CheckoutError::VerificationFailed(
                resp.message
                    .unwrap_or_else(|| FALLBACK_VERIFY_FAILED.to_string()),
            ));
        }

        Ok(())
    }
}

/// Stand-in gateway for local development: approves every checkout without
/// opening a real widget, synthesizing payment ids the way the hosted
/// gateway would.
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    fn is_ready(&self) -> bool {
        true
    }

    async fn open(
        &self,
        checkout: &GatewayCheckout,
    ) -> Result<GatewayOutcome, Box<dyn std::error::Error + Send + Sync>> {
        Ok(GatewayOutcome::Completed(PaymentResult {
            order_id: checkout.order_id.clone(),
            payment_id: format!("pay_sandbox_{}", Uuid::new_v4().simple()),
            signature: "sandbox".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckoutErrorKind;
    use prepkart_catalog::item::ItemKind;
    use prepkart_core::backend::{CreateOrderResponse, VerifyPaymentResponse};
    use prepkart_core::session::{MemorySessionStore, SessionStore};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeBackend {
        create_responses: Mutex<VecDeque<Result<CreateOrderResponse, String>>>,
        verify_responses: Mutex<VecDeque<Result<VerifyPaymentResponse, String>>>,
        create_calls: AtomicUsize,
        verify_requests: Mutex<Vec<VerifyPaymentRequest>>,
    }

    impl FakeBackend {
        async fn queue_create(&self, resp: CreateOrderResponse) {
            self.create_responses.lock().await.push_back(Ok(resp));
        }

        async fn queue_verify(&self, resp: VerifyPaymentResponse) {
            self.verify_responses.lock().await.push_back(Ok(resp));
        }

        fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        async fn verify_requests(&self) -> Vec<VerifyPaymentRequest> {
            self.verify_requests.lock().await.clone()
        }
    }

    #[async_trait]
    impl PaymentsBackend for FakeBackend {
        async fn create_order(
            &self,
            req: &CreateOrderRequest,
        ) -> Result<CreateOrderResponse, Box<dyn std::error::Error + Send + Sync>> {
            let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.create_responses.lock().await.pop_front() {
                Some(Ok(resp)) => Ok(resp),
                Some(Err(msg)) => Err(msg.into()),
                None => Ok(CreateOrderResponse {
                    success: true,
                    order_id: Some(format!("order_{n}")),
                    amount: Some(req.amount),
                    message: None,
                }),
            }
        }

        async fn verify_payment(
            &self,
            req: &VerifyPaymentRequest,
        ) -> Result<VerifyPaymentResponse, Box<dyn std::error::Error + Send + Sync>> {
            self.verify_requests.lock().await.push(req.clone());
            match self.verify_responses.lock().await.pop_front() {
                Some(Ok(resp)) => Ok(resp),
                Some(Err(msg)) => Err(msg.into()),
                None => Ok(VerifyPaymentResponse {
                    success: true,
                    message: None,
                }),
            }
        }
    }

    enum GatewayScript {
        Complete { payment_id: String, signature: String },
        Dismiss,
        DismissWhenNotified(Arc<Notify>),
        Fail(String),
        Hang,
    }

    struct FakeGateway {
        ready: bool,
        scripts: Mutex<VecDeque<GatewayScript>>,
        opened: Mutex<Vec<GatewayCheckout>>,
    }

    impl FakeGateway {
        fn new(scripts: Vec<GatewayScript>) -> Self {
            Self {
                ready: true,
                scripts: Mutex::new(scripts.into()),
                opened: Mutex::new(Vec::new()),
            }
        }

        fn offline() -> Self {
            Self {
                ready: false,
                scripts: Mutex::new(VecDeque::new()),
                opened: Mutex::new(Vec::new()),
            }
        }

        async fn opened(&self) -> Vec<GatewayCheckout> {
            self.opened.lock().await.clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn open(
            &self,
            checkout: &GatewayCheckout,
        ) -> Result<GatewayOutcome, Box<dyn std::error::Error + Send + Sync>> {
            self.opened.lock().await.push(checkout.clone());
            let script = self.scripts.lock().await.pop_front();
            match script {
                Some(GatewayScript::Complete {
                    payment_id,
                    signature,
                }) => Ok(GatewayOutcome::Completed(PaymentResult {
                    order_id: checkout.order_id.clone(),
                    payment_id,
                    signature,
                })),
                Some(GatewayScript::Dismiss) | None => Ok(GatewayOutcome::Dismissed),
                Some(GatewayScript::DismissWhenNotified(notify)) => {
                    notify.notified().await;
                    Ok(GatewayOutcome::Dismissed)
                }
                Some(GatewayScript::Fail(msg)) => Err(msg.into()),
                Some(GatewayScript::Hang) => {
                    std::future::pending::<()>().await;
                    Err("unreachable".into())
                }
            }
        }
    }

    fn item() -> PurchasableItem {
        PurchasableItem {
            id: 12,
            kind: ItemKind::Course,
            title: "Algebra crash course".to_string(),
            description: None,
            price: "1".to_string(),
            duration: Some("6 months".to_string()),
            image: None,
            image_url: None,
            paid: false,
        }
    }

    async fn logged_in_auth() -> Arc<AuthContext> {
        let auth = Arc::new(AuthContext::new(Arc::new(MemorySessionStore::default())));
        auth.login(SessionUser {
            id: 7,
            name: "Asha".to_string(),
            email: Some("asha@example.com".to_string()),
            mobile: None,
        })
        .await
        .unwrap();
        auth
    }

    struct Harness {
        backend: Arc<FakeBackend>,
        gateway: Arc<FakeGateway>,
        entitlements: Arc<Entitlements>,
        controller: Arc<CheckoutController>,
    }

    async fn harness_with(gateway: FakeGateway, auth: Arc<AuthContext>) -> Harness {
        let backend = Arc::new(FakeBackend::default());
        let gateway = Arc::new(gateway);
        let entitlements = Arc::new(Entitlements::default());
        let controller = Arc::new(CheckoutController::new(
            backend.clone(),
            gateway.clone(),
            auth,
            entitlements.clone(),
            CheckoutConfig {
                gateway_key: "rzp_test_key".to_string(),
                merchant_name: "TO Maths".to_string(),
                ..CheckoutConfig::default()
            },
        ));
        Harness {
            backend,
            gateway,
            entitlements,
            controller,
        }
    }

    fn completed(payment_id: &str, signature: &str) -> GatewayScript {
        GatewayScript::Complete {
            payment_id: payment_id.to_string(),
            signature: signature.to_string(),
        }
    }

    #[tokio::test]
    async fn buy_without_session_makes_no_network_calls() {
        let auth = Arc::new(AuthContext::new(Arc::new(MemorySessionStore::default())));
        let h = harness_with(FakeGateway::new(vec![]), auth).await;

        let outcome = h.controller.buy(&item()).await;

        match outcome {
            CheckoutOutcome::Failed { kind, .. } => {
                assert_eq!(kind, CheckoutErrorKind::NotAuthenticated)
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(h.backend.create_calls(), 0);
        assert!(h.gateway.opened().await.is_empty());
    }

    #[tokio::test]
    async fn stale_session_with_zero_id_is_not_authenticated() {
        let store = Arc::new(MemorySessionStore::default());
        store
            .save(&SessionUser {
                id: 0,
                name: "ghost".to_string(),
                email: None,
                mobile: None,
            })
            .await
            .unwrap();
        let auth = Arc::new(AuthContext::new(store));
        auth.restore().await.unwrap();

        let h = harness_with(FakeGateway::new(vec![]), auth).await;
        let outcome = h.controller.buy(&item()).await;

        match outcome {
            CheckoutOutcome::Failed { kind, .. } => {
                assert_eq!(kind, CheckoutErrorKind::NotAuthenticated)
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(h.backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn unready_gateway_blocks_order_creation() {
        let h = harness_with(FakeGateway::offline(), logged_in_auth().await).await;

        let outcome = h.controller.buy(&item()).await;

        match outcome {
            CheckoutOutcome::Failed { kind, .. } => {
                assert_eq!(kind, CheckoutErrorKind::GatewayUnavailable)
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(h.backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn widget_opens_with_the_backend_order() {
        let h = harness_with(
            FakeGateway::new(vec![completed("p1", "s1")]),
            logged_in_auth().await,
        )
        .await;
        h.backend
            .queue_create(CreateOrderResponse {
                success: true,
                order_id: Some("o1".to_string()),
                amount: Some(100),
                message: None,
            })
            .await;

        let outcome = h.controller.buy(&item()).await;
        assert!(outcome.is_success());

        let opened = h.gateway.opened().await;
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].order_id, "o1");
        assert_eq!(opened[0].amount_minor, 100);
        assert_eq!(opened[0].currency, "INR");
        assert_eq!(opened[0].description, "Algebra crash course");
        assert_eq!(opened[0].prefill_name.as_deref(), Some("Asha"));
    }

    #[tokio::test]
    async fn verify_body_carries_the_callback_and_buyer_item_pair() {
        let h = harness_with(
            FakeGateway::new(vec![completed("p1", "s1")]),
            logged_in_auth().await,
        )
        .await;
        h.backend
            .queue_create(CreateOrderResponse {
                success: true,
                order_id: Some("o1".to_string()),
                amount: Some(100),
                message: None,
            })
            .await;

        h.controller.buy(&item()).await;

        let requests = h.backend.verify_requests().await;
        assert_eq!(
            requests,
            vec![VerifyPaymentRequest {
                razorpay_order_id: "o1".to_string(),
                razorpay_payment_id: "p1".to_string(),
                razorpay_signature: "s1".to_string(),
                user_id: 7,
                course_id: 12,
            }]
        );
    }

    #[tokio::test]
    async fn successful_purchase_marks_the_item_paid() {
        let h = harness_with(
            FakeGateway::new(vec![completed("p1", "s1")]),
            logged_in_auth().await,
        )
        .await;

        let outcome = h.controller.buy(&item()).await;

        assert!(outcome.is_success());
        assert!(h.entitlements.is_paid(12).await);
        assert_eq!(h.backend.create_calls(), 1);
    }

    #[tokio::test]
    async fn dismissing_the_widget_cancels_without_verification() {
        let h = harness_with(
            FakeGateway::new(vec![GatewayScript::Dismiss]),
            logged_in_auth().await,
        )
        .await;

        let outcome = h.controller.buy(&item()).await;

        assert_eq!(outcome, CheckoutOutcome::Cancelled { message: None });
        assert!(h.backend.verify_requests().await.is_empty());
        assert!(!h.entitlements.is_paid(12).await);
    }

    #[tokio::test]
    async fn a_new_attempt_after_cancel_mints_a_new_order() {
        let h = harness_with(
            FakeGateway::new(vec![GatewayScript::Dismiss, completed("p2", "s2")]),
            logged_in_auth().await,
        )
        .await;

        let first = h.controller.buy(&item()).await;
        assert_eq!(first, CheckoutOutcome::Cancelled { message: None });

        let second = h.controller.buy(&item()).await;
        assert!(second.is_success());
        assert_eq!(h.backend.create_calls(), 2);
    }

    #[tokio::test]
    async fn double_click_creates_a_single_order() {
        let release = Arc::new(Notify::new());
        let h = harness_with(
            FakeGateway::new(vec![GatewayScript::DismissWhenNotified(release.clone())]),
            logged_in_auth().await,
        )
        .await;

        let first = {
            let controller = h.controller.clone();
            let item = item();
            tokio::spawn(async move { controller.buy(&item).await })
        };

        // Wait until the first attempt holds the lock and has the widget open.
        while h.gateway.opened().await.is_empty() {
            tokio::task::yield_now().await;
        }

        let second = h.controller.buy(&item()).await;
        match second {
            CheckoutOutcome::Failed { kind, .. } => {
                assert_eq!(kind, CheckoutErrorKind::AttemptInProgress)
            }
            other => panic!("expected failure, got {other:?}"),
        }

        release.notify_one();
        let first = first.await.unwrap();
        assert_eq!(first, CheckoutOutcome::Cancelled { message: None });
        assert_eq!(h.backend.create_calls(), 1);
    }

    #[tokio::test]
    async fn order_creation_failure_surfaces_the_backend_message() {
        let h = harness_with(FakeGateway::new(vec![]), logged_in_auth().await).await;
        h.backend
            .queue_create(CreateOrderResponse {
                success: false,
                order_id: None,
                amount: None,
                message: Some("Amount below minimum".to_string()),
            })
            .await;

        let outcome = h.controller.buy(&item()).await;

        assert_eq!(
            outcome,
            CheckoutOutcome::Failed {
                kind: CheckoutErrorKind::OrderCreationFailed,
                message: "Amount below minimum".to_string(),
            }
        );
        assert!(h.gateway.opened().await.is_empty());
    }

    #[tokio::test]
    async fn missing_order_id_fails_with_the_generic_message() {
        let h = harness_with(FakeGateway::new(vec![]), logged_in_auth().await).await;
        h.backend
            .queue_create(CreateOrderResponse {
                success: true,
                order_id: None,
                amount: Some(100),
                message: None,
            })
            .await;

        let outcome = h.controller.buy(&item()).await;

        assert_eq!(
            outcome,
            CheckoutOutcome::Failed {
                kind: CheckoutErrorKind::OrderCreationFailed,
                message: FALLBACK_ORDER_FAILED.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn declined_verification_surfaces_the_backend_message() {
        let h = harness_with(
            FakeGateway::new(vec![completed("p1", "s1")]),
            logged_in_auth().await,
        )
        .await;
        h.backend
            .queue_verify(VerifyPaymentResponse {
                success: false,
                message: Some("Signature mismatch".to_string()),
            })
            .await;

        let outcome = h.controller.buy(&item()).await;

        assert_eq!(
            outcome,
            CheckoutOutcome::Failed {
                kind: CheckoutErrorKind::VerificationFailed,
                message: "Signature mismatch".to_string(),
            }
        );
        assert!(!h.entitlements.is_paid(12).await);
    }

    #[tokio::test]
    async fn failed_attempts_release_the_lock_for_a_retry() {
        let h = harness_with(
            FakeGateway::new(vec![completed("p1", "bad"), completed("p2", "s2")]),
            logged_in_auth().await,
        )
        .await;
        h.backend
            .queue_verify(VerifyPaymentResponse {
                success: false,
                message: Some("Signature mismatch".to_string()),
            })
            .await;

        let first = h.controller.buy(&item()).await;
        assert!(matches!(first, CheckoutOutcome::Failed { .. }));

        let second = h.controller.buy(&item()).await;
        assert!(second.is_success());
        assert_eq!(h.backend.create_calls(), 2);
    }

    #[tokio::test]
    async fn gateway_open_error_fails_the_attempt() {
        let h = harness_with(
            FakeGateway::new(vec![GatewayScript::Fail("script blocked".to_string())]),
            logged_in_auth().await,
        )
        .await;

        let outcome = h.controller.buy(&item()).await;

        assert_eq!(
            outcome,
            CheckoutOutcome::Failed {
                kind: CheckoutErrorKind::GatewayUnavailable,
                message: FALLBACK_GATEWAY_DOWN.to_string(),
            }
        );
        assert!(h.backend.verify_requests().await.is_empty());
    }

    #[tokio::test]
    async fn gateway_wait_is_bounded() {
        let backend = Arc::new(FakeBackend::default());
        let gateway = Arc::new(FakeGateway::new(vec![GatewayScript::Hang]));
        let entitlements = Arc::new(Entitlements::default());
        let controller = CheckoutController::new(
            backend.clone(),
            gateway,
            logged_in_auth().await,
            entitlements,
            CheckoutConfig {
                gateway_timeout: Duration::from_millis(50),
                ..CheckoutConfig::default()
            },
        );

        let outcome = controller.buy(&item()).await;

        match outcome {
            CheckoutOutcome::Failed { kind, .. } => {
                assert_eq!(kind, CheckoutErrorKind::GatewayTimedOut)
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(backend.verify_requests().await.is_empty());
    }

    #[tokio::test]
    async fn unpriceable_items_never_reach_the_backend() {
        let mut bad = item();
        bad.price = "free".to_string();
        let h = harness_with(FakeGateway::new(vec![]), logged_in_auth().await).await;

        let outcome = h.controller.buy(&bad).await;

        match outcome {
            CheckoutOutcome::Failed { kind, .. } => {
                assert_eq!(kind, CheckoutErrorKind::Unexpected)
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(h.backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn sandbox_gateway_echoes_the_order_id() {
        let gateway = SandboxGateway;
        let checkout = GatewayCheckout {
            key: "k".to_string(),
            amount_minor: 100,
            currency: "INR".to_string(),
            name: "TO Maths".to_string(),
            description: "demo".to_string(),
            order_id: "order_42".to_string(),
            prefill_name: None,
            theme_color: None,
        };

        match gateway.open(&checkout).await.unwrap() {
            GatewayOutcome::Completed(result) => {
                assert_eq!(result.order_id, "order_42");
                assert!(result.payment_id.starts_with("pay_sandbox_"));
            }
            GatewayOutcome::Dismissed => panic!("sandbox never dismisses"),
        }
    }
}
