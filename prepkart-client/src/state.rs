use std::sync::Arc;
use std::time::Duration;

use prepkart_catalog::entitlements::Entitlements;
use prepkart_catalog::item::{CatalogSource, PurchasableItem};
use prepkart_core::backend::{IdentityBackend, LoginRequest, RegisterRequest};
use prepkart_core::gateway::PaymentGateway;
use prepkart_core::session::{AuthContext, SessionUser};
use prepkart_checkout::{CheckoutConfig, CheckoutController};
use prepkart_store::{Config, FileSessionStore};

use crate::http::HttpBackend;

/// Everything a storefront shell needs, wired once at startup and shared
/// from then on. The auth context is the only writer of session state; the
/// checkout controller is the only writer of entitlements.
#[derive(Clone)]
pub struct Storefront {
    pub config: Arc<Config>,
    pub auth: Arc<AuthContext>,
    pub entitlements: Arc<Entitlements>,
    pub catalog: Arc<dyn CatalogSource>,
    pub identity: Arc<dyn IdentityBackend>,
    pub checkout: Arc<CheckoutController>,
}

impl Storefront {
    /// Wire the full stack against the configured backend. The gateway is
    /// supplied by the embedding shell; tests and the demo binary pass the
    /// sandbox gateway.
    pub fn from_config(
        config: Config,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let backend = Arc::new(HttpBackend::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_seconds),
        )?);

        let auth = Arc::new(AuthContext::new(Arc::new(FileSessionStore::new(
            &config.session.path,
        ))));
        let entitlements = Arc::new(Entitlements::default());

        let checkout = Arc::new(CheckoutController::new(
            backend.clone(),
            gateway,
            auth.clone(),
            entitlements.clone(),
            CheckoutConfig {
                gateway_key: config.gateway.key_id.clone(),
                merchant_name: config.gateway.merchant_name.clone(),
                currency: config.gateway.currency.clone(),
                theme_color: config.gateway.theme_color.clone(),
                gateway_timeout: Duration::from_secs(config.gateway.checkout_timeout_seconds),
            },
        ));

        Ok(Self {
            config: Arc::new(config),
            auth,
            entitlements,
            catalog: backend.clone(),
            identity: backend,
            checkout,
        })
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, Box<dyn std::error::Error + Send + Sync>> {
        let resp = self
            .identity
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        if !resp.success {
            return Err(resp
                .message
                .unwrap_or_else(|| "Invalid credentials".to_string())
                .into());
        }
        let user = resp.user.ok_or("login succeeded without a user record")?;

        // A different user means a different paid set.
        self.entitlements.reset().await;
        self.auth.login(user.clone()).await?;
        Ok(user)
    }

    /// Sign up and, when the backend returns the new user record, log the
    /// session in directly. Some backend variants only return a message.
    pub async fn register(
        &self,
        req: &RegisterRequest,
    ) -> Result<Option<SessionUser>, Box<dyn std::error::Error + Send + Sync>> {
        let resp = self.identity.register(req).await?;

        if !resp.success {
            return Err(resp
                .message
                .unwrap_or_else(|| "Registration failed".to_string())
                .into());
        }

        if let Some(user) = &resp.user {
            self.entitlements.reset().await;
            self.auth.login(user.clone()).await?;
        }
        Ok(resp.user)
    }

    pub async fn logout(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.auth.logout().await?;
        self.entitlements.reset().await;
        Ok(())
    }

    /// Fetch the catalog for the current user and overlay locally known
    /// purchases, so an item bought this session shows as owned even before
    /// the backend's paid flags catch up.
    pub async fn load_catalog(
        &self,
    ) -> Result<Vec<PurchasableItem>, Box<dyn std::error::Error + Send + Sync>> {
        let user_id = self.auth.current().await.map(|u| u.id);
        let mut items = self.catalog.list_items(user_id).await?;
        self.entitlements.absorb(&items).await;
        self.entitlements.apply(&mut items).await;
        Ok(items)
    }

    pub async fn is_enrolled(
        &self,
        item_id: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        match self.auth.current().await {
            Some(user) => self.catalog.is_enrolled(user.id, item_id).await,
            None => Ok(false),
        }
    }

    /// Display URL for an item's image, per the configured upload base.
    pub fn image_for(&self, item: &PurchasableItem) -> String {
        item.image_src(
            &self.config.catalog.upload_base_url,
            &self.config.catalog.default_image,
        )
    }
}
