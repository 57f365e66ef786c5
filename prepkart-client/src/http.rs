use std::time::Duration;

use async_trait::async_trait;
use prepkart_catalog::item::{CatalogSource, ItemKind, PurchasableItem};
use prepkart_core::backend::{
    AuthResponse, CreateOrderRequest, CreateOrderResponse, IdentityBackend, LoginRequest,
    PaymentsBackend, RegisterRequest, VerifyPaymentRequest, VerifyPaymentResponse,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CourseListResponse {
    pub success: bool,
    #[serde(default)]
    pub courses: Vec<CourseRow>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A catalog row as the backend sends it: `course_name` instead of a title,
/// the price as a decimal string, image paths in whatever shape the row was
/// saved with.
#[derive(Debug, Clone, Deserialize)]
struct CourseRow {
    pub id: i64,
    pub course_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub paid: bool,
}

impl From<CourseRow> for PurchasableItem {
    fn from(row: CourseRow) -> Self {
        PurchasableItem {
            id: row.id,
            kind: ItemKind::Course,
            title: row.course_name,
            description: row.description,
            price: row.price,
            duration: row.duration,
            image: row.image,
            image_url: row.image_url,
            paid: row.paid,
        }
    }
}

#[derive(Debug, Serialize)]
struct CourseListRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
struct EnrollmentRequest {
    pub user_id: i64,
    pub course_id: i64,
}

#[derive(Debug, Deserialize)]
struct EnrollmentResponse {
    pub success: bool,
    #[serde(default)]
    pub enrolled: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// JSON-over-HTTPS client for the storefront backend. One client implements
/// all three backend ports; the backend itself is a black box and only the
/// response contracts matter here.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a JSON body and parse a JSON response. The backend answers some
    /// failures with an HTML error page instead of JSON; surface the status
    /// and the leading fragment of the body rather than a bare parse error.
    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Box<dyn std::error::Error + Send + Sync>>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let resp = self.http.post(self.endpoint(path)).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str::<T>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) => {
                let snippet: String = text.chars().take(300).collect();
                tracing::error!(%status, path, "backend returned a non-JSON response");
                Err(format!("unexpected response from {path} ({status}): {snippet}").into())
            }
        }
    }
}

#[async_trait]
impl PaymentsBackend for HttpBackend {
    async fn create_order(
        &self,
        req: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, Box<dyn std::error::Error + Send + Sync>> {
        self.post_json("create_order.php", req).await
    }

    async fn verify_payment(
        &self,
        req: &VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, Box<dyn std::error::Error + Send + Sync>> {
        self.post_json("verify-payment.php", req).await
    }
}

#[async_trait]
impl IdentityBackend for HttpBackend {
    async fn login(
        &self,
        req: &LoginRequest,
    ) -> Result<AuthResponse, Box<dyn std::error::Error + Send + Sync>> {
        self.post_json("login.php", req).await
    }

    async fn register(
        &self,
        req: &RegisterRequest,
    ) -> Result<AuthResponse, Box<dyn std::error::Error + Send + Sync>> {
        self.post_json("register.php", req).await
    }
}

#[async_trait]
impl CatalogSource for HttpBackend {
    async fn list_items(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<PurchasableItem>, Box<dyn std::error::Error + Send + Sync>> {
        // user_id 0 means "no user": the backend then omits paid flags.
        let req = CourseListRequest {
            user_id: user_id.unwrap_or(0),
        };
        let resp: CourseListResponse = self.post_json("get_courses.php", &req).await?;

        if !resp.success {
            return Err(resp
                .message
                .unwrap_or_else(|| "Failed to load courses".to_string())
                .into());
        }

        Ok(resp.courses.into_iter().map(PurchasableItem::from).collect())
    }

    async fn is_enrolled(
        &self,
        user_id: i64,
        item_id: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let req = EnrollmentRequest {
            user_id,
            course_id: item_id,
        };
        let resp: EnrollmentResponse = self.post_json("check_enrollment.php", &req).await?;

        if !resp.success {
            return Err(resp
                .message
                .unwrap_or_else(|| "Failed to check enrollment".to_string())
                .into());
        }

        Ok(resp.enrolled)
    }
}
