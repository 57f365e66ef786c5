use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Item types sold through checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Course,
    ExamBundle,
    TestSeries,
}

/// A course or exam bundle with a price, orderable through checkout.
/// Owned by the catalog service; read-only once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasableItem {
    pub id: i64,
    pub kind: ItemKind,
    pub title: String,
    pub description: Option<String>,
    /// Price in rupees as the backend sends it, e.g. "499" or "499.00".
    pub price: String,
    pub duration: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    /// Whether the current session user already owns this item.
    #[serde(default)]
    pub paid: bool,
}

impl PurchasableItem {
    /// The price in the smallest currency unit, as the order-creation call
    /// expects it.
    pub fn price_minor_units(&self) -> Result<i64, CatalogError> {
        parse_price_minor(&self.price)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    #[error("Catalog fetch failed: {0}")]
    FetchFailed(String),
}

/// Parse a backend price string into minor units (paise). The backend is
/// inconsistent about formatting: "499", "499.5" and "499.00" all occur.
/// Sub-paise precision, negatives and junk are rejected.
pub fn parse_price_minor(raw: &str) -> Result<i64, CatalogError> {
    let invalid = || CatalogError::InvalidPrice(raw.to_string());

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (rupees, paise) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };
    if rupees.is_empty() && paise.is_empty() {
        return Err(invalid());
    }

    let whole: i64 = if rupees.is_empty() {
        0
    } else {
        rupees.parse().map_err(|_| invalid())?
    };

    let frac: i64 = match paise.len() {
        0 => 0,
        1 => paise.parse::<i64>().map_err(|_| invalid())? * 10,
        2 => paise.parse().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if whole < 0 || frac < 0 {
        return Err(invalid());
    }

    Ok(whole * 100 + frac)
}

/// Read access to the course/exam catalog. When a user id is supplied the
/// backend annotates each row with that user's paid flag.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_items(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<PurchasableItem>, Box<dyn std::error::Error + Send + Sync>>;

    async fn is_enrolled(
        &self,
        user_id: i64,
        item_id: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
