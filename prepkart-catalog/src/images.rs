use crate::item::PurchasableItem;

/// Resolve a display URL for an item's image. Backend rows carry image paths
/// in several shapes (bare filename, "uploads/x.png", absolute URLs from
/// older rows); all of them reduce to filename + upload base. `image_url`
/// wins over `image` when both are present.
pub fn resolve_image_url(
    image_url: Option<&str>,
    image: Option<&str>,
    upload_base: &str,
    fallback: &str,
) -> String {
    let raw = image_url
        .filter(|s| !s.trim().is_empty())
        .or_else(|| image.filter(|s| !s.trim().is_empty()))
        .unwrap_or("");

    match raw.rsplit('/').next().filter(|name| !name.is_empty()) {
        Some(filename) => format!("{}/{}", upload_base.trim_end_matches('/'), filename),
        None => fallback.to_string(),
    }
}

impl PurchasableItem {
    pub fn image_src(&self, upload_base: &str, fallback: &str) -> String {
        resolve_image_url(
            self.image_url.as_deref(),
            self.image.as_deref(),
            upload_base,
            fallback,
        )
    }
}
