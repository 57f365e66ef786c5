pub mod entitlements;
pub mod images;
pub mod item;

pub use entitlements::{merge_paid_status, Entitlements};
pub use images::resolve_image_url;
pub use item::{parse_price_minor, CatalogError, CatalogSource, ItemKind, PurchasableItem};
