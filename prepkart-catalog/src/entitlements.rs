use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::item::PurchasableItem;

/// Mark every item in `items` whose id appears in `paid` as owned. Backend
/// flags already set on a row are left alone.
pub fn merge_paid_status(items: &mut [PurchasableItem], paid: &HashSet<i64>) {
    for item in items {
        if paid.contains(&item.id) {
            item.paid = true;
        }
    }
}

/// The locally known paid item ids for the current session user. A verified
/// purchase is recorded here so listings unlock without a reload; a fresh
/// fetch re-seeds it from the backend's per-user flags.
#[derive(Debug, Default)]
pub struct Entitlements {
    paid: RwLock<HashSet<i64>>,
}

impl Entitlements {
    pub async fn mark_paid(&self, item_id: i64) {
        tracing::debug!(item_id, "marking item as paid");
        self.paid.write().await.insert(item_id);
    }

    pub async fn is_paid(&self, item_id: i64) -> bool {
        self.paid.read().await.contains(&item_id)
    }

    /// Seed the set from a listing's backend-provided paid flags.
    pub async fn absorb(&self, items: &[PurchasableItem]) {
        let mut paid = self.paid.write().await;
        paid.extend(items.iter().filter(|i| i.paid).map(|i| i.id));
    }

    /// Overlay the local set onto a fetched listing.
    pub async fn apply(&self, items: &mut [PurchasableItem]) {
        let paid = self.paid.read().await;
        merge_paid_status(items, &paid);
    }

    /// Forget everything, e.g. on logout.
    pub async fn reset(&self) {
        self.paid.write().await.clear();
    }
}
