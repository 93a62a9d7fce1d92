//! # Queries
//!
//! Filter predicates, ordering and pagination shared by every backend. All
//! functions here are pure over a snapshot of the coupon map, so backends
//! only decide which lock to hold while calling them.

use std::collections::BTreeMap;

use coupon_attest::Coupon;
use coupon_core::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conjunction of optional predicates. An empty filter matches everything.
///
/// `issued_after` and `issued_before` are strict bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CouponFilter {
    pub id: Option<Uuid>,
    pub issuer_common_name: Option<String>,
    pub recipient_common_name: Option<String>,
    pub issued_after: Option<Timestamp>,
    pub issued_before: Option<Timestamp>,
}

impl CouponFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn issuer(mut self, common_name: impl Into<String>) -> Self {
        self.issuer_common_name = Some(common_name.into());
        self
    }

    pub fn recipient(mut self, common_name: impl Into<String>) -> Self {
        self.recipient_common_name = Some(common_name.into());
        self
    }

    pub fn issued_after(mut self, at: Timestamp) -> Self {
        self.issued_after = Some(at);
        self
    }

    pub fn issued_before(mut self, at: Timestamp) -> Self {
        self.issued_before = Some(at);
        self
    }

    pub fn matches(&self, coupon: &Coupon) -> bool {
        self.id.map_or(true, |id| coupon.id == id)
            && self
                .issuer_common_name
                .as_deref()
                .map_or(true, |cn| coupon.issuer.common_name == cn)
            && self
                .recipient_common_name
                .as_deref()
                .map_or(true, |cn| coupon.recipient.common_name == cn)
            && self.issued_after.map_or(true, |t| coupon.issued_at > t)
            && self.issued_before.map_or(true, |t| coupon.issued_at < t)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching items across all pages.
    pub total: usize,
    /// The page actually returned, after clamping.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Matching coupons ordered by `issuedAt`, ties broken by id.
pub(crate) fn select(map: &BTreeMap<Uuid, Coupon>, filter: Option<&CouponFilter>) -> Vec<Coupon> {
    let mut items: Vec<Coupon> = map
        .values()
        .filter(|c| filter.map_or(true, |f| f.matches(c)))
        .cloned()
        .collect();
    items.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then_with(|| a.id.cmp(&b.id)));
    items
}

/// Slice `items` into page `page` (1-based) of `page_size`.
///
/// `page_size == 0` is treated as 1. `page` is clamped to
/// `[1, max(total_pages, 1)]`.
pub(crate) fn page_of<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    Page {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

/// Ids of coupons with `expiresAt` before `now`.
pub(crate) fn expired_ids(map: &BTreeMap<Uuid, Coupon>, now: Timestamp) -> Vec<Uuid> {
    map.values()
        .filter(|c| c.is_expired_at(now))
        .map(|c| c.id)
        .collect()
}
