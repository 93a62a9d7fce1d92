//! In-memory coupon store.

use std::collections::BTreeMap;
use std::sync::Arc;

use coupon_attest::Coupon;
use coupon_core::Timestamp;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::query::{expired_ids, page_of, select, CouponFilter, Page};
use crate::{CouponStore, StoreError};

/// Thread-safe, cloneable in-memory coupon store.
///
/// Clones share the same map. The lock is `parking_lot`, so a panicking
/// writer does not poison the store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponStore {
    data: Arc<RwLock<BTreeMap<Uuid, Coupon>>>,
}

impl InMemoryCouponStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CouponStore for InMemoryCouponStore {
    fn store(&self, coupon: Coupon) -> Result<Uuid, StoreError> {
        let id = coupon.id;
        self.data.write().insert(id, coupon);
        Ok(id)
    }

    fn store_many(&self, coupons: Vec<Coupon>) -> Result<Vec<Uuid>, StoreError> {
        let mut data = self.data.write();
        Ok(coupons
            .into_iter()
            .map(|c| {
                let id = c.id;
                data.insert(id, c);
                id
            })
            .collect())
    }

    fn get(&self, id: &Uuid) -> Result<Option<Coupon>, StoreError> {
        Ok(self.data.read().get(id).cloned())
    }

    fn get_all(&self) -> Result<Vec<Coupon>, StoreError> {
        Ok(select(&self.data.read(), None))
    }

    fn filter(&self, filter: &CouponFilter) -> Result<Vec<Coupon>, StoreError> {
        Ok(select(&self.data.read(), Some(filter)))
    }

    fn paginate(
        &self,
        page: usize,
        page_size: usize,
        filter: Option<&CouponFilter>,
    ) -> Result<Page<Coupon>, StoreError> {
        let items = select(&self.data.read(), filter);
        Ok(page_of(items, page, page_size))
    }

    fn sweep_expired_at(&self, now: Timestamp) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        let expired = expired_ids(&data, now);
        for id in &expired {
            data.remove(id);
        }
        if !expired.is_empty() {
            tracing::warn!(removed = expired.len(), "swept expired coupons");
        }
        Ok(expired.len())
    }

    fn remove(&self, id: &Uuid) -> Result<bool, StoreError> {
        Ok(self.data.write().remove(id).is_some())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.data.write().clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.data.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{coupon_at, coupon_from, issuer};
    use chrono::Duration;

    #[test]
    fn store_and_get() {
        let store = InMemoryCouponStore::new();
        let coupon = coupon_from("Alice", "Bob");
        let id = store.store(coupon.clone()).unwrap();
        assert_eq!(id, coupon.id);
        assert_eq!(store.get(&id).unwrap(), Some(coupon));
        assert_eq!(store.get(&Uuid::new_v4()).unwrap(), None);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn store_is_upsert() {
        let store = InMemoryCouponStore::new();
        let coupon = coupon_from("Alice", "Bob");
        store.store(coupon.clone()).unwrap();
        store.store(coupon).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn get_all_is_ordered_by_issued_at() {
        let (key, cert) = issuer("Alice");
        let base = Timestamp::parse("2026-01-01T00:00:00.000Z").unwrap();
        let store = InMemoryCouponStore::new();
        let late = coupon_at(&key, &cert, "Bob", base.checked_add(Duration::hours(2)).unwrap(), None);
        let early = coupon_at(&key, &cert, "Carol", base, None);
        store.store_many(vec![late.clone(), early.clone()]).unwrap();
        let all = store.get_all().unwrap();
        assert_eq!(all, vec![early, late]);
    }

    #[test]
    fn filter_is_a_conjunction() {
        let (alice_key, alice_cert) = issuer("Alice");
        let (carol_key, carol_cert) = issuer("Carol");
        let t0 = Timestamp::parse("2026-01-01T00:00:00.000Z").unwrap();
        let t1 = t0.checked_add(Duration::days(1)).unwrap();
        let t2 = t0.checked_add(Duration::days(2)).unwrap();

        let store = InMemoryCouponStore::new();
        let old = coupon_at(&alice_key, &alice_cert, "Bob", t0, None);
        let new = coupon_at(&alice_key, &alice_cert, "Bob", t2, None);
        let other = coupon_at(&carol_key, &carol_cert, "Bob", t2, None);
        store.store_many(vec![old, new.clone(), other.clone()]).unwrap();

        let hits = store
            .filter(&CouponFilter::new().issuer("Alice").issued_after(t1))
            .unwrap();
        assert_eq!(hits, vec![new.clone()]);

        let hits = store.filter(&CouponFilter::new().issued_after(t1)).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store.filter(&CouponFilter::new().id(other.id)).unwrap();
        assert_eq!(hits, vec![other]);

        let hits = store
            .filter(&CouponFilter::new().recipient("Bob").issued_before(t1))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].issued_at, t0);

        assert!(store
            .filter(&CouponFilter::new().recipient("Nobody"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn paginate_with_filter() {
        let (key, cert) = issuer("Alice");
        let base = Timestamp::parse("2026-01-01T00:00:00.000Z").unwrap();
        let store = InMemoryCouponStore::new();
        for i in 0..12 {
            let at = base.checked_add(Duration::minutes(i)).unwrap();
            let recipient = if i % 2 == 0 { "Bob" } else { "Carol" };
            store.store(coupon_at(&key, &cert, recipient, at, None)).unwrap();
        }
        let filter = CouponFilter::new().recipient("Bob");
        let page = store.paginate(2, 4, Some(&filter)).unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|c| c.recipient.common_name == "Bob"));
    }

    #[test]
    fn sweep_removes_only_expired() {
        let (key, cert) = issuer("Alice");
        let now = Timestamp::parse("2026-06-01T00:00:00.000Z").unwrap();
        let issued = now.checked_add(Duration::days(-10)).unwrap();
        let store = InMemoryCouponStore::new();
        let expired = coupon_at(&key, &cert, "Bob", issued, now.checked_add(Duration::milliseconds(-1)));
        let live = coupon_at(&key, &cert, "Carol", issued, now.checked_add(Duration::hours(1)));
        let forever = coupon_at(&key, &cert, "Dave", issued, None);
        store.store_many(vec![expired.clone(), live, forever]).unwrap();

        assert_eq!(store.sweep_expired_at(now).unwrap(), 1);
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get(&expired.id).unwrap().is_none());
        assert_eq!(store.sweep_expired_at(now).unwrap(), 0);
    }

    #[test]
    fn remove_and_clear() {
        let store = InMemoryCouponStore::new();
        let a = coupon_from("Alice", "Bob");
        let b = coupon_from("Alice", "Carol");
        store.store_many(vec![a.clone(), b]).unwrap();
        assert!(store.remove(&a.id).unwrap());
        assert!(!store.remove(&a.id).unwrap());
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn clones_share_the_map() {
        let store = InMemoryCouponStore::new();
        let handle = store.clone();
        handle.store(coupon_from("Alice", "Bob")).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn concurrent_stores_are_all_kept() {
        let store = InMemoryCouponStore::new();
        let coupons: Vec<Coupon> = (0..32).map(|_| coupon_from("Alice", "Bob")).collect();
        std::thread::scope(|s| {
            for c in &coupons {
                let store = &store;
                s.spawn(move || store.store(c.clone()).unwrap());
            }
        });
        assert_eq!(store.get_all().unwrap().len(), coupons.len());
    }
}
