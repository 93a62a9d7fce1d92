//! # coupon-store: Coupon Storage
//!
//! Keyed coupon storage with filtering, pagination and expiry sweeps.
//!
//! - [`InMemoryCouponStore`]: a `parking_lot::RwLock` over an ordered map.
//! - [`FileCouponStore`]: the same, plus a JSON snapshot file rewritten
//!   atomically (temp file, `fsync`, rename) on every mutation.
//!
//! ## Concurrency
//!
//! Each store instance serializes its mutations behind one write lock, and
//! reads take the read lock. No operation observes a partially applied
//! mutation. Stores are explicit values passed to their users; there is no
//! process-wide instance.

pub mod error;
pub mod file;
pub mod memory;
pub mod query;

#[cfg(test)]
mod testing;

pub use error::StoreError;
pub use file::FileCouponStore;
pub use memory::InMemoryCouponStore;
pub use query::{CouponFilter, Page};

use coupon_attest::Coupon;
use coupon_core::Timestamp;
use uuid::Uuid;

/// Operations common to every coupon store backend.
///
/// Read operations return `Result` because a durable store must be
/// initialized before use; the in-memory backend never fails.
pub trait CouponStore: Send + Sync {
    /// Insert or replace `coupon`, returning its id.
    fn store(&self, coupon: Coupon) -> Result<Uuid, StoreError>;

    /// Insert or replace every coupon as a single mutation.
    fn store_many(&self, coupons: Vec<Coupon>) -> Result<Vec<Uuid>, StoreError>;

    fn get(&self, id: &Uuid) -> Result<Option<Coupon>, StoreError>;

    /// Every stored coupon, ordered by `issuedAt` then id.
    fn get_all(&self) -> Result<Vec<Coupon>, StoreError>;

    /// Coupons matching every predicate set on `filter`, in `get_all` order.
    fn filter(&self, filter: &CouponFilter) -> Result<Vec<Coupon>, StoreError>;

    /// One page of (optionally filtered) coupons. See [`Page`].
    fn paginate(
        &self,
        page: usize,
        page_size: usize,
        filter: Option<&CouponFilter>,
    ) -> Result<Page<Coupon>, StoreError>;

    /// Remove coupons whose `expiresAt` is before `now`; returns the count.
    fn sweep_expired_at(&self, now: Timestamp) -> Result<usize, StoreError>;

    fn sweep_expired(&self) -> Result<usize, StoreError> {
        self.sweep_expired_at(Timestamp::now())
    }

    /// Returns `true` if a coupon with `id` was present.
    fn remove(&self, id: &Uuid) -> Result<bool, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
