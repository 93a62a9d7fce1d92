//! # Reputation Ledger
//!
//! Folds [`VerificationResult`]s into per-entity aggregates keyed by common
//! name. Both the issuer and the recipient of each result are credited.
//!
//! Records are derived state. They are never written by the coupon store and
//! can be rebuilt by replaying verification results.

use std::collections::BTreeMap;
use std::sync::Arc;

use coupon_core::Timestamp;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::pipeline::VerificationResult;

/// Aggregate verification outcomes for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationRecord {
    pub total_coupons: u64,
    pub verified_coupons: u64,
    pub unverified_coupons: u64,
    /// `verified / total * 100`, two decimals.
    pub trust_score: String,
    pub last_updated: Timestamp,
}

impl ReputationRecord {
    fn empty(now: Timestamp) -> Self {
        Self {
            total_coupons: 0,
            verified_coupons: 0,
            unverified_coupons: 0,
            trust_score: format_score(0, 0),
            last_updated: now,
        }
    }

    fn apply(&mut self, verified: bool, now: Timestamp) {
        self.total_coupons += 1;
        if verified {
            self.verified_coupons += 1;
        } else {
            self.unverified_coupons += 1;
        }
        self.trust_score = format_score(self.verified_coupons, self.total_coupons);
        self.last_updated = now;
    }
}

fn format_score(verified: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", verified as f64 / total as f64 * 100.0)
}

/// Shared, thread-safe reputation aggregate.
#[derive(Debug, Clone, Default)]
pub struct ReputationLedger {
    records: Arc<RwLock<BTreeMap<String, ReputationRecord>>>,
}

impl ReputationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `result` in at the current time.
    pub fn record(&self, result: &VerificationResult) {
        self.record_at(result, Timestamp::now());
    }

    /// Fold `result` in with an explicit clock.
    ///
    /// Results missing an issuer or recipient are ignored.
    ///
    /// Issuer and recipient are each credited with one coupon, except for a
    /// self-issued coupon (same common name on both sides): that entity is
    /// credited once, not twice.
    pub fn record_at(&self, result: &VerificationResult, now: Timestamp) {
        let (Some(issuer), Some(recipient)) = (&result.issuer, &result.recipient) else {
            tracing::debug!("reputation: skipping result without issuer or recipient");
            return;
        };
        let mut records = self.records.write();
        let mut bump = |name: &str| {
            records
                .entry(name.to_string())
                .or_insert_with(|| ReputationRecord::empty(now))
                .apply(result.verified, now);
        };
        bump(&issuer.common_name);
        if issuer.common_name != recipient.common_name {
            bump(&recipient.common_name);
        }
    }

    pub fn get(&self, common_name: &str) -> Option<ReputationRecord> {
        self.records.read().get(common_name).cloned()
    }

    /// All records, keyed by common name.
    pub fn all(&self) -> BTreeMap<String, ReputationRecord> {
        self.records.read().clone()
    }
}
