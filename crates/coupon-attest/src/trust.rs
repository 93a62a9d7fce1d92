//! # Issuer Trust Policy
//!
//! A mutable allow-list of issuer common names. An empty set is permissive:
//! every issuer is trusted.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::pipeline::CouponVerifyOptions;

/// Membership test with the empty-set escape hatch.
pub fn issuer_is_trusted(trusted: &BTreeSet<String>, common_name: &str) -> bool {
    trusted.is_empty() || trusted.contains(common_name)
}

/// Shared, thread-safe trust set. Clones share the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    issuers: Arc<RwLock<BTreeSet<String>>>,
}

impl TrustPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the policy with `issuers`.
    pub fn with_issuers<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            issuers: Arc::new(RwLock::new(issuers.into_iter().map(Into::into).collect())),
        }
    }

    /// Returns `true` if the issuer was not already trusted.
    pub fn add(&self, common_name: impl Into<String>) -> bool {
        let common_name = common_name.into();
        let added = self.issuers.write().insert(common_name.clone());
        if added {
            tracing::info!(issuer = %common_name, "trusted issuer added");
        }
        added
    }

    /// Returns `true` if the issuer was trusted.
    pub fn remove(&self, common_name: &str) -> bool {
        let removed = self.issuers.write().remove(common_name);
        if removed {
            tracing::info!(issuer = %common_name, "trusted issuer removed");
        }
        removed
    }

    /// Trusted issuers, sorted.
    pub fn list(&self) -> Vec<String> {
        self.issuers.read().iter().cloned().collect()
    }

    pub fn is_trusted(&self, common_name: &str) -> bool {
        issuer_is_trusted(&self.issuers.read(), common_name)
    }

    /// Whether the set is empty, i.e. every issuer is trusted.
    pub fn is_permissive(&self) -> bool {
        self.issuers.read().is_empty()
    }

    /// Copy the current set into `options` and enable the trusted-issuer check.
    pub fn apply_to(&self, options: &mut CouponVerifyOptions) {
        options.check_trusted_issuer = true;
        options.trusted_issuers = self.issuers.read().clone();
    }
}
