//! # Coupon Extraction and Gating
//!
//! [`extract_and_verify`] is the receiving side of the adapter: it runs
//! format, expiry and signature checks on the request's coupon. Trust is the
//! caller's concern at this boundary; [`CouponGate`] adds it for methods
//! that must only run with a valid, trusted coupon.

use std::collections::BTreeSet;

use coupon_attest::{Coupon, CouponVerifier, CouponVerifyOptions, TrustPolicy};
use coupon_core::Timestamp;
use serde_json::json;

use crate::envelope::Request;
use crate::error::ProtocolError;

fn extraction_options() -> CouponVerifyOptions {
    CouponVerifyOptions {
        check_expiry: true,
        verify_signature: true,
        validate_format: true,
        check_trusted_issuer: false,
        trusted_issuers: BTreeSet::new(),
    }
}

/// The request's coupon, if present, well formed, unexpired and correctly
/// signed. Never panics; every failure is `None`.
pub fn extract_and_verify(request: &Request, verifier: &CouponVerifier) -> Option<Coupon> {
    extract_and_verify_at(request, verifier, Timestamp::now())
}

/// [`extract_and_verify`] with an explicit clock.
pub fn extract_and_verify_at(
    request: &Request,
    verifier: &CouponVerifier,
    now: Timestamp,
) -> Option<Coupon> {
    let coupon = request.coupon()?;
    let result = verifier.verify_comprehensive_at(coupon, &extraction_options(), now);
    if result.verified {
        Some(coupon.clone())
    } else {
        tracing::debug!(
            method = %request.method,
            coupon_id = %coupon.id,
            failure = ?result.failure(),
            "request coupon rejected"
        );
        None
    }
}

/// Enforces "valid coupon required" on protected methods.
#[derive(Debug, Clone, Default)]
pub struct CouponGate {
    verifier: CouponVerifier,
    trust: Option<TrustPolicy>,
    protected: BTreeSet<String>,
}

impl CouponGate {
    pub fn new(verifier: CouponVerifier) -> Self {
        Self {
            verifier,
            trust: None,
            protected: BTreeSet::new(),
        }
    }

    /// Also require the issuer to be trusted by `policy`. The policy is read
    /// on every call, so later changes to it take effect immediately.
    pub fn with_trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.trust = Some(policy);
        self
    }

    /// Mark `method` as protected for [`CouponGate::check`].
    pub fn protect(mut self, method: impl Into<String>) -> Self {
        self.protected.insert(method.into());
        self
    }

    pub fn is_protected(&self, method: &str) -> bool {
        self.protected.contains(method)
    }

    /// Require a valid coupon regardless of method.
    pub fn require(&self, request: &Request) -> Result<Coupon, ProtocolError> {
        self.require_at(request, Timestamp::now())
    }

    pub fn require_at(&self, request: &Request, now: Timestamp) -> Result<Coupon, ProtocolError> {
        let Some(coupon) = request.coupon() else {
            tracing::debug!(method = %request.method, "protected request without coupon");
            return Err(ProtocolError::coupon_required(None));
        };
        let mut options = extraction_options();
        if let Some(policy) = &self.trust {
            policy.apply_to(&mut options);
        }
        let result = self.verifier.verify_comprehensive_at(coupon, &options, now);
        match result.failure() {
            None if result.verified => Ok(coupon.clone()),
            failure => {
                let detail = failure.map(|(check, error)| json!({"check": check, "error": error}));
                tracing::debug!(
                    method = %request.method,
                    coupon_id = %coupon.id,
                    ?failure,
                    "protected request rejected"
                );
                Err(ProtocolError::coupon_required(detail))
            }
        }
    }

    /// `Ok(None)` for unprotected methods, otherwise as [`CouponGate::require`].
    pub fn check(&self, request: &Request) -> Result<Option<Coupon>, ProtocolError> {
        if self.is_protected(&request.method) {
            self.require(request).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::attach;
    use crate::testing::{signed_coupon, signed_coupon_expiring};
    use chrono::Duration;
    use serde_json::{Map, Value};

    #[test]
    fn valid_coupon_is_extracted() {
        let coupon = signed_coupon();
        let request = attach("tools/call", Map::new(), coupon.clone());
        assert_eq!(extract_and_verify(&request, &CouponVerifier::new()), Some(coupon));
    }

    #[test]
    fn missing_coupon_is_none() {
        let request = Request::new("tools/call", Map::new());
        assert!(extract_and_verify(&request, &CouponVerifier::new()).is_none());
    }

    #[test]
    fn tampered_coupon_is_none() {
        let mut coupon = signed_coupon();
        coupon.data.insert("role".into(), Value::String("admin".into()));
        let request = attach("tools/call", Map::new(), coupon);
        assert!(extract_and_verify(&request, &CouponVerifier::new()).is_none());
    }

    #[test]
    fn expired_coupon_is_none() {
        let now = Timestamp::now();
        let coupon = signed_coupon_expiring(now.checked_add(Duration::minutes(5)));
        let request = attach("tools/call", Map::new(), coupon);
        let later = now.checked_add(Duration::hours(1)).unwrap();
        assert!(extract_and_verify_at(&request, &CouponVerifier::new(), later).is_none());
    }

    #[test]
    fn extraction_ignores_trust() {
        let request = attach("tools/call", Map::new(), signed_coupon());
        assert!(extract_and_verify(&request, &CouponVerifier::new()).is_some());
    }

    #[test]
    fn gate_rejects_missing_coupon() {
        let gate = CouponGate::new(CouponVerifier::new());
        let err = gate.require(&Request::new("tools/call", Map::new())).unwrap_err();
        assert_eq!(err.code, -32001);
        assert_eq!(err.message, "valid coupon required");
        assert!(err.data.is_none());
    }

    #[test]
    fn gate_applies_trust_policy() {
        let policy = TrustPolicy::with_issuers(["Carol"]);
        let gate = CouponGate::new(CouponVerifier::new()).with_trust_policy(policy.clone());
        let request = attach("tools/call", Map::new(), signed_coupon());

        let err = gate.require(&request).unwrap_err();
        assert_eq!(err.data.as_ref().unwrap()["check"], "trustedIssuer");

        policy.add("Alice");
        assert!(gate.require(&request).is_ok());
    }

    #[test]
    fn gate_only_checks_protected_methods() {
        let gate = CouponGate::new(CouponVerifier::new()).protect("tools/call");
        let bare_call = Request::new("tools/call", Map::new());
        let bare_list = Request::new("tools/list", Map::new());
        assert!(gate.check(&bare_call).is_err());
        assert_eq!(gate.check(&bare_list).unwrap(), None);

        let coupon = signed_coupon();
        let with_coupon = attach("tools/call", Map::new(), coupon.clone());
        assert_eq!(gate.check(&with_coupon).unwrap(), Some(coupon));
    }

    #[test]
    fn gate_reports_signature_failure_detail() {
        let mut coupon = signed_coupon();
        coupon.recipient.common_name = "Mallory".into();
        let request = attach("tools/call", Map::new(), coupon);
        let err = CouponGate::new(CouponVerifier::new()).require(&request).unwrap_err();
        assert_eq!(err.data.unwrap()["check"], "signature");
    }
}
