//! Coupon fixtures for unit tests in this crate.

use chrono::Duration;
use coupon_attest::{create_coupon, Coupon};
use coupon_core::{DistinguishedName, Timestamp};
use coupon_crypto::{issue_self_signed_certificate, Ed25519KeyPair};
use serde_json::{Map, Value};

/// Alice issues Bob a coupon expiring at `expires_at`.
pub(crate) fn signed_coupon_expiring(expires_at: Option<Timestamp>) -> Coupon {
    let key = Ed25519KeyPair::generate();
    let alice = DistinguishedName::new("Alice").with_organization("OrgX");
    let cert = issue_self_signed_certificate(alice.clone(), &key, Duration::days(365))
        .expect("certificate issuance");
    let mut data = Map::new();
    data.insert("purpose".into(), Value::String("demo".into()));
    create_coupon(alice, DistinguishedName::new("Bob"), &cert, &key, data, expires_at)
        .expect("coupon creation")
}

pub(crate) fn signed_coupon() -> Coupon {
    signed_coupon_expiring(Timestamp::now().checked_add(Duration::days(30)))
}
