//! Shared fixtures for unit tests in this crate.

use chrono::Duration;
use coupon_core::{Certificate, DistinguishedName, Timestamp};
use coupon_crypto::{issue_self_signed_certificate, Ed25519KeyPair};
use serde_json::{Map, Value};

use crate::coupon::Coupon;
use crate::factory::create_coupon;

pub(crate) struct Fixture {
    pub key: Ed25519KeyPair,
    pub certificate: Certificate,
    pub coupon: Coupon,
}

/// Alice (OrgX) issues Bob a coupon with `{purpose: "demo"}`, expiring in 30 days.
pub(crate) fn fixture() -> Fixture {
    let key = Ed25519KeyPair::generate();
    let issuer = DistinguishedName::new("Alice").with_organization("OrgX");
    let certificate = issue_self_signed_certificate(issuer.clone(), &key, Duration::days(365))
        .expect("certificate issuance");
    let mut data = Map::new();
    data.insert("purpose".into(), Value::String("demo".into()));
    let coupon = create_coupon(
        issuer,
        DistinguishedName::new("Bob"),
        &certificate,
        &key,
        data,
        Timestamp::now().checked_add(Duration::days(30)),
    )
    .expect("coupon creation");
    Fixture {
        key,
        certificate,
        coupon,
    }
}
