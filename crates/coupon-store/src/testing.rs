//! Coupon fixtures for unit tests in this crate.

use chrono::Duration;
use coupon_attest::{create_coupon, sign_coupon, Coupon};
use coupon_core::{Certificate, DistinguishedName, Timestamp};
use coupon_crypto::{issue_self_signed_certificate, Ed25519KeyPair};
use serde_json::Map;

pub(crate) fn issuer(common_name: &str) -> (Ed25519KeyPair, Certificate) {
    let key = Ed25519KeyPair::generate();
    let cert = issue_self_signed_certificate(
        DistinguishedName::new(common_name),
        &key,
        Duration::days(365),
    )
    .expect("certificate issuance");
    (key, cert)
}

/// A fresh, signed coupon from `issuer` to `recipient`.
pub(crate) fn coupon_from(issuer_cn: &str, recipient: &str) -> Coupon {
    let (key, cert) = issuer(issuer_cn);
    create_coupon(
        DistinguishedName::new(issuer_cn),
        DistinguishedName::new(recipient),
        &cert,
        &key,
        Map::new(),
        None,
    )
    .expect("coupon creation")
}

/// A signed coupon with an explicit `issuedAt`.
pub(crate) fn coupon_at(
    key: &Ed25519KeyPair,
    cert: &Certificate,
    recipient: &str,
    issued_at: Timestamp,
    expires_at: Option<Timestamp>,
) -> Coupon {
    let mut coupon = create_coupon(
        cert.subject.clone(),
        DistinguishedName::new(recipient),
        cert,
        key,
        Map::new(),
        expires_at,
    )
    .expect("coupon creation");
    coupon.issued_at = issued_at;
    sign_coupon(&mut coupon, key).expect("re-sign");
    coupon
}
