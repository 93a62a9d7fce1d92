//! # Coupon Factory
//!
//! Assembles and signs new coupons. Each coupon gets a fresh UUIDv4 id, an
//! `issuedAt` of now, and the fixed [`PROTOCOL_VERSION`].

use coupon_core::{Certificate, CryptoError, DistinguishedName, Timestamp};
use coupon_crypto::Ed25519KeyPair;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::coupon::{Coupon, PROTOCOL_VERSION};
use crate::signature::sign_coupon;

/// Create and sign a coupon from `issuer` to `recipient`.
///
/// `key` must be the private half of `issuer_certificate.subjectPublicKey`,
/// otherwise the coupon is created but will not verify.
pub fn create_coupon(
    issuer: DistinguishedName,
    recipient: DistinguishedName,
    issuer_certificate: &Certificate,
    key: &Ed25519KeyPair,
    data: Map<String, Value>,
    expires_at: Option<Timestamp>,
) -> Result<Coupon, CryptoError> {
    let mut coupon = Coupon {
        id: Uuid::new_v4(),
        issuer,
        recipient,
        issued_at: Timestamp::now(),
        expires_at,
        issuer_certificate: issuer_certificate.clone(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        data,
        signature: String::new(),
        signature_algorithm: String::new(),
        canonicalization_method: String::new(),
    };
    sign_coupon(&mut coupon, key)?;
    tracing::info!(
        coupon_id = %coupon.id,
        issuer = %coupon.issuer.common_name,
        recipient = %coupon.recipient.common_name,
        "coupon issued"
    );
    Ok(coupon)
}

/// Create one independently signed coupon per recipient.
///
/// There is no aggregate signature; every coupon verifies on its own.
pub fn create_coupon_batch(
    issuer: &DistinguishedName,
    recipients: &[DistinguishedName],
    issuer_certificate: &Certificate,
    key: &Ed25519KeyPair,
    data: &Map<String, Value>,
    expires_at: Option<Timestamp>,
) -> Result<Vec<Coupon>, CryptoError> {
    recipients
        .iter()
        .map(|recipient| {
            create_coupon(
                issuer.clone(),
                recipient.clone(),
                issuer_certificate,
                key,
                data.clone(),
                expires_at,
            )
        })
        .collect()
}
