//! # Coupon Structure
//!
//! Defines [`Coupon`], the signed attestation token, and its signing input.
//!
//! ## Security Invariant
//!
//! ```text
//! signature == Sign(key, CanonicalBytes(coupon − {signature, signatureAlgorithm, canonicalizationMethod}))
//! ```
//!
//! Every other field is covered by the signature, including the embedded
//! issuer certificate and the free-form `data` map. Any mutation after
//! signing invalidates the coupon.

use coupon_core::{CanonicalBytes, CanonicalizationError, Certificate, DistinguishedName, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Protocol revision stamped on every coupon issued by this crate.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Fields excluded from the signing input.
const UNSIGNED_FIELDS: [&str; 3] = ["signature", "signatureAlgorithm", "canonicalizationMethod"];

/// A signed attestation that an interaction occurred between `issuer` and
/// `recipient`.
///
/// ## Field Naming
///
/// Serialized with camelCase keys; this is the wire format carried in
/// request metadata and the `X-Coupon` header, and the element type of the
/// durable store's snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub issuer: DistinguishedName,
    pub recipient: DistinguishedName,
    pub issued_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    pub issuer_certificate: Certificate,
    pub protocol_version: String,
    pub data: Map<String, Value>,
    /// Base64 Ed25519 signature over [`Coupon::signing_input`].
    pub signature: String,
    pub signature_algorithm: String,
    pub canonicalization_method: String,
}

impl Coupon {
    /// Canonical bytes covered by the signature.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        let mut val = serde_json::to_value(self)?;
        if let Value::Object(obj) = &mut val {
            for field in UNSIGNED_FIELDS {
                obj.remove(field);
            }
        }
        CanonicalBytes::from_value(val)
    }

    /// Whether the coupon carries an `expiresAt` strictly before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }

    /// Whether the coupon is expired at the current instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}
