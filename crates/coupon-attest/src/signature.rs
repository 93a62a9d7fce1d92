//! # Coupon Signer and Verifier
//!
//! [`sign_coupon`] computes the canonical signing input and records the
//! algorithm and canonicalization method. [`CouponVerifier`] reverses the
//! process using the public key from the embedded issuer certificate.
//!
//! ## Fail-Closed Semantics
//!
//! [`CouponVerifier::verify`] never returns an error and never panics. A
//! malformed key, an unknown algorithm, or a bad signature encoding all yield
//! `false`.
//!
//! The single exception is the verification bypass, an explicit constructor
//! parameter that defaults to off. With the bypass on, an unparseable issuer
//! key or an undecodable signature is reported as success and logged at
//! `warn`. An unsupported algorithm or canonicalization method, a signing
//! input that cannot be built, and a signature that does not match all still
//! fail.

use coupon_core::{CryptoError, CANONICALIZATION_METHOD};
use coupon_crypto::{
    certificate_public_key, verify, Ed25519KeyPair, Ed25519Signature, SIGNATURE_ALGORITHM,
};

use crate::coupon::Coupon;

/// Sign `coupon` in place with `key`.
///
/// Sets `signatureAlgorithm` and `canonicalizationMethod`, then replaces
/// `signature` with the base64 Ed25519 signature over the signing input.
pub fn sign_coupon(coupon: &mut Coupon, key: &Ed25519KeyPair) -> Result<(), CryptoError> {
    coupon.signature_algorithm = SIGNATURE_ALGORITHM.to_string();
    coupon.canonicalization_method = CANONICALIZATION_METHOD.to_string();
    let input = coupon.signing_input()?;
    coupon.signature = key.sign(&input).to_base64();
    Ok(())
}

/// Verifies coupon signatures against the embedded issuer certificate.
#[derive(Debug, Clone, Default)]
pub struct CouponVerifier {
    allow_verification_bypass: bool,
}

impl CouponVerifier {
    /// A verifier with the bypass disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// A verifier whose bypass setting is chosen explicitly by the caller.
    ///
    /// Intended for test harnesses that exercise flows with placeholder key
    /// material. Production code should use [`CouponVerifier::new`].
    pub fn with_verification_bypass(allow: bool) -> Self {
        Self {
            allow_verification_bypass: allow,
        }
    }

    /// Whether the verification bypass is enabled.
    pub fn bypass_enabled(&self) -> bool {
        self.allow_verification_bypass
    }

    /// `true` iff the coupon's signature is valid (or bypassed, see module docs).
    pub fn verify(&self, coupon: &Coupon) -> bool {
        self.signature_outcome(coupon).is_ok()
    }

    /// Signature verification with the bypass applied, keeping the reason on failure.
    pub(crate) fn signature_outcome(&self, coupon: &Coupon) -> Result<(), CryptoError> {
        match check_signature(coupon) {
            Ok(()) => Ok(()),
            Err(CryptoError::VerificationFailed(reason)) => {
                tracing::debug!(coupon_id = %coupon.id, %reason, "coupon signature mismatch");
                Err(CryptoError::VerificationFailed(reason))
            }
            Err(e) if self.allow_verification_bypass && is_bypassable(&e) => {
                tracing::warn!(
                    coupon_id = %coupon.id,
                    error = %e,
                    "coupon signature error ignored: verification bypass enabled"
                );
                Ok(())
            }
            Err(e) => {
                tracing::debug!(coupon_id = %coupon.id, error = %e, "coupon signature error");
                Err(e)
            }
        }
    }
}

/// Errors the bypass may turn into a pass: key parsing and signature decoding.
fn is_bypassable(error: &CryptoError) -> bool {
    matches!(
        error,
        CryptoError::KeyError(_) | CryptoError::MalformedSignature(_)
    )
}

/// Strict signature check, no bypass.
fn check_signature(coupon: &Coupon) -> Result<(), CryptoError> {
    if coupon.signature_algorithm != SIGNATURE_ALGORITHM {
        return Err(CryptoError::UnsupportedAlgorithm(format!(
            "signature algorithm {:?}",
            coupon.signature_algorithm
        )));
    }
    if coupon.canonicalization_method != CANONICALIZATION_METHOD {
        return Err(CryptoError::UnsupportedAlgorithm(format!(
            "canonicalization method {:?}",
            coupon.canonicalization_method
        )));
    }
    let public_key = certificate_public_key(&coupon.issuer_certificate)?;
    let signature = Ed25519Signature::from_base64(&coupon.signature)?;
    let input = coupon.signing_input()?;
    verify(&input, &signature, &public_key)
}
