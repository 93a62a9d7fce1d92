//! # Error Types: Structured Error Hierarchy
//!
//! Error types shared by every crate in the coupon stack. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - The verification pipeline never propagates these errors. It renders them
//!   with `to_string()` into the `error` field of a failed check.
//! - Construction-time errors (canonicalization, key parsing) propagate with `?`.
//! - Storage and configuration errors live in the crates that own those
//!   concerns (`coupon-store`, `coupon-attest::config`).

use thiserror::Error;

use crate::temporal::Timestamp;

/// Top-level error type for coupon attestation.
#[derive(Error, Debug)]
pub enum CouponError {
    /// Malformed coupon or certificate.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The coupon's `expiresAt` lies in the past.
    #[error("Coupon expired at {expires_at}")]
    Expired {
        /// The expiry instant recorded on the coupon.
        expires_at: Timestamp,
    },

    /// The issuer is not a member of a non-empty trust set.
    #[error("Issuer not trusted: {common_name}")]
    UntrustedIssuer {
        /// Common name of the rejected issuer.
        common_name: String,
    },

    /// Signature verification failed or key material was malformed.
    #[error(transparent)]
    Signature(#[from] CryptoError),

    /// Canonicalization of a signing input failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Structural validation failure of a coupon or certificate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent or empty. Carries the dotted field path.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field is present but cannot be interpreted.
    #[error("Malformed field {field}: {reason}")]
    Malformed {
        /// Dotted path of the offending field.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Integer outside the IEEE-754 safe range.
    #[error("integer {0} is outside the safe range ±(2^53 - 1); encode it as a string")]
    UnsafeInteger(String),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Public or private key could not be parsed.
    #[error("key error: {0}")]
    KeyError(String),

    /// The signature encoding is invalid (bad base64 or wrong length).
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The recorded algorithm or canonicalization method is not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signing input could not be produced.
    #[error("signing input error: {0}")]
    SigningInput(#[from] CanonicalizationError),
}
