//! # coupon-crypto: Cryptographic Primitives
//!
//! - **Ed25519** key pairs, public keys (SPKI PEM) and signatures (base64).
//! - **Signing input discipline**: `sign` and `verify` accept only
//!   [`CanonicalBytes`](coupon_core::CanonicalBytes), never raw byte slices.
//! - **Self-signed certificates** binding a distinguished name to a key.
//!
//! ## Crate Policy
//!
//! - Depends only on `coupon-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   Ed25519 keys.
//! - Private key material never appears in `Debug` output.

pub mod certificate;
pub mod ed25519;

pub use certificate::{
    certificate_public_key, issue_self_signed_certificate, issue_self_signed_certificate_at,
    verify_certificate_self_signature,
};
pub use ed25519::{
    verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, SIGNATURE_ALGORITHM,
};
