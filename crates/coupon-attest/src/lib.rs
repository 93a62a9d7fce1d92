//! # coupon-attest: Signed Interaction Coupons
//!
//! A coupon is a portable, Ed25519-signed token proving that an interaction
//! occurred between an issuer and a recipient. This crate provides:
//!
//! - **Coupon structure** ([`Coupon`]) and its canonical signing input.
//! - **Signing and verification** ([`sign_coupon`], [`CouponVerifier`]).
//! - **Issuance** ([`create_coupon`], [`create_coupon_batch`], [`CouponIssuer`]).
//! - **Verification pipeline** ([`CouponVerifier::verify_comprehensive`]):
//!   format, expiry, trusted issuer, signature, in that order, stopping at the
//!   first failure.
//! - **Trust policy** ([`TrustPolicy`]) and **reputation** ([`ReputationLedger`]).
//!
//! ## Security Invariants
//!
//! - Every signature covers `CanonicalBytes` of the coupon minus
//!   `signature`, `signatureAlgorithm` and `canonicalizationMethod`.
//! - Verification fails closed. The only way to relax it is the explicit
//!   verification bypass on [`CouponVerifier`], which is off by default and
//!   never read from the environment.

pub mod config;
pub mod coupon;
pub mod factory;
pub mod pipeline;
pub mod reputation;
pub mod signature;
pub mod trust;

#[cfg(test)]
mod testing;

pub use config::{ConfigurationError, CouponIssuer, CouponSettings, IssuerConfig};
pub use coupon::{Coupon, PROTOCOL_VERSION};
pub use factory::{create_coupon, create_coupon_batch};
pub use pipeline::{CheckKind, CouponVerifyOptions, VerificationCheck, VerificationResult};
pub use reputation::{ReputationLedger, ReputationRecord};
pub use signature::{sign_coupon, CouponVerifier};
pub use trust::{issuer_is_trusted, TrustPolicy};
