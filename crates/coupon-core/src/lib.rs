//! # coupon-core: Foundational Types for the Coupon Stack
//!
//! The leaf of the workspace DAG. Every other `coupon-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every signing input in the stack flows
//!    through `CanonicalBytes::new()`. Signer and verifier cannot disagree on
//!    byte layout because there is exactly one path that produces the bytes.
//!
//! 2. **Deep canonical form.** Object keys are sorted at every depth (RFC 8785),
//!    not just at the top level, so nested `data` maps sign identically across
//!    implementations.
//!
//! 3. **UTC-only, millisecond timestamps.** `Timestamp` always renders as
//!    `YYYY-MM-DDTHH:MM:SS.mmmZ`.
//!
//! 4. **Identity by value.** `DistinguishedName` and `Certificate` are plain
//!    value types. Trust and filter comparisons use `common_name` only.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `coupon-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::{CanonicalBytes, CANONICALIZATION_METHOD};
pub use error::{CanonicalizationError, CouponError, CryptoError, ValidationError};
pub use identity::{Certificate, DistinguishedName, KeyUsage, CERTIFICATE_VERSION};
pub use temporal::Timestamp;
