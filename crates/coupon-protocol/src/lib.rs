//! # coupon-protocol: Request Integration
//!
//! Carries coupons through a `{method, params}` request envelope without
//! depending on any particular transport.
//!
//! - [`Request`] is a typed envelope whose `params._meta.coupon` is an
//!   `Option<Coupon>`; [`attach`] and [`Request::attach_coupon`] set it,
//!   shallow-merging with any metadata already present.
//! - [`extract_and_verify`] returns the coupon only if it is well formed,
//!   unexpired and correctly signed. It never fails loudly; `None` is the
//!   rejection signal.
//! - [`CouponGate`] turns that signal into a JSON-RPC style
//!   [`ProtocolError`] for protected methods.
//! - [`InterceptorChain`] applies ordered request transforms, such as
//!   [`AttachCoupon`], before a request is handed to the transport.
//! - [`encode_header`] / [`decode_header`] carry the same coupon JSON in an
//!   `X-Coupon` HTTP header.

pub mod envelope;
pub mod error;
pub mod gate;
pub mod header;
pub mod interceptor;

pub use envelope::{attach, Request, RequestMeta, RequestParams, COUPON_KEY, META_KEY};
pub use error::ProtocolError;
pub use gate::{extract_and_verify, extract_and_verify_at, CouponGate};
pub use header::{decode_header, encode_header, COUPON_HEADER};
pub use interceptor::{AttachCoupon, InterceptorChain, RequestInterceptor};

#[cfg(test)]
mod testing;
