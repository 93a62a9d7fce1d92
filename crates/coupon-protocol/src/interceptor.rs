//! # Request Interceptors
//!
//! An ordered chain of request transforms applied before a request reaches
//! the transport. Interceptors compose explicitly; nothing here replaces
//! methods on a transport at runtime.

use coupon_attest::Coupon;

use crate::envelope::Request;

/// Transforms an outgoing request.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: Request) -> Request;
}

impl<F> RequestInterceptor for F
where
    F: Fn(Request) -> Request + Send + Sync,
{
    fn intercept(&self, request: Request) -> Request {
        self(request)
    }
}

/// Interceptors applied in insertion order.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn RequestInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.push(interceptor);
        self
    }

    pub fn push(&mut self, interceptor: impl RequestInterceptor + 'static) {
        self.interceptors.push(Box::new(interceptor));
    }

    pub fn apply(&self, request: Request) -> Request {
        self.interceptors
            .iter()
            .fold(request, |req, interceptor| interceptor.intercept(req))
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

/// Attaches a fixed coupon to every request, keeping other metadata.
#[derive(Debug, Clone)]
pub struct AttachCoupon {
    coupon: Coupon,
}

impl AttachCoupon {
    pub fn new(coupon: Coupon) -> Self {
        Self { coupon }
    }
}

impl RequestInterceptor for AttachCoupon {
    fn intercept(&self, mut request: Request) -> Request {
        request.attach_coupon(self.coupon.clone());
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signed_coupon;
    use serde_json::{Map, Value};

    #[test]
    fn empty_chain_is_identity() {
        let request = Request::new("ping", Map::new());
        assert_eq!(InterceptorChain::new().apply(request.clone()), request);
    }

    #[test]
    fn attach_coupon_interceptor() {
        let coupon = signed_coupon();
        let chain = InterceptorChain::new().with(AttachCoupon::new(coupon.clone()));
        let out = chain.apply(Request::new("tools/call", Map::new()));
        assert_eq!(out.coupon(), Some(&coupon));
    }

    #[test]
    fn interceptors_run_in_insertion_order() {
        let tag = |label: &'static str| {
            move |mut request: Request| {
                let trail = request
                    .params
                    .rest
                    .entry("trail")
                    .or_insert_with(|| Value::String(String::new()));
                if let Value::String(s) = trail {
                    s.push_str(label);
                }
                request
            }
        };
        let chain = InterceptorChain::new().with(tag("a")).with(tag("b")).with(tag("c"));
        assert_eq!(chain.len(), 3);
        let out = chain.apply(Request::new("m", Map::new()));
        assert_eq!(out.params.rest["trail"], "abc");
    }

    #[test]
    fn later_interceptor_sees_attached_coupon() {
        let coupon = signed_coupon();
        let chain = InterceptorChain::new()
            .with(AttachCoupon::new(coupon.clone()))
            .with(|mut request: Request| {
                let present = request.coupon().is_some();
                request
                    .params
                    .rest
                    .insert("hadCoupon".into(), Value::Bool(present));
                request
            });
        let out = chain.apply(Request::new("m", Map::new()));
        assert_eq!(out.params.rest["hadCoupon"], true);
    }
}
