//! # Request Envelope
//!
//! A typed view of a `{method, params}` request in which the coupon slot is
//! explicit:
//!
//! ```text
//! { "method": "...", "params": { "_meta": { "coupon": { ... }, ...other meta }, ...other params } }
//! ```
//!
//! Unknown params and metadata keys are preserved through `rest` maps.

use coupon_attest::Coupon;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Reserved params key holding request metadata.
pub const META_KEY: &str = "_meta";

/// Metadata key holding the coupon.
pub const COUPON_KEY: &str = "coupon";

/// Request metadata. Only `coupon` is typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Request params: optional metadata plus arbitrary method arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RequestMeta>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A method call with typed coupon metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: RequestParams,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Map<String, Value>) -> Self {
        let mut params = params;
        let meta = match params.remove(META_KEY) {
            Some(Value::Object(mut meta)) => {
                meta.remove(COUPON_KEY);
                Some(RequestMeta {
                    coupon: None,
                    rest: meta,
                })
            }
            _ => None,
        };
        Self {
            method: method.into(),
            params: RequestParams { meta, rest: params },
        }
    }

    /// Parse an untyped request.
    ///
    /// A `_meta.coupon` that is not a valid coupon is dropped, leaving a
    /// request with no coupon. Any other structural problem is an
    /// `invalid request` error.
    pub fn from_value(mut value: Value) -> Result<Self, ProtocolError> {
        let raw_coupon = value
            .get_mut("params")
            .and_then(|p| p.get_mut(META_KEY))
            .and_then(Value::as_object_mut)
            .and_then(|meta| meta.remove(COUPON_KEY));

        let mut request: Request = serde_json::from_value(value)
            .map_err(|e| ProtocolError::invalid_request(e.to_string()))?;

        if let Some(raw) = raw_coupon.filter(|v| !v.is_null()) {
            match serde_json::from_value::<Coupon>(raw) {
                Ok(coupon) => request.attach_coupon(coupon),
                Err(e) => tracing::debug!(
                    method = %request.method,
                    error = %e,
                    "ignoring malformed request coupon"
                ),
            }
        }
        Ok(request)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Set the coupon, keeping any other metadata keys.
    pub fn attach_coupon(&mut self, coupon: Coupon) {
        self.params.meta.get_or_insert_with(RequestMeta::default).coupon = Some(coupon);
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.params.meta.as_ref().and_then(|m| m.coupon.as_ref())
    }

    /// Remove and return the coupon.
    pub fn take_coupon(&mut self) -> Option<Coupon> {
        self.params.meta.as_mut().and_then(|m| m.coupon.take())
    }
}

/// Build a request for `method` carrying `coupon` in `params._meta.coupon`.
///
/// Existing `_meta` keys in `params` are kept; a previous coupon is replaced.
pub fn attach(method: impl Into<String>, params: Map<String, Value>, coupon: Coupon) -> Request {
    let mut request = Request::new(method, params);
    request.attach_coupon(coupon);
    request
}
