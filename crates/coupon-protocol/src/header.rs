//! `X-Coupon` HTTP header transport.
//!
//! The header value is the coupon's compact JSON text, the same object that
//! travels in `params._meta.coupon`.

use coupon_attest::Coupon;

/// Header name used by HTTP deployments.
pub const COUPON_HEADER: &str = "X-Coupon";

pub fn encode_header(coupon: &Coupon) -> Result<String, serde_json::Error> {
    serde_json::to_string(coupon)
}

pub fn decode_header(value: &str) -> Result<Coupon, serde_json::Error> {
    serde_json::from_str(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signed_coupon;
    use coupon_attest::CouponVerifier;

    #[test]
    fn header_round_trip_keeps_signature_valid() {
        let coupon = signed_coupon();
        let header = encode_header(&coupon).unwrap();
        assert!(!header.contains('\n'));
        let decoded = decode_header(&header).unwrap();
        assert_eq!(decoded, coupon);
        assert!(CouponVerifier::new().verify(&decoded));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let coupon = signed_coupon();
        let header = format!("  {}\t", encode_header(&coupon).unwrap());
        assert_eq!(decode_header(&header).unwrap(), coupon);
    }

    #[test]
    fn garbage_header_is_an_error() {
        assert!(decode_header("not json").is_err());
        assert!(decode_header("{}").is_err());
    }
}
