//! # Identity Model: Distinguished Names and Certificates
//!
//! Value types binding a distinguished name to a public key.
//!
//! Certificates in this stack are **self-signed placeholders**: the issuer
//! equals the subject, and nothing here validates a chain to a root CA. The
//! certificate is embedded in every coupon so a verifier can find the issuer's
//! public key without a directory lookup.
//!
//! ## Wire Format
//!
//! Field names are camelCase (`commonName`, `subjectPublicKey`, ...). Absent
//! optional attributes are omitted rather than serialized as `null`, so they
//! do not appear in signing inputs.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::CanonicalBytes;
use crate::error::CanonicalizationError;
use crate::temporal::Timestamp;

/// X.509 version number carried by every certificate.
pub const CERTIFICATE_VERSION: u32 = 3;

/// Structured identity descriptor. Only `common_name` is required.
///
/// Equality compares every attribute; trust and filter decisions compare
/// `common_name` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistinguishedName {
    pub common_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

impl DistinguishedName {
    /// A name with only the common name set.
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            organization: None,
            organizational_unit: None,
            locality: None,
            state: None,
            country: None,
            email_address: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_organizational_unit(mut self, unit: impl Into<String>) -> Self {
        self.organizational_unit = Some(unit.into());
        self
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_email_address(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    /// Whether two names denote the same entity for trust purposes.
    pub fn same_entity(&self, other: &DistinguishedName) -> bool {
        self.common_name == other.common_name
    }
}

impl fmt::Display for DistinguishedName {
    /// RFC 4514-style rendering, most specific attribute first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CN={}", self.common_name)?;
        let attrs = [
            ("OU", &self.organizational_unit),
            ("O", &self.organization),
            ("L", &self.locality),
            ("ST", &self.state),
            ("C", &self.country),
            ("emailAddress", &self.email_address),
        ];
        for (key, value) in attrs {
            if let Some(v) = value {
                write!(f, ",{key}={v}")?;
            }
        }
        Ok(())
    }
}

/// Permitted uses of a certificate's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsage {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
}

/// A self-signed certificate binding `subject` to `subject_public_key`.
///
/// Immutable once created: any field change invalidates `signature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub serial_number: String,
    pub issuer: DistinguishedName,
    pub subject: DistinguishedName,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    /// SPKI PEM of the subject's public key.
    pub subject_public_key: String,
    pub public_key_algorithm: String,
    pub key_usage: BTreeSet<KeyUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_key_usage: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crl_distribution_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocsp_url: Option<String>,
    pub signature: String,
    pub signature_algorithm: String,
    pub version: u32,
}

impl Certificate {
    /// Canonical bytes covered by the certificate's self-signature: every
    /// field except `signature` and `signatureAlgorithm`.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        let mut val = serde_json::to_value(self)?;
        if let Value::Object(obj) = &mut val {
            obj.remove("signature");
            obj.remove("signatureAlgorithm");
        }
        CanonicalBytes::from_value(val)
    }

    /// Whether issuer and subject name the same entity.
    pub fn is_self_signed(&self) -> bool {
        self.issuer == self.subject
    }

    /// Whether `now` lies within `[issued_at, expires_at]`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.issued_at <= now && now <= self.expires_at
    }
}
