//! # Verification Pipeline
//!
//! Runs the enabled checks in a fixed order and stops at the first failure:
//!
//! 1. `format`: required fields present on the coupon and its certificate.
//! 2. `expiry`: `expiresAt`, when present, is not before `now`.
//! 3. `trustedIssuer`: `issuer.commonName` is in a non-empty trust set.
//! 4. `signature`: delegates to [`CouponVerifier`].
//!
//! Checks after the failing one are absent from [`VerificationResult::checks`],
//! not recorded as failed. Disabled checks are absent too. The pipeline is
//! total: every error is rendered into the failing check's `error` string.

use std::collections::{BTreeMap, BTreeSet};

use coupon_core::{Certificate, CouponError, DistinguishedName, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::coupon::Coupon;
use crate::signature::CouponVerifier;
use crate::trust::issuer_is_trusted;

/// Required coupon fields, in reporting order. Dotted paths are nested.
const REQUIRED_COUPON_FIELDS: [&str; 12] = [
    "id",
    "issuer",
    "issuer.commonName",
    "recipient",
    "recipient.commonName",
    "issuedAt",
    "issuerCertificate",
    "protocolVersion",
    "data",
    "signature",
    "signatureAlgorithm",
    "canonicalizationMethod",
];

/// Required fields of the embedded `issuerCertificate`.
const REQUIRED_CERTIFICATE_FIELDS: [&str; 11] = [
    "serialNumber",
    "issuer",
    "subject",
    "issuedAt",
    "expiresAt",
    "subjectPublicKey",
    "publicKeyAlgorithm",
    "keyUsage",
    "signature",
    "signatureAlgorithm",
    "version",
];

/// Which checks to run and the trust set for the issuer check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CouponVerifyOptions {
    pub check_expiry: bool,
    pub verify_signature: bool,
    pub validate_format: bool,
    pub check_trusted_issuer: bool,
    pub trusted_issuers: BTreeSet<String>,
}

impl Default for CouponVerifyOptions {
    fn default() -> Self {
        Self {
            check_expiry: true,
            verify_signature: true,
            validate_format: true,
            check_trusted_issuer: false,
            trusted_issuers: BTreeSet::new(),
        }
    }
}

impl CouponVerifyOptions {
    /// Enable the trusted-issuer check against `issuers`.
    pub fn with_trusted_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_trusted_issuer = true;
        self.trusted_issuers = issuers.into_iter().map(Into::into).collect();
        self
    }
}

/// Name of a pipeline stage. Ordered as the pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckKind {
    Format,
    Expiry,
    TrustedIssuer,
    Signature,
}

impl CheckKind {
    /// Wire name of the check.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Expiry => "expiry",
            Self::TrustedIssuer => "trustedIssuer",
            Self::Signature => "signature",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationCheck {
    fn passed() -> Self {
        Self {
            passed: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            passed: false,
            error: Some(error),
        }
    }
}

/// Structured outcome of [`CouponVerifier::verify_comprehensive`].
///
/// Header fields are `None` only when verifying raw JSON that lacks them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub id: Option<Uuid>,
    pub issuer: Option<DistinguishedName>,
    pub recipient: Option<DistinguishedName>,
    pub issued_at: Option<Timestamp>,
    pub verified: bool,
    pub checks: BTreeMap<CheckKind, VerificationCheck>,
}

impl VerificationResult {
    fn for_coupon(coupon: &Coupon) -> Self {
        Self {
            id: Some(coupon.id),
            issuer: Some(coupon.issuer.clone()),
            recipient: Some(coupon.recipient.clone()),
            issued_at: Some(coupon.issued_at),
            verified: false,
            checks: BTreeMap::new(),
        }
    }

    /// Best-effort header extraction from untrusted JSON.
    fn for_value(value: &Value) -> Self {
        fn field<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
            value
                .get(key)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }
        Self {
            id: field(value, "id"),
            issuer: field(value, "issuer"),
            recipient: field(value, "recipient"),
            issued_at: field(value, "issuedAt"),
            verified: false,
            checks: BTreeMap::new(),
        }
    }

    /// The recorded outcome of `kind`, if that stage ran.
    pub fn check(&self, kind: CheckKind) -> Option<&VerificationCheck> {
        self.checks.get(&kind)
    }

    /// The first failed check and its error, if any.
    pub fn failure(&self) -> Option<(CheckKind, &str)> {
        self.checks
            .iter()
            .find(|(_, c)| !c.passed)
            .map(|(k, c)| (*k, c.error.as_deref().unwrap_or_default()))
    }

    /// Record `outcome` under `kind`; returns whether the pipeline continues.
    fn record(&mut self, kind: CheckKind, outcome: Result<(), CouponError>) -> bool {
        match outcome {
            Ok(()) => {
                self.checks.insert(kind, VerificationCheck::passed());
                true
            }
            Err(e) => {
                tracing::debug!(
                    coupon_id = ?self.id,
                    check = %kind,
                    error = %e,
                    "coupon verification check failed"
                );
                self.checks.insert(kind, VerificationCheck::failed(e.to_string()));
                false
            }
        }
    }
}

impl CouponVerifier {
    /// Run the pipeline against the current time.
    pub fn verify_comprehensive(
        &self,
        coupon: &Coupon,
        options: &CouponVerifyOptions,
    ) -> VerificationResult {
        self.verify_comprehensive_at(coupon, options, Timestamp::now())
    }

    /// Run the pipeline with an explicit clock.
    pub fn verify_comprehensive_at(
        &self,
        coupon: &Coupon,
        options: &CouponVerifyOptions,
        now: Timestamp,
    ) -> VerificationResult {
        let mut result = VerificationResult::for_coupon(coupon);
        let verified = (!options.validate_format
            || result.record(CheckKind::Format, check_format(coupon).map_err(Into::into)))
            && (!options.check_expiry || result.record(CheckKind::Expiry, check_expiry(coupon, now)))
            && (!options.check_trusted_issuer
                || result.record(CheckKind::TrustedIssuer, check_issuer(coupon, options)))
            && (!options.verify_signature
                || result.record(
                    CheckKind::Signature,
                    self.signature_outcome(coupon).map_err(Into::into),
                ));
        result.verified = verified;
        result
    }

    /// Run the pipeline on untrusted JSON against the current time.
    pub fn verify_json(&self, value: &Value, options: &CouponVerifyOptions) -> VerificationResult {
        self.verify_json_at(value, options, Timestamp::now())
    }

    /// Run the pipeline on untrusted JSON with an explicit clock.
    ///
    /// With format validation on, the first missing required key is reported
    /// by its dotted path. Input that still fails to deserialize is recorded
    /// as a failed `format` check whether or not format validation is on.
    pub fn verify_json_at(
        &self,
        value: &Value,
        options: &CouponVerifyOptions,
        now: Timestamp,
    ) -> VerificationResult {
        let mut result = VerificationResult::for_value(value);
        if options.validate_format {
            if let Err(e) = check_required_keys(value) {
                result.record(CheckKind::Format, Err(e.into()));
                return result;
            }
        }
        match serde_json::from_value::<Coupon>(value.clone()) {
            Ok(coupon) => self.verify_comprehensive_at(&coupon, options, now),
            Err(e) => {
                let err = ValidationError::Malformed {
                    field: "coupon".into(),
                    reason: e.to_string(),
                };
                result.record(CheckKind::Format, Err(err.into()));
                result
            }
        }
    }
}

/// Presence check on raw JSON. Absent and `null` both count as missing.
fn check_required_keys(value: &Value) -> Result<(), ValidationError> {
    let missing = |root: &Value, path: &str| {
        path.split('.')
            .try_fold(root, |v, key| v.get(key))
            .map_or(true, Value::is_null)
    };
    if let Some(field) = REQUIRED_COUPON_FIELDS.iter().find(|f| missing(value, **f)) {
        return Err(ValidationError::MissingField((*field).to_string()));
    }
    let cert = &value["issuerCertificate"];
    if let Some(field) = REQUIRED_CERTIFICATE_FIELDS.iter().find(|f| missing(cert, **f)) {
        return Err(ValidationError::MissingField(format!("issuerCertificate.{field}")));
    }
    Ok(())
}

/// Typed format check: required strings non-empty, id non-nil.
fn check_format(coupon: &Coupon) -> Result<(), ValidationError> {
    let missing = |field: &str| Err(ValidationError::MissingField(field.to_string()));
    if coupon.id.is_nil() {
        return missing("id");
    }
    if coupon.issuer.common_name.is_empty() {
        return missing("issuer.commonName");
    }
    if coupon.recipient.common_name.is_empty() {
        return missing("recipient.commonName");
    }
    if coupon.protocol_version.is_empty() {
        return missing("protocolVersion");
    }
    if coupon.signature.is_empty() {
        return missing("signature");
    }
    if coupon.signature_algorithm.is_empty() {
        return missing("signatureAlgorithm");
    }
    if coupon.canonicalization_method.is_empty() {
        return missing("canonicalizationMethod");
    }
    check_certificate_format(&coupon.issuer_certificate)
}

fn check_certificate_format(cert: &Certificate) -> Result<(), ValidationError> {
    let empty_fields = [
        ("serialNumber", cert.serial_number.is_empty()),
        ("issuer", cert.issuer.common_name.is_empty()),
        ("subject", cert.subject.common_name.is_empty()),
        ("subjectPublicKey", cert.subject_public_key.is_empty()),
        ("publicKeyAlgorithm", cert.public_key_algorithm.is_empty()),
        ("keyUsage", cert.key_usage.is_empty()),
        ("signature", cert.signature.is_empty()),
        ("signatureAlgorithm", cert.signature_algorithm.is_empty()),
        ("version", cert.version == 0),
    ];
    match empty_fields.iter().find(|(_, empty)| *empty) {
        Some((field, _)) => Err(ValidationError::MissingField(format!(
            "issuerCertificate.{field}"
        ))),
        None => Ok(()),
    }
}

fn check_expiry(coupon: &Coupon, now: Timestamp) -> Result<(), CouponError> {
    match coupon.expires_at {
        Some(expires_at) if expires_at < now => Err(CouponError::Expired { expires_at }),
        _ => Ok(()),
    }
}

fn check_issuer(coupon: &Coupon, options: &CouponVerifyOptions) -> Result<(), CouponError> {
    if issuer_is_trusted(&options.trusted_issuers, &coupon.issuer.common_name) {
        Ok(())
    } else {
        Err(CouponError::UntrustedIssuer {
            common_name: coupon.issuer.common_name.clone(),
        })
    }
}
