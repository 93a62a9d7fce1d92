//! # Self-Signed Certificates
//!
//! Issues and checks the placeholder certificates embedded in coupons. A
//! certificate here is a signed statement "this distinguished name holds this
//! Ed25519 key"; issuer equals subject and no chain is ever built.
//!
//! The coupon verification pipeline only reads `subjectPublicKey` from the
//! embedded certificate. [`verify_certificate_self_signature`] is available
//! to callers that want to reject certificates whose own signature is broken.

use std::collections::BTreeSet;

use chrono::Duration;
use coupon_core::{
    Certificate, CryptoError, DistinguishedName, KeyUsage, Timestamp, CERTIFICATE_VERSION,
};
use rand_core::RngCore;

use crate::ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, SIGNATURE_ALGORITHM};

/// Issue a self-signed certificate for `subject`, valid from now for `validity`.
pub fn issue_self_signed_certificate(
    subject: DistinguishedName,
    key: &Ed25519KeyPair,
    validity: Duration,
) -> Result<Certificate, CryptoError> {
    issue_self_signed_certificate_at(subject, key, Timestamp::now(), validity)
}

/// Issue a self-signed certificate with an explicit `issued_at`.
pub fn issue_self_signed_certificate_at(
    subject: DistinguishedName,
    key: &Ed25519KeyPair,
    issued_at: Timestamp,
    validity: Duration,
) -> Result<Certificate, CryptoError> {
    let expires_at = issued_at.checked_add(validity).ok_or_else(|| {
        CryptoError::KeyError(format!("validity period overflows: {validity}"))
    })?;
    let key_usage: BTreeSet<KeyUsage> = [KeyUsage::DigitalSignature, KeyUsage::NonRepudiation]
        .into_iter()
        .collect();

    let mut certificate = Certificate {
        serial_number: random_serial_number(),
        issuer: subject.clone(),
        subject,
        issued_at,
        expires_at,
        subject_public_key: key.public_key().to_pem()?,
        public_key_algorithm: SIGNATURE_ALGORITHM.to_string(),
        key_usage,
        extended_key_usage: None,
        crl_distribution_point: None,
        ocsp_url: None,
        signature: String::new(),
        signature_algorithm: SIGNATURE_ALGORITHM.to_string(),
        version: CERTIFICATE_VERSION,
    };
    let input = certificate.signing_input()?;
    certificate.signature = key.sign(&input).to_base64();
    Ok(certificate)
}

/// Extract the subject's Ed25519 public key.
///
/// # Errors
///
/// `UnsupportedAlgorithm` if `publicKeyAlgorithm` is not Ed25519, `KeyError`
/// if the PEM does not parse.
pub fn certificate_public_key(certificate: &Certificate) -> Result<Ed25519PublicKey, CryptoError> {
    if certificate.public_key_algorithm != SIGNATURE_ALGORITHM {
        return Err(CryptoError::UnsupportedAlgorithm(format!(
            "certificate public key algorithm {:?}",
            certificate.public_key_algorithm
        )));
    }
    Ed25519PublicKey::from_pem(&certificate.subject_public_key)
}

/// Check that a certificate is self-signed by the key it certifies.
pub fn verify_certificate_self_signature(certificate: &Certificate) -> Result<(), CryptoError> {
    if certificate.signature_algorithm != SIGNATURE_ALGORITHM {
        return Err(CryptoError::UnsupportedAlgorithm(format!(
            "certificate signature algorithm {:?}",
            certificate.signature_algorithm
        )));
    }
    if !certificate.is_self_signed() {
        return Err(CryptoError::VerificationFailed(
            "certificate issuer does not match subject".into(),
        ));
    }
    let public_key = certificate_public_key(certificate)?;
    let signature = Ed25519Signature::from_base64(&certificate.signature)?;
    let input = certificate.signing_input()?;
    verify(&input, &signature, &public_key)
}

/// 128 random bits, lowercase hex.
fn random_serial_number() -> String {
    let mut bytes = [0u8; 16];
    rand_core::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
