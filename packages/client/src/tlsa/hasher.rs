//! Association data computation

use der::Encode;
use ring::digest;

use super::types::{Association, MatchingType, Selector, Usage};
use crate::error::{Result, certificate_parse};
use crate::tls::{CertificateChain, ChainCertificate, KeyAlgorithm};

/// Hex digest of the selected content of one certificate
///
/// # Errors
///
/// Returns `SyncError::UnsupportedKeyType` when selector 1 is requested for a key
/// algorithm outside RSA/EC/Ed25519/Ed448, or `SyncError::CertificateParse` if
/// the SubjectPublicKeyInfo cannot be re-encoded.
pub fn hash_certificate(cert: &ChainCertificate, selector: Selector, matching_type: MatchingType) -> Result<String> {
    let spki_der;
    let content: &[u8] = match selector {
        Selector::FullCertificate => cert.der(),
        Selector::SubjectPublicKeyInfo => {
            KeyAlgorithm::of_certificate(cert.parsed())?;
            spki_der = cert
                .parsed()
                .tbs_certificate
                .subject_public_key_info
                .to_der()
                .map_err(|e| certificate_parse(format!("Failed to encode public key: {e}")))?;
            &spki_der
        }
    };

    let algorithm = match matching_type {
        MatchingType::Sha256 => &digest::SHA256,
        MatchingType::Sha512 => &digest::SHA512,
    };
    Ok(hex::encode(digest::digest(algorithm, content)))
}

/// Association for `usage`, hashing the chain certificate that usage publishes
///
/// # Errors
///
/// See [`hash_certificate`].
pub fn associate(
    chain: &CertificateChain,
    usage: Usage,
    selector: Selector,
    matching_type: MatchingType,
) -> Result<Association> {
    let cert = chain.for_usage(usage);
    let data = hash_certificate(cert, selector, matching_type)?;
    tracing::trace!(usage = %usage, subject = %cert.subject(), "Computed association data");
    Association::new(usage, selector, matching_type, data)
}
