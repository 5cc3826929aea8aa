//! Public key algorithm classification for SubjectPublicKeyInfo selection

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION};
use const_oid::db::rfc8410::{ID_ED_25519, ID_ED_448};
use x509_cert::Certificate;

use crate::error::{Result, SyncError};

/// Key algorithms whose SubjectPublicKeyInfo may be published in a TLSA record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
    Ed25519,
    Ed448,
}

impl KeyAlgorithm {
    /// Classify an algorithm OID
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnsupportedKeyType` for DSA, DH, X25519/X448 and any
    /// OID not listed above.
    pub fn from_oid(oid: &ObjectIdentifier) -> Result<Self> {
        match oid {
            o if *o == RSA_ENCRYPTION => Ok(KeyAlgorithm::Rsa),
            o if *o == ID_EC_PUBLIC_KEY => Ok(KeyAlgorithm::Ec),
            o if *o == ID_ED_25519 => Ok(KeyAlgorithm::Ed25519),
            o if *o == ID_ED_448 => Ok(KeyAlgorithm::Ed448),
            _ => Err(SyncError::UnsupportedKeyType {
                algorithm: algorithm_name(oid),
            }),
        }
    }

    /// Classify the subject key of a certificate
    ///
    /// # Errors
    ///
    /// See [`KeyAlgorithm::from_oid`].
    pub fn of_certificate(cert: &Certificate) -> Result<Self> {
        Self::from_oid(&cert.tbs_certificate.subject_public_key_info.algorithm.oid)
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Ed25519 => "Ed25519",
            KeyAlgorithm::Ed448 => "Ed448",
        };
        f.write_str(name)
    }
}

/// Registered name of an OID, or its dotted form
fn algorithm_name(oid: &ObjectIdentifier) -> String {
    match const_oid::db::DB.by_oid(oid) {
        Some(name) => format!("{name} ({oid})"),
        None => oid.to_string(),
    }
}
