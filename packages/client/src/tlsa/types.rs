//! TLSA field types as described by [RFC 6698](https://datatracker.ietf.org/doc/html/rfc6698)
//!
//! Only the values this tool publishes are representable: DANE-TA/DANE-EE usages
//! and the two SHA-2 matching types. Everything else is rejected while
//! converting from raw integers, before any certificate is hashed.

use std::fmt;

use crate::error::{Result, invalid_parameter};

/// Certificate usage field of a TLSA record
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Usage {
    /// Trust anchor assertion, matched against the last certificate of the chain
    DaneTa = 2,
    /// Domain-issued certificate, matched against the end-entity
    DaneEe = 3,
}

impl Usage {
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Selector used when the caller leaves it unspecified
    #[must_use]
    pub fn default_selector(self) -> Selector {
        match self {
            Usage::DaneEe => Selector::SubjectPublicKeyInfo,
            Usage::DaneTa => Selector::FullCertificate,
        }
    }
}

impl TryFrom<u8> for Usage {
    type Error = crate::error::SyncError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            2 => Ok(Usage::DaneTa),
            3 => Ok(Usage::DaneEe),
            other => Err(invalid_parameter(format!(
                "Certificate usage must be 2 (DANE-TA) or 3 (DANE-EE), got {other}"
            ))),
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Usage::DaneTa => f.write_str("DANE-TA"),
            Usage::DaneEe => f.write_str("DANE-EE"),
        }
    }
}

/// Which part of the certificate is hashed
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    FullCertificate = 0,
    SubjectPublicKeyInfo = 1,
}

impl Selector {
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Selector {
    type Error = crate::error::SyncError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Selector::FullCertificate),
            1 => Ok(Selector::SubjectPublicKeyInfo),
            other => Err(invalid_parameter(format!(
                "Selector must be 0 (full certificate) or 1 (SubjectPublicKeyInfo), got {other}"
            ))),
        }
    }
}

/// Digest applied to the selected content
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchingType {
    Sha256 = 1,
    Sha512 = 2,
}

impl MatchingType {
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Length of the hex-encoded association data
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            MatchingType::Sha256 => 64,
            MatchingType::Sha512 => 128,
        }
    }
}

impl TryFrom<u8> for MatchingType {
    type Error = crate::error::SyncError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(MatchingType::Sha256),
            2 => Ok(MatchingType::Sha512),
            _ => Err(invalid_parameter(
                "Matching type must be either 1 (SHA2-256) or 2 (SHA2-512)",
            )),
        }
    }
}

/// Selector as requested: pinned, or chosen per usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorChoice {
    Explicit(Selector),
    #[default]
    PerUsageDefault,
}

impl SelectorChoice {
    /// Interpret a command-line selector where `-1` means "unspecified"
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidParameter` for anything but -1, 0 or 1.
    pub fn from_flag(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(SelectorChoice::PerUsageDefault),
            0 | 1 => Selector::try_from(value as u8).map(SelectorChoice::Explicit),
            other => Err(invalid_parameter(format!(
                "Selector must be -1 (per-usage default), 0 or 1, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn resolve(self, usage: Usage) -> Selector {
        match self {
            SelectorChoice::Explicit(selector) => selector,
            SelectorChoice::PerUsageDefault => usage.default_selector(),
        }
    }
}

/// Selector and matching type requested for every record of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsaPolicy {
    pub selector: SelectorChoice,
    pub matching_type: MatchingType,
}

impl Default for TlsaPolicy {
    fn default() -> Self {
        Self {
            selector: SelectorChoice::PerUsageDefault,
            matching_type: MatchingType::Sha256,
        }
    }
}

impl TlsaPolicy {
    /// Validate raw flag values
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidParameter` if either value is out of range.
    pub fn from_flags(selector: i32, matching_type: i32) -> Result<Self> {
        let matching_type = u8::try_from(matching_type)
            .map_err(|_| invalid_parameter("Matching type must be either 1 (SHA2-256) or 2 (SHA2-512)"))
            .and_then(MatchingType::try_from)?;
        let selector = SelectorChoice::from_flag(selector)?;
        Ok(Self {
            selector,
            matching_type,
        })
    }
}

/// Certificate association data for one TLSA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    usage: Usage,
    selector: Selector,
    matching_type: MatchingType,
    data: String,
}

impl Association {
    /// # Errors
    ///
    /// Returns `SyncError::InvalidParameter` if `data` is not lowercase hex of the
    /// length the matching type produces.
    pub fn new(usage: Usage, selector: Selector, matching_type: MatchingType, data: String) -> Result<Self> {
        if data.len() != matching_type.hex_len() {
            return Err(invalid_parameter(format!(
                "association data must be {} hex characters, got {}",
                matching_type.hex_len(),
                data.len()
            )));
        }
        if !data.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(invalid_parameter("association data must be lowercase hex"));
        }
        Ok(Self {
            usage,
            selector,
            matching_type,
            data,
        })
    }

    #[must_use]
    pub fn usage(&self) -> Usage {
        self.usage
    }

    #[must_use]
    pub fn selector(&self) -> Selector {
        self.selector
    }

    #[must_use]
    pub fn matching_type(&self) -> MatchingType {
        self.matching_type
    }

    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl fmt::Display for Association {
    /// Presentation format: `3 1 1 <hex>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.usage.value(),
            self.selector.value(),
            self.matching_type.value(),
            self.data
        )
    }
}
