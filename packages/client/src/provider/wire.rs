//! Cloudflare v4 JSON shapes
//!
//! These types exist only at the HTTP boundary; the adapter converts them to the
//! domain types of [`super::traits`] right after decoding.

use serde::{Deserialize, Serialize};

use super::traits::{Record, TlsaData, Zone};
use crate::tlsa::RecordDescriptor;

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    pub result: Option<T>,
    pub result_info: Option<ResultInfo>,
}

impl<T> Envelope<T> {
    /// Provider error messages joined for display
    #[must_use]
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "request was not successful".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct ZoneWire {
    pub id: String,
    pub name: String,
}

impl From<ZoneWire> for Zone {
    fn from(wire: ZoneWire) -> Self {
        Zone {
            id: wire.id,
            name: wire.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsaDataWire {
    pub usage: u8,
    pub selector: u8,
    pub matching_type: u8,
    pub certificate: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordWire {
    pub id: String,
    #[serde(default)]
    pub zone_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub rr_type: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RecordWire {
    /// Convert to a domain record, reading TLSA rdata when it is well-formed
    #[must_use]
    pub fn into_record(self, zone_id: &str) -> Record {
        let tlsa = if self.rr_type.eq_ignore_ascii_case("TLSA") {
            self.data
                .and_then(|value| serde_json::from_value::<TlsaDataWire>(value).ok())
                .map(|d| TlsaData {
                    usage: d.usage,
                    selector: d.selector,
                    matching_type: d.matching_type,
                    certificate: d.certificate,
                })
        } else {
            None
        };

        Record {
            id: self.id,
            zone_id: self.zone_id.unwrap_or_else(|| zone_id.to_string()),
            name: self.name,
            rr_type: self.rr_type,
            ttl: self.ttl,
            tlsa,
        }
    }
}

/// Result body of create and delete calls
#[derive(Debug, Deserialize)]
pub struct RecordId {
    pub id: String,
}

/// Request body of create and update calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(rename = "type")]
    pub rr_type: String,
    pub name: String,
    pub data: TlsaDataWire,
    pub ttl: u32,
    pub priority: u16,
    pub proxied: bool,
    pub comment: String,
}

impl From<&RecordDescriptor> for RecordPayload {
    fn from(descriptor: &RecordDescriptor) -> Self {
        let association = &descriptor.association;
        RecordPayload {
            rr_type: descriptor.rr_type().to_string(),
            name: descriptor.owner.fqdn(),
            data: TlsaDataWire {
                usage: association.usage().value(),
                selector: association.selector().value(),
                matching_type: association.matching_type().value(),
                certificate: association.data().to_string(),
            },
            ttl: descriptor.ttl,
            priority: descriptor.priority,
            proxied: descriptor.proxied,
            comment: descriptor.comment.clone(),
        }
    }
}
