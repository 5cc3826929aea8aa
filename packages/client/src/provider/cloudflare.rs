//! Cloudflare v4 record repository
//!
//! Zones and records are listed page by page until `result_info.total_pages` is
//! reached. Any HTTP status of 400 or above, and any envelope with
//! `success: false`, becomes `SyncError::ProviderApi` carrying the status and the
//! provider's error messages.

use async_trait::async_trait;
use http::Method;
use serde::de::DeserializeOwned;
use url::Url;

use super::traits::{Record, RecordRepository, Zone};
use super::transport::{HttpReply, HttpsTransport};
use super::wire::{Envelope, RecordId, RecordPayload, RecordWire, ZoneWire};
use crate::config::ProviderConfig;
use crate::error::{Result, SyncError, configuration, decode, provider_status};
use crate::tlsa::RecordDescriptor;

const ZONES_PER_PAGE: u32 = 50;
const RECORDS_PER_PAGE: u32 = 100;
/// Stop paging even if the provider keeps reporting more pages
const MAX_PAGES: u32 = 1000;

#[derive(Debug, Clone)]
pub struct CloudflareRepository {
    api_base: Url,
    transport: HttpsTransport,
}

impl CloudflareRepository {
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if the config does not validate or the
    /// TLS client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate().map_err(configuration)?;
        if config.api_base.cannot_be_a_base() {
            return Err(configuration(format!("API base '{}' cannot be a base URL", config.api_base)));
        }
        Ok(Self {
            api_base: config.api_base.clone(),
            transport: HttpsTransport::new(config)?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| configuration("API base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
    ) -> Result<Envelope<T>> {
        let logs_status = method != Method::GET;
        let reply = self.transport.send(operation, method, url, body).await?;
        if logs_status {
            tracing::info!(operation, status = reply.status.as_u16(), "Provider response");
        } else {
            tracing::debug!(operation, status = reply.status.as_u16(), "Provider response");
        }
        parse_reply(operation, &reply)
    }

    async fn get_all<W: DeserializeOwned>(&self, operation: &'static str, segments: &[&str], per_page: u32) -> Result<Vec<W>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.endpoint(segments)?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &per_page.to_string());

            let envelope: Envelope<Vec<W>> = self.call(operation, Method::GET, &url, None).await?;
            items.extend(envelope.result.unwrap_or_default());

            let total_pages = envelope.result_info.map_or(1, |info| info.total_pages);
            if page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

/// Decode an envelope, turning HTTP and provider-level failures into errors
fn parse_reply<T: DeserializeOwned>(operation: &'static str, reply: &HttpReply) -> Result<Envelope<T>> {
    let status = reply.status.as_u16();
    let envelope = serde_json::from_slice::<Envelope<T>>(&reply.body);

    if reply.status.is_client_error() || reply.status.is_server_error() {
        let message = match &envelope {
            Ok(envelope) => envelope.error_summary(),
            Err(_) => String::from_utf8_lossy(&reply.body).trim().to_string(),
        };
        return Err(provider_status(operation, status, message));
    }

    let envelope = envelope.map_err(|e| decode(operation, e))?;
    if !envelope.success {
        return Err(provider_status(operation, status, envelope.error_summary()));
    }
    Ok(envelope)
}

fn encode(operation: &'static str, descriptor: &RecordDescriptor) -> Result<Vec<u8>> {
    serde_json::to_vec(&RecordPayload::from(descriptor)).map_err(|e| SyncError::ProviderApi {
        operation,
        status: None,
        message: format!("failed to encode request body: {e}"),
    })
}

#[async_trait]
impl RecordRepository for CloudflareRepository {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let zones: Vec<ZoneWire> = self.get_all("list zones", &["zones"], ZONES_PER_PAGE).await?;
        tracing::debug!(count = zones.len(), "Listed zones");
        Ok(zones.into_iter().map(Zone::from).collect())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>> {
        let records: Vec<RecordWire> = self
            .get_all("list records", &["zones", zone_id, "dns_records"], RECORDS_PER_PAGE)
            .await?;
        tracing::debug!(zone_id, count = records.len(), "Listed records");
        Ok(records.into_iter().map(|r| r.into_record(zone_id)).collect())
    }

    async fn create_record(&self, zone_id: &str, descriptor: &RecordDescriptor) -> Result<String> {
        const OPERATION: &str = "create record";
        let url = self.endpoint(&["zones", zone_id, "dns_records"])?;
        let body = encode(OPERATION, descriptor)?;
        let envelope: Envelope<RecordId> = self.call(OPERATION, Method::POST, &url, Some(body)).await?;
        envelope
            .result
            .map(|r| r.id)
            .ok_or_else(|| decode(OPERATION, "missing record id in result"))
    }

    async fn update_record(&self, zone_id: &str, record_id: &str, descriptor: &RecordDescriptor) -> Result<()> {
        const OPERATION: &str = "update record";
        let url = self.endpoint(&["zones", zone_id, "dns_records", record_id])?;
        let body = encode(OPERATION, descriptor)?;
        let _: Envelope<serde_json::Value> = self.call(OPERATION, Method::PUT, &url, Some(body)).await?;
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let url = self.endpoint(&["zones", zone_id, "dns_records", record_id])?;
        let _: Envelope<serde_json::Value> = self.call("delete record", Method::DELETE, &url, None).await?;
        Ok(())
    }
}
