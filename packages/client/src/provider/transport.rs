//! HTTP/1.1 request/response exchange with the provider API
//!
//! One connection per request; the provider sees a handful of calls per run so
//! there is no pooling.

use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use url::{Host, Url};
use zeroize::Zeroizing;

use crate::config::ProviderConfig;
use crate::error::{Result, configuration, transport};
use crate::tls::TlsManager;

/// Status and body of a completed exchange
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Authenticated HTTP client for a single API host
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    tls: TlsManager,
    token: Zeroizing<String>,
    user_agent: String,
    timeout: Duration,
}

impl HttpsTransport {
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if the TLS client cannot be set up.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            tls: TlsManager::new(config.use_native_certs)?,
            token: config.token.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
        })
    }

    /// Send one request and collect the full response body
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ProviderApi` without a status when the connection,
    /// handshake or body transfer fails, or when the timeout elapses.
    pub async fn send(
        &self,
        operation: &'static str,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
    ) -> Result<HttpReply> {
        tracing::debug!(operation, method = %method, url = %url, "Sending provider request");
        match tokio::time::timeout(self.timeout, self.exchange(operation, method, url, body)).await {
            Ok(reply) => reply,
            Err(_) => Err(transport(
                operation,
                format!("request timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }

    async fn exchange(
        &self,
        operation: &'static str,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
    ) -> Result<HttpReply> {
        let host = url
            .host_str()
            .ok_or_else(|| configuration(format!("URL '{url}' has no host")))?;
        let dial = dial_host(url)?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| configuration(format!("URL '{url}' has no port")))?;

        let request = self.build_request(method, url, host, body)?;

        let tcp_stream = TcpStream::connect((dial.as_str(), port))
            .await
            .map_err(|e| transport(operation, format!("Failed to connect to {host}:{port}: {e}")))?;
        let _ = tcp_stream.set_nodelay(true);

        match url.scheme() {
            "https" => {
                let tls_stream = self.tls.connect(&dial, tcp_stream).await?;
                send_over(operation, TokioIo::new(tls_stream), request).await
            }
            "http" => send_over(operation, TokioIo::new(tcp_stream), request).await,
            other => Err(configuration(format!("unsupported URL scheme '{other}'"))),
        }
    }

    fn build_request(&self, method: Method, url: &Url, host: &str, body: Option<Vec<u8>>) -> Result<Request<Full<Bytes>>> {
        let host_header = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut builder = Request::builder()
            .method(method)
            .uri(&url[url::Position::BeforePath..])
            .header(HOST, host_header)
            .header(AUTHORIZATION, format!("Bearer {}", self.token.as_str()))
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json");

        let body = match body {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Bytes::from(bytes)
            }
            None => Bytes::new(),
        };

        builder.body(Full::new(body)).map_err(configuration)
    }
}

/// Host to dial and to present as TLS server name; IPv6 literals without brackets
fn dial_host(url: &Url) -> Result<String> {
    match url.host() {
        Some(Host::Domain(domain)) => Ok(domain.to_string()),
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        None => Err(configuration(format!("URL '{url}' has no host"))),
    }
}

async fn send_over<S>(operation: &'static str, io: S, request: Request<Full<Bytes>>) -> Result<HttpReply>
where
    S: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| transport(operation, format!("HTTP handshake failed: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "Provider connection closed with error");
        }
    });

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| transport(operation, e))?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| transport(operation, format!("Failed to read response body: {e}")))?
        .to_bytes();

    Ok(HttpReply { status, body })
}
