//! Error types for certificate loading, provider access and record synchronization

/// A Result alias where the Err case is [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors produced while deriving TLSA data or synchronizing it with the provider.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Malformed PEM or DER input
    #[error("Certificate parsing failed: {0}")]
    CertificateParse(String),

    /// The certificate's public key algorithm cannot be used for SPKI association data
    #[error("Unsupported public key type: {algorithm}")]
    UnsupportedKeyType { algorithm: String },

    /// Selector, matching type or request parameter outside the accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No provider zone covers the requested domain
    #[error("No matching zone found for domain '{domain}'")]
    ZoneNotFound { domain: String },

    /// Update or rollover target is missing
    #[error("Could not find existing TLSA record with usage {usage} for {owner}")]
    RecordNotFound { owner: String, usage: u8 },

    /// Create was asked for an (owner, usage) that already has a record
    #[error("TLSA record with usage {usage} already exists for {owner} (record {record_id})")]
    DuplicateRecord {
        owner: String,
        usage: u8,
        record_id: String,
    },

    /// Transport, HTTP status or response envelope failure from the provider API
    #[error("Provider API {operation} failed: {message}")]
    ProviderApi {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// At least one resolver of the panel could not be queried
    #[error("DNS propagation check failed for {owner}: {message}")]
    PropagationCheck { owner: String, message: String },

    /// The superseded record survived the rollover; the new record was kept
    #[error("Failed to delete old record {record_id} for {owner}: {source}")]
    DeleteFailed {
        owner: String,
        record_id: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Rollover for {owner} was cancelled before the old record was deleted")]
    RolloverCancelled { owner: String },

    #[error("Rollover for {owner} did not finish within {deadline_secs}s")]
    RolloverDeadline { owner: String, deadline_secs: u64 },

    /// The background rollover task ended without reporting back
    #[error("Rollover task for {owner} terminated unexpectedly")]
    RolloverTask { owner: String },

    /// One or more (port, usage) pairs of a batch failed
    #[error("{failed} of {total} TLSA operations failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// HTTP status reported by the provider, when the failure came with one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::ProviderApi { status, .. } => *status,
            SyncError::DeleteFailed { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether this error is raised before any provider or DNS traffic happens
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SyncError::CertificateParse(_)
                | SyncError::UnsupportedKeyType { .. }
                | SyncError::InvalidParameter(_)
                | SyncError::Configuration(_)
                | SyncError::Io(_)
        )
    }
}
