//! tlsaflare prelude
//!
//! The types needed to load a chain, configure the collaborators and run a batch.

pub use crate::config::{PropagationConfig, ProviderConfig, SyncConfig};
pub use crate::dns::{PropagationVerifier, ResolverPanel};
pub use crate::error::{Result, SyncError};
pub use crate::provider::{CloudflareRepository, RecordRepository};
pub use crate::sync::{BatchReport, PairReport, PairStatus, SyncEngine, SyncEvent, SyncRequest};
pub use crate::tls::CertificateChain;
pub use crate::tlsa::{MatchingType, Selector, SelectorChoice, TlsaPolicy, Usage};
