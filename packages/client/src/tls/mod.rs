//! Certificate chains and the TLS client used for provider calls

pub mod certificate;
pub mod tls_manager;

pub use certificate::{CertificateChain, ChainCertificate, KeyAlgorithm};
pub use tls_manager::TlsManager;
