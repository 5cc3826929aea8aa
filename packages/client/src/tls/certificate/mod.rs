//! Certificate chain loading and public key classification

pub mod key;
pub mod parser;

pub use key::KeyAlgorithm;
pub use parser::{CertificateChain, ChainCertificate};
