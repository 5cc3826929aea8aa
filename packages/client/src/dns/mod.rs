//! DNS-side verification of published records

pub mod propagation;

pub use propagation::{PropagationReport, PropagationVerifier, ResolverAnswer, ResolverPanel};
