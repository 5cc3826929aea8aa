//! TLSA association data and record descriptors

pub mod descriptor;
pub mod hasher;
pub mod types;

pub use descriptor::{Action, OwnerName, RR_TYPE, RecordDescriptor};
pub use hasher::{associate, hash_certificate};
pub use types::{Association, MatchingType, Selector, SelectorChoice, TlsaPolicy, Usage};
