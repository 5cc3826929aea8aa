//! Configuration for the provider adapter, the resolver panel and the sync engine
//!
//! Every config carries a `Default` matching the command-line defaults and a
//! `validate()` that is checked before any network traffic starts.

pub mod propagation;
pub mod provider;
pub mod sync;

pub use propagation::{DEFAULT_RESOLVERS, PropagationConfig};
pub use provider::{CLOUDFLARE_API_BASE, ProviderConfig};
pub use sync::SyncConfig;
