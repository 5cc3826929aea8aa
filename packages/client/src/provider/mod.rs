//! DNS-hosting provider access
//!
//! [`RecordRepository`] is the seam the sync engine talks to;
//! [`CloudflareRepository`] implements it over the Cloudflare v4 HTTP API.

pub mod cloudflare;
pub mod traits;
pub mod transport;
pub mod wire;

pub use cloudflare::CloudflareRepository;
pub use traits::{ExistingRecord, Record, RecordRepository, TlsaData, Zone, find_existing, select_zone};
pub use transport::{HttpReply, HttpsTransport};
