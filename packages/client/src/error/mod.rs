pub mod constructors;
pub mod types;

// Re-export main types and functions
pub use constructors::*;
pub use types::{Result, SyncError};
