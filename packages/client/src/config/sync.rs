//! Record synchronization defaults

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// TTL given to new and updated records
    pub default_ttl: u32,
    pub priority: u16,
    /// Tool name written into the record comment
    pub comment_tag: String,
    /// TTL assumed for the rollover wait when the existing record reports 0
    pub fallback_rollover_ttl: u32,
    /// Upper bound for a whole rollover task; `None` waits as long as it takes
    pub rollover_deadline: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_ttl: 3600,
            priority: 10,
            comment_tag: "tlsaflare".to_string(),
            fallback_rollover_ttl: 3600,
            rollover_deadline: None,
        }
    }
}

impl SyncConfig {
    /// Rollover wait for an existing record with the given TTL
    #[must_use]
    pub fn rollover_wait(&self, existing_ttl: u32) -> Duration {
        let ttl = if existing_ttl == 0 {
            self.fallback_rollover_ttl
        } else {
            existing_ttl
        };
        Duration::from_secs(u64::from(ttl) * 2)
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error string if a TTL is zero, the comment tag is blank or the
    /// deadline is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_ttl == 0 {
            return Err("default_ttl must be greater than 0".to_string());
        }

        if self.fallback_rollover_ttl == 0 {
            return Err("fallback_rollover_ttl must be greater than 0".to_string());
        }

        if self.comment_tag.trim().is_empty() {
            return Err("comment_tag must not be empty".to_string());
        }

        if self.rollover_deadline.is_some_and(|d| d.is_zero()) {
            return Err("rollover_deadline must be greater than 0".to_string());
        }

        Ok(())
    }
}
