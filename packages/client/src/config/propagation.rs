//! Resolver panel configuration for propagation checks

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Public recursive resolvers queried after a rollover wait
pub const DEFAULT_RESOLVERS: [IpAddr; 4] = [
    IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
    IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
    IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9)),
    IpAddr::V4(Ipv4Addr::new(208, 67, 222, 222)),
];

#[derive(Debug, Clone)]
pub struct PropagationConfig {
    pub resolvers: Vec<IpAddr>,
    pub port: u16,
    /// Per-query timeout
    pub timeout: Duration,
    pub attempts: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            resolvers: DEFAULT_RESOLVERS.to_vec(),
            port: 53,
            timeout: Duration::from_secs(5),
            attempts: 2,
        }
    }
}

impl PropagationConfig {
    /// Panel made of the given resolvers, all on the same port
    #[must_use]
    pub fn with_resolvers(resolvers: Vec<IpAddr>, port: u16) -> Self {
        Self {
            resolvers,
            port,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error string if the panel is empty, the port or timeout is zero,
    /// or no attempt would be made.
    pub fn validate(&self) -> Result<(), String> {
        if self.resolvers.is_empty() {
            return Err("resolver panel must contain at least one resolver".to_string());
        }

        if self.port == 0 {
            return Err("resolver port must be greater than 0".to_string());
        }

        if self.timeout.is_zero() {
            return Err("query timeout must be greater than 0".to_string());
        }

        if self.attempts == 0 {
            return Err("attempts must be greater than 0".to_string());
        }

        Ok(())
    }
}
