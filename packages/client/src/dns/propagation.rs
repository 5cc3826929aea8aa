//! TLSA propagation checks against a panel of public recursive resolvers
//!
//! This is a liveness check: every resolver has to answer, but an empty answer
//! (NOERROR/NODATA or NXDOMAIN) counts as an answer. The record content is not
//! compared.

use std::fmt::Debug;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{ResolveError, Resolver, TokioResolver};
use tracing::{debug, warn};

use crate::config::PropagationConfig;
use crate::error::{Result, configuration, propagation};

/// Outcome of one resolver query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverAnswer {
    pub resolver: IpAddr,
    /// TLSA records in the answer; zero for NODATA/NXDOMAIN
    pub records: usize,
}

/// Answers of a fully successful check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    pub owner: String,
    pub answers: Vec<ResolverAnswer>,
}

impl PropagationReport {
    /// Resolvers that already return at least one TLSA record
    #[must_use]
    pub fn resolvers_with_records(&self) -> usize {
        self.answers.iter().filter(|a| a.records > 0).count()
    }
}

/// Checks whether a TLSA RRset is visible from outside
#[async_trait]
pub trait PropagationVerifier: Send + Sync + Debug {
    /// # Errors
    ///
    /// Returns `SyncError::PropagationCheck` listing every resolver that failed.
    async fn verify(&self, owner_fqdn: &str) -> Result<PropagationReport>;
}

/// One uncached resolver per panel member, queried concurrently
#[derive(Debug)]
pub struct ResolverPanel {
    resolvers: Vec<(IpAddr, TokioResolver)>,
}

impl ResolverPanel {
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if the config does not validate.
    pub fn new(config: &PropagationConfig) -> Result<Self> {
        config.validate().map_err(configuration)?;
        let resolvers = config
            .resolvers
            .iter()
            .map(|ip| (*ip, create_resolver(SocketAddr::new(*ip, config.port), config)))
            .collect();
        Ok(Self { resolvers })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

/// UDP first, TCP when the answer is truncated; caching disabled
fn create_resolver(address: SocketAddr, config: &PropagationConfig) -> TokioResolver {
    let mut resolver_config = ResolverConfig::new();
    resolver_config.add_name_server(NameServerConfig::new(address, Protocol::Udp));
    resolver_config.add_name_server(NameServerConfig::new(address, Protocol::Tcp));

    let mut opts = ResolverOpts::default();
    opts.timeout = config.timeout;
    opts.attempts = config.attempts;
    opts.cache_size = 0;
    opts.recursion_desired = true;

    Resolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
        .with_options(opts)
        .build()
}

/// Empty answers are still answers
fn is_empty_answer(error: &ResolveError) -> bool {
    error.is_no_records_found() || error.is_nx_domain()
}

#[async_trait]
impl PropagationVerifier for ResolverPanel {
    async fn verify(&self, owner_fqdn: &str) -> Result<PropagationReport> {
        let name = format!("{}.", owner_fqdn.trim_end_matches('.'));

        let queries = self.resolvers.iter().map(|(ip, resolver)| {
            let name = name.clone();
            async move {
                let outcome = match resolver.lookup(name.as_str(), RecordType::TLSA).await {
                    Ok(lookup) => Ok(lookup.record_iter().filter(|r| r.record_type() == RecordType::TLSA).count()),
                    Err(e) if is_empty_answer(&e) => Ok(0),
                    Err(e) => Err(e.to_string()),
                };
                (*ip, outcome)
            }
        });

        let mut answers = Vec::new();
        let mut failures = Vec::new();
        for (resolver, outcome) in join_all(queries).await {
            match outcome {
                Ok(records) => {
                    debug!(owner = %owner_fqdn, resolver = %resolver, records, "Resolver answered");
                    answers.push(ResolverAnswer { resolver, records });
                }
                Err(e) => {
                    warn!(owner = %owner_fqdn, resolver = %resolver, error = %e, "Resolver query failed");
                    failures.push(format!("{resolver}: {e}"));
                }
            }
        }

        if !failures.is_empty() {
            return Err(propagation(owner_fqdn, failures.join("; ")));
        }

        Ok(PropagationReport {
            owner: owner_fqdn.to_string(),
            answers,
        })
    }
}
