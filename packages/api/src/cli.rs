//! Command line surface
//!
//! Flag names follow the original `tlsaflare` tool so existing scripts keep
//! working: `create` and `update` share the record flags, `update` adds
//! `--rollover`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tlsaflare_client::sync::SyncRequest;
use tlsaflare_client::tlsa::{TlsaPolicy, Usage};
use tlsaflare_client::Result;

/// Create, update and roll over DANE TLSA records on Cloudflare
#[derive(Debug, Parser)]
#[command(name = "tlsaflare", author, version, about, long_about = None)]
pub struct Cli {
    /// Cloudflare API token
    #[arg(long, env = "TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create new TLSA records; fails if one already exists
    Create(RecordArgs),
    /// Replace existing TLSA records, optionally as a rollover
    Update(UpdateArgs),
}

impl Command {
    #[must_use]
    pub fn record_args(&self) -> &RecordArgs {
        match self {
            Command::Create(args) => args,
            Command::Update(args) => &args.record,
        }
    }

    /// Build the engine request for this invocation
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidParameter` for a bad selector, matching type,
    /// port set or usage set.
    pub fn sync_request(&self) -> Result<SyncRequest> {
        match self {
            Command::Create(args) => args.sync_request(false),
            Command::Update(args) => args.record.sync_request(args.rollover),
        }
    }
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub record: RecordArgs,

    /// Perform rolling update: publish the new record, wait 2x TTL, then delete the old one
    #[arg(short, long)]
    pub rollover: bool,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Domain (zone) to update
    #[arg(short = 'u', long = "url", value_name = "DOMAIN")]
    pub domain: String,

    /// TLSA subdomain, e.g. `mail`
    #[arg(short, long)]
    pub subdomain: String,

    /// Path to the PEM certificate file (full chain when using --dane-ta)
    #[arg(short = 'f', long, value_name = "FILE")]
    pub cert: PathBuf,

    /// Port 25/TCP
    #[arg(short = 't', long)]
    pub tcp25: bool,

    /// Port 465/TCP
    #[arg(short = 'p', long)]
    pub tcp465: bool,

    /// Port 587/TCP
    #[arg(short = 'e', long)]
    pub tcp587: bool,

    /// Custom TCP port; may be repeated
    #[arg(short = 'c', long = "tcp-port", value_name = "PORT")]
    pub tcp_ports: Vec<u16>,

    /// Publish a DANE-EE (usage 3) record [default]
    #[arg(long, default_value_t = true, overrides_with = "no_dane_ee")]
    pub dane_ee: bool,

    /// Do not publish a DANE-EE record
    #[arg(long, overrides_with = "dane_ee")]
    pub no_dane_ee: bool,

    /// Publish a DANE-TA (usage 2) record from the last certificate in the chain
    #[arg(long)]
    pub dane_ta: bool,

    /// TLSA selector: 0 full certificate, 1 public key, -1 per-usage default
    #[arg(short = 'l', long, default_value_t = -1, allow_negative_numbers = true)]
    pub selector: i32,

    /// TLSA matching type: 1 SHA2-256, 2 SHA2-512
    #[arg(short = 'm', long, default_value_t = 1)]
    pub matching_type: i32,
}

impl RecordArgs {
    #[must_use]
    pub fn ports(&self) -> Vec<u16> {
        let mut ports = Vec::new();
        if self.tcp25 {
            ports.push(25);
        }
        if self.tcp465 {
            ports.push(465);
        }
        if self.tcp587 {
            ports.push(587);
        }
        ports.extend(&self.tcp_ports);
        ports
    }

    #[must_use]
    pub fn usages(&self) -> Vec<Usage> {
        let mut usages = Vec::new();
        if self.dane_ee && !self.no_dane_ee {
            usages.push(Usage::DaneEe);
        }
        if self.dane_ta {
            usages.push(Usage::DaneTa);
        }
        usages
    }

    /// # Errors
    ///
    /// See [`Command::sync_request`].
    pub fn sync_request(&self, rollover: bool) -> Result<SyncRequest> {
        let policy = TlsaPolicy::from_flags(self.selector, self.matching_type)?;
        let request = SyncRequest::new(&self.domain, &self.subdomain)
            .with_ports(self.ports())
            .with_usages(self.usages())
            .with_policy(policy)
            .with_rollover(rollover);
        request.validate()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlsaflare_client::tlsa::{MatchingType, SelectorChoice};
    use tlsaflare_client::SyncError;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tlsaflare"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    const BASE: [&str; 6] = ["-u", "example.com", "-s", "mail", "-f", "fullchain.pem"];

    fn with_base(command: &str, extra: &[&str]) -> Cli {
        let mut args = vec![command];
        args.extend_from_slice(&BASE);
        args.extend_from_slice(extra);
        parse(&args)
    }

    #[test]
    fn test_create_defaults() {
        let cli = with_base("create", &["--tcp25"]);
        let request = cli.command.sync_request().unwrap();

        assert_eq!(request.ports, vec![25]);
        assert_eq!(request.usages, vec![Usage::DaneEe]);
        assert_eq!(request.policy.selector, SelectorChoice::PerUsageDefault);
        assert_eq!(request.policy.matching_type, MatchingType::Sha256);
        assert!(!request.rollover);
        assert_eq!(cli.command.record_args().cert, PathBuf::from("fullchain.pem"));
    }

    #[test]
    fn test_all_port_flags_combine() {
        let cli = with_base(
            "create",
            &["-t", "-p", "-e", "--tcp-port", "2525", "--tcp-port", "10025"],
        );
        assert_eq!(cli.command.record_args().ports(), vec![25, 465, 587, 2525, 10025]);
    }

    #[test]
    fn test_no_ports_is_rejected() {
        let cli = with_base("create", &[]);
        let err = cli.command.sync_request().unwrap_err();
        assert!(err.to_string().contains("no ports specified"));
    }

    #[test]
    fn test_usage_flags() {
        let cli = with_base("create", &["--tcp25", "--no-dane-ee", "--dane-ta"]);
        assert_eq!(cli.command.record_args().usages(), vec![Usage::DaneTa]);

        let cli = with_base("create", &["--tcp25", "--dane-ta"]);
        assert_eq!(
            cli.command.record_args().usages(),
            vec![Usage::DaneEe, Usage::DaneTa]
        );

        let cli = with_base("create", &["--tcp25", "--no-dane-ee"]);
        let err = cli.command.sync_request().unwrap_err();
        assert!(err.to_string().contains("At least one of DANE-EE or DANE-TA"));
    }

    #[test]
    fn test_update_rollover_and_explicit_policy() {
        let cli = with_base(
            "update",
            &["--tcp587", "--rollover", "--selector", "0", "--matching-type", "2"],
        );
        let request = cli.command.sync_request().unwrap();

        assert!(request.rollover);
        assert_eq!(request.policy.matching_type, MatchingType::Sha512);
        assert!(matches!(request.policy.selector, SelectorChoice::Explicit(_)));
    }

    #[test]
    fn test_negative_selector_accepted() {
        let cli = with_base("update", &["--tcp25", "-l", "-1"]);
        assert_eq!(cli.command.record_args().selector, -1);
    }

    #[test]
    fn test_bad_matching_type_rejected() {
        let cli = with_base("create", &["--tcp25", "-m", "3"]);
        let err = cli.command.sync_request().unwrap_err();
        assert!(matches!(err, SyncError::InvalidParameter(_)));
    }

    #[test]
    fn test_rollover_only_on_update() {
        let mut args = vec!["tlsaflare", "create"];
        args.extend_from_slice(&BASE);
        args.extend_from_slice(&["--tcp25", "--rollover"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_missing_required_flags() {
        assert!(Cli::try_parse_from(["tlsaflare", "create", "--tcp25"]).is_err());
    }
}
