//! Invocation parameters.
//!
//! Flags follow the Go `flag` conventions the plugin has always been called with (`-cert`,
//! `-debug`, `-H=host`), so arguments are normalized before clap sees them.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use clap::builder::{BoolishValueParser, OsStringValueParser, TypedValueParser};
use clap::ArgAction;
use clap::error::ErrorKind;
use url::Url;

use crate::tls::ClientIdentity;
use crate::{query, Error, Resource, ServiceState};

const PUPPET_SSL_DIR: &str = "/etc/puppetlabs/puppet/ssl";

/// Flags shared by both checks.
#[derive(Clone, Debug, clap::Args)]
pub struct CommonArgs {
    /// Hostname to query
    #[arg(short = 'H', default_value = "localhost")]
    pub host: String,

    /// Port to send the query to
    #[arg(short = 'p', default_value_t = 8140)]
    pub port: u16,

    /// WARNING threshold in seconds
    #[arg(short = 'w', default_value_t = 5.0, allow_negative_numbers = true)]
    pub warning: f64,

    /// CRITICAL threshold in seconds
    #[arg(short = 'c', default_value_t = 15.0, allow_negative_numbers = true)]
    pub critical: f64,

    /// Request timeout in seconds
    #[arg(short = 't', default_value_t = 60.0, allow_negative_numbers = true)]
    pub timeout: f64,

    /// Log debug output
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub debug: bool,

    /// A PEM encoded client certificate file
    #[arg(
        long,
        value_name = "FILE",
        value_parser = OsStringValueParser::new().map(PathBuf::from),
        default_value_os_t = default_cert_path()
    )]
    pub cert: PathBuf,

    /// A PEM encoded private key file for the client certificate
    #[arg(
        long,
        value_name = "FILE",
        value_parser = OsStringValueParser::new().map(PathBuf::from),
        default_value_os_t = default_key_path()
    )]
    pub key: PathBuf,

    /// Print an Icinga2 CheckCommand definition for this plugin and exit
    #[arg(long, hide = true)]
    pub print_icinga_command: bool,
}

/// What the check asks the Puppet Server for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The environment status endpoint, answering `is_alive` and `version`.
    Environment(String),
    /// Any status URI; only liveness is evaluated.
    Uri(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
}

/// Validated parameters for one check run.
#[derive(Clone, Debug)]
pub struct Params {
    pub host: String,
    pub port: u16,
    pub target: Target,
    pub thresholds: Thresholds,
    pub timeout: Duration,
    pub debug: bool,
    pub identity: ClientIdentity,
}

impl Params {
    pub fn url(&self) -> Result<Url, Error> {
        query::build_url(&self.host, self.port, &self.target)
    }
}

/// Replacement values for a test harness. Never derived from the environment.
#[derive(Clone, Debug, Default)]
pub struct ParamOverrides {
    pub host: Option<String>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub critical: Option<f64>,
    pub debug: Option<bool>,
}

impl CommonArgs {
    pub fn with_overrides(mut self, overrides: ParamOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(cert) = overrides.cert {
            self.cert = cert;
        }
        if let Some(key) = overrides.key {
            self.key = key;
        }
        if let Some(critical) = overrides.critical {
            self.critical = critical;
        }
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        self
    }

    pub fn into_params(self, target: Target) -> Result<Params, Error> {
        if self.host.is_empty() {
            return Err(Error::MissingParameter {
                description: "Hostname",
                flag: "-H",
            });
        }
        if self.cert.as_os_str().is_empty() {
            return Err(Error::MissingParameter {
                description: "Client certificate",
                flag: "-cert",
            });
        }
        if self.key.as_os_str().is_empty() {
            return Err(Error::MissingParameter {
                description: "Client certificate key file",
                flag: "-key",
            });
        }
        let timeout = match Duration::try_from_secs_f64(self.timeout) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => return Err(Error::InvalidTimeout(self.timeout)),
        };

        Ok(Params {
            host: self.host,
            port: self.port,
            target,
            thresholds: Thresholds {
                warning: self.warning,
                critical: self.critical,
            },
            timeout,
            debug: self.debug,
            identity: ClientIdentity {
                cert: self.cert,
                key: self.key,
            },
        })
    }
}

/// Fully qualified name of this machine, resolved once per process.
pub fn fqdn() -> &'static str {
    static FQDN: OnceLock<String> = OnceLock::new();
    FQDN.get_or_init(resolve_fqdn)
}

fn resolve_fqdn() -> String {
    if let Ok(output) = Command::new("hostname").arg("-f").output() {
        let name = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if output.status.success() && !name.is_empty() {
            return name;
        }
    }

    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn default_cert_path() -> PathBuf {
    PathBuf::from(PUPPET_SSL_DIR)
        .join("certs")
        .join(format!("{}.pem", fqdn()))
}

pub fn default_key_path() -> PathBuf {
    PathBuf::from(PUPPET_SSL_DIR)
        .join("private_keys")
        .join(format!("{}.pem", fqdn()))
}

/// Rewrites Go style flags for clap: one or two leading dashes are accepted for every flag,
/// single letter flags become `-x` and longer ones `--name`. Negative numbers and everything
/// after `--` pass through unchanged.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        if arg == "--" {
            out.push(arg);
            out.extend(&mut args);
            break;
        }
        out.push(normalize_flag(arg));
    }

    out
}

fn normalize_flag(arg: OsString) -> OsString {
    let Some(s) = arg.to_str() else {
        return arg;
    };

    let name = s.trim_start_matches('-');
    let dashes = s.len() - name.len();
    if dashes == 0
        || dashes > 2
        || name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit() || c == '.')
    {
        return arg;
    }

    let flag = name.split('=').next().unwrap_or(name);
    if flag.chars().count() == 1 {
        format!("-{name}").into()
    } else {
        format!("--{name}").into()
    }
}

/// Parses the command line of a check binary.
pub fn parse_args<C, I, T>(args: I) -> Result<C, clap::Error>
where
    C: clap::Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    C::try_parse_from(normalize_args(args))
}

/// Parses the process arguments, or reports a usage error and exits.
pub fn parse_or_exit<C: clap::Parser>() -> C {
    parse_args(std::env::args_os()).unwrap_or_else(|err| match usage_error(&err) {
        Some(resource) => resource.print_and_exit(),
        None => err.exit(),
    })
}

/// The result reported for a command line that could not be parsed. Returns `None` for help
/// and version requests, which clap prints itself.
pub fn usage_error(err: &clap::Error) -> Option<Resource> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => {
            let rendered = err.to_string();
            let reason = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_owned();
            Some(Resource::new(ServiceState::Unknown).with_description(reason))
        }
    }
}
