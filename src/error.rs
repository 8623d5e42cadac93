use std::path::PathBuf;

use crate::check::time_metric;
use crate::{Resource, ServiceState};

/// Everything that stops a check before a response could be classified.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{description} parameter {flag} is mandatory!")]
    MissingParameter {
        description: &'static str,
        flag: &'static str,
    },
    #[error("Timeout parameter -t must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
    #[error("Certificate file {} not found", .0.display())]
    CertificateNotFound(PathBuf),
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed reading {}: {source}", path.display())]
    ReadIdentity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed loading client certificate and key: {}", chain(.0))]
    Identity(#[source] reqwest::Error),
    #[error("Failed building HTTPS client: {}", chain(.0))]
    Client(#[source] reqwest::Error),
    #[error("Error while sending request: {}", chain(source))]
    Transport {
        #[source]
        source: reqwest::Error,
        elapsed: f64,
    },
    #[error("Error while reading response: {}", chain(source))]
    ReadBody {
        #[source]
        source: reqwest::Error,
        elapsed: f64,
    },
}

impl Error {
    pub fn state(&self) -> ServiceState {
        match self {
            Error::MissingParameter { .. }
            | Error::InvalidTimeout(_)
            | Error::CertificateNotFound(_)
            | Error::InvalidUrl { .. } => ServiceState::Warning,
            Error::ReadIdentity { .. }
            | Error::Identity(_)
            | Error::Client(_)
            | Error::Transport { .. }
            | Error::ReadBody { .. } => ServiceState::Unknown,
        }
    }

    /// Seconds spent on the request before it failed, if one was sent.
    pub fn elapsed(&self) -> Option<f64> {
        match self {
            Error::Transport { elapsed, .. } | Error::ReadBody { elapsed, .. } => Some(*elapsed),
            _ => None,
        }
    }

    /// The nagios result reported for this error.
    pub fn into_resource(self) -> Resource {
        let resource = Resource::new(self.state()).with_description(self.to_string());
        match self.elapsed() {
            Some(elapsed) => resource.with_metric(time_metric(elapsed)),
            None => resource,
        }
    }
}

/// Renders an error followed by its sources, `outer: inner: innermost`.
fn chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !out.contains(&message) {
            out.push_str(": ");
            out.push_str(&message);
        }
        source = cause.source();
    }
    out
}
