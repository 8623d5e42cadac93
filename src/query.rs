use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::config::Target;
use crate::Error;

/// Endpoint answering `is_alive` and `version` for a given environment.
pub const ENVIRONMENT_STATUS_PATH: &str = "/puppet/v3/status/whatever";

/// Default URI of the services status endpoint.
pub const SERVICES_STATUS_PATH: &str = "/status/v1/services";

/// The outcome of one HTTP exchange.
#[derive(Clone, Debug)]
pub struct QueryResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    /// Seconds until the response headers arrived.
    pub elapsed: f64,
}

/// Composes `https://{host}:{port}{path}` for the given target.
pub fn build_url(host: &str, port: u16, target: &Target) -> Result<Url, Error> {
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };

    let raw = match target {
        Target::Environment(_) => format!("https://{host}:{port}{ENVIRONMENT_STATUS_PATH}"),
        Target::Uri(uri) if uri.starts_with('/') => format!("https://{host}:{port}{uri}"),
        Target::Uri(uri) => format!("https://{host}:{port}/{uri}"),
    };

    let mut url = Url::parse(&raw).map_err(|source| Error::InvalidUrl {
        url: raw.clone(),
        source,
    })?;

    if let Target::Environment(environment) = target {
        url.query_pairs_mut().append_pair("environment", environment);
    }

    Ok(url)
}

/// Sends a single GET to `url` and reads the whole body.
pub fn send_query(client: &Client, url: &Url) -> Result<QueryResponse, Error> {
    let request = client.get(url.clone()).header(ACCEPT, "*/*");

    let before = Instant::now();
    let result = request.send();
    let elapsed = before.elapsed().as_secs_f64();
    debug!("Sending query {} took {:.5}s", url, elapsed);

    let response = result.map_err(|source| {
        debug!("Error while sending request to {} err: {}", url, source);
        Error::Transport { source, elapsed }
    })?;

    let status = response.status();
    let body = response
        .bytes()
        .map_err(|source| Error::ReadBody { source, elapsed })?;
    debug!("Response is: {}", String::from_utf8_lossy(&body));

    Ok(QueryResponse {
        status,
        body: body.to_vec(),
        elapsed,
    })
}
