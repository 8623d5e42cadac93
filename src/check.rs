//! Classification of a Puppet Server answer into a nagios result.
//!
//! The base verdict depends on the target: the environment endpoint is judged on its JSON
//! payload, a plain status URI on its HTTP status and whether it sent a body at all. The
//! latency overlay is applied on top of either, critical threshold first.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::{CommonArgs, Params, Target, Thresholds};
use crate::query::{self, QueryResponse};
use crate::{telemetry, tls, Error, Metric, Resource, Runner, ServiceState, Unit};

/// Payload of the environment status endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusResponse {
    is_alive: bool,
    version: String,
}

/// The `time` performance data value.
pub fn time_metric(elapsed: f64) -> Metric {
    Metric::new("time", elapsed)
        .with_precision(5)
        .with_unit(Unit::Seconds)
}

fn seconds(elapsed: f64) -> String {
    format!("{:.5}", elapsed)
}

/// Runs a complete check for the parsed flags and returns the one result to report. Debug
/// output is only emitted while the check runs.
pub fn run_plugin(args: CommonArgs, target: Target) -> Resource {
    Runner::new().on_error(Error::into_resource).safe_run(|| {
        let params = args.into_params(target)?;
        let subscriber = telemetry::subscriber(params.debug);

        tracing::subscriber::with_default(subscriber, || run(&params))
    })
}

/// Builds the client, sends the query and classifies the answer.
pub fn run(params: &Params) -> Result<Resource, Error> {
    let url = params.url()?;
    let client = tls::build_client(&params.identity, params.timeout)?;
    execute(&client, &url, &params.target, params.thresholds)
}

pub fn execute(
    client: &Client,
    url: &Url,
    target: &Target,
    thresholds: Thresholds,
) -> Result<Resource, Error> {
    let response = query::send_query(client, url)?;
    Ok(evaluate(&response, url, target, thresholds))
}

/// Base classification plus latency overlay. Always carries the `time` metric.
pub fn evaluate(
    response: &QueryResponse,
    url: &Url,
    target: &Target,
    thresholds: Thresholds,
) -> Resource {
    let base = match target {
        Target::Environment(environment) => classify_environment(response, url, environment),
        Target::Uri(_) if response.status != StatusCode::OK => {
            return Resource::new(ServiceState::Critical)
                .with_description(format!(
                    "Puppet Server status endpoint {} answered with HTTP status {}",
                    url,
                    response.status.as_u16()
                ))
                .with_metric(time_metric(response.elapsed));
        }
        Target::Uri(_) => classify_liveness(response, url),
    };

    apply_latency(base, response.elapsed, thresholds).with_metric(time_metric(response.elapsed))
}

fn empty_response(url: &Url) -> Resource {
    Resource::new(ServiceState::Warning)
        .with_description(format!("Received empty response for request against {}", url))
}

fn classify_environment(response: &QueryResponse, url: &Url, environment: &str) -> Resource {
    if response.body.is_empty() {
        return empty_response(url);
    }

    // `null` decodes to an empty, not alive status
    match serde_json::from_slice::<Option<StatusResponse>>(&response.body)
        .map(Option::unwrap_or_default)
    {
        Err(err) => {
            debug!("Error while decoding JSON response: {}", err);
            Resource::new(ServiceState::Warning).with_description(format!(
                "Failed parsing Puppet Server JSON response, checked for Puppet environment {} output: {}",
                environment,
                single_line(&String::from_utf8_lossy(&response.body))
            ))
        }
        Ok(status) if status.is_alive => {
            Resource::new(ServiceState::Ok).with_description(format!(
                "Puppet Server (Version: {}) looks good, checked for Puppet environment {} in {}s",
                status.version,
                environment,
                seconds(response.elapsed)
            ))
        }
        Ok(status) => Resource::new(ServiceState::Warning).with_description(format!(
            "Puppet Server (Version: {}) did not answer with is_alive true, checked for Puppet environment {}",
            status.version, environment
        )),
    }
}

/// Joins the non-blank lines of `text` with spaces so the status stays on one line.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn classify_liveness(response: &QueryResponse, url: &Url) -> Resource {
    if response.body.is_empty() {
        return empty_response(url);
    }

    Resource::new(ServiceState::Ok).with_description(format!(
        "Puppet Server status endpoint {} answered in {}s",
        url,
        seconds(response.elapsed)
    ))
}

/// Escalates the state when the response took too long. A triggered threshold overwrites the
/// base state.
pub fn apply_latency(mut resource: Resource, elapsed: f64, thresholds: Thresholds) -> Resource {
    let breached = if elapsed >= thresholds.critical {
        Some((ServiceState::Critical, thresholds.critical))
    } else if elapsed >= thresholds.warning {
        Some((ServiceState::Warning, thresholds.warning))
    } else {
        None
    };

    if let Some((state, threshold)) = breached {
        let text = resource.description().unwrap_or_default().to_owned();
        resource.set_state(state);
        resource.set_description(format!(
            "Response time {}s >= {:.2}s - {}",
            seconds(elapsed),
            threshold,
            text
        ));
    }

    resource
}
