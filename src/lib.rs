//! Nagios/Icinga check for the Puppet Server status endpoint.
//!
//! The crate runs exactly one mutually authenticated HTTPS request against a Puppet Server,
//! classifies the answer and prints one Nagios result line before exiting with the matching
//! exit code.

use std::fmt;
use std::process;

pub mod check;
pub mod config;
pub mod config_generator;
pub mod error;
pub mod query;
pub mod runner;
pub mod telemetry;
pub mod tls;

#[cfg(test)]
mod testing;

pub use crate::error::Error;
pub use crate::runner::Runner;

/// A Resource represents the single service this plugin reports on, from the perspective of
/// nagios. It carries the state, a human readable description and the performance data.
///
/// ```rust
/// # use check_puppetserver::{Metric, Resource, ServiceState, Unit};
/// let resource = Resource::new(ServiceState::Ok)
///     .with_description("Puppet Server looks good")
///     .with_metric(Metric::new("time", 0.25).with_precision(5).with_unit(Unit::Seconds));
/// assert_eq!(
///     &resource.to_nagios_string(),
///     "OK: Puppet Server looks good | time=0.25000s"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Resource {
    state: ServiceState,
    description: Option<String>,
    metrics: Vec<Metric>,
}

impl Resource {
    pub fn new(state: ServiceState) -> Resource {
        Resource {
            state,
            description: None,
            metrics: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Returns a slice of the pushed metrics.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn set_state(&mut self, state: ServiceState) {
        self.state = state
    }

    /// Get the description of this resource.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set the description of this resource.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Returns the string nagios reads the service state from, in the form
    /// `STATE: description | perfdata`.
    pub fn to_nagios_string(&self) -> String {
        let mut s = self.state.to_string();

        if let Some(ref description) = self.description {
            s.push_str(&format!(": {}", description));
        }

        if !self.metrics.is_empty() {
            s.push_str(" |");

            for metric in self.metrics.iter() {
                s.push_str(&format!(" {}", metric.perf_string()));
            }
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Prints Self::to_nagios_string and exits with the exit code from Self::exit_code.
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

/// Represents a service state from nagios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    None,
    Seconds,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::None => Ok(()),
            Unit::Seconds => f.write_str("s"),
        }
    }
}

/// A single performance data value. No state is derived from it; thresholds are evaluated by
/// the check itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    name: String,
    value: f64,
    precision: Option<usize>,
    unit: Unit,
}

impl Metric {
    pub fn new(name: &str, value: f64) -> Self {
        Metric {
            name: name.to_owned(),
            value,
            precision: None,
            unit: Unit::None,
        }
    }

    /// Fixed number of decimals used when rendering the value.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn perf_string(&self) -> String {
        // replace `=`
        let name = self.name.replace('=', "_");

        // quote `'`
        let name = name.replace('\'', "''");

        // quote if contains spaces
        let name = if name.contains(' ') {
            format!("'{}'", name)
        } else {
            name
        };

        let value = match self.precision {
            Some(precision) => format!("{:.*}", precision, self.value),
            None => self.value.to_string(),
        };

        format!("{}={}{}", name, value, self.unit)
    }
}
