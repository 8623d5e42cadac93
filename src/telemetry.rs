//! Debug logging.
//!
//! The check writes its diagnostics with the `tracing` macros. Nothing is printed unless a
//! subscriber built with `debug` set is in scope, in which case each event becomes one
//! `DEBUG <message>` line on standard output, ahead of the status line.

use tracing::level_filters::LevelFilter;
use tracing::Subscriber;

/// Builds the subscriber for one check run. Install it with
/// [tracing::subscriber::with_default] around the run rather than globally.
pub fn subscriber(debug: bool) -> impl Subscriber + Send + Sync {
    subscriber_with_writer(debug, std::io::stdout)
}

pub(crate) fn subscriber_with_writer<W>(debug: bool, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish()
}
