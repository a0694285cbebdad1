use anyhow::Result;
use std::fmt::Display;
use tracing::{error, warn};
use tracing::{level_filters::LevelFilter, Subscriber};
use tracing_subscriber::{prelude::*, EnvFilter};

use super::conf::LogFormat;

// A simple way to log without interrupting fluency
pub trait LogMe<T> {
    fn log_warn<C: Display + Send + Sync + 'static>(self, context_msg: C) -> anyhow::Result<T>;
    fn log_error<C: Display + Send + Sync + 'static>(self, context_msg: C) -> anyhow::Result<T>;
}

// Will log a warning in case of error
// WARN {context_msg}: {cause}
impl<T, Error: Into<anyhow::Error> + Display + Send + Sync + 'static> LogMe<T>
    for Result<T, Error>
{
    fn log_warn<C: Display + Send + Sync + 'static>(self, context_msg: C) -> anyhow::Result<T> {
        match self {
            Err(e) => {
                let ae: anyhow::Error = e.into();
                let ae = ae.context(context_msg);
                warn!("{:#}", ae);
                Err(ae)
            }
            Ok(t) => Ok(t),
        }
    }

    fn log_error<C: Display + Send + Sync + 'static>(self, context_msg: C) -> anyhow::Result<T> {
        match self {
            Err(e) => {
                let ae: anyhow::Error = e.into();
                let ae = ae.context(context_msg);
                error!("{:#}", ae);
                Err(ae)
            }
            Ok(t) => Ok(t),
        }
    }
}

pub enum TracingMode {
    /// Human readable output on stderr
    Full,
    /// JSON lines on stderr, for log collectors
    Json,
}

impl From<LogFormat> for TracingMode {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Full => TracingMode::Full,
            LogFormat::Json => TracingMode::Json,
        }
    }
}

/// Setup tracing - stderr subscriber, so that stdout only carries the encoded output
/// Defaults to INFO unless RUST_LOG says otherwise.
pub fn setup_tracing(mode: TracingMode) -> Result<()> {
    let filter = build_filter(&std::env::var("RUST_LOG").unwrap_or_default())?;

    // Can't use match inline because these are different return types
    match mode {
        TracingMode::Full => register_global_subscriber(
            filter,
            tracing_subscriber::fmt::layer().with_writer(std::io::stderr),
        ),
        TracingMode::Json => register_global_subscriber(
            filter,
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(tracing_subscriber::fmt::format().json()),
        ),
    };

    Ok(())
}

fn build_filter(directives: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse(directives)?)
}

fn register_global_subscriber<T, S>(filter: EnvFilter, fmt_layer: T)
where
    S: Subscriber,
    T: tracing_subscriber::Layer<S> + Send + Sync,
    tracing_subscriber::filter::Filtered<T, tracing_subscriber::EnvFilter, S>:
        tracing_subscriber::Layer<tracing_subscriber::Registry>,
{
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}
