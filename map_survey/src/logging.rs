//! Tracing setup and the bridge that turns parser diagnostics into log events.
//!
//! Events go to stderr so the report on stdout stays clean. `RUST_LOG`, when
//! set, takes precedence over the configured level.

use compat_quake::diagnostic::{Diagnostic, DiagnosticSink};
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(config.level.trim())?),
    }
}

/// Installs the global subscriber. Call once, before the first event.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }
    Ok(())
}

/// Forwards diagnostics to `tracing` as warnings.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::DuplicateKey { key, line } => {
                tracing::warn!(key = %key, line = *line, "{}", diagnostic)
            }
            Diagnostic::ClasslessObject { line } | Diagnostic::UnterminatedObject { line } => {
                tracing::warn!(line = *line, "{}", diagnostic)
            }
            Diagnostic::MissingTitle { map } => tracing::warn!(map = %map, "{}", diagnostic),
            Diagnostic::UnknownClass { classname } => {
                tracing::warn!(classname = %classname, "{}", diagnostic)
            }
        }
    }
}
