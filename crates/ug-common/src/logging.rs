//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Tracing subscriber setup for UrbanGuard binaries."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "URBANGUARD_LOG";
const FALLBACK_ENV: &str = "RUST_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Writer guards; dropping them would lose buffered lines.
struct LogGuards {
    _file: WorkerGuard,
    _stdout: WorkerGuard,
}

static GUARDS: OnceCell<LogGuards> = OnceCell::new();

/// Stdout rendering. The rolling file is always JSON.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    StructuredJson,
    Pretty,
}

/// Pick the filter directive: `URBANGUARD_LOG`, then `RUST_LOG`, then `info`.
///
/// An unparsable directive is reported on stderr and replaced by the default,
/// since no subscriber exists yet to log through.
fn resolve_filter(primary: Option<String>, fallback: Option<String>) -> EnvFilter {
    let Some((source, directive)) = primary
        .map(|value| (LOG_ENV, value))
        .or_else(|| fallback.map(|value| (FALLBACK_ENV, value)))
    else {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("ignoring invalid {source} directive '{directive}' ({err}); using {DEFAULT_DIRECTIVE}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    })
}

fn stdout_layer<S>(format: LogFormat, writer: NonBlocking) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let base = fmt::layer().with_timer(fmt::time::UtcTime::rfc_3339());
    match format {
        LogFormat::StructuredJson => base.with_target(false).json().with_writer(writer).boxed(),
        LogFormat::Pretty => base.with_target(true).with_writer(writer).boxed(),
    }
}

/// Install the global subscriber for `service_name`.
///
/// Stdout follows `config.format`; a daily rolling JSON file named after
/// `file_prefix` (or the service) is written under `config.directory`.
/// Calling this twice keeps the first subscriber.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!(
            "unable to create log directory {}",
            config.directory.display()
        )
    })?;
    let prefix = config.file_prefix.as_deref().unwrap_or(service_name);

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(daily(&config.directory, format!("{prefix}.log")));
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let _ = GUARDS.set(LogGuards {
        _file: file_guard,
        _stdout: stdout_guard,
    });

    let filter = resolve_filter(
        std::env::var(LOG_ENV).ok(),
        std::env::var(FALLBACK_ENV).ok(),
    );
    let file_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .json()
        .with_writer(file_writer);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer(config.format, stdout_writer))
        .with(file_layer)
        .try_init()
        .is_ok();

    info!(
        service = %service_name,
        log_dir = %config.directory.display(),
        format = ?config.format,
        installed,
        "tracing initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_directive_wins() {
        let filter = resolve_filter(Some("debug".into()), Some("warn".into()));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn fallback_then_default() {
        assert_eq!(resolve_filter(None, Some("warn".into())).to_string(), "warn");
        assert_eq!(resolve_filter(None, None).to_string(), DEFAULT_DIRECTIVE);
    }

    #[test]
    fn invalid_directive_uses_default() {
        let filter = resolve_filter(Some("ug_core=notalevel".into()), None);
        assert_eq!(filter.to_string(), DEFAULT_DIRECTIVE);
    }

    #[test]
    fn format_names_are_kebab_case() {
        let config: LoggingConfig = toml::from_str("format = \"structured-json\"").unwrap();
        assert_eq!(config.format, LogFormat::StructuredJson);
    }
}
