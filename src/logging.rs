//! Log setup for the governor binary.
//!
//! Logs always go to stderr so stdout stays clean for program output.
//! A `[logging] file` adds a rolling file sink. JSON mode also emits a
//! close event for each `govern` span with its timing.

use std::fs;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

const CRATE_TARGET: &str = "persona_governor";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Keeps the file writer alive. Dropping it flushes buffered records,
/// so hold it until the command has finished.
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber for `govern` and `validate`.
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = effective_level(settings, verbose, quiet);

    let (file_layer, file_guard) = match settings.file.as_deref() {
        Some(path) => {
            let appender = open_log_file(path, settings.max_file_size_mb, settings.max_files)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = output_layer(BoxMakeWriter::new(writer), settings.json_format, false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let stderr = output_layer(
        BoxMakeWriter::new(std::io::stderr),
        settings.json_format,
        true,
    );

    tracing_subscriber::registry()
        .with(governor_filter(level)?)
        .with(stderr)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %level,
        file = ?settings.file,
        json = settings.json_format,
        "Logging ready"
    );

    Ok(LogGuards {
        _file_guard: file_guard,
    })
}

/// Stderr-only logging for the `taxonomy` and `config` commands.
pub fn init_simple(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(governor_filter(level)?)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// `-q` beats `-v`; otherwise each `-v` steps down from the configured level.
fn effective_level(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => parse_level(&settings.level),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// RUST_LOG (or `level` when unset) for dependencies; the governor's own
/// targets always run at `level`.
fn governor_filter(level: Level) -> Result<EnvFilter> {
    let base = level.as_str().to_lowercase();
    let directive = format!("{}={}", CRATE_TARGET, base)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid log directive: {}", e)))?;
    Ok(EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&base))
        .add_directive(directive))
}

fn output_layer<S>(writer: BoxMakeWriter, json: bool, ansi: bool) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(!ansi)
            .compact()
            .boxed()
    }
}

/// tracing-appender rotates on time only, so a small size budget maps to
/// hourly files.
fn rotation_for(max_file_size_mb: u64) -> Rotation {
    if max_file_size_mb > 0 && max_file_size_mb < 10 {
        Rotation::HOURLY
    } else {
        Rotation::DAILY
    }
}

/// Rolling appender for `path`; files are named `<file>.<date>.log`.
fn open_log_file(path: &str, max_file_size_mb: u64, max_files: u32) -> Result<RollingFileAppender> {
    let path = Path::new(path);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory).map_err(|e| {
        Error::Config(format!(
            "Failed to create log directory '{}': {}",
            directory.display(),
            e
        ))
    })?;
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("governor.log");

    RollingFileAppender::builder()
        .rotation(rotation_for(max_file_size_mb))
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(max_files.max(1) as usize)
        .build(directory)
        .map_err(|e| Error::Config(format!("Failed to open log file '{}': {}", path.display(), e)))
}
