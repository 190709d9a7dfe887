//! Bridges the crate's `log` records to a host-provided logger.
//!
//! The SDK logs through the [`log`] facade. Host applications register a
//! [`Logger`] implementation once at startup (e.g. forwarding to Logcat or
//! os_log); until then records are written to stderr so early failures stay
//! visible during integration.

use std::sync::{Arc, OnceLock};

/// Severity of a forwarded log record.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Receives log messages emitted by the SDK.
///
/// Implemented by the host application and registered via [`set_logger`].
#[uniffi::export(with_foreign)]
pub trait Logger: Send + Sync {
    /// Records one log message at the given level.
    fn log(&self, level: LogLevel, message: String);
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Adapter that forwards [`log`] records to the registered [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        // Debug/trace chatter from dependencies is not forwarded; only this
        // crate's modules log at those levels across the FFI boundary.
        if metadata.level() >= log::Level::Debug {
            return metadata.target().starts_with("kwikpass");
        }
        true
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}", record.args());
        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(to_level(record.level()), message);
        } else {
            eprintln!("[kwikpass:{}] {message}", record.level());
        }
    }

    fn flush(&self) {}
}

const fn to_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

/// Registers the host logger and installs the `log` bridge.
///
/// Call once during app startup, before initializing the SDK. Subsequent
/// calls are ignored.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        log::warn!("logger already set; ignoring");
        return;
    }

    static BRIDGE: ForeignLogger = ForeignLogger;
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }
}
