//! Quarry logging.
//!
//! Small, environment-controlled logging used by the quarry crates. Messages
//! go to stderr in one of three formats, or to the [`log`] facade when the
//! `log-facade` feature is enabled so host applications can route them.
//!
//! # Usage
//!
//! ```rust
//! use quarry_log::{debug, info, warn, error, trace};
//!
//! debug!("Decoding aggregations");
//! info!("Client ready for {}", "http://localhost:9200");
//! warn!("Slow search: {} ms", 1200);
//! error!("Search failed");
//!
//! let name = "by_status";
//! trace!(target: "quarry::decode", "Classifying {}", name);
//! ```
//!
//! # Environment Variables
//!
//! - `QUARRY_DEBUG=1` - Shorthand for `QUARRY_LOG_LEVEL=debug`
//! - `QUARRY_LOG_LEVEL=trace|debug|info|warn|error|off` - Minimum level (default `warn`)
//! - `QUARRY_LOG_FORMAT=pretty|compact|json` - Output format (default `compact`)
//! - `QUARRY_LOG_TIMESTAMPS=1|0` - Prefix timestamps (default on)
//! - `QUARRY_LOG_TARGET=1|0` - Include the module path (default on)

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
#[cfg(not(feature = "log-facade"))]
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

// ============================================================================
// Levels and formats
// ============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Shape detection details.
    Trace = 0,
    /// Requests sent, fallbacks taken.
    Debug = 1,
    /// Lifecycle events.
    Info = 2,
    /// Recoverable problems.
    Warn = 3,
    /// Failures.
    Error = 4,
    /// Nothing is logged.
    Off = 5,
}

impl Level {
    /// Upper-case level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }
}

impl FromStr for Level {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ParseError::new("level", s)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `2024-01-01 12:00:00.000 DEBUG [target] message`
    Pretty,
    /// `12:00:00 D target: message`
    Compact,
    /// One JSON object per line.
    Json,
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            _ => Err(ParseError::new("format", s)),
        }
    }
}

/// An unrecognized level or format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum level at startup.
    pub level: Level,
    /// Output format.
    pub format: Format,
    /// Whether to include timestamps.
    pub timestamps: bool,
    /// Whether to include the target (module path).
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Warn,
            format: Format::Compact,
            timestamps: true,
            target: true,
        }
    }
}

impl LogConfig {
    /// Read the configuration from `QUARRY_*` environment variables.
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |name: &str| {
            lookup(name).map(|v| v.trim() == "1" || v.trim().eq_ignore_ascii_case("true"))
        };

        let debug = flag("QUARRY_DEBUG").unwrap_or(false);
        let level = lookup("QUARRY_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { defaults.level });

        Self {
            level,
            format: lookup("QUARRY_LOG_FORMAT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.format),
            timestamps: flag("QUARRY_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
            target: flag("QUARRY_LOG_TARGET").unwrap_or(defaults.target),
        }
    }
}

const UNINITIALIZED: u8 = u8::MAX;

/// Runtime level; `UNINITIALIZED` until the environment has been read.
static LOG_LEVEL: AtomicU8 = AtomicU8::new(UNINITIALIZED);

static CONFIG: Lazy<LogConfig> = Lazy::new(|| {
    let config = LogConfig::from_env();
    let _ = LOG_LEVEL.compare_exchange(
        UNINITIALIZED,
        config.level as u8,
        Ordering::SeqCst,
        Ordering::SeqCst,
    );
    config
});

// ============================================================================
// Public API
// ============================================================================

/// Read the environment now instead of on the first log call.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// The configuration read from the environment.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

/// Current minimum level.
pub fn current_level() -> Level {
    let level = LOG_LEVEL.load(Ordering::Relaxed);
    if level == UNINITIALIZED {
        init();
        return Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed));
    }
    Level::from_u8(level)
}

/// Change the minimum level at runtime.
pub fn set_level(level: Level) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Check if a level is enabled.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    level != Level::Off && level >= current_level()
}

/// Log a message. Used by the macros.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    if !is_level_enabled(level) {
        return;
    }
    emit(level, target, message, config());
}

#[cfg(feature = "log-facade")]
fn emit(level: Level, target: &str, message: &str, _config: &LogConfig) {
    let level = match level {
        Level::Trace => log::Level::Trace,
        Level::Debug => log::Level::Debug,
        Level::Info => log::Level::Info,
        Level::Warn => log::Level::Warn,
        Level::Error | Level::Off => log::Level::Error,
    };
    log::log!(target: target, level, "{}", message);
}

#[cfg(not(feature = "log-facade"))]
fn emit(level: Level, target: &str, message: &str, config: &LogConfig) {
    let line = format_line(level, target, message, config);
    let _ = writeln!(std::io::stderr().lock(), "{}", line);
}

/// Render one log line.
pub fn format_line(level: Level, target: &str, message: &str, config: &LogConfig) -> String {
    let mut line = String::new();
    let show_target = config.target && !target.is_empty();

    match config.format {
        Format::Pretty => {
            if config.timestamps {
                line.push_str(&chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f ").to_string());
            }
            line.push_str(&format!("{:5} ", level.as_str()));
            if show_target {
                line.push_str(&format!("[{}] ", target));
            }
            line.push_str(message);
        }
        Format::Compact => {
            if config.timestamps {
                line.push_str(&chrono::Local::now().format("%H:%M:%S ").to_string());
            }
            line.push(level.as_str().chars().next().unwrap_or('?'));
            line.push(' ');
            if show_target {
                line.push_str(target);
                line.push_str(": ");
            }
            line.push_str(message);
        }
        Format::Json => line = json_line(level, show_target.then_some(target), message, config),
    }

    line
}

#[cfg(feature = "json")]
fn json_line(level: Level, target: Option<&str>, message: &str, config: &LogConfig) -> String {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Entry<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        level: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<&'a str>,
        message: &'a str,
    }

    let entry = Entry {
        timestamp: config.timestamps.then(|| chrono::Utc::now().to_rfc3339()),
        level: level.as_str(),
        target,
        message,
    };

    serde_json::to_string(&entry).unwrap_or_else(|_| message.to_string())
}

#[cfg(not(feature = "json"))]
fn json_line(level: Level, target: Option<&str>, message: &str, config: &LogConfig) -> String {
    let mut line = String::from("{");
    if config.timestamps {
        line.push_str(&format!(r#""timestamp":"{}","#, chrono::Utc::now().to_rfc3339()));
    }
    line.push_str(&format!(r#""level":"{}""#, level.as_str()));
    if let Some(target) = target {
        line.push_str(&format!(r#","target":"{}""#, escape_json(target)));
    }
    line.push_str(&format!(r#","message":"{}"}}"#, escape_json(message)));
    line
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:expr, target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($level) {
            $crate::log($level, $target, &format!($($arg)+));
        }
    };
    ($level:expr, $($arg:tt)+) => {
        $crate::__log!($level, target: module_path!(), $($arg)+)
    };
}

/// Log a trace message.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Trace, $($arg)+) };
}

/// Log a debug message.
///
/// ```rust
/// use quarry_log::debug;
///
/// let index = "orders";
/// debug!("Searching {}", index);
/// debug!(target: "quarry::client", "Searching {}", index);
/// ```
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Debug, $($arg)+) };
}

/// Log an info message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Info, $($arg)+) };
}

/// Log a warning message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Warn, $($arg)+) };
}

/// Log an error message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Error, $($arg)+) };
}

// ============================================================================
// Tests
// ============================================================================
