//! Structured Logging Module
//!
//! Structured logging with trace IDs so every recommendation request can be
//! followed through fetch, model building and ranking.
//!
//! # Usage
//! ```no_run
//! use projrec_api::logging::{init_logging, LogConfig, TraceId};
//!
//! let config = LogConfig::from_env();
//! init_logging(&config)?;
//!
//! tracing::info!(trace_id = %TraceId::new(), "Request received");
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Counter for generating unique trace IDs
static TRACE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier correlating all log lines of one request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceId {
    /// Timestamp component (ms since epoch)
    timestamp: u64,
    /// Sequential counter component
    counter: u64,
    /// Random component for uniqueness
    random: u16,
}

impl TraceId {
    pub fn new() -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let counter = TRACE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let random = rand::random::<u16>();

        Self {
            timestamp,
            counter,
            random,
        }
    }

    /// Parse a propagated trace ID (`timestamp-counter-random`, hex)
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return None;
        }

        Some(Self {
            timestamp: u64::from_str_radix(parts[0], 16).ok()?,
            counter: u64::from_str_radix(parts[1], 16).ok()?,
            random: u16::from_str_radix(parts[2], 16).ok()?,
        })
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}-{:x}-{:04x}", self.timestamp, self.counter, self.random)
    }
}

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Lenient parse, unknown values fall back to `Info`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format for log aggregation
    Json,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: LogLevel,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Enable ANSI colors (for terminal output)
    pub ansi_colors: bool,
    /// Enable span events (enter/exit)
    pub span_events: bool,
    /// Module-specific log levels
    pub module_levels: Vec<(String, LogLevel)>,
    /// Include target in logs
    pub include_target: bool,
    /// Include file location in logs
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            ansi_colors: true,
            span_events: false,
            module_levels: vec![
                ("hyper".to_string(), LogLevel::Warn),
                ("tower_http".to_string(), LogLevel::Info),
            ],
            include_target: true,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - RUST_LOG: Log level filter (e.g., "info,projrec_engine=debug")
    /// - LOG_FORMAT: Output format (json, pretty, compact)
    /// - LOG_ANSI: Enable ANSI colors (true/false)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            let level_str = rust_log.split(',').next().unwrap_or("info");
            config.level = LogLevel::parse(level_str);
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }

        if let Ok(ansi) = std::env::var("LOG_ANSI") {
            config.ansi_colors = ansi.to_lowercase() == "true";
        }

        config
    }

    /// JSON logging for deployed services
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            ansi_colors: false,
            span_events: true,
            module_levels: vec![
                ("projrec_engine".to_string(), LogLevel::Info),
                ("projrec_api".to_string(), LogLevel::Info),
                ("hyper".to_string(), LogLevel::Warn),
                ("tower".to_string(), LogLevel::Warn),
            ],
            include_target: true,
            include_location: true,
        }
    }

    /// Verbose logging for local development
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            ansi_colors: true,
            span_events: true,
            module_levels: vec![
                ("projrec_engine".to_string(), LogLevel::Debug),
                ("hyper".to_string(), LogLevel::Info),
            ],
            include_target: true,
            include_location: true,
        }
    }

    fn build_filter(&self) -> String {
        let mut filter = self.level.as_str().to_string();

        for (module, level) in &self.module_levels {
            filter.push_str(&format!(",{}={}", module, level.as_str()));
        }

        filter
    }
}

/// Initialize the global subscriber; `RUST_LOG` wins over the config filter
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter = if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(config.build_filter())
    };

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_span_events(span_events)
                        .with_ansi(false),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_span_events(span_events)
                        .with_ansi(config.ansi_colors),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_span_events(span_events)
                        .with_ansi(config.ansi_colors),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;
        }
    }

    Ok(())
}
