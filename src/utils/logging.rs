//! Logging utilities built on the `tracing` crate.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_target: true,
            ansi_colors: true,
        }
    }

    /// Create a quiet logging config (errors only)
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            include_target: false,
            ansi_colors: true,
        }
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Initialize logging with the given configuration.
///
/// Returns an error message if a global subscriber was already set.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level.to_tracing_level())
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Progress logger for long-running operations
pub struct ProgressLogger {
    /// Operation name
    operation: String,
    /// Total items to process
    total: usize,
    /// Current progress
    current: usize,
    /// Log interval (log every N items)
    log_interval: usize,
    /// Start time
    start_time: std::time::Instant,
}

impl ProgressLogger {
    /// Create a new progress logger
    pub fn new(operation: &str, total: usize) -> Self {
        Self {
            operation: operation.to_string(),
            total,
            current: 0,
            log_interval: (total / 10).max(1),
            start_time: std::time::Instant::now(),
        }
    }

    /// Create with custom log interval
    pub fn with_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval.max(1);
        self
    }

    /// Update progress
    pub fn update(&mut self, count: usize) {
        self.current = count;

        if self.current % self.log_interval == 0 || self.current == self.total {
            let percentage = 100.0 * self.current as f64 / self.total as f64;
            tracing::info!(
                "{}: {}/{} ({:.1}%)",
                self.operation,
                self.current,
                self.total,
                percentage
            );
        }
    }

    /// Increment progress by 1
    pub fn increment(&mut self) {
        self.update(self.current + 1);
    }

    /// Log completion
    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();

        tracing::info!(
            "{}: completed {} items in {:.2}s",
            self.operation,
            self.total,
            elapsed.as_secs_f64()
        );
    }
}
