use std::sync::Once;

/// Options for `init_logging`.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "tachy_engine=debug,wgpu=warn") and wins over `RUST_LOG`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Stamp log lines with microsecond precision. Frame-level traces are
    /// unreadable at the default second resolution.
    pub precise_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            precise_timestamps: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Used when neither the config nor `RUST_LOG` names a filter. The GPU stack
/// is noisy at `info` during surface setup.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger. Only the first call has any
/// effect.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then
/// `DEFAULT_FILTER`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config
            .env_filter
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter).write_style(config.write_style);
        if config.precise_timestamps {
            builder.format_timestamp_micros();
        }

        // A host process may have installed its own logger.
        match builder.try_init() {
            Ok(()) => log::debug!("logging initialized with filter {filter:?}"),
            Err(_) => log::debug!("global logger already set; keeping it"),
        }
    });
}
