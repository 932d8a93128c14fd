//! Logger setup for the command line tool.
//!
//! The library itself only emits through the `log` facade.

use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax (`"debug"`,
/// `"viewkit=trace"`). When unset, `RUST_LOG` is read, then `warn` is used.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// `debug` for the crate when `verbose`, the default filter otherwise
    pub fn verbose(verbose: bool) -> Self {
        Self {
            env_filter: verbose.then(|| "viewkit=debug".to_string()),
            ..Self::default()
        }
    }
}

static INIT: Once = Once::new();

/// Initialize the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        builder.write_style(config.write_style);
        builder.format_timestamp(None);
        builder.init();

        log::debug!("logging initialized");
    });
}
