//! Logging setup
//!
//! Everything in the crate logs through the `log` facade. Binaries call
//! [`init_logging`] once at startup; `env_logger` is the backend and the
//! line format comes from [`LoggingConfig`]. `RUST_LOG` still overrides the
//! configured level per module.
//!
//! ```rust,no_run
//! use rolegate_core::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default().with_format(LogFormat::Json)).unwrap();
//! log::info!("Portal ready");
//! ```

pub mod config;
pub mod formatter;

pub use config::{LogLevel, LoggingConfig};
pub use formatter::{LogFormat, LogLine};

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the global logger
///
/// Safe to call more than once; only the first call takes effect.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = init_logging_internal(config);
    });
    result
}

fn init_logging_internal(config: &LoggingConfig) -> anyhow::Result<()> {
    let format = config.format;

    env_logger::Builder::new()
        .filter_level(config.level.into())
        .parse_default_env()
        .format(move |buf, record| {
            writeln!(buf, "{}", format.format_line(&LogLine::from_record(record)))
        })
        .try_init()?;

    Ok(())
}
