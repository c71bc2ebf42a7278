// In: src/observability.rs

//! Diagnostics for the slice-list planners.
//!
//! Two layers: ordinary `log` records at planner decision points, which stay
//! silent until a logger is installed, and the `log_metric!` macro, which emits
//! one structured key/value line per event in debug builds only.

use crate::error::SlicerError;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::sync::Once;

/// Logs a structured key-value metric string to stdout, only in debug builds.
///
/// # Example
/// ```
/// use slicer::log_metric;
/// let frames = 10;
/// log_metric!("event"="global_grid", "pattern"="PROJECTION", "frames"=&frames);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            let output = format!("SLICER_METRIC: {{ {} }}", parts.join(", "));
            println!("{}", output);
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an info-level `env_logger`, optionally appending to `log_file`.
///
/// Only the first call has any effect. A log file that cannot be opened is
/// reported instead of silently falling back to stderr.
pub fn enable_verbose_logging(log_file: Option<String>) -> Result<(), SlicerError> {
    let file = match log_file {
        Some(filename) => Some(OpenOptions::new().append(true).create(true).open(filename)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);

        // Level and message only
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
