//! Diagnostic log file.
//!
//! Every run appends to a log file next to the manifest (`update_ext.log` by
//! default) at debug verbosity. Lines look like
//! `DEBUG : 2024-05-02T14:03:11Z : cwd=/model cmd=git fetch ew-org develop`.
//! The file is never read back by the tool.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use env_logger::{Builder, Target};

use crate::error::{Error, Result};

/// Format a single log line.
pub fn format_line(level: log::Level, timestamp: &str, message: &str) -> String {
    format!("{} : {} : {}", level, timestamp, message)
}

/// Install the global logger, appending to `path`.
///
/// `filter` uses `env_logger` filter syntax (`debug`, `externals_sync=info`).
pub fn init(path: &Path, filter: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Config {
            message: format!("cannot open log file {}: {}", path.display(), e),
        })?;

    Builder::new()
        .parse_filters(filter)
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let timestamp = buf.timestamp_seconds().to_string();
            writeln!(
                buf,
                "{}",
                format_line(record.level(), &timestamp, &record.args().to_string())
            )
        })
        .try_init()
        .map_err(|e| Error::Config {
            message: format!("logger already initialized: {}", e),
        })
}
