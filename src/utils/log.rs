use crate::error::ConfigError;

use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::path::Path;

/// Initialise `env_logger` from a `-v` count: warn, info, debug, then trace.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    // A host or test harness may already have installed a logger
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}

/// A buffer in which one or more channels produced non-finite output.
#[derive(Debug, Clone, PartialEq)]
pub struct InstabilityEvent {
    pub timestamp: DateTime<Utc>,
    pub buffer_index: u64,
    pub channels: Vec<usize>,
}

/// Appends events to a CSV file, creating headers if the file is new
///
/// # Arguments
///
/// * `path` - The CSV file to append to
/// * `events` - Rows to append, one per event
///
/// # Returns
///
/// * `Result<(), ConfigError>` - Success or error result
pub fn append_events_csv<P: AsRef<Path>>(
    path: P,
    events: &[InstabilityEvent],
) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let file_exists = path.exists();

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    // Write headers if file is new
    if !file_exists {
        writer.write_record(["timestamp", "buffer_index", "channels"])?;
    }

    for event in events {
        let channels = event
            .channels
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writer.write_record([
            event.timestamp.to_rfc3339(),
            event.buffer_index.to_string(),
            channels,
        ])?;
    }
    writer.flush()?;

    Ok(())
}
