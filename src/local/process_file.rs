use crate::error::{ConfigError, FilterError};
use crate::processing::Processor;

use log::{info, warn};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FileSummary {
    pub channels: usize,
    pub samples: usize,
    pub buffers: usize,
    pub unstable_buffers: usize,
}

/// Stream a CSV recording (one row per sample, one column per channel)
/// through `processor` in buffers of `buffer_size` samples and write the
/// filtered samples to `output_path` with the same layout.
///
/// The processor is configured from the column count and `sample_rate`.
pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    processor: &mut Processor,
    input_path: P,
    output_path: Q,
    sample_rate: f64,
    buffer_size: usize,
    has_headers: bool,
) -> Result<FileSummary, ConfigError> {
    if buffer_size == 0 {
        return Err(ConfigError::Invalid("buffer size must be at least 1".into()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .from_path(input_path.as_ref())?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output_path.as_ref())?;

    let headers = if has_headers {
        Some(reader.headers()?.clone())
    } else {
        None
    };
    let mut records = reader.records();
    let first = records.next().transpose()?;
    let num_channels = match (&headers, &first) {
        (Some(headers), _) => headers.len(),
        (None, Some(record)) => record.len(),
        (None, None) => 0,
    };
    if let Some(headers) = &headers {
        writer.write_record(headers)?;
    }
    if num_channels == 0 {
        writer.flush()?;
        return Ok(FileSummary::default());
    }

    processor
        .on_settings_changed(num_channels, sample_rate)
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    processor.on_acquisition_start();

    let records = first.map(Ok).into_iter().chain(records);
    let start_time = Instant::now();
    let result = stream(processor, records, &mut writer, num_channels, buffer_size)
        .and_then(|summary| {
            writer.flush()?;
            Ok(summary)
        });
    // Pending instability events are flushed on stop, also after a failure
    processor.on_acquisition_stop();
    let summary = result?;

    info!(
        "Filtered {} samples x {} channels in {} buffers ({:?})",
        summary.samples,
        summary.channels,
        summary.buffers,
        start_time.elapsed()
    );
    Ok(summary)
}

fn stream<I, W>(
    processor: &mut Processor,
    mut records: I,
    writer: &mut csv::Writer<W>,
    num_channels: usize,
    buffer_size: usize,
) -> Result<FileSummary, ConfigError>
where
    I: Iterator<Item = csv::Result<csv::StringRecord>>,
    W: std::io::Write,
{
    let mut summary = FileSummary {
        channels: num_channels,
        ..FileSummary::default()
    };
    let mut buffer: Vec<Vec<f64>> = vec![Vec::with_capacity(buffer_size); num_channels];

    loop {
        buffer.iter_mut().for_each(Vec::clear);
        for record in records.by_ref().take(buffer_size) {
            let record = record?;
            if record.len() != num_channels {
                return Err(ConfigError::Invalid(format!(
                    "row {} has {} columns, expected {}",
                    summary.samples + buffer[0].len() + 1,
                    record.len(),
                    num_channels
                )));
            }
            for (row, field) in buffer.iter_mut().zip(record.iter()) {
                let value: f64 = field.parse().map_err(|_| {
                    ConfigError::Invalid(format!("not a number: {:?}", field))
                })?;
                row.push(value);
            }
        }

        let len = buffer[0].len();
        if len == 0 {
            break;
        }

        match processor.on_buffer(&mut buffer) {
            Ok(()) => {}
            Err(FilterError::NumericInstability { channels }) => {
                warn!("Buffer {} reset channel(s) {:?}", summary.buffers, channels);
                summary.unstable_buffers += 1;
            }
            Err(e) => return Err(ConfigError::Invalid(e.to_string())),
        }

        for i in 0..len {
            writer.write_record(buffer.iter().map(|row| row[i].to_string()))?;
        }
        summary.samples += len;
        summary.buffers += 1;
    }
    Ok(summary)
}
