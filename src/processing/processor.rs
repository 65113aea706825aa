use super::filter_bank::Sample;
use super::shared::SharedFilterBank;
use crate::config::Config;
use crate::error::{ConfigError, FilterError, Result};
use crate::utils::log::{append_events_csv, InstabilityEvent};

use chrono::Utc;
use log::{debug, error, info, warn};
use std::path::Path;

// Events kept in memory between acquisition stops.
const MAX_PENDING_EVENTS: usize = 1024;

// -----------------------------------------------------------------------------
// HOST-FACING PROCESSOR
// -----------------------------------------------------------------------------

/// Adapter between a host's plugin callbacks and the filter bank.
///
/// Settings changes reconfigure the bank with the configured band, buffers are
/// filtered in place, and acquisition start clears the delay state since the
/// samples on either side of a stop are not contiguous.
pub struct Processor {
    config: Config,
    bank: SharedFilterBank,
    faulted: bool,
    buffer_index: u64,
    pending_events: Vec<InstabilityEvent>,
    dropped_events: usize,
}

impl Processor {
    pub fn new(config: Config) -> Self {
        let bank = SharedFilterBank::default();
        bank.set_parallel(config.processor.parallel_channels);
        Processor {
            config,
            bank,
            faulted: false,
            buffer_index: 0,
            pending_events: Vec::with_capacity(MAX_PENDING_EVENTS),
            dropped_events: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle for a settings thread that reconfigures the bank directly.
    pub fn bank(&self) -> &SharedFilterBank {
        &self.bank
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn buffers_processed(&self) -> u64 {
        self.buffer_index
    }

    pub fn pending_events(&self) -> &[InstabilityEvent] {
        &self.pending_events
    }

    // LIFECYCLE ---------------------------------------------------------------

    pub fn on_settings_changed(&mut self, num_channels: usize, sample_rate: f64) -> Result<()> {
        let spec = self.config.band.to_spec(sample_rate);
        match self.bank.configure(num_channels, spec) {
            Ok(()) => {
                info!(
                    "Configured {} channel(s) at {} Hz: order {} band {}-{} Hz",
                    num_channels, sample_rate, spec.order, spec.low_cutoff_hz, spec.high_cutoff_hz
                );
                self.faulted = false;
                Ok(())
            }
            Err(e) => {
                error!("Rejected settings ({} channels, {} Hz): {}", num_channels, sample_rate, e);
                Err(e)
            }
        }
    }

    /// Filter one buffer in place.
    ///
    /// A channel-count mismatch or a missing configuration faults the
    /// session: later buffers are refused with `SessionFaulted` until the
    /// settings are updated or acquisition restarts. Numeric instability is
    /// recovered in place, recorded, and still returned to the caller.
    pub fn on_buffer<S, C>(&mut self, buffer: &mut [C]) -> Result<()>
    where
        S: Sample,
        C: AsMut<[S]> + Send,
    {
        if self.faulted {
            return Err(FilterError::SessionFaulted);
        }

        let result = self.bank.process(buffer);
        let index = self.buffer_index;
        self.buffer_index += 1;

        match result {
            Ok(()) => Ok(()),
            Err(FilterError::NumericInstability { channels }) => {
                warn!(
                    "Non-finite output in buffer {} on channel(s) {:?}, state reset",
                    index, channels
                );
                self.record_event(index, &channels);
                Err(FilterError::NumericInstability { channels })
            }
            Err(e) => {
                error!("Buffer {} could not be filtered, faulting session: {}", index, e);
                self.faulted = true;
                Err(e)
            }
        }
    }

    pub fn reset(&mut self) {
        self.bank.reset();
    }

    pub fn on_acquisition_start(&mut self) {
        info!("Acquisition started");
        self.bank.reset();
        self.faulted = false;
        self.buffer_index = 0;
    }

    pub fn on_acquisition_stop(&mut self) {
        info!(
            "Acquisition stopped after {} buffer(s), {} instability event(s)",
            self.buffer_index,
            self.pending_events.len() + self.dropped_events
        );
        if let Err(e) = self.flush_event_log() {
            error!("Failed to write instability log: {}", e);
        }
    }

    pub fn on_recording_start<P: AsRef<Path>>(&mut self, recording_dir: P) {
        debug!("Recording started: {}", recording_dir.as_ref().display());
    }

    pub fn on_recording_stop(&mut self) {
        debug!("Recording stopped");
    }

    // EVENTS ------------------------------------------------------------------

    fn record_event(&mut self, buffer_index: u64, channels: &[usize]) {
        if self.pending_events.len() >= MAX_PENDING_EVENTS {
            self.dropped_events += 1;
            return;
        }
        self.pending_events.push(InstabilityEvent {
            timestamp: Utc::now(),
            buffer_index,
            channels: channels.to_vec(),
        });
    }

    /// Write pending events to the configured CSV log and clear them.
    /// Without a configured log the events are just discarded.
    pub fn flush_event_log(&mut self) -> std::result::Result<(), ConfigError> {
        if self.dropped_events > 0 {
            warn!("{} instability event(s) were not kept", self.dropped_events);
            self.dropped_events = 0;
        }
        if let Some(path) = &self.config.processor.event_log {
            if !self.pending_events.is_empty() {
                append_events_csv(path, &self.pending_events)?;
            }
        }
        self.pending_events.clear();
        Ok(())
    }
}
