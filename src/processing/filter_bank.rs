use crate::error::{FilterError, Result};
use crate::filters::{design, Cascade, FilterSpec};

use rayon::prelude::*;
use std::sync::Arc;

// -----------------------------------------------------------------------------
// SAMPLE TYPES
// -----------------------------------------------------------------------------

/// Storage type of host samples. Filtering always runs in `f64`.
pub trait Sample: Copy + Send + Sync {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl Sample for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

// -----------------------------------------------------------------------------
// CHANNEL STATE
// -----------------------------------------------------------------------------

/// Delay registers of one channel, one pair per cascade section.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    delays: Vec<[f64; 2]>,
}

impl ChannelState {
    pub fn new(num_sections: usize) -> Self {
        ChannelState {
            delays: vec![[0.0; 2]; num_sections],
        }
    }

    pub fn reset(&mut self) {
        self.delays.iter_mut().for_each(|d| *d = [0.0; 2]);
    }

    pub fn is_zero(&self) -> bool {
        self.delays.iter().all(|d| d[0] == 0.0 && d[1] == 0.0)
    }

    pub fn delays(&self) -> &[[f64; 2]] {
        &self.delays
    }

    // Filters `samples` in place. Returns false if a non-finite value showed
    // up; the state is zeroed at that sample and the sample is written as 0.
    // A non-finite register reaches the output within two samples, so the
    // registers themselves are only checked once the buffer is done.
    fn filter_in_place<S: Sample>(&mut self, cascade: &Cascade, samples: &mut [S]) -> bool {
        let mut finite = true;
        for sample in samples.iter_mut() {
            let output = cascade.filter_sample(sample.to_f64(), &mut self.delays);
            if output.is_finite() {
                *sample = S::from_f64(output);
            } else {
                finite = false;
                self.reset();
                *sample = S::from_f64(0.0);
            }
        }
        if !self.delays.iter().flatten().all(|d| d.is_finite()) {
            finite = false;
            self.reset();
        }
        finite
    }
}

// -----------------------------------------------------------------------------
// FILTER BANK
// -----------------------------------------------------------------------------

struct Configuration {
    spec: FilterSpec,
    cascade: Arc<Cascade>,
    states: Vec<ChannelState>,
    // Per-channel result of the last `process`, sized once in `configure`
    unstable: Vec<bool>,
}

/// One shared band-pass cascade applied independently to every channel, with
/// per-channel delay state carried from one `process` call to the next.
#[derive(Default)]
pub struct FilterBank {
    configuration: Option<Configuration>,
    parallel: bool,
}

impl FilterBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(num_channels: usize, spec: FilterSpec) -> Result<Self> {
        let mut bank = Self::new();
        bank.configure(num_channels, spec)?;
        Ok(bank)
    }

    /// Process channels on the rayon pool instead of sequentially.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Design the cascade for `spec` and allocate zeroed state for
    /// `num_channels`. On error the previous configuration is kept.
    pub fn configure(&mut self, num_channels: usize, spec: FilterSpec) -> Result<()> {
        if num_channels == 0 {
            return Err(FilterError::InvalidSpecification(
                "channel count must be at least 1".to_string(),
            ));
        }
        let cascade = Arc::new(design(&spec)?);
        let states = (0..num_channels)
            .map(|_| ChannelState::new(cascade.len()))
            .collect();

        self.configuration = Some(Configuration {
            spec,
            cascade,
            states,
            unstable: vec![false; num_channels],
        });
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.configuration.is_some()
    }

    pub fn num_channels(&self) -> usize {
        self.configuration
            .as_ref()
            .map_or(0, |config| config.states.len())
    }

    pub fn spec(&self) -> Option<&FilterSpec> {
        self.configuration.as_ref().map(|config| &config.spec)
    }

    pub fn cascade(&self) -> Option<&Arc<Cascade>> {
        self.configuration.as_ref().map(|config| &config.cascade)
    }

    pub fn channel_state(&self, channel: usize) -> Option<&ChannelState> {
        self.configuration
            .as_ref()
            .and_then(|config| config.states.get(channel))
    }

    /// Filter every channel of `buffer` in place.
    ///
    /// The buffer is left untouched on `NotConfigured` and
    /// `ChannelCountMismatch`. On `NumericInstability` the whole buffer has
    /// been filtered and the listed channels were reset mid-buffer.
    pub fn process<S, C>(&mut self, buffer: &mut [C]) -> Result<()>
    where
        S: Sample,
        C: AsMut<[S]> + Send,
    {
        let parallel = self.parallel;
        let config = self
            .configuration
            .as_mut()
            .ok_or(FilterError::NotConfigured)?;

        if buffer.len() != config.states.len() {
            return Err(FilterError::ChannelCountMismatch {
                expected: config.states.len(),
                actual: buffer.len(),
            });
        }

        let cascade: &Cascade = &config.cascade;
        if parallel && buffer.len() > 1 {
            buffer
                .par_iter_mut()
                .zip(config.states.par_iter_mut())
                .zip(config.unstable.par_iter_mut())
                .for_each(|((samples, state), unstable)| {
                    *unstable = !state.filter_in_place(cascade, samples.as_mut());
                });
        } else {
            for ((samples, state), unstable) in buffer
                .iter_mut()
                .zip(config.states.iter_mut())
                .zip(config.unstable.iter_mut())
            {
                *unstable = !state.filter_in_place(cascade, samples.as_mut());
            }
        }

        if !config.unstable.contains(&true) {
            return Ok(());
        }
        let channels = config
            .unstable
            .iter()
            .enumerate()
            .filter_map(|(channel, &unstable)| unstable.then_some(channel))
            .collect();
        Err(FilterError::NumericInstability { channels })
    }

    /// Zero every channel's delay state, keeping the cascade.
    pub fn reset(&mut self) {
        if let Some(config) = self.configuration.as_mut() {
            config.states.iter_mut().for_each(ChannelState::reset);
        }
    }
}
