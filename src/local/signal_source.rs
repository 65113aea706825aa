use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

// -----------------------------------------------------------------------------
// SETUP FOR THE SIMULATED SIGNALS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Tone {
    pub amplitude: f64,
    pub frequency: f64,
    pub start_phase: f64,
}

impl Tone {
    pub fn new(amplitude: f64, frequency: f64) -> Self {
        Self {
            amplitude,
            frequency,
            start_phase: 0.0,
        }
    }
}

/// Continuous multichannel test signal: a sum of tones plus uniform noise.
/// Every channel carries the same tones with a per-channel phase offset.
pub struct SignalSource {
    num_channels: usize,
    sample_rate: f64,
    tones: Vec<Tone>,
    noise_amplitude: f64,
    sample_index: u64,
    rng: StdRng,
}

impl SignalSource {
    pub fn new(num_channels: usize, sample_rate: f64, seed: u64) -> Self {
        Self {
            num_channels,
            sample_rate,
            tones: Vec::new(),
            noise_amplitude: 0.0,
            sample_index: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tones.push(tone);
        self
    }

    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude;
        self
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Next `len` samples of every channel, continuing where the previous
    /// buffer stopped.
    pub fn next_buffer(&mut self, len: usize) -> Vec<Vec<f64>> {
        let mut buffer = vec![vec![0.0; len]; self.num_channels];
        for (channel, row) in buffer.iter_mut().enumerate() {
            let channel_phase = channel as f64 * PI / 8.0;
            for (i, value) in row.iter_mut().enumerate() {
                let t = (self.sample_index + i as u64) as f64 / self.sample_rate;
                *value = self
                    .tones
                    .iter()
                    .map(|tone| {
                        tone.amplitude
                            * (2.0 * PI * tone.frequency * t + tone.start_phase + channel_phase)
                                .sin()
                    })
                    .sum();
            }
            if self.noise_amplitude > 0.0 {
                for value in row.iter_mut() {
                    *value += self.rng.gen_range(-self.noise_amplitude..self.noise_amplitude);
                }
            }
        }
        self.sample_index += len as u64;
        buffer
    }

    /// Buffer length drawn uniformly from `min..=max`, like a host whose block
    /// size changes from call to call.
    pub fn random_buffer_len(&mut self, min: usize, max: usize) -> usize {
        self.rng.gen_range(min..=max.max(min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_continue_the_same_waveform() {
        let mut split = SignalSource::new(2, 1000.0, 1).with_tone(Tone::new(1.0, 50.0));
        let mut whole = SignalSource::new(2, 1000.0, 1).with_tone(Tone::new(1.0, 50.0));

        let mut a = split.next_buffer(30);
        let b = split.next_buffer(70);
        for (row, tail) in a.iter_mut().zip(b) {
            row.extend(tail);
        }
        assert_eq!(a, whole.next_buffer(100));
    }
}
