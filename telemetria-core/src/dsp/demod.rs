// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `demod` module implements the streaming envelope and frequency demodulator.
//!
//! The demodulator consumes blocks of normalised I/Q samples and produces, for each input
//! sample, one AM (envelope magnitude) and one FM (frequency deviation) track sample. All
//! filter and differentiator state is carried across blocks: splitting an input stream into
//! blocks at any offsets produces bit-identical tracks. There are no failure modes; malformed
//! input simply produces no usable pulses downstream.

use crate::dsp::filter::LowPass;
use crate::sample::IqSample;

/// Smoothing shift for the I/Q DC offset trackers.
const DC_SHIFT: u32 = 11;

/// Envelope estimate smoothing shifts. The estimates move quickly toward new extremes (attack)
/// and recover slowly (decay), giving a smoothed minimum for the noise floor and a smoothed
/// maximum for the signal level.
const EST_ATTACK_SHIFT: u32 = 2;
const EST_DECAY_SHIFT: u32 = 11;

/// Time constant of the rolling magnitude tracker used to scale the FM discriminator.
const MAG_TIME_CONSTANT: f32 = 16.0;

/// Configuration of a demodulator session.
#[derive(Copy, Clone, Debug)]
pub struct DemodConfig {
    /// Input sample rate in Hz.
    pub sample_rate: u32,
    /// The shortest pulse the configured protocols use, in microseconds. The track low-pass
    /// pole is set to roughly half this duration in samples.
    pub shortest_pulse_us: f32,
}

impl Default for DemodConfig {
    fn default() -> Self {
        DemodConfig { sample_rate: 250_000, shortest_pulse_us: 200.0 }
    }
}

impl DemodConfig {
    fn track_time_constant(&self) -> f32 {
        let samples = self.shortest_pulse_us * self.sample_rate as f32 / 1e6;
        (samples * 0.5).max(1.0)
    }
}

/// The demodulator's output for one block: two tracks of the input length.
#[derive(Clone, Debug, Default)]
pub struct DemodTracks {
    /// Envelope magnitude per input sample.
    pub am: Vec<i16>,
    /// Frequency deviation per input sample, full scale at half the sample rate.
    pub fm: Vec<i16>,
    /// The sample rate the tracks were produced at.
    pub sample_rate: u32,
}

impl DemodTracks {
    pub fn new(sample_rate: u32) -> DemodTracks {
        DemodTracks { am: Vec::new(), fm: Vec::new(), sample_rate }
    }

    pub fn clear(&mut self) {
        self.am.clear();
        self.fm.clear();
    }

    pub fn len(&self) -> usize {
        self.am.len()
    }

    pub fn is_empty(&self) -> bool {
        self.am.is_empty()
    }
}

/// The demodulator's rolling envelope statistics. The midpoint of the noise floor and signal
/// level is the slicing threshold.
#[derive(Copy, Clone, Debug, Default)]
pub struct Baseline {
    /// Smoothed minimum of the AM track (noise floor), track units.
    pub noise: i32,
    /// Smoothed maximum of the AM track (signal level), track units.
    pub signal: i32,
}

impl Baseline {
    /// The slicing threshold: the midpoint between noise floor and signal level.
    pub fn threshold(&self) -> i32 {
        (self.noise + self.signal) / 2
    }
}

/// The streaming envelope/frequency demodulator.
pub struct Demodulator {
    config: DemodConfig,
    am_lp: LowPass,
    fm_lp: LowPass,
    mag_lp: LowPass,
    prev: Option<(i32, i32)>,
    dc_i: i32,
    dc_q: i32,
    noise_est: i32,
    signal_est: i32,
}

impl Demodulator {
    pub fn new(config: DemodConfig) -> Demodulator {
        let tau = config.track_time_constant();
        Demodulator {
            config,
            am_lp: LowPass::with_time_constant(tau),
            fm_lp: LowPass::with_time_constant(tau),
            mag_lp: LowPass::with_time_constant(MAG_TIME_CONSTANT),
            prev: None,
            dc_i: 0,
            dc_q: 0,
            noise_est: 0,
            signal_est: 0,
        }
    }

    pub fn config(&self) -> &DemodConfig {
        &self.config
    }

    /// Clears all carried state: filters, the FM differentiator memory, DC offsets, and the
    /// envelope estimates.
    pub fn reset(&mut self) {
        self.am_lp.reset();
        self.fm_lp.reset();
        self.mag_lp.reset();
        self.prev = None;
        self.dc_i = 0;
        self.dc_q = 0;
        self.noise_est = 0;
        self.signal_est = 0;
    }

    /// The current envelope statistics, in AM track units.
    pub fn baseline(&self) -> Baseline {
        Baseline { noise: self.noise_est, signal: self.signal_est }
    }

    /// The current I/Q DC offset estimates, sample units.
    pub fn dc_offset(&self) -> (i32, i32) {
        (self.dc_i, self.dc_q)
    }

    /// Demodulates one block of samples, appending one AM and one FM track sample per input
    /// sample to `tracks`.
    pub fn process(&mut self, samples: &[IqSample], tracks: &mut DemodTracks) {
        tracks.sample_rate = self.config.sample_rate;
        tracks.am.reserve(samples.len());
        tracks.fm.reserve(samples.len());

        for sample in samples {
            // Track and remove the DC offset.
            self.dc_i += (i32::from(sample.i) - self.dc_i) >> DC_SHIFT;
            self.dc_q += (i32::from(sample.q) - self.dc_q) >> DC_SHIFT;
            let i = i32::from(sample.i) - self.dc_i;
            let q = i32::from(sample.q) - self.dc_q;

            // Cheap magnitude: max + min/2 approximates the Euclidean norm within about 12%.
            let (hi, lo) = if i.abs() >= q.abs() { (i.abs(), q.abs()) } else { (q.abs(), i.abs()) };
            let mag = hi + (lo >> 1);

            let am = (self.am_lp.filter(mag) >> 1).min(i32::from(i16::MAX)) as i16;
            tracks.am.push(am);

            let track = i32::from(am);
            if track < self.noise_est {
                self.noise_est += (track - self.noise_est) >> EST_ATTACK_SHIFT;
            }
            else {
                self.noise_est += (track - self.noise_est) >> EST_DECAY_SHIFT;
            }
            if track > self.signal_est {
                self.signal_est += (track - self.signal_est) >> EST_ATTACK_SHIFT;
            }
            else {
                self.signal_est += (track - self.signal_est) >> EST_DECAY_SHIFT;
            }

            // Discriminator: the imaginary part of z[n] * conj(z[n-1]) is |z|^2 sin(dphi),
            // rescaled by the reciprocal of the rolling squared magnitude.
            let mag_est = self.mag_lp.filter(mag);
            let fm = match self.prev {
                Some((pi, pq)) => {
                    let cross = i64::from(q) * i64::from(pi) - i64::from(i) * i64::from(pq);
                    let denom = ((i64::from(mag_est) * i64::from(mag_est)) >> 15).max(1);
                    let deviation =
                        (cross / denom).clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i32;
                    self.fm_lp.filter(deviation).clamp(i32::from(i16::MIN), i32::from(i16::MAX))
                        as i16
                }
                None => 0,
            };
            tracks.fm.push(fm);

            self.prev = Some((i, q));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_samples(count: usize, seed: u64) -> Vec<IqSample> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..count).map(|_| IqSample::new(rng.random::<i16>() / 2, rng.random::<i16>() / 2)).collect()
    }

    #[test]
    fn verify_track_lengths() {
        let mut demod = Demodulator::new(DemodConfig::default());
        let mut tracks = DemodTracks::new(250_000);
        demod.process(&random_samples(777, 1), &mut tracks);
        assert_eq!(tracks.am.len(), 777);
        assert_eq!(tracks.fm.len(), 777);
    }

    #[test]
    fn verify_block_boundary_identity() {
        // Splitting the input into blocks at any offset must produce identical tracks.
        let samples = random_samples(1000, 42);

        let mut whole = Demodulator::new(DemodConfig::default());
        let mut expected = DemodTracks::new(250_000);
        whole.process(&samples, &mut expected);

        for &split in &[1usize, 7, 250, 999] {
            let mut demod = Demodulator::new(DemodConfig::default());
            let mut tracks = DemodTracks::new(250_000);
            demod.process(&samples[..split], &mut tracks);
            demod.process(&samples[split..], &mut tracks);
            assert_eq!(tracks.am, expected.am, "split at {}", split);
            assert_eq!(tracks.fm, expected.fm, "split at {}", split);
        }
    }

    #[test]
    fn verify_envelope_tracks_burst() {
        let mut demod = Demodulator::new(DemodConfig::default());
        let mut tracks = DemodTracks::new(250_000);

        // Silence, then a strong carrier burst.
        let mut samples = vec![IqSample::new(10, -10); 500];
        samples.extend(vec![IqSample::new(12_000, 9_000); 500]);
        demod.process(&samples, &mut tracks);

        let silence_peak = tracks.am[..500].iter().copied().max().unwrap();
        let burst_peak = tracks.am[500..].iter().copied().max().unwrap();
        assert!(i32::from(burst_peak) > 8 * i32::from(silence_peak).max(1));

        let baseline = demod.baseline();
        assert!(baseline.signal > baseline.noise);
        assert!(baseline.threshold() > baseline.noise);
        assert!(baseline.threshold() < baseline.signal);
    }

    #[test]
    fn verify_discriminator_sign() {
        // A positive-frequency rotation must give a positive deviation, and its conjugate a
        // negative one.
        let config = DemodConfig { sample_rate: 250_000, shortest_pulse_us: 100.0 };
        let rate = 250_000.0f64;
        let tone = 20_000.0f64;

        let make = |sign: f64| -> Vec<IqSample> {
            (0..500)
                .map(|n| {
                    let phase = sign * 2.0 * std::f64::consts::PI * tone * n as f64 / rate;
                    IqSample::new(
                        (phase.cos() * 12_000.0) as i16,
                        (phase.sin() * 12_000.0) as i16,
                    )
                })
                .collect()
        };

        let mut demod = Demodulator::new(config);
        let mut tracks = DemodTracks::new(250_000);
        demod.process(&make(1.0), &mut tracks);
        let up: i64 = tracks.fm[100..].iter().map(|&v| i64::from(v)).sum();

        demod.reset();
        tracks.clear();
        demod.process(&make(-1.0), &mut tracks);
        let down: i64 = tracks.fm[100..].iter().map(|&v| i64::from(v)).sum();

        assert!(up > 0, "up = {}", up);
        assert!(down < 0, "down = {}", down);
        assert!((up + down).abs() < up / 4);
    }
}
