// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `slicer` module implements the pulse extractor: a hysteretic slicer that segments the
//! demodulated tracks into pulse lists.
//!
//! Two modes share one state machine. In OOK mode the AM track is sliced against thresholds
//! derived from the demodulator baseline; in FSK mode the FM track's deviation is sliced
//! against its own rolling mean, the deviation sign labelling mark and space. A sample-buffer
//! boundary never finalises a list; only a gap exceeding the reset limit does. The extractor
//! has no failure modes.

use crate::dsp::demod::{Baseline, DemodTracks};
use crate::pulse::PulseList;

/// Slicing mode for one receiver session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlicerMode {
    /// On-off keying: slice the AM track.
    Ook,
    /// Frequency-shift keying: slice the FM track.
    Fsk,
}

/// Squelch and hysteresis tuning.
///
/// Historical builds carried these as scattered constants (hysteresis of 1/4 with an SNR floor
/// of 6 dB in the earliest slicer, later 1/8 and 3 dB); the values here are the newest tuning
/// and apply everywhere.
#[derive(Copy, Clone, Debug)]
pub struct SquelchConfig {
    /// OOK squelch: suppress pulse starts while the signal estimate is below this multiple of
    /// the noise estimate (an amplitude ratio; 1.41 is about 3 dB).
    pub snr_min_ratio: f32,
    /// Schmitt trigger hysteresis as a divisor of the slicing threshold: the high and low
    /// thresholds sit at threshold ± threshold / `hysteresis_div`.
    pub hysteresis_div: i32,
    /// FSK squelch: suppress pulse starts while the mark/space deviation separation is below
    /// this many FM track units.
    pub fsk_separation_min: i32,
}

impl Default for SquelchConfig {
    fn default() -> Self {
        SquelchConfig { snr_min_ratio: 1.41, hysteresis_div: 8, fsk_separation_min: 1024 }
    }
}

/// Smoothing shift for the FSK rolling deviation mean and the mark/space estimates.
const FSK_MEAN_SHIFT: u32 = 6;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SliceState {
    /// No signal; waiting for a pulse start.
    Idle,
    /// Inside a pulse (carrier high / mark).
    Pulse,
    /// Inside a gap following at least one pulse.
    Gap,
}

/// The streaming pulse extractor.
pub struct PulseSlicer {
    mode: SlicerMode,
    squelch: SquelchConfig,
    sample_rate: u32,
    reset_limit_ticks: u32,
    state: SliceState,
    pulse_ticks: u32,
    gap_ticks: u32,
    list: PulseList,
    /// Stream position of the next sample, in samples since session start.
    position: u64,
    /// Rolling mean of the FM track (FSK mode).
    fm_mean: i32,
    /// Rolling deviation means inside pulses and gaps (FSK mode).
    f1_est: i32,
    f2_est: i32,
}

impl PulseSlicer {
    /// Creates a slicer. `reset_limit_us` is the gap duration beyond which the current pulse
    /// list is finalised and emitted; it should cover the largest reset limit of the
    /// registered devices.
    pub fn new(
        mode: SlicerMode,
        squelch: SquelchConfig,
        sample_rate: u32,
        reset_limit_us: f32,
    ) -> PulseSlicer {
        let reset_limit_ticks = (reset_limit_us * sample_rate as f32 / 1e6).max(1.0) as u32;
        PulseSlicer {
            mode,
            squelch,
            sample_rate,
            reset_limit_ticks,
            state: SliceState::Idle,
            pulse_ticks: 0,
            gap_ticks: 0,
            list: PulseList::new(sample_rate),
            position: 0,
            fm_mean: 0,
            f1_est: 0,
            f2_est: 0,
        }
    }

    pub fn mode(&self) -> SlicerMode {
        self.mode
    }

    /// Tags emitted pulse lists with the acquisition centre frequency, for reporting.
    pub fn set_freq_hz(&mut self, freq_hz: u64) {
        self.list.freq_hz = freq_hz;
    }

    /// Processes one block of demodulated tracks. Every pulse list finalised by a reset gap is
    /// handed to `emit`; slicer state carries over block boundaries.
    pub fn process(
        &mut self,
        tracks: &DemodTracks,
        baseline: &Baseline,
        emit: &mut dyn FnMut(PulseList),
    ) {
        match self.mode {
            SlicerMode::Ook => self.process_ook(tracks, baseline, emit),
            SlicerMode::Fsk => self.process_fsk(tracks, emit),
        }
    }

    /// Drains the in-flight pulse list, if any, at end of stream or shutdown.
    pub fn flush(&mut self, emit: &mut dyn FnMut(PulseList)) {
        if self.state != SliceState::Idle && self.pulse_ticks > 0 {
            let gap = self.gap_ticks.max(1);
            self.close_segment(gap);
        }
        if !self.list.is_empty() {
            self.finalise_list(emit);
        }
        self.state = SliceState::Idle;
        self.pulse_ticks = 0;
        self.gap_ticks = 0;
    }

    fn process_ook(
        &mut self,
        tracks: &DemodTracks,
        baseline: &Baseline,
        emit: &mut dyn FnMut(PulseList),
    ) {
        let threshold = baseline.threshold().max(1);
        let hysteresis = (threshold / self.squelch.hysteresis_div).max(1);
        let high_thr = threshold + hysteresis;
        let low_thr = threshold - hysteresis;

        // Squelch gates new pulse starts only; an ongoing list is always completed.
        let squelched =
            (baseline.signal as f32) < (baseline.noise.max(1) as f32) * self.squelch.snr_min_ratio;

        // Stamp the estimates up front so a list finalised mid-block carries them.
        self.list.ook_high_est = baseline.signal;
        self.list.ook_low_est = baseline.noise;

        for &am in &tracks.am {
            let level = i32::from(am);
            self.step(level > high_thr, level < low_thr, squelched, emit);
            self.position += 1;
        }
    }

    fn process_fsk(&mut self, tracks: &DemodTracks, emit: &mut dyn FnMut(PulseList)) {
        for &fm in &tracks.fm {
            let deviation = i32::from(fm);

            // The mark/space decision is the deviation sign relative to the rolling mean.
            let offset = deviation - self.fm_mean;
            self.fm_mean += offset >> FSK_MEAN_SHIFT;

            let hysteresis = (self.f1_est - self.f2_est).abs() >> 3;
            let high = offset > hysteresis;
            let low = offset < -hysteresis;

            if high {
                self.f1_est += (deviation - self.f1_est) >> FSK_MEAN_SHIFT;
            }
            else if low {
                self.f2_est += (deviation - self.f2_est) >> FSK_MEAN_SHIFT;
            }

            let squelched = (self.f1_est - self.f2_est).abs() < self.squelch.fsk_separation_min;

            self.step(high, low, squelched, emit);
            self.position += 1;
        }

        self.list.fsk_f1_est = self.f1_est;
        self.list.fsk_f2_est = self.f2_est;
    }

    /// One step of the shared Schmitt state machine. `high` and `low` are the hysteresis
    /// comparator outputs; between the thresholds the current state holds.
    fn step(&mut self, high: bool, low: bool, squelched: bool, emit: &mut dyn FnMut(PulseList)) {
        match self.state {
            SliceState::Idle => {
                if high && !squelched {
                    self.state = SliceState::Pulse;
                    self.pulse_ticks = 1;
                    if self.list.is_empty() {
                        self.list.set_start_sample(self.position);
                    }
                }
            }
            SliceState::Pulse => {
                if low {
                    self.state = SliceState::Gap;
                    self.gap_ticks = 1;
                }
                else {
                    self.pulse_ticks += 1;
                }
            }
            SliceState::Gap => {
                if high {
                    // The rising edge closes the previous pulse and gap.
                    let gap = self.gap_ticks;
                    self.close_segment(gap);
                    self.state = SliceState::Pulse;
                    self.pulse_ticks = 1;
                    self.gap_ticks = 0;
                }
                else {
                    self.gap_ticks += 1;
                    if self.gap_ticks > self.reset_limit_ticks {
                        let gap = self.gap_ticks;
                        self.close_segment(gap);
                        self.finalise_list(emit);
                        self.state = SliceState::Idle;
                        self.pulse_ticks = 0;
                        self.gap_ticks = 0;
                    }
                }
            }
        }
    }

    fn close_segment(&mut self, gap: u32) {
        match self.mode {
            SlicerMode::Ook => self.list.push(self.pulse_ticks.max(1), gap.max(1)),
            SlicerMode::Fsk => {
                self.list.push_fsk(self.pulse_ticks.max(1), gap.max(1), self.f1_est, self.f2_est)
            }
        }
    }

    fn finalise_list(&mut self, emit: &mut dyn FnMut(PulseList)) {
        self.list.finalise();
        let mut done = PulseList::new(self.sample_rate);
        std::mem::swap(&mut done, &mut self.list);
        self.list.freq_hz = done.freq_hz;
        if !done.is_empty() {
            emit(done);
        }
    }
}
