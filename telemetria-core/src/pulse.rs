// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `pulse` module implements the pulse list: the primary intermediate representation
//! between the pulse extractor and the pulse-train decoders.
//!
//! A pulse list is an ordered, finite sequence of segments. Every segment begins with a pulse
//! (carrier high) and ends with a gap (carrier low), both measured in integer sample periods.
//! The terminating gap of a finalised list may be arbitrarily long; it records the reset gap
//! that closed the list.

use std::fmt;

/// One (pulse, gap) segment in sample ticks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PulseSegment {
    /// Carrier-high duration, at least one tick.
    pub pulse: u32,
    /// Carrier-low duration following the pulse, at least one tick.
    pub gap: u32,
}

/// An ordered sequence of (pulse, gap) segments with acquisition metadata.
#[derive(Clone, Debug, Default)]
pub struct PulseList {
    segments: Vec<PulseSegment>,
    sample_rate: u32,
    /// Stream offset of the first pulse edge, in samples since acquisition start.
    start_sample: u64,
    /// Centre frequency of the acquisition, for reporting only.
    pub freq_hz: u64,
    /// Rolling mark-frequency deviation estimate over all segments (FSK only).
    pub fsk_f1_est: i32,
    /// Rolling space-frequency deviation estimate over all segments (FSK only).
    pub fsk_f2_est: i32,
    /// Envelope level estimate inside pulses, demodulator units.
    pub ook_high_est: i32,
    /// Envelope level estimate inside gaps, demodulator units.
    pub ook_low_est: i32,
    /// True once a reset gap (or end of stream) finalised the list.
    finalised: bool,
}

impl PulseList {
    pub fn new(sample_rate: u32) -> PulseList {
        PulseList { sample_rate, ..Default::default() }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    pub fn start_sample(&self) -> u64 {
        self.start_sample
    }

    pub fn set_start_sample(&mut self, start: u64) {
        self.start_sample = start;
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PulseSegment] {
        &self.segments
    }

    /// Appends a segment. The extractor calls this on every pulse-start edge, closing the
    /// preceding pulse and gap.
    pub fn push(&mut self, pulse: u32, gap: u32) {
        debug_assert!(pulse >= 1 && gap >= 1);
        self.segments.push(PulseSegment { pulse, gap });
    }

    /// Appends a segment and folds per-segment mark/space deviation means into the rolling
    /// list-wide estimates.
    pub fn push_fsk(&mut self, pulse: u32, gap: u32, f1: i32, f2: i32) {
        self.push(pulse, gap);
        // First segment seeds the estimates, later ones are smoothed in.
        if self.segments.len() == 1 {
            self.fsk_f1_est = f1;
            self.fsk_f2_est = f2;
        }
        else {
            self.fsk_f1_est += (f1 - self.fsk_f1_est) / 2;
            self.fsk_f2_est += (f2 - self.fsk_f2_est) / 2;
        }
    }

    /// Marks the list as finalised by a reset gap or end of stream.
    pub fn finalise(&mut self) {
        self.finalised = true;
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised
    }

    /// Discards all segments and estimates, keeping the sample rate.
    pub fn reset(&mut self) {
        let rate = self.sample_rate;
        let freq = self.freq_hz;
        *self = PulseList::new(rate);
        self.freq_hz = freq;
    }

    /// Converts a tick count to microseconds at this list's sample rate.
    pub fn ticks_to_us(&self, ticks: u32) -> f64 {
        f64::from(ticks) * 1e6 / f64::from(self.sample_rate)
    }

    /// Converts a microsecond duration to ticks at this list's sample rate.
    pub fn us_to_ticks(&self, us: f64) -> u32 {
        (us * f64::from(self.sample_rate) / 1e6).round() as u32
    }

    /// Estimated signal level in dB full scale, from the in-pulse envelope estimate.
    pub fn rssi_db(&self) -> f32 {
        level_db(self.ook_high_est)
    }

    /// Estimated noise floor in dB full scale, from the in-gap envelope estimate.
    pub fn noise_db(&self) -> f32 {
        level_db(self.ook_low_est)
    }

    /// Estimated signal-to-noise ratio in dB.
    pub fn snr_db(&self) -> f32 {
        self.rssi_db() - self.noise_db()
    }
}

/// Converts a demodulator envelope level to dB relative to full scale (16-bit).
fn level_db(level: i32) -> f32 {
    let level = level.max(1) as f32;
    20.0 * (level / 32768.0).log10()
}

impl fmt::Display for PulseList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pulse list: {} segments @ {} Hz, start {}",
            self.segments.len(),
            self.sample_rate,
            self.start_sample
        )?;
        for (i, seg) in self.segments.iter().enumerate() {
            writeln!(
                f,
                "[{:04}] pulse {:5.0} us, gap {:5.0} us",
                i,
                self.ticks_to_us(seg.pulse),
                self.ticks_to_us(seg.gap)
            )?;
        }
        Ok(())
    }
}
