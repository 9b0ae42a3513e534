// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `pulsedec` module implements the pulse-train decoders: one small state machine per
//! modulation family, each converting a pulse list into a bit buffer using the device's timing
//! parameters.
//!
//! All families share the tolerance semantics: a measured duration `d` matches a target `T`
//! when `|d - T| <= tolerance`. With a zero tolerance the families fall back to midpoint (or
//! nearest-target) discrimination, which is what most catalog entries rely on. All families
//! share the gap handling: a gap above the gap limit closes the current row, a gap above the
//! reset limit (or an exhausted list) finalises the buffer.

use crate::bitbuf::BitBuffer;
use crate::pulse::PulseList;

mod dmc;
mod manchester;
mod pcm;
mod piwm;
mod ppm;
mod pwm;

pub use dmc::{slice_diff_manchester, slice_dmc};
pub use manchester::slice_manchester_zerobit;
pub use pcm::{slice_nrzs, slice_pcm};
pub use piwm::slice_piwm;
pub use ppm::slice_ppm;
pub use pwm::slice_pwm;

/// A modulation family, naming the pulse-train decoder a device uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Modulation {
    /// Pulse-code modulation: both pulse and gap are integer multiples of the short width.
    Pcm,
    /// Pulse-position modulation: fixed pulse width, information in the gap.
    Ppm,
    /// Pulse-width modulation: fixed gap, information in the pulse.
    Pwm,
    /// Manchester coding with an implicit leading zero bit.
    ManchesterZerobit,
    /// Differential Manchester: a bit boundary at every clock, mid-bit transition encodes 0.
    DiffManchester,
    /// Pulse-interval-width modulation: pulse and gap each carry one symbol.
    Piwm,
    /// PCM resetting on every long gap.
    NrzS,
    /// Differential Manchester variant: a short-period pair encodes 1, a long period 0.
    Dmc,
}

/// Device timing parameters, in microseconds, as registered by a device descriptor.
#[derive(Copy, Clone, Debug, Default)]
pub struct DecodeParams {
    /// Nominal width of the short (or only) symbol.
    pub short_width: f32,
    /// Nominal width of the long symbol. Zero when the family does not use one.
    pub long_width: f32,
    /// A gap longer than this closes the current row.
    pub gap_limit: f32,
    /// A gap longer than this finalises the bit buffer.
    pub reset_limit: f32,
    /// Nominal width of an explicit sync symbol. Zero when the family does not use one.
    pub sync_width: f32,
    /// Timing tolerance; zero selects midpoint discrimination.
    pub tolerance: f32,
}

/// Device timing parameters converted to sample ticks of a particular pulse list.
#[derive(Copy, Clone, Debug)]
pub(crate) struct TickParams {
    pub short: f32,
    pub long: f32,
    pub gap: f32,
    pub reset: f32,
    pub sync: f32,
    pub tol: f32,
}

impl TickParams {
    pub(crate) fn new(params: &DecodeParams, sample_rate: u32) -> TickParams {
        let scale = sample_rate as f32 / 1e6;
        TickParams {
            short: params.short_width * scale,
            long: params.long_width * scale,
            gap: params.gap_limit * scale,
            reset: params.reset_limit * scale,
            sync: params.sync_width * scale,
            tol: params.tolerance * scale,
        }
    }

    /// The effective reset limit; an unset limit never resets.
    pub(crate) fn reset_limit(&self) -> f32 {
        if self.reset > 0.0 {
            self.reset
        }
        else {
            f32::INFINITY
        }
    }

    /// The effective gap limit; an unset limit defers to the reset limit.
    pub(crate) fn gap_limit(&self) -> f32 {
        if self.gap > 0.0 {
            self.gap
        }
        else {
            self.reset_limit()
        }
    }

    /// True when the duration matches the target under the configured tolerance.
    pub(crate) fn matches(&self, duration: u32, target: f32) -> bool {
        (duration as f32 - target).abs() <= self.tol
    }

    /// Classifies a duration as the nearest of the short and long targets: false for short,
    /// true for long. With a non-zero tolerance, `None` when neither target matches.
    pub(crate) fn classify(&self, duration: u32) -> Option<bool> {
        if self.tol > 0.0 {
            if self.matches(duration, self.short) {
                Some(false)
            }
            else if self.matches(duration, self.long) {
                Some(true)
            }
            else {
                None
            }
        }
        else {
            Some(duration as f32 >= (self.short + self.long) * 0.5)
        }
    }
}

/// Runs the pulse-train decoder of the given modulation family over a pulse list.
pub fn slice(modulation: Modulation, pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    match modulation {
        Modulation::Pcm => slice_pcm(pulses, params),
        Modulation::Ppm => slice_ppm(pulses, params),
        Modulation::Pwm => slice_pwm(pulses, params),
        Modulation::ManchesterZerobit => slice_manchester_zerobit(pulses, params),
        Modulation::DiffManchester => slice_diff_manchester(pulses, params),
        Modulation::Piwm => slice_piwm(pulses, params),
        Modulation::NrzS => slice_nrzs(pulses, params),
        Modulation::Dmc => slice_dmc(pulses, params),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_tick_conversion() {
        let params = DecodeParams {
            short_width: 500.0,
            long_width: 1000.0,
            gap_limit: 2000.0,
            reset_limit: 4000.0,
            sync_width: 0.0,
            tolerance: 100.0,
        };
        let ticks = TickParams::new(&params, 250_000);
        assert_eq!(ticks.short, 125.0);
        assert_eq!(ticks.long, 250.0);
        assert_eq!(ticks.tol, 25.0);
    }

    #[test]
    fn verify_tolerance_matching() {
        let params = DecodeParams {
            short_width: 100.0,
            long_width: 200.0,
            tolerance: 10.0,
            ..Default::default()
        };
        let ticks = TickParams::new(&params, 1_000_000);
        assert_eq!(ticks.classify(95), Some(false));
        assert_eq!(ticks.classify(110), Some(false));
        assert_eq!(ticks.classify(205), Some(true));
        assert_eq!(ticks.classify(150), None);

        // Zero tolerance falls back to midpoint discrimination.
        let loose = DecodeParams { short_width: 100.0, long_width: 200.0, ..Default::default() };
        let ticks = TickParams::new(&loose, 1_000_000);
        assert_eq!(ticks.classify(149), Some(false));
        assert_eq!(ticks.classify(150), Some(true));
    }
}
