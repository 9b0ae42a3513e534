// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pulse-width modulation: the gap is fixed and carries no information; a pulse near the short
//! width encodes 0, near the long width 1. An optional sync pulse of the configured sync width
//! closes the row without emitting a data bit.

use crate::bitbuf::BitBuffer;
use crate::pulse::PulseList;
use crate::pulsedec::{DecodeParams, TickParams};

pub fn slice_pwm(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    let t = TickParams::new(params, pulses.sample_rate());
    let mut bits = BitBuffer::new();

    let segments = pulses.segments();
    for (n, seg) in segments.iter().enumerate() {
        if is_sync_pulse(&t, seg.pulse) {
            bits.add_sync();
        }
        else {
            match t.classify(seg.pulse) {
                Some(bit) => bits.add_bit(bit),
                None => bits.add_sync(),
            }
        }

        let is_last = n + 1 == segments.len();
        let gap = seg.gap as f32;
        if is_last || gap > t.reset_limit() {
            break;
        }
        if gap > t.gap_limit() {
            bits.add_sync();
        }
    }

    bits
}

/// True when the pulse is best explained as the explicit sync symbol: within tolerance of the
/// sync width, or (with midpoint discrimination) closer to it than to either data symbol.
fn is_sync_pulse(t: &TickParams, pulse: u32) -> bool {
    if t.sync <= 0.0 {
        return false;
    }
    if t.tol > 0.0 {
        return t.matches(pulse, t.sync);
    }
    let d = pulse as f32;
    let to_sync = (d - t.sync).abs();
    to_sync < (d - t.short).abs() && to_sync < (d - t.long).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulsedec::testutil::list_us;

    fn params() -> DecodeParams {
        DecodeParams {
            short_width: 100.0,
            long_width: 300.0,
            sync_width: 600.0,
            gap_limit: 1_000.0,
            reset_limit: 4_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn verify_pwm_bits_in_pulses() {
        let list = list_us(&[(100, 200), (300, 200), (100, 200), (100, 5_000)]);
        let bits = slice_pwm(&list, &params());
        assert_eq!(bits.num_rows(), 1);
        assert_eq!(bits.len(0), 4);
        assert_eq!(bits.row_bytes(0), &[0b0100_0000]);
    }

    #[test]
    fn verify_pwm_sync_pulse() {
        // The 600 us sync pulse closes the row without a data bit.
        let list = list_us(&[(100, 200), (300, 200), (600, 200), (100, 5_000)]);
        let bits = slice_pwm(&list, &params());
        assert_eq!(bits.num_rows(), 2);
        assert_eq!(bits.len(0), 2);
        assert_eq!(bits.row_bytes(0), &[0b0100_0000]);
        assert_eq!(bits.len(1), 1);
        assert_eq!(bits.syncs_before(1), 1);
    }

    #[test]
    fn verify_pwm_long_gap_opens_row() {
        let list = list_us(&[(100, 2_000), (300, 5_000)]);
        let bits = slice_pwm(&list, &params());
        assert_eq!(bits.num_rows(), 2);
        assert_eq!(bits.len(0), 1);
        assert_eq!(bits.len(1), 1);
        assert_eq!(bits.row_bytes(1), &[0b1000_0000]);
    }
}
