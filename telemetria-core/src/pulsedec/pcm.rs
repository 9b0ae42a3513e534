// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pulse-code modulation: both pulse and gap are integer multiples of the short width, and one
//! bit is emitted per short width, one for in-pulse and zero for in-gap. With equal short and
//! long widths this decodes plain NRZ.

use crate::bitbuf::BitBuffer;
use crate::pulse::PulseList;
use crate::pulsedec::{DecodeParams, TickParams};

pub fn slice_pcm(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    slice_pcm_inner(pulses, params, false)
}

/// NRZ-S: plain PCM, but every long gap resets the train instead of opening a new row.
pub fn slice_nrzs(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    slice_pcm_inner(pulses, params, true)
}

fn slice_pcm_inner(
    pulses: &PulseList,
    params: &DecodeParams,
    reset_on_long_gap: bool,
) -> BitBuffer {
    let t = TickParams::new(params, pulses.sample_rate());
    let short = t.short.max(1.0);
    let mut bits = BitBuffer::new();

    let segments = pulses.segments();
    for (n, seg) in segments.iter().enumerate() {
        let ones = (seg.pulse as f32 / short + 0.5) as u32;
        for _ in 0..ones.max(1) {
            bits.add_bit(true);
        }

        let is_last = n + 1 == segments.len();
        let gap = seg.gap as f32;
        if is_last || gap > t.reset_limit() {
            break;
        }
        if gap > t.gap_limit() {
            if reset_on_long_gap {
                break;
            }
            bits.add_sync();
            continue;
        }

        let zeros = (gap / short + 0.5) as u32;
        for _ in 0..zeros {
            bits.add_bit(false);
        }
    }

    bits
}
