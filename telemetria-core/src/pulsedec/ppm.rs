// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pulse-position modulation: the pulse width is fixed and carries no information; a gap near
//! the short width encodes 0, near the long width 1, and above the gap limit a row break.

use crate::bitbuf::BitBuffer;
use crate::pulse::PulseList;
use crate::pulsedec::{DecodeParams, TickParams};

pub fn slice_ppm(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    let t = TickParams::new(params, pulses.sample_rate());
    let mut bits = BitBuffer::new();

    let segments = pulses.segments();
    for (n, seg) in segments.iter().enumerate() {
        let is_last = n + 1 == segments.len();
        let gap = seg.gap as f32;

        if gap > t.reset_limit() {
            break;
        }
        if gap > t.gap_limit() {
            if is_last {
                break;
            }
            bits.add_sync();
            continue;
        }
        if is_last {
            // The terminating gap carries no symbol.
            break;
        }

        match t.classify(seg.gap) {
            Some(bit) => bits.add_bit(bit),
            None => bits.add_sync(),
        }
    }

    bits
}
