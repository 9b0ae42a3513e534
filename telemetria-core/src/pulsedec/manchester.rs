// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Manchester coding with an implicit leading zero bit.
//!
//! Every bit has a mid-bit transition; the first rising edge of a train is taken to be the
//! mid-bit edge of a zero bit, which is prepended to the output. Decoding counts edge spacing:
//! an edge arriving more than one and a half short widths after the previous data edge is a
//! data edge. A falling data edge (end of pulse) emits 1, a rising data edge (end of gap)
//! emits 0.

use crate::bitbuf::BitBuffer;
use crate::pulse::PulseList;
use crate::pulsedec::{DecodeParams, TickParams};

pub fn slice_manchester_zerobit(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    let t = TickParams::new(params, pulses.sample_rate());
    let edge = t.short.max(1.0) * 1.5;
    let mut bits = BitBuffer::new();

    bits.add_bit(false);
    let mut since_edge = 0.0f32;

    let segments = pulses.segments();
    for (n, seg) in segments.iter().enumerate() {
        // The end of the pulse is a falling edge.
        if since_edge + seg.pulse as f32 > edge {
            bits.add_bit(true);
            since_edge = 0.0;
        }
        else {
            since_edge += seg.pulse as f32;
        }

        let is_last = n + 1 == segments.len();
        let gap = seg.gap as f32;
        if is_last || gap > t.reset_limit() {
            break;
        }
        if gap > t.gap_limit() {
            // A new train within the same list restarts with its own implicit zero.
            bits.add_sync();
            bits.add_bit(false);
            since_edge = 0.0;
            continue;
        }

        // The end of the gap is a rising edge.
        if since_edge + gap > edge {
            bits.add_bit(false);
            since_edge = 0.0;
        }
        else {
            since_edge += gap;
        }
    }

    bits
}
