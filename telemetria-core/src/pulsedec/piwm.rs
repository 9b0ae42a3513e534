// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pulse-interval-width modulation: the pulse and the gap each carry one symbol; a duration
//! near the short width encodes 0, near the long width 1.

use crate::bitbuf::BitBuffer;
use crate::pulse::PulseList;
use crate::pulsedec::{DecodeParams, TickParams};

pub fn slice_piwm(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    let t = TickParams::new(params, pulses.sample_rate());
    let mut bits = BitBuffer::new();

    let segments = pulses.segments();
    for (n, seg) in segments.iter().enumerate() {
        match t.classify(seg.pulse) {
            Some(bit) => bits.add_bit(bit),
            None => bits.add_sync(),
        }

        let is_last = n + 1 == segments.len();
        let gap = seg.gap as f32;
        if is_last || gap > t.reset_limit() {
            break;
        }
        if gap > t.gap_limit() {
            bits.add_sync();
            continue;
        }

        match t.classify(seg.gap) {
            Some(bit) => bits.add_bit(bit),
            None => bits.add_sync(),
        }
    }

    bits
}
