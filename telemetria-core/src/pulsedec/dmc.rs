// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The two differential Manchester family decoders.
//!
//! [`slice_dmc`] counts symbol periods: a pair of successive short (half-bit) periods encodes a
//! level transition and emits 1, a single long (full-bit) period keeps the level and emits 0.
//!
//! [`slice_diff_manchester`] tracks the clock phase instead: a transition occurs at every bit
//! boundary, and the presence of a mid-bit transition encodes 0, its absence 1. The short width
//! parameter is the half-bit period; an unset long width defaults to twice the short width.

use crate::bitbuf::BitBuffer;
use crate::pulse::PulseList;
use crate::pulsedec::{DecodeParams, TickParams};

pub fn slice_dmc(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    let t = effective(params, pulses.sample_rate());
    let mut bits = BitBuffer::new();
    let mut half_pending = false;

    let segments = pulses.segments();
    'outer: for (n, seg) in segments.iter().enumerate() {
        for (k, duration) in [seg.pulse, seg.gap].into_iter().enumerate() {
            let is_gap = k == 1;
            let is_last = n + 1 == segments.len();

            if is_gap {
                let gap = duration as f32;
                if is_last || gap > t.reset_limit() {
                    break 'outer;
                }
                if gap > t.gap_limit() {
                    bits.add_sync();
                    half_pending = false;
                    continue;
                }
            }

            match t.classify(duration) {
                Some(true) => {
                    // A full period keeps the level. A dangling half period before it is a
                    // coding violation.
                    if half_pending {
                        bits.add_sync();
                        half_pending = false;
                    }
                    bits.add_bit(false);
                }
                Some(false) => {
                    if half_pending {
                        bits.add_bit(true);
                        half_pending = false;
                    }
                    else {
                        half_pending = true;
                    }
                }
                None => {
                    bits.add_sync();
                    half_pending = false;
                }
            }
        }
    }

    bits
}

pub fn slice_diff_manchester(pulses: &PulseList, params: &DecodeParams) -> BitBuffer {
    let t = effective(params, pulses.sample_rate());
    let mut bits = BitBuffer::new();
    // The first edge of a train is taken as a bit boundary.
    let mut at_boundary = true;

    let segments = pulses.segments();
    'outer: for (n, seg) in segments.iter().enumerate() {
        for (k, duration) in [seg.pulse, seg.gap].into_iter().enumerate() {
            let is_gap = k == 1;
            let is_last = n + 1 == segments.len();

            if is_gap {
                let gap = duration as f32;
                if is_last || gap > t.reset_limit() {
                    break 'outer;
                }
                if gap > t.gap_limit() {
                    bits.add_sync();
                    at_boundary = true;
                    continue;
                }
            }

            match t.classify(duration) {
                Some(false) => {
                    // A half period steps to the mid-bit point, or completes a bit whose
                    // mid-bit transition was present.
                    if at_boundary {
                        at_boundary = false;
                    }
                    else {
                        at_boundary = true;
                        bits.add_bit(false);
                    }
                }
                Some(true) => {
                    // A full period from a boundary spans a bit without a mid-bit transition.
                    // From the mid-bit point it would cross a boundary without the mandatory
                    // transition, which is a coding violation.
                    if at_boundary {
                        bits.add_bit(true);
                    }
                    else {
                        bits.add_sync();
                        at_boundary = true;
                    }
                }
                None => {
                    bits.add_sync();
                    at_boundary = true;
                }
            }
        }
    }

    bits
}

fn effective(params: &DecodeParams, sample_rate: u32) -> TickParams {
    let mut t = TickParams::new(params, sample_rate);
    if t.long <= 0.0 {
        t.long = t.short * 2.0;
    }
    t
}
