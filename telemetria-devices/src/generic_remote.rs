// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic 24-bit PWM remote controls (PT2262-style encoders).
//!
//! OOK, PWM with a 350 us short and 1050 us long pulse and a long inter-repeat gap that splits
//! repeats into rows. The code word carries no integrity check, so a transmission is only
//! accepted when at least two repeats agree ([`BitBuffer::find_repeated_row`]).

use telemetria_core::bitbuf::BitBuffer;
use telemetria_core::device::{Carrier, DeviceContext, DeviceDescriptor, RegisterableDevice};
use telemetria_core::errors::{reject_length, Result};
use telemetria_core::pulsedec::{DecodeParams, Modulation};
use telemetria_core::record::{DataRecord, FormatHint};
use telemetria_core::support_device;

const CODE_BITS: usize = 24;
const MIN_REPEATS: usize = 2;

const FIELDS: &[&str] = &["model", "id", "channel", "command"];

fn decode(ctx: &mut DeviceContext<'_>, bits: &BitBuffer) -> Result<u32> {
    let row = match bits.find_repeated_row(MIN_REPEATS, CODE_BITS) {
        Some(row) if bits.len(row) == CODE_BITS => row,
        _ => return reject_length(),
    };

    let b = bits.extract_bytes(row, 0, CODE_BITS);
    let id = (u32::from(b[0]) << 8) | u32::from(b[1]);
    let channel = b[2] >> 4;
    let command = b[2] & 0x0f;

    let mut record = DataRecord::new();
    record
        .push("model", "Model", "Generic-Remote")
        .push_hinted("id", "Id", id, FormatHint::Hex(4))
        .push("channel", "Channel", channel)
        .push("command", "Command", command);
    ctx.emit(record);

    Ok(1)
}

pub struct GenericRemote;

impl RegisterableDevice for GenericRemote {
    fn descriptors() -> &'static [DeviceDescriptor] {
        static DESCRIPTORS: [DeviceDescriptor; 1] = [support_device!(
            "Generic-Remote",
            Carrier::Ook,
            Modulation::Pwm,
            DecodeParams {
                short_width: 350.0,
                long_width: 1_050.0,
                gap_limit: 2_200.0,
                reset_limit: 12_000.0,
                sync_width: 0.0,
                tolerance: 0.0,
            },
            decode,
            FIELDS
        )];
        &DESCRIPTORS
    }
}
