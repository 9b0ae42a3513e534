// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LaCrosse TX29-IT / TX35-DTH temperature and humidity sensors.
//!
//! FSK, NRZ at roughly 17.2 kbps (58 us bit), frame:
//!
//! ```text
//! 0xaa 0x2d 0xd4 | 9III IIII | NR T1 | T2 T3 | W HHHHHHH | CRC8
//! ```
//!
//! The nibble `9` marks the frame length, `I` is the 6-bit sensor id (re-rolled on battery
//! change), `N` the new-battery flag, `T1 T2 T3` the temperature as three BCD digits with
//! `temperature_C = digits / 10 - 40`, `W` the weak-battery flag, and `H` the humidity (106
//! when the sensor has none, as on the TX29). The CRC-8 uses polynomial 0x31, zero init, over
//! the four bytes after the sync word.
//!
//! Earlier revisions of this decoder family shipped three other incompatible TX29/TX35
//! variants (LSB-first framing, a fixed-point temperature experiment, and a split TX35-only
//! table); they are deprecated and intentionally not carried here.

use telemetria_core::bitbuf::BitBuffer;
use telemetria_core::checksum::crc8;
use telemetria_core::device::{Carrier, DeviceContext, DeviceDescriptor, RegisterableDevice};
use telemetria_core::errors::{Error, RejectKind, Result};
use telemetria_core::pulsedec::{DecodeParams, Modulation};
use telemetria_core::record::{DataRecord, FormatHint};
use telemetria_core::support_device;

const PREAMBLE: [u8; 3] = [0xaa, 0x2d, 0xd4];
const PREAMBLE_BITS: usize = 24;
const PAYLOAD_BITS: usize = 40;

/// Humidity reading reported by sensors without a humidity element.
const HUMIDITY_NONE: u8 = 106;

const FIELDS: &[&str] =
    &["model", "id", "battery_ok", "newbattery", "temperature_C", "humidity", "mic"];

fn decode(ctx: &mut DeviceContext<'_>, bits: &BitBuffer) -> Result<u32> {
    let mut worst = RejectKind::Early;
    let mut events = 0;

    for row in 0..bits.num_rows() {
        let len = bits.len(row);
        let pos = bits.search(row, 0, &PREAMBLE, PREAMBLE_BITS);
        if pos >= len {
            continue;
        }
        if pos + PREAMBLE_BITS + PAYLOAD_BITS > len {
            worst = worst.max(RejectKind::Length);
            continue;
        }

        let b = bits.extract_bytes(row, pos + PREAMBLE_BITS, PAYLOAD_BITS);

        if b[0] >> 4 != 9 {
            worst = worst.max(RejectKind::Sanity);
            continue;
        }
        if crc8(&b[..4], 0x31, 0x00) != b[4] {
            worst = worst.max(RejectKind::Mic);
            continue;
        }

        let id = ((b[0] & 0x0f) << 2) | (b[1] >> 6);
        let new_battery = (b[1] >> 5) & 1 != 0;
        let digits = [b[1] & 0x0f, b[2] >> 4, b[2] & 0x0f];
        let weak_battery = b[3] & 0x80 != 0;
        let humidity = b[3] & 0x7f;

        if digits.iter().any(|&d| d > 9) || (humidity > 100 && humidity != HUMIDITY_NONE) {
            worst = worst.max(RejectKind::Sanity);
            continue;
        }
        let temperature_c = f64::from(digits[0]) * 10.0 + f64::from(digits[1])
            + f64::from(digits[2]) / 10.0
            - 40.0;

        let mut record = DataRecord::new();
        record
            .push("model", "Model", "LaCrosse-TX29IT")
            .push("id", "Id", id)
            .push("battery_ok", "Battery", !weak_battery)
            .push("newbattery", "New battery", new_battery)
            .push_hinted("temperature_C", "Temperature", temperature_c, FormatHint::Precision(1));
        if humidity != HUMIDITY_NONE {
            record.push("humidity", "Humidity", humidity);
        }
        record.push("mic", "Integrity", "CRC");
        ctx.emit(record);
        events += 1;
    }

    if events > 0 {
        Ok(events)
    }
    else {
        Err(Error::Reject(worst))
    }
}

pub struct LacrosseTx29;

impl RegisterableDevice for LacrosseTx29 {
    fn descriptors() -> &'static [DeviceDescriptor] {
        static DESCRIPTORS: [DeviceDescriptor; 1] = [support_device!(
            "LaCrosse-TX29IT",
            Carrier::Fsk,
            Modulation::Pcm,
            DecodeParams {
                short_width: 58.0,
                long_width: 58.0,
                gap_limit: 0.0,
                reset_limit: 4_000.0,
                sync_width: 0.0,
                tolerance: 0.0,
            },
            decode,
            FIELDS
        )];
        &DESCRIPTORS
    }
}
