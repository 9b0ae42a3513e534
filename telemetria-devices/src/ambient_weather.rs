// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ambient Weather F007TH thermo-hygrometer (also sold as Froggit FT007TH).
//!
//! OOK, Manchester coded with an implicit leading zero, 500 us half-bit. The frame repeats
//! three times per transmission:
//!
//! ```text
//! 0x01 0x45 | ID | BCCC TTTT | TTTT TTTT | HUMIDITY | RESERVED | DIGEST
//! ```
//!
//! `B` is the low-battery flag, `CCC` the channel minus one, `T` a 12-bit temperature with
//! offset such that `temperature_F = (raw - 400) / 10`, and the digest is
//! `lfsr_digest8(payload, gen 0x98, key 0x3e) ^ 0x64` over the five payload bytes. The
//! reserved byte rolls per transmission and is not reported.

use telemetria_core::bitbuf::BitBuffer;
use telemetria_core::checksum::lfsr_digest8;
use telemetria_core::device::{Carrier, DeviceContext, DeviceDescriptor, RegisterableDevice};
use telemetria_core::errors::{Error, RejectKind, Result};
use telemetria_core::pulsedec::{DecodeParams, Modulation};
use telemetria_core::record::{DataRecord, FormatHint};
use telemetria_core::support_device;

const PREAMBLE: [u8; 2] = [0x01, 0x45];
const PREAMBLE_BITS: usize = 16;
const PAYLOAD_BITS: usize = 48;

const FIELDS: &[&str] =
    &["model", "id", "channel", "battery_ok", "temperature_F", "humidity", "mic"];

fn decode(ctx: &mut DeviceContext<'_>, bits: &BitBuffer) -> Result<u32> {
    let mut worst = RejectKind::Early;

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

        let digest = lfsr_digest8(&b[..5], 0x98, 0x3e) ^ 0x64;
        if digest != b[5] {
            worst = worst.max(RejectKind::Mic);
            continue;
        }

        let id = b[0];
        let battery_ok = b[1] & 0x80 == 0;
        let channel = ((b[1] >> 4) & 0x07) + 1;
        let temp_raw = (u16::from(b[1] & 0x0f) << 8) | u16::from(b[2]);
        let humidity = b[3];

        // -40.0 F to 140.0 F covers the sensor range.
        if temp_raw > 1_800 || humidity > 100 {
            worst = worst.max(RejectKind::Sanity);
            continue;
        }
        let temperature_f = (f64::from(temp_raw) - 400.0) / 10.0;

        let mut record = DataRecord::new();
        record
            .push("model", "Model", "Ambientweather-F007TH")
            .push("id", "Id", id)
            .push("channel", "Channel", channel)
            .push("battery_ok", "Battery", battery_ok)
            .push_hinted("temperature_F", "Temperature", temperature_f, FormatHint::Precision(1))
            .push("humidity", "Humidity", humidity)
            .push("mic", "Integrity", "DIGEST");
        ctx.emit(record);

        // The frame repeats; one event per pulse train is enough.
        return Ok(1);
    }

    Err(Error::Reject(worst))
}

pub struct AmbientWeatherF007th;

impl RegisterableDevice for AmbientWeatherF007th {
    fn descriptors() -> &'static [DeviceDescriptor] {
        static DESCRIPTORS: [DeviceDescriptor; 1] = [support_device!(
            "Ambientweather-F007TH",
            Carrier::Ook,
            Modulation::ManchesterZerobit,
            DecodeParams {
                short_width: 500.0,
                long_width: 500.0,
                gap_limit: 0.0,
                reset_limit: 2_400.0,
                sync_width: 0.0,
                tolerance: 0.0,
            },
            decode,
            FIELDS
        )];
        &DESCRIPTORS
    }
}
