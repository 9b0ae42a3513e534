// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sample` module defines the complex baseband sample formats delivered by SDR sources and
//! their normalisation to the signed 16-bit I/Q representation used by the pipeline.

use crate::errors::{config_error, Result};

/// A complex baseband sample, normalised to signed 16-bit components.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IqSample {
    /// The in-phase component.
    pub i: i16,
    /// The quadrature component.
    pub q: i16,
}

impl IqSample {
    #[inline(always)]
    pub fn new(i: i16, q: i16) -> IqSample {
        IqSample { i, q }
    }
}

/// An SDR sample format: a component width and signedness pair, interleaved I then Q.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned 8-bit offset-binary components (rtl-sdr native).
    Cu8,
    /// Signed 8-bit components.
    Cs8,
    /// Signed little-endian 16-bit components.
    Cs16,
    /// 32-bit little-endian float components in [-1.0, 1.0].
    Cf32,
}

impl SampleFormat {
    /// The number of bytes one complex sample occupies in the stream.
    pub fn bytes_per_sample(&self) -> usize {
        match *self {
            SampleFormat::Cu8 | SampleFormat::Cs8 => 2,
            SampleFormat::Cs16 => 4,
            SampleFormat::Cf32 => 8,
        }
    }

    /// The conventional file extension and SigMF datatype string for the format.
    pub fn name(&self) -> &'static str {
        match *self {
            SampleFormat::Cu8 => "cu8",
            SampleFormat::Cs8 => "cs8",
            SampleFormat::Cs16 => "cs16",
            SampleFormat::Cf32 => "cf32",
        }
    }

    /// Parses a format name as used in file extensions and on the command line.
    pub fn parse(name: &str) -> Result<SampleFormat> {
        match name {
            "cu8" => Ok(SampleFormat::Cu8),
            "cs8" => Ok(SampleFormat::Cs8),
            "cs16" => Ok(SampleFormat::Cs16),
            "cf32" => Ok(SampleFormat::Cf32),
            _ => config_error("sample: unknown sample format"),
        }
    }
}

/// Normalises a raw interleaved byte stream of the given format into signed 16-bit I/Q samples
/// appended to `out`. Trailing bytes short of a whole sample are ignored. Returns the number of
/// samples appended.
pub fn normalize(format: SampleFormat, bytes: &[u8], out: &mut Vec<IqSample>) -> usize {
    let before = out.len();

    match format {
        SampleFormat::Cu8 => {
            for pair in bytes.chunks_exact(2) {
                out.push(IqSample::new(cu8_to_i16(pair[0]), cu8_to_i16(pair[1])));
            }
        }
        SampleFormat::Cs8 => {
            for pair in bytes.chunks_exact(2) {
                out.push(IqSample::new(
                    i16::from(pair[0] as i8) << 8,
                    i16::from(pair[1] as i8) << 8,
                ));
            }
        }
        SampleFormat::Cs16 => {
            for quad in bytes.chunks_exact(4) {
                out.push(IqSample::new(
                    i16::from_le_bytes([quad[0], quad[1]]),
                    i16::from_le_bytes([quad[2], quad[3]]),
                ));
            }
        }
        SampleFormat::Cf32 => {
            for oct in bytes.chunks_exact(8) {
                let i = f32::from_le_bytes([oct[0], oct[1], oct[2], oct[3]]);
                let q = f32::from_le_bytes([oct[4], oct[5], oct[6], oct[7]]);
                out.push(IqSample::new(cf32_to_i16(i), cf32_to_i16(q)));
            }
        }
    }

    out.len() - before
}

#[inline(always)]
fn cu8_to_i16(value: u8) -> i16 {
    // rtl-sdr offset binary centres on 127.5; using 128 keeps the conversion integral with a
    // negligible half-LSB bias.
    (i16::from(value) - 128) << 8
}

#[inline(always)]
fn cf32_to_i16(value: f32) -> i16 {
    let clamped = value.clamp(-1.0, 1.0);
    (clamped * 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_format_parse() {
        assert_eq!(SampleFormat::parse("cu8").unwrap(), SampleFormat::Cu8);
        assert_eq!(SampleFormat::parse("cs16").unwrap(), SampleFormat::Cs16);
        assert!(SampleFormat::parse("f64").is_err());
        assert_eq!(SampleFormat::Cf32.bytes_per_sample(), 8);
    }

    #[test]
    fn verify_cu8_normalisation() {
        let mut out = Vec::new();
        let n = normalize(SampleFormat::Cu8, &[128, 128, 255, 0], &mut out);
        assert_eq!(n, 2);
        assert_eq!(out[0], IqSample::new(0, 0));
        assert_eq!(out[1], IqSample::new(127 << 8, -128 << 8));
    }

    #[test]
    fn verify_cs16_normalisation() {
        let mut out = Vec::new();
        let bytes = [0x34, 0x12, 0x00, 0x80, 0xff];
        let n = normalize(SampleFormat::Cs16, &bytes, &mut out);
        // The trailing odd byte is ignored.
        assert_eq!(n, 1);
        assert_eq!(out[0], IqSample::new(0x1234, i16::MIN));
    }

    #[test]
    fn verify_cf32_normalisation() {
        let mut out = Vec::new();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.0f32).to_le_bytes());
        let n = normalize(SampleFormat::Cf32, &bytes, &mut out);
        assert_eq!(n, 1);
        assert_eq!(out[0].i, 16383);
        // Out-of-range input clamps to full scale.
        assert_eq!(out[0].q, -32767);
    }
}
