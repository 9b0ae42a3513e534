// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The SigMF recorder.
//!
//! A recording is a TAR archive holding a `<stem>.sigmf-meta` member (a small JSON document
//! with the data type, sample rate, and one capture) and a `<stem>.sigmf-data` member (the raw
//! samples). The archive uses plain POSIX ustar headers; only the two regular-file members are
//! ever written, so no tar features beyond that are needed.

use std::io::Write;

use crate::errors::Result;
use crate::sample::SampleFormat;

/// Capture parameters recorded in the metadata member.
#[derive(Copy, Clone, Debug)]
pub struct SigmfCapture {
    pub datatype: SampleFormat,
    pub sample_rate: u32,
    /// Tuner centre frequency in Hz.
    pub frequency: u64,
    /// Stream offset of the capture start, in samples.
    pub sample_start: u64,
}

/// Writes a complete SigMF archive for one capture.
pub fn write_sigmf<W: Write>(
    writer: &mut W,
    stem: &str,
    capture: &SigmfCapture,
    data: &[u8],
) -> Result<()> {
    let meta = render_meta(capture);

    write_member(writer, &format!("{}.sigmf-meta", stem), meta.as_bytes())?;
    write_member(writer, &format!("{}.sigmf-data", stem), data)?;

    // Archive end marker: two zero blocks.
    writer.write_all(&[0u8; 1024])?;
    Ok(())
}

/// Writes a SigMF archive for native-endian 16-bit interleaved I/Q samples.
pub fn write_sigmf_cs16<W: Write>(
    writer: &mut W,
    stem: &str,
    sample_rate: u32,
    frequency: u64,
    sample_start: u64,
    samples: &[i16],
) -> Result<()> {
    let capture = SigmfCapture {
        datatype: SampleFormat::Cs16,
        sample_rate,
        frequency,
        sample_start,
    };
    write_sigmf(writer, stem, &capture, bytemuck::cast_slice(samples))
}

fn render_meta(capture: &SigmfCapture) -> String {
    format!(
        concat!(
            "{{\"global\":{{",
            "\"core:datatype\":\"{}\",",
            "\"core:sample_rate\":{},",
            "\"core:version\":\"1.0.0\"",
            "}},\"captures\":[{{",
            "\"core:sample_start\":{},",
            "\"core:frequency\":{}",
            "}}],\"annotations\":[]}}"
        ),
        capture.datatype.name(),
        capture.sample_rate,
        capture.sample_start,
        capture.frequency
    )
}

fn write_member<W: Write>(writer: &mut W, name: &str, data: &[u8]) -> Result<()> {
    writer.write_all(&ustar_header(name, data.len()))?;
    writer.write_all(data)?;

    let partial = data.len() % 512;
    if partial != 0 {
        writer.write_all(&vec![0u8; 512 - partial])?;
    }
    Ok(())
}

fn ustar_header(name: &str, size: usize) -> [u8; 512] {
    let mut header = [0u8; 512];

    let name_bytes = name.as_bytes();
    let len = name_bytes.len().min(100);
    header[..len].copy_from_slice(&name_bytes[..len]);

    header[100..108].copy_from_slice(b"0000644\0");
    header[108..116].copy_from_slice(b"0000000\0");
    header[116..124].copy_from_slice(b"0000000\0");

    let size_field = format!("{:011o}\0", size);
    header[124..136].copy_from_slice(size_field.as_bytes());
    header[136..148].copy_from_slice(b"00000000000\0");

    // The checksum is computed with its own field blanked to spaces.
    header[148..156].copy_from_slice(b"        ");
    header[156] = b'0';
    header[257..263].copy_from_slice(b"ustar\0");
    header[263..265].copy_from_slice(b"00");

    let sum: u32 = header.iter().map(|&b| u32::from(b)).sum();
    let checksum = format!("{:06o}\0 ", sum);
    header[148..156].copy_from_slice(checksum.as_bytes());

    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> SigmfCapture {
        SigmfCapture {
            datatype: SampleFormat::Cu8,
            sample_rate: 250_000,
            frequency: 433_920_000,
            sample_start: 0,
        }
    }

    #[test]
    fn verify_meta_json() {
        let meta = render_meta(&capture());
        assert!(meta.contains("\"core:datatype\":\"cu8\""));
        assert!(meta.contains("\"core:sample_rate\":250000"));
        assert!(meta.contains("\"core:version\":\"1.0.0\""));
        assert!(meta.contains("\"core:frequency\":433920000"));
        assert!(meta.starts_with('{') && meta.ends_with('}'));
    }

    #[test]
    fn verify_archive_layout() {
        let mut archive = Vec::new();
        let data = vec![0xabu8; 700];
        write_sigmf(&mut archive, "capture", &capture(), &data).unwrap();

        // Header + padded meta + header + padded data (1024) + end marker.
        assert_eq!(archive.len() % 512, 0);

        // First member header names the meta file.
        assert_eq!(&archive[..18], &b"capture.sigmf-meta"[..]);
        assert_eq!(&archive[257..262], &b"ustar"[..]);

        // Checksum of the first header verifies.
        let mut head = [0u8; 512];
        head.copy_from_slice(&archive[..512]);
        let stored = std::str::from_utf8(&head[148..154]).unwrap();
        let stored = u32::from_str_radix(stored, 8).unwrap();
        head[148..156].copy_from_slice(b"        ");
        let computed: u32 = head.iter().map(|&b| u32::from(b)).sum();
        assert_eq!(stored, computed);
    }

    #[test]
    fn verify_data_member_contents() {
        let mut archive = Vec::new();
        let data: Vec<u8> = (0..=255).collect();
        write_sigmf(&mut archive, "iq", &capture(), &data).unwrap();

        // Locate the data member: header block 0 is meta, its content is padded to one block,
        // so the data header starts at block 2 and the data at block 3.
        let meta_len = render_meta(&capture()).len();
        assert!(meta_len < 512);
        let data_head = &archive[1024..1536];
        assert_eq!(&data_head[..13], &b"iq.sigmf-data"[..]);
        assert_eq!(&archive[1536..1536 + 256], &data[..]);
    }

    #[test]
    fn verify_cs16_writer() {
        let samples = [1i16, -1, 256, -256];
        let mut archive = Vec::new();
        write_sigmf_cs16(&mut archive, "x", 1_000_000, 868_000_000, 0, &samples).unwrap();
        assert_eq!(archive.len() % 512, 0);

        // Eight data bytes live right after the second header, in native byte order.
        let mut expected = Vec::new();
        for sample in samples {
            expected.extend_from_slice(&sample.to_ne_bytes());
        }
        assert_eq!(&archive[1536..1544], &expected[..]);
    }
}
