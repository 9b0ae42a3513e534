// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The textual pulse-data format.
//!
//! Line-oriented: a line starting with `;` is a comment, except for the header key-values
//! `;freq <hz>` and `;samplerate <hz>`. Every other non-empty line is a whitespace-separated
//! `pulse_us gap_us` pair. A pair with a zero gap finalises the current pulse list; a file may
//! hold several lists.
//!
//! ```text
//! ;pulse data
//! ;freq 433920000
//! ;samplerate 250000
//! 500 1000
//! 500 2000
//! 500 0
//! ```

use std::io::{BufRead, Write};

use log::warn;

use crate::errors::Result;
use crate::pulse::PulseList;

/// The sample rate assumed when a file carries no `;samplerate` header.
pub const DEFAULT_SAMPLE_RATE: u32 = 250_000;

/// Reads every pulse list in the stream. Durations are stored in microseconds and converted to
/// ticks of the declared sample rate.
pub fn read_pulses<R: BufRead>(reader: R) -> Result<Vec<PulseList>> {
    let mut sample_rate = DEFAULT_SAMPLE_RATE;
    let mut freq_hz = 0u64;
    let mut lists = Vec::new();
    let mut current: Option<PulseList> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix(';') {
            let mut parts = header.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("samplerate"), Some(value)) => {
                    if let Ok(rate) = value.parse::<u32>() {
                        sample_rate = rate.max(1);
                    }
                }
                (Some("freq"), Some(value)) => {
                    if let Ok(freq) = value.parse::<u64>() {
                        freq_hz = freq;
                    }
                }
                _ => {}
            }
            continue;
        }

        let mut parts = line.split_whitespace();
        let pulse_us = parts.next().and_then(|v| v.parse::<f64>().ok());
        let gap_us = parts.next().and_then(|v| v.parse::<f64>().ok());
        let (pulse_us, gap_us) = match (pulse_us, gap_us) {
            (Some(pulse), Some(gap)) => (pulse, gap),
            _ => {
                warn!("pulsefmt: skipping malformed line '{}'", line);
                continue;
            }
        };

        let list = current.get_or_insert_with(|| {
            let mut list = PulseList::new(sample_rate);
            list.freq_hz = freq_hz;
            list
        });

        if gap_us == 0.0 {
            // The terminal pair finalises the list; its pulse still belongs to it.
            let pulse = list.us_to_ticks(pulse_us).max(1);
            list.push(pulse, u32::MAX);
            list.finalise();
            if let Some(done) = current.take() {
                lists.push(done);
            }
        }
        else {
            let pulse = list.us_to_ticks(pulse_us).max(1);
            let gap = list.us_to_ticks(gap_us).max(1);
            list.push(pulse, gap);
        }
    }

    // An unterminated trailing list is still usable.
    if let Some(mut list) = current.take() {
        if !list.is_empty() {
            list.finalise();
            lists.push(list);
        }
    }

    Ok(lists)
}

/// Writes one pulse list in the textual format, with headers.
pub fn write_pulses<W: Write>(writer: &mut W, list: &PulseList) -> Result<()> {
    writeln!(writer, ";pulse data")?;
    if list.freq_hz > 0 {
        writeln!(writer, ";freq {}", list.freq_hz)?;
    }
    writeln!(writer, ";samplerate {}", list.sample_rate())?;

    let segments = list.segments();
    for (n, seg) in segments.iter().enumerate() {
        let pulse = list.ticks_to_us(seg.pulse).round() as u64;
        if n + 1 == segments.len() {
            writeln!(writer, "{} 0", pulse)?;
        }
        else {
            let gap = list.ticks_to_us(seg.gap).round() as u64;
            writeln!(writer, "{} {}", pulse, gap)?;
        }
    }

    Ok(())
}
