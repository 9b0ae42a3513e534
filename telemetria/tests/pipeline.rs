// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end pipeline tests: synthetic I/Q in, decoded records out.

use std::sync::{Arc, Mutex};

use telemetria::core::bitbuf::BitBuffer;
use telemetria::core::checksum::lfsr_digest8;
use telemetria::core::device::{Carrier, DeviceContext, DeviceDescriptor};
use telemetria::core::dispatch::{DeviceRegistry, RxContext};
use telemetria::core::dsp::{DemodConfig, DemodTracks, Demodulator};
use telemetria::core::errors::Result;
use telemetria::core::io::pulsefmt;
use telemetria::core::pulse::PulseList;
use telemetria::core::pulsedec::{DecodeParams, Modulation};
use telemetria::core::record::{DataRecord, DataValue};
use telemetria::core::sample::IqSample;
use telemetria::core::sink::{CollectSink, OutputHub};
use telemetria::core::slicer::{PulseSlicer, SlicerMode, SquelchConfig};

const SAMPLE_RATE: u32 = 250_000;
/// Manchester half-bit of the Ambient Weather F007TH, in samples (500 us at 250 kHz).
const HALF_BIT: usize = 125;

/// The F007TH frame from the reference payload, as transmitted bits.
fn f007th_frame_bits(payload: [u8; 5]) -> Vec<bool> {
    let digest = lfsr_digest8(&payload, 0x98, 0x3e) ^ 0x64;
    let mut bytes = vec![0x01, 0x45];
    bytes.extend_from_slice(&payload);
    bytes.push(digest);

    let mut bits = Vec::new();
    for byte in bytes {
        for bit in (0..8).rev() {
            bits.push((byte >> bit) & 1 != 0);
        }
    }
    bits
}

/// Manchester-encodes the bits into carrier on/off half-bit levels. Bit 0 is low-then-high,
/// bit 1 high-then-low.
fn manchester_levels(bits: &[bool]) -> Vec<bool> {
    let mut levels = Vec::with_capacity(bits.len() * 2);
    for &bit in bits {
        levels.push(bit);
        levels.push(!bit);
    }
    levels
}

/// Renders on/off levels as I/Q samples: a rotating carrier at a 20 kHz offset while on,
/// silence while off, plus a trailing silence long enough to reset every registered device.
fn render_iq(levels: &[bool], tail: usize) -> Vec<IqSample> {
    let amplitude = 8_000.0f64;
    let tone = 20_000.0f64;
    let mut samples = Vec::new();
    let mut phase = 0.0f64;
    let step = 2.0 * std::f64::consts::PI * tone / f64::from(SAMPLE_RATE);

    for &level in levels {
        for _ in 0..HALF_BIT {
            if level {
                samples.push(IqSample::new(
                    (phase.cos() * amplitude) as i16,
                    (phase.sin() * amplitude) as i16,
                ));
            }
            else {
                samples.push(IqSample::new(0, 0));
            }
            phase += step;
        }
    }
    samples.extend(std::iter::repeat(IqSample::new(0, 0)).take(tail));
    samples
}

fn collecting_context(registry: DeviceRegistry) -> (RxContext, Arc<Mutex<Vec<DataRecord>>>) {
    let collected = Arc::new(Mutex::new(Vec::new()));
    let hub = OutputHub::direct(vec![Box::new(CollectSink::new(collected.clone()))]);
    (RxContext::new(registry, hub), collected)
}

fn default_registry() -> DeviceRegistry {
    let mut registry = DeviceRegistry::new();
    telemetria::devices::register_all(&mut registry);
    registry
}

#[test]
fn verify_f007th_burst_end_to_end() {
    // Id 0x05, channel 4, battery ok, 86.0 F, 48% humidity.
    let bits = f007th_frame_bits([0x05, 0x34, 0xec, 0x30, 0x0b]);
    let levels = manchester_levels(&bits);

    let registry = default_registry();
    let reset_us = registry.max_reset_limit_us(Carrier::Ook);
    let reset_ticks = (reset_us * SAMPLE_RATE as f32 / 1e6) as usize;

    let (mut ctx, collected) = collecting_context(registry);

    let mut demod = Demodulator::new(DemodConfig {
        sample_rate: SAMPLE_RATE,
        shortest_pulse_us: 500.0,
    });
    let mut slicer =
        PulseSlicer::new(SlicerMode::Ook, SquelchConfig::default(), SAMPLE_RATE, reset_us);

    // The burst arrives in one buffer, the silent tail in the next; the slicer must carry its
    // state across the boundary and finalise on the tail's reset gap.
    let burst = render_iq(&levels, 0);
    let tail = vec![IqSample::new(0, 0); reset_ticks + 500];

    let mut lists = Vec::new();
    for block in [&burst[..], &tail[..]] {
        let mut tracks = DemodTracks::new(SAMPLE_RATE);
        demod.process(block, &mut tracks);
        let baseline = demod.baseline();
        slicer.process(&tracks, &baseline, &mut |list| lists.push(list));
    }

    assert_eq!(lists.len(), 1, "expected exactly one finalised pulse list");
    let stats = ctx.dispatch(&lists[0], Carrier::Ook);
    assert_eq!(stats.events, 1);

    let records = collected.lock().unwrap();
    assert_eq!(records.len(), 1, "expected exactly one record");
    let record = &records[0];

    assert_eq!(record.get("model"), Some(&DataValue::Text("Ambientweather-F007TH".into())));
    assert_eq!(record.get("id"), Some(&DataValue::Integer(0x05)));
    assert_eq!(record.get("channel"), Some(&DataValue::Integer(4)));
    assert_eq!(record.get("battery_ok"), Some(&DataValue::Integer(1)));
    assert_eq!(record.get("temperature_F"), Some(&DataValue::Double(86.0)));
    assert_eq!(record.get("humidity"), Some(&DataValue::Integer(48)));
    assert_eq!(record.get("mic"), Some(&DataValue::Text("DIGEST".into())));
    // The dispatcher stamp leads the field order.
    assert_eq!(record.fields()[0].key, "time");
}

#[test]
fn verify_f007th_pulse_file_round_trip() {
    // The same frame expressed directly as a pulse list, written to the textual pulse format
    // and read back before dispatch.
    let bits = f007th_frame_bits([0x21, 0xb2, 0x5e, 0x41, 0x07]);
    let levels = manchester_levels(&bits);

    let mut list = PulseList::new(1_000_000);
    list.freq_hz = 433_920_000;
    let mut idx = 0;
    while idx < levels.len() && !levels[idx] {
        idx += 1;
    }
    while idx < levels.len() {
        let mut pulse = 0u32;
        while idx < levels.len() && levels[idx] {
            pulse += 500;
            idx += 1;
        }
        let mut gap = 0u32;
        while idx < levels.len() && !levels[idx] {
            gap += 500;
            idx += 1;
        }
        list.push(pulse, if gap == 0 { 20_000 } else { gap });
    }
    {
        let segments = list.segments().to_vec();
        let mut rebuilt = PulseList::new(1_000_000);
        rebuilt.freq_hz = list.freq_hz;
        for (i, seg) in segments.iter().enumerate() {
            rebuilt.push(seg.pulse, if i + 1 == segments.len() { 20_000 } else { seg.gap });
        }
        rebuilt.finalise();
        list = rebuilt;
    }

    let mut text = Vec::new();
    pulsefmt::write_pulses(&mut text, &list).unwrap();
    let lists = pulsefmt::read_pulses(std::io::Cursor::new(text)).unwrap();
    assert_eq!(lists.len(), 1);

    let (mut ctx, collected) = collecting_context(default_registry());
    let stats = ctx.dispatch(&lists[0], Carrier::Ook);
    assert_eq!(stats.events, 1);

    let records = collected.lock().unwrap();
    let record = &records[0];
    assert_eq!(record.get("id"), Some(&DataValue::Integer(0x21)));
    // 0xb2: battery low, channel (3 & 7) + 1 = 4, temperature 0x25e = 20.6 F.
    assert_eq!(record.get("battery_ok"), Some(&DataValue::Integer(0)));
    assert_eq!(record.get("channel"), Some(&DataValue::Integer(4)));
    assert_eq!(record.get("humidity"), Some(&DataValue::Integer(0x41)));
}

fn claim(ctx: &mut DeviceContext<'_>, _bits: &BitBuffer) -> Result<u32> {
    let mut record = DataRecord::new();
    record.push("model", "Model", ctx.device_name());
    ctx.emit(record);
    Ok(1)
}

#[test]
fn verify_first_match_wins_across_devices() {
    // Two devices that both claim any pulse train: only the first registered one may emit.
    let descriptor = |name: &'static str| DeviceDescriptor {
        name,
        carrier: Carrier::Ook,
        modulation: Modulation::Pcm,
        params: DecodeParams {
            short_width: 100.0,
            long_width: 100.0,
            gap_limit: 0.0,
            reset_limit: 10_000.0,
            sync_width: 0.0,
            tolerance: 0.0,
        },
        disabled: false,
        decode: claim,
        fields: &["model"],
    };

    let mut registry = DeviceRegistry::new();
    registry.register_descriptor(descriptor("First"));
    registry.register_descriptor(descriptor("Second"));
    let (mut ctx, collected) = collecting_context(registry);

    let mut list = PulseList::new(1_000_000);
    list.push(100, 100);
    list.push(100, 20_000);
    list.finalise();

    let stats = ctx.dispatch(&list, Carrier::Ook);
    assert_eq!(stats.events, 1);
    let records = collected.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("model"), Some(&DataValue::Text("First".into())));
}
