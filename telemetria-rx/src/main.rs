// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Telemetria receiver demo application: decodes ISM-band sensor telemetry from I/Q capture
//! files or textual pulse dumps and prints the decoded records.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{App, Arg, ArgMatches};
use log::{error, info};

use telemetria::core::device::Carrier;
use telemetria::core::dispatch::{DeviceRegistry, DispatchStats, RxContext};
use telemetria::core::dsp::{DemodConfig, DemodTracks, Demodulator};
use telemetria::core::errors::{config_error, Error, Result};
use telemetria::core::io::{pulsefmt, sigmf};
use telemetria::core::pulse::PulseList;
use telemetria::core::sample::{normalize, SampleFormat};
use telemetria::core::sink::RecordSink;
use telemetria::core::slicer::{PulseSlicer, SlicerMode, SquelchConfig};

mod output;

use output::{CsvSink, JsonSink, KvSink};

/// Samples per processing block. One block is also the shutdown polling granularity.
const BLOCK_SAMPLES: usize = 256 * 1024;

/// Output queue depth before the oldest record is dropped.
const OUTPUT_QUEUE_DEPTH: usize = 256;

fn main() {
    pretty_env_logger::init();

    let app = App::new("Telemetria Receiver")
        .version("0.2.0")
        .about("Decode ISM band sensor telemetry from SDR captures")
        .arg(
            Arg::new("read")
                .short('r')
                .long("read")
                .value_name("FILE")
                .help("Read samples (.cu8/.cs8/.cs16/.cf32) or pulse data (.ook) from a file")
                .required_unless_present("list-devices")
                .takes_value(true),
        )
        .arg(
            Arg::new("sample-rate")
                .short('s')
                .long("sample-rate")
                .value_name("HZ")
                .help("Sample rate of the capture")
                .default_value("250000"),
        )
        .arg(
            Arg::new("frequency")
                .short('f')
                .long("frequency")
                .value_name("HZ")
                .help("Centre frequency of the capture, recorded in outputs")
                .default_value("433920000"),
        )
        .arg(
            Arg::new("format")
                .short('F')
                .long("format")
                .value_name("FMT")
                .help("Output format")
                .possible_values(["kv", "json", "csv"])
                .default_value("kv"),
        )
        .arg(
            Arg::new("mode")
                .short('M')
                .long("mode")
                .value_name("MODE")
                .help("Slicer mode")
                .possible_values(["ook", "fsk"])
                .default_value("ook"),
        )
        .arg(
            Arg::new("device")
                .short('R')
                .long("device")
                .value_name("NUM")
                .help("Enable only the given device numbers (see --list-devices)")
                .multiple_occurrences(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("write")
                .short('w')
                .long("write")
                .value_name("FILE")
                .help("Write extracted pulse data to a file")
                .takes_value(true),
        )
        .arg(
            Arg::new("sigmf")
                .long("write-sigmf")
                .value_name("STEM")
                .help("Record the input capture as a SigMF archive <STEM>.sigmf")
                .takes_value(true),
        )
        .arg(
            Arg::new("exhaustive")
                .long("exhaustive")
                .help("Keep probing further devices after one has already matched"),
        )
        .arg(Arg::new("list-devices").long("list-devices").help("List registered devices"));

    let matches = app.try_get_matches().unwrap_or_else(|err| {
        // Usage and configuration problems exit 1; --help and --version exit 0.
        if err.use_stderr() {
            let _ = err.print();
            process::exit(1);
        }
        let _ = err.print();
        process::exit(0);
    });

    match run(&matches) {
        Ok(()) => {}
        Err(err @ Error::ConfigError(_)) => {
            error!("{}", err);
            process::exit(1);
        }
        Err(err) => {
            error!("{}", err);
            process::exit(2);
        }
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let registry = build_registry(matches)?;

    if matches.is_present("list-devices") {
        for (n, device) in registry.devices().iter().enumerate() {
            let state = if device.disabled { " (disabled)" } else { "" };
            println!("[{:02}] {}{}", n + 1, device.name, state);
        }
        return Ok(());
    }

    let sample_rate: u32 = matches
        .value_of("sample-rate")
        .and_then(|v| v.parse().ok())
        .filter(|&rate| rate > 0)
        .ok_or(Error::ConfigError("invalid sample rate"))?;
    let frequency: u64 = matches
        .value_of("frequency")
        .and_then(|v| v.parse().ok())
        .ok_or(Error::ConfigError("invalid frequency"))?;
    let carrier = match matches.value_of("mode") {
        Some("fsk") => Carrier::Fsk,
        _ => Carrier::Ook,
    };

    let sinks = build_sinks(matches, &registry)?;
    let hub = telemetria::core::sink::OutputHub::queued(sinks, OUTPUT_QUEUE_DEPTH);
    let mut ctx = RxContext::new(registry, hub);
    ctx.options.exhaustive = matches.is_present("exhaustive");

    let path =
        Path::new(matches.value_of("read").ok_or(Error::ConfigError("missing input file"))?);
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    let lists = match extension {
        "ook" | "txt" => {
            let reader = BufReader::new(File::open(path)?);
            pulsefmt::read_pulses(reader)?
        }
        ext => {
            let format = SampleFormat::parse(ext)
                .map_err(|_| Error::ConfigError("unrecognised capture file extension"))?;
            slice_capture(matches, &ctx, format, sample_rate, frequency, carrier, path)?
        }
    };

    let mut stats = DispatchStats::default();
    let mut writer = match matches.value_of("write") {
        Some(out) => Some(BufWriter::new(File::create(out)?)),
        None => None,
    };

    for list in &lists {
        if let Some(writer) = writer.as_mut() {
            pulsefmt::write_pulses(writer, list)?;
        }
        let s = ctx.dispatch(list, carrier);
        stats.events += s.events;
        stats.early += s.early;
        stats.length += s.length;
        stats.sanity += s.sanity;
        stats.mic += s.mic;
    }

    info!(
        "{} pulse lists, {} events, rejects: {} early, {} length, {} sanity, {} mic",
        lists.len(),
        stats.events,
        stats.early,
        stats.length,
        stats.sanity,
        stats.mic
    );
    if ctx.outputs.dropped() > 0 {
        info!("{} records dropped by output back-pressure", ctx.outputs.dropped());
    }

    ctx.outputs.shutdown();
    Ok(())
}

fn build_registry(matches: &ArgMatches) -> Result<DeviceRegistry> {
    let mut registry = DeviceRegistry::new();
    telemetria::devices::register_all(&mut registry);

    if let Some(selected) = matches.values_of("device") {
        let mut enabled = vec![false; registry.len()];
        for value in selected {
            let number: usize =
                value.parse().map_err(|_| Error::ConfigError("invalid device number"))?;
            if number == 0 || number > registry.len() {
                return config_error("device number out of range");
            }
            enabled[number - 1] = true;
        }
        for (index, on) in enabled.iter().enumerate() {
            registry.set_enabled(index, *on);
        }
    }

    Ok(registry)
}

fn build_sinks(
    matches: &ArgMatches,
    registry: &DeviceRegistry,
) -> Result<Vec<Box<dyn RecordSink>>> {
    let stdout = Box::new(std::io::stdout());
    let sink: Box<dyn RecordSink> = match matches.value_of("format") {
        Some("kv") | None => Box::new(KvSink::new(stdout)),
        Some("json") => Box::new(JsonSink::new(stdout)),
        Some("csv") => {
            // The column set is the union of what the enabled devices may emit.
            let mut columns = vec!["time".to_string()];
            for device in registry.devices().iter().filter(|d| !d.disabled) {
                for field in device.fields {
                    if !columns.iter().any(|c| c == field) {
                        columns.push((*field).to_string());
                    }
                }
            }
            Box::new(CsvSink::new(stdout, columns))
        }
        _ => return config_error("unrecognised output format"),
    };
    Ok(vec![sink])
}

#[allow(clippy::too_many_arguments)]
fn slice_capture(
    matches: &ArgMatches,
    ctx: &RxContext,
    format: SampleFormat,
    sample_rate: u32,
    frequency: u64,
    carrier: Carrier,
    path: &Path,
) -> Result<Vec<PulseList>> {
    let bytes = std::fs::read(path)?;

    if let Some(stem) = matches.value_of("sigmf") {
        let capture = sigmf::SigmfCapture {
            datatype: format,
            sample_rate,
            frequency,
            sample_start: 0,
        };
        let mut archive = BufWriter::new(File::create(format!("{}.sigmf", stem))?);
        sigmf::write_sigmf(&mut archive, stem, &capture, &bytes)?;
    }

    let mut samples = Vec::new();
    normalize(format, &bytes, &mut samples);
    info!("read {} samples from {}", samples.len(), path.display());

    let shortest_pulse_us = ctx
        .registry
        .devices()
        .iter()
        .filter(|d| !d.disabled && d.carrier == carrier)
        .map(|d| d.params.short_width)
        .fold(f32::INFINITY, f32::min);
    if !shortest_pulse_us.is_finite() {
        return config_error("no devices enabled for the selected mode");
    }
    let reset_limit_us = ctx.registry.max_reset_limit_us(carrier);

    let mut demod = Demodulator::new(DemodConfig { sample_rate, shortest_pulse_us });
    let mode = match carrier {
        Carrier::Ook => SlicerMode::Ook,
        Carrier::Fsk => SlicerMode::Fsk,
    };
    let mut slicer = PulseSlicer::new(mode, SquelchConfig::default(), sample_rate, reset_limit_us);
    slicer.set_freq_hz(frequency);

    // Cooperative shutdown is polled at block boundaries. File runs finish on their own; a
    // frontend wiring a signal handler sets this flag.
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut lists = Vec::new();
    let mut tracks = DemodTracks::new(sample_rate);
    for block in samples.chunks(BLOCK_SAMPLES) {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        tracks.clear();
        demod.process(block, &mut tracks);
        let baseline = demod.baseline();
        slicer.process(&tracks, &baseline, &mut |list| lists.push(list));
    }
    slicer.flush(&mut |list| lists.push(list));

    Ok(lists)
}
