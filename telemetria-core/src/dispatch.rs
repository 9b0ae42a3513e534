// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `dispatch` module runs every registered device decoder over each finalised pulse list
//! and forwards emitted records to the output sinks.
//!
//! The registry is built once at startup and is immutable during reception. Dispatch policy is
//! first-match-wins: as soon as one device emits at least one event for a pulse list, the
//! remaining devices are skipped, preventing spurious multi-device matches on the same signal.
//! Exhaustive probing is available as an explicit option.

use log::{debug, trace, warn};

use crate::device::{Carrier, DeviceContext, DeviceDescriptor, RegisterableDevice};
use crate::errors::{Error, RejectKind};
use crate::pulse::PulseList;
use crate::pulsedec;
use crate::sink::OutputHub;

/// The immutable device registry. Devices are probed in registration order.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceRegistry {
    pub fn new() -> DeviceRegistry {
        DeviceRegistry { devices: Vec::new() }
    }

    /// Registers all descriptors of a device module.
    pub fn register<D: RegisterableDevice>(&mut self) {
        for descriptor in D::descriptors() {
            self.register_descriptor(descriptor.clone());
        }
    }

    /// Registers one descriptor.
    pub fn register_descriptor(&mut self, descriptor: DeviceDescriptor) {
        debug!("registered device '{}'", descriptor.name);
        self.devices.push(descriptor);
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Enables or disables the device at the given registration index. Disabled devices stay
    /// registered but are skipped. Intended for startup configuration; the registry must not
    /// change once reception starts.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(device) = self.devices.get_mut(index) {
            device.disabled = !enabled;
        }
    }

    /// The largest reset limit over all enabled devices of the carrier class, in microseconds.
    /// The slicer session uses this so no device sees its trains split early.
    pub fn max_reset_limit_us(&self, carrier: Carrier) -> f32 {
        self.devices
            .iter()
            .filter(|d| !d.disabled && d.carrier == carrier)
            .map(|d| d.params.reset_limit)
            .fold(0.0, f32::max)
    }
}

/// Dispatch policy options.
#[derive(Copy, Clone, Debug, Default)]
pub struct DispatchOptions {
    /// Continue probing the remaining devices after one has already claimed the pulse list.
    pub exhaustive: bool,
}

/// Counters accumulated over dispatched pulse lists.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Decoded events emitted.
    pub events: u64,
    /// Rejects per kind: no header, bad length, implausible content, failed integrity check.
    pub early: u64,
    pub length: u64,
    pub sanity: u64,
    pub mic: u64,
}

impl DispatchStats {
    fn count(&mut self, kind: RejectKind) {
        match kind {
            RejectKind::Early => self.early += 1,
            RejectKind::Length => self.length += 1,
            RejectKind::Sanity => self.sanity += 1,
            RejectKind::Mic => self.mic += 1,
        }
    }
}

/// A monotonic-enough clock for stamping decoded events, threaded through the context so tests
/// can pin time.
pub trait ClockSource: Send + Sync {
    /// Microseconds since the Unix epoch.
    fn now_us(&self) -> u64;
}

/// The wall clock.
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_us(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_micros() as u64).unwrap_or(0)
    }
}

/// The receiver context: registry, outputs, options, and clock. One per SDR source; no module
/// state exists outside it.
pub struct RxContext {
    pub registry: DeviceRegistry,
    pub outputs: OutputHub,
    pub options: DispatchOptions,
    pub clock: Box<dyn ClockSource>,
}

impl RxContext {
    pub fn new(registry: DeviceRegistry, outputs: OutputHub) -> RxContext {
        RxContext {
            registry,
            outputs,
            options: DispatchOptions::default(),
            clock: Box::new(SystemClock),
        }
    }

    /// Dispatches one finalised pulse list to every enabled device of its carrier class.
    /// Returns the per-list statistics; emitted records have already been forwarded to the
    /// output sinks.
    pub fn dispatch(&mut self, pulses: &PulseList, carrier: Carrier) -> DispatchStats {
        let mut stats = DispatchStats::default();
        if pulses.is_empty() {
            return stats;
        }

        let now_us = self.clock.now_us();
        let mut events = Vec::new();

        for device in self.registry.devices() {
            if device.disabled || device.carrier != carrier {
                continue;
            }

            let bits = pulsedec::slice(device.modulation, pulses, &device.params);
            if bits.is_empty() {
                continue;
            }

            events.clear();
            let mut ctx = DeviceContext::new(device.name, &mut events);
            match (device.decode)(&mut ctx, &bits) {
                Ok(count) => {
                    trace!("device '{}' claimed pulse list ({} events)", device.name, count);
                    stats.events += u64::from(count);
                    for mut record in events.drain(..) {
                        record.push_front("time", "Time", format_time_us(now_us));
                        self.outputs.send(record);
                    }
                    if !self.options.exhaustive {
                        break;
                    }
                }
                Err(Error::Reject(kind)) => {
                    trace!("device '{}' reject: {:?}", device.name, kind);
                    stats.count(kind);
                }
                Err(err) => {
                    warn!("device '{}' failed: {}", device.name, err);
                }
            }
        }

        stats
    }
}

/// Formats a microsecond Unix timestamp as `YYYY-MM-DD HH:MM:SS.ssssss` UTC.
fn format_time_us(us: u64) -> String {
    let secs = us / 1_000_000;
    let frac = us % 1_000_000;

    // Civil-from-days conversion (Howard Hinnant's algorithm), days relative to 1970-01-01.
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
        year,
        month,
        day,
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60,
        frac
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbuf::BitBuffer;
    use crate::device::DeviceContext;
    use crate::errors::{reject_mic, Result};
    use crate::pulsedec::{DecodeParams, Modulation};
    use crate::record::{DataRecord, DataValue};
    use crate::sink::{CollectSink, OutputHub};
    use std::sync::{Arc, Mutex};

    struct FixedClock;

    impl ClockSource for FixedClock {
        fn now_us(&self) -> u64 {
            1_767_225_600_000_000
        }
    }

    fn decode_claim_a(ctx: &mut DeviceContext<'_>, _bits: &BitBuffer) -> Result<u32> {
        let mut record = DataRecord::new();
        record.push("model", "Model", ctx.device_name());
        ctx.emit(record);
        Ok(1)
    }

    fn decode_claim_b(ctx: &mut DeviceContext<'_>, _bits: &BitBuffer) -> Result<u32> {
        let mut record = DataRecord::new();
        record.push("model", "Model", ctx.device_name());
        ctx.emit(record);
        Ok(1)
    }

    fn decode_reject(_ctx: &mut DeviceContext<'_>, _bits: &BitBuffer) -> Result<u32> {
        reject_mic()
    }

    fn descriptor(name: &'static str, decode: crate::device::DecodeFn) -> DeviceDescriptor {
        DeviceDescriptor {
            name,
            carrier: Carrier::Ook,
            modulation: Modulation::Ppm,
            params: DecodeParams {
                short_width: 1_000.0,
                long_width: 2_000.0,
                gap_limit: 3_000.0,
                ..Default::default()
            },
            disabled: false,
            decode,
            fields: &["model"],
        }
    }

    fn sample_pulses() -> PulseList {
        let mut list = PulseList::new(1_000_000);
        list.push(500, 1_000);
        list.push(500, 2_000);
        list.push(500, 5_000);
        list.finalise();
        list
    }

    fn context_with(
        devices: Vec<DeviceDescriptor>,
    ) -> (RxContext, Arc<Mutex<Vec<DataRecord>>>) {
        let mut registry = DeviceRegistry::new();
        for device in devices {
            registry.register_descriptor(device);
        }
        let collected = Arc::new(Mutex::new(Vec::new()));
        let hub = OutputHub::direct(vec![Box::new(CollectSink::new(collected.clone()))]);
        let mut ctx = RxContext::new(registry, hub);
        ctx.clock = Box::new(FixedClock);
        (ctx, collected)
    }

    #[test]
    fn verify_first_match_wins() {
        let (mut ctx, collected) =
            context_with(vec![descriptor("A", decode_claim_a), descriptor("B", decode_claim_b)]);

        let stats = ctx.dispatch(&sample_pulses(), Carrier::Ook);
        assert_eq!(stats.events, 1);

        let records = collected.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("model"), Some(&DataValue::Text("A".to_string())));
    }

    #[test]
    fn verify_exhaustive_probing() {
        let (mut ctx, collected) =
            context_with(vec![descriptor("A", decode_claim_a), descriptor("B", decode_claim_b)]);
        ctx.options.exhaustive = true;

        let stats = ctx.dispatch(&sample_pulses(), Carrier::Ook);
        assert_eq!(stats.events, 2);
        assert_eq!(collected.lock().unwrap().len(), 2);
    }

    #[test]
    fn verify_reject_counting_and_disabled_skip() {
        let mut rejecting = descriptor("R", decode_reject);
        rejecting.disabled = false;
        let mut disabled = descriptor("D", decode_claim_a);
        disabled.disabled = true;
        let (mut ctx, collected) = context_with(vec![rejecting, disabled]);

        let stats = ctx.dispatch(&sample_pulses(), Carrier::Ook);
        assert_eq!(stats.events, 0);
        assert_eq!(stats.mic, 1);
        assert!(collected.lock().unwrap().is_empty());
    }

    #[test]
    fn verify_time_stamp_is_first_field() {
        let (mut ctx, collected) = context_with(vec![descriptor("A", decode_claim_a)]);
        ctx.dispatch(&sample_pulses(), Carrier::Ook);

        let records = collected.lock().unwrap();
        assert_eq!(records[0].fields()[0].key, "time");
        assert_eq!(
            records[0].get("time"),
            Some(&DataValue::Text("2026-01-01 00:00:00.000000".to_string()))
        );
    }

    #[test]
    fn verify_carrier_filter() {
        let mut fsk_only = descriptor("F", decode_claim_a);
        fsk_only.carrier = Carrier::Fsk;
        let (mut ctx, collected) = context_with(vec![fsk_only]);

        let stats = ctx.dispatch(&sample_pulses(), Carrier::Ook);
        assert_eq!(stats.events, 0);
        assert!(collected.lock().unwrap().is_empty());
    }

    #[test]
    fn verify_max_reset_limit() {
        let mut a = descriptor("A", decode_claim_a);
        a.params.reset_limit = 8_000.0;
        let mut b = descriptor("B", decode_claim_b);
        b.params.reset_limit = 12_000.0;
        let mut registry = DeviceRegistry::new();
        registry.register_descriptor(a);
        registry.register_descriptor(b);

        assert_eq!(registry.max_reset_limit_us(Carrier::Ook), 12_000.0);
        assert_eq!(registry.max_reset_limit_us(Carrier::Fsk), 0.0);
    }
}
