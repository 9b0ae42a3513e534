// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `device` module defines the device descriptor: the registration record tying a device
//! protocol to its carrier class, modulation family, timing parameters, and decode callback.

use crate::bitbuf::BitBuffer;
use crate::errors::Result;
use crate::pulsedec::{DecodeParams, Modulation};
use crate::record::DataRecord;

/// The carrier class a device transmits with, selecting the slicer session its pulse lists
/// come from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Carrier {
    Ook,
    Fsk,
}

/// The decoding context handed to a device decode callback.
///
/// The context collects emitted records; the dispatcher stamps and forwards them after the
/// callback returns successfully.
pub struct DeviceContext<'a> {
    device_name: &'static str,
    events: &'a mut Vec<DataRecord>,
}

impl<'a> DeviceContext<'a> {
    pub fn new(device_name: &'static str, events: &'a mut Vec<DataRecord>) -> Self {
        DeviceContext { device_name, events }
    }

    /// The registered name of the decoding device.
    pub fn device_name(&self) -> &'static str {
        self.device_name
    }

    /// Emits one decoded record.
    pub fn emit(&mut self, record: DataRecord) {
        self.events.push(record);
    }
}

/// A device decode callback: consumes the bit buffer produced by the device's pulse-train
/// decoder and returns the number of emitted events (at least one), or a
/// [`crate::errors::Error::Reject`] naming how far decoding got.
pub type DecodeFn = fn(&mut DeviceContext<'_>, &BitBuffer) -> Result<u32>;

/// The registration record of one device protocol.
///
/// Descriptors hold their timing parameters by value; pulse-train decoders receive them by
/// reference for the duration of one dispatch.
#[derive(Clone)]
pub struct DeviceDescriptor {
    /// Display and log name, e.g. `"Ambient Weather F007TH"`.
    pub name: &'static str,
    pub carrier: Carrier,
    pub modulation: Modulation,
    pub params: DecodeParams,
    /// A disabled device stays registered but is skipped by the dispatcher.
    pub disabled: bool,
    pub decode: DecodeFn,
    /// The output field keys this device may emit, for sink negotiation and documentation.
    pub fields: &'static [&'static str],
}

/// To support registration in a device registry, a device module implements the
/// `RegisterableDevice` trait.
pub trait RegisterableDevice {
    /// Get the list of device descriptors provided by this module.
    fn descriptors() -> &'static [DeviceDescriptor];
}

/// Convenience macro for declaring a `DeviceDescriptor`.
#[macro_export]
macro_rules! support_device {
    ($name:expr, $carrier:expr, $modulation:expr, $params:expr, $decode:expr, $fields:expr) => {
        $crate::device::DeviceDescriptor {
            name: $name,
            carrier: $carrier,
            modulation: $modulation,
            params: $params,
            disabled: false,
            decode: $decode,
            fields: $fields,
        }
    };
}
