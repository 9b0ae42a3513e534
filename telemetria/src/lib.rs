// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Telemetria
//!
//! Telemetria is a pure Rust receiver core for low-bandwidth ISM-band sensor telemetry: it
//! turns raw I/Q baseband samples from cheap SDR hardware into structured decoded device
//! records.
//!
//! # Pipeline
//!
//! Data flows one way through four stages:
//!
//! 1. The [demodulator][crate::core::dsp::Demodulator] converts complex samples into an AM
//!    envelope track and an FM deviation track, maintaining noise and signal baselines.
//! 2. The [pulse extractor][crate::core::slicer::PulseSlicer] slices a track into timed
//!    [pulse lists][crate::core::pulse::PulseList], finalising a list at every reset gap.
//! 3. A [pulse-train decoder][crate::core::pulsedec] per modulation family converts the pulse
//!    list into a [bit buffer][crate::core::bitbuf::BitBuffer].
//! 4. The [dispatcher][crate::core::dispatch::RxContext] probes every registered
//!    [device decoder][crate::core::device::DeviceDescriptor] and forwards emitted
//!    [records][crate::core::record::DataRecord] to the output sinks.
//!
//! # Usage
//!
//! 1. Build a [`DeviceRegistry`][crate::core::dispatch::DeviceRegistry] and register the
//!    devices of interest, or take [`default::get_registry`] for the seed catalog.
//! 2. Create an [`OutputHub`][crate::core::sink::OutputHub] with your sinks, and an
//!    [`RxContext`][crate::core::dispatch::RxContext] around registry and hub.
//! 3. Feed sample blocks through a demodulator and a pulse slicer, and call
//!    [`dispatch`][crate::core::dispatch::RxContext::dispatch] with every finalised pulse
//!    list.

pub use telemetria_core as core;
pub use telemetria_devices as devices;

pub mod default {
    //! Default device registry with all in-tree devices registered.

    use lazy_static::lazy_static;

    use crate::core::dispatch::DeviceRegistry;

    lazy_static! {
        static ref REGISTRY: DeviceRegistry = {
            let mut registry = DeviceRegistry::new();
            telemetria_devices::register_all(&mut registry);
            registry
        };
    }

    /// Gets the default device registry. Built once, immutable thereafter; per-run enable
    /// and disable filters require building a registry explicitly.
    pub fn get_registry() -> &'static DeviceRegistry {
        &REGISTRY
    }
}
