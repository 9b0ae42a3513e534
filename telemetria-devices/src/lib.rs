// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Telemetria crates. Please see the workspace manifest for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

//! Seed catalog of device protocol decoders.
//!
//! The full catalog of consumer telemetry protocols runs to several hundred entries and lives
//! out of tree; the decoders here cover each carrier class and the most commonly exercised
//! decode paths (preamble search, Manchester framing, LFSR digests, CRC-8, repeated-row
//! confirmation), and serve as templates for new entries.

use telemetria_core::dispatch::DeviceRegistry;

pub mod ambient_weather;
pub mod generic_remote;
pub mod lacrosse;

/// Registers every decoder in this crate, in the catalog's probe order.
pub fn register_all(registry: &mut DeviceRegistry) {
    registry.register::<ambient_weather::AmbientWeatherF007th>();
    registry.register::<lacrosse::LacrosseTx29>();
    registry.register::<generic_remote::GenericRemote>();
}
