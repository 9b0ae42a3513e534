// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `dsp` module provides the streaming demodulator and its filters.

pub mod demod;
pub mod filter;

pub use demod::{Baseline, DemodConfig, DemodTracks, Demodulator};
pub use filter::LowPass;
