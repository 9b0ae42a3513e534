// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements the external file formats: the textual pulse-data format used
//! for captures and test fixtures, and the SigMF recorder.

pub mod pulsefmt;
pub mod sigmf;
