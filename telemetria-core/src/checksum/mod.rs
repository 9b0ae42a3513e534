// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `checksum` module provides the message integrity primitives used by device protocols:
//! classical shift-register CRCs, keyed LFSR digests, and the CCITT whitening stream.
//!
//! All functions here are pure and never fail; a decoder compares the returned residue against
//! the received one and rejects the message itself.

pub mod crc;
pub mod lfsr;
pub mod whiten;

pub use crc::{crc16, crc16lsb, crc4, crc7, crc8, crc8le};
pub use lfsr::{lfsr_digest16, lfsr_digest8, lfsr_digest8_reflect, lfsr_digest8_reverse};
pub use whiten::ccitt_whitening;
