// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error::Error as StdError;
use std::fmt;
use std::result;

/// `RejectKind` is a list of reasons why a device decoder did not claim a pulse train.
///
/// Rejects are ordinary control flow: every registered decoder probes every pulse train, and all
/// but (at most) one will reject it. The kinds are ordered by how far the decoder got before
/// giving up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RejectKind {
    /// The bit stream does not carry the decoder's header or preamble. The fastest path.
    Early,
    /// The bit stream has an implausible length for this protocol.
    Length,
    /// The message content failed a plausibility check.
    Sanity,
    /// The message integrity check (CRC, digest, parity, or checksum) failed.
    Mic,
}

impl RejectKind {
    fn as_str(&self) -> &'static str {
        match *self {
            RejectKind::Early => "no header",
            RejectKind::Length => "bad length",
            RejectKind::Sanity => "implausible content",
            RejectKind::Mic => "integrity check failed",
        }
    }
}

/// `Error` provides an enumeration of all possible errors reported by Telemetria.
#[derive(Debug)]
pub enum Error {
    /// An IO error occurred while reading or writing a sample stream or capture file.
    IoError(std::io::Error),
    /// Invalid user input: a bad device query, an unknown output specification, or an
    /// out-of-range parameter. Reported at startup and fatal.
    ConfigError(&'static str),
    /// The SDR source failed to open, tune, or stream.
    DeviceError(&'static str),
    /// A device decoder did not recognise the pulse train. Non-fatal; surfaced only in
    /// verbose modes.
    Reject(RejectKind),
    /// A transient output sink failure. The sink is marked degraded and its records dropped.
    SinkError(&'static str),
    /// A default or user-defined limit was reached while decoding. Limits bound resource use
    /// against hostile or malformed input.
    LimitError(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => write!(f, "io error: {}", err),
            Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            Error::DeviceError(msg) => write!(f, "device error: {}", msg),
            Error::Reject(ref kind) => write!(f, "decoder reject: {}", kind.as_str()),
            Error::SinkError(msg) => write!(f, "sink error: {}", msg),
            Error::LimitError(constraint) => write!(f, "limit reached: {}", constraint),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a configuration error.
pub fn config_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::ConfigError(msg))
}

/// Convenience function to create a device error.
pub fn device_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::DeviceError(msg))
}

/// Convenience function to create a sink error.
pub fn sink_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::SinkError(msg))
}

/// Convenience function to create a limit error.
pub fn limit_error<T>(constraint: &'static str) -> Result<T> {
    Err(Error::LimitError(constraint))
}

/// Convenience function for a decoder to reject a pulse train before finding a header.
pub fn reject_early<T>() -> Result<T> {
    Err(Error::Reject(RejectKind::Early))
}

/// Convenience function for a decoder to reject a pulse train with a bad length.
pub fn reject_length<T>() -> Result<T> {
    Err(Error::Reject(RejectKind::Length))
}

/// Convenience function for a decoder to reject implausible message content.
pub fn reject_sanity<T>() -> Result<T> {
    Err(Error::Reject(RejectKind::Sanity))
}

/// Convenience function for a decoder to reject a message with a failed integrity check.
pub fn reject_mic<T>() -> Result<T> {
    Err(Error::Reject(RejectKind::Mic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_reject_ordering() {
        // A decoder keeps the most specific reject it saw. Mic is the most specific (the
        // decoder got all the way to the integrity check), Early the least.
        assert!(RejectKind::Early < RejectKind::Length);
        assert!(RejectKind::Length < RejectKind::Sanity);
        assert!(RejectKind::Sanity < RejectKind::Mic);
    }
}
