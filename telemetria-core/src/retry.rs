// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded exponential backoff for transient SDR device operations.
//!
//! Tuning and streaming setters fail transiently on busy USB buses; the policy is to retry
//! with doubling delays up to a bound, then surface the device error to the caller.

use std::time::Duration;

use log::warn;

use crate::errors::{Error, Result};

/// Retry policy: `attempts` tries in total, sleeping `base_delay` doubled after each failure.
#[derive(Copy, Clone, Debug)]
pub struct Backoff {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff { attempts: 5, base_delay: Duration::from_millis(100) }
    }
}

/// Runs `op` under the backoff policy. Only [`Error::DeviceError`] is retried; any other error
/// (and any success) returns immediately.
pub fn retry<T>(policy: Backoff, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut delay = policy.base_delay;
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(Error::DeviceError(msg)) if attempt < attempts => {
                warn!("{} failed (attempt {}/{}): {}; retrying", what, attempt, attempts, msg);
                std::thread::sleep(delay);
                delay = delay.saturating_mul(2);
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("loop returns on the final attempt");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{config_error, device_error};

    fn quick() -> Backoff {
        Backoff { attempts: 4, base_delay: Duration::from_millis(0) }
    }

    #[test]
    fn verify_retry_until_success() {
        let mut calls = 0;
        let result = retry(quick(), "tune", || {
            calls += 1;
            if calls < 3 {
                device_error("busy")
            }
            else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 3);
    }

    #[test]
    fn verify_retry_exhaustion() {
        let mut calls = 0;
        let result: Result<()> = retry(quick(), "tune", || {
            calls += 1;
            device_error("gone")
        });
        assert!(matches!(result, Err(Error::DeviceError(_))));
        assert_eq!(calls, 4);
    }

    #[test]
    fn verify_non_device_errors_fail_fast() {
        let mut calls = 0;
        let result: Result<()> = retry(quick(), "parse", || {
            calls += 1;
            config_error("bad input")
        });
        assert!(matches!(result, Err(Error::ConfigError(_))));
        assert_eq!(calls, 1);
    }
}
