/* -------------------------------------------------------------------------- *\
 *                |   █████╗ ██╗   ██╗██████╗  █████╗ ███████╗ |              *
 *                |  ██╔══██╗██║   ██║██╔══██╗██╔══██╗██╔════╝ |              *
 *                |  ███████║██║   ██║██████╔╝███████║█████╗   |              *
 *                |  ██╔══██║██║   ██║██╔══██╗██╔══██║██╔══╝   |              *
 *                |  ██║  ██║╚██████╔╝██║  ██║██║  ██║███████╗ |              *
 *                |  ╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝ |              *
 *                +--------------------------------------------+              *
 *                                                                            *
 *                         Distributed Systems Runtime                        *
 * -------------------------------------------------------------------------- *
 * Copyright 2022 - 2024, the aurae contributors                              *
 * SPDX-License-Identifier: Apache-2.0                                        *
\* -------------------------------------------------------------------------- */

use super::{BlockDevice, LimitsError, ResourceLimiter, Result};
use crate::bytes::{parse_bytes, ParseBytesError};
use crate::resources::{BlockIoResources, ResourceSpec, ThrottleDevice};
use std::path::Path;

/// The literal that leaves an I/O direction unconstrained.
pub const UNLIMITED: &str = "-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Unlimited,
    BytesPerSecond(u64),
}

impl Throttle {
    fn parse(value: &str) -> std::result::Result<Self, ParseBytesError> {
        if value.trim() == UNLIMITED {
            return Ok(Self::Unlimited);
        }
        parse_bytes(value).map(Self::BytesPerSecond)
    }

    pub fn rate(&self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::BytesPerSecond(rate) => Some(*rate),
        }
    }

    pub fn is_limited(&self) -> bool {
        self.rate().is_some()
    }
}

/// Throttles read and write throughput on every block device of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoLimiter {
    read: Throttle,
    write: Throttle,
    devices: Vec<BlockDevice>,
}

impl IoLimiter {
    /// Devices are enumerated from `block_dir` before either throttle is
    /// parsed.
    pub fn new(read: &str, write: &str, block_dir: &Path) -> Result<Self> {
        let devices = BlockDevice::enumerate(block_dir).map_err(|source| {
            LimitsError::DeviceEnumeration { dir: block_dir.into(), source }
        })?;

        let read = Throttle::parse(read).map_err(|source| {
            LimitsError::UnparsableReadThrottle { value: read.into(), source }
        })?;
        let write = Throttle::parse(write).map_err(|source| {
            LimitsError::UnparsableWriteThrottle { value: write.into(), source }
        })?;

        Ok(Self { read, write, devices })
    }

    pub fn read(&self) -> Throttle {
        self.read
    }

    pub fn write(&self) -> Throttle {
        self.write
    }

    pub fn devices(&self) -> &[BlockDevice] {
        &self.devices
    }
}

impl ResourceLimiter for IoLimiter {
    fn apply(&self, resources: &mut ResourceSpec) {
        let entries = |throttle: Throttle| match throttle.rate() {
            Some(rate) => self
                .devices
                .iter()
                .map(|device| ThrottleDevice {
                    major: device.major,
                    minor: device.minor,
                    rate,
                })
                .collect(),
            None => vec![],
        };

        resources.block_io = Some(BlockIoResources {
            throttle_read_bps: entries(self.read),
            throttle_write_bps: entries(self.write),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;
    use test_helpers::MockBlockDevices;

    fn two_devices() -> MockBlockDevices {
        MockBlockDevices::new(&[("sda", 8, 0), ("sdb", 8, 16)])
            .expect("failed to create mock block devices")
    }

    #[test_case("-1", Throttle::Unlimited; "unlimited")]
    #[test_case(" -1 ", Throttle::Unlimited; "unlimited with whitespace")]
    #[test_case("1M", Throttle::BytesPerSecond(1 << 20); "one mebibyte")]
    #[test_case("0", Throttle::BytesPerSecond(0); "zero is a limit")]
    #[test]
    fn test_throttle_parse(input: &str, expected: Throttle) {
        assert_eq!(Throttle::parse(input).expect("valid throttle"), expected);
    }

    #[test]
    fn test_io_limiter_apply_write_only() {
        let mock = two_devices();
        let limiter =
            IoLimiter::new("-1", "1M", mock.path()).expect("valid limiter");
        let mut resources = ResourceSpec::default();

        limiter.apply(&mut resources);

        let block_io = resources.block_io.expect("block io resources");
        assert!(block_io.throttle_read_bps.is_empty());
        assert_eq!(
            block_io.throttle_write_bps,
            vec![
                ThrottleDevice { major: 8, minor: 0, rate: 1048576 },
                ThrottleDevice { major: 8, minor: 16, rate: 1048576 },
            ]
        );
        assert!(resources.memory.is_none());
    }

    #[test]
    fn test_io_limiter_apply_both_sides() {
        let mock = two_devices();
        let limiter =
            IoLimiter::new("10m", "20m", mock.path()).expect("valid limiter");
        let mut resources = ResourceSpec::default();

        limiter.apply(&mut resources);

        let block_io = resources.block_io.expect("block io resources");
        assert_eq!(block_io.throttle_read_bps.len(), 2);
        assert_eq!(block_io.throttle_write_bps.len(), 2);
        assert!(block_io.throttle_read_bps.iter().all(|d| d.rate == 10 << 20));
        assert!(block_io.throttle_write_bps.iter().all(|d| d.rate == 20 << 20));
    }

    #[test]
    fn test_io_limiter_invalid_values() {
        let mock = two_devices();

        assert!(matches!(
            IoLimiter::new("fast", "-1", mock.path()),
            Err(LimitsError::UnparsableReadThrottle { .. })
        ));
        assert!(matches!(
            IoLimiter::new("-1", "", mock.path()),
            Err(LimitsError::UnparsableWriteThrottle {
                source: ParseBytesError::Empty,
                ..
            })
        ));
        assert!(matches!(
            IoLimiter::new("-2", "-1", mock.path()),
            Err(LimitsError::UnparsableReadThrottle {
                source: ParseBytesError::Negative { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_io_limiter_missing_block_dir() {
        let err = IoLimiter::new("1M", "1M", Path::new("/nonexistent"))
            .expect_err("missing block dir");

        assert!(matches!(err, LimitsError::DeviceEnumeration { .. }));
        assert!(err.to_string().contains("error retrieving block devices"));
    }

    #[test]
    fn test_io_limiter_enumerates_before_parsing() {
        assert!(matches!(
            IoLimiter::new("invalid", "invalid", Path::new("/nonexistent")),
            Err(LimitsError::DeviceEnumeration { .. })
        ));
    }
}
