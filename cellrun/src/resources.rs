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

//! The resource limits a cell is created with.
//!
//! Limiters write into a [ResourceSpec]; the cgroup managers translate it
//! into the OCI [LinuxResources] that libcgroups applies to the kernel.

use oci_spec::runtime::{
    LinuxBlockIoBuilder, LinuxCpuBuilder, LinuxMemoryBuilder, LinuxResources,
    LinuxResourcesBuilder, LinuxThrottleDevice, LinuxThrottleDeviceBuilder,
};
use oci_spec::OciSpecError;
use thiserror::Error;

/// Length of a CPU scheduling period in microseconds.
pub const CPU_PERIOD_MICROS: u64 = 100_000;

#[derive(Error, Debug)]
pub enum ResourcesError {
    #[error("memory limit of {limit} bytes exceeds the kernel maximum")]
    MemoryLimitOutOfRange { limit: u64 },
    #[error(transparent)]
    Build(#[from] OciSpecError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSpec {
    pub cpu: Option<CpuResources>,
    pub memory: Option<MemoryResources>,
    pub block_io: Option<BlockIoResources>,
}

/// `quota` microseconds of runtime for every `period` microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuResources {
    pub period: u64,
    pub quota: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryResources {
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIoResources {
    pub throttle_read_bps: Vec<ThrottleDevice>,
    pub throttle_write_bps: Vec<ThrottleDevice>,
}

/// A bytes per second ceiling on one block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleDevice {
    pub major: i64,
    pub minor: i64,
    pub rate: u64,
}

impl ResourceSpec {
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.memory.is_none() && self.block_io.is_none()
    }
}

impl TryFrom<&ResourceSpec> for LinuxResources {
    type Error = ResourcesError;

    fn try_from(spec: &ResourceSpec) -> Result<Self, Self::Error> {
        let mut builder = LinuxResourcesBuilder::default();

        if let Some(CpuResources { period, quota }) = spec.cpu {
            let cpu =
                LinuxCpuBuilder::default().period(period).quota(quota).build()?;
            builder = builder.cpu(cpu);
        }

        if let Some(MemoryResources { limit }) = spec.memory {
            let limit = i64::try_from(limit)
                .map_err(|_| ResourcesError::MemoryLimitOutOfRange { limit })?;
            let memory = LinuxMemoryBuilder::default().limit(limit).build()?;
            builder = builder.memory(memory);
        }

        if let Some(block_io) = &spec.block_io {
            let mut block_io_builder = LinuxBlockIoBuilder::default();
            if !block_io.throttle_read_bps.is_empty() {
                block_io_builder = block_io_builder.throttle_read_bps_device(
                    to_throttle_devices(&block_io.throttle_read_bps)?,
                );
            }
            if !block_io.throttle_write_bps.is_empty() {
                block_io_builder = block_io_builder.throttle_write_bps_device(
                    to_throttle_devices(&block_io.throttle_write_bps)?,
                );
            }
            builder = builder.block_io(block_io_builder.build()?);
        }

        Ok(builder.build()?)
    }
}

fn to_throttle_devices(
    devices: &[ThrottleDevice],
) -> Result<Vec<LinuxThrottleDevice>, OciSpecError> {
    devices
        .iter()
        .map(|device| {
            LinuxThrottleDeviceBuilder::default()
                .major(device.major)
                .minor(device.minor)
                .rate(device.rate)
                .build()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_empty() {
        assert!(ResourceSpec::default().is_empty());
        assert!(LinuxResources::try_from(&ResourceSpec::default()).is_ok());
    }

    #[test]
    fn test_into_linux_resources() {
        let spec = ResourceSpec {
            cpu: Some(CpuResources { period: CPU_PERIOD_MICROS, quota: 50_000 }),
            memory: Some(MemoryResources { limit: 128 << 20 }),
            block_io: Some(BlockIoResources {
                throttle_read_bps: vec![],
                throttle_write_bps: vec![ThrottleDevice {
                    major: 8,
                    minor: 0,
                    rate: 1 << 20,
                }],
            }),
        };

        let resources =
            LinuxResources::try_from(&spec).expect("valid resources");

        let cpu = resources.cpu().as_ref().expect("cpu resources");
        assert_eq!(cpu.quota(), Some(50_000));
        assert_eq!(cpu.period(), Some(CPU_PERIOD_MICROS));

        let memory = resources.memory().as_ref().expect("memory resources");
        assert_eq!(memory.limit(), Some(128 << 20));

        let block_io = resources.block_io().as_ref().expect("block io");
        assert!(block_io.throttle_read_bps_device().is_none());
        let write = block_io
            .throttle_write_bps_device()
            .as_ref()
            .expect("write throttle");
        assert_eq!(write.len(), 1);
        assert_eq!(write[0].rate(), 1 << 20);
    }

    #[test]
    fn test_memory_limit_out_of_range() {
        let spec = ResourceSpec {
            memory: Some(MemoryResources { limit: u64::MAX }),
            ..Default::default()
        };

        assert!(matches!(
            LinuxResources::try_from(&spec),
            Err(ResourcesError::MemoryLimitOutOfRange { limit: u64::MAX })
        ));
    }
}
