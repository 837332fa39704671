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

//! Turns user supplied limit strings into a [ResourceSpec].
//!
//! Each limiter is validated when it is constructed and afterwards only
//! knows how to write its own part of the resources. [LimiterSet] holds
//! at most one limiter per resource kind and owns the rule that an I/O
//! limit without an explicit memory limit also caps memory.

pub use block_device::{BlockDevice, BlockDeviceError, SYS_BLOCK_DIR};
pub use cpu::CpuLimiter;
pub use error::{LimitsError, Result};
pub use io::{IoLimiter, Throttle, UNLIMITED};
pub use memory::MemoryLimiter;

use crate::resources::ResourceSpec;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use tracing::debug;

mod block_device;
mod cpu;
mod error;
mod io;
mod memory;

pub trait ResourceLimiter {
    /// Writes this limiter's part of `resources`, leaving the rest untouched.
    fn apply(&self, resources: &mut ResourceSpec);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Limiter {
    Cpu(CpuLimiter),
    Memory(MemoryLimiter),
    Io(IoLimiter),
}

impl Limiter {
    pub fn kind(&self) -> LimiterKind {
        match self {
            Limiter::Cpu(_) => LimiterKind::Cpu,
            Limiter::Memory(_) => LimiterKind::Memory,
            Limiter::Io(_) => LimiterKind::Io,
        }
    }
}

impl ResourceLimiter for Limiter {
    fn apply(&self, resources: &mut ResourceSpec) {
        match self {
            Limiter::Cpu(limiter) => limiter.apply(resources),
            Limiter::Memory(limiter) => limiter.apply(resources),
            Limiter::Io(limiter) => limiter.apply(resources),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterKind {
    Cpu,
    Memory,
    Io,
}

impl Display for LimiterKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimiterKind::Cpu => "CPU",
            LimiterKind::Memory => "memory",
            LimiterKind::Io => "I/O",
        };
        write!(f, "{name}")
    }
}

/// The raw limit flags as given on the command line.
#[derive(Debug, Clone)]
pub struct LimitFlags {
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub io_read_max: String,
    pub io_write_max: String,
    pub block_dir: PathBuf,
}

impl Default for LimitFlags {
    fn default() -> Self {
        Self {
            cpu: None,
            memory: None,
            io_read_max: UNLIMITED.into(),
            io_write_max: UNLIMITED.into(),
            block_dir: SYS_BLOCK_DIR.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LimiterSet {
    limiters: Vec<Limiter>,
}

impl LimiterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_flags(flags: &LimitFlags) -> Result<Self> {
        let mut set = Self::new();

        if let Some(cpu) = &flags.cpu {
            set.push(Limiter::Cpu(CpuLimiter::new(cpu)?))?;
        }

        if let Some(memory) = &flags.memory {
            set.push(Limiter::Memory(MemoryLimiter::new(memory)?))?;
        }

        let io_requested = [&flags.io_read_max, &flags.io_write_max]
            .iter()
            .any(|value| value.trim() != UNLIMITED);

        if io_requested {
            let io = IoLimiter::new(
                &flags.io_read_max,
                &flags.io_write_max,
                &flags.block_dir,
            )?;
            if flags.memory.is_none() {
                // write throttle first, read when writes are unlimited
                let implicit = io.write().rate().or(io.read().rate());
                if let Some(limit) = implicit {
                    debug!(limit, "memory limit derived from I/O throttle");
                    set.push(Limiter::Memory(MemoryLimiter::from_bytes(limit)))?;
                }
            }
            set.push(Limiter::Io(io))?;
        }

        Ok(set)
    }

    /// Rejects a limiter whose kind is already present.
    pub fn push(&mut self, limiter: Limiter) -> Result<()> {
        let kind = limiter.kind();
        if self.limiters.iter().any(|l| l.kind() == kind) {
            return Err(LimitsError::DuplicateLimiter { kind });
        }
        self.limiters.push(limiter);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Limiter> {
        self.limiters.iter()
    }

    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    pub fn apply(&self) -> ResourceSpec {
        let mut resources = ResourceSpec::default();
        for limiter in &self.limiters {
            limiter.apply(&mut resources);
        }
        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{CpuResources, MemoryResources};
    use pretty_assertions::assert_eq;
    use test_helpers::MockBlockDevices;

    fn flags(mock: &MockBlockDevices) -> LimitFlags {
        LimitFlags { block_dir: mock.path().to_path_buf(), ..Default::default() }
    }

    fn mock_devices() -> MockBlockDevices {
        MockBlockDevices::new(&[("sda", 8, 0), ("sdb", 8, 16)])
            .expect("failed to create mock block devices")
    }

    #[test]
    fn test_no_flags_give_no_resources() {
        let mock = mock_devices();

        let set = LimiterSet::from_flags(&flags(&mock)).expect("valid flags");

        assert!(set.is_empty());
        assert!(set.apply().is_empty());
    }

    #[test]
    fn test_implicit_memory_from_read_throttle() {
        let mock = mock_devices();
        let flags = LimitFlags { io_read_max: "10m".into(), ..flags(&mock) };

        let resources =
            LimiterSet::from_flags(&flags).expect("valid flags").apply();

        assert_eq!(resources.memory, Some(MemoryResources { limit: 10485760 }));
        let block_io = resources.block_io.expect("block io resources");
        assert_eq!(block_io.throttle_read_bps.len(), 2);
        assert!(block_io.throttle_write_bps.is_empty());
    }

    #[test]
    fn test_implicit_memory_prefers_write_throttle() {
        let mock = mock_devices();
        let flags = LimitFlags {
            io_read_max: "10m".into(),
            io_write_max: "20m".into(),
            ..flags(&mock)
        };

        let resources =
            LimiterSet::from_flags(&flags).expect("valid flags").apply();

        assert_eq!(resources.memory, Some(MemoryResources { limit: 20 << 20 }));
    }

    #[test]
    fn test_explicit_memory_wins() {
        let mock = mock_devices();
        let flags = LimitFlags {
            memory: Some("128m".into()),
            io_read_max: "10m".into(),
            io_write_max: "20m".into(),
            ..flags(&mock)
        };

        let set = LimiterSet::from_flags(&flags).expect("valid flags");
        let resources = set.apply();

        assert_eq!(set.len(), 2);
        assert_eq!(resources.memory, Some(MemoryResources { limit: 134217728 }));
    }

    #[test]
    fn test_unlimited_io_adds_no_limiters() {
        let mock = mock_devices();
        let flags = LimitFlags { cpu: Some("0.5".into()), ..flags(&mock) };

        let set = LimiterSet::from_flags(&flags).expect("valid flags");
        let kinds: Vec<_> = set.iter().map(Limiter::kind).collect();

        assert_eq!(kinds, vec![LimiterKind::Cpu]);
        assert_eq!(
            set.apply(),
            ResourceSpec {
                cpu: Some(CpuResources { period: 100_000, quota: 50_000 }),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_unlimited_io_skips_device_enumeration() {
        let flags = LimitFlags {
            block_dir: "/nonexistent".into(),
            ..Default::default()
        };

        assert!(LimiterSet::from_flags(&flags).expect("valid flags").is_empty());
    }

    #[test]
    fn test_invalid_flag_fails_construction() {
        let mock = mock_devices();
        let flags = LimitFlags { cpu: Some("2".into()), ..flags(&mock) };

        assert!(matches!(
            LimiterSet::from_flags(&flags),
            Err(LimitsError::CpuTooHigh { .. })
        ));
    }

    #[test]
    fn test_duplicate_limiter_rejected() {
        let mut set = LimiterSet::new();
        set.push(Limiter::Memory(MemoryLimiter::from_bytes(1024)))
            .expect("first memory limiter");

        let err = set
            .push(Limiter::Memory(MemoryLimiter::from_bytes(2048)))
            .expect_err("second memory limiter");

        assert!(matches!(
            err,
            LimitsError::DuplicateLimiter { kind: LimiterKind::Memory }
        ));
        assert_eq!(err.to_string(), "a memory limiter was already supplied");
        assert_eq!(set.len(), 1);
    }
}
