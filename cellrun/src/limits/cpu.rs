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

use super::{LimitsError, ResourceLimiter, Result};
use crate::resources::{CpuResources, ResourceSpec, CPU_PERIOD_MICROS};

/// Caps the cell at a fraction of one CPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuLimiter {
    fraction: f64,
}

impl CpuLimiter {
    /// Accepts a fraction in `(0, 1]`.
    pub fn new(value: &str) -> Result<Self> {
        let fraction: f64 = value
            .trim()
            .parse()
            .map_err(|_| LimitsError::CpuUnparsable { value: value.into() })?;

        if fraction.is_nan() {
            return Err(LimitsError::CpuUnparsable { value: value.into() });
        }
        if fraction <= 0.0 {
            return Err(LimitsError::CpuTooLow { value: value.into() });
        }
        if fraction > 1.0 {
            return Err(LimitsError::CpuTooHigh { value: value.into() });
        }

        Ok(Self { fraction })
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn quota(&self) -> i64 {
        (self.fraction * CPU_PERIOD_MICROS as f64).round() as i64
    }
}

impl ResourceLimiter for CpuLimiter {
    fn apply(&self, resources: &mut ResourceSpec) {
        resources.cpu =
            Some(CpuResources { period: CPU_PERIOD_MICROS, quota: self.quota() });
    }
}
