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
use crate::bytes::parse_bytes;
use crate::resources::{MemoryResources, ResourceSpec};

/// Caps the memory the cell may use, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimiter {
    limit: u64,
}

impl MemoryLimiter {
    pub fn new(value: &str) -> Result<Self> {
        let limit = parse_bytes(value).map_err(|source| {
            LimitsError::Memory { value: value.into(), source }
        })?;
        Ok(Self { limit })
    }

    pub(crate) fn from_bytes(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl ResourceLimiter for MemoryLimiter {
    fn apply(&self, resources: &mut ResourceSpec) {
        resources.memory = Some(MemoryResources { limit: self.limit });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::ParseBytesError;
    use simple_test_case::test_case;

    #[test_case("128k", 128 * 1024; "kibibytes")]
    #[test_case("256M", 256 * 1024 * 1024; "mebibytes")]
    #[test_case("1G", 1024 * 1024 * 1024; "gibibytes")]
    #[test]
    fn test_new_memory_limiter(input: &str, expected: u64) {
        let limiter = MemoryLimiter::new(input).expect("valid size");
        assert_eq!(limiter.limit(), expected);
    }

    #[test]
    fn test_new_memory_limiter_invalid() {
        let err = MemoryLimiter::new("invalid").expect_err("invalid size");
        assert!(matches!(
            err,
            LimitsError::Memory {
                source: ParseBytesError::Invalid { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("invalid RAM value"));
    }

    #[test]
    fn test_memory_limiter_apply() {
        let mut resources = ResourceSpec::default();

        MemoryLimiter::new("128m").expect("valid size").apply(&mut resources);

        assert_eq!(
            resources.memory,
            Some(MemoryResources { limit: 128 * 1024 * 1024 })
        );
        assert!(resources.cpu.is_none());
    }
}
