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

//! Control groups for a single run.
//!
//! The host's hierarchy decides the variant: the unified hierarchy gets a
//! [CgroupV2], the legacy and hybrid ones a [CgroupV1] when the
//! `FT_CGROUP_V1_SUPPORT` toggle allows it. Either way the group exists with
//! its resources applied before a process is attached to it.

pub use error::{CgroupsError, Result};
pub use name::CgroupName;
pub use v1::CgroupV1;
pub use v2::CgroupV2;

use crate::features::Features;
use crate::resources::ResourceSpec;
use libcgroups::common::{get_cgroup_setup, CgroupSetup};
use nix::unistd::Pid;
use std::fmt::{Display, Formatter};
use tracing::debug;

mod error;
mod name;
mod v1;
mod v2;

pub trait CgroupManager {
    fn attach_process(&self, pid: Pid) -> Result<()>;

    /// Removes the group. Consumes the manager so a group is deleted once.
    fn delete(self) -> Result<()>
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupMode {
    Legacy,
    Hybrid,
    Unified,
}

impl CgroupMode {
    pub fn detect() -> Result<Self> {
        let setup = get_cgroup_setup()
            .map_err(|e| CgroupsError::DetectMode { source: e.into() })?;

        Ok(match setup {
            CgroupSetup::Legacy => Self::Legacy,
            CgroupSetup::Hybrid => Self::Hybrid,
            CgroupSetup::Unified => Self::Unified,
        })
    }
}

impl Display for CgroupMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            CgroupMode::Legacy => "legacy",
            CgroupMode::Hybrid => "hybrid",
            CgroupMode::Unified => "unified",
        };
        write!(f, "{mode}")
    }
}

#[derive(Debug)]
pub enum Cgroup {
    V1(CgroupV1),
    V2(CgroupV2),
}

impl Cgroup {
    pub fn name(&self) -> &CgroupName {
        match self {
            Cgroup::V1(cgroup) => cgroup.name(),
            Cgroup::V2(cgroup) => cgroup.name(),
        }
    }
}

impl CgroupManager for Cgroup {
    fn attach_process(&self, pid: Pid) -> Result<()> {
        match self {
            Cgroup::V1(cgroup) => cgroup.attach_process(pid),
            Cgroup::V2(cgroup) => cgroup.attach_process(pid),
        }
    }

    fn delete(self) -> Result<()> {
        match self {
            Cgroup::V1(cgroup) => cgroup.delete(),
            Cgroup::V2(cgroup) => cgroup.delete(),
        }
    }
}

/// Creates the group for this process on the host's hierarchy.
pub fn select_manager(
    resources: &ResourceSpec,
    features: &Features,
) -> Result<Cgroup> {
    let name = CgroupName::for_process(std::process::id())?;
    let mode = CgroupMode::detect()?;
    debug!("detected {mode} cgroup hierarchy");

    select_manager_for_mode(mode, name, resources, features)
}

pub fn select_manager_for_mode(
    mode: CgroupMode,
    name: CgroupName,
    resources: &ResourceSpec,
    features: &Features,
) -> Result<Cgroup> {
    match mode {
        CgroupMode::Unified => Ok(Cgroup::V2(CgroupV2::new(name, resources)?)),
        CgroupMode::Legacy | CgroupMode::Hybrid => {
            if !features.cgroup_v1_support {
                return Err(CgroupsError::UnsupportedCgroupVersion { mode });
            }
            Ok(Cgroup::V1(CgroupV1::new(name, resources)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case(CgroupMode::Legacy; "legacy")]
    #[test_case(CgroupMode::Hybrid; "hybrid")]
    #[test]
    fn test_v1_requires_feature(mode: CgroupMode) {
        let name = CgroupName::for_process(1).expect("valid name");

        let err = select_manager_for_mode(
            mode,
            name,
            &ResourceSpec::default(),
            &Features { cgroup_v1_support: false },
        )
        .expect_err("v1 without the feature");

        assert!(matches!(
            err,
            CgroupsError::UnsupportedCgroupVersion { mode: m } if m == mode
        ));
        assert!(err.to_string().contains("cgroup v1 is not supported"));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(CgroupMode::Unified.to_string(), "unified");
        assert_eq!(CgroupMode::Hybrid.to_string(), "hybrid");
    }
}
