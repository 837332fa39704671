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

use super::{CgroupManager, CgroupName, CgroupsError, Result};
use crate::resources::ResourceSpec;
use libcgroups::common::{
    write_cgroup_file_str, CgroupManager as _, ControllerOpt,
    DEFAULT_CGROUP_ROOT,
};
use libcgroups::v2::{
    self,
    controller_type::ControllerType,
    util::{get_available_controllers, CGROUP_SUBTREE_CONTROL},
};
use nix::unistd::Pid;
use oci_spec::runtime::LinuxResources;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// A group on the unified hierarchy, named as a systemd slice unit.
#[derive(Debug)]
pub struct CgroupV2 {
    name: CgroupName,
    path: PathBuf,
}

impl CgroupV2 {
    /// Creates the group and applies `resources` to it. A group whose
    /// resources cannot be applied is removed again.
    pub fn new(name: CgroupName, resources: &ResourceSpec) -> Result<Self> {
        let options = LinuxResources::try_from(resources).map_err(|source| {
            CgroupsError::InvalidResources { name: name.clone(), source }
        })?;

        let cgroup =
            Self { path: PathBuf::from(name.with_unit_suffix()), name };
        let manager = cgroup.manager()?;

        enable_controllers(Path::new(DEFAULT_CGROUP_ROOT), resources)
            .map_err(|source| CgroupsError::CreateCgroup {
                name: cgroup.name.clone(),
                source,
            })?;

        // libcgroups only creates the directory when the first task is
        // added, which is too late for the resources to bind the child
        let full_path = Path::new(DEFAULT_CGROUP_ROOT).join(&cgroup.path);
        trace!("creating {}", full_path.display());
        fs::create_dir_all(&full_path).map_err(|e| {
            CgroupsError::CreateCgroup {
                name: cgroup.name.clone(),
                source: e.into(),
            }
        })?;

        let options = ControllerOpt {
            resources: &options,
            disable_oom_killer: false,
            oom_score_adj: None,
            freezer_state: None,
        };

        if let Err(e) = manager.apply(&options) {
            // the apply error is the one worth reporting
            let _ = manager.remove();
            return Err(CgroupsError::CreateCgroup {
                name: cgroup.name,
                source: e.into(),
            });
        }

        info!("created cgroup v2 group {}", full_path.display());
        Ok(cgroup)
    }

    pub fn name(&self) -> &CgroupName {
        &self.name
    }

    fn manager(&self) -> Result<v2::manager::Manager> {
        v2::manager::Manager::new(DEFAULT_CGROUP_ROOT.into(), self.path.clone())
            .map_err(|e| CgroupsError::CreateCgroup {
                name: self.name.clone(),
                source: e.into(),
            })
    }
}

impl CgroupManager for CgroupV2 {
    fn attach_process(&self, pid: Pid) -> Result<()> {
        let attach_error = |source: anyhow::Error| CgroupsError::AttachProcess {
            name: self.name.clone(),
            source,
        };

        let manager = v2::manager::Manager::new(
            DEFAULT_CGROUP_ROOT.into(),
            self.path.clone(),
        )
        .map_err(|e| attach_error(e.into()))?;

        manager.add_task(pid).map_err(|e| attach_error(e.into()))
    }

    fn delete(self) -> Result<()> {
        let delete_error = |source: anyhow::Error| CgroupsError::DeleteCgroup {
            name: self.name.clone(),
            source,
        };

        let manager = v2::manager::Manager::new(
            DEFAULT_CGROUP_ROOT.into(),
            self.path.clone(),
        )
        .map_err(|e| delete_error(e.into()))?;

        manager.remove().map_err(|e| delete_error(e.into()))?;
        info!("deleted cgroup v2 group {}", self.path.display());
        Ok(())
    }
}

/// The controllers the group's resources are written to.
fn required_controllers(resources: &ResourceSpec) -> Vec<ControllerType> {
    let mut controllers = vec![];
    if resources.cpu.is_some() {
        controllers.push(ControllerType::Cpu);
    }
    if resources.memory.is_some() {
        controllers.push(ControllerType::Memory);
    }
    if resources.block_io.is_some() {
        controllers.push(ControllerType::Io);
    }
    controllers
}

/// Delegates the controllers `resources` needs from `root` to its children,
/// so the group's interface files exist when the resources are applied.
fn enable_controllers(
    root: &Path,
    resources: &ResourceSpec,
) -> anyhow::Result<()> {
    let required = required_controllers(resources);
    if required.is_empty() {
        return Ok(());
    }

    let available = get_available_controllers(root)?;
    let mut enable = vec![];
    for controller in required {
        if available.contains(&controller) {
            enable.push(format!("+{controller}"));
        } else {
            warn!("cgroup controller {controller} is not available");
        }
    }
    if enable.is_empty() {
        return Ok(());
    }

    let enable = enable.join(" ");
    debug!("enabling {enable} in {}", root.display());
    write_cgroup_file_str(root.join(CGROUP_SUBTREE_CONTROL), &enable)?;
    Ok(())
}
