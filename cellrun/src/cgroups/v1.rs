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
use libcgroups::common::{CgroupManager as _, ControllerOpt};
use libcgroups::v1::{self, util::get_subsystem_mount_point, ControllerType};
use nix::unistd::Pid;
use oci_spec::runtime::LinuxResources;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, trace, warn};

/// A group created in every legacy hierarchy its resources touch.
#[derive(Debug)]
pub struct CgroupV1 {
    name: CgroupName,
}

impl CgroupV1 {
    pub fn new(name: CgroupName, resources: &ResourceSpec) -> Result<Self> {
        let options = LinuxResources::try_from(resources).map_err(|source| {
            CgroupsError::InvalidResources { name: name.clone(), source }
        })?;

        let cgroup = Self { name };
        let manager = v1::manager::Manager::new(cgroup.path())
            .map_err(|e| cgroup.create_error(e.into()))?;

        let controllers = required_controllers(resources);
        create_hierarchies(&controllers, cgroup.path(), |controller| {
            Ok(get_subsystem_mount_point(controller)?)
        })
        .map_err(|e| cgroup.create_error(e))?;

        let options = ControllerOpt {
            resources: &options,
            disable_oom_killer: false,
            oom_score_adj: None,
            freezer_state: None,
        };

        if let Err(e) = manager.apply(&options) {
            // the apply error is the one worth reporting
            let _ = manager.remove();
            return Err(cgroup.create_error(e.into()));
        }

        info!("created cgroup v1 group {}", cgroup.name);
        Ok(cgroup)
    }

    pub fn name(&self) -> &CgroupName {
        &self.name
    }

    fn path(&self) -> &Path {
        Path::new(self.name.as_str())
    }

    fn create_error(&self, source: anyhow::Error) -> CgroupsError {
        CgroupsError::CreateCgroup { name: self.name.clone(), source }
    }
}

impl CgroupManager for CgroupV1 {
    fn attach_process(&self, pid: Pid) -> Result<()> {
        let attach_error = |source: anyhow::Error| CgroupsError::AttachProcess {
            name: self.name.clone(),
            source,
        };

        let manager = v1::manager::Manager::new(self.path())
            .map_err(|e| attach_error(e.into()))?;

        manager.add_task(pid).map_err(|e| attach_error(e.into()))
    }

    fn delete(self) -> Result<()> {
        let delete_error = |source: anyhow::Error| CgroupsError::DeleteCgroup {
            name: self.name.clone(),
            source,
        };

        let manager = v1::manager::Manager::new(self.path())
            .map_err(|e| delete_error(e.into()))?;

        manager.remove().map_err(|e| delete_error(e.into()))?;
        info!("deleted cgroup v1 group {}", self.name);
        Ok(())
    }
}

/// The legacy hierarchies a group needs a directory in.
///
/// `apply` always writes the devices controller. A new devices group inherits
/// its parent's list, and the entries libcgroups adds are all allow rules, so
/// the child keeps the device access cellrun itself has.
fn required_controllers(resources: &ResourceSpec) -> Vec<ControllerType> {
    let mut controllers = vec![ControllerType::Devices];
    if resources.cpu.is_some() {
        controllers.push(ControllerType::Cpu);
    }
    if resources.memory.is_some() {
        controllers.push(ControllerType::Memory);
    }
    if resources.block_io.is_some() {
        controllers.push(ControllerType::Blkio);
    }
    controllers
}

/// Creates `path` below the mount point of every controller. On failure the
/// directories created so far are removed again.
fn create_hierarchies<F>(
    controllers: &[ControllerType],
    path: &Path,
    mount_point: F,
) -> anyhow::Result<()>
where
    F: Fn(&ControllerType) -> anyhow::Result<PathBuf>,
{
    let mut created: Vec<PathBuf> = vec![];

    for controller in controllers {
        let result = mount_point(controller).and_then(|mount_point| {
            let full_path = mount_point.join(path);
            trace!("creating {}", full_path.display());
            fs::create_dir_all(&full_path)?;
            Ok(full_path)
        });

        match result {
            Ok(full_path) => created.push(full_path),
            Err(e) => {
                for dir in created.iter().rev() {
                    if let Err(e) = fs::remove_dir(dir) {
                        warn!("failed to remove {}: {e}", dir.display());
                    }
                }
                return Err(e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{CpuResources, MemoryResources};

    #[test]
    fn test_required_controllers() {
        assert_eq!(
            required_controllers(&ResourceSpec::default()),
            vec![ControllerType::Devices]
        );

        let resources = ResourceSpec {
            cpu: Some(CpuResources { period: 100_000, quota: 50_000 }),
            memory: Some(MemoryResources { limit: 1 << 20 }),
            block_io: None,
        };
        assert_eq!(
            required_controllers(&resources),
            vec![
                ControllerType::Devices,
                ControllerType::Cpu,
                ControllerType::Memory
            ]
        );
    }

    #[test]
    fn test_create_hierarchies() {
        let root = tempfile::tempdir().expect("tempdir");
        let path = Path::new("cellrun-cgroup-1");

        create_hierarchies(
            &[ControllerType::Devices, ControllerType::Cpu],
            path,
            |controller| Ok(root.path().join(format!("{controller:?}"))),
        )
        .expect("create hierarchies");

        assert!(root.path().join("Devices").join(path).is_dir());
        assert!(root.path().join("Cpu").join(path).is_dir());
    }

    #[test]
    fn test_create_hierarchies_removes_partial_group() {
        let root = tempfile::tempdir().expect("tempdir");
        let path = Path::new("cellrun-cgroup-1");

        let err = create_hierarchies(
            &[
                ControllerType::Devices,
                ControllerType::Cpu,
                ControllerType::Memory,
            ],
            path,
            |controller| match controller {
                ControllerType::Memory => {
                    Err(anyhow::anyhow!("memory hierarchy is not mounted"))
                }
                _ => Ok(root.path().join(format!("{controller:?}"))),
            },
        )
        .expect_err("memory is not mounted");

        assert!(err.to_string().contains("not mounted"));
        assert!(root.path().join("Devices").is_dir());
        assert!(!root.path().join("Devices").join(path).exists());
        assert!(!root.path().join("Cpu").join(path).exists());
    }
}
