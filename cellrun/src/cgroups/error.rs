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

use super::{CgroupMode, CgroupName};
use crate::resources::ResourcesError;
use thiserror::Error;
use validation::ValidationError;

pub type Result<T> = std::result::Result<T, CgroupsError>;

#[derive(Error, Debug)]
pub enum CgroupsError {
    #[error("invalid cgroup name: {source}")]
    InvalidCgroupName { source: ValidationError },
    #[error("failed to detect cgroup mode: {source}")]
    DetectMode { source: anyhow::Error },
    #[error("cgroup v1 is not supported (host runs the {mode} hierarchy)")]
    UnsupportedCgroupVersion { mode: CgroupMode },
    #[error("cgroup '{name}' has invalid resources: {source}")]
    InvalidResources { name: CgroupName, source: ResourcesError },
    #[error("cgroup '{name}' creation failed: {source}")]
    CreateCgroup { name: CgroupName, source: anyhow::Error },
    #[error("cgroup '{name}' failed to add process: {source}")]
    AttachProcess { name: CgroupName, source: anyhow::Error },
    #[error("cgroup '{name}' deletion failed: {source}")]
    DeleteCgroup { name: CgroupName, source: anyhow::Error },
}
