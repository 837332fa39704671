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

use crate::cgroups::CgroupsError;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;
use validation::ValidationError;

pub type Result<T> = std::result::Result<T, CellError>;

#[derive(Error, Debug)]
pub enum CellError {
    #[error("invalid arguments: {source}")]
    InvalidArguments { source: ValidationError },
    #[error("error initializing cgroup manager: {source}")]
    CgroupInitialization { source: CgroupsError },
    #[error("cell has already run a command")]
    AlreadyRun,
    #[error("error starting command '{program}': {source}")]
    ProcessStart { program: String, source: io::Error },
    #[error("error adding process to cgroup: {source}")]
    Attach { source: CgroupsError },
    #[error("error waiting for command: {source}")]
    Wait { source: io::Error },
    #[error("command exited with error: {status}")]
    ChildExecution { status: ExitStatus },
    #[error("command did not finish within {}s", timeout.as_secs_f64())]
    Timeout { timeout: Duration },
    #[error("failed to delete cgroup: {source}")]
    GroupDeletion { source: CgroupsError },
    #[error("{primary}; additionally failed to delete cgroup: {cleanup}")]
    Cleanup {
        #[source]
        primary: Box<CellError>,
        cleanup: CgroupsError,
    },
}
