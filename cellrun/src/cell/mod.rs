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

//! Runs one command inside one control group.
//!
//! A [Cell] is handed a group that already carries its resources. It spawns
//! the command, attaches it to the group, waits for it, and deletes the group
//! exactly once however the run ends.

pub use error::{CellError, Result};

use crate::cgroups::CgroupManager;
use crate::command::CommandLine;
use crate::resources::ResourceSpec;
use nix::unistd::Pid;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, error, trace, warn};
use validation::ValidatedField;

mod error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Created,
    GroupReady,
    ProcessStarted,
    Attached,
    Waiting,
    Done,
}

#[derive(Debug)]
pub struct Cell<M: CgroupManager> {
    resources: ResourceSpec,
    cgroup: Option<M>,
    state: CellState,
    timeout: Option<Duration>,
}

impl<M: CgroupManager> Cell<M> {
    /// `cgroup` must already have `resources` applied.
    pub fn new(resources: ResourceSpec, cgroup: M) -> Self {
        Self {
            resources,
            cgroup: Some(cgroup),
            state: CellState::GroupReady,
            timeout: None,
        }
    }

    /// Kills the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn resources(&self) -> &ResourceSpec {
        &self.resources
    }

    /// Validates `args` and runs them with [Cell::run].
    pub async fn run_command(&mut self, args: Vec<String>) -> Result<()> {
        match CommandLine::validate(Some(args), "command", None) {
            Ok(command) => self.run(command).await,
            Err(source) => {
                self.finish(Err(CellError::InvalidArguments { source }))
            }
        }
    }

    /// Runs `command` to completion. The group is deleted afterwards whether
    /// the run succeeded or not; if both the run and the deletion fail, the
    /// run's error comes first.
    pub async fn run(&mut self, command: CommandLine) -> Result<()> {
        let result = self.execute(command).await;
        self.finish(result)
    }

    fn finish(&mut self, result: Result<()>) -> Result<()> {
        let cleanup = self.cleanup();
        self.transition(CellState::Done);

        match (result, cleanup) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(source)) => Err(CellError::GroupDeletion { source }),
            (Err(e), Ok(())) => Err(e),
            (Err(primary), Err(cleanup)) => Err(CellError::Cleanup {
                primary: Box::new(primary),
                cleanup,
            }),
        }
    }

    async fn execute(&mut self, command: CommandLine) -> Result<()> {
        if self.state != CellState::GroupReady {
            return Err(CellError::AlreadyRun);
        }

        let mut child = command
            .to_tokio_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| CellError::ProcessStart {
                program: command.program().into(),
                source,
            })?;
        self.transition(CellState::ProcessStarted);

        let pid = pid(&child).ok_or_else(|| CellError::ProcessStart {
            program: command.program().into(),
            source: io::Error::new(
                io::ErrorKind::Other,
                "process exited before it was attached",
            ),
        })?;

        let attached = match &self.cgroup {
            Some(cgroup) => cgroup.attach_process(pid),
            None => return Err(CellError::AlreadyRun),
        };
        if let Err(source) = attached {
            // the child is left running, it is not ours to kill
            warn!("process {pid} runs without resource limits");
            return Err(CellError::Attach { source });
        }
        self.transition(CellState::Attached);

        self.transition(CellState::Waiting);
        let status = match self.timeout {
            None => child.wait().await,
            Some(timeout) => {
                match tokio::time::timeout(timeout, child.wait()).await {
                    Ok(status) => status,
                    Err(_) => {
                        warn!("process {pid} timed out, killing it");
                        child
                            .kill()
                            .await
                            .map_err(|source| CellError::Wait { source })?;
                        return Err(CellError::Timeout { timeout });
                    }
                }
            }
        }
        .map_err(|source| CellError::Wait { source })?;

        debug!("process {pid} exited with {status}");
        if !status.success() {
            return Err(CellError::ChildExecution { status });
        }

        Ok(())
    }

    fn cleanup(&mut self) -> crate::cgroups::Result<()> {
        let Some(cgroup) = self.cgroup.take() else {
            return Ok(());
        };

        cgroup.delete().map_err(|e| {
            error!("failed to delete cgroup: {e}");
            e
        })
    }

    fn transition(&mut self, state: CellState) {
        trace!("cell state {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

impl<M: CgroupManager> Drop for Cell<M> {
    fn drop(&mut self) {
        if self.cgroup.is_some() {
            warn!("cell dropped before its run finished, deleting its cgroup");
            let _ = self.cleanup();
        }
    }
}

fn pid(child: &Child) -> Option<Pid> {
    child.id().map(|id| Pid::from_raw(id as i32))
}
