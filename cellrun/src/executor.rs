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

use crate::cell::{Cell, CellError, Result};
use crate::cgroups;
use crate::command::CommandLine;
use crate::features::Features;
use crate::limits::LimiterSet;
use std::time::Duration;
use tracing::{debug, info};
use validation::ValidatedField;

/// Runs commands under the resources of a [LimiterSet].
#[derive(Debug)]
pub struct Executor {
    limiters: LimiterSet,
    features: Features,
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new(limiters: LimiterSet, features: Features) -> Self {
        Self { limiters, features, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run_command(&self, args: &[String]) -> Result<()> {
        // nothing is created for a command that cannot run
        let command =
            CommandLine::validate(Some(args.to_vec()), "command", None)
                .map_err(|source| CellError::InvalidArguments { source })?;

        let resources = self.limiters.apply();
        debug!("resources for this run: {resources:?}");

        let cgroup = cgroups::select_manager(&resources, &self.features)
            .map_err(|source| CellError::CgroupInitialization { source })?;
        info!("running {args:?} in cgroup {}", cgroup.name());

        let mut cell = Cell::new(resources, cgroup).with_timeout(self.timeout);
        cell.run(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroups::{CgroupMode, CgroupsError};

    #[tokio::test]
    async fn test_run_command_rejects_empty_args() {
        let executor = Executor::new(LimiterSet::new(), Features::default());

        assert!(matches!(
            executor.run_command(&[]).await,
            Err(CellError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_cgroup_initialization_wraps_source() {
        let err = CellError::CgroupInitialization {
            source: CgroupsError::UnsupportedCgroupVersion {
                mode: CgroupMode::Hybrid,
            },
        };

        assert_eq!(
            err.to_string(),
            "error initializing cgroup manager: cgroup v1 is not supported \
             (host runs the hybrid hierarchy)"
        );
    }
}
