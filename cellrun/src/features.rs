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

//! Feature toggles.
//!
//! A toggle is baked in at build time from `CELLRUN_<NAME>` and may be
//! overridden at runtime by the same environment variable. Only the value
//! `true` (in any case) enables a toggle.

use std::env;
use tracing::warn;

/// Allows running under the legacy and hybrid cgroup hierarchies.
pub const CGROUP_V1_SUPPORT: &str = "FT_CGROUP_V1_SUPPORT";

const ENV_PREFIX: &str = "CELLRUN_";

/// A snapshot of every toggle, taken once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub cgroup_v1_support: bool,
}

impl Features {
    pub fn from_env() -> Self {
        Self { cgroup_v1_support: check_feature(CGROUP_V1_SUPPORT) }
    }
}

/// Returns whether the toggle `name` is enabled. Unknown names are reported
/// and treated as disabled.
pub fn check_feature(name: &str) -> bool {
    let build = match name {
        CGROUP_V1_SUPPORT => option_env!("CELLRUN_FT_CGROUP_V1_SUPPORT"),
        _ => {
            warn!("unknown feature: {name}");
            return false;
        }
    };

    let runtime = env::var(format!("{ENV_PREFIX}{name}")).ok();
    toggle(build, runtime.as_deref())
}

fn toggle(build: Option<&str>, runtime: Option<&str>) -> bool {
    runtime
        .or(build)
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
