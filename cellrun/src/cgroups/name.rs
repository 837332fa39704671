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

use super::{CgroupsError, Result};
use std::fmt::{Display, Formatter};
use validation::{ValidatedField, ValidationError};

const PREFIX: &str = "cellrun-cgroup";
const UNIT_SUFFIX: &str = ".slice";

/// The name of the group a single run creates, unique per cellrun process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CgroupName(String);

impl CgroupName {
    pub fn for_process(pid: u32) -> Result<Self> {
        Self::validate(Some(format!("{PREFIX}-{pid}")), "cgroup_name", None)
            .map_err(|source| CgroupsError::InvalidCgroupName { source })
    }

    /// The name as a systemd slice unit, as cgroup v2 hosts expect it.
    pub fn with_unit_suffix(&self) -> String {
        if self.0.ends_with(UNIT_SUFFIX) {
            self.0.clone()
        } else {
            format!("{}{UNIT_SUFFIX}", self.0)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValidatedField<String> for CgroupName {
    fn validate(
        input: Option<String>,
        field_name: &str,
        parent_name: Option<&str>,
    ) -> std::result::Result<Self, ValidationError> {
        let input =
            validation::required_not_empty(input, field_name, parent_name)?;

        validation::allow_regex(
            &input,
            &validation::CGROUP_NAME_REGEX,
            field_name,
            parent_name,
        )?;

        Ok(Self(input))
    }
}

impl Display for CgroupName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
