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

#![warn(future_incompatible, nonstandard_style, unused)]
#![warn(clippy::unwrap_used)]

//! Field validation shared by the cellrun crates.
//!
//! Types that must only exist in a valid state implement [ValidatedField]
//! and are constructed through it.

pub use self::allow_regex::allow_regex;
pub use self::required_not_empty::{required, required_not_empty};
use fancy_regex::Regex;
use lazy_static::lazy_static;

mod allow_regex;
mod required_not_empty;

lazy_static! {
    /// Alphanumeric segments joined by single hyphens, which is what
    /// systemd accepts as the prefix of a slice unit.
    pub static ref CGROUP_NAME_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*$")
            .expect("failed to parse 'CGROUP_NAME_REGEX'");
}

pub trait ValidatedField<T>
where
    Self: Sized,
{
    fn validate(
        input: Option<T>,
        field_name: &str,
        parent_name: Option<&str>,
    ) -> Result<Self, ValidationError>;
}

pub fn field_name(field_name: &str, parent_name: Option<&str>) -> String {
    match parent_name {
        None => field_name.to_string(),
        Some(parent_name) => format!("{parent_name}.{field_name}"),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Field = {field}; Required")]
    Required { field: String },
    #[error("Field = {field}; Regex = {pattern}")]
    AllowRegexViolation { field: String, pattern: String },
}

impl ValidationError {
    pub fn get_field(&self) -> &str {
        match self {
            Self::Required { field }
            | Self::AllowRegexViolation { field, .. } => field,
        }
    }
}
