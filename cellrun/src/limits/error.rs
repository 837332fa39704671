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

use super::{BlockDeviceError, LimiterKind};
use crate::bytes::ParseBytesError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LimitsError>;

#[derive(Error, Debug)]
pub enum LimitsError {
    #[error("invalid CPU value '{value}': unparsable value")]
    CpuUnparsable { value: String },
    #[error("invalid CPU value '{value}': fraction too low")]
    CpuTooLow { value: String },
    #[error("invalid CPU value '{value}': fraction too high")]
    CpuTooHigh { value: String },
    #[error("invalid RAM value '{value}': {source}")]
    Memory { value: String, source: ParseBytesError },
    #[error("error retrieving block devices from '{}': {source}", dir.display())]
    DeviceEnumeration { dir: PathBuf, source: BlockDeviceError },
    #[error("unparsable read throttle value '{value}': {source}")]
    UnparsableReadThrottle { value: String, source: ParseBytesError },
    #[error("unparsable write throttle value '{value}': {source}")]
    UnparsableWriteThrottle { value: String, source: ParseBytesError },
    #[error("a {kind} limiter was already supplied")]
    DuplicateLimiter { kind: LimiterKind },
}
