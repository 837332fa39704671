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

use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

/// Where the kernel lists block devices.
pub const SYS_BLOCK_DIR: &str = "/sys/block";

#[derive(Error, Debug)]
pub enum BlockDeviceError {
    #[error("failed to list '{}': {source}", dir.display())]
    ReadDir { dir: PathBuf, source: io::Error },
    #[error("failed to read '{}': {source}", path.display())]
    ReadDev { path: PathBuf, source: io::Error },
    #[error("unexpected format in '{}': '{content}'", path.display())]
    MalformedDev { path: PathBuf, content: String },
    #[error("invalid device number in '{}': {source}", path.display())]
    DeviceNumber { path: PathBuf, source: ParseIntError },
}

/// A kernel block device and its `major:minor` numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockDevice {
    pub name: String,
    pub major: i64,
    pub minor: i64,
}

impl BlockDevice {
    /// Lists every device in `dir`, sorted by name. Each entry must hold a
    /// `dev` file containing exactly one `major:minor` pair.
    pub fn enumerate(dir: &Path) -> Result<Vec<Self>, BlockDeviceError> {
        let entries = fs::read_dir(dir).map_err(|source| {
            BlockDeviceError::ReadDir { dir: dir.to_path_buf(), source }
        })?;

        let mut devices = entries
            .map(|entry| {
                let entry = entry.map_err(|source| BlockDeviceError::ReadDir {
                    dir: dir.to_path_buf(),
                    source,
                })?;
                let name = entry.file_name().to_string_lossy().into_owned();
                Self::from_dev_file(name, &entry.path().join("dev"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(devices)
    }

    fn from_dev_file(
        name: String,
        path: &Path,
    ) -> Result<Self, BlockDeviceError> {
        let content = fs::read_to_string(path).map_err(|source| {
            BlockDeviceError::ReadDev { path: path.to_path_buf(), source }
        })?;

        let malformed = || BlockDeviceError::MalformedDev {
            path: path.to_path_buf(),
            content: content.trim().to_string(),
        };

        let (major, minor) =
            content.trim().split_once(':').ok_or_else(malformed)?;
        if minor.contains(':') {
            return Err(malformed());
        }

        let parse = |number: &str| {
            number.parse::<i64>().map_err(|source| {
                BlockDeviceError::DeviceNumber { path: path.to_path_buf(), source }
            })
        };

        Ok(Self { name, major: parse(major)?, minor: parse(minor)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_helpers::MockBlockDevices;

    #[test]
    fn test_enumerate() {
        let mock = MockBlockDevices::new(&[("sdb", 8, 16), ("sda", 8, 0)])
            .expect("failed to create mock block devices");

        let devices =
            BlockDevice::enumerate(mock.path()).expect("enumerate devices");

        assert_eq!(
            devices,
            vec![
                BlockDevice { name: "sda".into(), major: 8, minor: 0 },
                BlockDevice { name: "sdb".into(), major: 8, minor: 16 },
            ]
        );
    }

    #[test]
    fn test_enumerate_empty_dir() {
        let mock = MockBlockDevices::empty().expect("failed to create dir");
        let devices =
            BlockDevice::enumerate(mock.path()).expect("enumerate devices");
        assert!(devices.is_empty());
    }

    #[test]
    fn test_enumerate_missing_dir() {
        assert!(matches!(
            BlockDevice::enumerate(Path::new("/nonexistent")),
            Err(BlockDeviceError::ReadDir { .. })
        ));
    }

    #[test]
    fn test_enumerate_missing_dev_file() {
        let mock = MockBlockDevices::empty().expect("failed to create dir");
        fs::create_dir(mock.path().join("loop0")).expect("create device dir");

        assert!(matches!(
            BlockDevice::enumerate(mock.path()),
            Err(BlockDeviceError::ReadDev { .. })
        ));
    }

    #[test]
    fn test_enumerate_malformed_dev_file() {
        for content in ["8", "8:0:1", ""] {
            let mock = MockBlockDevices::empty().expect("failed to create dir");
            mock.add_raw("sda", content).expect("write dev file");

            assert!(
                matches!(
                    BlockDevice::enumerate(mock.path()),
                    Err(BlockDeviceError::MalformedDev { .. })
                ),
                "content {content:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_enumerate_non_numeric_dev_file() {
        let mock = MockBlockDevices::empty().expect("failed to create dir");
        mock.add_raw("sda", "eight:0").expect("write dev file");

        assert!(matches!(
            BlockDevice::enumerate(mock.path()),
            Err(BlockDeviceError::DeviceNumber { .. })
        ));
    }
}
