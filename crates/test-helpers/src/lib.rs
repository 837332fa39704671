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

// Lint groups: https://doc.rust-lang.org/rustc/lints/groups.html
#![warn(future_incompatible, nonstandard_style, unused)]
#![warn(
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    unconditional_recursion,
    unused_comparisons,
    while_true
)]
#![warn(missing_debug_implementations,
trivial_casts,
trivial_numeric_casts,
unused_extern_crates,
unused_import_braces,
unused_results
)]

use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;

// The skip helpers follow the ones nix keeps private in its test suite:
// https://github.com/nix-rust/nix/blob/master/test/common/mod.rs

#[macro_export]
macro_rules! skip {
    ($($reason: expr),+) => {
        use ::std::io::{self, Write};

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        let _ = writeln!(handle, $($reason),+);
        return;
    }
}

#[macro_export]
macro_rules! skip_if_not_root {
    ($name:expr) => {
        use ::nix::unistd::Uid;

        if !Uid::current().is_root() {
            $crate::skip!("{} requires root privileges. Skipping test.", $name);
        }
    };
}

/// A throwaway directory laid out like `/sys/block`: one directory per
/// device holding a `dev` file with `major:minor`.
#[derive(Debug)]
pub struct MockBlockDevices {
    dir: TempDir,
}

impl MockBlockDevices {
    /// Creates one well-formed entry per `(name, major, minor)`.
    pub fn new(devices: &[(&str, i64, i64)]) -> io::Result<Self> {
        let mock = Self::empty()?;
        for (name, major, minor) in devices {
            mock.add_raw(name, &format!("{major}:{minor}\n"))?;
        }
        Ok(mock)
    }

    pub fn empty() -> io::Result<Self> {
        Ok(Self { dir: tempfile::Builder::new().prefix("sys-block").tempdir()? })
    }

    /// Writes `content` verbatim into `<name>/dev`, malformed or not.
    pub fn add_raw(&self, name: &str, content: &str) -> io::Result<()> {
        let device_dir = self.dir.path().join(name);
        fs::create_dir(&device_dir)?;
        fs::write(device_dir.join("dev"), content)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_block_devices_layout() {
        let mock = MockBlockDevices::new(&[("sda", 8, 0), ("sdb", 8, 16)])
            .expect("failed to create mock block devices");

        let sdb = fs::read_to_string(mock.path().join("sdb").join("dev"))
            .expect("failed to read dev file");
        assert_eq!(sdb.trim(), "8:16");
    }

    #[test]
    fn test_mock_block_devices_removed_on_drop() {
        let mock = MockBlockDevices::empty().expect("failed to create dir");
        let path = mock.path().to_path_buf();
        drop(mock);
        assert!(!path.exists());
    }
}
