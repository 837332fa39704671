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

//! Runs a single command under Linux cgroup resource limits.
//!
//! The limits given on the command line are turned into a
//! [resources::ResourceSpec] by a [limits::LimiterSet], a control group is
//! created with those resources on the host's hierarchy, and the command runs
//! attached to it. The group is removed when the command ends.

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
#![warn(clippy::unwrap_used)]

use clap::Parser;
use executor::Executor;
use features::Features;
use limits::{LimitFlags, LimiterSet, SYS_BLOCK_DIR, UNLIMITED};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub mod bytes;
pub mod cell;
pub mod cgroups;
pub mod command;
pub mod executor;
pub mod features;
pub mod limits;
pub mod resources;

mod logging;

const EXIT_OKAY: i32 = 0;
const EXIT_ERROR: i32 = 1;

/// Command line options for cellrun.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(override_usage = "cellrun [OPTIONS] -- <COMMAND>...")]
pub struct CellrunOptions {
    /// Memory limit (e.g. 128m, 1g)
    #[clap(long)]
    pub ram: Option<String>,
    /// CPU limit as a fraction between 0 and 1 (e.g. 0.5)
    #[clap(long)]
    pub cpu: Option<String>,
    /// I/O read bandwidth per device (e.g. 128k, 1m), -1 for unlimited
    #[clap(long, default_value = UNLIMITED, allow_hyphen_values = true)]
    pub io_read_max: String,
    /// I/O write bandwidth per device (e.g. 128k, 1m), -1 for unlimited
    #[clap(long, default_value = UNLIMITED, allow_hyphen_values = true)]
    pub io_write_max: String,
    /// Directory listing the host's block devices
    #[clap(
        long,
        hide = true,
        env = "CELLRUN_SYS_BLOCK_DIR",
        default_value = SYS_BLOCK_DIR
    )]
    pub block_dir: PathBuf,
    /// Kill the command after this many seconds
    #[clap(long)]
    pub timeout: Option<u64>,
    /// Toggle verbosity. Default false
    #[clap(short, long)]
    pub verbose: bool,
    /// The command to run, followed by its arguments
    #[clap(last = true, required = true)]
    pub command: Vec<String>,
}

impl CellrunOptions {
    pub fn limit_flags(&self) -> LimitFlags {
        LimitFlags {
            cpu: self.cpu.clone(),
            memory: self.ram.clone(),
            io_read_max: self.io_read_max.clone(),
            io_write_max: self.io_write_max.clone(),
            block_dir: self.block_dir.clone(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Parses the command line, runs the command and returns the exit code.
pub async fn run() -> i32 {
    let options = CellrunOptions::parse();

    if let Err(e) = logging::init(options.verbose) {
        eprintln!("failed to initialize logging: {e}");
    }

    info!("cellrun is pid {}", std::process::id());

    match execute(&options).await {
        Ok(()) => EXIT_OKAY,
        Err(e) => {
            debug!("{e:?}");
            eprintln!("{e}");
            EXIT_ERROR
        }
    }
}

async fn execute(options: &CellrunOptions) -> anyhow::Result<()> {
    let limiters = LimiterSet::from_flags(&options.limit_flags())?;
    let executor = Executor::new(limiters, Features::from_env())
        .with_timeout(options.timeout());

    executor.run_command(&options.command).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_defaults() {
        let options =
            CellrunOptions::try_parse_from(["cellrun", "--", "echo", "hello"])
                .expect("valid command line");

        assert_eq!(options.command, vec!["echo", "hello"]);
        assert_eq!(options.io_read_max, UNLIMITED);
        assert_eq!(options.io_write_max, UNLIMITED);
        assert_eq!(options.ram, None);
        assert_eq!(options.cpu, None);
        assert_eq!(options.timeout(), None);
        assert!(!options.verbose);
    }

    #[test]
    fn test_parse_all_limits() {
        let options = CellrunOptions::try_parse_from([
            "cellrun",
            "--ram",
            "128m",
            "--cpu",
            "0.5",
            "--io-read-max",
            "-1",
            "--io-write-max",
            "1m",
            "--timeout",
            "30",
            "-v",
            "--",
            "ls",
            "-la",
        ])
        .expect("valid command line");

        let flags = options.limit_flags();
        assert_eq!(flags.memory.as_deref(), Some("128m"));
        assert_eq!(flags.cpu.as_deref(), Some("0.5"));
        assert_eq!(flags.io_read_max, "-1");
        assert_eq!(flags.io_write_max, "1m");
        assert_eq!(options.timeout(), Some(Duration::from_secs(30)));
        assert!(options.verbose);
        assert_eq!(options.command, vec!["ls", "-la"]);
    }

    #[test]
    fn test_parse_requires_command() {
        assert!(CellrunOptions::try_parse_from(["cellrun"]).is_err());
        assert!(CellrunOptions::try_parse_from(["cellrun", "--"]).is_err());
        assert!(
            CellrunOptions::try_parse_from(["cellrun", "--ram", "1g"]).is_err()
        );
    }
}
