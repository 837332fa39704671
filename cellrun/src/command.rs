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

use std::ffi::OsStr;
use validation::{ValidatedField, ValidationError};

/// A program and its arguments, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsStr::new)
    }

    pub fn to_tokio_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        let _ = command.args(self.args());
        command
    }
}

impl ValidatedField<Vec<String>> for CommandLine {
    fn validate(
        input: Option<Vec<String>>,
        field_name: &str,
        parent_name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let mut input =
            validation::required_not_empty(input, field_name, parent_name)?;
        let program = input.remove(0);
        Ok(Self { program, args: input })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let command = CommandLine::validate(
            Some(vec!["echo".into(), "hello".into(), "world".into()]),
            "command",
            None,
        )
        .expect("valid command");

        assert_eq!(command.program(), "echo");
        assert_eq!(command.args().collect::<Vec<_>>(), vec!["hello", "world"]);
    }

    #[test]
    fn test_validate_empty() {
        assert!(matches!(
            CommandLine::validate(Some(vec![]), "command", None),
            Err(ValidationError::Required { field }) if field == "command"
        ));
    }
}
