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

use super::ValidationError;
use validator::HasLen;

pub fn required<T>(
    value: Option<T>,
    field_name: &str,
    parent_name: Option<&str>,
) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::Required {
        field: super::field_name(field_name, parent_name),
    })
}

pub fn required_not_empty<T: HasLen>(
    value: Option<T>,
    field_name: &str,
    parent_name: Option<&str>,
) -> Result<T, ValidationError> {
    let value = required(value, field_name, parent_name)?;

    if value.length() == 0 {
        return Err(ValidationError::Required {
            field: super::field_name(field_name, parent_name),
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(matches!(required(Some(1), "test", None), Ok(1)));
        assert!(matches!(
            required(None::<u8>, "test", Some("parent")),
            Err(ValidationError::Required { field }) if field == "parent.test"
        ));
    }

    #[test]
    fn test_required_not_empty() {
        assert!(matches!(
            required_not_empty(Some(vec!["echo".to_string()]), "test", None),
            Ok(x) if x.len() == 1
        ));

        assert!(matches!(
            required_not_empty(None::<String>, "test", None),
            Err(ValidationError::Required { .. })
        ));

        assert!(matches!(
            required_not_empty(Some(Vec::<String>::new()), "test", None),
            Err(ValidationError::Required { .. })
        ));
    }
}
