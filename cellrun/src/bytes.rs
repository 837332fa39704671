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

//! Human readable byte sizes such as `128k` or `1.5g`.

use thiserror::Error;

pub const KIB: u64 = 1 << 10;
pub const MIB: u64 = 1 << 20;
pub const GIB: u64 = 1 << 30;

pub type Result<T> = std::result::Result<T, ParseBytesError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseBytesError {
    #[error("empty byte size")]
    Empty,
    #[error("'{input}' is not a valid byte size")]
    Invalid { input: String },
    #[error("byte size '{input}' is negative")]
    Negative { input: String },
}

/// Parses a size made of a number and an optional, case-insensitive unit
/// (`k`, `m`, `g`, all powers of 1024). The number may be fractional and the
/// result is rounded down to a whole byte.
pub fn parse_bytes(input: &str) -> Result<u64> {
    let trimmed = input.trim();

    let (number, multiplier) = match trimmed.chars().last() {
        Some('k' | 'K') => (&trimmed[..trimmed.len() - 1], KIB),
        Some('m' | 'M') => (&trimmed[..trimmed.len() - 1], MIB),
        Some('g' | 'G') => (&trimmed[..trimmed.len() - 1], GIB),
        _ => (trimmed, 1),
    };

    if number.is_empty() {
        return Err(ParseBytesError::Empty);
    }

    let value: f64 = number
        .parse()
        .map_err(|_| ParseBytesError::Invalid { input: input.to_string() })?;

    if !value.is_finite() {
        return Err(ParseBytesError::Invalid { input: input.to_string() });
    }

    if value.is_sign_negative() && value != 0.0 {
        return Err(ParseBytesError::Negative { input: input.to_string() });
    }

    // `as` saturates at u64::MAX for values beyond the range
    Ok((value * multiplier as f64).floor() as u64)
}
