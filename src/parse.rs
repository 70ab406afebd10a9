//! Integer parsing for CLI arguments.

use anyhow::{anyhow, Result};
use num_bigint::{BigInt, Sign};

#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidHex(String),
    InvalidDecimal(String),
    Empty,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidHex(e) => write!(f, "invalid hex: {}", e),
            ParseError::InvalidDecimal(e) => write!(f, "invalid decimal: {}", e),
            ParseError::Empty => write!(f, "empty number"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a decimal or `0x`-prefixed hex integer, optionally negative.
pub fn parse_bigint(input: &str) -> Result<BigInt> {
    let input = input.trim().replace('_', "");
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.as_str()),
    };

    if digits.is_empty() {
        return Err(anyhow!(ParseError::Empty));
    }

    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex_digits) => try_parse_hex(hex_digits)?,
        None => try_parse_decimal(digits)?,
    };

    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse a comma- or whitespace-separated list of integers.
pub fn parse_bigint_list(input: &str) -> Result<Vec<BigInt>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(parse_bigint)
        .collect()
}

fn try_parse_hex(input: &str) -> Result<BigInt> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!(ParseError::InvalidHex(input.to_string())));
    }

    let padded = if input.len() % 2 == 1 {
        format!("0{}", input)
    } else {
        input.to_string()
    };
    let bytes = hex::decode(&padded).map_err(|e| anyhow!(ParseError::InvalidHex(e.to_string())))?;
    Ok(BigInt::from_bytes_be(Sign::Plus, &bytes))
}

fn try_parse_decimal(input: &str) -> Result<BigInt> {
    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!(ParseError::InvalidDecimal(input.to_string())));
    }
    BigInt::parse_bytes(input.as_bytes(), 10).ok_or_else(|| anyhow!(ParseError::InvalidDecimal(input.to_string())))
}

/// Lowercase hex with `0x` prefix; negative values keep their sign.
pub fn to_hex(value: &BigInt) -> String {
    let (sign, bytes) = value.to_bytes_be();
    let digits = hex::encode(bytes);
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    match sign {
        Sign::Minus => format!("-0x{}", digits),
        _ => format!("0x{}", digits),
    }
}
