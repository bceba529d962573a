//! パース関連のユーティリティ関数

use crate::{DebugError, Result};

/// オフセット文字列をi64にパース
///
/// 16進数のみを受け付けます。`0x` プレフィックスと先頭の `-` は省略可能です。
///
/// # Examples
/// ```
/// use hari_core::parse::parse_offset;
///
/// assert_eq!(parse_offset("0x10").unwrap(), 0x10);
/// assert_eq!(parse_offset("ff").unwrap(), 0xff);
/// assert_eq!(parse_offset("-0x8").unwrap(), -8);
/// ```
pub fn parse_offset(s: &str) -> Result<i64> {
    let invalid = || DebugError::InvalidOffset(s.to_string());

    let trimmed = s.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);

    // from_str_radixは符号を受け付けるので、ここで二重の符号を弾く
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let magnitude = i64::from_str_radix(digits, 16).map_err(|_| invalid())?;
    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset_hex() {
        assert_eq!(parse_offset("0x10").unwrap(), 0x10);
        assert_eq!(parse_offset("0X1234").unwrap(), 0x1234);
        assert_eq!(parse_offset("abcd").unwrap(), 0xabcd);
        assert_eq!(parse_offset("ABCD").unwrap(), 0xabcd);
        assert_eq!(parse_offset("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_offset_is_never_decimal() {
        assert_eq!(parse_offset("10").unwrap(), 0x10);
    }

    #[test]
    fn test_parse_offset_negative() {
        assert_eq!(parse_offset("-10").unwrap(), -0x10);
        assert_eq!(parse_offset("-0x10").unwrap(), -0x10);
    }

    #[test]
    fn test_parse_offset_invalid() {
        assert!(parse_offset("xyz").is_err());
        assert!(parse_offset("0xghij").is_err());
        assert!(parse_offset("").is_err());
        assert!(parse_offset("0x").is_err());
        assert!(parse_offset("--1").is_err());
        assert!(parse_offset("10000000000000000").is_err());
    }
}
