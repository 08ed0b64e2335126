//! Recognizing and canonicalizing decimal and hexadecimal integer literals.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, hex_digit1, one_of},
    combinator::recognize,
    sequence::{pair, preceded},
};

use crate::Input;

fn hex_literal(input: Input) -> crate::Result<Input> {
    recognize(preceded(alt((tag("0x"), tag("0X"))), hex_digit1))(input)
}

fn decimal_literal(input: Input) -> crate::Result<Input> {
    alt((recognize(char('0')), recognize(pair(one_of("123456789"), digit0))))(input)
}

/// Recognize a literal token (`0`, `[1-9][0-9]*`, or `0x`/`0X` followed by
/// hex digits) at the start of `input`.
pub fn literal(input: Input) -> crate::Result<Input> {
    alt((hex_literal, decimal_literal))(input)
}

/// Parse a literal in decimal (`0`, `[1-9][0-9]*`) or hexadecimal (`0x...`)
/// form into an unsigned value.
///
/// Panics if `text` is not one of those two forms; callers are expected to
/// have already matched `text` against [`literal`], which only accepts them.
pub fn parse_literal(text: &str) -> u32 {
    if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(digits, 16).expect("`literal` guarantees hexadecimal digits")
    } else {
        text.parse().expect("`literal` guarantees decimal digits")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_literals() {
        assert_eq!(parse_literal("0"), 0);
        assert_eq!(parse_literal("255"), 255);
        assert_eq!(parse_literal("256"), 256);
    }

    #[test]
    fn hexadecimal_literals() {
        assert_eq!(parse_literal("0xff"), 255);
        assert_eq!(parse_literal("0x100"), 256);
        assert_eq!(parse_literal("0xDEAD"), 0xDEAD);
    }

    #[test]
    fn literal_token_stops_at_the_first_non_digit() {
        assert_eq!(literal("42,").unwrap(), (",", "42"));
        assert_eq!(literal("0x10)").unwrap(), (")", "0x10"));
    }
}
