//! Decomposing one operand string into its addressing-mode variant.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, one_of},
    combinator::{all_consuming, map, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};
use thiserror::Error;

use crate::{literal, literal::parse_literal, Input};

/// The five addressing modes, matching the high 3 bits of an operand
/// descriptor byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Immediate value carried directly in the payload.
    Immed = 0,
    /// Register direct.
    RegDir = 1,
    /// Register indirect.
    RegInd = 2,
    /// Register indirect with an offset.
    RegIndOff = 3,
    /// Absolute memory.
    Mem = 4,
}

impl AddrMode {
    /// This mode's 3-bit encoding.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One parsed operand. The variant is purely syntactic (see the table in the
/// operand grammar); a literal or symbol with no `$`/`*` prefix and one
/// written with a leading `*` share the same variant and are distinguished
/// by `dereferenced` — it is the section emitter, which knows whether the
/// owning instruction is a branch, that turns this into an [`AddrMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `$N`.
    ImmediateLit(u32),
    /// `$name`.
    ImmediateSym(String),
    /// `N` or `*N`.
    MemLit {
        /// The literal's value.
        value: u32,
        /// Whether a leading `*` was present.
        dereferenced: bool,
    },
    /// `name` or `*name`.
    MemSym {
        /// The referenced symbol's name.
        name: String,
        /// Whether a leading `*` was present.
        dereferenced: bool,
    },
    /// `%rX` or `*%rX`.
    RegDir {
        /// Register number, 0-7.
        register: u8,
    },
    /// `(%rX)` or `*(%rX)`.
    RegInd {
        /// Register number, 0-7.
        register: u8,
    },
    /// `N(%rX)`.
    RegIndLitOff {
        /// The literal offset.
        offset: u32,
        /// Register number, 0-7.
        register: u8,
    },
    /// `name(%rX)` or `name(%pc/%r7)`.
    RegIndSymOff {
        /// The referenced symbol's name.
        name: String,
        /// Register number, 0-7 (7 when written as `%pc`).
        register: u8,
        /// Whether the register was spelled `%pc` rather than `%r7`.
        pc_relative: bool,
    },
}

/// An operand string matched none of the recognized grammars.
#[derive(Debug, Error)]
#[error("`{0}` is not a valid operand")]
pub struct OperandError(pub String);

fn identifier(input: Input) -> crate::Result<Input> {
    recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_"))))))(input)
}

fn register_number(input: Input) -> crate::Result<u8> {
    map(one_of("01234567"), |c| c.to_digit(10).expect("one_of guarantees a digit") as u8)(input)
}

fn reg_ind_lit_off(input: Input) -> crate::Result<Operand> {
    map(
        tuple((
            multispace0,
            literal::literal,
            char('('),
            tag("%r"),
            register_number,
            char(')'),
            multispace0,
        )),
        |(_, lit, _, _, register, _, _)| Operand::RegIndLitOff { offset: parse_literal(lit), register },
    )(input)
}

fn reg_ind_sym_off(input: Input) -> crate::Result<Operand> {
    map(
        tuple((
            multispace0,
            identifier,
            char('('),
            alt((
                map(preceded(tag("%r"), register_number), |register| (register, false)),
                map(tag("%pc/%r7"), |_| (7, true)),
            )),
            char(')'),
            multispace0,
        )),
        |(_, name, _, (register, pc_relative), _, _)| {
            Operand::RegIndSymOff { name: name.to_string(), register, pc_relative }
        },
    )(input)
}

fn register_operand(input: Input) -> crate::Result<Operand> {
    map(
        tuple((
            multispace0,
            opt(char('*')),
            alt((
                map(preceded(tag("%r"), register_number), |register| (register, false)),
                map(delimited(tag("(%r"), register_number, char(')')), |register| (register, true)),
            )),
            multispace0,
        )),
        |(_, _, (register, indirect), _)| {
            if indirect {
                Operand::RegInd { register }
            } else {
                Operand::RegDir { register }
            }
        },
    )(input)
}

fn literal_operand(input: Input) -> crate::Result<Operand> {
    map(
        tuple((multispace0, opt(one_of("$*")), literal::literal, multispace0)),
        |(_, sigil, lit, _)| {
            let value = parse_literal(lit);
            if sigil == Some('$') {
                Operand::ImmediateLit(value)
            } else {
                Operand::MemLit { value, dereferenced: sigil == Some('*') }
            }
        },
    )(input)
}

fn symbol_operand(input: Input) -> crate::Result<Operand> {
    map(
        tuple((multispace0, opt(one_of("$*")), identifier, multispace0)),
        |(_, sigil, name, _)| {
            let name = name.to_string();
            if sigil == Some('$') {
                Operand::ImmediateSym(name)
            } else {
                Operand::MemSym { name, dereferenced: sigil == Some('*') }
            }
        },
    )(input)
}

/// Parse one operand string into its [`Operand`] variant.
pub fn parse_operand(text: &str) -> Result<Operand, OperandError> {
    let trimmed = text;

    if let Ok((_, operand)) = all_consuming(reg_ind_lit_off)(trimmed) {
        tracing::trace!(text, "parsed as a register-indirect literal offset");
        return Ok(operand);
    }

    if let Ok((_, operand)) = all_consuming(reg_ind_sym_off)(trimmed) {
        tracing::trace!(text, "parsed as a register-indirect symbol offset");
        return Ok(operand);
    }

    if let Ok((_, operand)) = all_consuming(register_operand)(trimmed) {
        tracing::trace!(text, "parsed as a register operand");
        return Ok(operand);
    }

    if let Ok((_, operand)) = all_consuming(literal_operand)(trimmed) {
        tracing::trace!(text, "parsed as a literal operand");
        return Ok(operand);
    }

    if let Ok((_, operand)) = all_consuming(symbol_operand)(trimmed) {
        tracing::trace!(text, "parsed as a symbol operand");
        return Ok(operand);
    }

    tracing::debug!(text, "operand did not match any recognized grammar");
    Err(OperandError(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_literal() {
        assert_eq!(parse_operand("$5").unwrap(), Operand::ImmediateLit(5));
        assert_eq!(parse_operand("$0x10").unwrap(), Operand::ImmediateLit(16));
    }

    #[test]
    fn immediate_symbol() {
        assert_eq!(parse_operand("$count").unwrap(), Operand::ImmediateSym("count".into()));
    }

    #[test]
    fn bare_and_starred_literal_are_mem_lit() {
        assert_eq!(
            parse_operand("5").unwrap(),
            Operand::MemLit { value: 5, dereferenced: false }
        );
        assert_eq!(
            parse_operand("*5").unwrap(),
            Operand::MemLit { value: 5, dereferenced: true }
        );
    }

    #[test]
    fn bare_and_starred_symbol_are_mem_sym() {
        assert_eq!(
            parse_operand("end").unwrap(),
            Operand::MemSym { name: "end".into(), dereferenced: false }
        );
        assert_eq!(
            parse_operand("*end").unwrap(),
            Operand::MemSym { name: "end".into(), dereferenced: true }
        );
    }

    #[test]
    fn register_direct_and_indirect() {
        assert_eq!(parse_operand("%r3").unwrap(), Operand::RegDir { register: 3 });
        assert_eq!(parse_operand("(%r3)").unwrap(), Operand::RegInd { register: 3 });
        assert_eq!(parse_operand("*%r3").unwrap(), Operand::RegDir { register: 3 });
    }

    #[test]
    fn register_indirect_with_literal_offset() {
        assert_eq!(
            parse_operand("4(%r2)").unwrap(),
            Operand::RegIndLitOff { offset: 4, register: 2 }
        );
    }

    #[test]
    fn register_indirect_with_symbol_offset() {
        assert_eq!(
            parse_operand("table(%r1)").unwrap(),
            Operand::RegIndSymOff { name: "table".into(), register: 1, pc_relative: false }
        );
        assert_eq!(
            parse_operand("fn(%pc/%r7)").unwrap(),
            Operand::RegIndSymOff { name: "fn".into(), register: 7, pc_relative: true }
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_operand("%r9").is_err());
        assert!(parse_operand("").is_err());
    }
}
