//! Classifying one source line into a tagged line record.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1},
    combinator::{all_consuming, map, opt, recognize, rest},
    multi::many0,
    sequence::{pair, tuple},
};
use thiserror::Error;

use crate::{literal, Input};

/// The sign attached to an `.equ` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// `+`, including the implicit sign of the first term.
    Plus,
    /// `-`.
    Minus,
}

/// A classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `ident ":" rest`. `rest`, if non-blank, is itself a line to classify
    /// (a label and an instruction may share one physical line).
    Label { name: String, rest: Option<String> },
    /// `.global ident(, ident)*`.
    Global { names: Vec<String> },
    /// `.extern ident(, ident)*`.
    Extern { names: Vec<String> },
    /// `.section ident ":"`.
    Section { name: String },
    /// `.byte item(, item)*`.
    Byte { items: Vec<String> },
    /// `.word item(, item)*`.
    Word { items: Vec<String> },
    /// `.skip lit`.
    Skip { literal: String },
    /// `.equ ident , signed_linear_expression`.
    Equ { name: String, terms: Vec<(Sign, String)> },
    /// An instruction mnemonic plus its raw, unparsed operand strings.
    Instruction { mnemonic: String, operands: Vec<String> },
}

/// A source line matched none of the recognized grammars.
#[derive(Debug, Error)]
#[error("`{0}` is not a recognized instruction or directive")]
pub struct LineError(pub String);

fn identifier_slice(input: Input) -> crate::Result<Input> {
    recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_"))))))(input)
}

fn identifier(input: Input) -> crate::Result<String> {
    map(identifier_slice, str::to_string)(input)
}

/// Find every identifier/literal token in `text`, in order, ignoring
/// whatever separates them (commas, signs, stray whitespace). Used for
/// `.global`/`.extern`/`.byte`/`.word` lists and `.equ` expressions, which
/// are permissive about punctuation between terms.
fn tokens(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        match alt((identifier_slice, literal::literal))(remaining) {
            Ok((rest, matched)) => {
                found.push(matched);
                remaining = rest;
            }
            Err(_) => {
                let mut chars = remaining.chars();
                chars.next();
                remaining = chars.as_str();
            }
        }
    }

    found
}

fn split_list(text: &str) -> Vec<String> {
    tokens(text).into_iter().map(str::to_string).collect()
}

/// Split an `.equ` expression into its signed terms, the first term's sign
/// defaulting to [`Sign::Plus`].
fn split_expression(text: &str) -> Vec<(Sign, String)> {
    let mut terms = Vec::new();
    let mut pending_sign = Sign::Plus;
    let mut remaining = text;

    while !remaining.is_empty() {
        match alt((identifier_slice, literal::literal))(remaining) {
            Ok((rest, matched)) => {
                terms.push((pending_sign, matched.to_string()));
                let (rest, _) = multispace0::<_, nom::error::Error<Input>>(rest)
                    .expect("multispace0 never fails");
                pending_sign =
                    if rest.starts_with('-') { Sign::Minus } else { Sign::Plus };
                remaining = rest;
            }
            Err(_) => {
                let mut chars = remaining.chars();
                chars.next();
                remaining = chars.as_str();
            }
        }
    }

    terms
}

fn label(input: Input) -> crate::Result<Line> {
    map(tuple((multispace0, identifier, char(':'), multispace0, rest)), |(_, name, _, _, rest)| {
        let rest: &str = rest;
        Line::Label { name, rest: if rest.trim().is_empty() { None } else { Some(rest.trim().to_string()) } }
    })(input)
}

fn directive_argument<'a>(keyword: &'static str) -> impl FnMut(Input<'a>) -> crate::Result<'a, Input<'a>> {
    map(tuple((multispace0, tag(keyword), multispace1, rest)), |(_, _, _, argument)| argument)
}

fn global(input: Input) -> crate::Result<Line> {
    map(directive_argument(".global"), |text: &str| Line::Global { names: split_list(text.trim()) })(input)
}

fn r#extern(input: Input) -> crate::Result<Line> {
    map(directive_argument(".extern"), |text: &str| Line::Extern { names: split_list(text.trim()) })(input)
}

fn section(input: Input) -> crate::Result<Line> {
    map(
        tuple((multispace0, tag(".section"), multispace1, identifier, char(':'), multispace0)),
        |(_, _, _, name, _, _)| Line::Section { name },
    )(input)
}

fn byte(input: Input) -> crate::Result<Line> {
    map(directive_argument(".byte"), |text: &str| Line::Byte { items: split_list(text.trim()) })(input)
}

fn word(input: Input) -> crate::Result<Line> {
    map(directive_argument(".word"), |text: &str| Line::Word { items: split_list(text.trim()) })(input)
}

fn skip(input: Input) -> crate::Result<Line> {
    map(
        tuple((multispace0, tag(".skip"), multispace1, literal::literal, multispace0)),
        |(_, _, _, lit, _)| Line::Skip { literal: lit.to_string() },
    )(input)
}

fn equ(input: Input) -> crate::Result<Line> {
    map(
        tuple((multispace0, tag(".equ"), multispace1, identifier, multispace0, char(','), multispace0, rest)),
        |(_, _, _, name, _, _, _, expression): (_, _, _, _, _, _, _, &str)| {
            Line::Equ { name, terms: split_expression(expression.trim()) }
        },
    )(input)
}

fn instruction(input: Input) -> crate::Result<(String, Input)> {
    map(
        tuple((multispace0, identifier, opt(tuple((multispace1, rest))))),
        |(_, mnemonic, tail)| (mnemonic, tail.map(|(_, operands)| operands).unwrap_or("")),
    )(input)
}

/// Classify one source line. Returns `Ok(None)` for a blank (or
/// whitespace-only) line.
pub fn classify_line(line: &str) -> Result<Option<Line>, LineError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    if let Ok((_, parsed)) = label(line) {
        tracing::trace!(line, "classified as a label");
        return Ok(Some(parsed));
    }

    if let Ok((_, parsed)) = global(line) {
        tracing::trace!(line, "classified as .global");
        return Ok(Some(parsed));
    }

    if let Ok((_, parsed)) = r#extern(line) {
        tracing::trace!(line, "classified as .extern");
        return Ok(Some(parsed));
    }

    if let Ok((_, parsed)) = all_consuming(section)(line) {
        tracing::trace!(line, "classified as .section");
        return Ok(Some(parsed));
    }

    if let Ok((_, parsed)) = byte(line) {
        tracing::trace!(line, "classified as .byte");
        return Ok(Some(parsed));
    }

    if let Ok((_, parsed)) = word(line) {
        tracing::trace!(line, "classified as .word");
        return Ok(Some(parsed));
    }

    if let Ok((_, parsed)) = all_consuming(skip)(line) {
        tracing::trace!(line, "classified as .skip");
        return Ok(Some(parsed));
    }

    if let Ok((_, parsed)) = equ(line) {
        tracing::trace!(line, "classified as .equ");
        return Ok(Some(parsed));
    }

    if let Ok((_, (mnemonic, operand_text))) = all_consuming(instruction)(line) {
        if crate::mnemonic::lookup(&mnemonic).is_some() {
            let operand_text = operand_text.trim();
            let operands = if operand_text.is_empty() {
                Vec::new()
            } else {
                operand_text.split(',').map(|operand| operand.trim().to_string()).collect()
            };
            tracing::trace!(line, %mnemonic, "classified as an instruction");
            return Ok(Some(Line::Instruction { mnemonic, operands }));
        }
    }

    tracing::debug!(line, "line did not match any recognized grammar");
    Err(LineError(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_with_no_trailing_instruction() {
        assert_eq!(
            classify_line("end:").unwrap(),
            Some(Line::Label { name: "end".into(), rest: None })
        );
    }

    #[test]
    fn label_sharing_a_line_with_an_instruction() {
        assert_eq!(
            classify_line("start:  jmp end").unwrap(),
            Some(Line::Label { name: "start".into(), rest: Some("jmp end".into()) })
        );
    }

    #[test]
    fn global_list() {
        assert_eq!(
            classify_line(".global a, b,c").unwrap(),
            Some(Line::Global { names: vec!["a".into(), "b".into(), "c".into()] })
        );
    }

    #[test]
    fn section_directive() {
        assert_eq!(
            classify_line(".section text:").unwrap(),
            Some(Line::Section { name: "text".into() })
        );
    }

    #[test]
    fn equ_expression_signs() {
        let line = classify_line(".equ k, 5 + 3 - 2").unwrap().unwrap();
        assert_eq!(
            line,
            Line::Equ {
                name: "k".into(),
                terms: vec![
                    (Sign::Plus, "5".into()),
                    (Sign::Plus, "3".into()),
                    (Sign::Minus, "2".into()),
                ],
            }
        );
    }

    #[test]
    fn two_operand_instruction() {
        assert_eq!(
            classify_line("mov $5, %r0").unwrap(),
            Some(Line::Instruction {
                mnemonic: "mov".into(),
                operands: vec!["$5".into(), "%r0".into()],
            })
        );
    }

    #[test]
    fn no_operand_instruction() {
        assert_eq!(
            classify_line("halt").unwrap(),
            Some(Line::Instruction { mnemonic: "halt".into(), operands: vec![] })
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(classify_line("").unwrap(), None);
        assert_eq!(classify_line("   \t  ").unwrap(), None);
    }

    #[test]
    fn unrecognized_lines_are_rejected() {
        assert!(classify_line("%!@#").is_err());
    }
}
