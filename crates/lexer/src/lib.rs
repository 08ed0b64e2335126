//! `asm-lexer` is the lexical front end of this assembler: it classifies a
//! source line into a tagged record ([`line::classify_line`]) and decomposes
//! an operand string into its addressing-mode variant
//! ([`operand::parse_operand`]). Both are pure, stateless functions over
//! strings — the symbol table, section buffers, and `.equ` bookkeeping that
//! interpret their output live in `asm-assembler`.
//!
//! Both are built from `nom` combinators over `&str` input, the same way
//! `weld-parser` builds its ELF64 structure parsers from `nom` combinators
//! over `&[u8]` input: the same `Input`/`Result` type-alias convention, the
//! same style of small named combinators composed with `tuple`/`alt`.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

pub mod line;
pub mod literal;
pub mod mnemonic;
pub mod operand;

pub use line::{classify_line, Line, LineError, Sign};
pub use literal::parse_literal;
pub use mnemonic::Shape;
pub use operand::{parse_operand, AddrMode, Operand, OperandError};

/// This crate's input type: a line or operand fragment is always `&str`,
/// never the raw `&[u8]` `weld-parser` parses ELF64 structures from.
pub type Input<'a> = &'a str;

/// This crate's parser result type, `weld-parser`'s `Result` alias narrowed
/// to the default `nom` error type (no custom error stack is needed here).
pub type Result<'a, O> = nom::IResult<Input<'a>, O>;
