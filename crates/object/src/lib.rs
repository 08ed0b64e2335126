//! `asm-object` is the data model of a relocatable object produced by this
//! assembler: a symbol table, per-section byte streams, per-section
//! relocation tables, and the bookkeeping `.equ` definitions need while
//! they are being resolved. It also knows how to render an assembled
//! [`Object`] to the textual dump format the driver writes out.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

pub mod equ;
pub mod object;
pub mod section;
pub mod symbol;
pub mod write;

pub use equ::EquEntry;
pub use object::Object;
pub use section::{Relocation, RelocationType, Section};
pub use symbol::{ForwardReference, Scope, Sign, Symbol, UNDEFINED_SECTION};
