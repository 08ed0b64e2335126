//! `asm-assembler` is the single-pass resolution engine: it classifies
//! source lines via `asm-lexer`, builds the symbol table and per-section
//! byte streams in `asm-object`, runs the two-phase `.equ` fixpoint, and
//! back-patches forward references before handing back a resolved
//! [`asm_object::Object`].

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

mod assembler;
mod back_patch;
mod configuration;
mod engine;
mod equ;
mod section_emitter;
mod symbol_registry;

pub use assembler::Assembler;
pub use configuration::Configuration;
pub use engine::Engine;
