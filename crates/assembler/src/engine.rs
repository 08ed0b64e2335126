//! The engine: the single owner of the symbol table, section buffers, and
//! `.equ` bookkeeping for the duration of one assembly.

use std::collections::{BTreeMap, HashMap};

use asm_object::{EquEntry, Section, Symbol};

/// The single-pass resolution engine. Every component in this crate
/// (`SymbolRegistry`, `SectionEmitter`, `EquResolver`, `BackPatcher`) is an
/// `impl` block over this type, operating on its tables by symbol/section
/// number rather than by reference.
#[derive(Debug, Default)]
pub struct Engine {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) symbols_by_name: HashMap<String, u32>,
    pub(crate) sections: BTreeMap<u32, Section>,
    pub(crate) current_section: Option<u32>,
    pub(crate) equ_entries: Vec<EquEntry>,
    pub(crate) equ_index_by_symbol: HashMap<u32, usize>,
    pub(crate) errors: Vec<asm_errors::Error>,
}

impl Engine {
    /// Create a fresh, empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnosed error and keep going, per the propagation policy:
    /// the pass continues so later diagnostics can surface.
    pub(crate) fn report(&mut self, error: asm_errors::Error) {
        tracing::debug!(%error, "diagnosed an error");
        self.errors.push(error);
    }

    pub(crate) fn next_symbol_number(&self) -> u32 {
        self.symbols.len() as u32 + 1
    }

    pub(crate) fn symbol(&self, number: u32) -> &Symbol {
        &self.symbols[(number - 1) as usize]
    }

    pub(crate) fn symbol_mut(&mut self, number: u32) -> &mut Symbol {
        &mut self.symbols[(number - 1) as usize]
    }

    pub(crate) fn section_mut(&mut self, number: u32) -> &mut Section {
        self.sections.entry(number).or_insert_with(Section::new)
    }

    pub(crate) fn section(&self, number: u32) -> Option<&Section> {
        self.sections.get(&number)
    }
}
