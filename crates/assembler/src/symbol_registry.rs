//! Symbol table operations: lookup-or-create, label definition, `.global`/
//! `.extern` declaration, and section definition.

use asm_object::{ForwardReference, Scope, Symbol};
use asm_errors::Error;

use crate::engine::Engine;

impl Engine {
    /// Look up `name`, creating a new LOCAL, undefined symbol if absent. If
    /// `forward_ref` is given, it is appended to the symbol's forward-ref
    /// list regardless of whether the symbol already existed.
    pub fn lookup_or_reference(
        &mut self,
        name: &str,
        forward_ref: Option<ForwardReference>,
    ) -> u32 {
        let number = match self.symbols_by_name.get(name) {
            Some(&number) => number,
            None => {
                let number = self.next_symbol_number();
                self.symbols.push(Symbol::new(number, name));
                self.symbols_by_name.insert(name.to_string(), number);
                tracing::trace!(name, number, "created a new symbol on first reference");
                number
            }
        };

        if let Some(forward_ref) = forward_ref {
            self.symbol_mut(number).add_forward_ref(forward_ref);
        }

        number
    }

    /// Define `name` as a label at `(section, value)`.
    pub fn define_label(&mut self, name: &str, section: u32, value: i32) {
        if let Some(&number) = self.symbols_by_name.get(name) {
            let symbol = self.symbol_mut(number);
            if symbol.is_defined() {
                self.report(Error::MultipleDefinition(name.to_string()));
                return;
            }
            symbol.define(section, value);
        } else {
            let number = self.next_symbol_number();
            let mut symbol = Symbol::new(number, name);
            symbol.define(section, value);
            self.symbols.push(symbol);
            self.symbols_by_name.insert(name.to_string(), number);
        }
    }

    /// Declare `name` `.global` (`is_extern = false`) or `.extern`
    /// (`is_extern = true`).
    pub fn declare(&mut self, name: &str, is_extern: bool) {
        let scope = if is_extern { Scope::Extern } else { Scope::Global };

        if let Some(&number) = self.symbols_by_name.get(name) {
            let symbol = self.symbol_mut(number);
            if is_extern && symbol.is_defined() && symbol.scope() != Scope::Extern {
                self.report(Error::ExternConflict(name.to_string()));
                return;
            }
            symbol.set_scope(scope);
        } else {
            let number = self.next_symbol_number();
            let mut symbol = Symbol::new(number, name);
            symbol.set_scope(scope);
            self.symbols.push(symbol);
            self.symbols_by_name.insert(name.to_string(), number);
        }
    }

    /// Switch to (creating if necessary) the section named `name`, returning
    /// its section number. A section symbol's own number equals its section
    /// field; re-entering a known section resumes its existing location
    /// counter, since the section's state is never discarded between
    /// switches.
    pub fn define_section(&mut self, name: &str) -> Option<u32> {
        if let Some(&number) = self.symbols_by_name.get(name) {
            if !self.symbol(number).is_section() {
                self.report(Error::SectionNameConflict(name.to_string()));
                return None;
            }
            self.current_section = Some(number);
            return Some(number);
        }

        let number = self.next_symbol_number();
        let mut symbol = Symbol::new(number, name);
        symbol.define(number, 0);
        self.symbols.push(symbol);
        self.symbols_by_name.insert(name.to_string(), number);
        self.section_mut(number);
        self.current_section = Some(number);

        tracing::debug!(name, number, "opened a new section");

        Some(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_or_reference_creates_once() {
        let mut engine = Engine::new();
        let a = engine.lookup_or_reference("x", None);
        let b = engine.lookup_or_reference("x", None);

        assert_eq!(a, b);
        assert_eq!(engine.symbols.len(), 1);
    }

    #[test]
    fn define_label_on_an_undefined_forward_reference() {
        let mut engine = Engine::new();
        engine.lookup_or_reference("start", None);

        engine.define_label("start", 1, 4);

        assert!(engine.symbol(1).is_defined());
        assert_eq!(engine.symbol(1).value(), 4);
    }

    #[test]
    fn redefining_a_label_is_an_error() {
        let mut engine = Engine::new();
        engine.define_label("start", 1, 0);
        engine.define_label("start", 1, 2);

        assert_eq!(engine.errors.len(), 1);
    }

    #[test]
    fn section_reentry_keeps_its_location_counter() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();
        engine.section_mut(text).push_byte(1);
        engine.section_mut(text).push_byte(2);

        engine.define_section("data").unwrap();
        engine.define_section("text").unwrap();

        assert_eq!(engine.section(text).unwrap().location_counter(), 2);
    }

    #[test]
    fn extern_conflicts_with_a_local_definition() {
        let mut engine = Engine::new();
        engine.define_label("x", 1, 0);
        engine.declare("x", true);

        assert_eq!(engine.errors.len(), 1);
    }
}
