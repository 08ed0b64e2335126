//! `.equ` expression capture and the two-phase fixpoint resolver.

use asm_errors::Error;
use asm_lexer::parse_literal;
use asm_object::{EquEntry, Scope, Sign};

use crate::engine::Engine;

fn convert_sign(sign: asm_lexer::Sign) -> Sign {
    match sign {
        asm_lexer::Sign::Plus => Sign::Plus,
        asm_lexer::Sign::Minus => Sign::Minus,
    }
}

fn is_literal(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

impl Engine {
    /// Capture an `.equ name, expr` line: fold what can be folded now, defer
    /// the rest.
    pub fn capture_equ(&mut self, name: &str, terms: &[(asm_lexer::Sign, String)]) {
        let number = self.lookup_or_reference(name, None);

        if self.equ_index_by_symbol.contains_key(&number) {
            self.report(Error::MultipleDefinition(name.to_string()));
            return;
        }

        let mut entry = EquEntry::new(number, Vec::new(), Vec::new());
        let mut value: i32 = 0;

        for (sign, text) in terms {
            let sign = convert_sign(*sign);

            if is_literal(text) {
                value += sign.apply(parse_literal(text) as i32);
                continue;
            }

            let term_number = self.lookup_or_reference(text, None);
            let term = self.symbol(term_number).clone();

            if term.is_defined() && !term.is_equ() {
                value += sign.apply(term.value());
                entry.record_fold(term.section(), sign);
            } else {
                entry.defer_term(term_number, sign);
            }
        }

        let symbol = self.symbol_mut(number);
        symbol.set_is_equ(true);
        symbol.set_value(value);

        self.equ_index_by_symbol.insert(number, self.equ_entries.len());
        self.equ_entries.push(entry);

        tracing::debug!(name, "captured an .equ definition");
    }

    /// Run the EQU fixpoint resolver: Phase P1 (fold non-EQU terms), then
    /// Phase P2 (fold EQU-on-EQU dependencies until a pass makes no
    /// progress).
    pub fn resolve_equ(&mut self) {
        for index in 0..self.equ_entries.len() {
            self.fold_non_equ_pending(index);
            self.finalize_if_resolved(index);
        }

        self.check_non_equ_undefined();

        loop {
            let mut progress = false;

            for index in 0..self.equ_entries.len() {
                let target = self.equ_entries[index].symbol();
                if self.symbol(target).is_defined() {
                    continue;
                }

                let before = self.equ_entries[index].pending_symbols().len();
                self.fold_equ_pending(index);
                if self.equ_entries[index].pending_symbols().len() < before {
                    progress = true;
                }

                if self.equ_entries[index].is_resolved() {
                    self.finalize_if_resolved(index);
                    progress = true;
                }
            }

            if !progress {
                break;
            }
        }

        for index in 0..self.equ_entries.len() {
            let target = self.equ_entries[index].symbol();
            if !self.symbol(target).is_defined() {
                let name = self.symbol(target).name().to_string();
                self.report(Error::EquCircular(name));
            }
        }
    }

    /// Phase P1: fold pending terms whose symbol is already defined and
    /// non-EQU. Removal shifts the pending list down in place; the same
    /// index is re-examined rather than advanced, so the shifted-in element
    /// is not skipped.
    fn fold_non_equ_pending(&mut self, index: usize) {
        let mut i = 0;
        loop {
            if i >= self.equ_entries[index].pending_symbols().len() {
                break;
            }

            let term_number = self.equ_entries[index].pending_symbols()[i];
            let term = self.symbol(term_number).clone();

            if term.is_defined() && !term.is_equ() {
                let sign = self.equ_entries[index].pending_sign(i);
                let target = self.equ_entries[index].symbol();
                let folded = self.symbol(target).value() + sign.apply(term.value());
                self.symbol_mut(target).set_value(folded);
                self.equ_entries[index].fold_term(i, term.section(), sign);
            } else {
                i += 1;
            }
        }
    }

    /// Phase P2: fold pending terms whose symbol is now defined, including
    /// EQU-on-EQU dependencies, where the class-table contribution is the
    /// dependency's own effective section (or no contribution at all if the
    /// dependency resolved to an absolute constant).
    fn fold_equ_pending(&mut self, index: usize) {
        let mut i = 0;
        loop {
            if i >= self.equ_entries[index].pending_symbols().len() {
                break;
            }

            let term_number = self.equ_entries[index].pending_symbols()[i];
            let term = self.symbol(term_number).clone();

            if !term.is_defined() {
                i += 1;
                continue;
            }

            let sign = self.equ_entries[index].pending_sign(i);
            let target = self.equ_entries[index].symbol();
            let folded = self.symbol(target).value() + sign.apply(term.value());
            self.symbol_mut(target).set_value(folded);

            if term.is_equ() {
                let term_equ_index = self.equ_index_by_symbol[&term_number];
                match self.equ_entries[term_equ_index].effective_section() {
                    Some(section) => self.equ_entries[index].fold_term(i, section, sign),
                    None => self.equ_entries[index].drop_term(i),
                }
            } else {
                self.equ_entries[index].fold_term(i, term.section(), sign);
            }
        }
    }

    fn finalize_if_resolved(&mut self, index: usize) {
        if !self.equ_entries[index].is_resolved() {
            return;
        }

        let target = self.equ_entries[index].symbol();

        if !self.equ_entries[index].is_valid() {
            let name = self.symbol(target).name().to_string();
            self.report(Error::EquInvalidExpression(name));
            return;
        }

        match self.equ_entries[index].effective_section() {
            Some(section) => {
                self.symbol_mut(target).set_section(section);
            }
            None => {
                self.symbol_mut(target).set_scope(Scope::Extern);
            }
        }

        self.symbol_mut(target).set_defined(true);
    }

    fn check_non_equ_undefined(&mut self) {
        let undefined: Vec<String> = self
            .symbols
            .iter()
            .filter(|symbol| {
                !symbol.is_defined() && !symbol.is_equ() && symbol.scope() != Scope::Extern
            })
            .map(|symbol| symbol.name().to_string())
            .collect();

        for name in undefined {
            self.report(Error::UndefinedSymbol(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equ_absolute_constant() {
        let mut engine = Engine::new();
        engine.capture_equ(
            "k",
            &[
                (asm_lexer::Sign::Plus, "5".into()),
                (asm_lexer::Sign::Plus, "3".into()),
                (asm_lexer::Sign::Minus, "2".into()),
            ],
        );

        engine.resolve_equ();

        let number = engine.symbols_by_name["k"];
        let symbol = engine.symbol(number);
        assert!(symbol.is_defined());
        assert_eq!(symbol.scope(), Scope::Extern);
        assert_eq!(symbol.value(), 6);
        assert!(engine.errors.is_empty());
    }

    #[test]
    fn equ_over_a_local_label() {
        let mut engine = Engine::new();
        let data = engine.define_section("data").unwrap();
        engine.define_label("a", data, 0);

        engine.capture_equ("b", &[(asm_lexer::Sign::Plus, "a".into()), (asm_lexer::Sign::Plus, "4".into())]);
        engine.resolve_equ();

        let number = engine.symbols_by_name["b"];
        let symbol = engine.symbol(number);
        assert!(symbol.is_defined());
        assert_eq!(symbol.section(), data);
        assert_eq!(symbol.value(), 4);
    }

    #[test]
    fn equ_circular_is_an_error() {
        let mut engine = Engine::new();
        engine.capture_equ("x", &[(asm_lexer::Sign::Plus, "y".into()), (asm_lexer::Sign::Plus, "1".into())]);
        engine.capture_equ("y", &[(asm_lexer::Sign::Plus, "x".into()), (asm_lexer::Sign::Plus, "1".into())]);

        engine.resolve_equ();

        assert!(engine.errors.iter().any(|error| matches!(error, Error::EquCircular(_))));
    }
}
