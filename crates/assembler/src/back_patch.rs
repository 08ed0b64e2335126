//! Patching forward references and rewriting relocations once a symbol's
//! final value, section, and scope are known.
//!
//! Runs once, after [`Engine::resolve_equ`](crate::engine::Engine) has
//! settled every symbol's value, section, and scope (labels directly during
//! the pass, `.equ` symbols through its own two-phase fixpoint).

use asm_object::{RelocationType, Scope};

use crate::engine::Engine;

impl Engine {
    /// Patch every defined symbol's outstanding forward references, and
    /// rewrite or drop the relocations that name it, then clear its
    /// forward-ref list so a later pass does not repeat the patch.
    pub fn back_patch(&mut self) {
        let numbers: Vec<u32> = self.symbols.iter().map(|symbol| symbol.number()).collect();

        for number in numbers {
            if !self.symbol(number).is_defined() {
                continue;
            }

            self.patch_forward_refs(number);
            self.rewrite_relocations(number);
        }
    }

    fn patch_forward_refs(&mut self, number: u32) {
        let symbol = self.symbol(number).clone();
        let value = symbol.value();

        for forward_ref in symbol.forward_refs() {
            let existing = self.section(forward_ref.section).map(|section| {
                section.read_word(forward_ref.patch_offset)
            });
            let Some(existing) = existing else { continue };

            let patched = existing as i32 + forward_ref.sign.apply(value);
            self.section_mut(forward_ref.section)
                .write_word(forward_ref.patch_offset, patched as u16);
        }

        self.symbol_mut(number).clear_forward_refs();
    }

    /// Rewrite relocations that name `number` now that it is resolved:
    ///
    /// - ABSOLUTE naming a LOCAL symbol is rewritten to name its effective
    ///   section, or dropped if the symbol is absolute (no section).
    /// - PC_RELATIVE naming a LOCAL symbol is dropped if it resolves
    ///   intra-section (the payload was already folded to a constant offset
    ///   by the emitter), otherwise rewritten to name its effective section.
    /// - GLOBAL/EXTERN symbols keep their relocations untouched; the linker
    ///   resolves them.
    fn rewrite_relocations(&mut self, number: u32) {
        let symbol = self.symbol(number).clone();
        if symbol.scope() != Scope::Local {
            return;
        }

        let effective_section = if symbol.is_section() { Some(symbol.number()) } else {
            if symbol.section() == asm_object::UNDEFINED_SECTION { None } else { Some(symbol.section()) }
        };

        let section_numbers: Vec<u32> = self.sections.keys().copied().collect();

        for section_number in section_numbers {
            let relocation_offset_kind: Vec<(usize, RelocationType)> = self
                .section(section_number)
                .map(|section| {
                    section
                        .relocations()
                        .iter()
                        .enumerate()
                        .filter(|(_, relocation)| relocation.symbol == number)
                        .map(|(index, relocation)| (index, relocation.kind))
                        .collect()
                })
                .unwrap_or_default();

            if relocation_offset_kind.is_empty() {
                continue;
            }

            let mut to_drop = Vec::new();

            for (index, kind) in relocation_offset_kind {
                match kind {
                    RelocationType::Absolute => match effective_section {
                        Some(effective) => {
                            self.section_mut(section_number).relocations_mut()[index].symbol = effective;
                        }
                        None => to_drop.push(index),
                    },
                    RelocationType::PcRelative => {
                        let relocation = self.section_mut(section_number).relocations_mut()[index];
                        if Some(section_number) == effective_section {
                            let offset = relocation.offset;
                            let existing = self.section(section_number).unwrap().read_word(offset) as i32;
                            let folded = existing - offset as i32;
                            self.section_mut(section_number).write_word(offset, folded as u16);
                            to_drop.push(index);
                        } else if let Some(effective) = effective_section {
                            self.section_mut(section_number).relocations_mut()[index].symbol = effective;
                        } else {
                            to_drop.push(index);
                        }
                    }
                }
            }

            to_drop.sort_unstable_by(|a, b| b.cmp(a));
            for index in to_drop {
                self.section_mut(section_number).relocations_mut().remove(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_patch_fills_in_a_forward_reference() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();

        engine.lookup_or_reference("target", None);
        let number = engine.symbols_by_name["target"];
        engine
            .symbol_mut(number)
            .add_forward_ref(asm_object::ForwardReference::new(0, text));
        engine.section_mut(text).push_word(0);

        engine.define_label("target", text, 0x10);
        engine.back_patch();

        assert_eq!(engine.section(text).unwrap().read_word(0), 0x10);
        assert!(engine.symbol(number).forward_refs().is_empty());
    }

    #[test]
    fn absolute_relocation_on_a_local_symbol_is_rewritten_to_its_section() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();

        engine.define_label("target", text, 4);
        let number = engine.symbols_by_name["target"];
        engine.section_mut(text).push_word(0);
        engine.section_mut(text).push_relocation(asm_object::Relocation {
            offset: 0,
            kind: RelocationType::Absolute,
            symbol: number,
        });

        engine.back_patch();

        assert_eq!(engine.section(text).unwrap().relocations()[0].symbol, text);
    }
}
