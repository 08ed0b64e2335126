//! Encoding instructions and memory-allocation directives into section byte
//! streams, per the encoding rules in the operand grammar.

use asm_errors::Error;
use asm_lexer::{parse_literal, AddrMode, Operand};
use asm_object::{ForwardReference, RelocationType, Scope};

use crate::engine::Engine;

/// What an operand descriptor byte is followed by.
enum Payload {
    /// No payload bytes (register direct/indirect).
    None,
    /// A literal value; `force_wide` pins the payload to 2 bytes even when
    /// the value would fit in 1 (used for `*literal` memory dereference).
    Literal { value: u32, force_wide: bool },
    /// A symbol reference, always resolved to a 2-byte payload.
    Symbol { name: String, pc_relative: bool },
}

fn classify_operand(operand: &Operand, is_branch: bool) -> (AddrMode, u8, Payload) {
    match operand {
        Operand::ImmediateLit(value) => {
            (AddrMode::Immed, 0, Payload::Literal { value: *value, force_wide: false })
        }
        Operand::ImmediateSym(name) => {
            (AddrMode::Immed, 0, Payload::Symbol { name: name.clone(), pc_relative: false })
        }
        Operand::MemLit { value, dereferenced } => {
            let mode = if is_branch && !dereferenced { AddrMode::Immed } else { AddrMode::Mem };
            (mode, 0, Payload::Literal { value: *value, force_wide: *dereferenced })
        }
        Operand::MemSym { name, dereferenced } => {
            // A branch's bare symbol target ("jmp end") is a relative jump:
            // the payload is the offset from the instruction, not `end`'s
            // absolute address. A dereferenced (`*end`) target reads the
            // absolute address out of memory at `end` instead, so it is not
            // PC-relative.
            let is_branch_direct = is_branch && !dereferenced;
            let mode = if is_branch_direct { AddrMode::Immed } else { AddrMode::Mem };
            (mode, 0, Payload::Symbol { name: name.clone(), pc_relative: is_branch_direct })
        }
        Operand::RegDir { register } => (AddrMode::RegDir, *register, Payload::None),
        Operand::RegInd { register } => (AddrMode::RegInd, *register, Payload::None),
        Operand::RegIndLitOff { offset, register } => {
            (AddrMode::RegIndOff, *register, Payload::Literal { value: *offset, force_wide: false })
        }
        Operand::RegIndSymOff { name, register, pc_relative } => (
            AddrMode::RegIndOff,
            *register,
            Payload::Symbol { name: name.clone(), pc_relative: *pc_relative },
        ),
    }
}

fn payload_len(payload: &Payload) -> usize {
    match payload {
        Payload::None => 0,
        Payload::Literal { value, force_wide } => {
            if *force_wide || *value > 0xFF {
                2
            } else {
                1
            }
        }
        Payload::Symbol { .. } => 2,
    }
}

fn describe_operand(operand: &Operand) -> String {
    match operand {
        Operand::ImmediateLit(value) => format!("${value}"),
        Operand::ImmediateSym(name) => format!("${name}"),
        Operand::MemLit { value, .. } => value.to_string(),
        Operand::MemSym { name, .. } => name.clone(),
        Operand::RegDir { register } => format!("%r{register}"),
        Operand::RegInd { register } => format!("(%r{register})"),
        Operand::RegIndLitOff { offset, register } => format!("{offset}(%r{register})"),
        Operand::RegIndSymOff { name, register, .. } => format!("{name}(%r{register})"),
    }
}

impl Engine {
    /// Encode a no-operand instruction: `halt`, `iret`, `ret`.
    pub fn emit_no_operand(&mut self, opcode: u8) -> Result<(), Error> {
        let section = self.require_current_section()?;
        self.section_mut(section).push_byte(opcode << 3);
        Ok(())
    }

    /// Encode a branch instruction (`int`, `call`, `jmp`, `jeq`, `jne`,
    /// `jgt`) — one operand, size rule shared with one-operand instructions.
    pub fn emit_branch(&mut self, opcode: u8, operand: &Operand) -> Result<(), Error> {
        self.emit_single_operand(opcode, operand, true, false)
    }

    /// Encode a one-operand data instruction: `push`, `pop`. Immediate
    /// addressing is forbidden for `pop`.
    pub fn emit_one_operand(
        &mut self,
        opcode: u8,
        mnemonic: &str,
        operand: &Operand,
    ) -> Result<(), Error> {
        self.emit_single_operand(opcode, operand, false, mnemonic == "pop")
    }

    fn emit_single_operand(
        &mut self,
        opcode: u8,
        operand: &Operand,
        is_branch: bool,
        forbid_immediate: bool,
    ) -> Result<(), Error> {
        let section = self.require_current_section()?;
        let (addr_mode, register, payload) = classify_operand(operand, is_branch);

        if forbid_immediate && addr_mode == AddrMode::Immed {
            return Err(Error::BadImmediateDestination(describe_operand(operand)));
        }

        let size_bit = if payload_len(&payload) == 2 { 1 } else { 0 };
        self.section_mut(section).push_byte((opcode << 3) | size_bit);
        self.emit_operand(section, addr_mode, register, payload)?;

        Ok(())
    }

    /// Encode a two-operand data instruction. `size_bit` is unconditionally
    /// 1; a literal payload ≤ 0xFF is still only 1 byte, preserving the
    /// inherited size mismatch the operand grammar documents.
    pub fn emit_two_operand(
        &mut self,
        opcode: u8,
        mnemonic: &str,
        source: &Operand,
        destination: &Operand,
    ) -> Result<(), Error> {
        let section = self.require_current_section()?;

        let (source_mode, source_register, source_payload) = classify_operand(source, false);
        let (dest_mode, dest_register, dest_payload) = classify_operand(destination, false);

        if mnemonic == "xchg" {
            if source_mode == AddrMode::Immed {
                return Err(Error::BadImmediateDestination(describe_operand(source)));
            }
            if dest_mode == AddrMode::Immed {
                return Err(Error::BadImmediateDestination(describe_operand(destination)));
            }
        } else if dest_mode == AddrMode::Immed {
            return Err(Error::BadImmediateDestination(describe_operand(destination)));
        }

        self.section_mut(section).push_byte((opcode << 3) | 1);
        self.emit_operand(section, source_mode, source_register, source_payload)?;
        self.emit_operand(section, dest_mode, dest_register, dest_payload)?;

        Ok(())
    }

    fn emit_operand(
        &mut self,
        section: u32,
        addr_mode: AddrMode,
        register: u8,
        payload: Payload,
    ) -> Result<(), Error> {
        let descriptor = (addr_mode.as_u8() << 5) | (register << 1);
        self.section_mut(section).push_byte(descriptor);

        match payload {
            Payload::None => {}
            Payload::Literal { value, force_wide } => {
                if force_wide || value > 0xFF {
                    self.section_mut(section).push_word(value as u16);
                } else {
                    self.section_mut(section).push_byte(value as u8);
                }
            }
            Payload::Symbol { name, pc_relative } => {
                self.emit_symbol_operand(section, &name, pc_relative);
            }
        }

        Ok(())
    }

    /// Symbol operand resolution at emission (see the encoding rules):
    /// look up (creating on demand), then write the payload and forward
    /// reference or relocation appropriate to the symbol's current state.
    fn emit_symbol_operand(&mut self, section: u32, name: &str, pc_relative: bool) {
        let number = self.lookup_or_reference(name, None);
        let patch_offset = self.section_mut(section).location_counter();
        self.section_mut(section).push_word(0);

        let symbol = self.symbol(number).clone();

        if !symbol.is_defined() {
            if pc_relative {
                // Preload `-2`, same as the already-defined/different-section
                // case below: the forward-ref patch below adds the symbol's
                // value, leaving `value - 2`, and a `PcRelative` relocation
                // survives the patch. `back_patch::rewrite_relocations` then
                // decides same-section-or-not once the symbol's final
                // section is known: folded to `value - offset - 2` and the
                // relocation dropped if it lands in this same section,
                // rewritten to the symbol's effective section otherwise.
                self.section_mut(section).write_word(patch_offset, (-2i32) as u16);
                self.section_mut(section).push_relocation(asm_object::Relocation {
                    offset: patch_offset,
                    kind: RelocationType::PcRelative,
                    symbol: number,
                });
            } else {
                self.section_mut(section).push_relocation(asm_object::Relocation {
                    offset: patch_offset,
                    kind: RelocationType::Absolute,
                    symbol: number,
                });
            }
            self.symbol_mut(number).add_forward_ref(ForwardReference::with_sign(
                patch_offset,
                section,
                asm_object::Sign::Plus,
            ));
            return;
        }

        if symbol.scope() == Scope::Local {
            if !pc_relative {
                self.section_mut(section).write_word(patch_offset, symbol.value() as u16);
                self.section_mut(section).push_relocation(asm_object::Relocation {
                    offset: patch_offset,
                    kind: RelocationType::Absolute,
                    symbol: number,
                });
            } else if symbol.section() == section {
                let folded = symbol.value() - (patch_offset as i32) - 2;
                self.section_mut(section).write_word(patch_offset, folded as u16);
            } else {
                let payload = -2i32 + symbol.value();
                self.section_mut(section).write_word(patch_offset, payload as u16);
                self.section_mut(section).push_relocation(asm_object::Relocation {
                    offset: patch_offset,
                    kind: RelocationType::PcRelative,
                    symbol: number,
                });
            }
        } else if !pc_relative {
            self.section_mut(section).write_word(patch_offset, 0);
            self.section_mut(section).push_relocation(asm_object::Relocation {
                offset: patch_offset,
                kind: RelocationType::Absolute,
                symbol: number,
            });
        } else {
            self.section_mut(section).write_word(patch_offset, (-2i32) as u16);
            self.section_mut(section).push_relocation(asm_object::Relocation {
                offset: patch_offset,
                kind: RelocationType::PcRelative,
                symbol: number,
            });
        }
    }

    /// Encode a `.byte` (`width = 1`) or `.word` (`width = 2`) directive.
    pub fn emit_memory_allocation(&mut self, items: &[String], width: usize) -> Result<(), Error> {
        let section = self.require_current_section()?;

        for item in items {
            if is_literal(item) {
                let value = parse_literal(item);
                if width == 1 {
                    self.section_mut(section).push_byte(value as u8);
                } else {
                    self.section_mut(section).push_word(value as u16);
                }
                continue;
            }

            if let Some(&number) = self.symbols_by_name.get(item.as_str()) {
                if self.symbol(number).is_section() {
                    return Err(Error::SectionNameInData(item.clone()));
                }
            }

            if width == 1 {
                let number = self.lookup_or_reference(item, None);
                let patch_offset = self.section_mut(section).location_counter();
                self.section_mut(section).push_byte(0);
                self.resolve_byte_term(section, number, patch_offset);
            } else {
                self.emit_symbol_operand(section, item, false);
            }
        }

        Ok(())
    }

    fn resolve_byte_term(&mut self, section: u32, number: u32, patch_offset: usize) {
        let symbol = self.symbol(number).clone();
        if symbol.is_defined() {
            self.section_mut(section).write_byte(patch_offset, symbol.value() as u8);
        } else {
            self.symbol_mut(number).add_forward_ref(ForwardReference::with_sign(
                patch_offset,
                section,
                asm_object::Sign::Plus,
            ));
        }
        self.section_mut(section).push_relocation(asm_object::Relocation {
            offset: patch_offset,
            kind: RelocationType::Absolute,
            symbol: number,
        });
    }

    /// Encode a `.skip n` directive: `n` zero bytes, no-op for `n == 0`.
    pub fn emit_skip(&mut self, count: u32) -> Result<(), Error> {
        let section = self.require_current_section()?;
        for _ in 0..count {
            self.section_mut(section).push_byte(0);
        }
        Ok(())
    }

    fn require_current_section(&mut self) -> Result<u32, Error> {
        self.current_section.ok_or_else(|| Error::NotInSection("<instruction>".to_string()))
    }
}

fn is_literal(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_operand_is_one_byte_at_255_and_two_at_256() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();

        engine.emit_one_operand(0, "push", &Operand::MemLit { value: 255, dereferenced: false }).unwrap();
        let after_255 = engine.section(text).unwrap().bytes().len();
        assert_eq!(after_255, 1 + 1 + 1);

        engine.emit_one_operand(0, "push", &Operand::MemLit { value: 256, dereferenced: false }).unwrap();
        let after_256 = engine.section(text).unwrap().bytes().len();
        assert_eq!(after_256 - after_255, 1 + 1 + 2);
    }

    #[test]
    fn dereferenced_literal_is_forced_wide_even_under_256() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();

        engine.emit_one_operand(0, "push", &Operand::MemLit { value: 5, dereferenced: true }).unwrap();

        assert_eq!(engine.section(text).unwrap().bytes().len(), 1 + 1 + 2);
    }

    #[test]
    fn pop_rejects_an_immediate_operand() {
        let mut engine = Engine::new();
        engine.define_section("text").unwrap();

        let result = engine.emit_one_operand(0, "pop", &Operand::ImmediateLit(1));

        assert!(matches!(result, Err(Error::BadImmediateDestination(_))));
    }

    #[test]
    fn forward_branch_to_a_same_section_label_folds_with_no_relocation() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();

        engine.emit_branch(0, &Operand::MemSym { name: "target".into(), dereferenced: false }).unwrap();
        let number = engine.symbols_by_name["target"];
        engine.define_label("target", text, 10);
        engine.resolve_equ();
        engine.back_patch();

        assert!(engine.section(text).unwrap().relocations().is_empty());
        // Patch offset is 2 (past the one-byte opcode and one-byte operand
        // descriptor); PC-relative target is `value - offset - 2`.
        assert_eq!(engine.section(text).unwrap().read_word(2), (10i32 - 2 - 2) as u16);
        assert!(engine.symbol(number).forward_refs().is_empty());
    }

    #[test]
    fn forward_branch_to_a_different_section_label_keeps_a_pc_relative_relocation() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();
        let data = engine.define_section("data").unwrap();

        engine.emit_branch(0, &Operand::MemSym { name: "target".into(), dereferenced: false }).unwrap();
        engine.define_label("target", data, 10);
        engine.resolve_equ();
        engine.back_patch();

        let relocations = engine.section(text).unwrap().relocations();
        assert_eq!(relocations.len(), 1);
        assert_eq!(relocations[0].kind, RelocationType::PcRelative);
        assert_eq!(relocations[0].symbol, data);
        // Payload mirrors the already-defined-cross-section case: `value - 2`,
        // left for the linker to combine with the section's final placement.
        assert_eq!(engine.section(text).unwrap().read_word(2), (10i32 - 2) as u16);
    }

    #[test]
    fn word_directive_on_an_undefined_symbol_leaves_an_absolute_relocation() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();

        engine.emit_memory_allocation(&["label".to_string()], 2).unwrap();

        let relocations = engine.section(text).unwrap().relocations();
        assert_eq!(relocations.len(), 1);
        assert_eq!(relocations[0].kind, RelocationType::Absolute);

        engine.define_label("label", text, 42);
        engine.resolve_equ();
        engine.back_patch();

        assert_eq!(engine.section(text).unwrap().read_word(0), 42);
    }

    #[test]
    fn skip_emits_n_zero_bytes() {
        let mut engine = Engine::new();
        let text = engine.define_section("text").unwrap();

        engine.emit_skip(3).unwrap();

        assert_eq!(engine.section(text).unwrap().bytes(), &[0, 0, 0]);
    }
}
