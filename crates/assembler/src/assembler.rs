//! The driver: turns source text into a fully resolved [`asm_object::Object`]
//! by running every line through [`asm_lexer::classify_line`] and dispatching
//! to the [`Engine`](crate::engine::Engine)'s operations, then running the
//! two-phase `.equ` resolver and back-patcher.

use asm_errors::Error;
use asm_lexer::{parse_operand, Line, Shape};
use asm_object::Object;

use crate::configuration::Configuration;
use crate::engine::Engine;

/// An assembly run, built from a [`Configuration`].
pub struct Assembler {
    source: String,
    engine: Engine,
}

impl Assembler {
    pub(crate) fn with_configuration(configuration: Configuration) -> Self {
        Self { source: configuration.source().to_string(), engine: Engine::new() }
    }

    /// Run the whole pipeline: classify and emit every line, resolve every
    /// `.equ`, back-patch forward references, then hand back the resolved
    /// object — or every diagnosed error, if any were raised.
    pub fn assemble(mut self) -> Result<Object, Error> {
        for line in self.source.lines() {
            self.process_line(line);
        }

        self.engine.resolve_equ();
        self.engine.back_patch();

        if !self.engine.errors.is_empty() {
            return Err(Error::Diagnostics(self.engine.errors));
        }

        Ok(Object::new(self.engine.symbols, self.engine.sections))
    }

    fn process_line(&mut self, text: &str) {
        match asm_lexer::classify_line(text) {
            Ok(Some(line)) => self.dispatch(line),
            Ok(None) => {}
            Err(error) => self.engine.report(Error::InvalidOperand(error.0)),
        }
    }

    fn dispatch(&mut self, line: Line) {
        match line {
            Line::Label { name, rest } => {
                if let Some(section) = self.engine.current_section {
                    let offset = self.engine.section(section).map(|s| s.location_counter()).unwrap_or(0);
                    self.engine.define_label(&name, section, offset as i32);
                } else {
                    self.engine.report(Error::NotInSection(name.clone()));
                }

                if let Some(rest) = rest {
                    self.process_line(&rest);
                }
            }
            Line::Global { names } => {
                for name in names {
                    self.engine.declare(&name, false);
                }
            }
            Line::Extern { names } => {
                for name in names {
                    self.engine.declare(&name, true);
                }
            }
            Line::Section { name } => {
                self.engine.define_section(&name);
            }
            Line::Byte { items } => {
                if let Err(error) = self.engine.emit_memory_allocation(&items, 1) {
                    self.engine.report(error);
                }
            }
            Line::Word { items } => {
                if let Err(error) = self.engine.emit_memory_allocation(&items, 2) {
                    self.engine.report(error);
                }
            }
            Line::Skip { literal } => {
                let count = asm_lexer::parse_literal(&literal);
                if let Err(error) = self.engine.emit_skip(count) {
                    self.engine.report(error);
                }
            }
            Line::Equ { name, terms } => {
                self.engine.capture_equ(&name, &terms);
            }
            Line::Instruction { mnemonic, operands } => {
                self.dispatch_instruction(&mnemonic, &operands);
            }
        }
    }

    fn dispatch_instruction(&mut self, mnemonic: &str, operands: &[String]) {
        let Some((opcode, shape)) = asm_lexer::mnemonic::lookup(mnemonic) else {
            return;
        };

        let expected = match shape {
            Shape::NoOperand => 0,
            Shape::Branch | Shape::OneOperand => 1,
            Shape::TwoOperand => 2,
        };

        if operands.len() != expected {
            self.engine.report(Error::OperandCountMismatch(
                mnemonic.to_string(),
                expected,
                operands.len(),
            ));
            return;
        }

        let parsed: Result<Vec<_>, _> = operands.iter().map(|text| parse_operand(text)).collect();
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(error) => {
                self.engine.report(Error::InvalidOperand(error.0));
                return;
            }
        };

        let result = match shape {
            Shape::NoOperand => self.engine.emit_no_operand(opcode),
            Shape::Branch => self.engine.emit_branch(opcode, &parsed[0]),
            Shape::OneOperand => self.engine.emit_one_operand(opcode, mnemonic, &parsed[0]),
            Shape::TwoOperand => {
                self.engine.emit_two_operand(opcode, mnemonic, &parsed[0], &parsed[1])
            }
        };

        if let Err(error) = result {
            self.engine.report(error);
        }
    }
}
