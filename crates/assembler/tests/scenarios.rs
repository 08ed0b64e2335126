//! End-to-end scenarios: full source text through [`asm_assembler::Configuration`]
//! to a resolved [`asm_object::Object`].

use asm_assembler::Configuration;
use asm_object::{RelocationType, Scope};

fn assemble(source: &str) -> asm_object::Object {
    Configuration::new(source).assembler().assemble().expect("assembly should succeed")
}

#[test]
fn s1_forward_reference_same_section() {
    let object = assemble(
        "\
.section text:
start:  jmp end
end:    halt
",
    );

    let text = object.symbols().iter().find(|s| s.name() == "text").unwrap().number();
    let section = object.sections().get(&text).unwrap();

    // Branch symbol operands always carry a 2-byte payload, size_bit=1. A
    // bare branch target is PC-relative, so a same-section forward
    // reference folds to a constant and leaves no relocation behind.
    assert_eq!(section.bytes().len(), 5);
    assert_eq!(section.bytes()[0], 0x29);
    assert_eq!(section.bytes()[1], 0x00);
    assert_eq!(section.read_word(2), 0);
    assert_eq!(section.bytes()[4], 0x00); // halt

    assert!(section.relocations().is_empty());
}

#[test]
fn s2_extern_symbol() {
    let object = assemble(
        "\
.extern ext
.section text:
        mov ext, %r0
",
    );

    let text = object.symbols().iter().find(|s| s.name() == "text").unwrap().number();
    let section = object.sections().get(&text).unwrap();
    let ext = object.symbols().iter().find(|s| s.name() == "ext").unwrap().number();

    let relocation = section.relocations().iter().find(|r| r.symbol == ext).unwrap();
    assert_eq!(relocation.offset, 2);
    assert_eq!(relocation.kind, RelocationType::Absolute);
}

#[test]
fn s3_equ_absolute() {
    let object = assemble(".equ K, 5 + 3 - 2\n");

    let k = object.symbols().iter().find(|s| s.name() == "K").unwrap();
    assert!(k.is_defined());
    assert_eq!(k.scope(), Scope::Extern);
    assert_eq!(k.value(), 6);
}

#[test]
fn s4_equ_over_local() {
    let object = assemble(
        "\
.section data:
a:  .word 0
.equ b, a + 4
",
    );

    let data = object.symbols().iter().find(|s| s.name() == "data").unwrap().number();
    let b = object.symbols().iter().find(|s| s.name() == "b").unwrap();

    assert!(b.is_defined());
    assert_eq!(b.section(), data);
    assert_eq!(b.value(), 4);
}

#[test]
fn s5_equ_circular() {
    let result = Configuration::new(".equ x, y + 1\n.equ y, x + 1\n").assembler().assemble();

    let error = result.expect_err("a circular .equ chain must fail assembly");
    let message = error.to_string();
    assert!(message.contains("error(s) were reported"));
}

#[test]
fn s6_pc_relative_fold() {
    let object = assemble(
        "\
.section text:
        call fn
fn:     halt
",
    );

    let text = object.symbols().iter().find(|s| s.name() == "text").unwrap().number();
    let section = object.sections().get(&text).unwrap();
    let fn_symbol = object.symbols().iter().find(|s| s.name() == "fn").unwrap();

    assert!(!section.relocations().iter().any(|r| r.symbol == fn_symbol.number()));
}
