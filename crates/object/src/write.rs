//! Renders an [`Object`] to the textual object dump described in the
//! external interfaces of this assembler: a symbol table, then, for each
//! emitted section, a byte dump and (if non-empty) a relocation table.

use std::io::{self, Write as IoWrite};

use crate::{object::Object, symbol::Scope};

fn scope_name(scope: Scope) -> &'static str {
    match scope {
        Scope::Local => "LOCAL",
        Scope::Global => "GLOBAL",
        Scope::Extern => "EXTERN",
    }
}

/// Write the textual dump of `object` to `writer`.
pub fn write_object<W>(writer: &mut W, object: &Object) -> io::Result<()>
where
    W: IoWrite,
{
    writeln!(writer, "Symbol Table:")?;
    writeln!(writer, "Symbol Number\tSymbol Name\tSection Number\tSymbol Value\tSymbol Scope")?;

    for symbol in object.symbols() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\n",
            symbol.number(),
            symbol.name(),
            symbol.section(),
            symbol.value(),
            scope_name(symbol.scope()),
        )?;
    }

    for (&section_number, section) in object.sections() {
        let section_name = object.symbol(section_number).name();

        writeln!(writer, "{section_name}:")?;

        for (offset, byte) in section.bytes().iter().enumerate() {
            writeln!(writer, "{offset} : {byte:02X}")?;
        }

        writeln!(writer)?;

        if !section.relocations().is_empty() {
            writeln!(writer, "{section_name}'s Relocation Data:")?;
            writeln!(writer, "Offset\tType\tSymbol Number")?;

            for relocation in section.relocations() {
                writeln!(
                    writer,
                    "{:X}\t{}\t{}",
                    relocation.offset,
                    relocation.kind.as_str(),
                    relocation.symbol,
                )?;
            }

            writeln!(writer)?;
        }
    }

    Ok(())
}

/// Render `object`'s textual dump into a freshly allocated `String`.
pub fn object_to_string(object: &Object) -> String {
    let mut buffer = Vec::new();
    write_object(&mut buffer, object).expect("writing to a `Vec<u8>` never fails");
    String::from_utf8(buffer).expect("the dump is always valid UTF-8")
}
