//! Configuration carried into an [`Assembler`](crate::assembler::Assembler).

/// Configuration for one assembly run: the source text to assemble, plus
/// knobs reserved for future CLI flags.
#[derive(Debug, Clone)]
pub struct Configuration {
    source: String,
}

impl Configuration {
    /// Configure an assembly of `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    /// Build an [`Assembler`](crate::assembler::Assembler) from this
    /// configuration.
    pub fn assembler(self) -> crate::assembler::Assembler {
        crate::assembler::Assembler::with_configuration(self)
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }
}
