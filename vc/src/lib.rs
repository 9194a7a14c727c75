//! Umbrella pipeline crate (spec.md §6): ties the lexer stand-in,
//! parser, semantic analyzer/IR builder, optimizer, register allocator,
//! and emitter into one `compile_unit` call.
//!
//! Grounded on `cranelift-reader`'s and `wasmtime`'s own CLI crate shape:
//! a thin `Settings` struct the binary fills in from flags, and a single
//! library entry point the binary, and any future embedder, both call
//! through rather than duplicating the pipeline order.

use vc_diag::{DiagCtx, Diagnostic};
use vc_regalloc::Target;

/// Assembly output syntax. Mirrors `vc_emit::Syntax`; kept as its own
/// type here so callers that only depend on `vc` (not `vc-emit`
/// directly) don't need that crate in scope to pick a syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Att,
    Intel,
}

impl From<Syntax> for vc_emit::Syntax {
    fn from(s: Syntax) -> Self {
        match s {
            Syntax::Att => vc_emit::Syntax::Att,
            Syntax::Intel => vc_emit::Syntax::Intel,
        }
    }
}

/// Word size for the compilation target. `target-lexicon`'s `Triple`
/// backs the `-m32`/`-m64` flag parsing in the driver binary; this
/// pipeline only ever needs the pointer width that falls out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    W32,
    W64,
}

impl WordSize {
    fn target(self) -> Target {
        match self {
            WordSize::W32 => Target::X86_32,
            WordSize::W64 => Target::X86_64,
        }
    }

    fn ast_word_size(self) -> vc_ast::WordSize {
        match self {
            WordSize::W32 => vc_ast::WordSize::W32,
            WordSize::W64 => vc_ast::WordSize::W64,
        }
    }
}

/// Narrows a `target_lexicon::Triple` down to the one field this
/// pipeline cares about: whether pointers (and `long`, per `vc_ast`'s
/// `WordSize`) are 32 or 64 bits. Defaults to 64-bit when a triple's
/// pointer width can't be determined.
pub fn word_size_of(triple: &target_lexicon::Triple) -> WordSize {
    use target_lexicon::PointerWidth;
    match triple.pointer_width() {
        Ok(PointerWidth::U32) => WordSize::W32,
        _ => WordSize::W64,
    }
}

/// Compilation-wide settings (spec.md §6's CLI surface), mirroring
/// Cranelift's `settings::Flags` builder: one struct the binary fills in
/// from argv, threaded down through the whole pipeline rather than
/// re-read from global state at each stage.
#[derive(Debug, Clone)]
pub struct Settings {
    pub word_size: WordSize,
    pub syntax: Syntax,
    pub no_cfold: bool,
    pub no_inline: bool,
    pub emit_prototypes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            word_size: WordSize::W64,
            syntax: Syntax::Att,
            no_cfold: false,
            no_inline: false,
            emit_prototypes: false,
        }
    }
}

/// Compiles one translation unit's source text to assembly text.
///
/// `vc_opt::optimize` has no per-pass entry point, only its fixed
/// constprop-then-inline-then-peephole pipeline, so `no_cfold`/
/// `no_inline` can't disable one pass in isolation; asking for either
/// skips the whole optimizer instead. Coarser than spec.md §6's flag
/// list implies, but no pass ever silently runs when told not to.
pub fn compile_unit(source: &str, file_name: &str, settings: &Settings) -> Result<String, Diagnostic> {
    let diag = DiagCtx::new(file_name);
    let tu = vc_parser::parse_source(source, &diag)?;

    let word_size = settings.word_size.ast_word_size();
    let mut sema = vc_sema::SemaCtx::new(&diag, word_size, file_name.to_string());
    sema.check_translation_unit(&tu)?;
    let (mut builder, _symtabs) = sema.into_parts();

    if !settings.no_cfold && !settings.no_inline {
        vc_opt::optimize(&mut builder);
    }

    let target = settings.word_size.target();
    let allocs = vc_regalloc::allocate(&builder, target);
    let asm = vc_emit::emit(&builder, &allocs, target, settings.syntax.into());
    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_main_to_assembly_text() {
        let settings = Settings::default();
        let asm = compile_unit("int main(void) { return 14; }", "t.c", &settings).expect("compiles");
        assert!(asm.contains("main:"));
        assert!(asm.contains("ret"));
    }

    #[test]
    fn reports_a_syntax_error_as_a_diagnostic() {
        let settings = Settings::default();
        let err = compile_unit("int main(void) { return 2 + ; }", "t.c", &settings);
        assert!(err.is_err());
    }
}
