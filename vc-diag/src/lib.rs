//! Diagnostic context: line/column-anchored error capture and printing.
//!
//! Mirrors the role `cranelift-reader`'s `Location`/`ParseError` pair and
//! `cranelift-codegen::print_errors` play for Cranelift, generalized to the
//! full taxonomy of error kinds spec.md §7 lists for `vc`.

use failure_derive::Fail;
use std::cell::RefCell;
use std::fmt;

/// A source position. Line and column are both 1-based; a `Location`
/// produced for a synthesized node (no source text) uses `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }

    pub fn synthetic() -> Self {
        Location { line: 0, column: 0 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line == 0 {
            write!(f, "<generated>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// The closed set of error kinds from spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Fail)]
pub enum DiagnosticKind {
    #[fail(display = "out of memory")]
    OutOfMemory,
    #[fail(display = "syntax error")]
    Syntax,
    #[fail(display = "type error")]
    Type,
    #[fail(display = "name resolution error")]
    NameResolution,
    #[fail(display = "constant expression error")]
    ConstantExpression,
    #[fail(display = "semantic error")]
    Semantic,
    #[fail(display = "internal error")]
    Internal,
}

/// One fully-formed diagnostic: kind, message, and the `(file, function,
/// line, column)` tuple spec.md §7 requires every failure to carry.
#[derive(Debug, Clone, Fail)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    pub function: String,
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.function.is_empty() {
            write!(
                f,
                "{}:{}: {}: {}",
                self.file, self.location, self.kind, self.message
            )
        } else {
            write!(
                f,
                "{}:{} (in {}): {}: {}",
                self.file, self.location, self.function, self.kind, self.message
            )
        }
    }
}

/// Create an `Err(Diagnostic)` from the current context plus a kind and
/// `format!`-style message, the way `cranelift-reader`'s `err!` macro
/// builds a `ParseError` from a `Location` plus message.
#[macro_export]
macro_rules! diag {
    ($ctx:expr, $kind:expr, $loc:expr, $msg:expr) => {
        Err($ctx.make(($kind), ($loc), $msg.to_string()))
    };
    ($ctx:expr, $kind:expr, $loc:expr, $fmt:expr, $( $arg:expr ),+ ) => {
        Err($ctx.make(($kind), ($loc), format!($fmt, $( $arg ),+)))
    };
}

/// Process-wide diagnostic context (spec.md §5): holds the current file
/// and function name for the next diagnostic, and accumulates every
/// diagnostic reported during a run so the driver can compute an exit
/// code without inspecting stderr.
///
/// `vc` compiles one translation unit per process invocation, so "process-
/// wide" and "per-compilation" coincide; a library embedder that wants to
/// compile multiple units in one process should construct a fresh
/// `DiagCtx` per unit.
pub struct DiagCtx {
    file: RefCell<String>,
    function: RefCell<String>,
    reported: RefCell<Vec<Diagnostic>>,
}

impl DiagCtx {
    pub fn new(file: impl Into<String>) -> Self {
        DiagCtx {
            file: RefCell::new(file.into()),
            function: RefCell::new(String::new()),
            reported: RefCell::new(Vec::new()),
        }
    }

    pub fn set_file(&self, file: impl Into<String>) {
        *self.file.borrow_mut() = file.into();
    }

    pub fn set_function(&self, function: impl Into<String>) {
        *self.function.borrow_mut() = function.into();
    }

    pub fn clear_function(&self) {
        self.function.borrow_mut().clear();
    }

    /// Build (but do not report) a `Diagnostic` anchored at the current
    /// file/function and the given location.
    pub fn make(&self, kind: DiagnosticKind, loc: Location, message: String) -> Diagnostic {
        Diagnostic {
            kind,
            file: self.file.borrow().clone(),
            function: self.function.borrow().clone(),
            location: loc,
            message,
        }
    }

    /// Report a diagnostic: print it to stderr exactly once and record it.
    /// No diagnostic is ever silently swallowed (spec.md §7's invariant);
    /// every call site that decides to abandon a translation unit must
    /// still have called this first.
    pub fn report(&self, d: Diagnostic) {
        log::error!("{}", d);
        eprintln!("vc: {}", d);
        self.reported.borrow_mut().push(d);
    }

    /// Report a diagnostic and return it, for use at a call site that
    /// both wants to bubble the failure up via `?` and guarantee the
    /// message reaches the user immediately.
    pub fn report_and_return<T>(&self, d: Diagnostic) -> Result<T, Diagnostic> {
        self.report(d.clone());
        Err(d)
    }

    pub fn had_errors(&self) -> bool {
        !self.reported.borrow().is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.reported.borrow().len()
    }

    /// Out-of-memory anywhere is fatal (spec.md §7): print and terminate
    /// the process immediately rather than unwind, since there is no
    /// guarantee enough memory remains to unwind cleanly.
    pub fn fatal_oom(&self, where_: &str) -> ! {
        eprintln!(
            "vc: {}: out of memory: {}",
            self.file.borrow(),
            where_
        );
        std::process::exit(101);
    }

    /// Exit code for the process: 0 if nothing was reported, 1 otherwise
    /// (spec.md §6).
    pub fn exit_code(&self) -> i32 {
        if self.had_errors() {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_function() {
        let ctx = DiagCtx::new("a.c");
        ctx.set_function("f");
        let d = ctx.make(DiagnosticKind::Type, Location::new(3, 5), "bad".into());
        assert_eq!(format!("{}", d), "a.c:3:5 (in f): type error: bad");
    }

    #[test]
    fn formats_without_function() {
        let ctx = DiagCtx::new("a.c");
        let d = ctx.make(DiagnosticKind::Syntax, Location::new(1, 1), "oops".into());
        assert_eq!(format!("{}", d), "a.c:1:1: syntax error: oops");
    }

    #[test]
    fn tracks_error_count_and_exit_code() {
        let ctx = DiagCtx::new("a.c");
        assert_eq!(ctx.exit_code(), 0);
        ctx.report(ctx.make(DiagnosticKind::Semantic, Location::synthetic(), "x".into()));
        assert_eq!(ctx.error_count(), 1);
        assert_eq!(ctx.exit_code(), 1);
    }
}
