//! Recursive-descent parser: token stream → AST (spec.md §4.2, component D).
//!
//! Two primitives drive the whole grammar: [`cursor::Cursor::peek`] and a
//! family of `eat_*`/`expect_*` helpers built on it ("`match(kind)` advances
//! on success", spec.md §4.2). A routine that fails restores the position
//! it was entered with (`Cursor::rewind`), so the top-level dispatcher can
//! try the next alternative after a failed guess.

mod cursor;
mod decl;
mod expr;
mod stmt;

use cursor::Cursor;
use vc_ast::{Stmt, TopLevel, TranslationUnit};
use vc_diag::{DiagCtx, Diagnostic, DiagnosticKind, Location};
use vc_lex::{Keyword, Token, TokenKind};

pub struct Parser<'a> {
    cur: Cursor<'a>,
    diag: &'a DiagCtx,
    /// Names declared `typedef` so far, consulted by the declaration
    /// grammar to tell a type name from an ordinary identifier — the
    /// parser has no symbol table of its own (that's component B), so it
    /// tracks just enough to resolve this one grammar ambiguity.
    typedef_names: std::collections::HashSet<String>,
}

pub type PResult<T> = Result<T, Diagnostic>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], diag: &'a DiagCtx) -> Self {
        Parser {
            cur: Cursor::new(tokens),
            diag,
            typedef_names: std::collections::HashSet::new(),
        }
    }

    fn register_typedef(&mut self, name: &str) {
        self.typedef_names.insert(name.to_string());
    }

    fn is_typedef_name(&self, name: &str) -> bool {
        self.typedef_names.contains(name)
    }

    fn loc(&self) -> Location {
        self.cur.loc()
    }

    fn err<T>(&self, kind: DiagnosticKind, loc: Location, message: impl Into<String>) -> PResult<T> {
        Err(self.diag.make(kind, loc, message.into()))
    }

    fn syntax_err<T>(&self, message: impl Into<String>) -> PResult<T> {
        self.err(DiagnosticKind::Syntax, self.loc(), message)
    }

    fn expect_punct(&mut self, spelling: &str) -> PResult<()> {
        if self.cur.eat_punct(spelling) {
            Ok(())
        } else {
            self.syntax_err(format!(
                "expected '{}', found '{}'",
                spelling,
                self.cur.peek().lexeme
            ))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> PResult<()> {
        if self.cur.eat_keyword(kw) {
            Ok(())
        } else {
            self.syntax_err(format!("expected keyword, found '{}'", self.cur.peek().lexeme))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        if self.cur.peek().kind == TokenKind::Ident {
            let name = self.cur.advance().lexeme.clone();
            Ok(name)
        } else {
            self.syntax_err(format!(
                "expected identifier, found '{}'",
                self.cur.peek().lexeme
            ))
        }
    }

    /// Parse a whole translation unit: the top-level dispatcher of
    /// spec.md §4.2, looping until `Eof`.
    pub fn parse_translation_unit(&mut self) -> PResult<TranslationUnit> {
        let mut unit = TranslationUnit::default();
        while !self.cur.at_eof() {
            let item = self.parse_top_level()?;
            unit.items.push(item);
        }
        Ok(unit)
    }

    /// For each top-level entity: snapshot position, consume the specifier
    /// prefix, then dispatch on what follows (spec.md §4.2's "Top-level
    /// dispatcher").
    fn parse_top_level(&mut self) -> PResult<TopLevel> {
        if self.cur.peek().is_keyword(Keyword::StaticAssert) {
            let s = self.parse_static_assert()?;
            self.expect_punct(";")?;
            return Ok(TopLevel::Stmt(s));
        }

        let specifiers = decl::parse_specifiers(self)?;

        if specifiers.storage.is_typedef {
            let item = decl::parse_typedef_tail(self, &specifiers)?;
            self.expect_punct(";")?;
            return Ok(TopLevel::Stmt(item));
        }

        if specifiers.tag_only_decl {
            self.expect_punct(";")?;
            return Ok(TopLevel::Stmt(specifiers.into_tag_stmt()));
        }

        // Try a function (prototype or definition); on failure rewind and
        // fall back to a global variable declaration.
        let fn_start = self.cur.pos();
        match decl::try_parse_function(self, &specifiers) {
            Ok(func) => return Ok(TopLevel::Function(func)),
            Err(_) => self.cur.rewind(fn_start),
        }

        let var = decl::parse_global_var(self, &specifiers)?;
        self.expect_punct(";")?;
        Ok(TopLevel::GlobalVar(var))
    }

    fn parse_static_assert(&mut self) -> PResult<Stmt> {
        self.expect_keyword(Keyword::StaticAssert)?;
        self.expect_punct("(")?;
        let cond = expr::parse_expr(self)?;
        let message = if self.cur.eat_punct(",") {
            if self.cur.peek().kind == TokenKind::StringLit {
                Some(self.cur.advance().lexeme.clone())
            } else {
                return self.syntax_err("expected string literal message");
            }
        } else {
            None
        };
        self.expect_punct(")")?;
        Ok(Stmt::StaticAssert { cond, message })
    }
}

/// Convenience entry point: lex-then-parse an entire translation unit.
pub fn parse_source(src: &str, diag: &DiagCtx) -> PResult<TranslationUnit> {
    let tokens = vc_lex::tokenize(src).map_err(|e| {
        diag.make(e.kind, e.loc, e.message)
    })?;
    let mut parser = Parser::new(&tokens, diag);
    parser.parse_translation_unit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> TranslationUnit {
        let diag = DiagCtx::new("t.c");
        parse_source(src, &diag).unwrap_or_else(|e| panic!("{}", e))
    }

    #[test]
    fn parses_empty_function() {
        let unit = parse_ok("int main(void) { return 0; }");
        assert_eq!(unit.items.len(), 1);
        match &unit.items[0] {
            TopLevel::Function(f) => {
                assert_eq!(f.name, "main");
                assert!(f.is_definition());
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn parses_global_var_with_init() {
        let unit = parse_ok("int counter = 41 + 1;");
        assert_eq!(unit.items.len(), 1);
        match &unit.items[0] {
            TopLevel::GlobalVar(v) => assert_eq!(v.name, "counter"),
            _ => panic!("expected global var"),
        }
    }

    #[test]
    fn parses_prototype_then_definition() {
        let unit = parse_ok("int add(int a, int b); int add(int a, int b) { return a + b; }");
        assert_eq!(unit.items.len(), 2);
        match (&unit.items[0], &unit.items[1]) {
            (TopLevel::Function(proto), TopLevel::Function(def)) => {
                assert!(!proto.is_definition());
                assert!(def.is_definition());
            }
            _ => panic!("expected two functions"),
        }
    }
}
