//! Positionally indexed token cursor (spec.md §4.2: `tokens[], count, pos`
//! plus `peek`/`match`), in the style of `cranelift-codegen`'s `Cursor`
//! over an instruction list, generalized here to a flat token vector with
//! save/restore instead of list-position variants.

use vc_diag::Location;
use vc_lex::Token;

pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Cursor { tokens, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rewind(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream always ends in Eof"))
    }

    pub fn peek_at(&self, ahead: usize) -> &Token {
        self.tokens
            .get(self.pos + ahead)
            .unwrap_or_else(|| self.tokens.last().expect("token stream always ends in Eof"))
    }

    pub fn loc(&self) -> Location {
        self.peek().loc
    }

    pub fn advance(&mut self) -> &Token {
        let tok = self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("token stream always ends in Eof")
        });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub fn at_eof(&self) -> bool {
        self.peek().is_eof()
    }

    /// Advance and return `true` if the current token is the given
    /// punctuator spelling.
    pub fn eat_punct(&mut self, spelling: &str) -> bool {
        if self.peek().is_punct(spelling) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_keyword(&mut self, kw: vc_lex::Keyword) -> bool {
        if self.peek().is_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }
}
