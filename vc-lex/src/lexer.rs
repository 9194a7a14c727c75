//! A single-pass, allocation-light lexer (SPEC_FULL.md §3): it stands in
//! for the preprocessor+lexer pipeline spec.md §1 scopes out of the core
//! study, producing the `(kind, lexeme, line, column)` record stream
//! spec.md §6 specifies as the core's actual input.

use crate::token::{Keyword, Token, TokenKind};
use vc_diag::{DiagnosticKind, Location};

pub struct LexError {
    pub kind: DiagnosticKind,
    pub loc: Location,
    pub message: String,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.loc, self.message)
    }
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input, ending with a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        Ok(out)
    }

    fn loc(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c == b' ' || c == b'\t' || c == b'\r' || c == b'\n' => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while self.peek().is_some() && self.peek() != Some(b'\n') {
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.loc();
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(LexError {
                                    kind: DiagnosticKind::Syntax,
                                    loc: start,
                                    message: "unterminated block comment".into(),
                                })
                            }
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                Some(b'#') if self.column == 1 => {
                    return Err(LexError {
                        kind: DiagnosticKind::Syntax,
                        loc: self.loc(),
                        message: "preprocessor directives must be expanded upstream".into(),
                    });
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let loc = self.loc();
        let c = match self.peek() {
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    lexeme: String::new(),
                    loc,
                })
            }
            Some(c) => c,
        };

        if c == b'L' && matches!(self.peek_at(1), Some(b'"') | Some(b'\'')) {
            self.advance();
            return self.lex_quoted(loc, true);
        }
        if c == b'"' || c == b'\'' {
            return self.lex_quoted(loc, false);
        }
        if is_ident_start(c) {
            return Ok(self.lex_ident(loc));
        }
        if c.is_ascii_digit() {
            return self.lex_number(loc);
        }
        self.lex_punct(loc)
    }

    fn lex_ident(&mut self, loc: Location) -> Token {
        let start = self.pos;
        while self.peek().map(is_ident_continue).unwrap_or(false) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let kind = match Keyword::from_str(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        };
        Token {
            kind,
            lexeme: text,
            loc,
        }
    }

    fn lex_number(&mut self, loc: Location) -> Result<Token, LexError> {
        let start = self.pos;
        let mut is_float = false;
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }
        if self.peek() == Some(b'.') {
            is_float = true;
            self.advance();
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.advance();
            }
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }
        // integer/float suffixes: u, U, l, L (repeatable for `ll`), f, F
        while matches!(
            self.peek(),
            Some(b'u') | Some(b'U') | Some(b'l') | Some(b'L') | Some(b'f') | Some(b'F')
        ) {
            if matches!(self.peek(), Some(b'f') | Some(b'F')) {
                is_float = true;
            }
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        Ok(Token {
            kind: if is_float {
                TokenKind::FloatLit
            } else {
                TokenKind::IntLit
            },
            lexeme: text,
            loc,
        })
    }

    fn lex_quoted(&mut self, loc: Location, wide: bool) -> Result<Token, LexError> {
        let quote = self.advance().unwrap();
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        kind: DiagnosticKind::Syntax,
                        loc,
                        message: "unterminated literal".into(),
                    })
                }
                Some(b'\\') => {
                    self.advance();
                    self.advance();
                }
                Some(c) if c == quote => break,
                Some(_) => {
                    self.advance();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.advance(); // closing quote
        let kind = if quote == b'"' {
            TokenKind::StringLit
        } else {
            TokenKind::CharLit
        };
        let lexeme = if wide {
            format!("L{}", text)
        } else {
            text
        };
        Ok(Token { kind, lexeme, loc })
    }

    fn lex_punct(&mut self, loc: Location) -> Result<Token, LexError> {
        const THREE: &[&str] = &["<<=", ">>=", "..."];
        const TWO: &[&str] = &[
            "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
            "|=", "^=", "<<", ">>", "->",
        ];
        for spelling in THREE {
            if self.matches_ahead(spelling) {
                return Ok(self.consume_punct(loc, spelling));
            }
        }
        for spelling in TWO {
            if self.matches_ahead(spelling) {
                return Ok(self.consume_punct(loc, spelling));
            }
        }
        let c = self.advance().unwrap();
        if !is_single_punct(c) {
            return Err(LexError {
                kind: DiagnosticKind::Syntax,
                loc,
                message: format!("unexpected character {:?}", c as char),
            });
        }
        Ok(Token {
            kind: TokenKind::Punct,
            lexeme: (c as char).to_string(),
            loc,
        })
    }

    fn matches_ahead(&self, spelling: &str) -> bool {
        spelling
            .bytes()
            .enumerate()
            .all(|(i, b)| self.peek_at(i) == Some(b))
    }

    fn consume_punct(&mut self, loc: Location, spelling: &str) -> Token {
        for _ in 0..spelling.len() {
            self.advance();
        }
        Token {
            kind: TokenKind::Punct,
            lexeme: spelling.to_string(),
            loc,
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

fn is_single_punct(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')'
            | b'{'
            | b'}'
            | b'['
            | b']'
            | b';'
            | b','
            | b'.'
            | b'&'
            | b'*'
            | b'+'
            | b'-'
            | b'~'
            | b'!'
            | b'/'
            | b'%'
            | b'<'
            | b'>'
            | b'^'
            | b'|'
            | b'?'
            | b':'
            | b'='
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap_or_else(|e| panic!("{}", e.message))
    }

    #[test]
    fn tokenizes_main_return() {
        let toks = lex("int main(void){return 2+3*4;}");
        let lexemes: Vec<&str> = toks.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(
            lexemes,
            vec![
                "int", "main", "(", "void", ")", "{", "return", "2", "+", "3", "*", "4", ";", "}",
                ""
            ]
        );
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn strips_comments() {
        let toks = lex("int /* c */ x; // trailing\n");
        let lexemes: Vec<&str> = toks.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["int", "x", ";", ""]);
    }

    #[test]
    fn rejects_bare_directive() {
        let err = Lexer::new("#define X 1\nint x;").tokenize().unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
    }

    #[test]
    fn multi_char_operators_are_greedy() {
        let toks = lex("x <<= 1;");
        assert_eq!(toks[1].lexeme, "<<=");
    }
}
