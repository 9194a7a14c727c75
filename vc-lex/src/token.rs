use vc_diag::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Struct,
    Union,
    Enum,
    Typedef,
    Static,
    Extern,
    Register,
    Const,
    Volatile,
    Restrict,
    Inline,
    Noreturn,
    Alignas,
    Alignof,
    Sizeof,
    Offsetof,
    If,
    Else,
    While,
    Do,
    For,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,
    StaticAssert,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        use Keyword::*;
        Some(match s {
            "void" => Void,
            "_Bool" => Bool,
            "char" => Char,
            "short" => Short,
            "int" => Int,
            "long" => Long,
            "float" => Float,
            "double" => Double,
            "signed" => Signed,
            "unsigned" => Unsigned,
            "struct" => Struct,
            "union" => Union,
            "enum" => Enum,
            "typedef" => Typedef,
            "static" => Static,
            "extern" => Extern,
            "register" => Register,
            "const" => Const,
            "volatile" => Volatile,
            "restrict" => Restrict,
            "inline" => Inline,
            "_Noreturn" => Noreturn,
            "_Alignas" => Alignas,
            "_Alignof" => Alignof,
            "sizeof" => Sizeof,
            "offsetof" => Offsetof,
            "if" => If,
            "else" => Else,
            "while" => While,
            "do" => Do,
            "for" => For,
            "switch" => Switch,
            "case" => Case,
            "default" => Default,
            "break" => Break,
            "continue" => Continue,
            "return" => Return,
            "goto" => Goto,
            "_Static_assert" => StaticAssert,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Ident,
    IntLit,
    FloatLit,
    StringLit,
    CharLit,
    /// Any operator or punctuator; `lexeme` carries the exact spelling
    /// (`"+="`, `"->"`, `"["`, ...).
    Punct,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub loc: Location,
}

impl Token {
    pub fn is_punct(&self, spelling: &str) -> bool {
        self.kind == TokenKind::Punct && self.lexeme == spelling
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
