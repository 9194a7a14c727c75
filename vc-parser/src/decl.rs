//! Declaration grammar (spec.md §4.2): a specifier prefix, a base type, a
//! declarator (`*` repeatable, identifier, `[size]`/`[]`, or `(params)` for
//! function pointers), and an optional initializer.

use crate::expr::{parse_expr, parse_init_list};
use crate::stmt::parse_block;
use crate::{PResult, Parser};
use vc_ast::{
    EnumVariant, FieldDecl, Function, Initializer, Param, Qualifiers, Stmt, StorageClass, Type,
    TypeKind, VarDecl,
};
use vc_lex::{Keyword, TokenKind};

pub struct Specifiers {
    pub storage: StorageClass,
    pub qualifiers: Qualifiers,
    pub base_ty: Type,
    pub alignas: Option<vc_ast::Expr>,
    /// `struct Foo { ... };` with no declarator following: the tag
    /// declaration is itself the top-level item.
    pub tag_only_decl: bool,
    /// `true` when `base_ty` is an `enum` (so `into_tag_stmt` knows to emit
    /// `EnumDecl` rather than `StructDecl` even for an anonymous enum,
    /// where `base_ty.tag` alone can't distinguish the two).
    pub is_enum: bool,
}

impl Specifiers {
    pub fn into_tag_stmt(self) -> Stmt {
        tag_type_to_stmt(self.base_ty, self.is_enum)
    }
}

fn tag_type_to_stmt(ty: Type, is_enum: bool) -> Stmt {
    match ty.kind {
        TypeKind::Union => Stmt::UnionDecl { tag: ty.tag, fields: ty.fields },
        TypeKind::Int if is_enum => Stmt::EnumDecl { tag: ty.tag, variants: ty.enum_variants },
        _ => Stmt::StructDecl { tag: ty.tag, fields: ty.fields },
    }
}

/// `true` if the current token could begin a type specifier: a basic-type
/// keyword, `struct`/`union`/`enum`, a qualifier/storage keyword, or an
/// identifier previously registered as a `typedef` name.
pub fn is_type_start(p: &Parser) -> bool {
    let tok = p.cur.peek();
    if let TokenKind::Keyword(kw) = tok.kind {
        return matches!(
            kw,
            Keyword::Void
                | Keyword::Bool
                | Keyword::Char
                | Keyword::Short
                | Keyword::Int
                | Keyword::Long
                | Keyword::Float
                | Keyword::Double
                | Keyword::Signed
                | Keyword::Unsigned
                | Keyword::Struct
                | Keyword::Union
                | Keyword::Enum
                | Keyword::Const
                | Keyword::Volatile
                | Keyword::Restrict
                | Keyword::Static
                | Keyword::Extern
                | Keyword::Register
                | Keyword::Inline
                | Keyword::Noreturn
                | Keyword::Alignas
                | Keyword::Typedef
        );
    }
    tok.kind == TokenKind::Ident && p.is_typedef_name(&tok.lexeme)
}

/// Parse just a type (no declarator, no storage class) — used for casts,
/// `sizeof(type)`, and `offsetof`'s first argument.
pub fn parse_type_name(p: &mut Parser) -> PResult<Type> {
    let specs = parse_specifiers(p)?;
    let mut ty = specs.base_ty;
    while p.cur.eat_punct("*") {
        ty = Type::ptr_to(ty, 8);
        while p.cur.eat_keyword(Keyword::Const) || p.cur.eat_keyword(Keyword::Volatile) {}
    }
    Ok(ty)
}

/// Consume the specifier prefix plus base type specifier (spec.md §4.2).
pub fn parse_specifiers(p: &mut Parser) -> PResult<Specifiers> {
    let mut storage = StorageClass::default();
    let mut qualifiers = Qualifiers::default();
    let mut alignas = None;
    let mut signed_seen = false;
    let mut unsigned_seen = false;
    let mut long_count = 0u32;
    let mut short_seen = false;
    let mut base: Option<Type> = None;
    let mut tag_only_decl = false;
    let mut is_enum = false;

    loop {
        let tok = p.cur.peek().clone();
        match tok.kind {
            TokenKind::Keyword(Keyword::Extern) => {
                storage.is_extern = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Static) => {
                storage.is_static = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Register) => {
                storage.is_register = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Typedef) => {
                storage.is_typedef = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Inline) => {
                storage.is_inline = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Noreturn) => {
                storage.is_noreturn = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Const) => {
                qualifiers.is_const = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Volatile) => {
                qualifiers.is_volatile = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Restrict) => {
                qualifiers.is_restrict = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Alignas) => {
                p.cur.advance();
                p.expect_punct("(")?;
                alignas = Some(parse_expr(p)?);
                p.expect_punct(")")?;
            }
            TokenKind::Keyword(Keyword::Signed) => {
                signed_seen = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Unsigned) => {
                unsigned_seen = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Short) => {
                short_seen = true;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Long) => {
                long_count += 1;
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Void) if base.is_none() => {
                base = Some(Type::void());
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Bool) if base.is_none() => {
                base = Some(Type::basic(TypeKind::Bool, 1, 1));
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Char) if base.is_none() => {
                base = Some(Type::basic(TypeKind::Char, 1, 1));
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Int) if base.is_none() => {
                base = Some(Type::basic(TypeKind::Int, 4, 4));
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Float) if base.is_none() => {
                base = Some(Type::basic(TypeKind::Float, 4, 4));
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Double) if base.is_none() => {
                base = Some(Type::basic(TypeKind::Double, 8, 8));
                p.cur.advance();
            }
            TokenKind::Keyword(Keyword::Struct) | TokenKind::Keyword(Keyword::Union) => {
                let is_union = tok.kind == TokenKind::Keyword(Keyword::Union);
                p.cur.advance();
                let (ty, had_body, _) = parse_struct_or_union(p, is_union)?;
                tag_only_decl = had_body && !peeks_at_declarator(p);
                base = Some(ty);
            }
            TokenKind::Keyword(Keyword::Enum) => {
                p.cur.advance();
                let (ty, had_body, _) = parse_enum(p)?;
                tag_only_decl = had_body && !peeks_at_declarator(p);
                is_enum = true;
                base = Some(ty);
            }
            TokenKind::Ident if base.is_none() && p.is_typedef_name(&tok.lexeme) => {
                base = Some(Type::basic(TypeKind::Unknown, 0, 1));
                let mut named = base.take().unwrap();
                named.tag = Some(tok.lexeme.clone());
                base = Some(named);
                p.cur.advance();
            }
            _ => break,
        }
    }

    let mut ty = base.unwrap_or_else(Type::void);
    if signed_seen || unsigned_seen || short_seen || long_count > 0 {
        ty = numeric_override(ty, signed_seen, unsigned_seen, short_seen, long_count);
    }
    ty.is_const = qualifiers.is_const;
    ty.is_volatile = qualifiers.is_volatile;
    ty.is_restrict = qualifiers.is_restrict;

    Ok(Specifiers {
        storage,
        qualifiers,
        base_ty: ty,
        alignas,
        tag_only_decl,
        is_enum,
    })
}

fn numeric_override(base: Type, signed: bool, unsigned: bool, short: bool, long_count: u32) -> Type {
    let kind = if short {
        if unsigned { TypeKind::UShort } else { TypeKind::Short }
    } else if long_count >= 2 {
        if unsigned { TypeKind::ULLong } else { TypeKind::LLong }
    } else if long_count == 1 {
        if unsigned { TypeKind::ULong } else { TypeKind::Long }
    } else if unsigned {
        TypeKind::UInt
    } else if signed && base.kind == TypeKind::Char {
        TypeKind::Char
    } else {
        TypeKind::Int
    };
    let size = match kind {
        TypeKind::Short | TypeKind::UShort => 2,
        TypeKind::Long | TypeKind::ULong | TypeKind::LLong | TypeKind::ULLong => 8,
        _ => 4,
    };
    Type::basic(kind, size, size)
}

/// Lookahead used to tell `struct Foo { ... };` (a bare tag declaration)
/// from `struct Foo { ... } x;` (a tag declaration plus a variable).
fn peeks_at_declarator(p: &Parser) -> bool {
    !p.cur.peek().is_punct(";")
}

fn parse_struct_or_union(p: &mut Parser, is_union: bool) -> PResult<(Type, bool, Vec<FieldDecl>)> {
    let tag = if p.cur.peek().kind == TokenKind::Ident {
        Some(p.expect_ident()?)
    } else {
        None
    };
    let mut had_body = false;
    let mut fields = Vec::new();
    if p.cur.eat_punct("{") {
        had_body = true;
        while !p.cur.peek().is_punct("}") {
            fields.push(parse_field_decl(p)?);
            p.expect_punct(";")?;
        }
        p.expect_punct("}")?;
    }
    let kind = if is_union { TypeKind::Union } else { TypeKind::Struct };
    let mut ty = Type::basic(kind, 0, 1);
    ty.tag = tag;
    // full layout computation (offsets, size, alignment) belongs to the
    // semantic analyzer's tag table (component F); the parser only hands
    // the member list onward, attached to the type so it survives cloning
    // into every declarator sharing this base type.
    ty.fields = fields.clone();
    Ok((ty, had_body, fields))
}

fn parse_field_decl(p: &mut Parser) -> PResult<FieldDecl> {
    let specs = parse_specifiers(p)?;
    let (name, ty, _) = parse_declarator(p, specs.base_ty, false)?;
    let bit_width = if p.cur.eat_punct(":") {
        Some(parse_expr(p)?)
    } else {
        None
    };
    let is_flexible_array = matches!(ty.kind, TypeKind::Array) && ty.array_len.is_none();
    Ok(FieldDecl {
        name: Some(name),
        ty,
        bit_width,
        is_flexible_array,
    })
}

fn parse_enum(p: &mut Parser) -> PResult<(Type, bool, Vec<EnumVariant>)> {
    let tag = if p.cur.peek().kind == TokenKind::Ident {
        Some(p.expect_ident()?)
    } else {
        None
    };
    let mut had_body = false;
    let mut variants = Vec::new();
    if p.cur.eat_punct("{") {
        had_body = true;
        loop {
            if p.cur.peek().is_punct("}") {
                break;
            }
            let name = p.expect_ident()?;
            let value = if p.cur.eat_punct("=") {
                Some(parse_expr(p)?)
            } else {
                None
            };
            variants.push(EnumVariant { name, value });
            if !p.cur.eat_punct(",") {
                break;
            }
        }
        p.expect_punct("}")?;
    }
    let mut ty = Type::basic(TypeKind::Int, 4, 4);
    ty.tag = tag;
    ty.enum_variants = variants.clone();
    Ok((ty, had_body, variants))
}

/// Parse one declarator: leading `*`s, a name (optional when
/// `allow_abstract`), then a trailing `[...]` or `(...)`.
///
/// Returns `(name, full_type, array_size_expr)`; a function-pointer
/// declarator's parameter list is folded directly into `Type::Func`
/// (spec.md §9's simplification — `VarDecl` does not separately carry
/// parameter metadata for the function-pointer case).
pub fn parse_declarator(
    p: &mut Parser,
    base_ty: Type,
    allow_abstract: bool,
) -> PResult<(String, Type, Option<vc_ast::Expr>)> {
    let mut ty = base_ty;
    while p.cur.eat_punct("*") {
        ty = Type::ptr_to(ty, 8);
        while p.cur.eat_keyword(Keyword::Const) || p.cur.eat_keyword(Keyword::Volatile) {}
    }

    // Parenthesized declarator, e.g. `int (*fp)(int)`.
    if p.cur.peek().is_punct("(") && p.cur.peek_at(1).is_punct("*") {
        p.cur.advance();
        p.expect_punct("*")?;
        let name = p.expect_ident()?;
        p.expect_punct(")")?;
        p.expect_punct("(")?;
        let (params, is_variadic) = parse_param_list(p)?;
        p.expect_punct(")")?;
        ty = Type::func(ty, params.into_iter().map(|param| param.ty).collect(), is_variadic);
        ty = Type::ptr_to(ty, 8);
        return Ok((name, ty, None));
    }

    let name = if allow_abstract && !matches!(p.cur.peek().kind, TokenKind::Ident) {
        String::new()
    } else {
        p.expect_ident()?
    };

    if p.cur.eat_punct("[") {
        let size_expr = if p.cur.peek().is_punct("]") {
            None
        } else {
            Some(parse_expr(p)?)
        };
        p.expect_punct("]")?;
        let array_len = None; // resolved to a constant by the semantic analyzer via vc-const
        ty = Type::array_of(ty, array_len);
        return Ok((name, ty, size_expr));
    }

    if p.cur.eat_punct("(") {
        let (params, is_variadic) = parse_param_list(p)?;
        p.expect_punct(")")?;
        ty = Type::func(ty, params.into_iter().map(|param| param.ty).collect(), is_variadic);
    }

    Ok((name, ty, None))
}

fn parse_param_list(p: &mut Parser) -> PResult<(Vec<Param>, bool)> {
    let mut params = Vec::new();
    let mut is_variadic = false;
    if p.cur.peek().is_punct(")") {
        return Ok((params, is_variadic));
    }
    if p.cur.peek().is_keyword(Keyword::Void) && p.cur.peek_at(1).is_punct(")") {
        p.cur.advance();
        return Ok((params, is_variadic));
    }
    loop {
        if p.cur.eat_punct("...") {
            is_variadic = true;
            break;
        }
        let specs = parse_specifiers(p)?;
        let (name, ty, _) = parse_declarator(p, specs.base_ty, true)?;
        params.push(Param {
            name: if name.is_empty() { None } else { Some(name) },
            ty,
            is_restrict: specs.qualifiers.is_restrict,
        });
        if !p.cur.eat_punct(",") {
            break;
        }
    }
    Ok((params, is_variadic))
}

/// Try to parse a function prototype or definition starting right after
/// the specifier prefix; the caller rewinds and retries as a global
/// variable declaration on failure (spec.md §4.2's "top-level dispatcher").
pub fn try_parse_function(p: &mut Parser, specs: &Specifiers) -> PResult<Function> {
    let loc = p.cur.loc();
    let (name, ty, _) = parse_declarator(p, specs.base_ty.clone(), false)?;
    let (params, is_variadic, ret_ty) = match ty.kind {
        TypeKind::Func => {
            let ret = *ty.pointee.clone().expect("func type carries a return type");
            let params = ty
                .params
                .iter()
                .cloned()
                .map(|t| Param { name: None, ty: t, is_restrict: false })
                .collect();
            (params, ty.is_variadic, ret)
        }
        _ => return p.syntax_err("expected a function declarator"),
    };

    let body = if p.cur.eat_punct(";") {
        None
    } else if p.cur.peek().is_punct("{") {
        Some(parse_block_stmts(p)?)
    } else {
        return p.syntax_err("expected ';' or function body");
    };

    Ok(Function {
        name,
        ret_type: ret_ty,
        ret_tag: None,
        params,
        is_variadic,
        body,
        is_inline: specs.storage.is_inline,
        is_noreturn: specs.storage.is_noreturn,
        is_static: specs.storage.is_static,
        loc,
    })
}

fn parse_block_stmts(p: &mut Parser) -> PResult<Vec<Stmt>> {
    match parse_block(p)? {
        Stmt::Block(stmts) => Ok(stmts),
        other => Ok(vec![other]),
    }
}

pub fn parse_global_var(p: &mut Parser, specs: &Specifiers) -> PResult<VarDecl> {
    let loc = p.cur.loc();
    let (name, ty, array_size_expr) = parse_declarator(p, specs.base_ty.clone(), false)?;
    let init = if p.cur.eat_punct("=") {
        Some(if p.cur.peek().is_punct("{") {
            Initializer::List(parse_init_list(p)?)
        } else {
            Initializer::Scalar(parse_expr(p)?)
        })
    } else {
        None
    };
    Ok(VarDecl {
        name,
        ty,
        storage: specs.storage,
        qualifiers: specs.qualifiers,
        init,
        alignas: specs.alignas.clone(),
        array_size_expr,
        loc,
    })
}

pub fn parse_typedef_tail(p: &mut Parser, specs: &Specifiers) -> PResult<Stmt> {
    let (name, ty, _) = parse_declarator(p, specs.base_ty.clone(), false)?;
    p.register_typedef(&name);
    Ok(Stmt::Typedef { name, ty })
}
