//! Statement grammar (spec.md §3.3, §4.2).

use crate::decl::{is_type_start, parse_declarator, parse_specifiers};
use crate::expr::{parse_expr, parse_init_list};
use crate::{PResult, Parser};
use vc_ast::{Initializer, Stmt, SwitchCase, VarDecl};
use vc_lex::{Keyword, TokenKind};

pub fn parse_block(p: &mut Parser) -> PResult<Stmt> {
    p.expect_punct("{")?;
    let mut stmts = Vec::new();
    while !p.cur.peek().is_punct("}") {
        stmts.push(parse_stmt(p)?);
    }
    p.expect_punct("}")?;
    Ok(Stmt::Block(stmts))
}

pub fn parse_stmt(p: &mut Parser) -> PResult<Stmt> {
    let tok = p.cur.peek().clone();

    if tok.is_punct("{") {
        return parse_block(p);
    }
    if tok.is_keyword(Keyword::If) {
        return parse_if(p);
    }
    if tok.is_keyword(Keyword::While) {
        return parse_while(p);
    }
    if tok.is_keyword(Keyword::Do) {
        return parse_do_while(p);
    }
    if tok.is_keyword(Keyword::For) {
        return parse_for(p);
    }
    if tok.is_keyword(Keyword::Switch) {
        return parse_switch(p);
    }
    if tok.is_keyword(Keyword::Break) {
        p.cur.advance();
        p.expect_punct(";")?;
        return Ok(Stmt::Break);
    }
    if tok.is_keyword(Keyword::Continue) {
        p.cur.advance();
        p.expect_punct(";")?;
        return Ok(Stmt::Continue);
    }
    if tok.is_keyword(Keyword::Return) {
        p.cur.advance();
        let value = if p.cur.eat_punct(";") {
            None
        } else {
            let e = parse_expr(p)?;
            p.expect_punct(";")?;
            Some(e)
        };
        return Ok(Stmt::Return(value));
    }
    if tok.is_keyword(Keyword::Goto) {
        p.cur.advance();
        let name = p.expect_ident()?;
        p.expect_punct(";")?;
        return Ok(Stmt::Goto(name));
    }
    if tok.is_keyword(Keyword::StaticAssert) {
        let s = parse_static_assert(p)?;
        p.expect_punct(";")?;
        return Ok(s);
    }
    // A label is `ident ':' stmt`, distinguished from an expression
    // statement by lookahead past the identifier.
    if tok.kind == TokenKind::Ident && p.cur.peek_at(1).is_punct(":") {
        p.cur.advance();
        p.cur.advance();
        let inner = parse_stmt(p)?;
        return Ok(Stmt::Label { name: tok.lexeme, stmt: Box::new(inner) });
    }

    if is_type_start(p) {
        return parse_decl_stmt(p);
    }

    let e = parse_expr(p)?;
    p.expect_punct(";")?;
    Ok(Stmt::Expr(e))
}

fn parse_static_assert(p: &mut Parser) -> PResult<Stmt> {
    p.expect_keyword(Keyword::StaticAssert)?;
    p.expect_punct("(")?;
    let cond = parse_expr(p)?;
    let message = if p.cur.eat_punct(",") {
        if p.cur.peek().kind == TokenKind::StringLit {
            Some(p.cur.advance().lexeme.clone())
        } else {
            return p.syntax_err("expected string literal message");
        }
    } else {
        None
    };
    p.expect_punct(")")?;
    Ok(Stmt::StaticAssert { cond, message })
}

fn parse_decl_stmt(p: &mut Parser) -> PResult<Stmt> {
    let specs = parse_specifiers(p)?;
    if specs.storage.is_typedef {
        let (name, ty, _) = parse_declarator(p, specs.base_ty, false)?;
        p.expect_punct(";")?;
        p.register_typedef(&name);
        return Ok(Stmt::Typedef { name, ty });
    }
    if specs.tag_only_decl {
        p.expect_punct(";")?;
        return Ok(specs.into_tag_stmt());
    }

    let loc = p.cur.loc();
    let (name, ty, array_size_expr) = parse_declarator(p, specs.base_ty, false)?;
    let init = if p.cur.eat_punct("=") {
        Some(if p.cur.peek().is_punct("{") {
            Initializer::List(parse_init_list(p)?)
        } else {
            Initializer::Scalar(parse_expr(p)?)
        })
    } else {
        None
    };
    p.expect_punct(";")?;
    Ok(Stmt::VarDecl(VarDecl {
        name,
        ty,
        storage: specs.storage,
        qualifiers: specs.qualifiers,
        init,
        alignas: specs.alignas,
        array_size_expr,
        loc,
    }))
}

fn parse_if(p: &mut Parser) -> PResult<Stmt> {
    p.expect_keyword(Keyword::If)?;
    p.expect_punct("(")?;
    let cond = parse_expr(p)?;
    p.expect_punct(")")?;
    let then_branch = Box::new(parse_stmt(p)?);
    let else_branch = if p.cur.eat_keyword(Keyword::Else) {
        Some(Box::new(parse_stmt(p)?))
    } else {
        None
    };
    Ok(Stmt::If { cond, then_branch, else_branch })
}

fn parse_while(p: &mut Parser) -> PResult<Stmt> {
    p.expect_keyword(Keyword::While)?;
    p.expect_punct("(")?;
    let cond = parse_expr(p)?;
    p.expect_punct(")")?;
    let body = Box::new(parse_stmt(p)?);
    Ok(Stmt::While { cond, body })
}

fn parse_do_while(p: &mut Parser) -> PResult<Stmt> {
    p.expect_keyword(Keyword::Do)?;
    let body = Box::new(parse_stmt(p)?);
    p.expect_keyword(Keyword::While)?;
    p.expect_punct("(")?;
    let cond = parse_expr(p)?;
    p.expect_punct(")")?;
    p.expect_punct(";")?;
    Ok(Stmt::DoWhile { body, cond })
}

fn parse_for(p: &mut Parser) -> PResult<Stmt> {
    p.expect_keyword(Keyword::For)?;
    p.expect_punct("(")?;
    let init = if p.cur.eat_punct(";") {
        None
    } else if is_type_start(p) {
        Some(Box::new(parse_decl_stmt(p)?))
    } else {
        let e = parse_expr(p)?;
        p.expect_punct(";")?;
        Some(Box::new(Stmt::Expr(e)))
    };
    let cond = if p.cur.peek().is_punct(";") {
        None
    } else {
        Some(parse_expr(p)?)
    };
    p.expect_punct(";")?;
    let step = if p.cur.peek().is_punct(")") {
        None
    } else {
        Some(parse_expr(p)?)
    };
    p.expect_punct(")")?;
    let body = Box::new(parse_stmt(p)?);
    Ok(Stmt::For { init, cond, step, body })
}

fn parse_switch(p: &mut Parser) -> PResult<Stmt> {
    p.expect_keyword(Keyword::Switch)?;
    p.expect_punct("(")?;
    let scrutinee = parse_expr(p)?;
    p.expect_punct(")")?;
    p.expect_punct("{")?;

    let mut cases = Vec::new();
    let mut default = None;
    while !p.cur.peek().is_punct("}") {
        if p.cur.eat_keyword(Keyword::Case) {
            let value = parse_expr(p)?;
            p.expect_punct(":")?;
            let body = parse_case_body(p)?;
            cases.push(SwitchCase { value, body });
        } else if p.cur.eat_keyword(Keyword::Default) {
            p.expect_punct(":")?;
            default = Some(parse_case_body(p)?);
        } else {
            return p.syntax_err("expected 'case' or 'default' in switch body");
        }
    }
    p.expect_punct("}")?;
    Ok(Stmt::Switch { scrutinee, cases, default })
}

/// Statements belonging to one `case`/`default` arm, up to the next
/// `case`/`default`/closing brace (fallthrough is left to the semantic
/// analyzer's branch wiring, not modeled structurally here).
fn parse_case_body(p: &mut Parser) -> PResult<Vec<Stmt>> {
    let mut stmts = Vec::new();
    while !p.cur.peek().is_punct("}")
        && !p.cur.peek().is_keyword(Keyword::Case)
        && !p.cur.peek().is_keyword(Keyword::Default)
    {
        stmts.push(parse_stmt(p)?);
    }
    Ok(stmts)
}
