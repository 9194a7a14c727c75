//! Expression grammar (spec.md §4.2), low to high precedence:
//! assignment → conditional → logor → logand → bitor → bitxor → bitand →
//! equality → relational → shift → additive → multiplicative → cast →
//! unary → postfix → primary.
//!
//! Left-associative binary chains share [`parse_binary_level`], the
//! `(sub-parser, [binop tags])` helper spec.md calls for.

use crate::decl::{is_type_start, parse_type_name};
use crate::{PResult, Parser};
use vc_ast::{BinaryOp, Designator, Expr, ExprKind, InitEntry, InitValue, OffsetofStep, TypeOrExpr, UnaryOp};
use vc_diag::{DiagnosticKind, Location};
use vc_lex::{Keyword, TokenKind};

/// Magnitude of the one literal spec.md §8's overflow boundary carves an
/// exception for: `-9223372036854775808` parses as unary minus applied to
/// the digit string `9223372036854775808`, which is `i64::MIN`'s magnitude
/// and doesn't fit a positive `i64` on its own.
const INT64_MIN_MAGNITUDE: u64 = 1u64 << 63;

pub fn parse_expr(p: &mut Parser) -> PResult<Expr> {
    parse_assignment(p)
}

fn assign_op(lexeme: &str) -> Option<Option<BinaryOp>> {
    // `Some(None)` means plain `=`; `Some(Some(op))` a compound assignment.
    Some(match lexeme {
        "=" => None,
        "+=" => Some(BinaryOp::Add),
        "-=" => Some(BinaryOp::Sub),
        "*=" => Some(BinaryOp::Mul),
        "/=" => Some(BinaryOp::Div),
        "%=" => Some(BinaryOp::Mod),
        "&=" => Some(BinaryOp::BitAnd),
        "|=" => Some(BinaryOp::BitOr),
        "^=" => Some(BinaryOp::BitXor),
        "<<=" => Some(BinaryOp::Shl),
        ">>=" => Some(BinaryOp::Shr),
        _ => return None,
    })
}

fn parse_assignment(p: &mut Parser) -> PResult<Expr> {
    let loc = p.loc();
    let lhs = parse_conditional(p)?;
    let tok = p.cur.peek().clone();
    if tok.kind == TokenKind::Punct {
        if let Some(op) = assign_op(&tok.lexeme) {
            if !lhs.is_lvalue_kind() {
                return p.syntax_err("left-hand side of assignment is not an lvalue");
            }
            p.cur.advance();
            let rhs = parse_assignment(p)?;
            let kind = match op {
                None => ExprKind::Assign {
                    target: Box::new(lhs),
                    value: Box::new(rhs),
                },
                Some(op) => ExprKind::CompoundAssign {
                    op,
                    target: Box::new(lhs),
                    value: Box::new(rhs),
                },
            };
            return Ok(Expr::new(kind, loc));
        }
    }
    Ok(lhs)
}

fn parse_conditional(p: &mut Parser) -> PResult<Expr> {
    let loc = p.loc();
    let cond = parse_logor(p)?;
    if p.cur.eat_punct("?") {
        let then_expr = parse_expr(p)?;
        p.expect_punct(":")?;
        let else_expr = parse_conditional(p)?;
        Ok(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            loc,
        ))
    } else {
        Ok(cond)
    }
}

macro_rules! binary_level {
    ($name:ident, $next:ident, [ $( $spelling:expr => $op:expr ),+ $(,)? ]) => {
        fn $name(p: &mut Parser) -> PResult<Expr> {
            let mut lhs = $next(p)?;
            loop {
                let loc = p.loc();
                let tok = p.cur.peek().clone();
                let op = if tok.kind == TokenKind::Punct {
                    match tok.lexeme.as_str() {
                        $( $spelling => Some($op), )+
                        _ => None,
                    }
                } else {
                    None
                };
                match op {
                    Some(op) => {
                        p.cur.advance();
                        let rhs = $next(p)?;
                        lhs = Expr::new(
                            ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                            loc,
                        );
                    }
                    None => break,
                }
            }
            Ok(lhs)
        }
    };
}

binary_level!(parse_logor, parse_logand, ["||" => BinaryOp::LogOr]);
binary_level!(parse_logand, parse_bitor, ["&&" => BinaryOp::LogAnd]);
binary_level!(parse_bitor, parse_bitxor, ["|" => BinaryOp::BitOr]);
binary_level!(parse_bitxor, parse_bitand, ["^" => BinaryOp::BitXor]);
binary_level!(parse_bitand, parse_equality, ["&" => BinaryOp::BitAnd]);
binary_level!(parse_equality, parse_relational, ["==" => BinaryOp::Eq, "!=" => BinaryOp::Ne]);
binary_level!(
    parse_relational,
    parse_shift,
    ["<" => BinaryOp::Lt, "<=" => BinaryOp::Le, ">" => BinaryOp::Gt, ">=" => BinaryOp::Ge]
);
binary_level!(parse_shift, parse_additive, ["<<" => BinaryOp::Shl, ">>" => BinaryOp::Shr]);
binary_level!(parse_additive, parse_multiplicative, ["+" => BinaryOp::Add, "-" => BinaryOp::Sub]);
binary_level!(
    parse_multiplicative,
    parse_cast,
    ["*" => BinaryOp::Mul, "/" => BinaryOp::Div, "%" => BinaryOp::Mod]
);

fn parse_cast(p: &mut Parser) -> PResult<Expr> {
    let loc = p.loc();
    if p.cur.peek().is_punct("(") {
        let save = p.cur.pos();
        p.cur.advance();
        if is_type_start(p) {
            if let Ok(ty) = parse_type_name(p) {
                if p.cur.eat_punct(")") {
                    if p.cur.peek().is_punct("{") {
                        // compound literal: `(type){ init-list }`
                        let init = parse_init_list(p)?;
                        return Ok(Expr::new(ExprKind::CompoundLiteral { ty, init }, loc));
                    }
                    let expr = parse_cast(p)?;
                    return Ok(Expr::new(
                        ExprKind::Cast { ty, expr: Box::new(expr) },
                        loc,
                    ));
                }
            }
        }
        p.cur.rewind(save);
    }
    parse_unary(p)
}

fn parse_unary(p: &mut Parser) -> PResult<Expr> {
    let loc = p.loc();
    let tok = p.cur.peek().clone();

    if tok.is_keyword(Keyword::Sizeof) {
        p.cur.advance();
        return parse_sizeof_or_alignof(p, loc, true);
    }
    if tok.is_keyword(Keyword::Alignof) {
        p.cur.advance();
        return parse_sizeof_or_alignof(p, loc, false);
    }
    if tok.is_keyword(Keyword::Offsetof) {
        p.cur.advance();
        return parse_offsetof(p, loc);
    }

    if tok.kind == TokenKind::Punct {
        if tok.lexeme == "-" && p.cur.peek_at(1).kind == TokenKind::IntLit {
            let next = p.cur.peek_at(1).clone();
            let (digits, is_unsigned, long_count) = strip_int_suffix(&next.lexeme);
            if parse_uint_magnitude(digits) == Some(INT64_MIN_MAGNITUDE) {
                p.cur.advance();
                p.cur.advance();
                return Ok(Expr::new(
                    ExprKind::IntLit { value: i64::MIN, is_unsigned, long_count: long_count.min(2) },
                    loc,
                ));
            }
        }

        let op = match tok.lexeme.as_str() {
            "++" => Some(UnaryOp::PreInc),
            "--" => Some(UnaryOp::PreDec),
            "*" => Some(UnaryOp::Deref),
            "&" => Some(UnaryOp::AddrOf),
            "-" => Some(UnaryOp::Neg),
            "!" => Some(UnaryOp::LogNot),
            "~" => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            p.cur.advance();
            let operand = parse_cast(p)?;
            return Ok(Expr::new(
                ExprKind::Unary { op, operand: Box::new(operand) },
                loc,
            ));
        }
        if tok.lexeme == "+" {
            p.cur.advance();
            return parse_cast(p);
        }
    }

    parse_postfix(p)
}

fn parse_sizeof_or_alignof(p: &mut Parser, loc: Location, is_sizeof: bool) -> PResult<Expr> {
    if p.cur.peek().is_punct("(") {
        let save = p.cur.pos();
        p.cur.advance();
        if is_type_start(p) {
            if let Ok(ty) = parse_type_name(p) {
                if p.cur.eat_punct(")") {
                    let toe = TypeOrExpr::Type(ty);
                    return Ok(Expr::new(
                        if is_sizeof {
                            ExprKind::Sizeof(toe)
                        } else {
                            ExprKind::Alignof(toe)
                        },
                        loc,
                    ));
                }
            }
        }
        p.cur.rewind(save);
    }
    let operand = parse_unary(p)?;
    let toe = TypeOrExpr::Expr(Box::new(operand));
    Ok(Expr::new(
        if is_sizeof {
            ExprKind::Sizeof(toe)
        } else {
            ExprKind::Alignof(toe)
        },
        loc,
    ))
}

fn parse_offsetof(p: &mut Parser, loc: Location) -> PResult<Expr> {
    p.expect_punct("(")?;
    let ty = parse_type_name(p)?;
    p.expect_punct(",")?;
    let mut path = vec![OffsetofStep::Field(p.expect_ident()?)];
    loop {
        if p.cur.eat_punct(".") {
            path.push(OffsetofStep::Field(p.expect_ident()?));
        } else if p.cur.eat_punct("[") {
            let int_loc = p.loc();
            let tok = p.cur.peek().clone();
            if tok.kind != TokenKind::IntLit {
                return p.syntax_err("offsetof array designator must be an integer constant");
            }
            p.cur.advance();
            let (value, _, _) = parse_int_literal(p, int_loc, &tok.lexeme)?;
            p.expect_punct("]")?;
            path.push(OffsetofStep::Index(value as u64));
        } else {
            break;
        }
    }
    p.expect_punct(")")?;
    Ok(Expr::new(ExprKind::Offsetof { ty, path }, loc))
}

fn parse_postfix(p: &mut Parser) -> PResult<Expr> {
    let mut e = parse_primary(p)?;
    loop {
        let loc = p.loc();
        if p.cur.eat_punct("[") {
            let index = parse_expr(p)?;
            p.expect_punct("]")?;
            e = Expr::new(
                ExprKind::Index { base: Box::new(e), index: Box::new(index) },
                loc,
            );
        } else if p.cur.eat_punct(".") {
            let field = p.expect_ident()?;
            e = Expr::new(
                ExprKind::Member { base: Box::new(e), field, arrow: false },
                loc,
            );
        } else if p.cur.eat_punct("->") {
            let field = p.expect_ident()?;
            e = Expr::new(
                ExprKind::Member { base: Box::new(e), field, arrow: true },
                loc,
            );
        } else if p.cur.eat_punct("++") {
            e = Expr::new(
                ExprKind::Unary { op: UnaryOp::PostInc, operand: Box::new(e) },
                loc,
            );
        } else if p.cur.eat_punct("--") {
            e = Expr::new(
                ExprKind::Unary { op: UnaryOp::PostDec, operand: Box::new(e) },
                loc,
            );
        } else {
            break;
        }
    }
    Ok(e)
}

fn parse_primary(p: &mut Parser) -> PResult<Expr> {
    let loc = p.loc();
    let tok = p.cur.peek().clone();
    match tok.kind {
        TokenKind::IntLit => {
            p.cur.advance();
            let (value, is_unsigned, long_count) = parse_int_literal(p, loc, &tok.lexeme)?;
            Ok(Expr::new(ExprKind::IntLit { value, is_unsigned, long_count }, loc))
        }
        TokenKind::FloatLit => {
            p.cur.advance();
            let is_float = tok.lexeme.ends_with('f') || tok.lexeme.ends_with('F');
            let digits: String = tok
                .lexeme
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+' || *c == 'e' || *c == 'E')
                .collect();
            let value = match digits.parse::<f64>() {
                Ok(value) => value,
                Err(_) => {
                    return p.err(
                        DiagnosticKind::ConstantExpression,
                        loc,
                        format!("floating-point literal '{}' is malformed", tok.lexeme),
                    );
                }
            };
            Ok(Expr::new(ExprKind::FloatLit { value, is_float }, loc))
        }
        TokenKind::StringLit => {
            p.cur.advance();
            let wide = tok.lexeme.starts_with('L');
            let text = if wide { &tok.lexeme[1..] } else { &tok.lexeme[..] };
            Ok(Expr::new(
                ExprKind::StrLit { bytes: unescape(text), wide },
                loc,
            ))
        }
        TokenKind::CharLit => {
            p.cur.advance();
            let wide = tok.lexeme.starts_with('L');
            let text = if wide { &tok.lexeme[1..] } else { &tok.lexeme[..] };
            let bytes = unescape(text);
            let value = *bytes.first().unwrap_or(&0) as i64;
            Ok(Expr::new(ExprKind::CharLit { value, wide }, loc))
        }
        TokenKind::Ident => {
            p.cur.advance();
            if p.cur.peek().is_punct("(") {
                p.cur.advance();
                let mut args = Vec::new();
                if !p.cur.peek().is_punct(")") {
                    loop {
                        args.push(parse_assignment(p)?);
                        if !p.cur.eat_punct(",") {
                            break;
                        }
                    }
                }
                p.expect_punct(")")?;
                Ok(Expr::new(ExprKind::Call { callee: tok.lexeme, args }, loc))
            } else {
                Ok(Expr::new(ExprKind::Ident(tok.lexeme), loc))
            }
        }
        TokenKind::Punct if tok.lexeme == "(" => {
            p.cur.advance();
            let e = parse_expr(p)?;
            p.expect_punct(")")?;
            Ok(e)
        }
        _ => p.syntax_err(format!("unexpected token '{}' in expression", tok.lexeme)),
    }
}

/// Splits a lexed integer token into its digit text and `u`/`l` suffix
/// flags, without interpreting the digits themselves.
fn strip_int_suffix(lexeme: &str) -> (&str, bool, u8) {
    let mut end = lexeme.len();
    let mut is_unsigned = false;
    let mut long_count = 0u8;
    let bytes = lexeme.as_bytes();
    while end > 0 {
        match bytes[end - 1] {
            b'u' | b'U' => {
                is_unsigned = true;
                end -= 1;
            }
            b'l' | b'L' => {
                long_count += 1;
                end -= 1;
            }
            _ => break,
        }
    }
    (&lexeme[..end], is_unsigned, long_count)
}

/// Parses a literal's digit text (suffix already stripped) as an unsigned
/// magnitude, picking hex/octal/decimal the way the lexeme spells it.
/// Returns `None` when the digits don't even fit a `u64`.
fn parse_uint_magnitude(digits: &str) -> Option<u64> {
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse::<u64>().ok()
    }
}

/// Decodes an integer literal, rejecting magnitudes that don't fit a
/// signed 64-bit value (spec.md §8's overflow boundary) instead of
/// silently truncating them to `0`. `-9223372036854775808` is handled a
/// token earlier, in [`parse_unary`], before this function ever sees the
/// bare digit string `9223372036854775808`.
fn parse_int_literal(p: &Parser, loc: Location, lexeme: &str) -> PResult<(i64, bool, u8)> {
    let (digits, is_unsigned, long_count) = strip_int_suffix(lexeme);
    let magnitude = match parse_uint_magnitude(digits) {
        Some(magnitude) => magnitude,
        None => {
            return p.err(
                DiagnosticKind::ConstantExpression,
                loc,
                format!("integer literal '{}' is too large to represent", lexeme),
            );
        }
    };
    if magnitude > i64::MAX as u64 {
        return p.err(
            DiagnosticKind::ConstantExpression,
            loc,
            format!("integer literal '{}' overflows a signed 64-bit integer", lexeme),
        );
    }
    Ok((magnitude as i64, is_unsigned, long_count.min(2)))
}

fn unescape(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('0') => out.push(0),
            Some('\\') => out.push(b'\\'),
            Some('\'') => out.push(b'\''),
            Some('"') => out.push(b'"'),
            Some(other) => out.push(other as u8),
            None => {}
        }
    }
    out
}

/// Initializer list `{ entry, entry, ... }` (spec.md §3.3: each entry is
/// `{simple}`, `.field = expr`, or `[expr] = expr`; lists nest).
pub fn parse_init_list(p: &mut Parser) -> PResult<Vec<InitEntry>> {
    p.expect_punct("{")?;
    let mut entries = Vec::new();
    if !p.cur.peek().is_punct("}") {
        loop {
            entries.push(parse_init_entry(p)?);
            if !p.cur.eat_punct(",") {
                break;
            }
            if p.cur.peek().is_punct("}") {
                break;
            }
        }
    }
    p.expect_punct("}")?;
    Ok(entries)
}

fn parse_init_entry(p: &mut Parser) -> PResult<InitEntry> {
    let designator = if p.cur.eat_punct(".") {
        let field = p.expect_ident()?;
        p.expect_punct("=")?;
        Some(Designator::Field(field))
    } else if p.cur.eat_punct("[") {
        let idx = parse_expr(p)?;
        p.expect_punct("]")?;
        p.expect_punct("=")?;
        Some(Designator::Index(idx))
    } else {
        None
    };
    let value = if p.cur.peek().is_punct("{") {
        InitValue::List(parse_init_list(p)?)
    } else {
        InitValue::Scalar(parse_assignment(p)?)
    };
    Ok(InitEntry { designator, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use vc_diag::DiagCtx;

    fn parse(src: &str) -> Expr {
        let diag = DiagCtx::new("t.c");
        let tokens = vc_lex::tokenize(src).unwrap();
        let mut p = Parser::new(&tokens, &diag);
        parse_expr(&mut p).unwrap_or_else(|e| panic!("{}", e))
    }

    fn parse_result(src: &str) -> PResult<Expr> {
        let diag = DiagCtx::new("t.c");
        let tokens = vc_lex::tokenize(src).unwrap();
        let mut p = Parser::new(&tokens, &diag);
        parse_expr(&mut p)
    }

    #[test]
    fn precedence_mul_over_add() {
        let e = parse("1 + 2 * 3");
        match e.kind {
            ExprKind::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            _ => panic!("expected addition at the top"),
        }
    }

    #[test]
    fn compound_assign_keeps_single_target() {
        let e = parse("x += 1");
        match e.kind {
            ExprKind::CompoundAssign { op: BinaryOp::Add, .. } => {}
            _ => panic!("expected compound assign"),
        }
    }

    #[test]
    fn ternary_is_right_assoc_with_assignment_below() {
        let e = parse("a ? b : c ? d : e");
        match e.kind {
            ExprKind::Ternary { else_expr, .. } => {
                assert!(matches!(else_expr.kind, ExprKind::Ternary { .. }));
            }
            _ => panic!("expected ternary"),
        }
    }

    #[test]
    fn sizeof_type_vs_expr() {
        let e = parse("sizeof(int)");
        assert!(matches!(e.kind, ExprKind::Sizeof(TypeOrExpr::Type(_))));
        let e = parse("sizeof x");
        assert!(matches!(e.kind, ExprKind::Sizeof(TypeOrExpr::Expr(_))));
    }

    #[test]
    fn int64_min_via_negated_magnitude_is_accepted() {
        let e = parse("-9223372036854775808");
        match e.kind {
            ExprKind::IntLit { value, .. } => assert_eq!(value, i64::MIN),
            _ => panic!("expected a plain integer literal, not a negation"),
        }
    }

    #[test]
    fn positive_use_of_int64_min_magnitude_overflows() {
        let err = parse_result("9223372036854775808").expect_err("literal overflows i64");
        assert_eq!(err.kind, DiagnosticKind::ConstantExpression);
    }

    #[test]
    fn int64_max_literal_parses_but_one_more_digit_overflows() {
        let ok = parse_result("9223372036854775807 + 1");
        assert!(ok.is_ok(), "the literal itself is still in range; overflow is a later constant-folding concern");

        let err = parse_result("99999999999999999999").expect_err("literal too large to represent at all");
        assert_eq!(err.kind, DiagnosticKind::ConstantExpression);
    }
}
