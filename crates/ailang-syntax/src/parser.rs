//! Recursive-descent / Pratt parser for the normative source subset (§6.2).

use ailang_common::Span;

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(ParseError::new(
                format!("expected {what}, found {:?}", self.peek()),
                self.peek_span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> PResult<(String, Span)> {
        let span = self.peek_span();
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok((name, span))
            }
            other => Err(ParseError::new(
                format!("expected identifier, found {other:?}"),
                span,
            )),
        }
    }

    // ── Top level ────────────────────────────────────────────────────────

    pub fn parse_source_file(&mut self) -> PResult<SourceFile> {
        let start = self.peek_span();
        let module = if self.eat(&TokenKind::KwModule) {
            let (name, _) = self.expect_ident()?;
            Some(name)
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.at(&TokenKind::KwImport) {
            imports.push(self.parse_import()?);
        }

        let mut decls = Vec::new();
        while !self.at(&TokenKind::Eof) {
            decls.push(self.parse_decl()?);
        }
        let end = self.peek_span();
        Ok(SourceFile {
            module,
            imports,
            decls,
            span: start.merge(end),
        })
    }

    fn parse_import(&mut self) -> PResult<ImportDecl> {
        let start = self.peek_span();
        self.expect(&TokenKind::KwImport, "`import`")?;
        let (module_path, _) = self.expect_ident()?;
        let names = if self.eat(&TokenKind::LParen) {
            let mut names = Vec::new();
            if !self.at(&TokenKind::RParen) {
                loop {
                    let (n, _) = self.expect_ident()?;
                    names.push(n);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen, "`)`")?;
            Some(names)
        } else {
            None
        };
        let end = self.peek_span();
        Ok(ImportDecl {
            module_path,
            names,
            span: start.merge(end),
        })
    }

    fn parse_decl(&mut self) -> PResult<Decl> {
        let exported = self.eat(&TokenKind::KwExport);
        match self.peek() {
            TokenKind::KwFunc => Ok(Decl::Func(self.parse_func_decl(exported)?)),
            TokenKind::KwType => Ok(Decl::TypeDef(self.parse_type_def(exported)?)),
            TokenKind::KwLet => Ok(Decl::Let(self.parse_top_level_let(exported)?)),
            other => Err(ParseError::new(
                format!("expected a declaration, found {other:?}"),
                self.peek_span(),
            )),
        }
    }

    fn parse_func_decl(&mut self, exported: bool) -> PResult<FuncDecl> {
        let start = self.peek_span();
        self.expect(&TokenKind::KwFunc, "`func`")?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let (pname, _) = self.expect_ident()?;
                let ty = if self.eat(&TokenKind::Colon) {
                    Some(self.parse_type_expr()?)
                } else {
                    None
                };
                params.push(Param { name: pname, ty });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;

        let return_type = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        let effects = if self.eat(&TokenKind::Bang) {
            self.expect(&TokenKind::LBrace, "`{` after `!`")?;
            let mut labels = Vec::new();
            if !self.at(&TokenKind::RBrace) {
                loop {
                    let (label, span) = self.expect_ident()?;
                    labels.push((label, span));
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBrace, "`}`")?;
            Some(labels)
        } else {
            None
        };

        let body = self.parse_block_expr()?;
        let end = body.span();
        Ok(FuncDecl {
            name,
            params,
            return_type,
            effects,
            body,
            exported,
            span: start.merge(end),
        })
    }

    fn parse_type_def(&mut self, exported: bool) -> PResult<TypeDef> {
        let start = self.peek_span();
        self.expect(&TokenKind::KwType, "`type`")?;
        let (name, _) = self.expect_ident()?;
        let mut type_params = Vec::new();
        if self.eat(&TokenKind::LBracket) {
            if !self.at(&TokenKind::RBracket) {
                loop {
                    let (p, _) = self.expect_ident()?;
                    type_params.push(p);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBracket, "`]`")?;
        }
        self.expect(&TokenKind::Eq, "`=`")?;

        let mut ctors = Vec::new();
        loop {
            let ctor_start = self.peek_span();
            let (cname, _) = self.expect_ident()?;
            let mut fields = Vec::new();
            if self.eat(&TokenKind::LParen) {
                if !self.at(&TokenKind::RParen) {
                    loop {
                        fields.push(self.parse_type_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RParen, "`)`")?;
            }
            let ctor_end = self.peek_span();
            ctors.push(CtorDef {
                name: cname,
                fields,
                span: ctor_start.merge(ctor_end),
            });
            if !self.eat(&TokenKind::Pipe) {
                break;
            }
        }
        let end = self.peek_span();
        Ok(TypeDef {
            name,
            type_params,
            ctors,
            exported,
            span: start.merge(end),
        })
    }

    fn parse_top_level_let(&mut self, exported: bool) -> PResult<TopLevelLet> {
        let start = self.peek_span();
        self.expect(&TokenKind::KwLet, "`let`")?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::Eq, "`=`")?;
        let value = self.parse_expr()?;
        self.eat(&TokenKind::Semi);
        let end = value.span();
        Ok(TopLevelLet {
            name,
            value,
            exported,
            span: start.merge(end),
        })
    }

    // ── Types ────────────────────────────────────────────────────────────

    fn parse_type_expr(&mut self) -> PResult<TypeExpr> {
        if self.eat(&TokenKind::LParen) {
            if self.eat(&TokenKind::RParen) {
                return Ok(TypeExpr::Unit);
            }
            let mut elems = vec![self.parse_type_expr()?];
            let mut is_tuple = false;
            while self.eat(&TokenKind::Comma) {
                is_tuple = true;
                elems.push(self.parse_type_expr()?);
            }
            self.expect(&TokenKind::RParen, "`)`")?;
            if self.eat(&TokenKind::Arrow) {
                let ret = Box::new(self.parse_type_expr()?);
                let effects = if self.eat(&TokenKind::Bang) {
                    self.expect(&TokenKind::LBrace, "`{`")?;
                    let mut labels = Vec::new();
                    if !self.at(&TokenKind::RBrace) {
                        loop {
                            let (l, _) = self.expect_ident()?;
                            labels.push(l);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RBrace, "`}`")?;
                    labels
                } else {
                    Vec::new()
                };
                return Ok(TypeExpr::Fun(elems, ret, effects));
            }
            if is_tuple {
                return Ok(TypeExpr::Tuple(elems));
            }
            return Ok(elems.into_iter().next().unwrap());
        }
        let (name, _) = self.expect_ident()?;
        if self.eat(&TokenKind::LBracket) {
            let mut args = Vec::new();
            if !self.at(&TokenKind::RBracket) {
                loop {
                    args.push(self.parse_type_expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBracket, "`]`")?;
            return Ok(TypeExpr::App(name, args));
        }
        if name.chars().next().map(|c| c.is_lowercase()).unwrap_or(false) {
            Ok(TypeExpr::Var(name))
        } else {
            Ok(TypeExpr::Con(name))
        }
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn parse_block_expr(&mut self) -> PResult<Expr> {
        if self.at(&TokenKind::LBrace) {
            self.parse_block()
        } else {
            self.parse_expr()
        }
    }

    fn parse_block(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::KwLet) {
                let let_start = self.peek_span();
                self.bump();
                let (name, _) = self.expect_ident()?;
                self.expect(&TokenKind::Eq, "`=`")?;
                let value = self.parse_expr()?;
                self.expect(&TokenKind::Semi, "`;`")?;
                let end = value.span();
                stmts.push(Expr::Let {
                    name,
                    value: Box::new(value),
                    body: None,
                    span: let_start.merge(end),
                });
            } else {
                let e = self.parse_expr()?;
                self.eat(&TokenKind::Semi);
                stmts.push(e);
            }
        }
        let end = self.peek_span();
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Expr::Block(stmts, start.merge(end)))
    }

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_binary(0)
    }

    fn binop_for(kind: &TokenKind) -> Option<(BinOp, u8)> {
        use TokenKind::*;
        Some(match kind {
            OrOr => (BinOp::Or, 1),
            AndAnd => (BinOp::And, 2),
            EqEq => (BinOp::Eq, 3),
            NotEq => (BinOp::Ne, 3),
            Lt => (BinOp::Lt, 4),
            Le => (BinOp::Le, 4),
            Gt => (BinOp::Gt, 4),
            Ge => (BinOp::Ge, 4),
            PlusPlus => (BinOp::Concat, 5),
            Plus => (BinOp::Add, 5),
            Minus => (BinOp::Sub, 5),
            Star => (BinOp::Mul, 6),
            Slash => (BinOp::Div, 6),
            Percent => (BinOp::Mod, 6),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_bp: u8) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, bp)) = Self::binop_for(self.peek()) {
            if bp < min_bp {
                break;
            }
            let op_span = self.peek_span();
            self.bump();
            let rhs = self.parse_binary(bp + 1)?;
            let span = lhs.span().merge(rhs.span()).merge(op_span);
            lhs = Expr::BinOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        if self.eat(&TokenKind::Minus) {
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span());
            return Ok(Expr::UnOp {
                op: UnOp::Neg,
                operand: Box::new(operand),
                span,
            });
        }
        if self.eat(&TokenKind::KwNot) {
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span());
            return Ok(Expr::UnOp {
                op: UnOp::Not,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.at(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.peek_span();
                    self.expect(&TokenKind::RParen, "`)`")?;
                    let span = expr.span().merge(end);
                    expr = Expr::App {
                        func: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.bump();
                    let (field, fspan) = self.expect_ident()?;
                    let span = expr.span().merge(fspan);
                    expr = Expr::FieldAccess {
                        record: Box::new(expr),
                        field,
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.bump();
                Ok(Expr::Lit(Literal::Int(n), start))
            }
            TokenKind::Float(n) => {
                self.bump();
                Ok(Expr::Lit(Literal::Float(n), start))
            }
            TokenKind::Str(s) => {
                self.bump();
                Ok(Expr::Lit(Literal::Str(s), start))
            }
            TokenKind::KwTrue => {
                self.bump();
                Ok(Expr::Lit(Literal::Bool(true), start))
            }
            TokenKind::KwFalse => {
                self.bump();
                Ok(Expr::Lit(Literal::Bool(false), start))
            }
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Expr::Var(name, start))
            }
            TokenKind::Backslash => self.parse_lambda(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwLet => self.parse_let_in(),
            TokenKind::KwMatch => self.parse_match(),
            TokenKind::LBrace => self.parse_record_or_block(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LParen => self.parse_paren_or_tuple_or_unit(),
            other => Err(ParseError::new(
                format!("expected an expression, found {other:?}"),
                start,
            )),
        }
    }

    fn parse_lambda(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::Backslash, "`\\`")?;
        let mut params = Vec::new();
        loop {
            let (p, _) = self.expect_ident()?;
            params.push(p);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Dot, "`.`")?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span());
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
            span,
        })
    }

    fn parse_if(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::KwIf, "`if`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::KwThen, "`then`")?;
        let then_branch = self.parse_expr()?;
        self.expect(&TokenKind::KwElse, "`else`")?;
        let else_branch = self.parse_expr()?;
        let span = start.merge(else_branch.span());
        Ok(Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            span,
        })
    }

    fn parse_let_in(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::KwLet, "`let`")?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::Eq, "`=`")?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::KwIn, "`in`")?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span());
        Ok(Expr::Let {
            name,
            value: Box::new(value),
            body: Some(Box::new(body)),
            span,
        })
    }

    fn parse_match(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::KwMatch, "`match`")?;
        let scrutinee = self.parse_expr()?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut arms = Vec::new();
        if !self.at(&TokenKind::RBrace) {
            loop {
                let arm_start = self.peek_span();
                let pattern = self.parse_pattern()?;
                let guard = if self.eat(&TokenKind::KwIf) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(&TokenKind::FatArrow, "`=>`")?;
                let body = self.parse_expr()?;
                let span = arm_start.merge(body.span());
                arms.push(MatchArm {
                    pattern,
                    guard,
                    body,
                    span,
                });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.peek_span();
        self.expect(&TokenKind::RBrace, "`}`")?;
        let span = start.merge(end);
        Ok(Expr::Match {
            scrutinee: Box::new(scrutinee),
            arms,
            span,
        })
    }

    fn parse_record_or_block(&mut self) -> PResult<Expr> {
        // Disambiguate `{ f: v, ... }` (record) from `{ e1; e2 }` (block)
        // by looking ahead for `ident :` immediately after `{`.
        let first = self.tokens.get(self.pos + 1).map(|t| &t.kind);
        let second = self.tokens.get(self.pos + 2).map(|t| &t.kind);
        if let (Some(TokenKind::Ident(_)), Some(TokenKind::Colon)) = (first, second) {
            return self.parse_record();
        }
        self.parse_block()
    }

    fn parse_record(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        if !self.at(&TokenKind::RBrace) {
            loop {
                let (name, _) = self.expect_ident()?;
                self.expect(&TokenKind::Colon, "`:`")?;
                let value = self.parse_expr()?;
                fields.push((name, value));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.peek_span();
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Expr::Record(fields, start.merge(end)))
    }

    fn parse_list(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::LBracket, "`[`")?;
        let mut elements = Vec::new();
        if !self.at(&TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.peek_span();
        self.expect(&TokenKind::RBracket, "`]`")?;
        Ok(Expr::List(elements, start.merge(end)))
    }

    fn parse_paren_or_tuple_or_unit(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        self.expect(&TokenKind::LParen, "`(`")?;
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::Lit(Literal::Unit, start));
        }
        let first = self.parse_expr()?;
        if self.eat(&TokenKind::Comma) {
            let mut elems = vec![first];
            if !self.at(&TokenKind::RParen) {
                loop {
                    elems.push(self.parse_expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            let end = self.peek_span();
            self.expect(&TokenKind::RParen, "`)`")?;
            return Ok(Expr::Tuple(elems, start.merge(end)));
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(first)
    }

    // ── Patterns ─────────────────────────────────────────────────────────

    fn parse_pattern(&mut self) -> PResult<Pattern> {
        let start = self.peek_span();
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.bump();
                Ok(Pattern::Literal(Literal::Int(n), start))
            }
            TokenKind::Float(n) => {
                self.bump();
                Ok(Pattern::Literal(Literal::Float(n), start))
            }
            TokenKind::Str(s) => {
                self.bump();
                Ok(Pattern::Literal(Literal::Str(s), start))
            }
            TokenKind::KwTrue => {
                self.bump();
                Ok(Pattern::Literal(Literal::Bool(true), start))
            }
            TokenKind::KwFalse => {
                self.bump();
                Ok(Pattern::Literal(Literal::Bool(false), start))
            }
            TokenKind::Ident(name) => {
                self.bump();
                if name == "_" {
                    return Ok(Pattern::Wildcard(start));
                }
                if self.at(&TokenKind::LParen) {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.at(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_pattern()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.peek_span();
                    self.expect(&TokenKind::RParen, "`)`")?;
                    return Ok(Pattern::Constructor {
                        name,
                        args,
                        span: start.merge(end),
                    });
                }
                if name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                    Ok(Pattern::Constructor {
                        name,
                        args: Vec::new(),
                        span: start,
                    })
                } else {
                    Ok(Pattern::Var(name, start))
                }
            }
            TokenKind::LParen => {
                self.bump();
                let mut elems = Vec::new();
                if !self.at(&TokenKind::RParen) {
                    loop {
                        elems.push(self.parse_pattern()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.peek_span();
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(Pattern::Tuple(elems, start.merge(end)))
            }
            TokenKind::LBracket => self.parse_list_pattern(),
            other => Err(ParseError::new(
                format!("expected a pattern, found {other:?}"),
                start,
            )),
        }
    }

    fn parse_list_pattern(&mut self) -> PResult<Pattern> {
        let start = self.peek_span();
        self.expect(&TokenKind::LBracket, "`[`")?;
        let mut elements = Vec::new();
        let mut tail = None;
        if !self.at(&TokenKind::RBracket) {
            loop {
                if self.eat(&TokenKind::DotDotDot) {
                    let (name, span) = self.expect_ident()?;
                    tail = Some(Box::new(Pattern::Var(name, span)));
                    break;
                }
                elements.push(self.parse_pattern()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.peek_span();
        self.expect(&TokenKind::RBracket, "`]`")?;
        Ok(Pattern::List {
            elements,
            tail,
            span: start.merge(end),
        })
    }
}

/// Parse a complete source file. Syntax errors and internal panics (fuzz
/// safety, §7) are both surfaced as a single `ParseError`.
pub fn parse(src: &str) -> PResult<SourceFile> {
    tracing::debug!(bytes = src.len(), "parsing source");
    let result = std::panic::catch_unwind(|| {
        let tokens = crate::lexer::lex(src)?;
        Parser::new(tokens).parse_source_file()
    });
    match result {
        Ok(inner) => inner,
        Err(_) => Err(ParseError::internal("internal parser error")),
    }
}
