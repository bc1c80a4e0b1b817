//! The surface AST the Elaborator consumes (§3.2, §6.2).
//!
//! Deliberately a plain data structure, not a CST -- the real lexer/parser
//! (with full error recovery, incremental reparsing, editor services) is
//! out of this core's scope; this is the minimal shape that lets the
//! Elaborator be exercised from real source text.

use ailang_common::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub module: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub module_path: String,
    /// `Some(names)` for selective `import P (n1, n2)`; `None` for a bare
    /// `import P` namespace import, which the loader rejects as `IMP012`.
    pub names: Option<Vec<String>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Func(FuncDecl),
    TypeDef(TypeDef),
    Let(TopLevelLet),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    /// Raw effect-annotation labels exactly as written, pre-validation
    /// (§4.2: validated against the canonical set by the Elaborator).
    pub effects: Option<Vec<(String, Span)>>,
    pub body: Expr,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub type_params: Vec<String>,
    pub ctors: Vec<CtorDef>,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CtorDef {
    pub name: String,
    pub fields: Vec<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelLet {
    pub name: String,
    pub value: Expr,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Con(String),
    Var(String),
    App(String, Vec<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    Fun(Vec<TypeExpr>, Box<TypeExpr>, Vec<String>),
    Unit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Unit,
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Concat, // ++
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Literal, Span),
    Var(String, Span),
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
        span: Span,
    },
    App {
        func: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    UnOp {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        span: Span,
    },
    /// `let x = v in e` or a `let x = v;` statement inside a block (in
    /// which case `body` is `None` and the desugarer supplies the tail).
    Let {
        name: String,
        value: Box<Expr>,
        body: Option<Box<Expr>>,
        span: Span,
    },
    /// `{ e1; e2; ...; eN }` -- a sequence of statements with the last
    /// expression as the block's value.
    Block(Vec<Expr>, Span),
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
        span: Span,
    },
    Tuple(Vec<Expr>, Span),
    List(Vec<Expr>, Span),
    Record(Vec<(String, Expr)>, Span),
    FieldAccess {
        record: Box<Expr>,
        field: String,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit(_, s)
            | Expr::Var(_, s)
            | Expr::Lambda { span: s, .. }
            | Expr::App { span: s, .. }
            | Expr::BinOp { span: s, .. }
            | Expr::UnOp { span: s, .. }
            | Expr::If { span: s, .. }
            | Expr::Let { span: s, .. }
            | Expr::Block(_, s)
            | Expr::Match { span: s, .. }
            | Expr::Tuple(_, s)
            | Expr::List(_, s)
            | Expr::Record(_, s)
            | Expr::FieldAccess { span: s, .. } => *s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Literal(Literal, Span),
    Var(String, Span),
    Wildcard(Span),
    Constructor {
        name: String,
        args: Vec<Pattern>,
        span: Span,
    },
    Tuple(Vec<Pattern>, Span),
    List {
        elements: Vec<Pattern>,
        tail: Option<Box<Pattern>>,
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Literal(_, s)
            | Pattern::Var(_, s)
            | Pattern::Wildcard(s)
            | Pattern::Constructor { span: s, .. }
            | Pattern::Tuple(_, s)
            | Pattern::List { span: s, .. } => *s,
        }
    }

    /// Every variable name bound by this pattern (used to detect duplicate
    /// bindings within one arm, §3.3, and to check or-pattern binding-set
    /// equality).
    pub fn bound_vars(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Var(name, _) => out.push(name.clone()),
            Pattern::Constructor { args, .. } => {
                for a in args {
                    a.bound_vars(out);
                }
            }
            Pattern::Tuple(elems, _) => {
                for e in elems {
                    e.bound_vars(out);
                }
            }
            Pattern::List { elements, tail, .. } => {
                for e in elements {
                    e.bound_vars(out);
                }
                if let Some(t) = tail {
                    t.bound_vars(out);
                }
            }
            Pattern::Literal(..) | Pattern::Wildcard(_) => {}
        }
    }
}
