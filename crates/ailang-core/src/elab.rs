//! The Elaborator: Surface AST -> Core ANF IR (§4.2).
//!
//! Responsibilities: ANF normalization (hoist non-atomic arguments into
//! fresh `Let`s), desugaring (operators -> `Intrinsic`, blocks -> nested
//! `Let`s), constructor-call rewriting, effect-annotation validation, and
//! non-fatal exhaustiveness warnings.

use ailang_common::{effects, EffectRow, Span};
use rustc_hash::FxHashMap;

use ailang_syntax::ast as sx;

use crate::error::{ElabError, ElabWarning};
use crate::ir::*;

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub arity: usize,
    pub ctors: Vec<String>,
}

pub struct ElabResult {
    pub program: Program,
    pub ctors: FxHashMap<String, CtorInfo>,
    pub types: FxHashMap<String, TypeInfo>,
    pub errors: Vec<ElabError>,
    pub warnings: Vec<ElabWarning>,
}

pub struct Elaborator {
    next_id: NodeId,
    tmp_counter: u32,
    ctors: FxHashMap<String, CtorInfo>,
    types: FxHashMap<String, TypeInfo>,
    errors: Vec<ElabError>,
    warnings: Vec<ElabWarning>,
}

impl Elaborator {
    pub fn new() -> Self {
        Elaborator {
            next_id: 0,
            tmp_counter: 0,
            ctors: FxHashMap::default(),
            types: FxHashMap::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn fresh_tmp(&mut self) -> String {
        let name = format!("_tmp_{}", self.tmp_counter);
        self.tmp_counter += 1;
        name
    }

    pub fn elaborate(mut self, file: &sx::SourceFile) -> ElabResult {
        self.register_types(file);

        let mut program = Program::default();
        for decl in &file.decls {
            match decl {
                sx::Decl::TypeDef(def) => {
                    program.types.push(TypeDefCore {
                        name: def.name.clone(),
                        type_params: def.type_params.clone(),
                        ctors: def.ctors.iter().map(|c| c.name.clone()).collect(),
                        exported: def.exported,
                        span: def.span,
                    });
                }
                sx::Decl::Func(f) => {
                    let declared_effects = self.elaborate_effects(f.effects.as_ref());
                    let body = self.desugar_expr(&f.body);
                    program.funcs.push(FuncDef {
                        name: f.name.clone(),
                        params: f.params.iter().map(|p| p.name.clone()).collect(),
                        body,
                        declared_effects,
                        exported: f.exported,
                        span: f.span,
                    });
                }
                sx::Decl::Let(l) => {
                    let value = self.desugar_expr(&l.value);
                    program.lets.push((l.name.clone(), value, l.exported));
                }
            }
        }

        ElabResult {
            program,
            ctors: self.ctors,
            types: self.types,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn register_types(&mut self, file: &sx::SourceFile) {
        for decl in &file.decls {
            if let sx::Decl::TypeDef(def) = decl {
                let ctor_names: Vec<String> = def.ctors.iter().map(|c| c.name.clone()).collect();
                self.types.insert(
                    def.name.clone(),
                    TypeInfo {
                        arity: def.type_params.len(),
                        ctors: ctor_names,
                    },
                );
                for ctor in &def.ctors {
                    self.ctors.insert(
                        ctor.name.clone(),
                        CtorInfo {
                            type_name: def.name.clone(),
                            ctor_name: ctor.name.clone(),
                            field_arity: ctor.fields.len(),
                            span: ctor.span,
                        },
                    );
                }
            }
        }
    }

    /// Validate and normalize an effect annotation (§4.2): duplicates
    /// rejected (`PAR_EFF001_DUP`), unknown labels rejected with a
    /// suggestion (`PAR_EFF002_UNKNOWN`), result sorted (label-set, §3.5
    /// invariant 5).
    fn elaborate_effects(&mut self, raw: Option<&Vec<(String, Span)>>) -> Option<EffectRow> {
        let raw = raw?;
        let mut seen = std::collections::HashSet::new();
        let mut row = EffectRow::pure();
        for (label, span) in raw {
            if !seen.insert(label.clone()) {
                self.errors.push(ElabError::DuplicateEffect {
                    label: label.clone(),
                    span: *span,
                });
                continue;
            }
            if !effects::is_canonical_effect(label) {
                self.errors.push(ElabError::UnknownEffect {
                    label: label.clone(),
                    suggestion: effects::suggest_effect(label),
                    span: *span,
                });
                continue;
            }
            row.insert(label.clone());
        }
        Some(row)
    }

    // ── ANF desugaring ───────────────────────────────────────────────────

    fn desugar_expr(&mut self, e: &sx::Expr) -> Expr {
        match e {
            sx::Expr::Lit(lit, span) => Expr::Lit {
                id: self.fresh_id(),
                value: lower_lit(lit),
                span: *span,
            },
            sx::Expr::Var(name, span) => self.desugar_var(name, *span),
            sx::Expr::Lambda { params, body, span } => {
                let body = Box::new(self.desugar_expr(body));
                Expr::Lambda {
                    id: self.fresh_id(),
                    params: params.clone(),
                    body,
                    declared_effects: None,
                    span: *span,
                }
            }
            sx::Expr::App { func, args, span } => self.desugar_app(func, args, *span),
            sx::Expr::BinOp { op, lhs, rhs, span } => self.desugar_binop(*op, lhs, rhs, *span),
            sx::Expr::UnOp { op, operand, span } => self.desugar_unop(*op, operand, *span),
            sx::Expr::If { cond, then_branch, else_branch, span } => {
                let cond_core = self.desugar_expr(cond);
                let mut binds = Vec::new();
                let cond_atom = self.atomize(cond_core, &mut binds);
                let then_branch = Box::new(self.desugar_expr(then_branch));
                let else_branch = Box::new(self.desugar_expr(else_branch));
                let node = Expr::If {
                    id: self.fresh_id(),
                    cond: Box::new(cond_atom),
                    then_branch,
                    else_branch,
                    span: *span,
                };
                self.wrap_lets(binds, node)
            }
            sx::Expr::Let { name, value, body, span } => {
                let value = Box::new(self.desugar_expr(value));
                let body = match body {
                    Some(b) => Box::new(self.desugar_expr(b)),
                    // Bare `let x = v;` with no following tail desugars to
                    // `Let(x, v, Unit)` (§4.2).
                    None => Box::new(Expr::Lit {
                        id: self.fresh_id(),
                        value: LitValue::Unit,
                        span: *span,
                    }),
                };
                Expr::Let {
                    id: self.fresh_id(),
                    name: name.clone(),
                    value,
                    body,
                    span: *span,
                }
            }
            sx::Expr::Block(stmts, span) => self.desugar_block(stmts, *span),
            sx::Expr::Match { scrutinee, arms, span } => self.desugar_match(scrutinee, arms, *span),
            sx::Expr::Tuple(elems, span) => self.desugar_list_like(elems, *span, |id, elements, span| {
                Expr::Tuple { id, elements, span }
            }),
            sx::Expr::List(elems, span) => self.desugar_list_like(elems, *span, |id, elements, span| {
                Expr::List { id, elements, span }
            }),
            sx::Expr::Record(fields, span) => {
                let mut binds = Vec::new();
                let mut out_fields = Vec::new();
                for (name, value) in fields {
                    let core = self.desugar_expr(value);
                    let atom = self.atomize(core, &mut binds);
                    out_fields.push((name.clone(), atom));
                }
                let node = Expr::Record {
                    id: self.fresh_id(),
                    fields: out_fields,
                    span: *span,
                };
                self.wrap_lets(binds, node)
            }
            sx::Expr::FieldAccess { record, field, span } => {
                let core = self.desugar_expr(record);
                let mut binds = Vec::new();
                let atom = self.atomize(core, &mut binds);
                let node = Expr::RecordAccess {
                    id: self.fresh_id(),
                    record: Box::new(atom),
                    field: field.clone(),
                    span: *span,
                };
                self.wrap_lets(binds, node)
            }
        }
    }

    /// A bare identifier that names a known nullary constructor becomes a
    /// `VarGlobal("$adt", "make_Type_C")` *value* (not an application,
    /// §4.2). Any other identifier is a plain `Var`.
    fn desugar_var(&mut self, name: &str, span: Span) -> Expr {
        if let Some(info) = self.ctors.get(name) {
            if info.field_arity == 0 {
                return Expr::VarGlobal {
                    id: self.fresh_id(),
                    module: "$adt".to_string(),
                    name: format!("make_{}_{}", info.type_name, info.ctor_name),
                    span,
                };
            }
        }
        Expr::Var {
            id: self.fresh_id(),
            name: name.to_string(),
            span,
        }
    }

    fn desugar_app(&mut self, func: &sx::Expr, args: &[sx::Expr], span: Span) -> Expr {
        // `C(a1, ...)` where `C` is a known constructor becomes
        // `App(VarGlobal("$adt", "make_Type_C"), [a1, ...])` (§4.2).
        if let sx::Expr::Var(name, vspan) = func {
            if let Some(info) = self.ctors.get(name).cloned() {
                let callee = Expr::VarGlobal {
                    id: self.fresh_id(),
                    module: "$adt".to_string(),
                    name: format!("make_{}_{}", info.type_name, info.ctor_name),
                    span: *vspan,
                };
                return self.finish_app(callee, args, span);
            }
        }
        let func_core = self.desugar_expr(func);
        self.finish_app(func_core, args, span)
    }

    fn finish_app(&mut self, func: Expr, args: &[sx::Expr], span: Span) -> Expr {
        let mut binds = Vec::new();
        let func_atom = self.atomize(func, &mut binds);
        let mut arg_atoms = Vec::new();
        for a in args {
            let core = self.desugar_expr(a);
            arg_atoms.push(self.atomize(core, &mut binds));
        }
        let node = Expr::App {
            id: self.fresh_id(),
            func: Box::new(func_atom),
            args: arg_atoms,
            span,
        };
        self.wrap_lets(binds, node)
    }

    fn desugar_binop(&mut self, op: sx::BinOp, lhs: &sx::Expr, rhs: &sx::Expr, span: Span) -> Expr {
        // Short-circuiting `&&`/`||` desugar directly to `If` so that the
        // right-hand side is genuinely not evaluated when short-circuited
        // -- this is stronger than the generic ANF atom-hoisting rule,
        // which would force both sides eagerly. The `Resolver`'s
        // `Intrinsic{And/Or}` rewrite (§4.4) still exists for any such
        // node constructed directly (e.g. by a hand-built test fixture);
        // the elaborator simply never emits one.
        match op {
            sx::BinOp::And => {
                let cond_core = self.desugar_expr(lhs);
                let mut binds = Vec::new();
                let cond_atom = self.atomize(cond_core, &mut binds);
                let then_branch = Box::new(self.desugar_expr(rhs));
                let else_branch = Box::new(Expr::Lit {
                    id: self.fresh_id(),
                    value: LitValue::Bool(false),
                    span,
                });
                let node = Expr::If {
                    id: self.fresh_id(),
                    cond: Box::new(cond_atom),
                    then_branch,
                    else_branch,
                    span,
                };
                return self.wrap_lets(binds, node);
            }
            sx::BinOp::Or => {
                let cond_core = self.desugar_expr(lhs);
                let mut binds = Vec::new();
                let cond_atom = self.atomize(cond_core, &mut binds);
                let then_branch = Box::new(Expr::Lit {
                    id: self.fresh_id(),
                    value: LitValue::Bool(true),
                    span,
                });
                let else_branch = Box::new(self.desugar_expr(rhs));
                let node = Expr::If {
                    id: self.fresh_id(),
                    cond: Box::new(cond_atom),
                    then_branch,
                    else_branch,
                    span,
                };
                return self.wrap_lets(binds, node);
            }
            _ => {}
        }
        let op_kind = lower_binop(op);
        let lhs_core = self.desugar_expr(lhs);
        let rhs_core = self.desugar_expr(rhs);
        let mut binds = Vec::new();
        let lhs_atom = self.atomize(lhs_core, &mut binds);
        let rhs_atom = self.atomize(rhs_core, &mut binds);
        let node = Expr::Intrinsic {
            id: self.fresh_id(),
            op: op_kind,
            args: vec![lhs_atom, rhs_atom],
            span,
        };
        self.wrap_lets(binds, node)
    }

    fn desugar_unop(&mut self, op: sx::UnOp, operand: &sx::Expr, span: Span) -> Expr {
        let op_kind = match op {
            sx::UnOp::Neg => IntrinsicOp::Neg,
            sx::UnOp::Not => IntrinsicOp::Not,
        };
        let operand_core = self.desugar_expr(operand);
        let mut binds = Vec::new();
        let atom = self.atomize(operand_core, &mut binds);
        let node = Expr::Intrinsic {
            id: self.fresh_id(),
            op: op_kind,
            args: vec![atom],
            span,
        };
        self.wrap_lets(binds, node)
    }

    /// `{ e1; e2; ...; eN }` lowers to nested `Let`s (§4.2): a bare
    /// non-binding statement with more statements after it is sequenced via
    /// a `Let` that discards its value under a fresh temporary; the final
    /// statement is the block's value.
    fn desugar_block(&mut self, stmts: &[sx::Expr], span: Span) -> Expr {
        if stmts.is_empty() {
            return Expr::Lit {
                id: self.fresh_id(),
                value: LitValue::Unit,
                span,
            };
        }
        let mut iter = stmts.iter().rev();
        let mut acc = self.desugar_expr(iter.next().unwrap());
        for stmt in iter {
            match stmt {
                sx::Expr::Let { name, value, body: None, span: let_span } => {
                    let value = Box::new(self.desugar_expr(value));
                    acc = Expr::Let {
                        id: self.fresh_id(),
                        name: name.clone(),
                        value,
                        body: Box::new(acc),
                        span: *let_span,
                    };
                }
                other => {
                    let value = Box::new(self.desugar_expr(other));
                    let name = self.fresh_tmp();
                    let s = other.span();
                    acc = Expr::Let {
                        id: self.fresh_id(),
                        name,
                        value,
                        body: Box::new(acc),
                        span: s,
                    };
                }
            }
        }
        acc
    }

    fn desugar_match(&mut self, scrutinee: &sx::Expr, arms: &[sx::MatchArm], span: Span) -> Expr {
        let scrut_core = self.desugar_expr(scrutinee);
        let mut binds = Vec::new();
        let scrut_atom = self.atomize(scrut_core, &mut binds);

        let mut core_arms = Vec::new();
        for arm in arms {
            let pattern = self.desugar_pattern(&arm.pattern);
            let mut bindings = Vec::new();
            pattern_bound_vars(&pattern, &mut bindings);
            self.check_duplicate_bindings(&arm.pattern);
            let guard = arm.guard.as_ref().map(|g| self.desugar_expr(g));
            let body = self.desugar_expr(&arm.body);
            core_arms.push(MatchArm {
                pattern,
                guard,
                body,
                bindings,
                span: arm.span,
            });
        }

        self.check_exhaustiveness(scrutinee, &core_arms, span);

        let node = Expr::Match {
            id: self.fresh_id(),
            scrutinee: Box::new(scrut_atom),
            arms: core_arms,
            exhaustive: true, // overwritten by check_exhaustiveness if not
            span,
        };
        self.wrap_lets(binds, node)
    }

    fn check_duplicate_bindings(&mut self, pattern: &sx::Pattern) {
        let mut vars = Vec::new();
        pattern.bound_vars(&mut vars);
        let mut seen = std::collections::HashSet::new();
        for (i, name) in vars.iter().enumerate() {
            if !seen.insert(name.clone()) {
                self.errors.push(ElabError::DuplicateBinding {
                    name: name.clone(),
                    span: pattern.span(),
                });
            }
            let _ = i;
        }
    }

    /// Conservative, warning-only exhaustiveness check (§4.2, §9): for an
    /// ADT scrutinee, missing constructor shapes produce
    /// `PAT_NONEXHAUSTIVE`. Open domains (no statically known constructor
    /// set -- ints, strings, tuples, lists) require a wildcard/var arm.
    fn check_exhaustiveness(&mut self, _scrutinee: &sx::Expr, arms: &[MatchArm], span: Span) {
        let has_catch_all = arms
            .iter()
            .any(|a| matches!(a.pattern, Pattern::Var(_) | Pattern::Wildcard) && a.guard.is_none());
        if has_catch_all {
            return;
        }

        // If every arm is a constructor pattern and they're all drawn from
        // one known ADT, check which named constructors are missing.
        let covered: Vec<&str> = arms
            .iter()
            .filter_map(|a| match &a.pattern {
                Pattern::Constructor { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        if covered.len() != arms.len() || covered.is_empty() {
            // Mixed pattern shapes or an open-domain scrutinee (list/tuple/
            // literal) with no wildcard: conservatively warn with no
            // concrete missing list.
            self.warnings.push(ElabWarning::NonExhaustiveMatch {
                missing: vec!["_".to_string()],
                span,
            });
            return;
        }
        let Some(type_info) = covered
            .first()
            .and_then(|name| self.ctors.get(*name))
            .and_then(|info| self.types.get(&info.type_name).cloned())
        else {
            return;
        };
        let missing: Vec<String> = type_info
            .ctors
            .iter()
            .filter(|c| !covered.contains(&c.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            self.warnings.push(ElabWarning::NonExhaustiveMatch { missing, span });
        }
    }

    fn desugar_pattern(&mut self, p: &sx::Pattern) -> Pattern {
        match p {
            sx::Pattern::Literal(lit, _) => Pattern::Literal(lower_lit(lit)),
            sx::Pattern::Var(name, _) => Pattern::Var(name.clone()),
            sx::Pattern::Wildcard(_) => Pattern::Wildcard,
            sx::Pattern::Constructor { name, args, .. } => Pattern::Constructor {
                name: name.clone(),
                args: args.iter().map(|a| self.desugar_pattern(a)).collect(),
            },
            sx::Pattern::Tuple(elems, _) => {
                Pattern::Tuple(elems.iter().map(|e| self.desugar_pattern(e)).collect())
            }
            sx::Pattern::List { elements, tail, .. } => Pattern::List {
                elements: elements.iter().map(|e| self.desugar_pattern(e)).collect(),
                tail: tail.as_ref().map(|t| Box::new(self.desugar_pattern(t))),
            },
        }
    }

    fn desugar_list_like(
        &mut self,
        elems: &[sx::Expr],
        span: Span,
        build: impl FnOnce(NodeId, Vec<Expr>, Span) -> Expr,
    ) -> Expr {
        let mut binds = Vec::new();
        let mut atoms = Vec::new();
        for e in elems {
            let core = self.desugar_expr(e);
            atoms.push(self.atomize(core, &mut binds));
        }
        let node = build(self.fresh_id(), atoms, span);
        self.wrap_lets(binds, node)
    }

    /// Ensure `e` is an atom, hoisting it into a fresh `Let` binding
    /// (recorded in `binds`) if it isn't (§3.2, §8.1 invariant 1).
    fn atomize(&mut self, e: Expr, binds: &mut Vec<(String, Expr)>) -> Expr {
        if e.is_atom() {
            return e;
        }
        let span = e.span();
        let name = self.fresh_tmp();
        binds.push((name.clone(), e));
        Expr::Var {
            id: self.fresh_id(),
            name,
            span,
        }
    }

    fn wrap_lets(&mut self, binds: Vec<(String, Expr)>, body: Expr) -> Expr {
        let mut result = body;
        for (name, value) in binds.into_iter().rev() {
            let span = value.span();
            result = Expr::Let {
                id: self.fresh_id(),
                name,
                value: Box::new(value),
                body: Box::new(result),
                span,
            };
        }
        result
    }
}

impl Default for Elaborator {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern_bound_vars(p: &Pattern, out: &mut Vec<String>) {
    match p {
        Pattern::Var(name) => out.push(name.clone()),
        Pattern::Constructor { args, .. } => {
            for a in args {
                pattern_bound_vars(a, out);
            }
        }
        Pattern::Tuple(elems) => {
            for e in elems {
                pattern_bound_vars(e, out);
            }
        }
        Pattern::List { elements, tail } => {
            for e in elements {
                pattern_bound_vars(e, out);
            }
            if let Some(t) = tail {
                pattern_bound_vars(t, out);
            }
        }
        Pattern::Literal(_) | Pattern::Wildcard => {}
    }
}

fn lower_lit(lit: &sx::Literal) -> LitValue {
    match lit {
        sx::Literal::Int(n) => LitValue::Int(*n),
        sx::Literal::Float(n) => LitValue::Float(*n),
        sx::Literal::Str(s) => LitValue::Str(s.clone()),
        sx::Literal::Bool(b) => LitValue::Bool(*b),
        sx::Literal::Unit => LitValue::Unit,
    }
}

fn lower_binop(op: sx::BinOp) -> IntrinsicOp {
    match op {
        sx::BinOp::Add => IntrinsicOp::Add,
        sx::BinOp::Sub => IntrinsicOp::Sub,
        sx::BinOp::Mul => IntrinsicOp::Mul,
        sx::BinOp::Div => IntrinsicOp::Div,
        sx::BinOp::Mod => IntrinsicOp::Mod,
        sx::BinOp::Eq => IntrinsicOp::Eq,
        sx::BinOp::Ne => IntrinsicOp::Ne,
        sx::BinOp::Lt => IntrinsicOp::Lt,
        sx::BinOp::Le => IntrinsicOp::Le,
        sx::BinOp::Gt => IntrinsicOp::Gt,
        sx::BinOp::Ge => IntrinsicOp::Ge,
        sx::BinOp::Concat => IntrinsicOp::Concat,
        sx::BinOp::And | sx::BinOp::Or => unreachable!("handled directly in desugar_binop"),
    }
}

pub fn elaborate(file: &sx::SourceFile) -> ElabResult {
    tracing::debug!(module = file.module.as_deref().unwrap_or("<anonymous>"), decls = file.decls.len(), "elaborating to Core");
    Elaborator::new().elaborate(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elab_src(src: &str) -> ElabResult {
        let file = ailang_syntax::parse(src).expect("source parses");
        elaborate(&file)
    }

    fn assert_anf(e: &Expr) {
        match e {
            Expr::App { func, args, .. } => {
                assert!(func.is_atom(), "app callee must be an atom: {func:?}");
                for a in args {
                    assert!(a.is_atom(), "app argument must be an atom: {a:?}");
                }
            }
            Expr::Intrinsic { args, .. } => {
                for a in args {
                    assert!(a.is_atom(), "intrinsic argument must be an atom: {a:?}");
                }
            }
            _ => {}
        }
        walk(e, &mut |node| assert_anf(node));
    }

    fn walk(e: &Expr, f: &mut impl FnMut(&Expr)) {
        match e {
            Expr::Lambda { body, .. } => f(body),
            Expr::App { func, args, .. } => {
                f(func);
                for a in args {
                    f(a);
                }
            }
            Expr::Let { value, body, .. } => {
                f(value);
                f(body);
            }
            Expr::LetRec { bindings, body, .. } => {
                for (_, v) in bindings {
                    f(v);
                }
                f(body);
            }
            Expr::If { cond, then_branch, else_branch, .. } => {
                f(cond);
                f(then_branch);
                f(else_branch);
            }
            Expr::Match { scrutinee, arms, .. } => {
                f(scrutinee);
                for arm in arms {
                    if let Some(g) = &arm.guard {
                        f(g);
                    }
                    f(&arm.body);
                }
            }
            Expr::Intrinsic { args, .. } => {
                for a in args {
                    f(a);
                }
            }
            Expr::Record { fields, .. } => {
                for (_, v) in fields {
                    f(v);
                }
            }
            Expr::RecordAccess { record, .. } => f(record),
            Expr::List { elements, .. } | Expr::Tuple { elements, .. } => {
                for e in elements {
                    f(e);
                }
            }
            Expr::DictAbs { body, .. } => f(body),
            Expr::DictApp { func, dict, .. } => {
                f(func);
                f(dict);
            }
            Expr::Lit { .. } | Expr::Var { .. } | Expr::VarGlobal { .. } | Expr::DictRef { .. } => {}
        }
    }

    #[test]
    fn nested_calls_hoist_non_atomic_arguments() {
        let result = elab_src("func main() -> Int { f(g(1), 2) }");
        assert!(result.errors.is_empty());
        let body = &result.program.funcs[0].body;
        assert_anf(body);
        // The outer call's first argument must have been hoisted into a Let.
        assert!(matches!(body, Expr::Let { .. }));
    }

    #[test]
    fn and_desugars_to_if_without_forcing_rhs() {
        let result = elab_src("func main() -> Bool { false && sideEffect() }");
        assert!(result.errors.is_empty());
        let body = &result.program.funcs[0].body;
        assert!(matches!(body, Expr::If { .. }), "expected If, got {body:?}");
        if let Expr::If { else_branch, .. } = body {
            assert!(matches!(**else_branch, Expr::Lit { value: LitValue::Bool(false), .. }));
        }
    }

    #[test]
    fn or_desugars_to_if_with_true_then_branch() {
        let result = elab_src("func main() -> Bool { true || sideEffect() }");
        let body = &result.program.funcs[0].body;
        if let Expr::If { then_branch, .. } = body {
            assert!(matches!(**then_branch, Expr::Lit { value: LitValue::Bool(true), .. }));
        } else {
            panic!("expected If, got {body:?}");
        }
    }

    #[test]
    fn block_statements_desugar_to_nested_lets() {
        let result = elab_src("func main() -> Int { let x = 1; let y = 2; x }");
        let body = &result.program.funcs[0].body;
        match body {
            Expr::Let { name, body, .. } => {
                assert_eq!(name, "x");
                assert!(matches!(**body, Expr::Let { .. }));
            }
            other => panic!("expected nested Let, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_effect_label_is_an_error() {
        let result = elab_src("func main() -> () ! {IO, IO} { 0 }");
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ElabError::DuplicateEffect { label, .. } if label == "IO")));
    }

    #[test]
    fn unknown_effect_label_suggests_nearest_canonical_label() {
        let result = elab_src("func main() -> () ! {io} { 0 }");
        assert!(result.errors.iter().any(|e| matches!(
            e,
            ElabError::UnknownEffect { label, suggestion: Some("IO"), .. } if label == "io"
        )));
    }

    #[test]
    fn nullary_constructor_becomes_a_vars_global_value() {
        let result = elab_src(
            r#"
            type Option[a] = Some(a) | None
            func main() -> Option[Int] { None }
            "#,
        );
        assert!(result.errors.is_empty());
        let body = &result.program.funcs[0].body;
        assert!(matches!(
            body,
            Expr::VarGlobal { module, name, .. } if module == "$adt" && name == "make_Option_None"
        ));
    }

    #[test]
    fn constructor_application_rewrites_to_adt_make_call() {
        let result = elab_src(
            r#"
            type Option[a] = Some(a) | None
            func main() -> Option[Int] { Some(1) }
            "#,
        );
        let body = &result.program.funcs[0].body;
        match body {
            Expr::App { func, args, .. } => {
                assert!(matches!(
                    **func,
                    Expr::VarGlobal { ref module, ref name, .. }
                        if module == "$adt" && name == "make_Option_Some"
                ));
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected App, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_pattern_binding_is_an_error() {
        let result = elab_src(
            r#"
            func main() -> Int {
                match (1, 2) {
                    (x, x) => x,
                    _ => 0,
                }
            }
            "#,
        );
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ElabError::DuplicateBinding { name, .. } if name == "x")));
    }

    #[test]
    fn non_exhaustive_match_over_known_adt_warns_with_missing_ctor() {
        let result = elab_src(
            r#"
            type Option[a] = Some(a) | None
            func main() -> Int {
                match Some(1) {
                    Some(n) => n,
                }
            }
            "#,
        );
        assert!(result.warnings.iter().any(|w| matches!(
            w,
            ElabWarning::NonExhaustiveMatch { missing, .. } if missing == &vec!["None".to_string()]
        )));
    }

    #[test]
    fn match_with_wildcard_arm_is_not_flagged() {
        let result = elab_src(
            r#"
            type Option[a] = Some(a) | None
            func main() -> Int {
                match Some(1) {
                    Some(n) => n,
                    _ => 0,
                }
            }
            "#,
        );
        assert!(result.warnings.is_empty());
    }
}
