//! Algorithm W: Hindley-Milner type inference extended with row
//! polymorphism and class-constraint dictionary passing (§4.3).
//!
//! The nine extensions over vanilla Algorithm W described in §4.3:
//! 1. the environment is a stack of type schemes, not bare types;
//! 2. fresh variables are generated through `InferCtx` and substituted via
//!    the union-find table rather than an explicit substitution map;
//! 3. unification includes effect-row and record-row rules (`unify.rs`);
//! 4. application's effect is the union of the callee's row and its
//!    (atomic, so inherently pure) arguments' rows;
//! 5. let-generalization is restricted to syntactic values (the value
//!    restriction);
//! 6. class constraints ride along on schemes and are discharged through
//!    dictionary passing against `ClassRegistry`;
//! 7. unresolved `Num`/`Fractional` constraints default to `Int`/`Float`;
//! 8. patterns are typed structurally, including constructors resolved
//!    through `TypeResolver`;
//! 9. declared effect annotations are checked against the row actually
//!    collected while inferring a body.

use rustc_hash::FxHashMap;

use ailang_common::{EffectRow, Span};
use ailang_core::{Expr, FuncDef, LitValue, NodeId, Pattern, Program};

use crate::classes::ClassRegistry;
use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{ClassConstraint, RecordRow, Scheme, Ty, TyVar};
use crate::unify::InferCtx;

/// Resolves a name outside the current module: `$builtin`, `$adt`
/// constructor factories, and other module's exported values (§3.4, §4.5).
/// Implemented by the linker, which alone knows the full module graph.
pub trait TypeResolver {
    fn resolve_value(&self, module: &str, name: &str) -> Option<Scheme>;
    /// The scheme of the `make_<Type>_<Ctor>` factory for a bare
    /// constructor name, as seen from the current module's imports.
    fn resolve_ctor(&self, ctor_name: &str) -> Option<Scheme>;
}

/// A `TypeResolver` for a single, self-contained module: nothing is
/// reachable outside of it. Useful for unit tests and for inferring a
/// program in isolation before linking.
#[derive(Default)]
pub struct NoopResolver;

impl TypeResolver for NoopResolver {
    fn resolve_value(&self, _module: &str, _name: &str) -> Option<Scheme> {
        None
    }
    fn resolve_ctor(&self, _ctor_name: &str) -> Option<Scheme> {
        None
    }
}

#[derive(Default)]
struct Env {
    scopes: Vec<FxHashMap<String, Scheme>>,
}

impl Env {
    fn new() -> Self {
        Env { scopes: vec![FxHashMap::default()] }
    }

    fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn bind(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.scopes.last_mut().expect("at least one scope").insert(name.into(), scheme);
    }

    fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }
}

pub struct InferOutput {
    pub node_types: FxHashMap<NodeId, Ty>,
    pub func_schemes: FxHashMap<String, Scheme>,
    /// Top-level `let` bindings' own generalized schemes, mirroring
    /// `func_schemes` -- populated only for module-level `let`s, never for
    /// ones nested inside an expression.
    pub let_schemes: FxHashMap<String, Scheme>,
    pub errors: Vec<TypeError>,
    /// Every `Num`/`Fractional` constraint that point 7 defaulted instead of
    /// generalizing, keyed by the non-value let binding's own node id, in
    /// the order defaulting ran. Empty unless the program actually has
    /// value-restricted numeric lets left unconstrained.
    pub defaulted: Vec<(NodeId, String, Ty)>,
}

pub fn infer_program(program: &Program, resolver: &dyn TypeResolver, classes: &ClassRegistry) -> InferOutput {
    tracing::debug!(funcs = program.funcs.len(), lets = program.lets.len(), "running type inference");
    let mut inf = Inferencer::new(resolver, classes);
    inf.run(program);
    if !inf.ctx.errors.is_empty() {
        tracing::debug!(count = inf.ctx.errors.len(), "type inference produced errors");
    }
    InferOutput {
        node_types: inf.node_types,
        func_schemes: inf.func_schemes,
        let_schemes: inf.let_schemes,
        errors: inf.ctx.errors,
        defaulted: inf.defaulted,
    }
}

struct Inferencer<'a> {
    ctx: InferCtx,
    resolver: &'a dyn TypeResolver,
    classes: &'a ClassRegistry,
    node_types: FxHashMap<NodeId, Ty>,
    func_schemes: FxHashMap<String, Scheme>,
    let_schemes: FxHashMap<String, Scheme>,
    /// Class constraints collected while inferring the expression currently
    /// being generalized; consumed by `generalize_binding`.
    pending_constraints: Vec<ClassConstraint>,
    defaulted: Vec<(NodeId, String, Ty)>,
}

impl<'a> Inferencer<'a> {
    fn new(resolver: &'a dyn TypeResolver, classes: &'a ClassRegistry) -> Self {
        Inferencer {
            ctx: InferCtx::new(),
            resolver,
            classes,
            node_types: FxHashMap::default(),
            func_schemes: FxHashMap::default(),
            let_schemes: FxHashMap::default(),
            pending_constraints: Vec::new(),
            defaulted: Vec::new(),
        }
    }

    fn run(&mut self, program: &Program) {
        let mut env = Env::new();

        // Pre-bind every top-level function to a fresh monomorphic type so
        // mutually recursive calls resolve (this mirrors `LetRec`).
        let mut placeholders = Vec::with_capacity(program.funcs.len());
        for func in &program.funcs {
            self.ctx.enter_level();
            let params: Vec<Ty> = func.params.iter().map(|_| self.ctx.fresh_var()).collect();
            let ret = self.ctx.fresh_var();
            self.ctx.leave_level();
            let effects = func.declared_effects.clone().unwrap_or_else(EffectRow::pure);
            let fn_ty = Ty::fun(params.clone(), ret.clone(), effects);
            env.bind(func.name.clone(), Scheme::mono(fn_ty));
            placeholders.push((params, ret));
        }

        for (func, (params, ret)) in program.funcs.iter().zip(placeholders) {
            self.infer_func(&mut env, func, params, ret);
        }

        for (name, value, exported) in &program.lets {
            let _ = exported;
            self.pending_constraints.clear();
            self.ctx.enter_level();
            let value_ty = self.infer_expr(&mut env, value, &mut EffectRow::pure());
            self.ctx.leave_level();
            let scheme = if value.is_syntactic_value() {
                let constraints = std::mem::take(&mut self.pending_constraints);
                self.ctx.generalize(value_ty, constraints)
            } else {
                self.default_remaining_constraints(value.id());
                Scheme::mono(self.ctx.resolve(value_ty))
            };
            env.bind(name.clone(), scheme.clone());
            self.let_schemes.insert(name.clone(), scheme);
        }
    }

    fn infer_func(&mut self, env: &mut Env, func: &FuncDef, params: Vec<Ty>, declared_ret: Ty) {
        self.pending_constraints.clear();
        self.ctx.enter_level();
        env.push();
        for (name, ty) in func.params.iter().zip(params.iter()) {
            env.bind(name.clone(), Scheme::mono(ty.clone()));
        }
        let mut effects = EffectRow::pure();
        let body_ty = self.infer_expr(env, &func.body, &mut effects);
        env.pop();

        if let Err(e) = self.ctx.unify(
            declared_ret.clone(),
            body_ty,
            ConstraintOrigin::Return { return_span: func.span },
            func.body.id(),
        ) {
            self.ctx.errors.push(e);
        }

        if let Some(declared) = &func.declared_effects {
            if declared != &effects {
                self.ctx.errors.push(TypeError::RowMismatch {
                    missing_left: effects.missing_from(declared),
                    missing_right: declared.missing_from(&effects),
                    origin: ConstraintOrigin::Builtin,
                    node: func.body.id(),
                });
            }
        }
        self.ctx.leave_level();

        let final_effects = func.declared_effects.clone().unwrap_or(effects);
        let params_resolved: Vec<Ty> = params.iter().map(|p| self.ctx.resolve(p.clone())).collect();
        let ret_resolved = self.ctx.resolve(declared_ret);
        let fn_ty = Ty::fun(params_resolved, ret_resolved, final_effects);

        // Top-level function declarations are always generalizable: they're
        // not `let`-bound expressions subject to the value restriction.
        let constraints = std::mem::take(&mut self.pending_constraints);
        let scheme = self.ctx.generalize(fn_ty, constraints);
        env.bind(func.name.clone(), scheme.clone());
        self.func_schemes.insert(func.name.clone(), scheme);
    }

    fn default_remaining_constraints(&mut self, node: NodeId) {
        let constraints = std::mem::take(&mut self.pending_constraints);
        for c in constraints {
            let default_ty = match c.class.as_str() {
                "Num" => Some(Ty::int()),
                "Fractional" => Some(Ty::float()),
                _ => None,
            };
            if let Some(ty) = default_ty {
                if self.ctx.unify(Ty::Var(c.var), ty.clone(), ConstraintOrigin::Builtin, 0).is_ok() {
                    self.defaulted.push((node, c.class, ty));
                }
            }
        }
    }

    fn record_type(&mut self, node: NodeId, ty: Ty) -> Ty {
        let resolved = self.ctx.resolve(ty);
        self.node_types.insert(node, resolved.clone());
        resolved
    }

    fn infer_expr(&mut self, env: &mut Env, expr: &Expr, effects: &mut EffectRow) -> Ty {
        let ty = match expr {
            Expr::Lit { id, value, .. } => {
                let _ = id;
                lit_ty(value)
            }
            Expr::Var { id, name, span } => match env.lookup(name).cloned() {
                Some(scheme) => {
                    let (ty, constraints) = self.ctx.instantiate(&scheme);
                    self.resolve_constraints(&constraints, *id, *span);
                    ty
                }
                None => {
                    self.ctx.errors.push(TypeError::UnboundName { name: name.clone(), span: *span });
                    self.ctx.fresh_var()
                }
            },
            Expr::VarGlobal { id, module, name, span } => {
                let resolved = if module == "$adt" {
                    self.resolver.resolve_ctor(name)
                } else {
                    self.resolver.resolve_value(module, name)
                };
                match resolved {
                    Some(scheme) => {
                        let (ty, constraints) = self.ctx.instantiate(&scheme);
                        self.resolve_constraints(&constraints, *id, *span);
                        ty
                    }
                    None => {
                        self.ctx.errors.push(TypeError::UnboundName { name: format!("{module}.{name}"), span: *span });
                        self.ctx.fresh_var()
                    }
                }
            }
            Expr::Lambda { id, params, body, declared_effects, span } => {
                let _ = (id, span);
                self.ctx.enter_level();
                env.push();
                let param_tys: Vec<Ty> = params.iter().map(|_| self.ctx.fresh_var()).collect();
                for (name, ty) in params.iter().zip(param_tys.iter()) {
                    env.bind(name.clone(), Scheme::mono(ty.clone()));
                }
                let mut inner_effects = EffectRow::pure();
                let body_ty = self.infer_expr(env, body, &mut inner_effects);
                env.pop();
                self.ctx.leave_level();
                let row = declared_effects.clone().unwrap_or(inner_effects);
                Ty::fun(param_tys, body_ty, row)
            }
            Expr::App { id, func, args, span } => {
                let func_ty = self.infer_expr(env, func, effects);
                let arg_tys: Vec<Ty> = args.iter().map(|a| self.infer_expr(env, a, effects)).collect();
                let ret = self.ctx.fresh_var();
                let expected = Ty::fun(arg_tys, ret.clone(), EffectRow::pure());
                // Unify only the shape; the callee's own effect row is
                // folded into the caller's accumulator below rather than
                // forced to match a placeholder row here.
                match self.unify_call(func_ty, expected, *id, *span) {
                    Ok(row) => *effects = effects.union(&row),
                    Err(e) => self.ctx.errors.push(e),
                }
                ret
            }
            Expr::Let { id, name, value, body, span } => {
                let _ = (id, span);
                self.pending_constraints.clear();
                self.ctx.enter_level();
                let value_ty = self.infer_expr(env, value, effects);
                self.ctx.leave_level();
                env.push();
                let scheme = if value.is_syntactic_value() {
                    let constraints = std::mem::take(&mut self.pending_constraints);
                    self.ctx.generalize(value_ty, constraints)
                } else {
                    self.default_remaining_constraints(value.id());
                    Scheme::mono(self.ctx.resolve(value_ty))
                };
                env.bind(name.clone(), scheme);
                let body_ty = self.infer_expr(env, body, effects);
                env.pop();
                body_ty
            }
            Expr::LetRec { id, bindings, body, span } => {
                let _ = (id, span);
                env.push();
                let mut placeholders = Vec::with_capacity(bindings.len());
                for (name, _) in bindings {
                    let var = self.ctx.fresh_var();
                    env.bind(name.clone(), Scheme::mono(var.clone()));
                    placeholders.push(var);
                }
                for ((_, value), placeholder) in bindings.iter().zip(placeholders) {
                    let value_ty = self.infer_expr(env, value, effects);
                    if let Err(e) = self.ctx.unify(placeholder, value_ty, ConstraintOrigin::LetBinding { binding_span: value.span() }, value.id()) {
                        self.ctx.errors.push(e);
                    }
                }
                let body_ty = self.infer_expr(env, body, effects);
                env.pop();
                body_ty
            }
            Expr::If { id, cond, then_branch, else_branch, span } => {
                let cond_ty = self.infer_expr(env, cond, effects);
                if let Err(e) = self.ctx.unify(cond_ty, Ty::bool(), ConstraintOrigin::IfBranches { if_span: *span }, *id) {
                    self.ctx.errors.push(e);
                }
                let then_ty = self.infer_expr(env, then_branch, effects);
                let else_ty = self.infer_expr(env, else_branch, effects);
                if let Err(e) = self.ctx.unify(then_ty.clone(), else_ty, ConstraintOrigin::IfBranches { if_span: *span }, *id) {
                    self.ctx.errors.push(e);
                }
                then_ty
            }
            Expr::Match { id, scrutinee, arms, span, .. } => {
                let _ = span;
                let scrutinee_ty = self.infer_expr(env, scrutinee, effects);
                let result_ty = self.ctx.fresh_var();
                for arm in arms {
                    env.push();
                    self.infer_pattern(env, &arm.pattern, scrutinee_ty.clone());
                    if let Some(guard) = &arm.guard {
                        let guard_ty = self.infer_expr(env, guard, effects);
                        if let Err(e) = self.ctx.unify(
                            guard_ty,
                            Ty::bool(),
                            ConstraintOrigin::PatternMatch { span: arm.span },
                            *id,
                        ) {
                            self.ctx.errors.push(e);
                        }
                    }
                    let arm_ty = self.infer_expr(env, &arm.body, effects);
                    env.pop();
                    if let Err(e) = self.ctx.unify(
                        result_ty.clone(),
                        arm_ty,
                        ConstraintOrigin::PatternMatch { span: arm.span },
                        arm.body.id(),
                    ) {
                        self.ctx.errors.push(e);
                    }
                }
                result_ty
            }
            Expr::Intrinsic { id, op, args, span } => {
                let arg_tys: Vec<Ty> = args.iter().map(|a| self.infer_expr(env, a, effects)).collect();
                self.infer_intrinsic(*op, arg_tys, *id, *span)
            }
            Expr::Record { id, fields, span } => {
                let _ = (id, span);
                let mut field_tys = std::collections::BTreeMap::new();
                for (label, value) in fields {
                    let ty = self.infer_expr(env, value, effects);
                    field_tys.insert(label.clone(), ty);
                }
                Ty::Record(RecordRow { fields: field_tys, tail: None })
            }
            Expr::RecordAccess { id, record, field, span } => {
                let record_ty = self.infer_expr(env, record, effects);
                let field_ty = self.ctx.fresh_var();
                let tail = self.ctx.fresh_var_tyvar();
                let expected = Ty::Record(RecordRow { fields: [(field.clone(), field_ty.clone())].into(), tail: Some(tail) });
                if let Err(e) = self.ctx.unify(
                    record_ty,
                    expected,
                    ConstraintOrigin::RecordField { span: *span, field: field.clone() },
                    *id,
                ) {
                    self.ctx.errors.push(e);
                }
                field_ty
            }
            Expr::List { id, elements, span } => {
                let elem_ty = self.ctx.fresh_var();
                for (i, el) in elements.iter().enumerate() {
                    let ty = self.infer_expr(env, el, effects);
                    if let Err(e) = self.ctx.unify(
                        elem_ty.clone(),
                        ty,
                        ConstraintOrigin::FnArg { call_span: *span, param_idx: i },
                        *id,
                    ) {
                        self.ctx.errors.push(e);
                    }
                }
                Ty::list(elem_ty)
            }
            Expr::Tuple { id, elements, .. } => {
                let _ = id;
                Ty::Tuple(elements.iter().map(|e| self.infer_expr(env, e, effects)).collect())
            }
            Expr::DictAbs { id, param, body, .. } => {
                let _ = id;
                env.push();
                let dict_ty = self.ctx.fresh_var();
                env.bind(param.clone(), Scheme::mono(dict_ty));
                let body_ty = self.infer_expr(env, body, effects);
                env.pop();
                body_ty
            }
            Expr::DictApp { id, func, dict, .. } => {
                let _ = id;
                let _ = self.infer_expr(env, dict, effects);
                self.infer_expr(env, func, effects)
            }
            Expr::DictRef { name, span, .. } => match env.lookup(name).cloned() {
                Some(scheme) => self.ctx.instantiate(&scheme).0,
                None => {
                    self.ctx.errors.push(TypeError::UnboundName { name: name.clone(), span: *span });
                    self.ctx.fresh_var()
                }
            },
        };
        self.record_type(expr.id(), ty)
    }

    /// Unify an application's callee type against the expected
    /// `(args) -> ret` shape, returning the callee's effect row so the
    /// caller can fold it into its own accumulator (§4.3 point 4).
    fn unify_call(&mut self, func_ty: Ty, expected: Ty, node: NodeId, span: Span) -> Result<EffectRow, TypeError> {
        let func_ty = self.ctx.resolve(func_ty);
        let row = match &func_ty {
            Ty::Fun(_, _, row) => row.clone(),
            _ => EffectRow::pure(),
        };
        self.ctx.unify(func_ty, expected, ConstraintOrigin::FnArg { call_span: span, param_idx: 0 }, node)?;
        Ok(row)
    }

    fn infer_intrinsic(&mut self, op: ailang_core::IntrinsicOp, arg_tys: Vec<Ty>, node: NodeId, span: Span) -> Ty {
        use ailang_core::IntrinsicOp::*;
        let origin = ConstraintOrigin::BinOp { op_span: span };
        match op {
            Add | Sub | Mul | Div | Mod => {
                let a = arg_tys[0].clone();
                if let Err(e) = self.ctx.unify(a.clone(), arg_tys[1].clone(), origin.clone(), node) {
                    self.ctx.errors.push(e);
                }
                self.require_class("Num", &a, node, span);
                if matches!(op, Div) {
                    self.require_class("Fractional", &a, node, span);
                }
                a
            }
            Neg => {
                let a = arg_tys[0].clone();
                self.require_class("Num", &a, node, span);
                a
            }
            Eq | Ne => {
                if let Err(e) = self.ctx.unify(arg_tys[0].clone(), arg_tys[1].clone(), origin, node) {
                    self.ctx.errors.push(e);
                }
                self.require_class("Eq", &arg_tys[0], node, span);
                Ty::bool()
            }
            Lt | Le | Gt | Ge => {
                if let Err(e) = self.ctx.unify(arg_tys[0].clone(), arg_tys[1].clone(), origin, node) {
                    self.ctx.errors.push(e);
                }
                self.require_class("Ord", &arg_tys[0], node, span);
                Ty::bool()
            }
            Concat => {
                if let Err(e) = self.ctx.unify(arg_tys[0].clone(), arg_tys[1].clone(), origin, node) {
                    self.ctx.errors.push(e);
                }
                self.require_class("Concat", &arg_tys[0], node, span);
                arg_tys[0].clone()
            }
            Not => Ty::bool(),
            And | Or => unreachable!("And/Or never reach an Intrinsic node"),
        }
    }

    /// Check (or, for a still-polymorphic variable, defer) a class
    /// constraint. Concrete types missing an instance produce
    /// `MissingInstance` immediately; type variables accumulate the
    /// constraint for resolution at generalization time (§4.3 point 6).
    fn require_class(&mut self, class: impl Into<String>, ty: &Ty, node: NodeId, span: Span) {
        let class = class.into();
        let resolved = self.ctx.resolve(ty.clone());
        match &resolved {
            Ty::Var(v) => self.pending_constraints.push(ClassConstraint { class, var: *v }),
            _ => {
                if !self.classes.has_instance(&class, &resolved) {
                    self.ctx.errors.push(TypeError::MissingInstance { class, ty: resolved, node, span });
                }
            }
        }
    }

    fn resolve_constraints(&mut self, constraints: &[ClassConstraint], node: NodeId, span: Span) {
        for c in constraints {
            let ty = self.ctx.resolve(Ty::Var(c.var));
            self.require_class(c.class.clone(), &ty, node, span);
        }
    }

    fn infer_pattern(&mut self, env: &mut Env, pattern: &Pattern, scrutinee_ty: Ty) {
        match pattern {
            Pattern::Wildcard => {}
            Pattern::Var(name) => env.bind(name.clone(), Scheme::mono(scrutinee_ty)),
            Pattern::Literal(lit) => {
                let ty = lit_ty(lit);
                if let Err(e) = self.ctx.unify(scrutinee_ty, ty, ConstraintOrigin::PatternMatch { span: Span::dummy() }, 0) {
                    self.ctx.errors.push(e);
                }
            }
            Pattern::Tuple(elems) => {
                let elem_tys: Vec<Ty> = elems.iter().map(|_| self.ctx.fresh_var()).collect();
                if let Err(e) = self.ctx.unify(
                    scrutinee_ty,
                    Ty::Tuple(elem_tys.clone()),
                    ConstraintOrigin::PatternMatch { span: Span::dummy() },
                    0,
                ) {
                    self.ctx.errors.push(e);
                }
                for (p, t) in elems.iter().zip(elem_tys) {
                    self.infer_pattern(env, p, t);
                }
            }
            Pattern::List { elements, tail } => {
                let elem_ty = self.ctx.fresh_var();
                if let Err(e) = self.ctx.unify(
                    scrutinee_ty.clone(),
                    Ty::list(elem_ty.clone()),
                    ConstraintOrigin::PatternMatch { span: Span::dummy() },
                    0,
                ) {
                    self.ctx.errors.push(e);
                }
                for p in elements {
                    self.infer_pattern(env, p, elem_ty.clone());
                }
                if let Some(tail_pattern) = tail {
                    self.infer_pattern(env, tail_pattern, scrutinee_ty);
                }
            }
            Pattern::Constructor { name, args } => match self.resolver.resolve_ctor(name) {
                Some(scheme) => {
                    let (ctor_ty, _) = self.ctx.instantiate(&scheme);
                    match ctor_ty {
                        Ty::Fun(param_tys, ret, _) => {
                            if let Err(e) = self.ctx.unify(
                                scrutinee_ty,
                                *ret,
                                ConstraintOrigin::PatternMatch { span: Span::dummy() },
                                0,
                            ) {
                                self.ctx.errors.push(e);
                            }
                            for (p, t) in args.iter().zip(param_tys) {
                                self.infer_pattern(env, p, t);
                            }
                        }
                        nullary => {
                            if let Err(e) = self.ctx.unify(
                                scrutinee_ty,
                                nullary,
                                ConstraintOrigin::PatternMatch { span: Span::dummy() },
                                0,
                            ) {
                                self.ctx.errors.push(e);
                            }
                        }
                    }
                }
                None => self.ctx.errors.push(TypeError::UnboundName { name: name.clone(), span: Span::dummy() }),
            },
        }
    }
}

fn lit_ty(lit: &LitValue) -> Ty {
    match lit {
        LitValue::Int(_) => Ty::int(),
        LitValue::Float(_) => Ty::float(),
        LitValue::Str(_) => Ty::string(),
        LitValue::Bool(_) => Ty::bool(),
        LitValue::Unit => Ty::unit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailang_common::Span;
    use ailang_core::elaborate;
    use ailang_syntax::parse;

    fn infer_src(src: &str) -> InferOutput {
        let file = parse(src).expect("parses");
        let elaborated = elaborate(&file);
        assert!(elaborated.errors.is_empty(), "elab errors: {:?}", elaborated.errors);
        let resolver = NoopResolver;
        let classes = ClassRegistry::with_builtin_instances();
        infer_program(&elaborated.program, &resolver, &classes)
    }

    #[test]
    fn identity_function_is_generalized() {
        let out = infer_src("func id(x) { x }");
        let scheme = out.func_schemes.get("id").expect("id was inferred");
        assert_eq!(scheme.vars.len(), 1);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn arithmetic_defaults_numeric_literals_to_int() {
        let out = infer_src("func add(a, b) { a + b }");
        let scheme = out.func_schemes.get("add").unwrap();
        match &scheme.ty {
            Ty::Fun(params, ret, _) => {
                assert_eq!(params.len(), 2);
                assert_eq!(**ret, Ty::int());
            }
            other => panic!("expected a function type, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_if_branches_is_a_type_error() {
        let out = infer_src("func f(x) { if x { 1 } else { \"no\" } }");
        assert!(out.errors.iter().any(|e| matches!(e, TypeError::Mismatch { .. })));
    }

    #[test]
    fn unbound_name_is_reported() {
        let out = infer_src("func f() { y }");
        assert!(out.errors.iter().any(|e| matches!(e, TypeError::UnboundName { .. })));
    }

    #[test]
    fn boolean_and_is_not_forced_to_unify_both_branches_eagerly() {
        let out = infer_src("func f(a, b) { a && b }");
        assert!(out.errors.is_empty());
        let scheme = out.func_schemes.get("f").unwrap();
        match &scheme.ty {
            Ty::Fun(_, ret, _) => assert_eq!(**ret, Ty::bool()),
            other => panic!("expected a function type, got {other:?}"),
        }
    }

    #[test]
    fn declared_effect_mismatch_is_reported() {
        let out = infer_src("func f() ! {IO} { 1 }");
        assert!(out.errors.iter().any(|e| matches!(e, TypeError::RowMismatch { .. })));
    }

    #[test]
    fn unused_span_placeholder_is_zero_length() {
        assert_eq!(Span::dummy().start, 0);
    }
}
