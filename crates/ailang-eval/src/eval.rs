//! The Pattern-Match Evaluator: a tree-walking interpreter over lowered
//! Core IR (§4.6). By the time a `Program` reaches here, the Resolver has
//! already rewritten every `Intrinsic` into a builtin `App` (§4.4, §8.1
//! invariant 2), so this evaluator never needs to special-case operators.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use ailang_common::Span;
use ailang_core::{CtorInfo, Expr, FuncDef, LitValue, MatchArm, NodeId, Pattern, Program};

use crate::builtins;
use crate::error::RuntimeError;
use crate::value::{Closure, Env, TaggedValue, ThunkSlot, Value};

/// Resolves a name exported by another module, once the module loader and
/// linker (not this crate) have determined which module owns it. `$builtin`
/// and `$adt` names are handled by the evaluator itself and never reach a
/// `ValueResolver` implementation (§4.6).
pub trait ValueResolver {
    fn resolve_value(&self, module: &str, name: &str) -> Option<Value>;
}

/// A resolver with no other modules in scope: every cross-module lookup
/// fails. Used by single-module evaluation and by unit tests.
pub struct NoopResolver;

impl ValueResolver for NoopResolver {
    fn resolve_value(&self, _module: &str, _name: &str) -> Option<Value> {
        None
    }
}

pub struct EvalOutput {
    pub globals: Env,
    pub errors: Vec<RuntimeError>,
}

/// Evaluate every top-level function and `let` of `program` into `globals`,
/// in source order. `ctors` supplies each constructor's field arity so
/// `$adt` factory calls (`make_Type_Ctor`) build the right-shaped
/// [`TaggedValue`] (§3.4, §4.6).
pub fn eval_program(
    program: &Program,
    ctors: &FxHashMap<String, CtorInfo>,
    resolver: &dyn ValueResolver,
) -> EvalOutput {
    tracing::debug!(funcs = program.funcs.len(), lets = program.lets.len(), "evaluating program");
    let globals = Env::root();
    let mut evaluator = Evaluator { ctors, resolver, errors: Vec::new() };

    for func in &program.funcs {
        let closure = Value::Closure(Rc::new(Closure {
            params: func.params.clone(),
            body: Rc::new(func.body.clone()),
            env: globals.clone(),
        }));
        globals.bind(func.name.clone(), closure);
    }

    for (name, expr, _exported) in &program.lets {
        match evaluator.eval(expr, &globals) {
            Ok(v) => globals.bind(name.clone(), v),
            Err(e) => evaluator.errors.push(e),
        }
    }

    EvalOutput { globals, errors: evaluator.errors }
}

pub struct Evaluator<'a> {
    ctors: &'a FxHashMap<String, CtorInfo>,
    resolver: &'a dyn ValueResolver,
    errors: Vec<RuntimeError>,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctors: &'a FxHashMap<String, CtorInfo>, resolver: &'a dyn ValueResolver) -> Self {
        Evaluator { ctors, resolver, errors: Vec::new() }
    }

    pub fn eval_func(&mut self, func: &FuncDef, env: &Env) -> Result<Value, RuntimeError> {
        self.eval(&func.body, env)
    }

    pub fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Lit { value, .. } => Ok(lit_value(value)),

            Expr::Var { id, name, span } => {
                let v = env
                    .lookup(name)
                    .ok_or_else(|| RuntimeError::UnboundName { name: name.clone(), node: *id, span: *span })?;
                self.force(v, *id, *span)
            }

            Expr::VarGlobal { id, module, name, span } => self.resolve_global(module, name, *id, *span, env),

            Expr::Lambda { params, body, .. } => Ok(Value::Closure(Rc::new(Closure {
                params: params.clone(),
                body: Rc::new((**body).clone()),
                env: env.clone(),
            }))),

            Expr::App { id, func, args, span } => {
                let callee = self.eval(func, env)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for a in args {
                    arg_values.push(self.eval(a, env)?);
                }
                self.apply(callee, arg_values, *id, *span)
            }

            Expr::Let { name, value, body, .. } => {
                let v = self.eval(value, env)?;
                let child = env.child();
                child.bind(name.clone(), v);
                self.eval(body, &child)
            }

            Expr::LetRec { bindings, body, .. } => {
                let child = env.child();
                for (name, rhs) in bindings {
                    let slot = ThunkSlot::Pending(Rc::new(rhs.clone()), child.clone());
                    child.bind(name.clone(), Value::Thunk(Rc::new(std::cell::RefCell::new(slot))));
                }
                self.eval(body, &child)
            }

            Expr::If { id, cond, then_branch, else_branch, span } => {
                let c = self.eval(cond, env)?;
                match c {
                    Value::Bool(true) => self.eval(then_branch, env),
                    Value::Bool(false) => self.eval(else_branch, env),
                    other => Err(RuntimeError::TypeMismatch { expected: "Bool", found: other.type_tag(), node: *id, span: *span }),
                }
            }

            Expr::Match { id, scrutinee, arms, span, .. } => {
                let v = self.eval(scrutinee, env)?;
                self.eval_match(&v, arms, env, *id, *span)
            }

            Expr::Intrinsic { id, span, .. } => {
                // Unreachable once the lowering pass has run (§8.1 invariant
                // 2); kept here only so a hand-built fixture that skips
                // lowering fails with a clear runtime error rather than a
                // panic.
                Err(RuntimeError::TypeMismatch { expected: "a lowered IR node", found: "Intrinsic", node: *id, span: *span })
            }

            Expr::Record { fields, .. } => {
                let mut map = FxHashMap::default();
                for (name, value_expr) in fields {
                    map.insert(name.clone(), self.eval(value_expr, env)?);
                }
                Ok(Value::Record(Rc::new(map)))
            }

            Expr::RecordAccess { id, record, field, span } => {
                let v = self.eval(record, env)?;
                match &v {
                    Value::Record(fields) => fields
                        .get(field)
                        .cloned()
                        .ok_or_else(|| RuntimeError::MissingField { field: field.clone(), node: *id, span: *span }),
                    other => Err(RuntimeError::TypeMismatch { expected: "Record", found: other.type_tag(), node: *id, span: *span }),
                }
            }

            Expr::List { elements, .. } => {
                let mut out = Vec::with_capacity(elements.len());
                for e in elements {
                    out.push(self.eval(e, env)?);
                }
                Ok(Value::List(Rc::new(out)))
            }

            Expr::Tuple { elements, .. } => {
                let mut out = Vec::with_capacity(elements.len());
                for e in elements {
                    out.push(self.eval(e, env)?);
                }
                Ok(Value::Tuple(Rc::new(out)))
            }

            Expr::DictAbs { param, body, .. } => Ok(Value::Closure(Rc::new(Closure {
                params: vec![param.clone()],
                body: Rc::new((**body).clone()),
                env: env.clone(),
            }))),

            Expr::DictApp { id, func, dict, span } => {
                let callee = self.eval(func, env)?;
                let d = self.eval(dict, env)?;
                self.apply(callee, vec![d], *id, *span)
            }

            Expr::DictRef { id, name, span } => {
                env.lookup(name).ok_or_else(|| RuntimeError::UnboundName { name: name.clone(), node: *id, span: *span })
            }
        }
    }

    /// Force a `LetRec` thunk, detecting self-reference cycles (§4.6).
    /// Non-thunk values pass through unchanged.
    fn force(&mut self, v: Value, node: NodeId, span: Span) -> Result<Value, RuntimeError> {
        let cell = match v {
            Value::Thunk(cell) => cell,
            other => return Ok(other),
        };
        let taken = std::mem::replace(&mut *cell.borrow_mut(), ThunkSlot::InProgress);
        match taken {
            ThunkSlot::Done(v) => {
                *cell.borrow_mut() = ThunkSlot::Done(v.clone());
                Ok(v)
            }
            ThunkSlot::InProgress => Err(RuntimeError::Cycle { name: "<letrec binding>".to_string(), node, span }),
            ThunkSlot::Pending(expr, env) => {
                let result = self.eval(&expr, &env)?;
                *cell.borrow_mut() = ThunkSlot::Done(result.clone());
                Ok(result)
            }
        }
    }

    fn resolve_global(&mut self, module: &str, name: &str, node: NodeId, span: Span, env: &Env) -> Result<Value, RuntimeError> {
        if module == "$builtin" {
            let spec = ailang_builtins::BUILTINS.get(name).ok_or_else(|| RuntimeError::UnresolvedGlobal {
                module: module.to_string(),
                name: name.to_string(),
                node,
                span,
            })?;
            let arity = spec.arity;
            let owned_name: Rc<str> = Rc::from(name);
            let func_name = owned_name.clone();
            return Ok(Value::Builtin {
                name: owned_name,
                arity,
                func: Rc::new(move |args: &[Value]| builtins::call(&func_name, args, node, span)),
            });
        }

        if module == "$adt" {
            if let Some(name_for_ctor) = name.strip_prefix("make_") {
                if let Some(info) = self.ctors.get(ctor_name_from_factory(name_for_ctor)) {
                    let type_name = info.type_name.clone();
                    let ctor_name = info.ctor_name.clone();
                    let arity = info.field_arity;
                    if arity == 0 {
                        return Ok(Value::Tagged(Rc::new(TaggedValue { type_name, ctor_name, fields: Vec::new() })));
                    }
                    let func_name: Rc<str> = Rc::from(name);
                    return Ok(Value::Builtin {
                        name: func_name,
                        arity,
                        func: Rc::new(move |args: &[Value]| {
                            Ok(Value::Tagged(Rc::new(TaggedValue {
                                type_name: type_name.clone(),
                                ctor_name: ctor_name.clone(),
                                fields: args.to_vec(),
                            })))
                        }),
                    });
                }
            }
            return Err(RuntimeError::UnresolvedGlobal { module: module.to_string(), name: name.to_string(), node, span });
        }

        if let Some(v) = env.lookup(name) {
            return self.force(v, node, span);
        }

        self.resolver
            .resolve_value(module, name)
            .ok_or_else(|| RuntimeError::UnresolvedGlobal { module: module.to_string(), name: name.to_string(), node, span })
    }

    /// Apply an already-evaluated callable to already-evaluated arguments.
    /// Exposed beyond this crate so `ailang-pipeline`'s `CallEntrypoint` can
    /// invoke a looked-up export without re-threading it through `eval` (§6.1).
    pub fn apply(&mut self, callee: Value, args: Vec<Value>, node: NodeId, span: Span) -> Result<Value, RuntimeError> {
        match callee {
            Value::Closure(c) => {
                if c.params.len() != args.len() {
                    return Err(RuntimeError::ArityMismatch {
                        name: "<closure>".to_string(),
                        expected: c.params.len(),
                        found: args.len(),
                        node,
                        span,
                    });
                }
                let call_env = c.env.child();
                for (param, arg) in c.params.iter().zip(args) {
                    call_env.bind(param.clone(), arg);
                }
                self.eval(&c.body, &call_env)
            }
            Value::Builtin { name, arity, func } => {
                if arity != args.len() {
                    return Err(RuntimeError::ArityMismatch { name: name.to_string(), expected: arity, found: args.len(), node, span });
                }
                func(&args)
            }
            other => Err(RuntimeError::TypeMismatch { expected: "a callable value", found: other.type_tag(), node, span }),
        }
    }

    fn eval_match(&mut self, v: &Value, arms: &[MatchArm], env: &Env, node: NodeId, span: Span) -> Result<Value, RuntimeError> {
        for arm in arms {
            let child = env.child();
            if bind_pattern(&arm.pattern, v, &child) {
                if let Some(guard) = &arm.guard {
                    match self.eval(guard, &child)? {
                        Value::Bool(true) => {}
                        Value::Bool(false) => continue,
                        other => {
                            return Err(RuntimeError::TypeMismatch {
                                expected: "Bool",
                                found: other.type_tag(),
                                node,
                                span,
                            })
                        }
                    }
                }
                return self.eval(&arm.body, &child);
            }
        }
        Err(RuntimeError::NonExhaustive { node, span, scrutinee: format!("{v:?}") })
    }
}

/// Recover the `Type_Ctor` pair a linker's `make_Type_Ctor` name encodes.
/// The registry keys `ctors` by the bare constructor name alone, so this
/// just strips the synthesized prefix added by the elaborator's rewrite.
fn ctor_name_from_factory(type_then_ctor: &str) -> &str {
    match type_then_ctor.rsplit_once('_') {
        Some((_, ctor)) => ctor,
        None => type_then_ctor,
    }
}

fn lit_value(lit: &LitValue) -> Value {
    match lit {
        LitValue::Int(n) => Value::Int(*n),
        LitValue::Float(n) => Value::Float(*n),
        LitValue::Str(s) => Value::Str(Rc::new(s.clone())),
        LitValue::Bool(b) => Value::Bool(*b),
        LitValue::Unit => Value::Unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailang_core::elaborate;
    use ailang_syntax::parse;
    use ailang_types::{ClassRegistry, NoopResolver as TypesNoopResolver};

    fn run_src(src: &str) -> (Value, EvalOutput) {
        let file = parse(src).expect("parses");
        let elaborated = elaborate(&file);
        assert!(elaborated.errors.is_empty(), "elab errors: {:?}", elaborated.errors);
        let resolver = TypesNoopResolver;
        let classes = ClassRegistry::with_builtin_instances();
        let inferred = ailang_types::infer_program(&elaborated.program, &resolver, &classes);
        assert!(inferred.errors.is_empty(), "type errors: {:?}", inferred.errors);
        let lowered = ailang_lower::lower_program(elaborated.program, &inferred.node_types);
        assert!(lowered.errors.is_empty(), "lowering errors: {:?}", lowered.errors);
        let out = eval_program(&lowered.program, &elaborated.ctors, &NoopResolver);
        assert!(out.errors.is_empty(), "eval errors: {:?}", out.errors);
        let main = out.globals.lookup("main").expect("main is bound");
        let mut ev = Evaluator::new(&elaborated.ctors, &NoopResolver);
        let result = ev.apply(main, Vec::new(), 0, Span::dummy()).expect("main evaluates");
        (result, out)
    }

    #[test]
    fn arithmetic_and_if_evaluate() {
        let (v, _) = run_src("func main() { if 1 < 2 then 10 + 5 else 0 }");
        assert!(matches!(v, Value::Int(15)));
    }

    #[test]
    fn let_and_closures_capture_their_environment() {
        let (v, _) = run_src("func main() { let add5 = \\x. x + 5; add5(10) }");
        assert!(matches!(v, Value::Int(15)));
    }

    #[test]
    fn mutually_recursive_top_level_functions_terminate() {
        let src = "func isEven(n) { if n == 0 then true else isOdd(n - 1) }\n\
                   func isOdd(n) { if n == 0 then false else isEven(n - 1) }\n\
                   func main() { isEven(10) }";
        let (v, _) = run_src(src);
        assert!(matches!(v, Value::Bool(true)));
    }

    /// `Option`'s constructor table, hand-built the way the Elaborator's
    /// `register_types` would populate it (§4.2) -- used to exercise ADT
    /// pattern matching directly against the evaluator without routing
    /// through the type inferencer, which (absent a real `$adt`-aware
    /// resolver) isn't this crate's concern to stand up in a unit test.
    fn option_ctors() -> FxHashMap<String, CtorInfo> {
        let mut m = FxHashMap::default();
        m.insert(
            "Some".to_string(),
            CtorInfo { type_name: "Option".to_string(), ctor_name: "Some".to_string(), field_arity: 1, span: Span::dummy() },
        );
        m.insert(
            "None".to_string(),
            CtorInfo { type_name: "Option".to_string(), ctor_name: "None".to_string(), field_arity: 0, span: Span::dummy() },
        );
        m
    }

    fn some_of(id: NodeId, inner: Expr) -> Expr {
        Expr::App {
            id,
            func: Box::new(Expr::VarGlobal { id: id + 1, module: "$adt".to_string(), name: "make_Option_Some".to_string(), span: Span::dummy() }),
            args: vec![inner],
            span: Span::dummy(),
        }
    }

    fn none_value(id: NodeId) -> Expr {
        Expr::VarGlobal { id, module: "$adt".to_string(), name: "make_Option_None".to_string(), span: Span::dummy() }
    }

    fn unwrap_or_arms() -> Vec<MatchArm> {
        vec![
            MatchArm {
                pattern: Pattern::Constructor { name: "Some".to_string(), args: vec![Pattern::Var("x".to_string())] },
                guard: None,
                body: Expr::Var { id: 100, name: "x".to_string(), span: Span::dummy() },
                bindings: vec!["x".to_string()],
                span: Span::dummy(),
            },
            MatchArm {
                pattern: Pattern::Constructor { name: "None".to_string(), args: Vec::new() },
                guard: None,
                body: Expr::Lit { id: 101, value: LitValue::Int(0), span: Span::dummy() },
                bindings: Vec::new(),
                span: Span::dummy(),
            },
        ]
    }

    #[test]
    fn pattern_match_on_tagged_constructor_picks_the_right_arm() {
        let ctors = option_ctors();
        let body = Expr::Match {
            id: 1,
            scrutinee: Box::new(some_of(2, Expr::Lit { id: 4, value: LitValue::Int(7), span: Span::dummy() })),
            arms: unwrap_or_arms(),
            exhaustive: true,
            span: Span::dummy(),
        };
        let program = Program { funcs: vec![FuncDef { name: "main".to_string(), params: Vec::new(), body, declared_effects: None, exported: true, span: Span::dummy() }], types: Vec::new(), lets: Vec::new() };
        let out = eval_program(&program, &ctors, &NoopResolver);
        assert!(out.errors.is_empty());
        let main = out.globals.lookup("main").unwrap();
        let mut ev = Evaluator::new(&ctors, &NoopResolver);
        let result = ev.apply(main, Vec::new(), 0, Span::dummy()).expect("evaluates");
        assert!(matches!(result, Value::Int(7)));
    }

    #[test]
    fn non_exhaustive_match_reports_rt_non_exhaustive() {
        let ctors = option_ctors();
        let arms = vec![unwrap_or_arms().into_iter().next().unwrap()];
        let body = Expr::Match { id: 1, scrutinee: Box::new(none_value(2)), arms, exhaustive: false, span: Span::dummy() };
        let program = Program { funcs: vec![FuncDef { name: "main".to_string(), params: Vec::new(), body, declared_effects: None, exported: true, span: Span::dummy() }], types: Vec::new(), lets: Vec::new() };
        let out = eval_program(&program, &ctors, &NoopResolver);
        assert!(out.errors.is_empty());
        let main = out.globals.lookup("main").unwrap();
        let mut ev = Evaluator::new(&ctors, &NoopResolver);
        let err = ev.apply(main, Vec::new(), 0, Span::dummy()).unwrap_err();
        assert!(matches!(err, RuntimeError::NonExhaustive { .. }));
    }
}

/// Attempt to match `pattern` against `v`, binding every captured variable
/// into `env` as a side effect. Returns whether the match succeeded; on
/// failure no partial bindings are observable since `env` is a fresh child
/// scope the caller discards (§4.6 pattern matching semantics).
fn bind_pattern(pattern: &Pattern, v: &Value, env: &Env) -> bool {
    match pattern {
        Pattern::Wildcard => true,
        Pattern::Var(name) => {
            env.bind(name.clone(), v.clone());
            true
        }
        Pattern::Literal(lit) => lit_value(lit).structural_eq(v),
        Pattern::Tuple(pats) => match v {
            Value::Tuple(xs) if xs.len() == pats.len() => {
                pats.iter().zip(xs.iter()).all(|(p, x)| bind_pattern(p, x, env))
            }
            _ => false,
        },
        Pattern::Constructor { name, args } => match v {
            Value::Tagged(t) if &t.ctor_name == name && t.fields.len() == args.len() => {
                args.iter().zip(t.fields.iter()).all(|(p, x)| bind_pattern(p, x, env))
            }
            _ => false,
        },
        Pattern::List { elements, tail } => match v {
            Value::List(xs) => match tail {
                None => xs.len() == elements.len() && elements.iter().zip(xs.iter()).all(|(p, x)| bind_pattern(p, x, env)),
                Some(tail_pat) => {
                    if xs.len() < elements.len() {
                        return false;
                    }
                    if !elements.iter().zip(xs.iter()).all(|(p, x)| bind_pattern(p, x, env)) {
                        return false;
                    }
                    let rest: Vec<Value> = xs[elements.len()..].to_vec();
                    bind_pattern(tail_pat, &Value::List(Rc::new(rest)), env)
                }
            },
            _ => false,
        },
    }
}
