//! The Operator/Constraint Resolver (§4.4): rewrites every `Intrinsic` node
//! into a call to the builtin method its (now-inferred) operand type
//! dispatches to, e.g. `Intrinsic{Add, [a, b]}` where `a : Int` becomes
//! `App(VarGlobal("$builtin", "add_Int"), [a, b])`.
//!
//! `&&`/`||` are a special case: the Elaborator already desugars them
//! straight to `If` (to preserve short-circuit laziness -- see
//! `ailang_core::elab`), so the real pipeline never hands this pass an
//! `Intrinsic{And/Or}` node. The rewrite below is kept anyway for
//! hand-constructed Core IR fixtures that skip the Elaborator.

use rustc_hash::FxHashMap;

use ailang_core::{Expr, FuncDef, IntrinsicOp, LitValue, MatchArm, NodeId, Program};
use ailang_types::Ty;

use crate::error::LowerError;

pub struct LowerResult {
    pub program: Program,
    pub errors: Vec<LowerError>,
}

pub fn lower_program(program: Program, node_types: &FxHashMap<NodeId, Ty>) -> LowerResult {
    tracing::debug!(funcs = program.funcs.len(), "lowering operators to builtin calls");
    let mut lowerer = Lowerer::new(next_free_id(&program), node_types);
    let funcs = program
        .funcs
        .into_iter()
        .map(|f| FuncDef { body: lowerer.lower_expr(f.body), ..f })
        .collect();
    let lets = program
        .lets
        .into_iter()
        .map(|(name, value, exported)| (name, lowerer.lower_expr(value), exported))
        .collect();
    let lowered = Program { funcs, types: program.types, lets };
    assert_no_residual_intrinsics(&lowered, &mut lowerer.errors);
    LowerResult { program: lowered, errors: lowerer.errors }
}

struct Lowerer<'a> {
    next_id: NodeId,
    node_types: &'a FxHashMap<NodeId, Ty>,
    errors: Vec<LowerError>,
}

impl<'a> Lowerer<'a> {
    fn new(next_id: NodeId, node_types: &'a FxHashMap<NodeId, Ty>) -> Self {
        Lowerer { next_id, node_types, errors: Vec::new() }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn lower_expr(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::Lit { .. } | Expr::Var { .. } | Expr::VarGlobal { .. } | Expr::DictRef { .. } => expr,
            Expr::Lambda { id, params, body, declared_effects, span } => Expr::Lambda {
                id,
                params,
                body: Box::new(self.lower_expr(*body)),
                declared_effects,
                span,
            },
            Expr::App { id, func, args, span } => Expr::App {
                id,
                func: Box::new(self.lower_expr(*func)),
                args: args.into_iter().map(|a| self.lower_expr(a)).collect(),
                span,
            },
            Expr::Let { id, name, value, body, span } => Expr::Let {
                id,
                name,
                value: Box::new(self.lower_expr(*value)),
                body: Box::new(self.lower_expr(*body)),
                span,
            },
            Expr::LetRec { id, bindings, body, span } => Expr::LetRec {
                id,
                bindings: bindings.into_iter().map(|(n, v)| (n, self.lower_expr(v))).collect(),
                body: Box::new(self.lower_expr(*body)),
                span,
            },
            Expr::If { id, cond, then_branch, else_branch, span } => Expr::If {
                id,
                cond: Box::new(self.lower_expr(*cond)),
                then_branch: Box::new(self.lower_expr(*then_branch)),
                else_branch: Box::new(self.lower_expr(*else_branch)),
                span,
            },
            Expr::Match { id, scrutinee, arms, exhaustive, span } => Expr::Match {
                id,
                scrutinee: Box::new(self.lower_expr(*scrutinee)),
                arms: arms.into_iter().map(|arm| self.lower_arm(arm)).collect(),
                exhaustive,
                span,
            },
            Expr::Intrinsic { id, op, args, span } => self.lower_intrinsic(id, op, args, span),
            Expr::Record { id, fields, span } => Expr::Record {
                id,
                fields: fields.into_iter().map(|(l, v)| (l, self.lower_expr(v))).collect(),
                span,
            },
            Expr::RecordAccess { id, record, field, span } => {
                Expr::RecordAccess { id, record: Box::new(self.lower_expr(*record)), field, span }
            }
            Expr::List { id, elements, span } => {
                Expr::List { id, elements: elements.into_iter().map(|e| self.lower_expr(e)).collect(), span }
            }
            Expr::Tuple { id, elements, span } => {
                Expr::Tuple { id, elements: elements.into_iter().map(|e| self.lower_expr(e)).collect(), span }
            }
            Expr::DictAbs { id, param, body, span } => {
                Expr::DictAbs { id, param, body: Box::new(self.lower_expr(*body)), span }
            }
            Expr::DictApp { id, func, dict, span } => Expr::DictApp {
                id,
                func: Box::new(self.lower_expr(*func)),
                dict: Box::new(self.lower_expr(*dict)),
                span,
            },
        }
    }

    fn lower_arm(&mut self, arm: MatchArm) -> MatchArm {
        MatchArm {
            pattern: arm.pattern,
            guard: arm.guard.map(|g| self.lower_expr(g)),
            body: self.lower_expr(arm.body),
            bindings: arm.bindings,
            span: arm.span,
        }
    }

    fn lower_intrinsic(&mut self, id: NodeId, op: IntrinsicOp, args: Vec<Expr>, span: ailang_common::Span) -> Expr {
        if matches!(op, IntrinsicOp::And | IntrinsicOp::Or) {
            let mut args = args.into_iter().map(|a| self.lower_expr(a));
            let cond = args.next().expect("And/Or always has a lhs");
            let rhs = args.next().expect("And/Or always has a rhs");
            return match op {
                IntrinsicOp::And => Expr::If {
                    id,
                    cond: Box::new(cond),
                    then_branch: Box::new(rhs),
                    else_branch: Box::new(Expr::Lit { id: self.fresh_id(), value: LitValue::Bool(false), span }),
                    span,
                },
                IntrinsicOp::Or => Expr::If {
                    id,
                    cond: Box::new(cond),
                    then_branch: Box::new(Expr::Lit { id: self.fresh_id(), value: LitValue::Bool(true), span }),
                    else_branch: Box::new(rhs),
                    span,
                },
                _ => unreachable!(),
            };
        }

        let args: Vec<Expr> = args.into_iter().map(|a| self.lower_expr(a)).collect();
        let head_name: Option<String> =
            args.first().and_then(|a| self.node_types.get(&a.id())).and_then(|ty| ty.head_name().map(str::to_string));

        let Some(head) = head_name else {
            self.errors.push(LowerError::UnresolvedOperandType { op: op.base_method_name(), node: id, span });
            return Expr::Intrinsic { id, op, args, span };
        };

        let builtin_name = format!("{}_{head}", op.base_method_name());
        if !ailang_builtins::BUILTINS.contains_key(builtin_name.as_str()) {
            self.errors.push(LowerError::UnknownBuiltin { name: builtin_name, node: id, span });
            return Expr::Intrinsic { id, op, args, span };
        }

        let func_id = self.fresh_id();
        Expr::App {
            id,
            func: Box::new(Expr::VarGlobal { id: func_id, module: "$builtin".to_string(), name: builtin_name, span }),
            args,
            span,
        }
    }
}

fn next_free_id(program: &Program) -> NodeId {
    let mut max = 0;
    for func in &program.funcs {
        max = max.max(max_node_id(&func.body));
    }
    for (_, value, _) in &program.lets {
        max = max.max(max_node_id(value));
    }
    max + 1
}

fn max_node_id(expr: &Expr) -> NodeId {
    let mut max = expr.id();
    let children: Vec<&Expr> = match expr {
        Expr::Lit { .. } | Expr::Var { .. } | Expr::VarGlobal { .. } | Expr::DictRef { .. } => vec![],
        Expr::Lambda { body, .. } => vec![body],
        Expr::App { func, args, .. } => std::iter::once(func.as_ref()).chain(args.iter()).collect(),
        Expr::Let { value, body, .. } => vec![value, body],
        Expr::LetRec { bindings, body, .. } => bindings.iter().map(|(_, v)| v).chain(std::iter::once(body.as_ref())).collect(),
        Expr::If { cond, then_branch, else_branch, .. } => vec![cond, then_branch, else_branch],
        Expr::Match { scrutinee, arms, .. } => std::iter::once(scrutinee.as_ref())
            .chain(arms.iter().flat_map(|a| a.guard.iter().chain(std::iter::once(&a.body))))
            .collect(),
        Expr::Intrinsic { args, .. } => args.iter().collect(),
        Expr::Record { fields, .. } => fields.iter().map(|(_, v)| v).collect(),
        Expr::RecordAccess { record, .. } => vec![record],
        Expr::List { elements, .. } | Expr::Tuple { elements, .. } => elements.iter().collect(),
        Expr::DictAbs { body, .. } => vec![body],
        Expr::DictApp { func, dict, .. } => vec![func, dict],
    };
    for c in children {
        max = max.max(max_node_id(c));
    }
    max
}

fn assert_no_residual_intrinsics(program: &Program, errors: &mut Vec<LowerError>) {
    for func in &program.funcs {
        walk_for_intrinsics(&func.body, errors);
    }
    for (_, value, _) in &program.lets {
        walk_for_intrinsics(value, errors);
    }
}

fn walk_for_intrinsics(expr: &Expr, errors: &mut Vec<LowerError>) {
    if let Expr::Intrinsic { id, span, .. } = expr {
        errors.push(LowerError::ResidualIntrinsic { node: *id, span: *span });
    }
    match expr {
        Expr::Lit { .. } | Expr::Var { .. } | Expr::VarGlobal { .. } | Expr::DictRef { .. } => {}
        Expr::Lambda { body, .. } => walk_for_intrinsics(body, errors),
        Expr::App { func, args, .. } => {
            walk_for_intrinsics(func, errors);
            args.iter().for_each(|a| walk_for_intrinsics(a, errors));
        }
        Expr::Let { value, body, .. } => {
            walk_for_intrinsics(value, errors);
            walk_for_intrinsics(body, errors);
        }
        Expr::LetRec { bindings, body, .. } => {
            bindings.iter().for_each(|(_, v)| walk_for_intrinsics(v, errors));
            walk_for_intrinsics(body, errors);
        }
        Expr::If { cond, then_branch, else_branch, .. } => {
            walk_for_intrinsics(cond, errors);
            walk_for_intrinsics(then_branch, errors);
            walk_for_intrinsics(else_branch, errors);
        }
        Expr::Match { scrutinee, arms, .. } => {
            walk_for_intrinsics(scrutinee, errors);
            for arm in arms {
                if let Some(g) = &arm.guard {
                    walk_for_intrinsics(g, errors);
                }
                walk_for_intrinsics(&arm.body, errors);
            }
        }
        Expr::Intrinsic { args, .. } => args.iter().for_each(|a| walk_for_intrinsics(a, errors)),
        Expr::Record { fields, .. } => fields.iter().for_each(|(_, v)| walk_for_intrinsics(v, errors)),
        Expr::RecordAccess { record, .. } => walk_for_intrinsics(record, errors),
        Expr::List { elements, .. } | Expr::Tuple { elements, .. } => {
            elements.iter().for_each(|e| walk_for_intrinsics(e, errors))
        }
        Expr::DictAbs { body, .. } => walk_for_intrinsics(body, errors),
        Expr::DictApp { func, dict, .. } => {
            walk_for_intrinsics(func, errors);
            walk_for_intrinsics(dict, errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailang_common::Span;
    use ailang_types::TyCon;

    fn int_ty() -> Ty {
        Ty::Con(TyCon::new("Int"))
    }

    #[test]
    fn add_with_int_operands_lowers_to_add_int_builtin() {
        let lhs = Expr::Var { id: 0, name: "a".into(), span: Span::dummy() };
        let rhs = Expr::Var { id: 1, name: "b".into(), span: Span::dummy() };
        let intrinsic = Expr::Intrinsic { id: 2, op: IntrinsicOp::Add, args: vec![lhs, rhs], span: Span::dummy() };
        let mut node_types = FxHashMap::default();
        node_types.insert(0, int_ty());
        node_types.insert(1, int_ty());

        let program = Program { funcs: vec![], types: vec![], lets: vec![("x".to_string(), intrinsic, false)] };
        let result = lower_program(program, &node_types);
        assert!(result.errors.is_empty());
        match &result.program.lets[0].1 {
            Expr::App { func, .. } => match func.as_ref() {
                Expr::VarGlobal { module, name, .. } => {
                    assert_eq!(module, "$builtin");
                    assert_eq!(name, "add_Int");
                }
                other => panic!("expected a VarGlobal callee, got {other:?}"),
            },
            other => panic!("expected an App node, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_operand_type_is_reported() {
        let lhs = Expr::Var { id: 0, name: "a".into(), span: Span::dummy() };
        let rhs = Expr::Var { id: 1, name: "b".into(), span: Span::dummy() };
        let intrinsic = Expr::Intrinsic { id: 2, op: IntrinsicOp::Add, args: vec![lhs, rhs], span: Span::dummy() };
        let program = Program { funcs: vec![], types: vec![], lets: vec![("x".to_string(), intrinsic, false)] };
        let result = lower_program(program, &FxHashMap::default());
        assert!(result.errors.iter().any(|e| matches!(e, LowerError::UnresolvedOperandType { .. })));
        assert!(result.errors.iter().any(|e| matches!(e, LowerError::ResidualIntrinsic { .. })));
    }

    #[test]
    fn hand_built_and_node_still_rewrites_to_if() {
        let lhs = Expr::Var { id: 0, name: "a".into(), span: Span::dummy() };
        let rhs = Expr::Var { id: 1, name: "b".into(), span: Span::dummy() };
        let intrinsic = Expr::Intrinsic { id: 2, op: IntrinsicOp::And, args: vec![lhs, rhs], span: Span::dummy() };
        let program = Program { funcs: vec![], types: vec![], lets: vec![("x".to_string(), intrinsic, false)] };
        let result = lower_program(program, &FxHashMap::default());
        assert!(result.errors.is_empty());
        assert!(matches!(result.program.lets[0].1, Expr::If { .. }));
    }
}
