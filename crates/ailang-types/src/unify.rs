//! The unification engine: fresh variables, union-find unification (`ena`),
//! level-based generalization, and scheme instantiation (§4.3).

use std::collections::BTreeMap;

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;

use ailang_common::EffectRow;
use ailang_core::NodeId;

use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{ClassConstraint, RecordRow, Scheme, Ty, TyVar};

pub struct InferCtx {
    table: InPlaceUnificationTable<TyVar>,
    current_level: u32,
    var_levels: Vec<u32>,
    pub errors: Vec<TypeError>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
            current_level: 0,
            var_levels: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn fresh_var(&mut self) -> Ty {
        let var = self.table.new_key(None);
        while self.var_levels.len() <= var.0 as usize {
            self.var_levels.push(0);
        }
        self.var_levels[var.0 as usize] = self.current_level;
        Ty::Var(var)
    }

    fn fresh_tyvar(&mut self) -> TyVar {
        match self.fresh_var() {
            Ty::Var(v) => v,
            _ => unreachable!(),
        }
    }

    pub fn fresh_var_tyvar(&mut self) -> TyVar {
        self.fresh_tyvar()
    }

    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Fun(params, ret, effects) => {
                let params = params.into_iter().map(|p| self.resolve(p)).collect();
                let ret = Box::new(self.resolve(*ret));
                Ty::Fun(params, ret, effects)
            }
            Ty::App(con, args) => {
                let con = Box::new(self.resolve(*con));
                let args = args.into_iter().map(|a| self.resolve(a)).collect();
                Ty::App(con, args)
            }
            Ty::Tuple(elems) => Ty::Tuple(elems.into_iter().map(|e| self.resolve(e)).collect()),
            Ty::Record(row) => self.resolve_row(row),
            other @ Ty::Con(_) => other,
        }
    }

    /// Resolve a record row, merging in the fields of a bound tail
    /// variable (which may itself resolve to another open row) rather than
    /// discarding them.
    fn resolve_row(&mut self, row: RecordRow) -> Ty {
        let mut fields: BTreeMap<String, Ty> = row.fields.into_iter().map(|(k, v)| (k, self.resolve(v))).collect();
        let tail = match row.tail {
            None => None,
            Some(t) => match self.table.probe_value(t) {
                None => Some(self.table.find(t)),
                Some(inner) => match self.resolve(inner) {
                    Ty::Record(inner_row) => {
                        for (k, v) in inner_row.fields {
                            fields.entry(k).or_insert(v);
                        }
                        inner_row.tail
                    }
                    _ => None,
                },
            },
        };
        Ty::Record(RecordRow { fields, tail })
    }

    pub fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v) => {
                if *v == var {
                    return true;
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Con(_) => false,
            Ty::Fun(params, ret, _) => params.iter().any(|p| self.occurs_in(var, p)) || self.occurs_in(var, ret),
            Ty::App(con, args) => self.occurs_in(var, con) || args.iter().any(|a| self.occurs_in(var, a)),
            Ty::Tuple(elems) => elems.iter().any(|e| self.occurs_in(var, e)),
            Ty::Record(row) => {
                row.fields.values().any(|t| self.occurs_in(var, t))
                    || row.tail == Some(var)
            }
        }
    }

    /// Unify two types, recording a `TypeError` and returning `Err` on
    /// failure (§4.3 point 3).
    pub fn unify(&mut self, a: Ty, b: Ty, origin: ConstraintOrigin, node: NodeId) -> Result<(), TypeError> {
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),
            (Ty::Var(v1), Ty::Var(v2)) => {
                self.table.unify_var_var(v1, v2).expect("unifying two unbound vars cannot fail");
                Ok(())
            }
            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs_in(v, &ty) {
                    let err = TypeError::OccursCheck { var: v, ty, origin, node };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    self.table
                        .unify_var_value(v, Some(ty))
                        .expect("binding a var to a concrete type after occurs check cannot fail");
                    Ok(())
                }
            }
            (Ty::Con(c1), Ty::Con(c2)) => {
                if c1 == c2 {
                    Ok(())
                } else {
                    let err = TypeError::Mismatch { expected: Ty::Con(c1), found: Ty::Con(c2), origin, node };
                    self.errors.push(err.clone());
                    Err(err)
                }
            }
            (Ty::Fun(p1, r1, e1), Ty::Fun(p2, r2, e2)) => {
                if p1.len() != p2.len() {
                    let err = TypeError::TypeArity { expected: p1.len(), found: p2.len(), origin, node };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                for (a, b) in p1.into_iter().zip(p2) {
                    self.unify(a, b, origin.clone(), node)?;
                }
                self.unify_effect_rows(&e1, &e2, origin.clone(), node)?;
                self.unify(*r1, *r2, origin, node)
            }
            (Ty::App(c1, a1), Ty::App(c2, a2)) => {
                self.unify(*c1, *c2, origin.clone(), node)?;
                if a1.len() != a2.len() {
                    let err = TypeError::TypeArity { expected: a1.len(), found: a2.len(), origin, node };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                for (a, b) in a1.into_iter().zip(a2) {
                    self.unify(a, b, origin.clone(), node)?;
                }
                Ok(())
            }
            (Ty::Tuple(e1), Ty::Tuple(e2)) => {
                if e1.len() != e2.len() {
                    let err = TypeError::TypeArity { expected: e1.len(), found: e2.len(), origin, node };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                for (a, b) in e1.into_iter().zip(e2) {
                    self.unify(a, b, origin.clone(), node)?;
                }
                Ok(())
            }
            (Ty::Record(r1), Ty::Record(r2)) => self.unify_rows(r1, r2, origin, node),
            (a, b) => {
                let err = TypeError::Mismatch { expected: a, found: b, origin, node };
                self.errors.push(err.clone());
                Err(err)
            }
        }
    }

    /// Effect rows are closed in v0.1: unification requires label-set
    /// equality (§3.1, §4.3 point 3, §3.5 invariant 5).
    fn unify_effect_rows(
        &mut self,
        a: &EffectRow,
        b: &EffectRow,
        origin: ConstraintOrigin,
        node: NodeId,
    ) -> Result<(), TypeError> {
        if a == b {
            return Ok(());
        }
        let err = TypeError::RowMismatch {
            missing_left: b.missing_from(a),
            missing_right: a.missing_from(b),
            origin,
            node,
        };
        self.errors.push(err.clone());
        Err(err)
    }

    /// Record rows unify by splitting common labels and pushing residuals
    /// to the other side's tail variable, generating one if needed (§4.3
    /// point 3: open-row unification).
    fn unify_rows(&mut self, a: RecordRow, b: RecordRow, origin: ConstraintOrigin, node: NodeId) -> Result<(), TypeError> {
        let mut only_a = Vec::new();
        let mut only_b: Vec<(String, Ty)> = b.fields.clone().into_iter().collect();
        for (label, ty_a) in a.fields {
            if let Some(pos) = only_b.iter().position(|(l, _)| l == &label) {
                let (_, ty_b) = only_b.remove(pos);
                self.unify(ty_a, ty_b, origin.clone(), node)?;
            } else {
                only_a.push((label, ty_a));
            }
        }

        match (a.tail, b.tail) {
            (None, None) => {
                if !only_a.is_empty() || !only_b.is_empty() {
                    let err = TypeError::RowMismatch {
                        missing_left: only_b.iter().map(|(l, _)| l.clone()).collect(),
                        missing_right: only_a.iter().map(|(l, _)| l.clone()).collect(),
                        origin,
                        node,
                    };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                Ok(())
            }
            (Some(tail_a), None) => {
                if !only_a.is_empty() {
                    let err = TypeError::RowMismatch {
                        missing_left: Vec::new(),
                        missing_right: only_a.iter().map(|(l, _)| l.clone()).collect(),
                        origin,
                        node,
                    };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                let residual = Ty::Record(RecordRow { fields: only_b.into_iter().collect(), tail: None });
                self.unify(Ty::Var(tail_a), residual, origin, node)
            }
            (None, Some(tail_b)) => {
                if !only_b.is_empty() {
                    let err = TypeError::RowMismatch {
                        missing_left: only_b.iter().map(|(l, _)| l.clone()).collect(),
                        missing_right: Vec::new(),
                        origin,
                        node,
                    };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                let residual = Ty::Record(RecordRow { fields: only_a.into_iter().collect(), tail: None });
                self.unify(Ty::Var(tail_b), residual, origin, node)
            }
            (Some(tail_a), Some(tail_b)) => {
                let fresh_tail = self.fresh_tyvar();
                let residual_for_a = Ty::Record(RecordRow { fields: only_b.into_iter().collect(), tail: Some(fresh_tail) });
                let residual_for_b = Ty::Record(RecordRow { fields: only_a.into_iter().collect(), tail: Some(fresh_tail) });
                self.unify(Ty::Var(tail_a), residual_for_a, origin.clone(), node)?;
                self.unify(Ty::Var(tail_b), residual_for_b, origin, node)
            }
        }
    }

    pub fn enter_level(&mut self) {
        self.current_level += 1;
    }

    pub fn leave_level(&mut self) {
        debug_assert!(self.current_level > 0, "cannot leave level 0");
        self.current_level -= 1;
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    /// Generalize a type into a scheme, quantifying variables whose level
    /// is deeper than the current one (§4.3 point 5).
    pub fn generalize(&mut self, ty: Ty, constraints: Vec<ClassConstraint>) -> Scheme {
        let resolved = self.resolve(ty);
        let mut free_vars = Vec::new();
        self.collect_generalizable_vars(&resolved, &mut free_vars);
        let mut seen = std::collections::HashSet::new();
        free_vars.retain(|v| seen.insert(*v));
        Scheme { vars: free_vars, constraints, ty: resolved }
    }

    fn collect_generalizable_vars(&mut self, ty: &Ty, out: &mut Vec<TyVar>) {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.collect_generalizable_vars(&inner, out),
                None => {
                    let level = self.var_levels.get(v.0 as usize).copied().unwrap_or(0);
                    if level > self.current_level {
                        out.push(*v);
                    }
                }
            },
            Ty::Con(_) => {}
            Ty::Fun(params, ret, _) => {
                for p in params {
                    self.collect_generalizable_vars(p, out);
                }
                self.collect_generalizable_vars(ret, out);
            }
            Ty::App(con, args) => {
                self.collect_generalizable_vars(con, out);
                for a in args {
                    self.collect_generalizable_vars(a, out);
                }
            }
            Ty::Tuple(elems) => {
                for e in elems {
                    self.collect_generalizable_vars(e, out);
                }
            }
            Ty::Record(row) => {
                for t in row.fields.values() {
                    self.collect_generalizable_vars(t, out);
                }
            }
        }
    }

    pub fn instantiate(&mut self, scheme: &Scheme) -> (Ty, Vec<ClassConstraint>) {
        if scheme.vars.is_empty() {
            return (scheme.ty.clone(), scheme.constraints.clone());
        }
        let subst: FxHashMap<TyVar, Ty> = scheme.vars.iter().map(|v| (*v, self.fresh_var())).collect();
        let ty = self.apply_substitution(&scheme.ty, &subst);
        let constraints = scheme
            .constraints
            .iter()
            .map(|c| ClassConstraint {
                class: c.class.clone(),
                var: match subst.get(&c.var) {
                    Some(Ty::Var(v)) => *v,
                    _ => c.var,
                },
            })
            .collect();
        (ty, constraints)
    }

    fn apply_substitution(&mut self, ty: &Ty, subst: &FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => {
                if let Some(replacement) = subst.get(v) {
                    replacement.clone()
                } else {
                    match self.table.probe_value(*v) {
                        Some(inner) => self.apply_substitution(&inner, subst),
                        None => ty.clone(),
                    }
                }
            }
            Ty::Con(_) => ty.clone(),
            Ty::Fun(params, ret, effects) => Ty::Fun(
                params.iter().map(|p| self.apply_substitution(p, subst)).collect(),
                Box::new(self.apply_substitution(ret, subst)),
                effects.clone(),
            ),
            Ty::App(con, args) => Ty::App(
                Box::new(self.apply_substitution(con, subst)),
                args.iter().map(|a| self.apply_substitution(a, subst)).collect(),
            ),
            Ty::Tuple(elems) => Ty::Tuple(elems.iter().map(|e| self.apply_substitution(e, subst)).collect()),
            Ty::Record(row) => Ty::Record(RecordRow {
                fields: row.fields.iter().map(|(k, v)| (k.clone(), self.apply_substitution(v, subst))).collect(),
                tail: row.tail,
            }),
        }
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::TyCon;

    fn origin() -> ConstraintOrigin {
        ConstraintOrigin::Builtin
    }

    #[test]
    fn unify_two_fresh_vars_then_bind() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        assert!(ctx.unify(a.clone(), b.clone(), origin(), 0).is_ok());
        assert!(ctx.unify(a.clone(), Ty::int(), origin(), 0).is_ok());
        assert_eq!(ctx.resolve(a), Ty::int());
        assert_eq!(ctx.resolve(b), Ty::int());
    }

    #[test]
    fn unify_mismatch_reports_type_mismatch() {
        let mut ctx = InferCtx::new();
        let result = ctx.unify(Ty::int(), Ty::string(), origin(), 0);
        assert!(matches!(result, Err(TypeError::Mismatch { .. })));
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let fun = Ty::fun(vec![a.clone()], Ty::int(), EffectRow::pure());
        let result = ctx.unify(a, fun, origin(), 0);
        assert!(matches!(result, Err(TypeError::OccursCheck { .. })));
    }

    #[test]
    fn effect_rows_must_match_by_label_set() {
        let mut ctx = InferCtx::new();
        let f1 = Ty::fun(vec![], Ty::unit(), EffectRow::from_labels(["IO"]));
        let f2 = Ty::fun(vec![], Ty::unit(), EffectRow::pure());
        let result = ctx.unify(f1, f2, origin(), 0);
        assert!(matches!(result, Err(TypeError::RowMismatch { .. })));
    }

    #[test]
    fn generalize_then_instantiate_produces_fresh_vars() {
        let mut ctx = InferCtx::new();
        ctx.enter_level();
        let a = ctx.fresh_var();
        let identity = Ty::fun(vec![a.clone()], a, EffectRow::pure());
        ctx.leave_level();
        let scheme = ctx.generalize(identity, Vec::new());
        assert_eq!(scheme.vars.len(), 1);
        let (inst1, _) = ctx.instantiate(&scheme);
        let (inst2, _) = ctx.instantiate(&scheme);
        match (inst1, inst2) {
            (Ty::Fun(p1, _, _), Ty::Fun(p2, _, _)) => assert_ne!(p1[0], p2[0]),
            _ => panic!("expected function types"),
        }
    }

    #[test]
    fn open_record_row_unifies_with_closed_row_by_residual() {
        let mut ctx = InferCtx::new();
        let tail = ctx.fresh_tyvar();
        let open = Ty::Record(RecordRow { fields: [("x".to_string(), Ty::int())].into(), tail: Some(tail) });
        let closed = Ty::Record(RecordRow::closed([("x".to_string(), Ty::int()), ("y".to_string(), Ty::string())]));
        assert!(ctx.unify(open, closed, origin(), 0).is_ok());
        let resolved_tail = ctx.resolve(Ty::Var(tail));
        match resolved_tail {
            Ty::Record(row) => {
                assert_eq!(row.fields.get("y"), Some(&Ty::string()));
                assert!(!row.fields.contains_key("x"));
            }
            other => panic!("expected a record row, got {other:?}"),
        }
    }

    #[test]
    fn con_display_differs_by_name_only() {
        assert_eq!(TyCon::new("Int"), TyCon::new("Int"));
        assert_ne!(TyCon::new("Int"), TyCon::new("Float"));
    }
}
