//! Type representation (§3.1): monotypes, type variables with a kind,
//! closed effect rows, open record rows, and polymorphic schemes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use ailang_common::EffectRow;

/// The kind of a type variable. Ordinary types are `Star`; `EffectRow` and
/// `RecordRow` variables range over rows rather than types (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Star,
    EffectRow,
    RecordRow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyVar(pub u32);

/// A named type constructor (`Int`, `List`, a user ADT name, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyCon {
    pub name: String,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon { name: name.into() }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An open (or closed) row of record fields (§3.1): `{L1: T1, ... | tail}`.
/// The tail, when present, is a `RecordRow`-kinded type variable standing for
/// "the rest of the fields".
#[derive(Clone, Debug, PartialEq)]
pub struct RecordRow {
    pub fields: BTreeMap<String, Ty>,
    pub tail: Option<TyVar>,
}

impl RecordRow {
    pub fn closed(fields: impl IntoIterator<Item = (String, Ty)>) -> Self {
        RecordRow {
            fields: fields.into_iter().collect(),
            tail: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    Var(TyVar),
    Con(TyCon),
    /// `(params) -row-> ret`. Effect rows are closed in v0.1 (§3.1), so the
    /// row is carried directly as a label set rather than as a `Ty`.
    Fun(Vec<Ty>, Box<Ty>, EffectRow),
    /// A type constructor application: `List[Int]`, a user ADT `Option[Int]`.
    App(Box<Ty>, Vec<Ty>),
    Tuple(Vec<Ty>),
    Record(RecordRow),
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Con(TyCon::new("Int"))
    }
    pub fn float() -> Ty {
        Ty::Con(TyCon::new("Float"))
    }
    pub fn bool() -> Ty {
        Ty::Con(TyCon::new("Bool"))
    }
    pub fn string() -> Ty {
        Ty::Con(TyCon::new("String"))
    }
    pub fn unit() -> Ty {
        Ty::Con(TyCon::new("Unit"))
    }
    pub fn list(elem: Ty) -> Ty {
        Ty::App(Box::new(Ty::Con(TyCon::new("List"))), vec![elem])
    }
    pub fn fun(params: Vec<Ty>, ret: Ty, effects: EffectRow) -> Ty {
        Ty::Fun(params, Box::new(ret), effects)
    }

    /// The base name used to key builtin dispatch and canonical-form
    /// display (`Int`, `Float`, `String`, `List`, a user ADT name, ...).
    pub fn head_name(&self) -> Option<&str> {
        match self {
            Ty::Con(c) => Some(&c.name),
            Ty::App(con, _) => con.head_name(),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "?{}", v.0),
            Ty::Con(c) => write!(f, "{c}"),
            Ty::Fun(params, ret, effects) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                if effects.is_pure() {
                    write!(f, ") -> {ret}")
                } else {
                    write!(f, ") -{effects}-> {ret}")
                }
            }
            Ty::App(con, args) => {
                write!(f, "{con}")?;
                if !args.is_empty() {
                    write!(f, "[")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Ty::Record(row) => {
                write!(f, "{{")?;
                for (i, (label, ty)) in row.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{label}: {ty}")?;
                }
                if let Some(t) = row.tail {
                    write!(f, " | ?{}", t.0)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A class constraint attached to a scheme (e.g. `Num α`, `Eq α`), §3.1, §4.3.6.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassConstraint {
    pub class: String,
    pub var: TyVar,
}

/// A polymorphic type scheme `forall vars. constraints => ty` (§3.1).
#[derive(Clone, Debug)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub constraints: Vec<ClassConstraint>,
    pub ty: Ty,
}

impl Scheme {
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            constraints: Vec::new(),
            ty,
        }
    }

    /// Build a scheme from a resolved type by collecting its free variables
    /// and remapping them to sequential IDs from 0 -- makes the scheme
    /// independent of any particular `InferCtx`'s unification table, so it
    /// can be frozen into a module interface and reloaded elsewhere (§4.5).
    pub fn normalize_from_ty(ty: Ty, constraints: Vec<ClassConstraint>) -> Self {
        let mut seen = Vec::new();
        collect_free_tyvars(&ty, &mut seen);
        if seen.is_empty() {
            return Scheme { vars: Vec::new(), constraints, ty };
        }
        let mut mapping: HashMap<TyVar, TyVar> = HashMap::new();
        let mut next = 0u32;
        for v in &seen {
            mapping.entry(*v).or_insert_with(|| {
                let id = TyVar(next);
                next += 1;
                id
            });
        }
        let mut vars = Vec::new();
        let mut dedup = std::collections::HashSet::new();
        for v in &seen {
            let mapped = mapping[v];
            if dedup.insert(mapped) {
                vars.push(mapped);
            }
        }
        let ty = remap_tyvars(&ty, &mapping);
        let constraints = constraints
            .into_iter()
            .map(|c| ClassConstraint {
                class: c.class,
                var: *mapping.get(&c.var).unwrap_or(&c.var),
            })
            .collect();
        Scheme { vars, constraints, ty }
    }
}

fn collect_free_tyvars(ty: &Ty, out: &mut Vec<TyVar>) {
    match ty {
        Ty::Var(v) => out.push(*v),
        Ty::Con(_) => {}
        Ty::Fun(params, ret, _) => {
            for p in params {
                collect_free_tyvars(p, out);
            }
            collect_free_tyvars(ret, out);
        }
        Ty::App(con, args) => {
            collect_free_tyvars(con, out);
            for a in args {
                collect_free_tyvars(a, out);
            }
        }
        Ty::Tuple(elems) => {
            for e in elems {
                collect_free_tyvars(e, out);
            }
        }
        Ty::Record(row) => {
            for t in row.fields.values() {
                collect_free_tyvars(t, out);
            }
            if let Some(tail) = row.tail {
                out.push(tail);
            }
        }
    }
}

fn remap_tyvars(ty: &Ty, mapping: &HashMap<TyVar, TyVar>) -> Ty {
    match ty {
        Ty::Var(v) => Ty::Var(*mapping.get(v).unwrap_or(v)),
        Ty::Con(_) => ty.clone(),
        Ty::Fun(params, ret, effects) => Ty::Fun(
            params.iter().map(|p| remap_tyvars(p, mapping)).collect(),
            Box::new(remap_tyvars(ret, mapping)),
            effects.clone(),
        ),
        Ty::App(con, args) => Ty::App(
            Box::new(remap_tyvars(con, mapping)),
            args.iter().map(|a| remap_tyvars(a, mapping)).collect(),
        ),
        Ty::Tuple(elems) => Ty::Tuple(elems.iter().map(|e| remap_tyvars(e, mapping)).collect()),
        Ty::Record(row) => Ty::Record(RecordRow {
            fields: row
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), remap_tyvars(v, mapping)))
                .collect(),
            tail: row.tail.map(|t| *mapping.get(&t).unwrap_or(&t)),
        }),
    }
}

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_canonical_form() {
        assert_eq!(format!("{}", Ty::int()), "Int");
        assert_eq!(format!("{}", Ty::list(Ty::int())), "List[Int]");
        assert_eq!(
            format!("{}", Ty::fun(vec![Ty::int()], Ty::bool(), EffectRow::pure())),
            "(Int) -> Bool"
        );
    }

    #[test]
    fn normalize_from_ty_remaps_to_sequential_ids() {
        let ty = Ty::fun(vec![Ty::Var(TyVar(7))], Ty::Var(TyVar(7)), EffectRow::pure());
        let scheme = Scheme::normalize_from_ty(ty, Vec::new());
        assert_eq!(scheme.vars, vec![TyVar(0)]);
    }
}
