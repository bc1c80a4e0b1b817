//! The spec registry itself (§4.7): every builtin AILANG programs can call
//! through `VarGlobal("$builtin", name)`, keyed by its fully resolved name
//! (operator builtins already carry the `_<Type>` suffix the lowering pass
//! appends, e.g. `add_Int`).

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use ailang_common::EffectRow;
use ailang_types::{RecordRow, Scheme, Ty, TyVar};

/// One entry in the spec registry: `(name, arity, effect-label, is-pure,
/// type-factory)` verbatim from §4.7.
#[derive(Clone, Debug)]
pub struct BuiltinSpec {
    pub name: &'static str,
    pub arity: usize,
    pub effects: EffectRow,
    pub is_pure: bool,
    pub scheme: Scheme,
}

impl BuiltinSpec {
    fn new(name: &'static str, scheme: Scheme) -> Self {
        let (arity, effects) = match &scheme.ty {
            Ty::Fun(params, _, effects) => (params.len(), effects.clone()),
            _ => (0, EffectRow::pure()),
        };
        BuiltinSpec { name, arity, is_pure: effects.is_pure(), effects, scheme }
    }
}

fn mono(params: Vec<Ty>, ret: Ty, effects: EffectRow) -> Scheme {
    Scheme::mono(Ty::fun(params, ret, effects))
}

/// A scheme polymorphic in a single type variable, e.g. `List[a] -> Int`.
/// The variable's numeric id doesn't need to be globally unique: every
/// instantiation substitutes it for a brand new `InferCtx` variable.
fn poly1(build: impl FnOnce(Ty) -> Ty) -> Scheme {
    let var = TyVar(0);
    Scheme { vars: vec![var], constraints: Vec::new(), ty: build(Ty::Var(var)) }
}

pub static BUILTINS: Lazy<FxHashMap<&'static str, BuiltinSpec>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    let mut add = |spec: BuiltinSpec| {
        m.insert(spec.name, spec);
    };

    // ── Num / Fractional arithmetic, dispatched `<op>_<Type>` by the
    // lowering pass (§4.4) ──────────────────────────────────────────
    for op in ["add", "sub", "mul", "div", "mod"] {
        for (ty_name, ty) in [("Int", Ty::int()), ("Float", Ty::float())] {
            add(BuiltinSpec::new(
                leak(format!("{op}_{ty_name}")),
                mono(vec![ty.clone(), ty.clone()], ty, EffectRow::pure()),
            ));
        }
    }
    for ty_name in ["Int", "Float"] {
        let ty = if ty_name == "Int" { Ty::int() } else { Ty::float() };
        add(BuiltinSpec::new(leak(format!("neg_{ty_name}")), mono(vec![ty.clone()], ty, EffectRow::pure())));
    }

    // ── Eq / Ord, dispatched the same way ───────────────────────────
    for (op, ty_name, ty) in [
        ("eq", "Int", Ty::int()),
        ("eq", "Float", Ty::float()),
        ("eq", "String", Ty::string()),
        ("eq", "Bool", Ty::bool()),
        ("ne", "Int", Ty::int()),
        ("ne", "Float", Ty::float()),
        ("ne", "String", Ty::string()),
        ("ne", "Bool", Ty::bool()),
    ] {
        add(BuiltinSpec::new(leak(format!("{op}_{ty_name}")), mono(vec![ty.clone(), ty], Ty::bool(), EffectRow::pure())));
    }
    for (op, ty_name, ty) in [
        ("lt", "Int", Ty::int()),
        ("lt", "Float", Ty::float()),
        ("lt", "String", Ty::string()),
        ("le", "Int", Ty::int()),
        ("le", "Float", Ty::float()),
        ("le", "String", Ty::string()),
        ("gt", "Int", Ty::int()),
        ("gt", "Float", Ty::float()),
        ("gt", "String", Ty::string()),
        ("ge", "Int", Ty::int()),
        ("ge", "Float", Ty::float()),
        ("ge", "String", Ty::string()),
    ] {
        add(BuiltinSpec::new(leak(format!("{op}_{ty_name}")), mono(vec![ty.clone(), ty], Ty::bool(), EffectRow::pure())));
    }

    // ── Concat / logical not ────────────────────────────────────────
    add(BuiltinSpec::new("concat_String", mono(vec![Ty::string(), Ty::string()], Ty::string(), EffectRow::pure())));
    add(BuiltinSpec::new("not", mono(vec![Ty::bool()], Ty::bool(), EffectRow::pure())));

    // ── String library ──────────────────────────────────────────────
    add(BuiltinSpec::new("_str_len", mono(vec![Ty::string()], Ty::int(), EffectRow::pure())));
    add(BuiltinSpec::new(
        "_str_slice",
        mono(vec![Ty::string(), Ty::int(), Ty::int()], Ty::string(), EffectRow::pure()),
    ));
    add(BuiltinSpec::new("_str_toUpper", mono(vec![Ty::string()], Ty::string(), EffectRow::pure())));
    add(BuiltinSpec::new("_str_toLower", mono(vec![Ty::string()], Ty::string(), EffectRow::pure())));
    add(BuiltinSpec::new(
        "_str_split",
        mono(vec![Ty::string(), Ty::string()], Ty::list(Ty::string()), EffectRow::pure()),
    ));

    // ── List library (polymorphic in the element type) ─────────────
    add(BuiltinSpec::new("_list_len", poly1(|a| Ty::fun(vec![Ty::list(a)], Ty::int(), EffectRow::pure()))));
    add(BuiltinSpec::new(
        "_list_head",
        poly1(|a| Ty::fun(vec![Ty::list(a.clone())], a, EffectRow::pure())),
    ));
    add(BuiltinSpec::new(
        "_list_tail",
        poly1(|a| Ty::fun(vec![Ty::list(a.clone())], Ty::list(a), EffectRow::pure())),
    ));
    add(BuiltinSpec::new(
        "_list_append",
        poly1(|a| Ty::fun(vec![Ty::list(a.clone()), Ty::list(a.clone())], Ty::list(a), EffectRow::pure())),
    ));

    // ── I/O, filesystem, network (effectful, §4.7 illustrative list) ─
    add(BuiltinSpec::new("_io_print", mono(vec![Ty::string()], Ty::unit(), EffectRow::from_labels(["IO"]))));
    add(BuiltinSpec::new("_io_readLine", mono(vec![], Ty::string(), EffectRow::from_labels(["IO"]))));
    add(BuiltinSpec::new(
        "_fs_readFile",
        mono(vec![Ty::string()], Ty::string(), EffectRow::from_labels(["FS"])),
    ));
    add(BuiltinSpec::new(
        "_fs_writeFile",
        mono(vec![Ty::string(), Ty::string()], Ty::unit(), EffectRow::from_labels(["FS"])),
    ));
    add(BuiltinSpec::new(
        "_net_httpRequest",
        mono(
            vec![
                Ty::string(),
                Ty::string(),
                Ty::list(Ty::Record(RecordRow::closed([
                    ("name".to_string(), Ty::string()),
                    ("value".to_string(), Ty::string()),
                ]))),
                Ty::string(),
            ],
            net_result_ty(),
            EffectRow::from_labels(["Net"]),
        ),
    ));
    add(BuiltinSpec::new("_clock_now", mono(vec![], Ty::int(), EffectRow::from_labels(["Clock"]))));
    add(BuiltinSpec::new("_rand_int", mono(vec![Ty::int(), Ty::int()], Ty::int(), EffectRow::from_labels(["Rand"]))));

    m
});

/// `Result[{status: Int, body: String}, NetError]`, approximated here as a
/// two-constructor ADT shape (`Ok`/`Err`) since the registry type factory
/// only needs to name the head constructor, not re-derive the ADT's own
/// declaration (that lives with the standard `type Result` the module
/// loader seeds, §3.3).
fn net_result_ty() -> Ty {
    let response = Ty::Record(RecordRow::closed([
        ("status".to_string(), Ty::int()),
        ("body".to_string(), Ty::string()),
    ]));
    Ty::App(Box::new(Ty::Con(ailang_types::TyCon::new("Result"))), vec![response, Ty::Con(ailang_types::TyCon::new("NetError"))])
}

fn leak(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_print_is_effectful_and_pure_arithmetic_is_not() {
        assert!(!BUILTINS["_io_print"].is_pure);
        assert!(BUILTINS["add_Int"].is_pure);
    }

    #[test]
    fn arity_matches_the_type_factorys_parameter_count() {
        assert_eq!(BUILTINS["add_Int"].arity, 2);
        assert_eq!(BUILTINS["neg_Int"].arity, 1);
        assert_eq!(BUILTINS["_io_readLine"].arity, 0);
    }

    #[test]
    fn list_builtins_are_polymorphic() {
        assert_eq!(BUILTINS["_list_len"].scheme.vars.len(), 1);
    }
}
