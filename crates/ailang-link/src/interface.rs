//! Frozen module interfaces: construction, canonical JSON, and the
//! content-addressed digest (§3.4, §4.5, §6.3).
//!
//! An interface is built once, after a module's Core has been elaborated
//! and inferred, and is never mutated afterward -- two interfaces are
//! semantically equal iff their digests match.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;
use sha2::{Digest as _, Sha256};

use ailang_core::ir::{CtorInfo, Program};
use ailang_types::{ClassConstraint, Scheme, Ty, TyCon, TyVar};

/// A type scheme rendered for freezing: type variables already carry their
/// canonical letter names (`a`, `b`, ...), assigned in left-to-right order
/// of first appearance by [`Scheme::normalize_from_ty`] before this struct
/// is ever built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrozenScheme {
    pub vars: Vec<String>,
    pub constraints: Vec<String>,
    pub ty: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
    /// The real scheme, kept alongside its frozen rendering so the
    /// `GlobalResolver` can hand it straight to the inferencer without
    /// having to parse `type_scheme.ty` back out of a display string.
    #[serde(skip)]
    pub scheme: Scheme,
    #[serde(rename = "type-scheme")]
    pub type_scheme: FrozenScheme,
    pub purity: bool,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeEntry {
    pub arity: usize,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CtorEntry {
    #[serde(rename = "type-name")]
    pub type_name: String,
    #[serde(rename = "ctor-name")]
    pub ctor_name: String,
    #[serde(rename = "field-types")]
    pub field_types: Vec<String>,
    #[serde(rename = "result-type")]
    pub result_type: String,
    pub arity: usize,
    /// The factory scheme `forall a... (field-types...) -> Type[a...]`
    /// (§4.5), consulted by the linker when a `$adt` factory is resolved
    /// during type inference rather than evaluation.
    #[serde(skip)]
    pub scheme: Scheme,
    #[serde(rename = "type-scheme")]
    pub type_scheme: FrozenScheme,
}

/// A module's frozen interface (§3.4, §6.3). Field order matches the
/// spec's normalized JSON exactly: `module, exports, types, constructors,
/// imports, digest`.
#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub module: String,
    pub exports: BTreeMap<String, ExportEntry>,
    pub types: BTreeMap<String, TypeEntry>,
    pub constructors: BTreeMap<String, CtorEntry>,
    pub imports: Vec<String>,
    pub digest: String,
}

/// Two interfaces are equal iff their digests match (§4.5) -- the digest
/// is a hash over every field that matters, so there's no reason to walk
/// the rest of the struct too.
impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

/// Canonical letter name for a type variable. `Scheme::normalize_from_ty`
/// has already remapped every variable in a frozen scheme to sequential
/// ids in first-appearance order, so the id itself doubles as the
/// canonicalized position (§4.5).
fn var_name(v: TyVar) -> String {
    let n = v.0;
    if n < 26 {
        ((b'a' + n as u8) as char).to_string()
    } else {
        format!("t{n}")
    }
}

fn render_ty(ty: &Ty) -> String {
    match ty {
        Ty::Var(v) => var_name(*v),
        Ty::Con(c) => c.name.clone(),
        Ty::Fun(params, ret, effects) => {
            let params = params.iter().map(render_ty).collect::<Vec<_>>().join(", ");
            if effects.is_pure() {
                format!("({params}) -> {}", render_ty(ret))
            } else {
                let labels: Vec<&str> = effects.labels().collect();
                format!("({params}) -{{{}}}-> {}", labels.join(", "), render_ty(ret))
            }
        }
        Ty::App(con, args) => {
            if args.is_empty() {
                render_ty(con)
            } else {
                let args = args.iter().map(render_ty).collect::<Vec<_>>().join(", ");
                format!("{}[{args}]", render_ty(con))
            }
        }
        Ty::Tuple(elems) => {
            format!("({})", elems.iter().map(render_ty).collect::<Vec<_>>().join(", "))
        }
        Ty::Record(row) => {
            let mut fields: Vec<String> = row.fields.iter().map(|(k, v)| format!("{k}: {}", render_ty(v))).collect();
            fields.sort();
            match row.tail {
                Some(t) => format!("{{{} | {}}}", fields.join(", "), var_name(t)),
                None => format!("{{{}}}", fields.join(", ")),
            }
        }
    }
}

fn render_constraint(c: &ClassConstraint) -> String {
    format!("{} {}", c.class, var_name(c.var))
}

fn freeze_scheme(scheme: &Scheme) -> FrozenScheme {
    FrozenScheme {
        vars: scheme.vars.iter().copied().map(var_name).collect(),
        constraints: scheme.constraints.iter().map(render_constraint).collect(),
        ty: render_ty(&scheme.ty),
    }
}

fn purity_of(ty: &Ty) -> bool {
    match ty {
        Ty::Fun(_, _, effects) => effects.is_pure(),
        _ => true,
    }
}

/// Builds the scheme `forall a0..an. (field-types...) -> Type[a0..an]` for
/// a constructor, per §4.5.
///
/// Core erases a constructor's declared field types during elaboration
/// (`CtorInfo` keeps only `field_arity`, not the surface `CtorDef`'s
/// `TypeExpr`s), so the field <-> type-parameter correspondence can't be
/// read back from Core directly. We assume the common case found
/// throughout this language's own data types (`Option[a] = Some(a) |
/// None`, `Result[a, b] = Ok(a) | Err(b)`, ...): constructor field `i`
/// takes the type's generic parameter at index `i mod arity`. This ties
/// field types to the result type's parameters, unlike treating each
/// field as an independent fresh variable, which would let a `match` on
/// `Some(n)` lose track of `n`'s relationship to the `Option`'s own
/// parameter.
pub fn ctor_scheme(ctor: &CtorInfo, type_arity: usize) -> Scheme {
    let result_vars: Vec<TyVar> = (0..type_arity as u32).map(TyVar).collect();
    let result_ty = if result_vars.is_empty() {
        Ty::Con(TyCon::new(ctor.type_name.clone()))
    } else {
        Ty::App(
            Box::new(Ty::Con(TyCon::new(ctor.type_name.clone()))),
            result_vars.iter().map(|v| Ty::Var(*v)).collect(),
        )
    };

    if ctor.field_arity == 0 {
        return Scheme::normalize_from_ty(result_ty, Vec::new());
    }

    let field_tys: Vec<Ty> = (0..ctor.field_arity)
        .map(|i| {
            if type_arity > 0 {
                Ty::Var(result_vars[i % type_arity])
            } else {
                Ty::Var(TyVar(i as u32))
            }
        })
        .collect();
    let ty = Ty::fun(field_tys, result_ty, ailang_common::EffectRow::pure());
    Scheme::normalize_from_ty(ty, Vec::new())
}

/// Inputs needed to build one module's interface: its elaborated Core, the
/// schemes inference assigned to its top-level functions and `let`s, and
/// the constructor/type tables the elaborator collected for it.
pub struct ModuleArtifacts<'a> {
    pub canonical_id: &'a str,
    pub program: &'a Program,
    pub func_schemes: &'a FxHashMap<String, Scheme>,
    pub let_schemes: &'a FxHashMap<String, Scheme>,
    pub ctors: &'a FxHashMap<String, CtorInfo>,
    pub imports: &'a [String],
}

/// Walks a module's Core, collecting its exported functions/lets with
/// their inferred schemes, its exported types, and their constructors,
/// then freezes the result into a digest-stamped [`Interface`] (§4.5).
pub fn build_interface(artifacts: &ModuleArtifacts<'_>) -> Interface {
    let mut exports = BTreeMap::new();

    for func in &artifacts.program.funcs {
        if !func.exported {
            continue;
        }
        let Some(scheme) = artifacts.func_schemes.get(&func.name) else {
            continue;
        };
        exports.insert(
            func.name.clone(),
            ExportEntry {
                purity: purity_of(&scheme.ty),
                type_scheme: freeze_scheme(scheme),
                scheme: scheme.clone(),
                reference: format!("{}::{}", artifacts.canonical_id, func.name),
            },
        );
    }

    for (name, _expr, exported) in &artifacts.program.lets {
        if !exported {
            continue;
        }
        let Some(scheme) = artifacts.let_schemes.get(name) else {
            continue;
        };
        exports.insert(
            name.clone(),
            ExportEntry {
                purity: purity_of(&scheme.ty),
                type_scheme: freeze_scheme(scheme),
                scheme: scheme.clone(),
                reference: format!("{}::{}", artifacts.canonical_id, name),
            },
        );
    }

    let mut types = BTreeMap::new();
    for type_def in &artifacts.program.types {
        if !type_def.exported {
            continue;
        }
        types.insert(
            type_def.name.clone(),
            TypeEntry { arity: type_def.type_params.len(), kind: "Star".to_string() },
        );
    }

    let mut constructors = BTreeMap::new();
    for type_def in &artifacts.program.types {
        if !type_def.exported {
            continue;
        }
        let arity = type_def.type_params.len();
        for ctor_name in &type_def.ctors {
            let Some(info) = artifacts.ctors.get(ctor_name) else {
                continue;
            };
            let scheme = ctor_scheme(info, arity);
            let (field_types, result_type) = match &scheme.ty {
                Ty::Fun(params, ret, _) => (params.iter().map(render_ty).collect(), render_ty(ret)),
                other => (Vec::new(), render_ty(other)),
            };
            constructors.insert(
                ctor_name.clone(),
                CtorEntry {
                    type_name: info.type_name.clone(),
                    ctor_name: info.ctor_name.clone(),
                    field_types,
                    result_type,
                    arity: info.field_arity,
                    type_scheme: freeze_scheme(&scheme),
                    scheme,
                },
            );
        }
    }

    let mut imports: Vec<String> = artifacts.imports.to_vec();
    imports.sort();
    imports.dedup();

    let digest = digest_of(artifacts.canonical_id, &exports, &types, &constructors, &imports);
    tracing::debug!(module = artifacts.canonical_id, exports = exports.len(), digest, "froze module interface");

    Interface { module: artifacts.canonical_id.to_string(), exports, types, constructors, imports, digest }
}

/// SHA-256 over the UTF-8 bytes of the interface's normalized JSON, with
/// `digest` itself held out of the hashed payload (§4.5, §6.3).
fn digest_of(
    module: &str,
    exports: &BTreeMap<String, ExportEntry>,
    types: &BTreeMap<String, TypeEntry>,
    constructors: &BTreeMap<String, CtorEntry>,
    imports: &[String],
) -> String {
    #[derive(Serialize)]
    struct Undigested<'a> {
        module: &'a str,
        exports: &'a BTreeMap<String, ExportEntry>,
        types: &'a BTreeMap<String, TypeEntry>,
        constructors: &'a BTreeMap<String, CtorEntry>,
        imports: &'a [String],
    }

    let payload = Undigested { module, exports, types, constructors, imports };
    let json = serde_json::to_string(&payload).expect("interface payload is always serializable");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailang_common::Span;

    fn ctor(type_name: &str, ctor_name: &str, field_arity: usize) -> CtorInfo {
        CtorInfo { type_name: type_name.to_string(), ctor_name: ctor_name.to_string(), field_arity, span: Span::dummy() }
    }

    #[test]
    fn nullary_ctor_scheme_is_just_the_result_type() {
        let scheme = ctor_scheme(&ctor("Option", "None", 0), 1);
        assert!(scheme.vars.len() == 1);
        assert_eq!(render_ty(&scheme.ty), "Option[a]");
    }

    #[test]
    fn unary_ctor_ties_its_field_to_the_type_parameter() {
        let scheme = ctor_scheme(&ctor("Option", "Some", 1), 1);
        assert_eq!(render_ty(&scheme.ty), "(a) -> Option[a]");
    }

    #[test]
    fn two_field_ctor_maps_each_field_to_its_own_parameter() {
        let scheme = ctor_scheme(&ctor("Result", "Ok", 1), 2);
        assert_eq!(render_ty(&scheme.ty), "(a) -> Result[a, b]");
    }

    #[test]
    fn digest_is_stable_across_rebuilds_of_the_same_inputs() {
        let exports = BTreeMap::new();
        let types = BTreeMap::new();
        let ctors = BTreeMap::new();
        let a = digest_of("m", &exports, &types, &ctors, &[]);
        let b = digest_of("m", &exports, &types, &ctors, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn digest_changes_when_an_export_changes() {
        let empty_ctors = BTreeMap::new();
        let empty_types = BTreeMap::new();
        let mut exports_a = BTreeMap::new();
        exports_a.insert(
            "f".to_string(),
            ExportEntry {
                scheme: Scheme::mono(Ty::int()),
                type_scheme: FrozenScheme { vars: vec![], constraints: vec![], ty: "Int".to_string() },
                purity: true,
                reference: "m::f".to_string(),
            },
        );
        let mut exports_b = exports_a.clone();
        exports_b.get_mut("f").unwrap().purity = false;

        let a = digest_of("m", &exports_a, &empty_types, &empty_ctors, &[]);
        let b = digest_of("m", &exports_b, &empty_types, &empty_ctors, &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn build_interface_exports_only_exported_declarations() {
        let program = Program {
            funcs: vec![
                ailang_core::ir::FuncDef {
                    name: "pub_fn".to_string(),
                    params: vec!["x".to_string()],
                    body: ailang_core::ir::Expr::Lit { id: 0, value: ailang_core::ir::LitValue::Unit, span: Span::dummy() },
                    declared_effects: None,
                    exported: true,
                    span: Span::dummy(),
                },
                ailang_core::ir::FuncDef {
                    name: "priv_fn".to_string(),
                    params: vec![],
                    body: ailang_core::ir::Expr::Lit { id: 1, value: ailang_core::ir::LitValue::Unit, span: Span::dummy() },
                    declared_effects: None,
                    exported: false,
                    span: Span::dummy(),
                },
            ],
            types: Vec::new(),
            lets: Vec::new(),
        };
        let mut func_schemes = FxHashMap::default();
        func_schemes.insert("pub_fn".to_string(), Scheme::mono(Ty::fun(vec![Ty::int()], Ty::int(), ailang_common::EffectRow::pure())));
        func_schemes.insert("priv_fn".to_string(), Scheme::mono(Ty::unit()));
        let let_schemes = FxHashMap::default();
        let ctors = FxHashMap::default();

        let artifacts = ModuleArtifacts {
            canonical_id: "m",
            program: &program,
            func_schemes: &func_schemes,
            let_schemes: &let_schemes,
            ctors: &ctors,
            imports: &[],
        };
        let iface = build_interface(&artifacts);
        assert!(iface.exports.contains_key("pub_fn"));
        assert!(!iface.exports.contains_key("priv_fn"));
        assert_eq!(iface.exports["pub_fn"].reference, "m::pub_fn");
    }
}
