//! The `GlobalResolver`: resolves a cross-module `VarGlobal` to either a
//! runtime value (for evaluation) or a type scheme (for inference), per
//! the rules in §4.5.
//!
//! `$builtin` and `$adt` names never reach this resolver -- the evaluator
//! (for values, `ailang-eval`'s `resolve_global`) and the inferencer (for
//! `$adt` constructor schemes, via `resolve_ctor`) both handle those two
//! namespaces themselves before ever calling out to a `TypeResolver` or
//! `ValueResolver`. What's left for `GlobalResolver` is: look the name up
//! in the target module's frozen interface, or resolve it against an
//! already-evaluated module's runtime globals.

use rustc_hash::FxHashMap;

use ailang_eval::{Value, ValueResolver};
use ailang_types::{Scheme, TypeResolver};

use crate::interface::Interface;

/// One already-linked module: its frozen interface (for type lookups) and,
/// once evaluated, its exported runtime values (for value lookups). The
/// two are populated at different pipeline stages -- interfaces exist as
/// soon as a module's own inference pass completes; values exist only
/// after it has actually been evaluated -- so a module can be present here
/// with an interface but no values yet, if inference for a dependent
/// module runs before that dependent is itself evaluated.
#[derive(Default)]
struct LinkedModule {
    interface: Option<Interface>,
    values: FxHashMap<String, Value>,
}

/// Accumulates every module's frozen interface and runtime exports as a
/// project is linked in topological order, and answers both
/// `TypeResolver` and `ValueResolver` queries against them (§4.5).
#[derive(Default)]
pub struct GlobalResolver {
    modules: FxHashMap<String, LinkedModule>,
}

impl GlobalResolver {
    pub fn new() -> Self {
        GlobalResolver::default()
    }

    /// Record a module's frozen interface, making its exports resolvable
    /// by the type inferencer.
    pub fn register_interface(&mut self, module_id: impl Into<String>, interface: Interface) {
        self.modules.entry(module_id.into()).or_default().interface = Some(interface);
    }

    /// Record a module's evaluated exports, making them resolvable by the
    /// evaluator. `exports` is the subset of the module's top-level
    /// globals that its interface marks exported.
    pub fn register_values(&mut self, module_id: impl Into<String>, exports: FxHashMap<String, Value>) {
        self.modules.entry(module_id.into()).or_default().values = exports;
    }

    pub fn interface(&self, module_id: &str) -> Option<&Interface> {
        self.modules.get(module_id).and_then(|m| m.interface.as_ref())
    }

    /// Every exported name a module actually has, sorted -- used to build
    /// the `IMP010` suggestion list when an import names something that
    /// isn't there.
    pub fn sorted_exports(&self, module_id: &str) -> Vec<String> {
        match self.interface(module_id) {
            Some(iface) => {
                let mut names: Vec<String> = iface.exports.keys().cloned().collect();
                names.sort();
                names
            }
            None => Vec::new(),
        }
    }
}

impl TypeResolver for GlobalResolver {
    fn resolve_value(&self, module: &str, name: &str) -> Option<Scheme> {
        let iface = self.interface(module)?;
        iface.exports.get(name).map(|export| export.scheme.clone())
    }

    /// `ctor_name` is the full `make_Type_Ctor` name the elaborator
    /// synthesizes (§4.2), not the bare constructor name -- every module's
    /// constructor table is searched since a `$adt` factory call doesn't
    /// carry its owning module.
    fn resolve_ctor(&self, ctor_name: &str) -> Option<Scheme> {
        let bare = strip_factory_prefix(ctor_name);
        self.modules
            .values()
            .filter_map(|m| m.interface.as_ref())
            .find_map(|iface| iface.constructors.get(bare))
            .map(|entry| entry.scheme.clone())
    }
}

impl ValueResolver for GlobalResolver {
    fn resolve_value(&self, module: &str, name: &str) -> Option<Value> {
        self.modules.get(module)?.values.get(name).cloned()
    }
}

/// Recover the bare constructor name (`Some`) from a `make_Type_Ctor`
/// name, mirroring `ailang-eval`'s own `ctor_name_from_factory`: the
/// registry keys constructors by their bare name, so the synthesized
/// `make_` prefix and type name just need stripping back off.
fn strip_factory_prefix(name: &str) -> &str {
    let without_make = name.strip_prefix("make_").unwrap_or(name);
    match without_make.rsplit_once('_') {
        Some((_, ctor)) => ctor,
        None => without_make,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{ctor_scheme, CtorEntry, ExportEntry, FrozenScheme, Interface, TypeEntry};
    use ailang_core::ir::CtorInfo;
    use ailang_types::{Scheme, Ty};
    use std::collections::BTreeMap;

    fn sample_interface() -> Interface {
        let mut exports = BTreeMap::new();
        exports.insert(
            "helper".to_string(),
            ExportEntry {
                scheme: Scheme::mono(Ty::int()),
                type_scheme: FrozenScheme { vars: vec![], constraints: vec![], ty: "Int".to_string() },
                purity: true,
                reference: "utils::helper".to_string(),
            },
        );
        let mut constructors = BTreeMap::new();
        let info = CtorInfo {
            type_name: "Option".to_string(),
            ctor_name: "Some".to_string(),
            field_arity: 1,
            span: ailang_common::Span::dummy(),
        };
        constructors.insert(
            "Some".to_string(),
            CtorEntry {
                type_name: "Option".to_string(),
                ctor_name: "Some".to_string(),
                field_types: vec!["a".to_string()],
                result_type: "Option[a]".to_string(),
                arity: 1,
                scheme: ctor_scheme(&info, 1),
                type_scheme: FrozenScheme { vars: vec!["a".to_string()], constraints: vec![], ty: "(a) -> Option[a]".to_string() },
            },
        );
        Interface {
            module: "utils".to_string(),
            exports,
            types: BTreeMap::<String, TypeEntry>::new(),
            constructors,
            imports: Vec::new(),
            digest: "deadbeef".to_string(),
        }
    }

    #[test]
    fn resolves_an_export_from_the_named_modules_interface() {
        let mut resolver = GlobalResolver::new();
        resolver.register_interface("utils", sample_interface());
        let scheme = TypeResolver::resolve_value(&resolver, "utils", "helper");
        assert!(scheme.is_some());
    }

    #[test]
    fn unknown_export_resolves_to_none() {
        let mut resolver = GlobalResolver::new();
        resolver.register_interface("utils", sample_interface());
        assert!(TypeResolver::resolve_value(&resolver, "utils", "missing").is_none());
    }

    #[test]
    fn resolve_ctor_finds_a_constructor_across_any_registered_module() {
        let mut resolver = GlobalResolver::new();
        resolver.register_interface("data/option", sample_interface());
        let scheme = resolver.resolve_ctor("make_Option_Some");
        assert!(scheme.is_some());
    }

    #[test]
    fn resolve_value_reads_back_a_registered_runtime_export() {
        let mut resolver = GlobalResolver::new();
        let mut values = FxHashMap::default();
        values.insert("helper".to_string(), Value::Int(42));
        resolver.register_values("utils", values);
        let v = ValueResolver::resolve_value(&resolver, "utils", "helper");
        assert!(matches!(v, Some(Value::Int(42))));
    }

    #[test]
    fn sorted_exports_lists_every_export_name_in_order() {
        let mut resolver = GlobalResolver::new();
        resolver.register_interface("utils", sample_interface());
        assert_eq!(resolver.sorted_exports("utils"), vec!["helper".to_string()]);
    }
}
