//! Class/instance registry for dictionary-passing constraint resolution
//! (§4.3.6, §4.4, §9). The surface language has no `interface`/`impl`
//! declarations (§1 [EXPANDED]), so every class here is compiler-known: the
//! handful of classes operator dispatch needs (`Num`, `Fractional`, `Eq`,
//! `Ord`, `Concat`).

use rustc_hash::FxHashMap;

use crate::ty::Ty;

/// An instance of a class at one concrete head type, naming the builtin
/// method that implements each of the class's operations.
#[derive(Clone, Debug)]
pub struct ClassInstance {
    pub ty: Ty,
    /// Base method name -> the `$builtin` name that implements it for `ty`
    /// (before the `_<Type>` suffix is appended by the lowering pass).
    pub methods: FxHashMap<&'static str, String>,
}

#[derive(Default, Debug)]
pub struct ClassRegistry {
    instances: FxHashMap<&'static str, Vec<ClassInstance>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        ClassRegistry::default()
    }

    /// Populate the registry with the builtin instances every AILANG program
    /// gets for free: `Num`/`Fractional` arithmetic, `Eq`/`Ord` comparisons,
    /// and `Concat` for `String` (§9 open question: `List` concatenation is
    /// deferred, see DESIGN.md).
    pub fn with_builtin_instances() -> Self {
        let mut reg = ClassRegistry::new();
        reg.register("Num", Ty::int(), &[("add", "add"), ("sub", "sub"), ("mul", "mul"), ("div", "div"), ("mod", "mod"), ("neg", "neg")]);
        reg.register("Num", Ty::float(), &[("add", "add"), ("sub", "sub"), ("mul", "mul"), ("div", "div"), ("mod", "mod"), ("neg", "neg")]);
        reg.register("Fractional", Ty::float(), &[("div", "div")]);
        for ty in [Ty::int(), Ty::float(), Ty::string(), Ty::bool()] {
            reg.register("Eq", ty.clone(), &[("eq", "eq"), ("ne", "ne")]);
        }
        for ty in [Ty::int(), Ty::float(), Ty::string()] {
            reg.register("Ord", ty, &[("lt", "lt"), ("le", "le"), ("gt", "gt"), ("ge", "ge")]);
        }
        reg.register("Concat", Ty::string(), &[("concat", "concat")]);
        reg
    }

    fn register(&mut self, class: &'static str, ty: Ty, methods: &[(&'static str, &str)]) {
        let instance = ClassInstance {
            ty,
            methods: methods.iter().map(|(op, m)| (*op, m.to_string())).collect(),
        };
        self.instances.entry(class).or_default().push(instance);
    }

    /// The instance of `class` whose head type matches `ty`'s head name, if
    /// any (§4.3.6: class resolution is by concrete head type, not full
    /// unification -- classes here never range over compound types).
    pub fn find_instance(&self, class: &str, ty: &Ty) -> Option<&ClassInstance> {
        let head = ty.head_name()?;
        self.instances
            .get(class)?
            .iter()
            .find(|inst| inst.ty.head_name() == Some(head))
    }

    pub fn has_instance(&self, class: &str, ty: &Ty) -> bool {
        self.find_instance(class, ty).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_has_num_and_eq_but_not_fractional() {
        let reg = ClassRegistry::with_builtin_instances();
        assert!(reg.has_instance("Num", &Ty::int()));
        assert!(reg.has_instance("Eq", &Ty::int()));
        assert!(!reg.has_instance("Fractional", &Ty::int()));
    }

    #[test]
    fn string_has_concat_and_eq_but_not_num() {
        let reg = ClassRegistry::with_builtin_instances();
        assert!(reg.has_instance("Concat", &Ty::string()));
        assert!(reg.has_instance("Eq", &Ty::string()));
        assert!(!reg.has_instance("Num", &Ty::string()));
        assert!(!reg.has_instance("Ord", &Ty::bool()));
    }
}
