//! Three-way consistency check between the spec registry, the `$builtin`
//! interface surfaced to the linker, and the type environment seeded into
//! inference (§4.7). A mismatch in any projection is the class of bug the
//! v0.3.10 regression guarded against: a builtin's declared effect drifting
//! out of sync between what the type checker assumes and what the
//! interface (and therefore importers) actually sees.

use std::fmt;

use crate::registry::BUILTINS;
use ailang_common::EffectRow;

/// `(name, arity, sorted-effects, purity)`, the canonical projection every
/// view is reduced to before comparison (§4.7).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalBuiltin {
    pub name: String,
    pub arity: usize,
    pub effects: Vec<String>,
    pub is_pure: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsistencyError {
    MissingInView { name: String, view: &'static str },
    Mismatch { name: String, registry: CanonicalBuiltin, other_view: &'static str, other: CanonicalBuiltin },
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyError::MissingInView { name, view } => {
                write!(f, "builtin `{name}` is in the spec registry but missing from the {view} view")
            }
            ConsistencyError::Mismatch { name, registry, other_view, other } => {
                write!(
                    f,
                    "builtin `{name}` disagrees between the registry ({registry:?}) and the {other_view} view ({other:?})"
                )
            }
        }
    }
}

fn canonicalize(name: &str, arity: usize, effects: &EffectRow, is_pure: bool) -> CanonicalBuiltin {
    let mut labels: Vec<String> = effects.labels().map(str::to_string).collect();
    labels.sort();
    CanonicalBuiltin { name: name.to_string(), arity, effects: labels, is_pure }
}

/// Check a candidate view (e.g. the linker's `$builtin` interface, or the
/// type environment's seed) against the spec registry. `view` supplies,
/// for each registry entry it claims to cover, its own `(arity, effects,
/// is_pure)` -- callers build this from whatever representation that view
/// actually uses internally.
pub fn check_consistency(
    view_name: &'static str,
    view: &dyn Fn(&str) -> Option<(usize, EffectRow, bool)>,
) -> Vec<ConsistencyError> {
    let mut errors = Vec::new();
    for spec in BUILTINS.values() {
        let registry_canon = canonicalize(spec.name, spec.arity, &spec.effects, spec.is_pure);
        match view(spec.name) {
            None => errors.push(ConsistencyError::MissingInView { name: spec.name.to_string(), view: view_name }),
            Some((arity, effects, is_pure)) => {
                let other_canon = canonicalize(spec.name, arity, &effects, is_pure);
                if other_canon != registry_canon {
                    errors.push(ConsistencyError::Mismatch {
                        name: spec.name.to_string(),
                        registry: registry_canon,
                        other_view: view_name,
                        other: other_canon,
                    });
                }
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_view_has_no_violations() {
        let view = |name: &str| BUILTINS.get(name).map(|s| (s.arity, s.effects.clone(), s.is_pure));
        assert!(check_consistency("identity", &view).is_empty());
    }

    #[test]
    fn drifted_effect_is_flagged() {
        let view = |name: &str| {
            BUILTINS.get(name).map(|s| {
                if name == "_io_print" {
                    (s.arity, EffectRow::pure(), s.is_pure)
                } else {
                    (s.arity, s.effects.clone(), s.is_pure)
                }
            })
        };
        let errors = check_consistency("drifted", &view);
        assert!(errors.iter().any(|e| matches!(e, ConsistencyError::Mismatch { name, .. } if name == "_io_print")));
    }

    #[test]
    fn missing_builtin_is_flagged() {
        let view = |name: &str| if name == "_io_print" { None } else { BUILTINS.get(name).map(|s| (s.arity, s.effects.clone(), s.is_pure)) };
        let errors = check_consistency("partial", &view);
        assert!(errors.iter().any(|e| matches!(e, ConsistencyError::MissingInView { name, .. } if name == "_io_print")));
    }
}
