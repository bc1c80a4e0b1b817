//! The canonical effect alphabet (§3.1, §6.5) and closed effect rows.

use std::collections::BTreeSet;
use std::fmt;

/// Exactly these labels are valid effect names, case-sensitive. Any other
/// label is a structured error at elaboration (`PAR_EFF002_UNKNOWN`).
pub const CANONICAL_EFFECTS: &[&str] =
    &["IO", "FS", "Net", "Clock", "Rand", "DB", "Trace", "Async"];

pub fn is_canonical_effect(label: &str) -> bool {
    CANONICAL_EFFECTS.contains(&label)
}

/// Case-insensitive nearest-match suggestion for an unknown effect label,
/// used to build the `PAR_EFF002_UNKNOWN` diagnostic's `suggestions` field.
pub fn suggest_effect(label: &str) -> Option<&'static str> {
    let lower = label.to_ascii_lowercase();
    CANONICAL_EFFECTS
        .iter()
        .copied()
        .find(|c| c.to_ascii_lowercase() == lower)
}

/// A closed effect row: a set of canonical effect labels. Effect rows are
/// closed in v0.1 (no polymorphism over effects yet, §3.1), so equality is
/// by label set rather than by any internal representation or order (§3.5
/// invariant 5, §8.1 invariant 5).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EffectRow {
    labels: BTreeSet<String>,
}

impl EffectRow {
    pub fn pure() -> Self {
        EffectRow::default()
    }

    pub fn from_labels<I: IntoIterator<Item = S>, S: Into<String>>(labels: I) -> Self {
        EffectRow {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_pure(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn insert(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    /// The union of two effect rows, used when computing an `App` node's
    /// effects from its callee and its arguments (§4.3.4, §8.1 invariant 6).
    pub fn union(&self, other: &EffectRow) -> EffectRow {
        EffectRow {
            labels: self.labels.union(&other.labels).cloned().collect(),
        }
    }

    /// Labels present in `self` but absent from `other` -- used to build
    /// `ROW_MISMATCH` diagnostics that name the missing labels on each side.
    pub fn missing_from(&self, other: &EffectRow) -> Vec<String> {
        self.labels.difference(&other.labels).cloned().collect()
    }
}

impl fmt::Display for EffectRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.labels.iter().cloned().collect::<Vec<_>>().join(", "))
    }
}

impl FromIterator<String> for EffectRow {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        EffectRow {
            labels: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_label_set_not_order() {
        let a = EffectRow::from_labels(["IO", "FS"]);
        let b = EffectRow::from_labels(["FS", "IO"]);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_label_suggestion_is_case_insensitive() {
        assert_eq!(suggest_effect("io"), Some("IO"));
        assert_eq!(suggest_effect("Network"), None);
    }

    #[test]
    fn union_of_rows_deduplicates() {
        let a = EffectRow::from_labels(["IO"]);
        let b = EffectRow::from_labels(["IO", "Net"]);
        let u = a.union(&b);
        assert_eq!(u.labels().count(), 2);
    }
}
