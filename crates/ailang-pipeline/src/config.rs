//! `PipelineConfig` (§6.1): the knobs a CLI or REPL picks before calling
//! [`crate::run`].

/// Whether a run stops at static checking or goes on to evaluate the
/// module's `let`s and functions into runtime values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Eval,
}

/// Configuration for one [`crate::run`] call.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mode: Mode,
    /// Run the operator-lowering pass even in `Check` mode, so a missing
    /// builtin or an unresolved operand type is reported without actually
    /// evaluating anything.
    pub force_lower: bool,
    /// Keep each class-constrained call site's instantiated type around in
    /// [`crate::PipelineResult::instantiations`], for tooling that wants to
    /// show "this `+` resolved to `add_Float` here".
    pub track_instantiations: bool,
    /// Surface every `Num`/`Fractional` constraint the inferencer defaulted
    /// to `Int`/`Float` instead of generalizing, in
    /// [`crate::PipelineResult::warnings`].
    pub trace_defaulting: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig { mode: Mode::Check, force_lower: false, track_instantiations: false, trace_defaulting: false }
    }
}

impl PipelineConfig {
    /// `Check` mode with every optional trace off -- what a "does this
    /// compile" tooling call wants.
    pub fn check() -> Self {
        PipelineConfig::default()
    }

    /// `Eval` mode with every optional trace off -- what the REPL wants.
    pub fn eval() -> Self {
        PipelineConfig { mode: Mode::Eval, ..PipelineConfig::default() }
    }

    pub fn with_force_lower(mut self, yes: bool) -> Self {
        self.force_lower = yes;
        self
    }

    pub fn with_track_instantiations(mut self, yes: bool) -> Self {
        self.track_instantiations = yes;
        self
    }

    pub fn with_trace_defaulting(mut self, yes: bool) -> Self {
        self.trace_defaulting = yes;
        self
    }

    /// Whether the lowering pass needs to run at all for this config.
    pub(crate) fn needs_lowering(&self) -> bool {
        self.mode == Mode::Eval || self.force_lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_defaults_to_no_optional_traces() {
        let cfg = PipelineConfig::check();
        assert_eq!(cfg.mode, Mode::Check);
        assert!(!cfg.force_lower);
        assert!(!cfg.needs_lowering());
    }

    #[test]
    fn eval_always_needs_lowering() {
        let cfg = PipelineConfig::eval().with_force_lower(false);
        assert!(cfg.needs_lowering());
    }

    #[test]
    fn check_with_force_lower_needs_lowering() {
        let cfg = PipelineConfig::check().with_force_lower(true);
        assert!(cfg.needs_lowering());
    }
}
