//! `CallEntrypoint` (§6.1): locate an exported function in the root
//! module's frozen interface, decode 0 or 1 JSON argument against its
//! inferred parameter type, and run it to a value.

use rustc_hash::FxHashMap;

use ailang_common::Span;
use ailang_core::ir::CtorInfo;
use ailang_eval::{Env, Evaluator, Value, ValueResolver};
use ailang_link::Interface;
use ailang_types::Ty;

use crate::decode::decode_json_arg;
use crate::error::PipelineError;

/// `args` carries 0 or 1 already-parsed JSON values; a multi-argument
/// AILANG function must be called through a wrapper that takes a single
/// tuple or record, per §6.1.
pub fn call_entrypoint(
    interface: &Interface,
    globals: &Env,
    ctors: &FxHashMap<String, CtorInfo>,
    resolver: &dyn ValueResolver,
    name: &str,
    args: Vec<serde_json::Value>,
) -> Result<Value, PipelineError> {
    if args.len() > 1 {
        return Err(PipelineError::TooManyArguments { name: name.to_string(), count: args.len() });
    }

    let export = interface.exports.get(name).ok_or_else(|| {
        let mut available: Vec<String> = interface.exports.keys().cloned().collect();
        available.sort();
        PipelineError::UnknownEntrypoint { name: name.to_string(), available }
    })?;

    let param_ty = match &export.scheme.ty {
        Ty::Fun(params, _, _) => params.first().cloned(),
        _ => None,
    };

    let mut decoded_args = Vec::with_capacity(args.len());
    if let Some(json) = args.into_iter().next() {
        let ty = param_ty.unwrap_or_else(Ty::unit);
        decoded_args.push(decode_json_arg(&json, &ty)?);
    }

    let callee = globals.lookup(name).ok_or_else(|| PipelineError::UnknownEntrypoint {
        name: name.to_string(),
        available: Vec::new(),
    })?;

    let mut evaluator = Evaluator::new(ctors, resolver);
    evaluator.apply(callee, decoded_args, 0, Span::dummy()).map_err(|e| PipelineError::Runtime(vec![e]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailang_core::elaborate;
    use ailang_eval::{eval_program, NoopResolver};
    use ailang_syntax::parse;
    use ailang_types::{infer_program, ClassRegistry, NoopResolver as TypesNoopResolver};

    fn build(src: &str) -> (Interface, Env, FxHashMap<String, CtorInfo>) {
        let file = parse(src).expect("parses");
        let elaborated = elaborate(&file);
        assert!(elaborated.errors.is_empty());
        let inferred = infer_program(&elaborated.program, &TypesNoopResolver, &ClassRegistry::with_builtin_instances());
        assert!(inferred.errors.is_empty());
        let lowered = ailang_lower::lower_program(elaborated.program, &inferred.node_types);
        assert!(lowered.errors.is_empty());
        let out = eval_program(&lowered.program, &elaborated.ctors, &NoopResolver);
        assert!(out.errors.is_empty());

        let artifacts = ailang_link::ModuleArtifacts {
            canonical_id: "entry",
            program: &lowered.program,
            func_schemes: &inferred.func_schemes,
            let_schemes: &inferred.let_schemes,
            ctors: &elaborated.ctors,
            imports: &[],
        };
        let interface = ailang_link::build_interface(&artifacts);
        (interface, out.globals, elaborated.ctors)
    }

    #[test]
    fn calls_a_zero_arg_export_and_returns_its_value() {
        let (iface, globals, ctors) = build("export func main() { 1 + 2 }");
        let result = call_entrypoint(&iface, &globals, &ctors, &NoopResolver, "main", Vec::new()).unwrap();
        assert!(matches!(result, Value::Int(3)));
    }

    #[test]
    fn calls_a_one_arg_export_decoding_the_json_argument() {
        let (iface, globals, ctors) = build("export func double(x) { x + x }");
        let result =
            call_entrypoint(&iface, &globals, &ctors, &NoopResolver, "double", vec![serde_json::json!(21)]).unwrap();
        assert!(matches!(result, Value::Int(42)));
    }

    #[test]
    fn unknown_export_is_reported_with_suggestions() {
        let (iface, globals, ctors) = build("export func main() { 1 }");
        let err = call_entrypoint(&iface, &globals, &ctors, &NoopResolver, "Main", Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownEntrypoint { .. }));
    }

    #[test]
    fn more_than_one_argument_is_rejected() {
        let (iface, globals, ctors) = build("export func double(x) { x + x }");
        let err = call_entrypoint(
            &iface,
            &globals,
            &ctors,
            &NoopResolver,
            "double",
            vec![serde_json::json!(1), serde_json::json!(2)],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::TooManyArguments { .. }));
    }
}
