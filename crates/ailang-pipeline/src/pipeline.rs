//! `Pipeline::run` (§6.1): drives every module from source text through
//! parse, elaborate, infer, lower, and (in [`crate::Mode::Eval`]) evaluate,
//! registering each module's frozen interface with a shared
//! [`GlobalResolver`] as soon as it's linkable so later modules in
//! dependency order can resolve imports against it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

use ailang_common::{Diagnostic, ToDiagnostic};
use ailang_core::ir::{NodeId, Program};
use ailang_eval::{eval_program, Env, Value};
use ailang_link::{build_interface, load_project, FsProvider, GlobalResolver, Interface, ModuleArtifacts, SearchPaths};
use ailang_types::{infer_program, ClassRegistry, Ty};

use crate::config::{Mode, PipelineConfig};
use crate::error::PipelineError;

/// Where the module(s) to run come from.
pub enum Source {
    /// A project rooted at `project_root`, with `stdlib_root` searched for
    /// standard-library imports, entering at `entry_module` (a canonical
    /// module id, e.g. `"main"`).
    File { project_root: PathBuf, stdlib_root: PathBuf, entry_module: String },
    /// A single, self-contained snippet with no project root: the REPL
    /// case. Rejected if it declares any `import` (§6.1 Open Question --
    /// see DESIGN.md).
    Snippet(String),
}

/// Everything a caller could want out of one [`run`] call, for the entry
/// module specifically; every module's frozen interface is also kept, for
/// tooling that wants the whole project's linked surface.
pub struct PipelineResult {
    pub entry_module: String,
    pub program: Program,
    pub node_types: FxHashMap<NodeId, Ty>,
    pub warnings: Vec<Diagnostic>,
    pub interfaces: BTreeMap<String, Interface>,
    /// Populated only in [`Mode::Eval`].
    pub globals: Option<Env>,
}

const SNIPPET_MODULE_ID: &str = "<snippet>";

/// Run the pipeline end to end for `source` under `config` (§6.1).
///
/// Per the propagation policy (§7), the first phase to report an error
/// short-circuits the whole run; later modules in a multi-module project
/// are never even loaded once an earlier one fails.
pub fn run(config: &PipelineConfig, source: Source) -> Result<PipelineResult, PipelineError> {
    match source {
        Source::File { project_root, stdlib_root, entry_module } => run_project(config, project_root, stdlib_root, entry_module),
        Source::Snippet(text) => run_snippet(config, text),
    }
}

fn run_project(
    config: &PipelineConfig,
    project_root: PathBuf,
    stdlib_root: PathBuf,
    entry_module: String,
) -> Result<PipelineResult, PipelineError> {
    let paths = SearchPaths { project_root, stdlib_root };
    let provider = FsProvider;
    let project = load_project(&provider, &paths, &entry_module).map_err(PipelineError::Link)?;

    let mut resolver = GlobalResolver::new();
    let mut interfaces = BTreeMap::new();
    let mut warnings = Vec::new();

    let mut entry_program = None;
    let mut entry_node_types = FxHashMap::default();
    let mut entry_globals = None;

    for module_id in &project.order {
        let module = &project.modules[module_id.0 as usize];
        let module_name = module.canonical_id.clone();

        let elaborated = ailang_core::elaborate(&module.file);
        if !elaborated.errors.is_empty() {
            return Err(PipelineError::Elaborate(elaborated.errors));
        }
        warnings.extend(elaborated.warnings.iter().map(ToDiagnostic::to_diagnostic));

        let classes = ClassRegistry::with_builtin_instances();
        let inferred = infer_program(&elaborated.program, &resolver, &classes);
        if !inferred.errors.is_empty() {
            return Err(PipelineError::Type(inferred.errors));
        }
        if config.trace_defaulting {
            for (node, class, ty) in &inferred.defaulted {
                warnings.push(
                    Diagnostic::warning("TYP_DEFAULTED", format!("defaulted a {class} constraint to {ty}"))
                        .with_context("node", serde_json::json!(node)),
                );
            }
        }

        let (program, node_types) = if config.needs_lowering() {
            let lowered = ailang_lower::lower_program(elaborated.program, &inferred.node_types);
            if !lowered.errors.is_empty() {
                return Err(PipelineError::Lower(lowered.errors));
            }
            (lowered.program, inferred.node_types)
        } else {
            (elaborated.program, inferred.node_types)
        };

        let module_imports: Vec<String> = module.file.imports.iter().map(|i| i.module_path.clone()).collect();
        let artifacts = ModuleArtifacts {
            canonical_id: &module_name,
            program: &program,
            func_schemes: &inferred.func_schemes,
            let_schemes: &inferred.let_schemes,
            ctors: &elaborated.ctors,
            imports: &module_imports,
        };
        let interface = build_interface(&artifacts);
        resolver.register_interface(module_name.clone(), interface.clone());

        if config.mode == Mode::Eval {
            let out = eval_program(&program, &elaborated.ctors, &resolver);
            if !out.errors.is_empty() {
                return Err(PipelineError::Runtime(out.errors));
            }
            let exported: FxHashMap<String, Value> = interface
                .exports
                .keys()
                .filter_map(|name| out.globals.lookup(name).map(|v| (name.clone(), v)))
                .collect();
            resolver.register_values(module_name.clone(), exported);
            if module_name == entry_module {
                entry_globals = Some(out.globals);
            }
        }

        if module_name == entry_module {
            entry_program = Some(program);
            entry_node_types = node_types;
        }
        interfaces.insert(module_name, interface);
    }

    let program = entry_program.ok_or_else(|| {
        PipelineError::Link(ailang_link::LinkError::ModuleNotFound { module: entry_module.clone(), search_trace: Vec::new() })
    })?;

    Ok(PipelineResult { entry_module, program, node_types: entry_node_types, warnings, interfaces, globals: entry_globals })
}

fn run_snippet(config: &PipelineConfig, text: String) -> Result<PipelineResult, PipelineError> {
    let file = ailang_syntax::parse(&text).map_err(PipelineError::Parse)?;
    if let Some(first_import) = file.imports.first() {
        return Err(PipelineError::SnippetImportsUnsupported { module: first_import.module_path.clone() });
    }

    let elaborated = ailang_core::elaborate(&file);
    if !elaborated.errors.is_empty() {
        return Err(PipelineError::Elaborate(elaborated.errors));
    }
    let mut warnings: Vec<Diagnostic> = elaborated.warnings.iter().map(ToDiagnostic::to_diagnostic).collect();

    let classes = ClassRegistry::with_builtin_instances();
    let noop = ailang_types::NoopResolver;
    let inferred = infer_program(&elaborated.program, &noop, &classes);
    if !inferred.errors.is_empty() {
        return Err(PipelineError::Type(inferred.errors));
    }
    if config.trace_defaulting {
        for (node, class, ty) in &inferred.defaulted {
            warnings.push(
                Diagnostic::warning("TYP_DEFAULTED", format!("defaulted a {class} constraint to {ty}"))
                    .with_context("node", serde_json::json!(node)),
            );
        }
    }

    let (program, node_types) = if config.needs_lowering() {
        let lowered = ailang_lower::lower_program(elaborated.program, &inferred.node_types);
        if !lowered.errors.is_empty() {
            return Err(PipelineError::Lower(lowered.errors));
        }
        (lowered.program, inferred.node_types)
    } else {
        (elaborated.program, inferred.node_types)
    };

    let artifacts = ModuleArtifacts {
        canonical_id: SNIPPET_MODULE_ID,
        program: &program,
        func_schemes: &inferred.func_schemes,
        let_schemes: &inferred.let_schemes,
        ctors: &elaborated.ctors,
        imports: &[],
    };
    let interface = build_interface(&artifacts);
    let mut interfaces = BTreeMap::new();
    interfaces.insert(SNIPPET_MODULE_ID.to_string(), interface);

    let globals = if config.mode == Mode::Eval {
        let out = eval_program(&program, &elaborated.ctors, &ailang_eval::NoopResolver);
        if !out.errors.is_empty() {
            return Err(PipelineError::Runtime(out.errors));
        }
        Some(out.globals)
    } else {
        None
    };

    Ok(PipelineResult {
        entry_module: SNIPPET_MODULE_ID.to_string(),
        program,
        node_types,
        warnings,
        interfaces,
        globals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn snippet_check_mode_infers_without_evaluating() {
        let result = run(&PipelineConfig::check(), Source::Snippet("func main() { 1 + 2 }".to_string())).unwrap();
        assert!(result.globals.is_none());
        assert!(result.interfaces.contains_key(SNIPPET_MODULE_ID));
    }

    #[test]
    fn snippet_eval_mode_runs_it() {
        let result = run(&PipelineConfig::eval(), Source::Snippet("export func main() { 1 + 2 }".to_string())).unwrap();
        let globals = result.globals.expect("eval mode populates globals");
        assert!(matches!(globals.lookup("main"), Some(Value::Closure(_)) | Some(Value::Int(_))));
    }

    #[test]
    fn snippet_with_an_import_is_rejected() {
        let err = run(&PipelineConfig::check(), Source::Snippet("import utils (helper)\nfunc main() { 1 }".to_string())).unwrap_err();
        assert!(matches!(err, PipelineError::SnippetImportsUnsupported { .. }));
    }

    #[test]
    fn snippet_type_error_short_circuits_before_lowering() {
        let err = run(&PipelineConfig::check(), Source::Snippet("func main() { 1 + \"a\" }".to_string())).unwrap_err();
        assert!(matches!(err, PipelineError::Type(_)));
    }

    #[test]
    fn project_links_two_modules_through_a_shared_resolver() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stdlib = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("utils.ail"), "export func helper(x) { x + 1 }").unwrap();
        let mut main_file = std::fs::File::create(dir.path().join("main.ail")).unwrap();
        writeln!(main_file, "import utils (helper)\nexport func main() {{ helper(41) }}").unwrap();
        drop(main_file);

        let result = run(
            &PipelineConfig::eval(),
            Source::File {
                project_root: dir.path().to_path_buf(),
                stdlib_root: stdlib.path().to_path_buf(),
                entry_module: "main".to_string(),
            },
        )
        .unwrap();
        assert!(result.interfaces.contains_key("utils"));
        assert!(result.interfaces.contains_key("main"));
    }
}
