//! The module loader (§4.1): resolves an import path to source text,
//! parses it, and recursively loads its own imports into a `ModuleGraph`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ailang_syntax::ast::SourceFile;

use crate::error::LinkError;
use crate::module_graph::{ModuleGraph, ModuleId};

/// Abstracts over reading module source text so the loader can be
/// exercised against an in-memory fixture instead of the real filesystem.
pub trait SourceProvider {
    fn read(&self, path: &Path) -> Option<String>;
}

pub struct FsProvider;

impl SourceProvider for FsProvider {
    fn read(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

/// An in-memory fixture keyed by the same relative paths a real project
/// would use on disk, for tests that shouldn't touch the filesystem.
#[derive(Default)]
pub struct MapProvider {
    files: BTreeMap<PathBuf, String>,
}

impl MapProvider {
    pub fn new() -> Self {
        MapProvider::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.files.insert(path.into(), source.into());
        self
    }
}

impl SourceProvider for MapProvider {
    fn read(&self, path: &Path) -> Option<String> {
        self.files.get(path).cloned()
    }
}

pub struct SearchPaths {
    pub project_root: PathBuf,
    pub stdlib_root: PathBuf,
}

pub struct LoadedModule {
    pub canonical_id: String,
    pub source: String,
    pub file: SourceFile,
    /// The directory the module's file actually lives in, so modules it
    /// imports can in turn be resolved relative to it.
    pub base_dir: PathBuf,
}

fn module_file_path(root: &Path, module_path: &str) -> PathBuf {
    root.join(format!("{module_path}.ail"))
}

/// Resolve and parse a single module. Search order: relative to the
/// importer's own directory (when given), then the stdlib root, then the
/// project root (§4.1). On failure, `search_trace` lists every path tried,
/// in that order.
pub fn load(
    provider: &dyn SourceProvider,
    paths: &SearchPaths,
    importer_dir: Option<&Path>,
    module_path: &str,
) -> Result<LoadedModule, LinkError> {
    let mut search_trace = Vec::new();

    if let Some(dir) = importer_dir {
        let candidate = module_file_path(dir, module_path);
        search_trace.push(candidate.display().to_string());
        if let Some(source) = provider.read(&candidate) {
            return parse_loaded(module_path.to_string(), source, candidate_dir(&candidate));
        }
    }

    let stdlib_candidate = module_file_path(&paths.stdlib_root, module_path);
    search_trace.push(stdlib_candidate.display().to_string());
    if let Some(source) = provider.read(&stdlib_candidate) {
        return parse_loaded(format!("std/{module_path}"), source, candidate_dir(&stdlib_candidate));
    }

    let project_candidate = module_file_path(&paths.project_root, module_path);
    search_trace.push(project_candidate.display().to_string());
    if let Some(source) = provider.read(&project_candidate) {
        return parse_loaded(module_path.to_string(), source, candidate_dir(&project_candidate));
    }

    Err(LinkError::ModuleNotFound { module: module_path.to_string(), search_trace })
}

fn candidate_dir(file_path: &Path) -> PathBuf {
    file_path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn parse_loaded(canonical_id: String, source: String, base_dir: PathBuf) -> Result<LoadedModule, LinkError> {
    let file = ailang_syntax::parse(&source)
        .map_err(|source_err| LinkError::ParseFailed { module: canonical_id.clone(), source: source_err })?;
    if let Some(declared) = &file.module {
        let exempt = canonical_id.starts_with("std/");
        if !exempt && declared != &canonical_id {
            return Err(LinkError::ModulePathMismatch { declared: declared.clone(), canonical: canonical_id });
        }
    }
    Ok(LoadedModule { canonical_id, source, file, base_dir })
}

/// A fully loaded, dependency-ordered project: every module reachable from
/// `entry_module`, plus the compilation order produced by `topo-sort`.
pub struct ProjectModules {
    pub graph: ModuleGraph,
    pub order: Vec<ModuleId>,
    /// Indexed in parallel with `graph.modules` (by `ModuleId.0`).
    pub modules: Vec<LoadedModule>,
}

/// Load `entry_module` and everything it (transitively) imports, rejecting
/// namespace imports and in-module name conflicts as they're discovered,
/// then topologically sort the result (§4.1).
///
/// A module's imports are resolved relative to *its own* directory (so
/// `math/vector.ail`'s `import utils (...)` checks `math/utils.ail` before
/// falling back to the stdlib and project roots); edges are recorded by the
/// concrete `ModuleId` each import actually resolved to, not by re-matching
/// strings after the fact, since the same spelling can resolve differently
/// for different importers.
pub fn load_project(
    provider: &dyn SourceProvider,
    paths: &SearchPaths,
    entry_module: &str,
) -> Result<ProjectModules, LinkError> {
    tracing::info!(entry_module, "loading project");
    let mut graph = ModuleGraph::new();
    let mut modules: Vec<LoadedModule> = Vec::new();
    let mut canonical_to_id: BTreeMap<String, ModuleId> = BTreeMap::new();
    // (importer_dir, module_path) -> already enqueued/loaded, so diamond
    // imports aren't loaded twice.
    let mut loaded_keys: BTreeMap<(Option<PathBuf>, String), ModuleId> = BTreeMap::new();
    let mut pending: Vec<(Option<PathBuf>, String, bool)> = vec![(None, entry_module.to_string(), true)];

    while let Some((importer_dir, module_path, is_entry)) = pending.pop() {
        let key = (importer_dir.clone(), module_path.clone());
        if loaded_keys.contains_key(&key) {
            continue;
        }

        let loaded = load(provider, paths, importer_dir.as_deref(), &module_path)?;
        check_imports(&loaded)?;

        let id = match canonical_to_id.get(&loaded.canonical_id) {
            // Two different import spellings resolved to the same file.
            Some(&existing) => existing,
            None => {
                let id = graph.add_module(loaded.canonical_id.clone(), is_entry);
                canonical_to_id.insert(loaded.canonical_id.clone(), id);
                debug_assert_eq!(id.0 as usize, modules.len());
                modules.push(loaded);
                id
            }
        };
        loaded_keys.insert(key, id);

        let own_dir = Some(modules[id.0 as usize].base_dir.clone());
        let imports = modules[id.0 as usize].file.imports.clone();
        for import in &imports {
            pending.push((own_dir.clone(), import.module_path.clone(), false));
        }
    }

    // A second pass adds edges once every transitively reachable module has
    // an id (an import can point forward to a module not yet visited).
    for (idx, module) in modules.iter().enumerate() {
        let from = ModuleId(idx as u32);
        let own_dir = Some(module.base_dir.clone());
        for import in &module.file.imports {
            if let Some(&to) = loaded_keys.get(&(own_dir.clone(), import.module_path.clone())) {
                graph.add_dependency(from, to);
            }
        }
    }

    let order = crate::module_graph::topological_sort(&graph)?;
    Ok(ProjectModules { graph, order, modules })
}

/// Reject namespace imports (`IMP012`) and same-module import-name
/// conflicts (`IMP011`); both are detectable from one module's own import
/// list without needing the rest of the project loaded.
fn check_imports(loaded: &LoadedModule) -> Result<(), LinkError> {
    let mut introduced: BTreeMap<&str, &str> = BTreeMap::new();
    for import in &loaded.file.imports {
        let names = match &import.names {
            Some(names) => names,
            None => {
                return Err(LinkError::NamespaceImportRejected {
                    module: import.module_path.clone(),
                    span: import.span,
                });
            }
        };
        for name in names {
            if let Some(&first_source) = introduced.get(name.as_str()) {
                if first_source != import.module_path {
                    return Err(LinkError::ImportConflict {
                        name: name.clone(),
                        first_source: first_source.to_string(),
                        second_source: import.module_path.clone(),
                        span: import.span,
                    });
                }
            } else {
                introduced.insert(name.as_str(), &import.module_path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> SearchPaths {
        SearchPaths { project_root: PathBuf::from("/project"), stdlib_root: PathBuf::from("/std") }
    }

    #[test]
    fn loads_from_the_project_root_when_no_importer_dir_is_given() {
        let provider = MapProvider::new().with_file("/project/utils.ail", "func id(x) { x }");
        let loaded = load(&provider, &paths(), None, "utils").expect("loads");
        assert_eq!(loaded.canonical_id, "utils");
    }

    #[test]
    fn prefers_the_importer_relative_path_over_the_project_root() {
        let provider = MapProvider::new()
            .with_file("/project/math/helper.ail", "func local() { 1 }")
            .with_file("/project/helper.ail", "func local() { 2 }");
        let loaded = load(&provider, &paths(), Some(Path::new("/project/math")), "helper").expect("loads");
        assert!(loaded.source.contains('1'));
    }

    #[test]
    fn falls_back_to_the_stdlib_root_and_exempts_it_from_the_path_match_rule() {
        let provider = MapProvider::new().with_file("/std/list.ail", "module wrong/name\nfunc len(x) { 0 }");
        let loaded = load(&provider, &paths(), None, "list").expect("loads despite the declared-path mismatch");
        assert_eq!(loaded.canonical_id, "std/list");
    }

    #[test]
    fn not_found_anywhere_reports_every_path_tried() {
        let provider = MapProvider::new();
        let err = load(&provider, &paths(), Some(Path::new("/project/a")), "missing").unwrap_err();
        match err {
            LinkError::ModuleNotFound { search_trace, .. } => assert_eq!(search_trace.len(), 3),
            other => panic!("expected ModuleNotFound, got {other:?}"),
        }
    }

    #[test]
    fn declared_module_path_must_match_its_canonical_id() {
        let provider = MapProvider::new().with_file("/project/utils.ail", "module not_utils\nfunc id(x) { x }");
        let err = load(&provider, &paths(), None, "utils").unwrap_err();
        assert!(matches!(err, LinkError::ModulePathMismatch { .. }));
    }

    #[test]
    fn namespace_imports_are_rejected() {
        let loaded = parse_loaded("a".to_string(), "import b\nfunc f() { 1 }".to_string(), PathBuf::new()).unwrap();
        let err = check_imports(&loaded).unwrap_err();
        assert!(matches!(err, LinkError::NamespaceImportRejected { .. }));
    }

    #[test]
    fn conflicting_selective_imports_of_the_same_name_are_rejected() {
        let loaded = parse_loaded(
            "a".to_string(),
            "import b (helper)\nimport c (helper)\nfunc f() { 1 }".to_string(),
            PathBuf::new(),
        )
        .unwrap();
        let err = check_imports(&loaded).unwrap_err();
        assert!(matches!(err, LinkError::ImportConflict { .. }));
    }

    #[test]
    fn same_name_imported_twice_from_the_same_module_is_not_a_conflict() {
        let loaded = parse_loaded(
            "a".to_string(),
            "import b (helper)\nimport b (helper, other)\nfunc f() { 1 }".to_string(),
            PathBuf::new(),
        )
        .unwrap();
        assert!(check_imports(&loaded).is_ok());
    }

    #[test]
    fn load_project_follows_imports_and_produces_a_dependency_order() {
        let provider = MapProvider::new()
            .with_file("/project/main.ail", "import utils (helper)\nfunc main() { helper(1) }")
            .with_file("/project/utils.ail", "export func helper(x) { x }");
        let project = load_project(&provider, &paths(), "main").expect("loads the whole project");
        assert_eq!(project.modules.len(), 2);
        let names: Vec<&str> =
            project.order.iter().map(|id| project.graph.get(*id).canonical_id.as_str()).collect();
        assert_eq!(names, vec!["utils", "main"]);
    }

    #[test]
    fn load_project_reports_a_cycle() {
        let provider = MapProvider::new()
            .with_file("/project/main.ail", "import a (x)\nfunc main() { x }")
            .with_file("/project/a.ail", "import b (y)\nexport func x() { y() }")
            .with_file("/project/b.ail", "import a (x)\nexport func y() { x() }");
        let err = load_project(&provider, &paths(), "main").unwrap_err();
        assert!(matches!(err, LinkError::Cycle { .. }));
    }
}
