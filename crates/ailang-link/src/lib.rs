//! Module loading, topological sort, interface freezing, and the
//! `GlobalResolver` linker (§3.4, §4.1, §4.5).

pub mod error;
pub mod interface;
pub mod loader;
pub mod module_graph;
pub mod resolver;

pub use error::LinkError;
pub use interface::{build_interface, ctor_scheme, CtorEntry, ExportEntry, FrozenScheme, Interface, ModuleArtifacts, TypeEntry};
pub use loader::{load, load_project, FsProvider, LoadedModule, MapProvider, ProjectModules, SearchPaths, SourceProvider};
pub use module_graph::{topological_sort, ModuleGraph, ModuleId, ModuleInfo};
pub use resolver::GlobalResolver;
