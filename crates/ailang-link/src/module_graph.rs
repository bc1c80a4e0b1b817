//! The module dependency graph and topological sort (§4.1).
//!
//! Adapted from a PascalCase-name-keyed module graph; here modules are
//! keyed by their canonical path id directly (a module's path minus the
//! `.ail` suffix, forward-slash normalized, §3.4) rather than a derived
//! display name, since canonical IDs are themselves unique and the
//! `MOD010_MODULE_PATH_MISMATCH` rule is about that same path.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::error::LinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub id: ModuleId,
    /// Canonical module id, e.g. `"math/vector"` (§3.4).
    pub canonical_id: String,
    pub dependencies: Vec<ModuleId>,
    pub is_entry: bool,
}

#[derive(Debug, Default)]
pub struct ModuleGraph {
    pub modules: Vec<ModuleInfo>,
    id_to_index: FxHashMap<String, ModuleId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        ModuleGraph { modules: Vec::new(), id_to_index: FxHashMap::default() }
    }

    pub fn add_module(&mut self, canonical_id: impl Into<String>, is_entry: bool) -> ModuleId {
        let canonical_id = canonical_id.into();
        let id = ModuleId(self.modules.len() as u32);
        self.id_to_index.insert(canonical_id.clone(), id);
        self.modules.push(ModuleInfo { id, canonical_id, dependencies: Vec::new(), is_entry });
        id
    }

    pub fn resolve(&self, canonical_id: &str) -> Option<ModuleId> {
        self.id_to_index.get(canonical_id).copied()
    }

    pub fn add_dependency(&mut self, from: ModuleId, to: ModuleId) {
        if from == to {
            return;
        }
        let deps = &mut self.modules[from.0 as usize].dependencies;
        if !deps.contains(&to) {
            deps.push(to);
        }
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn get(&self, id: ModuleId) -> &ModuleInfo {
        &self.modules[id.0 as usize]
    }
}

/// Kahn's algorithm with alphabetical tie-breaking on the canonical id, so
/// the compilation order is fully deterministic (§3.5, §5).
pub fn topological_sort(graph: &ModuleGraph) -> Result<Vec<ModuleId>, LinkError> {
    let n = graph.modules.len();
    let mut in_degree: Vec<u32> = graph.modules.iter().map(|m| m.dependencies.len() as u32).collect();

    let mut ready: Vec<ModuleId> =
        (0..n).filter(|&i| in_degree[i] == 0).map(|i| ModuleId(i as u32)).collect();
    ready.sort_by(|a, b| graph.modules[a.0 as usize].canonical_id.cmp(&graph.modules[b.0 as usize].canonical_id));

    let mut queue = VecDeque::from(ready);
    let mut order = Vec::with_capacity(n);

    while let Some(id) = queue.pop_front() {
        order.push(id);
        let mut newly_ready = Vec::new();
        for (i, module) in graph.modules.iter().enumerate() {
            if in_degree[i] > 0 && module.dependencies.contains(&id) {
                in_degree[i] -= 1;
                if in_degree[i] == 0 {
                    newly_ready.push(ModuleId(i as u32));
                }
            }
        }
        newly_ready.sort_by(|a, b| graph.modules[a.0 as usize].canonical_id.cmp(&graph.modules[b.0 as usize].canonical_id));
        queue.extend(newly_ready);
    }

    if order.len() == n {
        Ok(order)
    } else {
        Err(LinkError::Cycle { path: extract_cycle_path(graph, &in_degree) })
    }
}

fn extract_cycle_path(graph: &ModuleGraph, in_degree: &[u32]) -> Vec<String> {
    let start = match (0..graph.modules.len()).find(|&i| in_degree[i] > 0) {
        Some(i) => i,
        None => return Vec::new(),
    };

    let mut path = Vec::new();
    let mut visited = vec![false; graph.modules.len()];
    let mut current = start;

    loop {
        if visited[current] {
            let cycle_start_id = &graph.modules[current].canonical_id;
            let cycle_begin = path.iter().position(|id: &String| id == cycle_start_id).unwrap_or(0);
            let mut cycle: Vec<String> = path[cycle_begin..].to_vec();
            cycle.push(cycle_start_id.clone());
            return cycle;
        }

        visited[current] = true;
        path.push(graph.modules[current].canonical_id.clone());

        let next = graph.modules[current].dependencies.iter().find(|dep| in_degree[dep.0 as usize] > 0);
        match next {
            Some(dep) => current = dep.0 as usize,
            None => {
                path.push(graph.modules[current].canonical_id.clone());
                return path;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_resolve_round_trips() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module("math/vector", false);
        let b = graph.add_module("utils", false);
        assert_eq!(graph.resolve("math/vector"), Some(a));
        assert_eq!(graph.resolve("utils"), Some(b));
        assert_eq!(graph.module_count(), 2);
    }

    #[test]
    fn resolve_unknown_is_none() {
        let graph = ModuleGraph::new();
        assert_eq!(graph.resolve("nonexistent"), None);
    }

    #[test]
    fn self_dependency_is_a_no_op() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module("a", false);
        graph.add_dependency(a, a);
        assert!(graph.get(a).dependencies.is_empty());
    }

    #[test]
    fn toposort_linear_chain() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module("a", false);
        let b = graph.add_module("b", false);
        let c = graph.add_module("c", false);
        graph.add_dependency(a, b);
        graph.add_dependency(b, c);

        let order = topological_sort(&graph).unwrap();
        let ids: Vec<&str> = order.iter().map(|id| graph.get(*id).canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn toposort_independent_modules_are_alphabetical() {
        let mut graph = ModuleGraph::new();
        graph.add_module("c", false);
        graph.add_module("a", false);
        graph.add_module("b", false);

        let order = topological_sort(&graph).unwrap();
        let ids: Vec<&str> = order.iter().map(|id| graph.get(*id).canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn toposort_diamond_dependency() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module("a", false);
        let b = graph.add_module("b", false);
        let c = graph.add_module("c", false);
        let d = graph.add_module("d", false);
        graph.add_dependency(a, b);
        graph.add_dependency(a, c);
        graph.add_dependency(b, d);
        graph.add_dependency(c, d);

        let order = topological_sort(&graph).unwrap();
        let ids: Vec<&str> = order.iter().map(|id| graph.get(*id).canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn toposort_reports_a_cycle() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module("a", false);
        let b = graph.add_module("b", false);
        let c = graph.add_module("c", false);
        graph.add_dependency(a, b);
        graph.add_dependency(b, c);
        graph.add_dependency(c, a);

        let err = topological_sort(&graph).unwrap_err();
        match err {
            LinkError::Cycle { path } => {
                assert!(path.len() >= 3);
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected a Cycle error, got {other:?}"),
        }
    }

    #[test]
    fn toposort_entry_module_sorts_last() {
        let mut graph = ModuleGraph::new();
        let main = graph.add_module("main", true);
        let utils = graph.add_module("utils", false);
        let math = graph.add_module("math", false);
        graph.add_dependency(main, utils);
        graph.add_dependency(main, math);

        let order = topological_sort(&graph).unwrap();
        let ids: Vec<&str> = order.iter().map(|id| graph.get(*id).canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["math", "utils", "main"]);
    }
}
