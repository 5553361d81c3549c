//! Dependency tracking between formula fields

use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

/// Dependency graph for formula fields
///
/// Only formula fields have precedents; any other name a formula references is a plain
/// record field and ends the traversal.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Field → formula fields that read it (dependents)
    dependents: AHashMap<String, AHashSet<String>>,
    /// Formula field → fields it reads (precedents)
    precedents: AHashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `field` as a formula field reading `dependencies`, replacing any previous edges
    pub fn set_dependencies(&mut self, field: &str, dependencies: BTreeSet<String>) {
        self.remove_field(field);

        for dep in &dependencies {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .insert(field.to_string());
        }
        self.precedents.insert(field.to_string(), dependencies);
    }

    /// Forget that `field` is a formula field.
    ///
    /// Edges pointing at `field` stay: formulas that read it now read a plain record field.
    pub fn remove_field(&mut self, field: &str) -> bool {
        let Some(precedents) = self.precedents.remove(field) else {
            return false;
        };

        for precedent in precedents {
            if let Some(deps) = self.dependents.get_mut(&precedent) {
                deps.remove(field);
                if deps.is_empty() {
                    self.dependents.remove(&precedent);
                }
            }
        }
        true
    }

    /// Check if `field` is a formula field in the graph
    pub fn contains(&self, field: &str) -> bool {
        self.precedents.contains_key(field)
    }

    /// Formula fields that read `field`, in no particular order
    pub fn dependents(&self, field: &str) -> impl Iterator<Item = &str> + '_ {
        self.dependents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Fields that the formula field `field` reads
    pub fn precedents(&self, field: &str) -> Option<&BTreeSet<String>> {
        self.precedents.get(field)
    }

    /// Number of formula fields
    pub fn len(&self) -> usize {
        self.precedents.len()
    }

    /// Check if the graph has no formula fields
    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty()
    }

    /// Check whether giving `field` the dependencies `proposed` would close a cycle.
    ///
    /// The graph itself is not touched. On a cycle, returns the path from `field` back to
    /// itself, e.g. `["A", "B", "A"]`.
    pub fn would_create_cycle(
        &self,
        field: &str,
        proposed: &BTreeSet<String>,
    ) -> Option<Vec<String>> {
        let mut path = vec![field.to_string()];
        let mut visited = AHashSet::new();

        if self.find_path_back(field, field, proposed, &mut path, &mut visited) {
            Some(path)
        } else {
            None
        }
    }

    /// DFS from `node` looking for an edge back to `target`; `path` is the recursion stack.
    fn find_path_back<'a>(
        &'a self,
        node: &str,
        target: &str,
        proposed: &'a BTreeSet<String>,
        path: &mut Vec<String>,
        visited: &mut AHashSet<&'a str>,
    ) -> bool {
        let edges = if node == target {
            Some(proposed)
        } else {
            self.precedents.get(node)
        };

        for dep in edges.into_iter().flatten() {
            if dep == target {
                path.push(dep.clone());
                return true;
            }
            if !self.precedents.contains_key(dep) || !visited.insert(dep.as_str()) {
                continue;
            }

            path.push(dep.clone());
            if self.find_path_back(dep, target, proposed, path, visited) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// All formula fields, each after every formula field it reads.
    ///
    /// DFS post-order from the fields in name order, so the result is deterministic.
    pub fn calculation_order(&self) -> Vec<String> {
        let mut roots: Vec<&str> = self.precedents.keys().map(String::as_str).collect();
        roots.sort_unstable();

        let mut result = Vec::with_capacity(roots.len());
        let mut visited = AHashSet::new();
        let mut in_stack = AHashSet::new();

        for field in roots {
            self.topological_sort(field, &mut result, &mut visited, &mut in_stack);
        }
        result
    }

    /// Topological sort helper (DFS)
    fn topological_sort<'a>(
        &'a self,
        field: &'a str,
        result: &mut Vec<String>,
        visited: &mut AHashSet<&'a str>,
        in_stack: &mut AHashSet<&'a str>,
    ) {
        if visited.contains(field) || in_stack.contains(field) {
            return;
        }
        let Some(precedents) = self.precedents.get(field) else {
            return;
        };

        in_stack.insert(field);
        for precedent in precedents {
            self.topological_sort(precedent, result, visited, in_stack);
        }
        in_stack.remove(field);

        visited.insert(field);
        result.push(field.to_string());
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}
