//! Dependencies between bindings
//!
//! Binding `A` depends on binding `B` when `A`'s expression references `B` by
//! name outside any local binding that shadows it. Graph edges point from a
//! binding to the bindings it depends on.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use thiserror::Error;

use crate::parser::tokens::{Binding, Token};

/// Binding id to the ids of the bindings it references
pub type DependencyGraph = IndexMap<String, IndexSet<String>>;

/// Bindings reference each other in a cycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency cycle: {}", .path.join(" -> "))]
pub struct CycleError {
    /// Binding ids along the cycle, first id repeated at the end
    pub path: Vec<String>,
}

/// Names of the non-special variables referenced by an expression, in order of appearance
pub fn extract_referenced_binding_names(expression: &[Token]) -> IndexSet<String> {
    let mut names = IndexSet::new();
    collect_names(expression, &[], &mut names);
    names
}

fn collect_names<'a>(
    expression: &'a [Token],
    shadowed: &[&'a str],
    names: &mut IndexSet<String>,
) {
    for token in expression {
        match token {
            Token::Variable {
                value,
                special: false,
            } if !shadowed.contains(&value.as_str()) => {
                names.insert(value.clone());
            }
            Token::Function { args, .. } => {
                for arg in args {
                    // every local name of the argument is hidden from all of its expressions
                    let mut scope = shadowed.to_vec();
                    scope.extend(arg.bindings.iter().map(|local| local.name.as_str()));
                    for local in &arg.bindings {
                        collect_names(&local.expression, &scope, names);
                    }
                    collect_names(&arg.expression, &scope, names);
                }
            }
            _ => {}
        }
    }
}

/// Ids of the bindings an expression references.
///
/// Names that match no binding are dropped. When several bindings share a
/// name, the first one wins.
pub fn extract_referenced_bindings(expression: &[Token], bindings: &[Binding]) -> IndexSet<String> {
    let mut by_name: FxHashMap<&str, &str> = FxHashMap::default();
    for binding in bindings {
        by_name
            .entry(binding.name.as_str())
            .or_insert(binding.id.as_str());
    }

    extract_referenced_binding_names(expression)
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).map(|id| id.to_string()))
        .collect()
}

/// Dependency graph of a set of bindings, in binding order
pub fn build_dependency_graph(bindings: &[Binding]) -> DependencyGraph {
    bindings
        .iter()
        .map(|binding| {
            (
                binding.id.clone(),
                extract_referenced_bindings(&binding.expression, bindings),
            )
        })
        .collect()
}

/// Every binding `id` depends on, directly or indirectly. `id` itself is excluded.
pub fn transitive_dependencies(graph: &DependencyGraph, id: &str) -> IndexSet<String> {
    let mut visited: IndexSet<String> = IndexSet::new();
    let mut stack = vec![id];

    while let Some(current) = stack.pop() {
        let Some(dependencies) = graph.get(current) else {
            continue;
        };
        for dependency in dependencies {
            if dependency != id && visited.insert(dependency.clone()) {
                stack.push(dependency.as_str());
            }
        }
    }
    visited
}

/// Every binding that depends on `id`, closest first. `id` itself is excluded.
pub fn transitive_dependents(graph: &DependencyGraph, id: &str) -> Vec<String> {
    let mut reverse: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for (node, dependencies) in graph {
        for dependency in dependencies {
            reverse
                .entry(dependency.as_str())
                .or_default()
                .push(node.as_str());
        }
    }

    let mut visited: FxHashSet<&str> = FxHashSet::default();
    visited.insert(id);
    let mut queue: VecDeque<&str> = VecDeque::from([id]);
    let mut dependents = Vec::new();

    while let Some(current) = queue.pop_front() {
        for &dependent in reverse.get(current).into_iter().flatten() {
            if visited.insert(dependent) {
                dependents.push(dependent.to_string());
                queue.push_back(dependent);
            }
        }
    }
    dependents
}

/// Visit every binding once, each after the bindings it depends on.
///
/// Cycles are tolerated: a binding already being visited is treated as done.
/// Dependencies that are not nodes of the graph are skipped.
pub fn walk_dependency_graph<F>(graph: &DependencyGraph, mut visitor: F)
where
    F: FnMut(&str),
{
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    for node in graph.keys() {
        visit(graph, node, &mut visited, &mut visitor);
    }
}

fn visit<'g, F>(
    graph: &'g DependencyGraph,
    node: &'g str,
    visited: &mut FxHashSet<&'g str>,
    visitor: &mut F,
) where
    F: FnMut(&str),
{
    let Some((key, dependencies)) = graph.get_key_value(node) else {
        return;
    };
    if !visited.insert(key.as_str()) {
        return;
    }
    for dependency in dependencies {
        visit(graph, dependency, visited, visitor);
    }
    log::trace!("visiting binding {key}");
    visitor(key.as_str());
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Report the first dependency cycle, if any
pub fn detect_cycles(graph: &DependencyGraph) -> Result<(), CycleError> {
    let mut marks: FxHashMap<&str, Mark> = FxHashMap::default();
    let mut path: Vec<&str> = Vec::new();
    for node in graph.keys() {
        detect_from(graph, node, &mut marks, &mut path)?;
    }
    Ok(())
}

fn detect_from<'g>(
    graph: &'g DependencyGraph,
    node: &'g str,
    marks: &mut FxHashMap<&'g str, Mark>,
    path: &mut Vec<&'g str>,
) -> Result<(), CycleError> {
    match marks.get(node) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            let start = path.iter().position(|&n| n == node).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(node.to_string());
            return Err(CycleError { path: cycle });
        }
        None => {}
    }

    let Some((key, dependencies)) = graph.get_key_value(node) else {
        return Ok(());
    };
    marks.insert(key.as_str(), Mark::InProgress);
    path.push(key.as_str());
    for dependency in dependencies {
        detect_from(graph, dependency, marks, path)?;
    }
    path.pop();
    marks.insert(key.as_str(), Mark::Done);
    Ok(())
}

/// [`walk_dependency_graph`], failing instead of tolerating cycles
pub fn walk_dependency_graph_checked<F>(
    graph: &DependencyGraph,
    visitor: F,
) -> Result<(), CycleError>
where
    F: FnMut(&str),
{
    detect_cycles(graph)?;
    walk_dependency_graph(graph, visitor);
    Ok(())
}
