use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::{builder::DiBuilder, types::TypeInfo};

/// Graph of all registered entries
///
/// Nodes live in an arena in registration order and are indexed by name.
/// Used to reject broken wiring before anything is constructed and to compute the wiring order.
pub struct DependencyGraph {
    nodes: Vec<DependencyGraphEntry>,
    index: BTreeMap<String, usize>,
    /// Arena indices, dependencies first. Only filled by [DependencyGraph::check]
    order: Vec<usize>,
}
impl DependencyGraph {
    /// Builds the graph of everything registered on `builder` and checks it
    ///
    /// Duplicates, missing dependencies and cycles are all reported together.
    pub fn new(builder: &DiBuilder) -> Result<Self, DependencyGraphErrors> {
        let mut graph = Self {
            nodes: Vec::new(),
            index: BTreeMap::new(),
            order: Vec::new(),
        };

        let mut errors = Vec::new();
        for entry in &builder.registered {
            if let Err(error) = graph.add(&entry.name, entry.factory.supplies(), &entry.dependencies)
            {
                errors.push(error);
            }
        }

        // Second registrations of a name are not in the graph, the rest is still checked
        if let Err(check) = graph.check() {
            errors.extend(check.errors);
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        Ok(graph)
    }

    pub fn add(
        &mut self,
        name: &str,
        info: TypeInfo,
        dependencies: &[String],
    ) -> Result<(), DependencyGraphError> {
        if self.index.contains_key(name) {
            return Err(DependencyGraphError::Duplicate(name.to_string()));
        }

        self.index.insert(name.to_string(), self.nodes.len());
        self.nodes.push(DependencyGraphEntry {
            name: name.to_string(),
            info,
            dependencies: dependencies.to_vec(),
        });

        Ok(())
    }

    /// Validate the graph and compute the wiring order
    ///
    /// Returns a list of all issues
    pub fn check(&mut self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for index in 0..self.nodes.len() {
            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut order,
                &mut dependency_chain,
                index,
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        self.order = order;
        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph,
            checked: &mut HashSet<usize>,
            errors: &mut Vec<DependencyGraphError>,
            order: &mut Vec<usize>,
            dependency_chain: &mut Vec<usize>,
            index: usize,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|i| *i == index) {
                let from = *dependency_chain.last().expect("must have entries");
                let mut chain: Vec<String> = dependency_chain[start..]
                    .iter()
                    .map(|i| graph.nodes[*i].name.clone())
                    .collect();
                chain.push(graph.nodes[index].name.clone()); // Add current so chain is complete

                errors.push(DependencyGraphError::CircularDependency {
                    from: graph.nodes[from].name.clone(),
                    to: graph.nodes[index].name.clone(),
                    chain,
                });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(index) {
                return;
            };

            dependency_chain.push(index);

            let entry = &graph.nodes[index];
            for dependency in &entry.dependencies {
                let Some(next) = graph.index.get(dependency) else {
                    errors.push(DependencyGraphError::MissingDependency {
                        dependency: dependency.clone(),
                        required_by: entry.name.clone(),
                    });
                    continue;
                };

                check_recurse(graph, checked, errors, order, dependency_chain, *next);
            }

            dependency_chain.pop();
            // All dependencies are placed, so this entry can follow them
            order.push(index);
        }
    }

    /// Names in wiring order, dependencies first
    pub fn order(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(|i| self.nodes[*i].name.as_str())
    }

    pub(crate) fn order_indices(&self) -> &[usize] {
        &self.order
    }

    /// Declared dependencies of an entry, in declaration order
    pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|i| self.nodes[*i].dependencies.as_slice())
    }

    /// Type of the instance an entry provides
    pub fn type_of(&self, name: &str) -> Option<TypeInfo> {
        self.index.get(name).map(|i| self.nodes[*i].info)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct DependencyGraphEntry {
    name: String,
    info: TypeInfo,
    dependencies: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    #[error("An entry has been registered twice: '{0}'")]
    Duplicate(String),
    #[error("'{required_by}' needs '{dependency}' but it is missing")]
    MissingDependency {
        dependency: String,
        required_by: String,
    },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {chain:?}")]
    CircularDependency {
        from: String,
        to: String,
        chain: Vec<String>,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
impl DependencyGraphErrors {
    pub fn has_cycle(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, DependencyGraphError::CircularDependency { .. }))
    }

    pub fn has_missing_dependency(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, DependencyGraphError::MissingDependency { .. }))
    }
}
