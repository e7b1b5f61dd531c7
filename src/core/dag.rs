//! Project DAG (Directed Acyclic Graph) and execution planning.
//!
//! This module turns the selected workspace projects into an execution plan:
//! either layered ready groups in dependency order, or a single pass-through
//! group in declaration order when sorting is disabled.

use crate::core::project::{ProjectId, WorkspaceGraph};
use crate::error::{Error, Result};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// How the groups of an [`ExecutionPlan`] were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// Topologically layered ready groups.
    Sorted,
    /// One group holding every project in declaration order.
    Unsorted,
}

/// Read-only plan consumed by the scheduler.
///
/// Every selected project appears in exactly one group, exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    kind: PlanKind,
    groups: Vec<Vec<ProjectId>>,
}

impl ExecutionPlan {
    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn groups(&self) -> &[Vec<ProjectId>] {
        &self.groups
    }

    /// Total number of projects across all groups.
    pub fn project_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.project_count() == 0
    }

    /// All projects in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectId> {
        self.groups.iter().flatten()
    }
}

/// The in-workspace dependency graph of the selected projects.
///
/// Nodes are inserted in declaration order, so `NodeIndex` order doubles as
/// the stable tie-break inside a ready group. Edges point from a dependency
/// to its dependent.
pub struct ProjectDAG {
    graph: DiGraph<ProjectId, ()>,
    project_index: HashMap<ProjectId, NodeIndex>,
}

impl ProjectDAG {
    /// Build the DAG from a workspace graph.
    ///
    /// Dependencies on projects outside the graph are dropped.
    ///
    /// # Errors
    /// Returns a validation error if a project identifier appears twice.
    pub fn from_graph(workspace: &WorkspaceGraph) -> Result<Self> {
        workspace.validate()?;

        let mut graph = DiGraph::with_capacity(workspace.len(), 0);
        let mut project_index = HashMap::with_capacity(workspace.len());
        for project in &workspace.projects {
            let index = graph.add_node(project.id.clone());
            project_index.insert(project.id.clone(), index);
        }

        for project in &workspace.projects {
            let to = project_index[&project.id];
            for dep in &project.dependencies {
                if let Some(&from) = project_index.get(dep) {
                    if graph.find_edge(from, to).is_none() {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        Ok(Self {
            graph,
            project_index,
        })
    }

    pub fn project_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if `dependent` has an in-workspace dependency on `dependency`.
    pub fn has_dependency(&self, dependent: &ProjectId, dependency: &ProjectId) -> bool {
        match (
            self.project_index.get(dependency),
            self.project_index.get(dependent),
        ) {
            (Some(&from), Some(&to)) => self.graph.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    /// In-workspace dependencies of a project, in declaration order.
    pub fn dependencies_of(&self, id: &ProjectId) -> Vec<&ProjectId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Projects that depend on the given one, in declaration order.
    pub fn dependents_of(&self, id: &ProjectId) -> Vec<&ProjectId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &ProjectId, direction: Direction) -> Vec<&ProjectId> {
        let Some(&index) = self.project_index.get(id) else {
            return Vec::new();
        };
        let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(index, direction).collect();
        nodes.sort();
        nodes.into_iter().map(|n| &self.graph[n]).collect()
    }

    /// Build the execution plan.
    ///
    /// With `sort` enabled this is a layered Kahn sort: group 0 holds every
    /// project without in-workspace dependencies, group `k` every project
    /// whose dependencies all sit in groups `0..k`. Within a group, projects
    /// keep declaration order. With `sort` disabled the plan is a single
    /// group in declaration order and dependency edges are ignored.
    ///
    /// # Errors
    /// Returns [`Error::CyclicDependency`] if sorting hits a cycle.
    pub fn build_plan(&self, sort: bool) -> Result<ExecutionPlan> {
        if !sort {
            let all: Vec<ProjectId> = self.graph.node_weights().cloned().collect();
            let groups = if all.is_empty() { Vec::new() } else { vec![all] };
            return Ok(ExecutionPlan {
                kind: PlanKind::Unsorted,
                groups,
            });
        }

        Ok(ExecutionPlan {
            kind: PlanKind::Sorted,
            groups: self.ready_groups()?,
        })
    }

    fn ready_groups(&self) -> Result<Vec<Vec<ProjectId>>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut current: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .collect();

        let mut groups = Vec::new();
        let mut placed = 0;
        while !current.is_empty() {
            let mut next = Vec::new();
            for &node in &current {
                for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    in_degree[dependent.index()] -= 1;
                    if in_degree[dependent.index()] == 0 {
                        next.push(dependent);
                    }
                }
            }
            next.sort();

            placed += current.len();
            groups.push(current.iter().map(|&n| self.graph[n].clone()).collect());
            current = next;
        }

        if placed < self.graph.node_count() {
            return Err(Error::CyclicDependency {
                projects: self.cycle_members(),
            });
        }

        Ok(groups)
    }

    /// Projects that sit on a dependency cycle, in declaration order.
    fn cycle_members(&self) -> Vec<ProjectId> {
        let mut members: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some()
            })
            .flatten()
            .collect();
        members.sort();
        members.into_iter().map(|n| self.graph[n].clone()).collect()
    }
}

impl std::fmt::Debug for ProjectDAG {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectDAG")
            .field("projects", &self.project_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
