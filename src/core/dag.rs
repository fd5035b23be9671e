//! Dependency graph between schedule tasks.
//!
//! Edges point from predecessor to successor. The graph is stored as a
//! petgraph arena with a `TaskId -> NodeIndex` index, so adjacency lookups
//! by source task are O(out-degree).
//!
//! The graph deliberately accepts cycles: rejecting them is the job of
//! whoever creates edges. Traversals defend themselves with a visited set,
//! and [`ScheduleGraph::cycles`] reports any cycles for diagnostics.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::ids::TaskId;

/// The four project-scheduling relations between a predecessor and a
/// successor.
///
/// Stored values that match none of them deserialize to `Unrecognized`, so a
/// bad row surfaces as a per-edge data error instead of failing the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Successor starts the day after the predecessor finishes.
    FinishToStart,
    /// Successor starts when the predecessor starts.
    StartToStart,
    /// Successor finishes when the predecessor finishes.
    FinishToFinish,
    /// Successor finishes when the predecessor starts.
    StartToFinish,
    #[serde(other)]
    Unrecognized,
}

impl Default for DependencyType {
    fn default() -> Self {
        Self::FinishToStart
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DependencyType::FinishToStart => "finish_to_start",
            DependencyType::StartToStart => "start_to_start",
            DependencyType::FinishToFinish => "finish_to_finish",
            DependencyType::StartToFinish => "start_to_finish",
            DependencyType::Unrecognized => "unrecognized",
        };
        f.write_str(s)
    }
}

/// A directed edge: `target` depends on `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub source: TaskId,
    pub target: TaskId,
    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,
    /// Signed offset in days; positive delays, negative overlaps.
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    pub fn new(
        source: TaskId,
        target: TaskId,
        dependency_type: DependencyType,
        lag_days: i64,
    ) -> Self {
        Self {
            source,
            target,
            dependency_type,
            lag_days,
        }
    }

    pub fn finish_to_start(source: TaskId, target: TaskId) -> Self {
        Self::new(source, target, DependencyType::FinishToStart, 0)
    }
}

/// Adjacency-by-source view of a schedule's dependencies.
#[derive(Clone)]
pub struct ScheduleGraph {
    graph: DiGraph<TaskId, Dependency>,
    task_index: HashMap<TaskId, NodeIndex>,
}

impl ScheduleGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Add a task node. Adding an existing id returns its current index.
    pub fn add_task(&mut self, id: TaskId) -> NodeIndex {
        if let Some(&index) = self.task_index.get(&id) {
            return index;
        }
        let index = self.graph.add_node(id);
        self.task_index.insert(id, index);
        index
    }

    /// Add an edge. Cycles are accepted; see the module docs.
    pub fn add_dependency(&mut self, dep: Dependency) {
        let from = self.add_task(dep.source);
        let to = self.add_task(dep.target);
        self.graph.add_edge(from, to, dep);
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges whose source is `id`, in insertion order.
    pub fn outgoing(&self, id: &TaskId) -> Vec<&Dependency> {
        let Some(&index) = self.task_index.get(id) else {
            return Vec::new();
        };
        // petgraph yields most recent edges first.
        let mut edges: Vec<_> = self.graph.edges_directed(index, Direction::Outgoing).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight()).collect()
    }

    /// Every dependency cycle, as the set of task ids involved.
    ///
    /// Self-loops are reported as single-element cycles.
    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .map(|&n| self.graph.find_edge(n, n).is_some())
                        .unwrap_or(false)
            })
            .map(|component| component.into_iter().map(|n| self.graph[n]).collect())
            .collect()
    }

    pub fn is_acyclic(&self) -> bool {
        self.cycles().is_empty()
    }
}

impl Default for ScheduleGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScheduleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
