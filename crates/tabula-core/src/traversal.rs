//! Depth-bounded breadth-first traversal over node/edge structures.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::row_manager::Row;

/// A node or an edge, identified by its row in the owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphItem {
    /// Row of the node table.
    Node(Row),
    /// Row of the edge table.
    Edge(Row),
}

impl GraphItem {
    /// Node row, if this is a node.
    #[must_use]
    pub fn node(self) -> Option<Row> {
        match self {
            Self::Node(row) => Some(row),
            Self::Edge(_) => None,
        }
    }

    /// Edge row, if this is an edge.
    #[must_use]
    pub fn edge(self) -> Option<Row> {
        match self {
            Self::Edge(row) => Some(row),
            Self::Node(_) => None,
        }
    }
}

/// Connectivity a traversal needs from a graph.
pub trait Adjacency {
    /// Returns true if `node` is a node of the graph.
    fn contains_node(&self, node: Row) -> bool;

    /// Edges touching `node`, each listed once.
    fn incident_edges(&self, node: Row) -> Vec<Row>;

    /// Source and target of `edge`.
    fn endpoints(&self, edge: Row) -> Option<(Row, Row)>;

    /// The other end of `edge` as seen from `node`.
    fn adjacent_node(&self, edge: Row, node: Row) -> Option<Row> {
        let (source, target) = self.endpoints(edge)?;
        if node == source {
            Some(target)
        } else if node == target {
            Some(source)
        } else {
            None
        }
    }
}

/// Which items a traversal yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Nodes only.
    #[default]
    Nodes,
    /// Edges only.
    Edges,
    /// Nodes and edges, in discovery order.
    NodesAndEdges,
}

impl TraversalMode {
    /// Returns true if nodes are yielded.
    #[must_use]
    pub fn includes_nodes(self) -> bool {
        matches!(self, Self::Nodes | Self::NodesAndEdges)
    }

    /// Returns true if edges are yielded.
    #[must_use]
    pub fn includes_edges(self) -> bool {
        matches!(self, Self::Edges | Self::NodesAndEdges)
    }

    /// Mode name as written in configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Edges => "edges",
            Self::NodesAndEdges => "nodes_and_edges",
        }
    }
}

impl fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TraversalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nodes" => Ok(Self::Nodes),
            "edges" => Ok(Self::Edges),
            "nodes_and_edges" => Ok(Self::NodesAndEdges),
            other => Err(Error::InvalidTraversal(format!(
                "unknown traversal mode '{other}'"
            ))),
        }
    }
}

/// FIFO of graph items with the depth at which each was first seen.
#[derive(Debug, Clone, Default)]
pub struct DepthQueue {
    items: VecDeque<GraphItem>,
    depths: FxHashMap<GraphItem, usize>,
}

impl DepthQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `item` and records its depth.
    pub fn add(&mut self, item: GraphItem, depth: usize) {
        self.items.push_back(item);
        self.depths.insert(item, depth);
    }

    /// Records a depth for `item` without enqueuing it.
    ///
    /// An item that already has a depth keeps it.
    pub fn visit(&mut self, item: GraphItem, depth: usize) {
        self.depths.entry(item).or_insert(depth);
    }

    /// Depth recorded for `item`.
    #[must_use]
    pub fn depth(&self, item: GraphItem) -> Option<usize> {
        self.depths.get(&item).copied()
    }

    /// Dequeues the oldest item. Its depth stays recorded.
    pub fn pop_front(&mut self) -> Option<GraphItem> {
        self.items.pop_front()
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forgets all items and depths.
    pub fn clear(&mut self) {
        self.items.clear();
        self.depths.clear();
    }
}

/// Breadth-first iterator from one or more seed nodes.
///
/// Items further than `max_depth` hops from every seed are not visited.
/// In [`TraversalMode::Edges`] the seeds themselves are not yielded; their
/// incident edges are.
pub struct BreadthFirstIterator<'g, G: Adjacency + ?Sized> {
    graph: &'g G,
    queue: DepthQueue,
    max_depth: usize,
    mode: TraversalMode,
}

impl<'g, G: Adjacency + ?Sized> BreadthFirstIterator<'g, G> {
    /// Starts a traversal of `graph` from `seeds`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTraversal`] if a seed is not a node of the
    /// graph.
    pub fn new(
        graph: &'g G,
        seeds: impl IntoIterator<Item = Row>,
        max_depth: usize,
        mode: TraversalMode,
    ) -> Result<Self> {
        let mut queue = DepthQueue::new();
        for seed in seeds {
            if !graph.contains_node(seed) {
                return Err(Error::InvalidTraversal(format!("seed {seed} is not a node")));
            }
            if mode.includes_nodes() {
                queue.add(GraphItem::Node(seed), 0);
            } else {
                queue.visit(GraphItem::Node(seed), 0);
                for edge in graph.incident_edges(seed) {
                    if let Some(next) = graph.adjacent_node(edge, seed) {
                        queue.visit(GraphItem::Node(next), 1);
                    }
                    if queue.depth(GraphItem::Edge(edge)).is_none() {
                        queue.add(GraphItem::Edge(edge), 1);
                    }
                }
            }
        }
        Ok(Self {
            graph,
            queue,
            max_depth,
            mode,
        })
    }

    /// Depth at which `item` was discovered.
    #[must_use]
    pub fn depth(&self, item: GraphItem) -> Option<usize> {
        self.queue.depth(item)
    }

    /// Traversal mode.
    #[must_use]
    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    fn expand_node(&mut self, node: Row) {
        let Some(depth) = self.queue.depth(GraphItem::Node(node)) else {
            return;
        };
        let include_edges = self.mode.includes_edges();
        if depth < self.max_depth {
            for edge in self.graph.incident_edges(node) {
                let edge_item = GraphItem::Edge(edge);
                if include_edges && self.queue.depth(edge_item).is_none() {
                    self.queue.add(edge_item, depth + 1);
                }
                if let Some(next) = self.graph.adjacent_node(edge, node) {
                    if self.queue.depth(GraphItem::Node(next)).is_none() {
                        self.queue.add(GraphItem::Node(next), depth + 1);
                    }
                }
            }
        } else if include_edges && depth == self.max_depth {
            // Edges between frontier nodes are still reported.
            for edge in self.graph.incident_edges(node) {
                let Some(next) = self.graph.adjacent_node(edge, node) else {
                    continue;
                };
                let edge_item = GraphItem::Edge(edge);
                if let Some(next_depth) = self.queue.depth(GraphItem::Node(next)) {
                    if next_depth > 0 && self.queue.depth(edge_item).is_none() {
                        self.queue.add(edge_item, depth.min(next_depth));
                    }
                }
            }
        }
    }

    fn expand_edge(&mut self, edge: Row) {
        let Some((source, target)) = self.graph.endpoints(edge) else {
            return;
        };
        let source_depth = self.queue.depth(GraphItem::Node(source));
        let target_depth = self.queue.depth(GraphItem::Node(target));
        if source_depth == target_depth {
            return;
        }
        let (node, depth) = if target_depth > source_depth {
            (target, target_depth)
        } else {
            (source, source_depth)
        };
        let Some(depth) = depth.filter(|&d| d < self.max_depth) else {
            return;
        };
        for next_edge in self.graph.incident_edges(node) {
            let edge_item = GraphItem::Edge(next_edge);
            if self.queue.depth(edge_item).is_some() {
                continue;
            }
            if let Some(next) = self.graph.adjacent_node(next_edge, node) {
                self.queue.visit(GraphItem::Node(next), depth + 1);
            }
            self.queue.add(edge_item, depth + 1);
        }
    }
}

impl<G: Adjacency + ?Sized> Iterator for BreadthFirstIterator<'_, G> {
    type Item = GraphItem;

    fn next(&mut self) -> Option<GraphItem> {
        let item = self.queue.pop_front()?;
        match (self.mode, item) {
            (TraversalMode::Edges, GraphItem::Edge(edge)) => self.expand_edge(edge),
            (_, GraphItem::Node(node)) => self.expand_node(node),
            (_, GraphItem::Edge(_)) => {}
        }
        Some(item)
    }
}

impl<G: Adjacency + ?Sized> std::iter::FusedIterator for BreadthFirstIterator<'_, G> {}
