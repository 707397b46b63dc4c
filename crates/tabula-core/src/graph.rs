//! Graphs stored as a node table and an edge table.

use std::iter::{Chain, Copied};
use std::slice;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::column::Schema;
use crate::error::{Error, Result};
use crate::iter::UniqueRowIterator;
use crate::row_manager::Row;
use crate::table::Table;
use crate::traversal::{Adjacency, BreadthFirstIterator, TraversalMode};
use crate::tuple::TupleSet;
use crate::value::{ColumnType, Value};

/// Edge column holding the source node row.
pub const SOURCE: &str = "source";
/// Edge column holding the target node row.
pub const TARGET: &str = "target";

#[derive(Debug, Clone, Default)]
struct Links {
    outgoing: Vec<Row>,
    incoming: Vec<Row>,
}

type EdgeRows<'g> = Copied<slice::Iter<'g, Row>>;

/// Edges of a node, outgoing first, each listed once.
pub type IncidentEdges<'g> = UniqueRowIterator<Chain<EdgeRows<'g>, EdgeRows<'g>>>;

/// A graph whose nodes and edges are rows of two tables.
///
/// Edges carry their endpoints in the [`SOURCE`] and [`TARGET`] columns.
/// Adjacency lists are kept per node so incident-edge lookups do not scan
/// the edge table.
#[derive(Debug)]
pub struct Graph {
    nodes: Table,
    edges: Table,
    links: FxHashMap<Row, Links>,
    directed: bool,
}

impl Graph {
    /// Creates an empty graph with no node or edge attributes.
    #[must_use]
    pub fn new(directed: bool) -> Self {
        let mut edges = Table::new();
        for column in [SOURCE, TARGET] {
            if let Err(err) = edges.add_column(column, ColumnType::Int) {
                unreachable!("fresh edge table rejected '{column}': {err}");
            }
        }
        Self {
            nodes: Table::new(),
            edges,
            links: FxHashMap::default(),
            directed,
        }
    }

    /// Creates an empty graph with attribute columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnExists`] if the edge schema declares
    /// [`SOURCE`] or [`TARGET`].
    pub fn with_schemas(node_schema: &Schema, edge_schema: &Schema, directed: bool) -> Result<Self> {
        let mut graph = Self::new(directed);
        for (name, ty) in node_schema.iter() {
            graph.nodes.add_column(name, ty)?;
        }
        for (name, ty) in edge_schema.iter() {
            graph.edges.add_column(name, ty)?;
        }
        Ok(graph)
    }

    /// Returns true if edges have a direction.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Node table.
    #[must_use]
    pub fn node_table(&self) -> &Table {
        &self.nodes
    }

    /// Edge table.
    #[must_use]
    pub fn edge_table(&self) -> &Table {
        &self.edges
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.row_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.row_count()
    }

    /// Returns true if `edge` is an edge of the graph.
    #[must_use]
    pub fn contains_edge(&self, edge: Row) -> bool {
        self.edges.is_valid_row(edge)
    }

    /// Adds a node with default attribute values.
    pub fn add_node(&mut self) -> Row {
        let node = self.nodes.add_row();
        self.links.insert(node, Links::default());
        node
    }

    /// Adds an edge from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRow`] if either endpoint is not a node.
    pub fn add_edge(&mut self, source: Row, target: Row) -> Result<Row> {
        for node in [source, target] {
            if !self.nodes.is_valid_row(node) {
                return Err(Error::InvalidRow(node));
            }
        }
        let edge = self.edges.add_row();
        self.edges.set(edge, SOURCE, source)?;
        self.edges.set(edge, TARGET, target)?;
        self.links.entry(source).or_default().outgoing.push(edge);
        self.links.entry(target).or_default().incoming.push(edge);
        Ok(edge)
    }

    /// Removes an edge. Returns `false` if it was not an edge.
    pub fn remove_edge(&mut self, edge: Row) -> bool {
        let Some((source, target)) = self.endpoints(edge) else {
            return false;
        };
        if let Some(links) = self.links.get_mut(&source) {
            links.outgoing.retain(|&e| e != edge);
        }
        if let Some(links) = self.links.get_mut(&target) {
            links.incoming.retain(|&e| e != edge);
        }
        self.edges.remove_row(edge)
    }

    /// Removes a node and every edge touching it.
    pub fn remove_node(&mut self, node: Row) -> bool {
        if !self.nodes.is_valid_row(node) {
            return false;
        }
        let incident: Vec<Row> = self.edges(node).collect();
        for &edge in &incident {
            self.remove_edge(edge);
        }
        self.links.remove(&node);
        debug!(node, edges = incident.len(), "Removed node");
        self.nodes.remove_row(node)
    }

    /// Source node of `edge`.
    #[must_use]
    pub fn source(&self, edge: Row) -> Option<Row> {
        self.endpoint(edge, SOURCE)
    }

    /// Target node of `edge`.
    #[must_use]
    pub fn target(&self, edge: Row) -> Option<Row> {
        self.endpoint(edge, TARGET)
    }

    fn endpoint(&self, edge: Row, column: &str) -> Option<Row> {
        match self.edges.value_by_name(edge, column)? {
            Value::Int(node) => Some(node),
            _ => None,
        }
    }

    fn link_lists(&self, node: Row) -> (&[Row], &[Row]) {
        self.links
            .get(&node)
            .map_or((&[][..], &[][..]), |links| (&links.outgoing[..], &links.incoming[..]))
    }

    /// Edges touching `node`: outgoing, then incoming.
    pub fn edges(&self, node: Row) -> IncidentEdges<'_> {
        let (outgoing, incoming) = self.link_lists(node);
        UniqueRowIterator::new(outgoing.iter().copied().chain(incoming.iter().copied()))
    }

    /// Edges leaving `node`.
    pub fn out_edges(&self, node: Row) -> impl Iterator<Item = Row> + '_ {
        self.link_lists(node).0.iter().copied()
    }

    /// Edges entering `node`.
    pub fn in_edges(&self, node: Row) -> impl Iterator<Item = Row> + '_ {
        self.link_lists(node).1.iter().copied()
    }

    /// Nodes adjacent to `node` through any of its edges.
    pub fn neighbors(&self, node: Row) -> NeighborIterator<'_> {
        NeighborIterator {
            graph: self,
            node,
            edges: self.edges(node),
        }
    }

    /// Number of edges touching `node`.
    #[must_use]
    pub fn degree(&self, node: Row) -> usize {
        self.edges(node).count()
    }

    /// Number of edges leaving `node`.
    #[must_use]
    pub fn out_degree(&self, node: Row) -> usize {
        self.link_lists(node).0.len()
    }

    /// Number of edges entering `node`.
    #[must_use]
    pub fn in_degree(&self, node: Row) -> usize {
        self.link_lists(node).1.len()
    }

    /// Reads a node attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRow`] or [`Error::ColumnNotFound`].
    pub fn node_value(&self, node: Row, column: &str) -> Result<Value> {
        self.nodes.get(node, column)
    }

    /// Writes a node attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// See [`Table::set`].
    pub fn set_node_value(&mut self, node: Row, column: &str, value: impl Into<Value>) -> Result<Value> {
        self.nodes.set(node, column, value)
    }

    /// Reads an edge attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRow`] or [`Error::ColumnNotFound`].
    pub fn edge_value(&self, edge: Row, column: &str) -> Result<Value> {
        self.edges.get(edge, column)
    }

    /// Writes an edge attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] for the endpoint columns, otherwise
    /// see [`Table::set`].
    pub fn set_edge_value(&mut self, edge: Row, column: &str, value: impl Into<Value>) -> Result<Value> {
        if column == SOURCE || column == TARGET {
            return Err(Error::InvalidRecord(format!(
                "edge endpoint column '{column}' is fixed"
            )));
        }
        self.edges.set(edge, column, value)
    }

    /// Breadth-first traversal from `seeds`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTraversal`] if a seed is not a node.
    pub fn breadth_first(
        &self,
        seeds: impl IntoIterator<Item = Row>,
        max_depth: usize,
        mode: TraversalMode,
    ) -> Result<BreadthFirstIterator<'_, Self>> {
        BreadthFirstIterator::new(self, seeds, max_depth, mode)
    }
}

impl Adjacency for Graph {
    fn contains_node(&self, node: Row) -> bool {
        self.nodes.is_valid_row(node)
    }

    fn incident_edges(&self, node: Row) -> Vec<Row> {
        self.edges(node).collect()
    }

    fn endpoints(&self, edge: Row) -> Option<(Row, Row)> {
        Some((self.source(edge)?, self.target(edge)?))
    }
}

/// Nodes adjacent to one node, in incident-edge order.
///
/// A neighbor reached through several edges is yielded once per edge.
pub struct NeighborIterator<'g> {
    graph: &'g Graph,
    node: Row,
    edges: IncidentEdges<'g>,
}

impl Iterator for NeighborIterator<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let (graph, node) = (self.graph, self.node);
        self.edges.find_map(|edge| graph.adjacent_node(edge, node))
    }
}
