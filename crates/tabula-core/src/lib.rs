//! # `Tabula` Core
//!
//! In-memory columnar tables with stable row ids, sorted column indexes and
//! an index-aware predicate planner.
//!
//! ## Features
//!
//! - **Stable row ids**: freed rows are reused smallest-first
//! - **Tree indexes**: per-column sorted indexes kept current by change events
//! - **Predicate planning**: comparisons, ranges, `AND` and `OR` answered from
//!   indexes when the table is large enough, with identical results to a scan
//! - **Cascaded views**: filtered, projected tables stacked to any depth
//! - **Graphs**: node and edge tables with breadth-first traversal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabula_core::{ColumnType, Expression, Table};
//!
//! let mut table = Table::new();
//! table.add_column("name", ColumnType::String)?;
//! table.add_column("age", ColumnType::Int)?;
//! table.create_index("age")?;
//!
//! let row = table.add_row();
//! table.set(row, "name", "ada")?;
//! table.set(row, "age", 36)?;
//!
//! let adults = Expression::column("age").ge(18);
//! let rows: Vec<_> = table.select(Some(&adults)).collect();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]

pub mod cascaded;
pub mod column;
pub mod comparator;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod error;
pub mod event;
pub mod expression;
pub mod filter_factory;
#[cfg(test)]
mod filter_factory_tests;
pub mod filtered_rows;
#[cfg(test)]
mod filtered_rows_tests;
pub mod graph;
pub mod index;
pub mod iter;
pub mod logging;
pub mod row_manager;
pub mod sort;
pub mod table;
pub mod table_iterator;
#[cfg(test)]
mod table_tests;
pub mod traversal;
pub mod tuple;
pub mod value;
#[cfg(test)]
mod value_tests;

pub use cascaded::{CascadedTable, CascadedView, Projection};
pub use column::{ColumnData, Schema};
pub use comparator::LiteralComparator;
pub use config::{ConfigError, FilterConfig, IndexConfig, LoggingConfig, TabulaConfig};
pub use error::{Error, Result};
pub use event::{ColumnScope, EventKind, Listeners, SubscriptionId, TableEvent, TableListener};
pub use expression::{ArithmeticOp, CompareOp, Expression, RangeKind};
pub use filter_factory::{FilterIteratorFactory, QueryPlan, ScanBounds};
pub use filtered_rows::{CascadedRowManager, ColumnSource, FilteredRowManager};
pub use graph::{Graph, NeighborIterator};
pub use index::{Index, IndexType, TreeIndex};
pub use iter::{FilterIterator, FilterRowIterator, UniqueRowIterator};
pub use logging::init_logging;
pub use row_manager::{Row, RowManager};
pub use sort::{sorted_rows, Sort, SortComparator, TupleComparator};
pub use table::{Table, TableStore};
pub use table_iterator::TableIterator;
pub use traversal::{Adjacency, BreadthFirstIterator, DepthQueue, GraphItem, TraversalMode};
pub use tuple::{RowIter, Tuple, TupleSet};
pub use value::{ColumnType, Value};
