//! Query building blocks shared by all storage backends
//!
//! Provides pagination, statement ordering, and the bundle traversal
//! that collects the statements reachable from a thing.

mod bundle;
mod page;
mod sort;

pub use bundle::{Bundle, BundleConfiguration, BundleTraversal};
pub use page::{Page, PageRequest};
pub use sort::{Order, Sort, SortDirection, StatementSortProperty};
