//! Traversal selectors for dagex.
//!
//! A [`Selector`] declares which part of a DAG a retrieval should move. This
//! crate builds selectors from slash-delimited paths, provides the fixed
//! presets the explorer uses, serialises them in the DAG-JSON selector
//! encoding that travels with a retrieval order, and evaluates them against
//! a block store.
//!
//! # Bounds
//!
//! Interactive presets always carry an explicit recursion depth taken from
//! [`TraversalLimits`]. Only [`presets::full_export`] recurses without a
//! limit.

pub mod error;
pub mod json;
pub mod limits;
pub mod path;
pub mod presets;
pub mod selector;
pub mod walk;

pub use error::{SelectorError, SelectorResult};
pub use limits::TraversalLimits;
pub use path::compile_path;
pub use selector::{RecursionLimit, Selector};
pub use walk::{walk, Walk};
