//! Type resolution and presentation for dagex.
//!
//! Interprets blocks that a retrieval has materialised: what kind of node a
//! CID names, what content type a file carries, and how a directory or a
//! structured node is described to a browsing user.
//!
//! # Key Types
//!
//! - [`NodeKind`] -- closed set of logical node kinds, from [`classify`]
//! - [`DirEntry`] / [`Description`] -- one row of a bounded directory listing
//! - [`LinkDescription`] -- a link's one-line description, full or tentative
//! - [`DumpNode`] -- bounded structural dump of non-UnixFS data
//! - [`ContentReader`] -- seekable bytes of a file or raw node
//!
//! Every eager classification of a child is bounded by
//! [`TraversalLimits`](dagex_selector::TraversalLimits).

pub mod classify;
pub mod content_type;
pub mod describe;
pub mod dump;
pub mod error;
pub mod listing;
pub mod reader;

pub use classify::{classify, classify_block, NodeKind};
pub use describe::{describe_entry, describe_link, LinkDescription};
pub use dump::{dump, DumpNode};
pub use error::{ResolveError, ResolveResult};
pub use listing::{list_directory, Description, DirEntry};
pub use reader::ContentReader;
