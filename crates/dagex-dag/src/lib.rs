//! Merkle-DAG layer for dagex.
//!
//! Sits on top of a [`BlockStore`](dagex_store::BlockStore) and gives blocks
//! their meaning: DAG-PB nodes and their UnixFS payloads, raw leaves, and
//! DAG-CBOR structured data.
//!
//! # Key Types
//!
//! - [`DagService`] -- loads and stores decoded nodes through a block store
//! - [`Node`] -- a decoded block, tagged by codec
//! - [`ProtoNode`] / [`UnixfsData`] -- DAG-PB node and its UnixFS descriptor
//! - [`DagReader`] -- `Read + Seek` over a UnixFS file tree
//! - [`DagBuilder`] -- imports bytes and directory listings as UnixFS DAGs

pub mod builder;
pub mod error;
pub mod node;
pub mod pb;
pub mod reader;
pub mod service;
pub mod unixfs;

pub use builder::DagBuilder;
pub use error::{DagError, DagResult};
pub use node::Node;
pub use pb::{Link, ProtoNode};
pub use reader::DagReader;
pub use service::DagService;
pub use unixfs::{DataType, UnixfsData};
