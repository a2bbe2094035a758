//! Closed-set classification of decoded blocks.

use cid::Cid;
use dagex_dag::{DataType, Node, ProtoNode};
use dagex_store::Block;
use dagex_types::Codec;

use crate::error::{ResolveError, ResolveResult};

/// Logical kind of a node, carrying only the fields its presentation needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// UnixFS directory. `size` is the block plus the recorded sizes of all
    /// linked subtrees.
    Directory { entries: usize, size: u64 },
    /// UnixFS HAMT shard; `links` counts the shard's own links.
    ShardedDirectory {
        links: usize,
        fanout: Option<u64>,
        size: u64,
    },
    /// UnixFS file of `size` logical bytes.
    File { size: u64 },
    Symlink { target: String },
    /// A raw block is a file by itself.
    RawFile { size: u64 },
    /// DAG-CBOR data.
    StructuredData { size: u64 },
    /// A codec this crate cannot interpret.
    Unknown { codec: u64 },
}

impl NodeKind {
    /// Logical size as shown to users.
    pub fn size(&self) -> Option<u64> {
        match self {
            NodeKind::Directory { size, .. }
            | NodeKind::ShardedDirectory { size, .. }
            | NodeKind::File { size }
            | NodeKind::RawFile { size }
            | NodeKind::StructuredData { size } => Some(*size),
            NodeKind::Symlink { target } => Some(target.len() as u64),
            NodeKind::Unknown { .. } => None,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(
            self,
            NodeKind::Directory { .. } | NodeKind::ShardedDirectory { .. }
        )
    }

    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. } | NodeKind::RawFile { .. })
    }

    /// Short label without content type, e.g. `DIR (3 entries)`.
    pub fn label(&self) -> String {
        match self {
            NodeKind::Directory { entries, .. } => format!("DIR ({entries} entries)"),
            NodeKind::ShardedDirectory { links, .. } => format!("HAMT ({links} links)"),
            NodeKind::File { .. } => "FILE".to_string(),
            NodeKind::Symlink { .. } => "LINK".to_string(),
            NodeKind::RawFile { .. } => "RAW".to_string(),
            NodeKind::StructuredData { .. } => "DAG-CBOR".to_string(),
            NodeKind::Unknown { codec } => format!("UNK:0x{codec:x}"),
        }
    }
}

/// Classify the block stored under `cid`.
///
/// Pure: the result depends only on the CID's codec and the bytes.
pub fn classify(cid: &Cid, data: &[u8]) -> ResolveResult<NodeKind> {
    classify_block(&Block::new(*cid, data.to_vec()))
}

/// Classify an already loaded block.
pub fn classify_block(block: &Block) -> ResolveResult<NodeKind> {
    let size = block.len() as u64;
    match Node::decode(block)? {
        Node::Protobuf(pb) => classify_unixfs(&block.cid, &pb, size),
        Node::Raw(_) => Ok(NodeKind::RawFile { size }),
        Node::Cbor(_) => Ok(NodeKind::StructuredData { size }),
        Node::Other { codec, .. } => Ok(NodeKind::Unknown { codec }),
    }
}

fn classify_unixfs(cid: &Cid, pb: &ProtoNode, block_len: u64) -> ResolveResult<NodeKind> {
    let fs = pb.unixfs(cid)?;
    let cumulative = pb
        .links
        .iter()
        .fold(block_len, |n, l| n.saturating_add(l.tsize.unwrap_or(0)));
    match fs.kind {
        DataType::Directory => Ok(NodeKind::Directory {
            entries: pb.links.len(),
            size: cumulative,
        }),
        DataType::HamtShard => Ok(NodeKind::ShardedDirectory {
            links: pb.links.len(),
            fanout: fs.fanout,
            size: cumulative,
        }),
        DataType::File => Ok(NodeKind::File {
            size: fs.file_size(),
        }),
        DataType::Symlink => Ok(NodeKind::Symlink {
            target: String::from_utf8_lossy(&fs.data).into_owned(),
        }),
        other => Err(ResolveError::UnknownUnixfsType {
            cid: *cid,
            kind: format!("{other:?}"),
        }),
    }
}

/// Codec name used when a link's target is not held, e.g. `DAG-PB`.
pub(crate) fn codec_label(cid: &Cid) -> String {
    Codec::of(cid).to_string()
}
