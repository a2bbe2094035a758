//! Importing content as UnixFS DAGs.

use bytes::Bytes;
use cid::Cid;
use dagex_store::Block;
use dagex_types::Codec;
use ipld_core::ipld::Ipld;

use crate::error::{DagError, DagResult};
use crate::pb::{Link, ProtoNode};
use crate::service::DagService;
use crate::unixfs::{DataType, UnixfsData};

/// Default leaf size for imported files.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// A node written by the builder, with the cumulative size of its subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Added {
    pub cid: Cid,
    pub tsize: u64,
}

impl Added {
    /// A directory link pointing at this node.
    pub fn link(&self, name: impl Into<String>) -> Link {
        Link::new(self.cid, name, self.tsize)
    }
}

/// Writes UnixFS nodes into a [`DagService`].
///
/// Files up to one chunk are stored inline in a single DAG-PB node; larger
/// files become a DAG-PB root over raw leaves.
#[derive(Clone, Debug)]
pub struct DagBuilder {
    service: DagService,
    chunk_size: usize,
}

impl DagBuilder {
    pub fn new(service: DagService) -> Self {
        Self {
            service,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Store bytes as a single raw block.
    pub fn add_raw(&self, data: impl Into<Bytes>) -> DagResult<Added> {
        let block = Block::encode(Codec::RAW, data);
        let tsize = block.len() as u64;
        Ok(Added {
            cid: self.service.add(block)?,
            tsize,
        })
    }

    /// Store bytes as a UnixFS file.
    pub fn add_file(&self, data: impl Into<Bytes>) -> DagResult<Added> {
        let data = data.into();
        let mut fs = UnixfsData::new(DataType::File);
        fs.filesize = Some(data.len() as u64);

        if data.len() <= self.chunk_size {
            fs.data = data;
            return self.add_proto(ProtoNode::new(Some(fs.encode().into()), Vec::new()), 0);
        }

        let mut links = Vec::new();
        let mut children = 0;
        for chunk in data.chunks(self.chunk_size) {
            let leaf = self.add_raw(data.slice_ref(chunk))?;
            fs.blocksizes.push(chunk.len() as u64);
            children += leaf.tsize;
            links.push(leaf.link(""));
        }
        self.add_proto(ProtoNode::new(Some(fs.encode().into()), links), children)
    }

    /// Store a directory over already-added entries. Entries are sorted by
    /// name.
    pub fn add_directory(&self, mut entries: Vec<Link>) -> DagResult<Added> {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let fs = UnixfsData::new(DataType::Directory);
        let children = entries.iter().filter_map(|l| l.tsize).sum();
        self.add_proto(ProtoNode::new(Some(fs.encode().into()), entries), children)
    }

    /// Store a single-level HAMT shard node over the given links.
    pub fn add_shard(&self, links: Vec<Link>, fanout: u64) -> DagResult<Added> {
        let mut fs = UnixfsData::new(DataType::HamtShard);
        fs.fanout = Some(fanout);
        fs.hash_type = Some(0x22);
        let children = links.iter().filter_map(|l| l.tsize).sum();
        self.add_proto(ProtoNode::new(Some(fs.encode().into()), links), children)
    }

    /// Store a symlink.
    pub fn add_symlink(&self, target: &str) -> DagResult<Added> {
        let mut fs = UnixfsData::new(DataType::Symlink);
        fs.data = Bytes::copy_from_slice(target.as_bytes());
        self.add_proto(ProtoNode::new(Some(fs.encode().into()), Vec::new()), 0)
    }

    /// Store structured data as DAG-CBOR.
    pub fn add_cbor(&self, value: &Ipld) -> DagResult<Added> {
        let bytes = serde_ipld_dagcbor::to_vec(value).map_err(|e| DagError::Encoding(e.to_string()))?;
        let block = Block::encode(Codec::DAG_CBOR, bytes);
        let tsize = block.len() as u64;
        Ok(Added {
            cid: self.service.add(block)?,
            tsize,
        })
    }

    fn add_proto(&self, node: ProtoNode, children: u64) -> DagResult<Added> {
        let block = Block::encode(Codec::DAG_PB, node.encode());
        let tsize = block.len() as u64 + children;
        Ok(Added {
            cid: self.service.add(block)?,
            tsize,
        })
    }
}
