//! Decoded blocks.

use bytes::Bytes;
use cid::Cid;
use dagex_store::Block;
use dagex_types::Codec;
use ipld_core::ipld::Ipld;

use crate::error::{DagError, DagResult};
use crate::pb::ProtoNode;

/// A block decoded according to its CID's codec.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// DAG-PB.
    Protobuf(ProtoNode),
    /// Raw leaf bytes.
    Raw(Bytes),
    /// DAG-CBOR structured data.
    Cbor(Ipld),
    /// Any codec this crate does not interpret.
    Other { codec: u64, data: Bytes },
}

impl Node {
    /// Decode a block. A DAG-CBOR decode failure is an error, never a
    /// fallback to opaque bytes.
    pub fn decode(block: &Block) -> DagResult<Self> {
        match Codec::of(&block.cid) {
            Codec::DagPb => Ok(Node::Protobuf(ProtoNode::decode(&block.cid, &block.data)?)),
            Codec::Raw => Ok(Node::Raw(block.data.clone())),
            Codec::DagCbor => decode_cbor(&block.cid, &block.data).map(Node::Cbor),
            Codec::Other(codec) => Ok(Node::Other {
                codec,
                data: block.data.clone(),
            }),
        }
    }

    /// View the node in the IPLD data model.
    pub fn to_ipld(&self) -> Ipld {
        match self {
            Node::Protobuf(pb) => pb.to_ipld(),
            Node::Raw(data) | Node::Other { data, .. } => Ipld::Bytes(data.to_vec()),
            Node::Cbor(ipld) => ipld.clone(),
        }
    }
}

pub(crate) fn decode_cbor(cid: &Cid, data: &[u8]) -> DagResult<Ipld> {
    serde_ipld_dagcbor::from_slice(data).map_err(|e| DagError::Cbor {
        cid: *cid,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn raw_block_is_raw_node() {
        let block = Block::encode(Codec::RAW, &b"bytes"[..]);
        assert_eq!(Node::decode(&block).unwrap(), Node::Raw(Bytes::from_static(b"bytes")));
    }

    #[test]
    fn cbor_block_decodes_to_ipld() {
        let mut map = BTreeMap::new();
        map.insert("n".to_string(), Ipld::Integer(7));
        let bytes = serde_ipld_dagcbor::to_vec(&Ipld::Map(map.clone())).unwrap();
        let block = Block::encode(Codec::DAG_CBOR, bytes);
        assert_eq!(Node::decode(&block).unwrap(), Node::Cbor(Ipld::Map(map)));
    }

    #[test]
    fn cbor_failure_is_fatal() {
        let block = Block::encode(Codec::DAG_CBOR, vec![0xFF, 0x00]);
        assert!(matches!(Node::decode(&block), Err(DagError::Cbor { .. })));
    }

    #[test]
    fn unknown_codec_is_opaque() {
        let block = Block::encode(0x0129, &b"{}"[..]);
        assert!(matches!(Node::decode(&block).unwrap(), Node::Other { codec: 0x0129, .. }));
    }
}
