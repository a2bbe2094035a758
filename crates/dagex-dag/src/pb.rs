//! DAG-PB nodes.
//!
//! The wire messages are plain `prost` structs. [`ProtoNode`] is the decoded
//! form the rest of the crate works with: links carry parsed CIDs, and the
//! node can be viewed in the IPLD data model for selector traversal.

use std::collections::BTreeMap;

use bytes::Bytes;
use cid::Cid;
use ipld_core::ipld::Ipld;
use prost::Message;

use crate::error::{DagError, DagResult};
use crate::unixfs::UnixfsData;

mod wire {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PbLink {
        #[prost(bytes = "vec", optional, tag = "1")]
        pub hash: Option<Vec<u8>>,
        #[prost(string, optional, tag = "2")]
        pub name: Option<String>,
        #[prost(uint64, optional, tag = "3")]
        pub tsize: Option<u64>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PbNode {
        #[prost(bytes = "bytes", optional, tag = "1")]
        pub data: Option<bytes::Bytes>,
        #[prost(message, repeated, tag = "2")]
        pub links: Vec<PbLink>,
    }
}

/// A named link from a DAG-PB node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub cid: Cid,
    pub name: String,
    /// Cumulative size of the linked subtree, if the producer recorded it.
    pub tsize: Option<u64>,
}

impl Link {
    pub fn new(cid: Cid, name: impl Into<String>, tsize: u64) -> Self {
        Self {
            cid,
            name: name.into(),
            tsize: Some(tsize),
        }
    }
}

/// A decoded DAG-PB node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtoNode {
    pub data: Option<Bytes>,
    pub links: Vec<Link>,
}

impl ProtoNode {
    pub fn new(data: Option<Bytes>, links: Vec<Link>) -> Self {
        Self { data, links }
    }

    /// Decode the block stored under `cid`.
    pub fn decode(cid: &Cid, bytes: &[u8]) -> DagResult<Self> {
        let node = wire::PbNode::decode(bytes).map_err(|e| DagError::Protobuf {
            cid: *cid,
            reason: e.to_string(),
        })?;
        let links = node
            .links
            .into_iter()
            .enumerate()
            .map(|(index, link)| {
                let hash = link.hash.ok_or_else(|| DagError::InvalidLink {
                    cid: *cid,
                    index,
                    reason: "missing hash".into(),
                })?;
                let target = Cid::try_from(hash.as_slice()).map_err(|e| DagError::InvalidLink {
                    cid: *cid,
                    index,
                    reason: e.to_string(),
                })?;
                Ok(Link {
                    cid: target,
                    name: link.name.unwrap_or_default(),
                    tsize: link.tsize,
                })
            })
            .collect::<DagResult<Vec<_>>>()?;
        Ok(Self {
            data: node.data,
            links,
        })
    }

    /// Canonical encoding: links first, then data.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for link in &self.links {
            let wire = wire::PbLink {
                hash: Some(link.cid.to_bytes()),
                name: Some(link.name.clone()),
                tsize: link.tsize,
            };
            prost::encoding::message::encode(2, &wire, &mut buf);
        }
        if let Some(data) = &self.data {
            prost::encoding::bytes::encode(1, data, &mut buf);
        }
        buf
    }

    /// Decode the UnixFS descriptor carried in the node's data.
    pub fn unixfs(&self, cid: &Cid) -> DagResult<UnixfsData> {
        let data = self.data.as_deref().ok_or_else(|| DagError::Unixfs {
            cid: *cid,
            reason: "node carries no data".into(),
        })?;
        UnixfsData::decode(cid, data)
    }

    /// The node in the IPLD data model: `{Data, Links: [{Hash, Name, Tsize}]}`.
    pub fn to_ipld(&self) -> Ipld {
        let links = self
            .links
            .iter()
            .map(|link| {
                let mut map = BTreeMap::new();
                map.insert("Hash".to_string(), Ipld::Link(link.cid));
                map.insert("Name".to_string(), Ipld::String(link.name.clone()));
                if let Some(tsize) = link.tsize {
                    map.insert("Tsize".to_string(), Ipld::Integer(tsize as i128));
                }
                Ipld::Map(map)
            })
            .collect();
        let mut map = BTreeMap::new();
        map.insert("Links".to_string(), Ipld::List(links));
        if let Some(data) = &self.data {
            map.insert("Data".to_string(), Ipld::Bytes(data.to_vec()));
        }
        Ipld::Map(map)
    }
}
