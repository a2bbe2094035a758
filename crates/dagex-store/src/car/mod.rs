//! CAR (Content Addressable aRchive) support.
//!
//! A CARv1 archive is a varint-prefixed DAG-CBOR header
//! `{roots: [CID], version: 1}` followed by sections, each a varint length
//! and then a CID immediately followed by the block bytes. A zero-length
//! section is accepted as an end marker. CARv2 archives wrap a CARv1 payload;
//! the reader unwraps it and ignores the trailing index.

mod reader;
pub(crate) mod varint;
mod writer;

use cid::Cid;
use ipld_core::ipld::Ipld;

use crate::error::{StoreError, StoreResult};

pub use reader::CarBlockStore;
pub use writer::CarWriter;

/// Media type of a CAR archive.
pub const CAR_MEDIA_TYPE: &str = "application/vnd.ipld.car";

/// Decoded archive header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarHeader {
    pub version: u64,
    pub roots: Vec<Cid>,
}

impl CarHeader {
    pub fn v1(roots: Vec<Cid>) -> Self {
        Self { version: 1, roots }
    }

    pub(crate) fn decode(bytes: &[u8]) -> StoreResult<Self> {
        let ipld: Ipld = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| StoreError::InvalidHeader(e.to_string()))?;
        let Ipld::Map(map) = ipld else {
            return Err(StoreError::InvalidHeader("header is not a map".into()));
        };
        let version = match map.get("version") {
            Some(Ipld::Integer(v)) if *v >= 0 => *v as u64,
            _ => return Err(StoreError::InvalidHeader("missing version".into())),
        };
        let roots = match map.get("roots") {
            Some(Ipld::List(items)) => items
                .iter()
                .map(|item| match item {
                    Ipld::Link(cid) => Ok(*cid),
                    _ => Err(StoreError::InvalidHeader("root is not a link".into())),
                })
                .collect::<StoreResult<Vec<_>>>()?,
            // CARv2 pragma carries no roots.
            None if version == 2 => Vec::new(),
            _ => return Err(StoreError::InvalidHeader("missing roots".into())),
        };
        Ok(Self { version, roots })
    }

    pub(crate) fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut map = std::collections::BTreeMap::new();
        map.insert(
            "roots".to_string(),
            Ipld::List(self.roots.iter().copied().map(Ipld::Link).collect()),
        );
        map.insert("version".to_string(), Ipld::Integer(self.version as i128));
        serde_ipld_dagcbor::to_vec(&Ipld::Map(map)).map_err(|e| StoreError::Encoding(e.to_string()))
    }
}
