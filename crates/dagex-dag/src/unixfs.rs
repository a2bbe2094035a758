//! UnixFS descriptors carried in the data field of DAG-PB nodes.

use bytes::Bytes;
use cid::Cid;
use prost::Message;

use crate::error::{DagError, DagResult};

mod wire {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Data {
        #[prost(enumeration = "super::DataType", required, tag = "1")]
        pub r#type: i32,
        #[prost(bytes = "bytes", optional, tag = "2")]
        pub data: Option<bytes::Bytes>,
        #[prost(uint64, optional, tag = "3")]
        pub filesize: Option<u64>,
        #[prost(uint64, repeated, tag = "4")]
        pub blocksizes: Vec<u64>,
        #[prost(uint64, optional, tag = "5")]
        pub hash_type: Option<u64>,
        #[prost(uint64, optional, tag = "6")]
        pub fanout: Option<u64>,
    }
}

/// UnixFS node type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    Raw = 0,
    Directory = 1,
    File = 2,
    Metadata = 3,
    Symlink = 4,
    HamtShard = 5,
}

/// Decoded UnixFS descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnixfsData {
    pub kind: DataType,
    pub data: Bytes,
    pub filesize: Option<u64>,
    pub blocksizes: Vec<u64>,
    pub hash_type: Option<u64>,
    pub fanout: Option<u64>,
}

impl UnixfsData {
    pub fn new(kind: DataType) -> Self {
        Self {
            kind,
            data: Bytes::new(),
            filesize: None,
            blocksizes: Vec::new(),
            hash_type: None,
            fanout: None,
        }
    }

    pub fn decode(cid: &Cid, bytes: &[u8]) -> DagResult<Self> {
        let raw = wire::Data::decode(bytes).map_err(|e| DagError::Unixfs {
            cid: *cid,
            reason: e.to_string(),
        })?;
        let kind = DataType::try_from(raw.r#type).map_err(|_| DagError::Unixfs {
            cid: *cid,
            reason: format!("unknown data type {}", raw.r#type),
        })?;
        Ok(Self {
            kind,
            data: raw.data.unwrap_or_default(),
            filesize: raw.filesize,
            blocksizes: raw.blocksizes,
            hash_type: raw.hash_type,
            fanout: raw.fanout,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        wire::Data {
            r#type: self.kind as i32,
            data: (!self.data.is_empty()).then(|| self.data.clone()),
            filesize: self.filesize,
            blocksizes: self.blocksizes.clone(),
            hash_type: self.hash_type,
            fanout: self.fanout,
        }
        .encode_to_vec()
    }

    /// Logical size of the file this descriptor heads.
    pub fn file_size(&self) -> u64 {
        self.filesize
            .unwrap_or_else(|| {
                self.blocksizes
                    .iter()
                    .fold(self.data.len() as u64, |total, size| total.saturating_add(*size))
            })
    }
}
