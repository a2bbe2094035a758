use std::fmt;

use cid::Cid;

use crate::error::{TypeError, TypeResult};

/// The multicodec carried by a CID.
///
/// Only the codecs the explorer understands get their own variant; anything
/// else is kept as its raw code so it can be reported as a hex tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Protobuf-encoded merkledag node (UnixFS lives inside it).
    DagPb,
    /// Raw bytes, no framing.
    Raw,
    /// Structured CBOR data with tag-42 links.
    DagCbor,
    /// Any other codec.
    Other(u64),
}

impl Codec {
    pub const DAG_PB: u64 = 0x70;
    pub const RAW: u64 = 0x55;
    pub const DAG_CBOR: u64 = 0x71;

    /// Map a multicodec code to a [`Codec`].
    pub fn from_code(code: u64) -> Self {
        match code {
            Self::DAG_PB => Self::DagPb,
            Self::RAW => Self::Raw,
            Self::DAG_CBOR => Self::DagCbor,
            other => Self::Other(other),
        }
    }

    /// The codec of a CID.
    pub fn of(cid: &Cid) -> Self {
        Self::from_code(cid.codec())
    }

    /// The multicodec code.
    pub fn code(&self) -> u64 {
        match self {
            Self::DagPb => Self::DAG_PB,
            Self::Raw => Self::RAW,
            Self::DagCbor => Self::DAG_CBOR,
            Self::Other(code) => *code,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DagPb => write!(f, "DAG-PB"),
            Self::Raw => write!(f, "RAW"),
            Self::DagCbor => write!(f, "DAG-CBOR"),
            Self::Other(code) => write!(f, "UNK:0x{code:x}"),
        }
    }
}

/// Parse a CID from its string form, keeping the input in the error.
pub fn parse_cid(s: &str) -> TypeResult<Cid> {
    Cid::try_from(s).map_err(|e| TypeError::InvalidCid {
        input: s.to_string(),
        reason: e.to_string(),
    })
}

/// Serde helper storing a [`Cid`] as its canonical string.
pub mod cid_string {
    use cid::Cid;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cid: &Cid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(cid)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cid, D::Error> {
        let s = String::deserialize(deserializer)?;
        Cid::try_from(s.as_str()).map_err(serde::de::Error::custom)
    }
}
