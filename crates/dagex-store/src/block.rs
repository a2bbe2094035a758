use bytes::Bytes;
use cid::multihash::Multihash;
use cid::Cid;
use sha2::{Digest, Sha256};

use crate::verify::SHA2_256;

/// An immutable block: bytes plus the CID they are addressed by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub cid: Cid,
    pub data: Bytes,
}

impl Block {
    /// Pair a CID with bytes without checking the hash.
    ///
    /// Stores verify on read, so an inconsistent pair surfaces as
    /// [`StoreError::HashMismatch`](crate::StoreError::HashMismatch) later.
    pub fn new(cid: Cid, data: impl Into<Bytes>) -> Self {
        Self {
            cid,
            data: data.into(),
        }
    }

    /// Hash `data` with sha2-256 and address it as a CIDv1 of `codec`.
    pub fn encode(codec: u64, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let digest = Sha256::digest(&data);
        // A 32-byte digest always fits the 64-byte multihash.
        let hash = Multihash::<64>::wrap(SHA2_256, digest.as_slice()).expect("sha2-256 digest fits");
        Self {
            cid: Cid::new_v1(codec, hash),
            data,
        }
    }

    /// Size of the block payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagex_types::Codec;

    #[test]
    fn encode_is_deterministic() {
        let a = Block::encode(Codec::RAW, &b"hello"[..]);
        let b = Block::encode(Codec::RAW, &b"hello"[..]);
        assert_eq!(a, b);
        assert_eq!(a.cid.codec(), Codec::RAW);
        assert_eq!(a.cid.hash().code(), SHA2_256);
    }

    #[test]
    fn codec_changes_cid_not_digest() {
        let raw = Block::encode(Codec::RAW, &b"x"[..]);
        let cbor = Block::encode(Codec::DAG_CBOR, &b"x"[..]);
        assert_ne!(raw.cid, cbor.cid);
        assert_eq!(raw.cid.hash(), cbor.cid.hash());
    }
}
