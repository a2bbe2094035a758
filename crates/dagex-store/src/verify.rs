use cid::Cid;
use sha2::{Digest, Sha256};

use crate::error::{StoreError, StoreResult};

pub const IDENTITY: u64 = 0x00;
pub const SHA2_256: u64 = 0x12;
pub const BLAKE3: u64 = 0x1e;

/// Check that `data` hashes to the digest carried by `cid`.
///
/// Supports identity, sha2-256 and blake3 multihashes. Anything else is
/// rejected: an archive block that cannot be checked is not trusted.
pub fn verify_block(cid: &Cid, data: &[u8]) -> StoreResult<()> {
    let mh = cid.hash();
    let computed: Vec<u8> = match mh.code() {
        IDENTITY => data.to_vec(),
        SHA2_256 => Sha256::digest(data).to_vec(),
        BLAKE3 => blake3::hash(data).as_bytes().to_vec(),
        code => return Err(StoreError::UnsupportedHash { cid: *cid, code }),
    };
    if computed.as_slice() != mh.digest() {
        return Err(StoreError::HashMismatch {
            cid: *cid,
            computed: hex::encode(&computed),
        });
    }
    Ok(())
}
