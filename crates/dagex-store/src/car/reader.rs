use std::collections::HashMap;
use std::io::Cursor;
use std::ops::Range;

use bytes::Bytes;
use cid::Cid;
use tracing::debug;

use crate::block::Block;
use crate::car::varint::decode_varint;
use crate::car::CarHeader;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;
use crate::verify::verify_block;

const CARV2_PRAGMA_LEN: usize = 11;
const CARV2_HEADER_LEN: usize = 40;

/// Read-only block store over an in-memory CAR archive.
///
/// Opening the archive walks every section once to build an index keyed by
/// the whole CID; the archive's own index (CARv2) is never consulted. Block
/// bytes are hashed on every read, so a corrupt section is reported when it
/// is asked for rather than served.
pub struct CarBlockStore {
    data: Bytes,
    roots: Vec<Cid>,
    index: HashMap<Cid, Range<usize>>,
    order: Vec<Cid>,
}

impl CarBlockStore {
    /// Open an archive from raw bytes.
    pub fn open(data: impl Into<Bytes>) -> StoreResult<Self> {
        let data = data.into();
        let (header, header_end) = read_header(&data, 0)?;
        let (roots, start, end) = match header.version {
            1 => (header.roots, header_end, data.len()),
            2 => {
                let (start, end) = read_v2_payload(&data)?;
                let (inner, inner_end) = read_header(&data[..end], start)?;
                if inner.version != 1 {
                    return Err(StoreError::InvalidHeader(format!(
                        "CARv2 payload has version {}",
                        inner.version
                    )));
                }
                (inner.roots, inner_end, end)
            }
            v => return Err(StoreError::InvalidHeader(format!("unsupported version {v}"))),
        };

        let mut index = HashMap::new();
        let mut order = Vec::new();
        let mut pos = start;
        while pos < end {
            let (section_len, consumed) = decode_varint(&data[..end], pos)?;
            if section_len == 0 {
                debug!(offset = pos, "zero-length section, treating as end of archive");
                break;
            }
            let body_start = pos + consumed;
            let body_end = body_start
                .checked_add(section_len as usize)
                .filter(|e| *e <= end)
                .ok_or_else(|| StoreError::Truncated {
                    offset: pos,
                    reason: format!("section of {section_len} bytes extends past end"),
                })?;

            let mut cursor = Cursor::new(&data[body_start..body_end]);
            let cid = Cid::read_bytes(&mut cursor).map_err(|e| StoreError::CorruptSection {
                offset: pos,
                reason: e.to_string(),
            })?;
            let block_start = body_start + cursor.position() as usize;

            if !index.contains_key(&cid) {
                index.insert(cid, block_start..body_end);
                order.push(cid);
            }
            pos = body_end;
        }

        debug!(roots = roots.len(), blocks = order.len(), "opened archive");
        Ok(Self {
            data,
            roots,
            index,
            order,
        })
    }

    /// Roots declared by the header.
    pub fn roots(&self) -> &[Cid] {
        &self.roots
    }

    /// The archive's root, which must be the only one.
    pub fn single_root(&self) -> StoreResult<Cid> {
        match self.roots.as_slice() {
            [root] => Ok(*root),
            roots => Err(StoreError::WrongRootCount(roots.len())),
        }
    }

    /// Number of distinct blocks in the archive.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Block CIDs in archive order.
    pub fn cids(&self) -> &[Cid] {
        &self.order
    }

    /// Iterate over all blocks in archive order, verifying each one.
    pub fn blocks(&self) -> impl Iterator<Item = StoreResult<Block>> + '_ {
        self.order.iter().map(|cid| self.require(cid))
    }
}

impl BlockStore for CarBlockStore {
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>> {
        let Some(range) = self.index.get(cid) else {
            return Ok(None);
        };
        let bytes = self.data.slice(range.clone());
        verify_block(cid, &bytes)?;
        Ok(Some(Block::new(*cid, bytes)))
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        Ok(self.index.contains_key(cid))
    }

    fn put(&self, _block: Block) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }
}

impl std::fmt::Debug for CarBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarBlockStore")
            .field("roots", &self.roots)
            .field("block_count", &self.order.len())
            .field("archive_bytes", &self.data.len())
            .finish()
    }
}

fn read_header(data: &[u8], offset: usize) -> StoreResult<(CarHeader, usize)> {
    let (len, consumed) = decode_varint(data, offset)?;
    if len == 0 {
        return Err(StoreError::InvalidHeader("empty header".into()));
    }
    let start = offset + consumed;
    let end = start
        .checked_add(len as usize)
        .filter(|e| *e <= data.len())
        .ok_or_else(|| StoreError::Truncated {
            offset,
            reason: "header extends past end".into(),
        })?;
    Ok((CarHeader::decode(&data[start..end])?, end))
}

/// Locate the CARv1 payload inside a CARv2 archive.
fn read_v2_payload(data: &[u8]) -> StoreResult<(usize, usize)> {
    let header_end = CARV2_PRAGMA_LEN + CARV2_HEADER_LEN;
    if data.len() < header_end {
        return Err(StoreError::Truncated {
            offset: CARV2_PRAGMA_LEN,
            reason: "CARv2 header too short".into(),
        });
    }
    let header = &data[CARV2_PRAGMA_LEN..header_end];
    let read_u64 = |at: usize| {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&header[at..at + 8]);
        u64::from_le_bytes(buf)
    };
    let offset = read_u64(16) as usize;
    let size = read_u64(24) as usize;
    let end = offset
        .checked_add(size)
        .filter(|e| *e <= data.len() && offset >= header_end)
        .ok_or_else(|| StoreError::Truncated {
            offset: CARV2_PRAGMA_LEN,
            reason: format!("CARv2 payload {offset}+{size} outside archive"),
        })?;
    Ok((offset, end))
}
