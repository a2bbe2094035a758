use cid::Cid;

use crate::block::Block;
use crate::car::varint::encode_varint;
use crate::car::CarHeader;
use crate::error::StoreResult;

/// Builds a CARv1 archive in memory.
pub struct CarWriter {
    header: CarHeader,
    sections: Vec<(Cid, bytes::Bytes)>,
}

impl CarWriter {
    /// A writer for an archive with a single root.
    pub fn new(root: Cid) -> Self {
        Self::with_roots(vec![root])
    }

    /// A writer declaring arbitrary roots.
    pub fn with_roots(roots: Vec<Cid>) -> Self {
        Self {
            header: CarHeader::v1(roots),
            sections: Vec::new(),
        }
    }

    /// Queue a block. Blocks are written in the order they are added.
    pub fn add_block(&mut self, block: &Block) {
        self.sections.push((block.cid, block.data.clone()));
    }

    /// Number of blocks queued.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Serialize the archive.
    pub fn finish(self) -> StoreResult<Vec<u8>> {
        let header = self.header.encode()?;
        let mut out = Vec::with_capacity(
            header.len() + self.sections.iter().map(|(_, d)| d.len() + 48).sum::<usize>(),
        );
        encode_varint(&mut out, header.len() as u64);
        out.extend_from_slice(&header);
        for (cid, data) in &self.sections {
            let cid_bytes = cid.to_bytes();
            encode_varint(&mut out, (cid_bytes.len() + data.len()) as u64);
            out.extend_from_slice(&cid_bytes);
            out.extend_from_slice(data);
        }
        Ok(out)
    }
}
