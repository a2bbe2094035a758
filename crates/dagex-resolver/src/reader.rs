//! Seekable byte access to file-like nodes.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use bytes::Bytes;
use cid::Cid;
use dagex_dag::{DagReader, DagService};

use crate::classify::{classify_block, NodeKind};
use crate::error::{ResolveError, ResolveResult};

/// Bytes of a UnixFS file or a raw block.
pub enum ContentReader {
    Dag(DagReader),
    Raw(Cursor<Bytes>),
}

impl ContentReader {
    /// Open the node at `cid`. Directories, structured data and unknown
    /// codecs are rejected.
    pub fn open(dag: &DagService, cid: &Cid) -> ResolveResult<Self> {
        let block = dag.block(cid)?;
        match classify_block(&block)? {
            NodeKind::File { .. } => Ok(ContentReader::Dag(DagReader::new(dag.clone(), *cid)?)),
            NodeKind::RawFile { .. } => Ok(ContentReader::Raw(Cursor::new(block.data))),
            other => Err(ResolveError::NotAFile {
                cid: *cid,
                kind: other.label(),
            }),
        }
    }

    /// Logical length in bytes.
    pub fn size(&self) -> u64 {
        match self {
            ContentReader::Dag(reader) => reader.size(),
            ContentReader::Raw(cursor) => cursor.get_ref().len() as u64,
        }
    }

    /// The locally held prefix, up to `limit` bytes, for sniffing a file
    /// whose later leaves were not retrieved. Leaves the reader at the start.
    pub fn head(&mut self, limit: usize) -> ResolveResult<Vec<u8>> {
        let head = match self {
            ContentReader::Dag(reader) => {
                reader.seek(SeekFrom::Start(0)).map_err(ResolveError::Seek)?;
                reader.read_prefix(limit)?
            }
            ContentReader::Raw(cursor) => {
                let data = cursor.get_ref();
                data[..data.len().min(limit)].to_vec()
            }
        };
        self.seek(SeekFrom::Start(0)).map_err(ResolveError::Seek)?;
        Ok(head)
    }

    /// Read `len` bytes starting at `offset`, clamped to the content.
    pub fn read_range(&mut self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(offset))?;
        let mut out = Vec::new();
        self.by_ref().take(len).read_to_end(&mut out)?;
        Ok(out)
    }
}

impl Read for ContentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ContentReader::Dag(reader) => reader.read(buf),
            ContentReader::Raw(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for ContentReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ContentReader::Dag(reader) => reader.seek(pos),
            ContentReader::Raw(cursor) => cursor.seek(pos),
        }
    }
}

impl std::fmt::Debug for ContentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentReader::Dag(reader) => f.debug_tuple("Dag").field(reader).finish(),
            ContentReader::Raw(cursor) => f.debug_struct("Raw").field("len", &cursor.get_ref().len()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_type::detect;
    use dagex_dag::DagBuilder;
    use dagex_store::MemoryBlockStore;
    use std::sync::Arc;

    #[test]
    fn chunked_file_ranges() {
        let dag = DagService::new(Arc::new(MemoryBlockStore::new()));
        let file = DagBuilder::new(dag.clone())
            .with_chunk_size(4)
            .add_file(&b"0123456789abcdef"[..])
            .unwrap();
        let mut reader = ContentReader::open(&dag, &file.cid).unwrap();
        assert_eq!(reader.size(), 16);
        assert_eq!(reader.read_range(6, 5).unwrap(), b"6789a");
        assert_eq!(reader.read_range(14, 100).unwrap(), b"ef");
    }

    #[test]
    fn raw_block_is_sniffed_then_read_whole() {
        let dag = DagService::new(Arc::new(MemoryBlockStore::new()));
        let raw = DagBuilder::new(dag.clone()).add_raw(&b"<html><b>hi</b></html>"[..]).unwrap();
        let mut reader = ContentReader::open(&dag, &raw.cid).unwrap();
        assert_eq!(detect(&mut reader, None).unwrap(), "text/html");
        let mut body = Vec::new();
        reader.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"<html><b>hi</b></html>");
    }

    #[test]
    fn head_of_partial_file() {
        let store = Arc::new(MemoryBlockStore::new());
        let full = DagService::new(store);
        let file = DagBuilder::new(full.clone())
            .with_chunk_size(4)
            .add_file(&b"abcdefgh"[..])
            .unwrap();
        let root = full.block(&file.cid).unwrap();
        let first = match dagex_dag::Node::decode(&root).unwrap() {
            dagex_dag::Node::Protobuf(pb) => pb.links[0].cid,
            other => panic!("expected dag-pb, got {other:?}"),
        };
        let partial = MemoryBlockStore::from_blocks([root, full.block(&first).unwrap()]).unwrap();
        let dag = DagService::new(Arc::new(partial));

        let mut reader = ContentReader::open(&dag, &file.cid).unwrap();
        assert_eq!(reader.head(100).unwrap(), b"abcd");
    }

    #[test]
    fn directories_are_rejected() {
        let dag = DagService::new(Arc::new(MemoryBlockStore::new()));
        let dir = DagBuilder::new(dag.clone()).add_directory(Vec::new()).unwrap();
        assert!(matches!(
            ContentReader::open(&dag, &dir.cid),
            Err(ResolveError::NotAFile { .. })
        ));
    }
}
