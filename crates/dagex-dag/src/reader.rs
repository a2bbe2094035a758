//! Seekable reading of UnixFS files.

use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;
use cid::Cid;
use dagex_types::Codec;

use crate::error::{DagError, DagResult};
use crate::pb::ProtoNode;
use crate::service::DagService;
use crate::unixfs::DataType;

/// `Read + Seek` over a UnixFS file tree (or a single raw block).
///
/// Leaves are located by descending from the root using `blocksizes`, so a
/// seek only loads the blocks on the path to the target offset. The most
/// recently read leaf is kept.
pub struct DagReader {
    service: DagService,
    root: Cid,
    size: u64,
    pos: u64,
    leaf: Option<(u64, Bytes)>,
}

impl DagReader {
    /// Open a reader over the file rooted at `root`.
    pub fn new(service: DagService, root: Cid) -> DagResult<Self> {
        let size = node_size(&service, &root)?;
        Ok(Self {
            service,
            root,
            size,
            pos: 0,
            leaf: None,
        })
    }

    /// Logical file size.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn root(&self) -> &Cid {
        &self.root
    }

    /// Read up to `limit` bytes from the current position, stopping early at
    /// the first block that is not held locally.
    ///
    /// Used to sniff partially retrieved files. Errors other than a missing
    /// block are propagated.
    pub fn read_prefix(&mut self, limit: usize) -> DagResult<Vec<u8>> {
        let mut out = Vec::with_capacity(limit.min(self.size as usize));
        let mut buf = [0u8; 4096];
        while out.len() < limit {
            let want = buf.len().min(limit - out.len());
            match self.read_chunk(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) if e.is_missing() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> DagResult<usize> {
        if self.pos >= self.size || buf.is_empty() {
            return Ok(0);
        }
        let cached = matches!(&self.leaf, Some((start, data))
            if self.pos >= *start && self.pos < start + data.len() as u64);
        if !cached {
            self.leaf = Some(locate(&self.service, &self.root, 0, self.pos)?);
        }
        let Some((start, data)) = &self.leaf else {
            return Ok(0);
        };
        let offset = (self.pos - start) as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Read for DagReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map_err(|e| {
            let kind = if e.is_missing() {
                io::ErrorKind::NotFound
            } else {
                io::ErrorKind::InvalidData
            };
            io::Error::new(kind, e)
        })
    }
}

impl Seek for DagReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(d) => self.size.checked_add_signed(d),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of file")
        })?;
        self.pos = target;
        Ok(target)
    }
}

impl std::fmt::Debug for DagReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DagReader")
            .field("root", &self.root)
            .field("size", &self.size)
            .field("pos", &self.pos)
            .finish()
    }
}

fn file_node(service: &DagService, cid: &Cid) -> DagResult<ProtoNode> {
    let block = service.block(cid)?;
    ProtoNode::decode(cid, &block.data)
}

fn not_a_file(cid: &Cid, kind: String) -> DagError {
    DagError::NotAFile { cid: *cid, kind }
}

/// Logical size of the file rooted at `cid`.
pub(crate) fn node_size(service: &DagService, cid: &Cid) -> DagResult<u64> {
    match Codec::of(cid) {
        Codec::Raw => Ok(service.block(cid)?.len() as u64),
        Codec::DagPb => {
            let fs = file_node(service, cid)?.unixfs(cid)?;
            match fs.kind {
                DataType::File | DataType::Raw => Ok(fs.file_size()),
                other => Err(not_a_file(cid, format!("{other:?}"))),
            }
        }
        other => Err(not_a_file(cid, other.to_string())),
    }
}

/// Find the leaf holding `pos`, returning its starting offset and bytes.
fn locate(service: &DagService, cid: &Cid, base: u64, pos: u64) -> DagResult<(u64, Bytes)> {
    match Codec::of(cid) {
        Codec::Raw => Ok((base, service.block(cid)?.data)),
        Codec::DagPb => {
            let node = file_node(service, cid)?;
            let fs = node.unixfs(cid)?;
            if !matches!(fs.kind, DataType::File | DataType::Raw) {
                return Err(not_a_file(cid, format!("{:?}", fs.kind)));
            }
            let overflow = || DagError::Unixfs {
                cid: *cid,
                reason: "block sizes overflow the file offset".to_string(),
            };
            let mut child_base = base.checked_add(fs.data.len() as u64).ok_or_else(overflow)?;
            if pos < child_base || node.links.is_empty() {
                return Ok((base, fs.data));
            }
            for (i, link) in node.links.iter().enumerate() {
                let size = match fs.blocksizes.get(i) {
                    Some(size) => *size,
                    None => node_size(service, &link.cid)?,
                };
                let end = child_base.checked_add(size).ok_or_else(overflow)?;
                if pos < end {
                    return locate(service, &link.cid, child_base, pos);
                }
                child_base = end;
            }
            Ok((child_base, Bytes::new()))
        }
        other => Err(not_a_file(cid, other.to_string())),
    }
}
