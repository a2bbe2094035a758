//! Importing local files into a pieces directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use cid::Cid;
use dagex_dag::builder::Added;
use dagex_dag::{DagBuilder, DagService};
use dagex_retrieval::piece_path;
use dagex_selector::{presets, walk};
use dagex_store::{Block, CarWriter, MemoryBlockStore};
use dagex_types::Codec;
use tracing::debug;

/// An archive written by [`pack`].
#[derive(Debug)]
pub struct Packed {
    pub root: Cid,
    pub piece: Cid,
    pub blocks: usize,
    pub path: PathBuf,
}

/// Import `input` as a UnixFS DAG and write it to `out` as `<piece>.car`.
///
/// Without an explicit piece CID the archive is filed under a raw CID of
/// its own bytes.
pub fn pack(input: &Path, out: &Path, piece: Option<Cid>) -> anyhow::Result<Packed> {
    let dag = DagService::new(Arc::new(MemoryBlockStore::new()));
    let builder = DagBuilder::new(dag.clone());
    let root = import(&builder, input)?;

    let blocks = walk(&dag, &root.cid, &presets::full_export())?;
    let mut writer = CarWriter::new(root.cid);
    for block in &blocks {
        writer.add_block(block);
    }
    let archive = writer.finish()?;
    let piece = piece.unwrap_or_else(|| Block::encode(Codec::RAW, archive.clone()).cid);

    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let path = piece_path(out, &piece);
    fs::write(&path, &archive).with_context(|| format!("writing {}", path.display()))?;
    Ok(Packed {
        root: root.cid,
        piece,
        blocks: blocks.len(),
        path,
    })
}

fn import(builder: &DagBuilder, path: &Path) -> anyhow::Result<Added> {
    let meta = fs::symlink_metadata(path).with_context(|| format!("reading {}", path.display()))?;
    if meta.file_type().is_symlink() {
        let target = fs::read_link(path)?;
        return Ok(builder.add_symlink(&target.to_string_lossy())?);
    }
    if !meta.is_dir() {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        return Ok(builder.add_file(data)?);
    }

    let mut links = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| anyhow!("file name {name:?} is not UTF-8"))?;
        links.push(import(builder, &entry.path())?.link(name));
    }
    debug!(dir = %path.display(), entries = links.len(), "imported directory");
    Ok(builder.add_directory(links)?)
}
