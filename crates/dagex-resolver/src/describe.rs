//! One-line descriptions of link targets.

use cid::Cid;
use dagex_dag::{DagReader, DagService};
use dagex_types::Codec;
use tracing::debug;

use crate::classify::{classify_block, codec_label, NodeKind};
use crate::content_type::{from_prefix, SNIFF_LEN};
use crate::error::ResolveResult;

/// Description of a link's target.
///
/// `full` is false when the target block was not held locally and the text
/// only reflects the codec; such links can be re-checked on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkDescription {
    pub text: String,
    pub full: bool,
}

impl LinkDescription {
    fn full(text: String) -> Self {
        Self { text, full: true }
    }

    /// Codec-only description of a target that was not inspected.
    pub fn tentative(cid: &Cid) -> Self {
        Self {
            text: codec_label(cid),
            full: false,
        }
    }
}

/// Describe a directory entry: `DIR (n entries)`, `FILE (text/plain)`, ...
///
/// A DAG-PB or raw child that is not held is described by its codec.
pub fn describe_entry(dag: &DagService, cid: &Cid, name: &str) -> ResolveResult<String> {
    Ok(describe(dag, cid, name, false)?.text)
}

/// Describe a link found in structured data. Files carry their leaf codec,
/// e.g. `FILE (raw,image/png)`.
pub fn describe_link(dag: &DagService, cid: &Cid, name: &str) -> ResolveResult<LinkDescription> {
    describe(dag, cid, name, true)
}

fn describe(dag: &DagService, cid: &Cid, name: &str, with_codec: bool) -> ResolveResult<LinkDescription> {
    let codec = Codec::of(cid);
    if matches!(codec, Codec::DagCbor | Codec::Other(_)) {
        // Described by codec alone, without loading.
        return Ok(LinkDescription::full(codec_label(cid)));
    }

    let Some(block) = dag.try_block(cid)? else {
        debug!(%cid, "link target not held");
        return Ok(LinkDescription::tentative(cid));
    };

    let kind = classify_block(&block)?;
    let (head, tag) = match kind {
        NodeKind::File { .. } => {
            let mut reader = DagReader::new(dag.clone(), *cid)?;
            (reader.read_prefix(SNIFF_LEN)?, "pb")
        }
        NodeKind::RawFile { .. } => (block.data.to_vec(), "raw"),
        other => return Ok(LinkDescription::full(other.label())),
    };

    let ctype = from_prefix(Some(name).filter(|n| !n.is_empty()), &head);
    let text = if with_codec {
        format!("FILE ({tag},{ctype})")
    } else {
        format!("FILE ({ctype})")
    };
    Ok(LinkDescription::full(text))
}
