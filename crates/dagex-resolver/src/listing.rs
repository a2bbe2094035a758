//! Bounded directory listings.

use std::fmt;

use cid::Cid;
use dagex_dag::{DagService, Node};
use dagex_selector::TraversalLimits;
use dagex_types::size_str;
use tracing::debug;

use crate::classify::classify_block;
use crate::describe::describe_entry;
use crate::error::{ResolveError, ResolveResult};

/// How much is known about a listed child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Description {
    /// Classified while listing.
    Resolved(String),
    /// Past the eager-classification bound; resolve on demand.
    Deferred,
}

impl Description {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Description::Deferred)
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Description::Resolved(text) => f.write_str(text),
            Description::Deferred => Ok(()),
        }
    }
}

/// One child of a directory or HAMT shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// Cumulative size recorded in the link, in human-readable form.
    pub size: String,
    pub cid: Cid,
    pub desc: Description,
}

/// List the links of the directory or HAMT shard at `cid`.
///
/// Only the first `limits.max_dir_type_checks` children are classified. A
/// child that fails to classify is described as `?? (<error>)`; the
/// listing itself only fails when the directory node does.
pub fn list_directory(
    dag: &DagService,
    cid: &Cid,
    limits: &TraversalLimits,
) -> ResolveResult<Vec<DirEntry>> {
    let block = dag.block(cid)?;
    let kind = classify_block(&block)?;
    if !kind.is_directory() {
        return Err(ResolveError::NotADirectory {
            cid: *cid,
            kind: kind.label(),
        });
    }
    let Node::Protobuf(pb) = Node::decode(&block)? else {
        return Err(ResolveError::NotADirectory {
            cid: *cid,
            kind: kind.label(),
        });
    };

    let entries: Vec<DirEntry> = pb
        .links
        .into_iter()
        .enumerate()
        .map(|(i, link)| {
            let desc = if i < limits.max_dir_type_checks {
                let text = describe_entry(dag, &link.cid, &link.name)
                    .unwrap_or_else(|e| format!("?? ({e})"));
                Description::Resolved(text)
            } else {
                Description::Deferred
            };
            DirEntry {
                size: size_str(link.tsize.unwrap_or(0)),
                name: link.name,
                cid: link.cid,
                desc,
            }
        })
        .collect();

    debug!(
        %cid,
        entries = entries.len(),
        described = entries.len().min(limits.max_dir_type_checks),
        "listed directory"
    );
    Ok(entries)
}
