//! Evaluating selectors against a DAG.
//!
//! The walker loads a block whenever traversal proceeds into a link and
//! records each block the first time it is loaded. Exporting exactly those
//! blocks yields the minimal archive for a selector; the first block the
//! selector matches (the target of a path) is that archive's root.

use std::borrow::Cow;
use std::collections::HashSet;

use cid::Cid;
use dagex_dag::{DagService, Node};
use dagex_store::Block;
use ipld_core::ipld::Ipld;
use tracing::debug;

use crate::error::SelectorResult;
use crate::selector::{RecursionLimit, Selector};

/// Walk `selector` from `root` and return the loaded blocks in visit order.
pub fn walk(service: &DagService, root: &Cid, selector: &Selector) -> SelectorResult<Vec<Block>> {
    let mut walk = Walk::new(service);
    walk.run(root, selector)?;
    Ok(walk.into_blocks())
}

/// A selector walk over one [`DagService`].
pub struct Walk<'a> {
    service: &'a DagService,
    seen: HashSet<Cid>,
    blocks: Vec<Block>,
    first_match: Option<Cid>,
    max_level: usize,
}

impl<'a> Walk<'a> {
    pub fn new(service: &'a DagService) -> Self {
        Self {
            service,
            seen: HashSet::new(),
            blocks: Vec::new(),
            first_match: None,
            max_level: 0,
        }
    }

    /// Walk from `root`. May be called repeatedly to accumulate blocks.
    pub fn run(&mut self, root: &Cid, selector: &Selector) -> SelectorResult<()> {
        self.visit_link(root, &Active::Plain(selector), 1)?;
        debug!(%root, blocks = self.blocks.len(), levels = self.max_level, "selector walk finished");
        Ok(())
    }

    /// Blocks loaded so far, in visit order, without duplicates.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// The first block the selector matched, in visit order.
    pub fn first_match(&self) -> Option<&Cid> {
        self.first_match.as_ref()
    }

    /// Deepest block level reached; the root is level 1.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    fn visit_link(&mut self, cid: &Cid, state: &Active<'_>, level: usize) -> SelectorResult<()> {
        let block = self.service.block(cid)?;
        let node = Node::decode(&block)?;
        if self.seen.insert(*cid) {
            self.blocks.push(block);
        }
        if self.first_match.is_none() && state.matches() {
            self.first_match = Some(*cid);
        }
        self.max_level = self.max_level.max(level);
        self.visit_node(&node.to_ipld(), state, level)
    }

    fn visit_node(&mut self, node: &Ipld, state: &Active<'_>, level: usize) -> SelectorResult<()> {
        match node {
            Ipld::Map(map) => {
                for (key, value) in map {
                    if let Some(next) = state.explore(&Segment::Key(key)) {
                        self.visit_value(value, &next, level)?;
                    }
                }
            }
            Ipld::List(items) => {
                for (index, value) in items.iter().enumerate() {
                    if let Some(next) = state.explore(&Segment::Index(index)) {
                        self.visit_value(value, &next, level)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visit_value(&mut self, value: &Ipld, state: &Active<'_>, level: usize) -> SelectorResult<()> {
        match value {
            Ipld::Link(cid) => self.visit_link(cid, state, level + 1),
            other => self.visit_node(other, state, level),
        }
    }
}

enum Segment<'k> {
    Key(&'k str),
    Index(usize),
}

/// A selector positioned inside a traversal, tracking enclosing recursion.
#[derive(Clone, Debug)]
enum Active<'s> {
    Plain(&'s Selector),
    Union(Vec<Active<'s>>),
    Recursive {
        sequence: &'s Selector,
        current: Box<Active<'s>>,
        limit: RecursionLimit,
    },
}

impl<'s> Active<'s> {
    fn explore(&self, segment: &Segment<'_>) -> Option<Active<'s>> {
        match self {
            Active::Plain(selector) => explore_plain(selector, segment),
            Active::Union(members) => union(members.iter().filter_map(|m| m.explore(segment)).collect()),
            Active::Recursive {
                sequence,
                current,
                limit,
            } => {
                let sequence: &'s Selector = sequence;
                let next = current.explore(segment)?;
                if !next.has_edge() {
                    return Some(Active::Recursive {
                        sequence,
                        current: Box::new(next),
                        limit: *limit,
                    });
                }
                let (current, limit) = match limit {
                    RecursionLimit::Depth(depth) if *depth < 2 => (next.without_edge()?, *limit),
                    RecursionLimit::Depth(depth) => {
                        (next.replace_edge(sequence), RecursionLimit::Depth(depth - 1))
                    }
                    RecursionLimit::None => (next.replace_edge(sequence), RecursionLimit::None),
                };
                Some(Active::Recursive {
                    sequence,
                    current: Box::new(current),
                    limit,
                })
            }
        }
    }

    fn matches(&self) -> bool {
        match self {
            Active::Plain(selector) => selector_matches(selector),
            Active::Union(members) => members.iter().any(Active::matches),
            Active::Recursive { current, .. } => current.matches(),
        }
    }

    fn has_edge(&self) -> bool {
        match self {
            Active::Plain(Selector::ExploreRecursiveEdge) => true,
            Active::Plain(Selector::ExploreUnion(members)) => {
                members.iter().any(|m| matches!(m, Selector::ExploreRecursiveEdge))
            }
            Active::Union(members) => members.iter().any(Active::has_edge),
            _ => false,
        }
    }

    fn replace_edge(self, sequence: &'s Selector) -> Active<'s> {
        match self {
            Active::Plain(Selector::ExploreRecursiveEdge) => Active::Plain(sequence),
            Active::Plain(Selector::ExploreUnion(members)) => Active::Union(
                members
                    .iter()
                    .map(|m| match m {
                        Selector::ExploreRecursiveEdge => Active::Plain(sequence),
                        other => Active::Plain(other),
                    })
                    .collect(),
            ),
            Active::Union(members) => {
                Active::Union(members.into_iter().map(|m| m.replace_edge(sequence)).collect())
            }
            other => other,
        }
    }

    fn without_edge(self) -> Option<Active<'s>> {
        match self {
            Active::Plain(Selector::ExploreRecursiveEdge) => None,
            Active::Plain(Selector::ExploreUnion(members)) => union(
                members
                    .iter()
                    .filter(|m| !matches!(m, Selector::ExploreRecursiveEdge))
                    .map(Active::Plain)
                    .collect(),
            ),
            Active::Union(members) => union(members.into_iter().filter_map(Active::without_edge).collect()),
            other => Some(other),
        }
    }
}

fn union(mut members: Vec<Active<'_>>) -> Option<Active<'_>> {
    match members.len() {
        0 => None,
        1 => members.pop(),
        _ => Some(Active::Union(members)),
    }
}

fn selector_matches(selector: &Selector) -> bool {
    match selector {
        Selector::Matcher => true,
        Selector::ExploreUnion(members) => members.iter().any(selector_matches),
        Selector::ExploreRecursive { sequence, .. } => selector_matches(sequence),
        _ => false,
    }
}

fn explore_plain<'s>(selector: &'s Selector, segment: &Segment<'_>) -> Option<Active<'s>> {
    match selector {
        Selector::Matcher | Selector::ExploreRecursiveEdge => None,
        Selector::ExploreAll { next } => Some(Active::Plain(next)),
        Selector::ExploreFields { fields } => {
            let key = match segment {
                Segment::Key(key) => Cow::Borrowed(*key),
                Segment::Index(index) => Cow::Owned(index.to_string()),
            };
            fields.get(key.as_ref()).map(Active::Plain)
        }
        Selector::ExploreIndex { index, next } => match segment {
            Segment::Index(i) if i == index => Some(Active::Plain(next)),
            _ => None,
        },
        Selector::ExploreRange { start, end, next } => match segment {
            Segment::Index(i) if (*start..*end).contains(i) => Some(Active::Plain(next)),
            _ => None,
        },
        Selector::ExploreRecursive { limit, sequence } => Active::Recursive {
            sequence,
            current: Box::new(Active::Plain(sequence)),
            limit: *limit,
        }
        .explore(segment),
        Selector::ExploreUnion(members) => {
            union(members.iter().filter_map(|m| explore_plain(m, segment)).collect())
        }
    }
}
