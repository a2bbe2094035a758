//! The selector tree.

use std::collections::BTreeMap;
use std::fmt;

/// Recursion bound of an [`Selector::ExploreRecursive`] node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecursionLimit {
    /// At most this many levels, counting the node the recursion starts at.
    Depth(u64),
    /// Unbounded. Only used for archive export.
    None,
}

/// A declarative traversal specification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Match the current node.
    Matcher,
    /// Apply `next` to every child.
    ExploreAll { next: Box<Selector> },
    /// Apply a selector to each named field.
    ExploreFields { fields: BTreeMap<String, Selector> },
    /// Apply `next` to one list element.
    ExploreIndex { index: usize, next: Box<Selector> },
    /// Apply `next` to list elements in `start..end`.
    ExploreRange {
        start: usize,
        end: usize,
        next: Box<Selector>,
    },
    /// Apply `sequence`, restarting it wherever it reaches an
    /// [`Selector::ExploreRecursiveEdge`], until `limit` is exhausted.
    ExploreRecursive {
        limit: RecursionLimit,
        sequence: Box<Selector>,
    },
    /// Apply every member.
    ExploreUnion(Vec<Selector>),
    /// Restart the enclosing recursive sequence.
    ExploreRecursiveEdge,
}

impl Selector {
    pub fn all(next: Selector) -> Self {
        Selector::ExploreAll {
            next: Box::new(next),
        }
    }

    /// Explore a single field.
    pub fn field(name: impl Into<String>, next: Selector) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.into(), next);
        Selector::ExploreFields { fields }
    }

    pub fn index(index: usize, next: Selector) -> Self {
        Selector::ExploreIndex {
            index,
            next: Box::new(next),
        }
    }

    pub fn range(start: usize, end: usize, next: Selector) -> Self {
        Selector::ExploreRange {
            start,
            end,
            next: Box::new(next),
        }
    }

    pub fn recursive(limit: RecursionLimit, sequence: Selector) -> Self {
        Selector::ExploreRecursive {
            limit,
            sequence: Box::new(sequence),
        }
    }

    pub fn union(members: impl IntoIterator<Item = Selector>) -> Self {
        Selector::ExploreUnion(members.into_iter().collect())
    }

    /// True when every recursive node in the tree carries a depth limit.
    pub fn is_bounded(&self) -> bool {
        match self {
            Selector::Matcher | Selector::ExploreRecursiveEdge => true,
            Selector::ExploreAll { next }
            | Selector::ExploreIndex { next, .. }
            | Selector::ExploreRange { next, .. } => next.is_bounded(),
            Selector::ExploreFields { fields } => fields.values().all(Selector::is_bounded),
            Selector::ExploreRecursive { limit, sequence } => {
                matches!(limit, RecursionLimit::Depth(_)) && sequence.is_bounded()
            }
            Selector::ExploreUnion(members) => members.iter().all(Selector::is_bounded),
        }
    }
}

impl fmt::Display for Selector {
    /// The DAG-JSON encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
