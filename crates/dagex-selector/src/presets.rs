//! The fixed selectors used by the explorer.

use crate::limits::TraversalLimits;
use crate::selector::{RecursionLimit, Selector};

/// Match the root only. Answers HEAD requests.
pub fn head() -> Selector {
    Selector::Matcher
}

/// Pull the chain of first children below a node, up to `depth` levels.
///
/// Enough to type-check a UnixFS file and sniff its first bytes:
/// `R(depth, | [., f{Links: i0 f{Hash: @}}])`.
pub fn first_leaf_chain(depth: u64) -> Selector {
    Selector::recursive(
        RecursionLimit::Depth(depth),
        Selector::union([
            Selector::Matcher,
            Selector::field(
                "Links",
                Selector::index(0, Selector::field("Hash", Selector::ExploreRecursiveEdge)),
            ),
        ]),
    )
}

/// A directory node plus the first-leaf chain of its first
/// `max_dir_type_checks` children.
pub fn directory_preview(limits: &TraversalLimits) -> Selector {
    Selector::union([
        Selector::Matcher,
        Selector::field(
            "Links",
            Selector::range(
                0,
                limits.max_dir_type_checks,
                Selector::field("Hash", first_leaf_chain(limits.max_depth)),
            ),
        ),
    ])
}

/// Every block of a file, up to `depth` levels: `R(depth, a(| [., @]))`.
pub fn file_contents(depth: u64) -> Selector {
    Selector::recursive(
        RecursionLimit::Depth(depth),
        Selector::all(Selector::union([Selector::Matcher, Selector::ExploreRecursiveEdge])),
    )
}

/// The entire DAG below the root: `R(none, | [., a(@)])`.
pub fn full_export() -> Selector {
    Selector::recursive(
        RecursionLimit::None,
        Selector::union([Selector::Matcher, Selector::all(Selector::ExploreRecursiveEdge)]),
    )
}
