//! Bounded structural dumps of non-UnixFS data.

use cid::Cid;
use dagex_dag::DagService;
use dagex_selector::TraversalLimits;
use ipld_core::ipld::Ipld;

use crate::describe::{describe_link, LinkDescription};
use crate::error::ResolveResult;

/// A node of the data-model tree, with links described in place.
#[derive(Clone, Debug, PartialEq)]
pub enum DumpNode {
    Map(Vec<(String, DumpNode)>),
    List(Vec<DumpNode>),
    Null,
    Bool(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// A link, with the path of keys and indices leading to it from the
    /// dumped root.
    Link {
        cid: Cid,
        path: Vec<String>,
        desc: LinkDescription,
    },
    /// Nesting beyond the depth bound.
    Truncated,
}

/// Dump the node at `cid`.
///
/// Nesting is cut at `limits.max_depth`. The first
/// `limits.max_dir_type_checks` links are described by inspecting their
/// targets; later ones get a tentative codec-only description.
pub fn dump(dag: &DagService, cid: &Cid, limits: &TraversalLimits) -> ResolveResult<DumpNode> {
    let ipld = dag.node(cid)?.to_ipld();
    let mut dumper = Dumper {
        dag,
        limits,
        described: 0,
    };
    let mut path = Vec::new();
    dumper.node(&ipld, &mut path)
}

struct Dumper<'a> {
    dag: &'a DagService,
    limits: &'a TraversalLimits,
    described: usize,
}

impl Dumper<'_> {
    fn node(&mut self, ipld: &Ipld, path: &mut Vec<String>) -> ResolveResult<DumpNode> {
        if path.len() as u64 >= self.limits.max_depth && matches!(ipld, Ipld::Map(_) | Ipld::List(_)) {
            return Ok(DumpNode::Truncated);
        }
        Ok(match ipld {
            Ipld::Null => DumpNode::Null,
            Ipld::Bool(b) => DumpNode::Bool(*b),
            Ipld::Integer(i) => DumpNode::Integer(*i),
            Ipld::Float(f) => DumpNode::Float(*f),
            Ipld::String(s) => DumpNode::String(s.clone()),
            Ipld::Bytes(b) => DumpNode::Bytes(b.clone()),
            Ipld::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(i.to_string());
                    let child = self.node(item, path);
                    path.pop();
                    out.push(child?);
                }
                DumpNode::List(out)
            }
            Ipld::Map(map) => {
                let mut out = Vec::with_capacity(map.len());
                for (key, value) in map {
                    path.push(key.clone());
                    let child = self.node(value, path);
                    path.pop();
                    out.push((key.clone(), child?));
                }
                DumpNode::Map(out)
            }
            Ipld::Link(cid) => DumpNode::Link {
                cid: *cid,
                path: path.clone(),
                desc: self.link(cid, path.last().map(String::as_str).unwrap_or(""))?,
            },
        })
    }

    fn link(&mut self, cid: &Cid, name: &str) -> ResolveResult<LinkDescription> {
        if self.described >= self.limits.max_dir_type_checks {
            return Ok(LinkDescription::tentative(cid));
        }
        self.described += 1;
        describe_link(self.dag, cid, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagex_dag::DagBuilder;
    use dagex_store::{Block, MemoryBlockStore};
    use dagex_types::Codec;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn setup() -> (DagService, DagBuilder) {
        let dag = DagService::new(Arc::new(MemoryBlockStore::new()));
        (dag.clone(), DagBuilder::new(dag))
    }

    #[test]
    fn map_link_to_raw_is_a_sniffed_file() {
        let (dag, b) = setup();
        let raw = b.add_raw(&b"%PDF-1.4 minimal"[..]).unwrap();
        let root = b
            .add_cbor(&Ipld::Map(BTreeMap::from([("doc".to_string(), Ipld::Link(raw.cid))])))
            .unwrap();

        let tree = dump(&dag, &root.cid, &TraversalLimits::default()).unwrap();
        let DumpNode::Map(rows) = tree else {
            panic!("expected a map, got {tree:?}");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "doc");
        assert_eq!(
            rows[0].1,
            DumpNode::Link {
                cid: raw.cid,
                path: vec!["doc".into()],
                desc: LinkDescription {
                    text: "FILE (raw,application/pdf)".into(),
                    full: true,
                },
            }
        );
    }

    #[test]
    fn scalars_and_lists() {
        let (dag, b) = setup();
        let root = b
            .add_cbor(&Ipld::List(vec![
                Ipld::Null,
                Ipld::Bool(true),
                Ipld::Integer(-3),
                Ipld::Float(1.5),
                Ipld::String("<s>".into()),
                Ipld::Bytes(vec![0xde, 0xad]),
            ]))
            .unwrap();
        let tree = dump(&dag, &root.cid, &TraversalLimits::default()).unwrap();
        assert_eq!(
            tree,
            DumpNode::List(vec![
                DumpNode::Null,
                DumpNode::Bool(true),
                DumpNode::Integer(-3),
                DumpNode::Float(1.5),
                DumpNode::String("<s>".into()),
                DumpNode::Bytes(vec![0xde, 0xad]),
            ])
        );
    }

    #[test]
    fn missing_link_target_is_tentative() {
        let (dag, b) = setup();
        let absent = Block::encode(Codec::DAG_PB, &b"gone"[..]).cid;
        let root = b.add_cbor(&Ipld::List(vec![Ipld::Link(absent)])).unwrap();
        let DumpNode::List(items) = dump(&dag, &root.cid, &TraversalLimits::default()).unwrap() else {
            panic!("expected a list");
        };
        match &items[0] {
            DumpNode::Link { path, desc, .. } => {
                assert_eq!(path, &vec!["0".to_string()]);
                assert!(!desc.full);
                assert_eq!(desc.text, "DAG-PB");
            }
            other => panic!("expected a link, got {other:?}"),
        }
    }

    #[test]
    fn depth_and_link_bounds() {
        let (dag, b) = setup();
        let leaf = b.add_raw(&b"x"[..]).unwrap();
        let nested = Ipld::List(vec![Ipld::List(vec![Ipld::List(vec![])])]);
        let links = Ipld::List(vec![Ipld::Link(leaf.cid); 3]);
        let root = b
            .add_cbor(&Ipld::Map(BTreeMap::from([
                ("links".to_string(), links),
                ("nested".to_string(), nested),
            ])))
            .unwrap();
        let limits = TraversalLimits {
            max_depth: 2,
            max_dir_type_checks: 2,
        };

        let DumpNode::Map(rows) = dump(&dag, &root.cid, &limits).unwrap() else {
            panic!("expected a map");
        };
        let DumpNode::List(links) = &rows[0].1 else {
            panic!("expected links list");
        };
        let full: Vec<bool> = links
            .iter()
            .map(|l| match l {
                DumpNode::Link { desc, .. } => desc.full,
                _ => panic!("expected link"),
            })
            .collect();
        assert_eq!(full, vec![true, true, false]);

        let DumpNode::List(outer) = &rows[1].1 else {
            panic!("expected nested list");
        };
        assert_eq!(outer[0], DumpNode::Truncated);
    }

    #[test]
    fn broken_cbor_root_is_fatal() {
        let (dag, _) = setup();
        let bad = dag.add(Block::encode(Codec::DAG_CBOR, &[0xa1][..])).unwrap();
        assert!(dump(&dag, &bad, &TraversalLimits::default()).is_err());
    }
}
