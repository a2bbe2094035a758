//! DAG-JSON selector encoding.
//!
//! | node | encoding |
//! |---|---|
//! | Matcher | `{".": {}}` |
//! | ExploreAll | `{"a": {">": next}}` |
//! | ExploreFields | `{"f": {"f>": {name: sel}}}` |
//! | ExploreIndex | `{"i": {"i": n, ">": next}}` |
//! | ExploreRange | `{"r": {"^": start, "$": end, ">": next}}` |
//! | ExploreRecursive | `{"R": {"l": {"depth": n} \| {"none": {}}, ":>": seq}}` |
//! | ExploreUnion | `{"\|": [..]}` |
//! | ExploreRecursiveEdge | `{"@": {}}` |

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::error::{SelectorError, SelectorResult};
use crate::selector::{RecursionLimit, Selector};

impl Selector {
    /// Encode as a DAG-JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Selector::Matcher => json!({ ".": {} }),
            Selector::ExploreAll { next } => json!({ "a": { ">": next.to_json() } }),
            Selector::ExploreFields { fields } => {
                let fields: Map<String, Value> = fields
                    .iter()
                    .map(|(name, sel)| (name.clone(), sel.to_json()))
                    .collect();
                json!({ "f": { "f>": fields } })
            }
            Selector::ExploreIndex { index, next } => {
                json!({ "i": { "i": index, ">": next.to_json() } })
            }
            Selector::ExploreRange { start, end, next } => {
                json!({ "r": { "^": start, "$": end, ">": next.to_json() } })
            }
            Selector::ExploreRecursive { limit, sequence } => {
                let limit = match limit {
                    RecursionLimit::Depth(depth) => json!({ "depth": depth }),
                    RecursionLimit::None => json!({ "none": {} }),
                };
                json!({ "R": { "l": limit, ":>": sequence.to_json() } })
            }
            Selector::ExploreUnion(members) => {
                json!({ "|": members.iter().map(Selector::to_json).collect::<Vec<_>>() })
            }
            Selector::ExploreRecursiveEdge => json!({ "@": {} }),
        }
    }

    /// Encode as a compact DAG-JSON string.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Decode a DAG-JSON value.
    pub fn from_json(value: &Value) -> SelectorResult<Self> {
        let (tag, body) = single_entry(value)?;
        match tag {
            "." => Ok(Selector::Matcher),
            "@" => Ok(Selector::ExploreRecursiveEdge),
            "a" => Ok(Selector::all(next(body, ">")?)),
            "f" => {
                let fields = object(get(body, "f>")?)?
                    .iter()
                    .map(|(name, sel)| Ok((name.clone(), Selector::from_json(sel)?)))
                    .collect::<SelectorResult<BTreeMap<_, _>>>()?;
                Ok(Selector::ExploreFields { fields })
            }
            "i" => Ok(Selector::index(uint(get(body, "i")?)?, next(body, ">")?)),
            "r" => {
                let start = uint(get(body, "^")?)?;
                let end = uint(get(body, "$")?)?;
                if end < start {
                    return Err(invalid(format!("range end {end} before start {start}")));
                }
                Ok(Selector::range(start, end, next(body, ">")?))
            }
            "R" => {
                let (kind, limit) = single_entry(get(body, "l")?)?;
                let limit = match kind {
                    "depth" => RecursionLimit::Depth(uint(limit)? as u64),
                    "none" => RecursionLimit::None,
                    other => return Err(invalid(format!("unknown recursion limit {other:?}"))),
                };
                Ok(Selector::recursive(limit, next(body, ":>")?))
            }
            "|" => {
                let members = body
                    .as_array()
                    .ok_or_else(|| invalid("union is not a list".into()))?
                    .iter()
                    .map(Selector::from_json)
                    .collect::<SelectorResult<Vec<_>>>()?;
                Ok(Selector::ExploreUnion(members))
            }
            other => Err(invalid(format!("unknown selector node {other:?}"))),
        }
    }

    /// Decode a DAG-JSON string.
    pub fn from_json_str(s: &str) -> SelectorResult<Self> {
        let value: Value = serde_json::from_str(s).map_err(|e| invalid(e.to_string()))?;
        Self::from_json(&value)
    }
}

fn invalid(reason: String) -> SelectorError {
    SelectorError::InvalidSelector(reason)
}

fn object(value: &Value) -> SelectorResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| invalid(format!("expected a map, found {value}")))
}

fn single_entry(value: &Value) -> SelectorResult<(&str, &Value)> {
    let map = object(value)?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((key, body)), None) => Ok((key.as_str(), body)),
        _ => Err(invalid(format!("expected a single-key map, found {value}"))),
    }
}

fn get<'a>(body: &'a Value, key: &str) -> SelectorResult<&'a Value> {
    object(body)?
        .get(key)
        .ok_or_else(|| invalid(format!("missing {key:?}")))
}

fn next(body: &Value, key: &str) -> SelectorResult<Selector> {
    Selector::from_json(get(body, key)?)
}

fn uint(value: &Value) -> SelectorResult<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| invalid(format!("expected a non-negative integer, found {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use crate::TraversalLimits;

    #[test]
    fn matcher_encoding() {
        assert_eq!(Selector::Matcher.to_json_string(), r#"{".":{}}"#);
    }

    #[test]
    fn recursive_encoding() {
        let sel = Selector::recursive(RecursionLimit::Depth(2), Selector::ExploreRecursiveEdge);
        assert_eq!(sel.to_json_string(), r#"{"R":{":>":{"@":{}},"l":{"depth":2}}}"#);
    }

    #[test]
    fn presets_survive_encoding() {
        let limits = TraversalLimits::default();
        for sel in [
            presets::head(),
            presets::first_leaf_chain(limits.max_depth),
            presets::directory_preview(&limits),
            presets::file_contents(limits.max_depth),
            presets::full_export(),
        ] {
            let decoded = Selector::from_json_str(&sel.to_json_string()).unwrap();
            assert_eq!(decoded, sel);
        }
    }

    #[test]
    fn unknown_node_is_rejected() {
        let err = Selector::from_json_str(r#"{"x":{}}"#).unwrap_err();
        assert!(err.to_string().contains("unknown selector node"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = Selector::from_json_str(r#"{"r":{"^":4,"$":2,">":{".":{}}}}"#).unwrap_err();
        assert!(matches!(err, SelectorError::InvalidSelector(_)));
    }

    #[test]
    fn two_keys_are_rejected() {
        assert!(Selector::from_json_str(r#"{".":{},"@":{}}"#).is_err());
    }
}
