//! Recursive structural queries
//!
//! A query is a conjunction of (key, optional expected value) terms. A
//! node matches only when every term is satisfied: the key exists, and
//! the value is equal when a constraint was given. Matching walks the
//! tree depth-first, testing each node before its children, children in
//! insertion order (named fields first, then positional rows). The
//! computed `NUMBER_OF_FIELDS`/`NUMBER_OF_SETS` keys are satisfiable
//! even though they are never stored.

use crate::document::Cgats;
use crate::node::{Entry, NodeId};
use crate::value::Value;

/// Filter for the `query_*` family
///
/// ```
/// use cgats_core::Query;
///
/// let q = Query::pair("RGB_R", 100)
///     .and("RGB_G", 100)
///     .and("RGB_B", 100)
///     .extract("XYZ_Y");
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    terms: Vec<(String, Option<Value>)>,
    extract: Option<String>,
}

impl Query {
    /// Match nodes where `name` exists, with no value constraint
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            terms: vec![(name.into(), None)],
            extract: None,
        }
    }

    /// Match nodes where `name` equals `v`
    pub fn pair(name: impl Into<String>, v: impl Into<Value>) -> Self {
        Self {
            terms: vec![(name.into(), Some(v.into()))],
            extract: None,
        }
    }

    /// Build a conjunction from (key, value) pairs
    pub fn pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            terms: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
            extract: None,
        }
    }

    /// Add a key-exists term
    pub fn and_key(mut self, name: impl Into<String>) -> Self {
        self.terms.push((name.into(), None));
        self
    }

    /// Add a key-equals-value term
    pub fn and(mut self, name: impl Into<String>, v: impl Into<Value>) -> Self {
        self.terms.push((name.into(), Some(v.into())));
        self
    }

    /// Select the field returned by the value-extracting wrappers. The
    /// key must exist on a node for it to match.
    pub fn extract(mut self, name: impl Into<String>) -> Self {
        self.extract = Some(name.into());
        self
    }

    pub fn terms(&self) -> &[(String, Option<Value>)] {
        &self.terms
    }
}

impl From<&str> for Query {
    fn from(name: &str) -> Self {
        Query::key(name)
    }
}

impl<V: Into<Value>> From<(&str, V)> for Query {
    fn from((k, v): (&str, V)) -> Self {
        Query::pair(k, v)
    }
}

impl Cgats {
    fn query_matches(&self, id: NodeId, q: &Query) -> bool {
        for (key, expected) in q.terms() {
            match self.value(id, key) {
                Some(v) => {
                    if let Some(e) = expected {
                        if *e != v {
                            return false;
                        }
                    }
                }
                None => {
                    // a composite child satisfies a bare key-exists term
                    match self.node(id).field(key) {
                        Some(Entry::Child(_)) if expected.is_none() => {}
                        _ => return false,
                    }
                }
            }
        }
        if let Some(ex) = &q.extract {
            if self.value(id, ex).is_none() {
                return false;
            }
        }
        true
    }

    fn query_walk(&self, id: NodeId, q: &Query, first_only: bool, out: &mut Vec<NodeId>) -> bool {
        if self.query_matches(id, q) {
            if !out.contains(&id) {
                out.push(id);
            }
            if first_only {
                return true;
            }
        }
        let children: Vec<NodeId> = self.node(id).child_ids().collect();
        for child in children {
            if self.query_walk(child, q, first_only, out) {
                return true;
            }
        }
        false
    }

    fn extract_values(&self, id: NodeId, q: &Query) -> Vec<Value> {
        if let Some(ex) = &q.extract {
            return self.value(id, ex).into_iter().collect();
        }
        q.terms()
            .iter()
            .filter_map(|(k, _)| self.value(id, k))
            .collect()
    }

    /// All matching nodes, depth-first, self before children
    pub fn query_all(&self, from: NodeId, q: &Query) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.query_walk(from, q, false, &mut out);
        out
    }

    /// First matching node
    pub fn query_first(&self, from: NodeId, q: &Query) -> Option<NodeId> {
        let mut out = Vec::new();
        self.query_walk(from, q, true, &mut out);
        out.first().copied()
    }

    /// Extracted values of every matching node, in traversal order
    pub fn query_all_values(&self, from: NodeId, q: &Query) -> Vec<Value> {
        self.query_all(from, q)
            .iter()
            .flat_map(|&id| self.extract_values(id, q))
            .collect()
    }

    /// Extracted value of the first matching node: the extraction key's
    /// value when one was set, otherwise the first filtered key's value
    pub fn query_first_value(&self, from: NodeId, q: &Query) -> Option<Value> {
        let id = self.query_first(from, q)?;
        self.extract_values(id, q).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = "\
CTI3
DESCRIPTOR \"Output measurement\"
BEGIN_DATA_FORMAT
RGB_R RGB_G RGB_B XYZ_X XYZ_Y XYZ_Z
END_DATA_FORMAT
BEGIN_DATA
0 0 0 0.01 0.01 0.02
100 100 100 95.05 100.0 108.9
END_DATA
";

    #[test]
    fn test_white_patch_lookup() {
        let doc = Cgats::parse(CHART).unwrap();
        let q = Query::pair("RGB_R", 100)
            .and("RGB_G", 100)
            .and("RGB_B", 100)
            .extract("XYZ_Y");
        let v = doc.query_first_value(doc.root(), &q).unwrap();
        assert_eq!(v, Value::Real(100.0));
    }

    #[test]
    fn test_conjunction_requires_every_term() {
        let doc = Cgats::parse(CHART).unwrap();
        // RGB_R matches the black patch but DESCRIPTOR only lives on the
        // chart, so no single node satisfies both
        let q = Query::pair("RGB_R", 0).and_key("DESCRIPTOR");
        assert!(doc.query_first(doc.root(), &q).is_none());
        // a value mismatch on one term rejects the otherwise-matching node
        let q = Query::pair("RGB_R", 100).and("RGB_G", 0);
        assert!(doc.query_first(doc.root(), &q).is_none());
    }

    #[test]
    fn test_first_is_head_of_all() {
        let doc = Cgats::parse(CHART).unwrap();
        let q = Query::key("RGB_R");
        let all = doc.query_all(doc.root(), &q);
        assert_eq!(all.len(), 2);
        assert_eq!(doc.query_first(doc.root(), &q), Some(all[0]));
    }

    #[test]
    fn test_synthetic_counter_keys_match() {
        let doc = Cgats::parse(CHART).unwrap();
        let chart = doc.chart(0).unwrap();
        let q = Query::pair("NUMBER_OF_SETS", 2);
        assert_eq!(doc.query_first(doc.root(), &q), Some(chart));
        assert_eq!(
            doc.query_first_value(doc.root(), &Query::key("NUMBER_OF_FIELDS")),
            Some(Value::Int(6))
        );
    }

    #[test]
    fn test_bare_key_matches_composite_child() {
        let doc = Cgats::parse(CHART).unwrap();
        let chart = doc.chart(0).unwrap();
        let q = Query::key("DATA_FORMAT");
        assert_eq!(doc.query_first(doc.root(), &q), Some(chart));
    }

    #[test]
    fn test_all_values_keep_document_order() {
        let doc = Cgats::parse(CHART).unwrap();
        let q = Query::key("XYZ_Y");
        let values = doc.query_all_values(doc.root(), &q);
        assert_eq!(values, [Value::Real(0.01), Value::Real(100.0)]);
    }

    #[test]
    fn test_query_from_subtree_only_sees_subtree() {
        let doc = Cgats::parse(CHART).unwrap();
        let chart = doc.chart(0).unwrap();
        let data = doc.get_data(chart).unwrap();
        let q = Query::key("DESCRIPTOR");
        assert!(doc.query_first(data, &q).is_none());
    }
}
