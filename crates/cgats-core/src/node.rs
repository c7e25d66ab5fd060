//! Tree node model
//!
//! A CGATS document is a shallow recursive tree: a root holding one chart
//! per concatenated sub-document, charts holding named fields, sections,
//! a `DATA_FORMAT` column list and a `DATA` block of samples. Nodes live
//! in an arena owned by [`crate::Cgats`]; handles are plain indices.
//!
//! Per node there are two child containers: an insertion-ordered map for
//! named fields and a dense vector for positional rows. This replaces the
//! reference format's mixed integer/string keys — a row's key is its
//! position.

use indexmap::IndexMap;

use crate::value::Value;

/// Arena handle for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The outermost container; its rows are charts
    Root,
    /// One sub-document (test chart, calibration record, ...)
    Chart,
    /// A generic `BEGIN_<NAME>`/`END_<NAME>` block of opaque lines
    Section,
    /// The column schema governing a sibling `DATA` block
    DataFormat,
    /// A block of measurement rows
    Data,
    /// One row within a `DATA` block
    Sample,
    /// Side-table of declared keyword names
    Keywords,
}

impl NodeKind {
    /// Display name used in error messages
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "ROOT",
            NodeKind::Chart => "CHART",
            NodeKind::Section => "SECTION",
            NodeKind::DataFormat => "DATA_FORMAT",
            NodeKind::Data => "DATA",
            NodeKind::Sample => "SAMPLE",
            NodeKind::Keywords => "KEYWORDS",
        }
    }
}

/// Key under which a node is reachable from its parent
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// Named child (sections, `DATA_FORMAT`, `DATA`, `KEYWORDS`)
    Name(String),
    /// Positional child (samples, section lines, charts under the root)
    Index(usize),
}

/// A child slot: either a scalar or a sub-tree
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Scalar(Value),
    Child(NodeId),
}

impl Entry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Scalar(v) => Some(v),
            Entry::Child(_) => None,
        }
    }

    pub fn as_child(&self) -> Option<NodeId> {
        match self {
            Entry::Child(id) => Some(*id),
            Entry::Scalar(_) => None,
        }
    }
}

/// One node of the document tree
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) key: Key,
    pub(crate) parent: Option<NodeId>,
    /// File-type tag of a chart (`CTI1`, `CAL`, `CGATS.17`, ...)
    pub(crate) tag: Option<String>,
    /// Named children and scalar fields, in insertion order
    pub(crate) fields: IndexMap<String, Entry>,
    /// Positional children (row-like)
    pub(crate) rows: Vec<Entry>,
    /// Value of a `Date:` line attached to this chart
    pub(crate) datetime: Option<String>,
    /// Max digit width of any numeric scalar under a `Data` node
    pub(crate) numeric_width: usize,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, key: Key, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            key,
            parent,
            tag: None,
            fields: IndexMap::new(),
            rows: Vec::new(),
            datetime: None,
            numeric_width: 0,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// File-type tag, present on chart nodes
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Value of the `Date:` line, present on chart nodes that carried one
    pub fn datetime(&self) -> Option<&str> {
        self.datetime.as_deref()
    }

    /// Named fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.fields.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Positional rows in order
    pub fn rows(&self) -> &[Entry] {
        &self.rows
    }

    /// Look up a named field
    pub fn field(&self, key: &str) -> Option<&Entry> {
        self.fields.get(key)
    }

    /// Position of this node under its parent, for row-like nodes
    pub fn position(&self) -> Option<usize> {
        match self.key {
            Key::Index(i) => Some(i),
            Key::Name(_) => None,
        }
    }

    /// Child node ids, named fields first, then rows
    pub(crate) fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.fields
            .values()
            .filter_map(Entry::as_child)
            .chain(self.rows.iter().filter_map(Entry::as_child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(NodeKind::DataFormat.name(), "DATA_FORMAT");
        assert_eq!(NodeKind::Sample.name(), "SAMPLE");
    }

    #[test]
    fn test_field_order_is_insertion_order() {
        let mut node = Node::new(NodeKind::Chart, Key::Index(0), None);
        node.fields
            .insert("DESCRIPTOR".into(), Entry::Scalar(Value::Text("x".into())));
        node.fields
            .insert("ORIGINATOR".into(), Entry::Scalar(Value::Text("y".into())));
        node.fields
            .insert("CREATED".into(), Entry::Scalar(Value::Text("z".into())));
        let keys: Vec<_> = node.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, ["DESCRIPTOR", "ORIGINATOR", "CREATED"]);
    }
}
