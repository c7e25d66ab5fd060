//! Document context: node arena, lookups and the mutation API
//!
//! [`Cgats`] owns the whole tree. Every mutating call goes through
//! `&mut Cgats`, which is also where the single shared "modified" flag
//! lives. Handles ([`NodeId`]) stay valid until the node is removed.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::node::{Entry, Key, Node, NodeId, NodeKind};
use crate::value::{self, Value};

pub(crate) const DATA_FORMAT_KEY: &str = "DATA_FORMAT";
pub(crate) const DATA_KEY: &str = "DATA";
pub(crate) const KEYWORDS_KEY: &str = "KEYWORDS";

/// Default file-type tag for documents without a leading marker
pub const DEFAULT_TYPE: &str = "CGATS.17";

/// A parsed CGATS document
///
/// Holds one chart per sub-document of the input (concatenated
/// multi-chart files yield several). Construction goes through the
/// parsing entry points in [`crate::parser`] or [`Cgats::new`] for an
/// empty document.
#[derive(Debug, Clone)]
pub struct Cgats {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    modified: bool,
    pub(crate) path: Option<PathBuf>,
    pub(crate) normalize: bool,
    pub(crate) fallback_type: String,
}

/// Input to the polymorphic [`Cgats::add_data`] entry point
///
/// The target node's kind decides how a payload is interpreted; a
/// payload shape the target cannot take is an invalid operation.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A data row; values are coerced against the governing columns
    Row(Vec<Value>),
    /// An opaque section line, keyword name, or sub-document marker
    Line(String),
    /// Named chart-level entries
    Entries(Vec<(String, Value)>),
    /// Column or keyword names
    Columns(Vec<String>),
}

impl From<Vec<Value>> for Payload {
    fn from(v: Vec<Value>) -> Self {
        Payload::Row(v)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Line(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Line(s)
    }
}

impl From<Vec<String>> for Payload {
    fn from(v: Vec<String>) -> Self {
        Payload::Columns(v)
    }
}

impl From<Vec<&str>> for Payload {
    fn from(v: Vec<&str>) -> Self {
        Payload::Columns(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<(String, Value)>> for Payload {
    fn from(v: Vec<(String, Value)>) -> Self {
        Payload::Entries(v)
    }
}

impl From<Vec<(&str, Value)>> for Payload {
    fn from(v: Vec<(&str, Value)>) -> Self {
        Payload::Entries(v.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl Cgats {
    /// Create an empty document with default settings
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_TYPE, false)
    }

    pub(crate) fn with_settings(fallback_type: &str, normalize: bool) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root, Key::Index(0), None)],
            free: Vec::new(),
            modified: false,
            path: None,
            normalize,
            fallback_type: fallback_type.to_string(),
        }
    }

    /// Handle of the outermost container
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node by handle
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// True if the tree changed since parsing (or the last clear)
    pub fn modified(&self) -> bool {
        self.modified
    }

    /// Reset the modified flag
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Path the document was read from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Handles of the sub-document charts under the root, in order
    pub fn charts(&self) -> Vec<NodeId> {
        self.node(self.root())
            .rows()
            .iter()
            .filter_map(Entry::as_child)
            .collect()
    }

    /// Handle of the `i`-th chart
    pub fn chart(&self, i: usize) -> Option<NodeId> {
        self.node(self.root()).rows().get(i).and_then(Entry::as_child)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            let id = NodeId(self.nodes.len() as u32);
            self.nodes.push(node);
            id
        }
    }

    fn release(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.node(id).child_ids().collect();
        for child in children {
            self.release(child);
        }
        self.nodes[id.index()] = Node::new(NodeKind::Root, Key::Index(0), None);
        self.free.push(id);
    }

    pub(crate) fn normalize_key(&self, key: &str) -> String {
        if !self.normalize {
            return key.to_string();
        }
        let up = key.to_ascii_uppercase();
        match up.as_str() {
            "SAMPLEID" => "SAMPLE_ID".to_string(),
            "SAMPLENAME" => "SAMPLE_NAME".to_string(),
            _ => up,
        }
    }

    // ------------------------------------------------------------------
    // Structure resolution

    /// The chart enclosing `id`; the root resolves to its first chart
    pub fn enclosing_chart(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = id;
        loop {
            match self.node(cur).kind() {
                NodeKind::Chart => return Some(cur),
                NodeKind::Root => return self.chart(0),
                _ => cur = self.node(cur).parent()?,
            }
        }
    }

    /// The `DATA_FORMAT` node governing `from`
    pub fn get_data_format(&self, from: NodeId) -> Option<NodeId> {
        let chart = self.enclosing_chart(from)?;
        self.node(chart).field(DATA_FORMAT_KEY)?.as_child()
    }

    /// The `DATA` node associated with `from`
    pub fn get_data(&self, from: NodeId) -> Option<NodeId> {
        let chart = self.enclosing_chart(from)?;
        self.node(chart).field(DATA_KEY)?.as_child()
    }

    /// Ordered column names of the governing `DATA_FORMAT`
    pub fn columns(&self, from: NodeId) -> Vec<String> {
        let fmt = match self.node(from).kind() {
            NodeKind::DataFormat => Some(from),
            _ => self.get_data_format(from),
        };
        let Some(fmt) = fmt else {
            return Vec::new();
        };
        self.node(fmt)
            .rows()
            .iter()
            .filter_map(Entry::as_value)
            .map(Value::to_string)
            .collect()
    }

    /// Computed column count (`NUMBER_OF_FIELDS`)
    pub fn number_of_fields(&self, from: NodeId) -> Option<usize> {
        let fmt = match self.node(from).kind() {
            NodeKind::DataFormat => from,
            _ => self.get_data_format(from)?,
        };
        Some(self.node(fmt).rows().len())
    }

    /// Computed row count (`NUMBER_OF_SETS`)
    pub fn number_of_sets(&self, from: NodeId) -> Option<usize> {
        let data = match self.node(from).kind() {
            NodeKind::Data => from,
            _ => self.get_data(from)?,
        };
        Some(self.node(data).rows().len())
    }

    /// Handle of the `i`-th sample of the `DATA` block associated with `from`
    pub fn sample(&self, from: NodeId, i: usize) -> Option<NodeId> {
        let data = match self.node(from).kind() {
            NodeKind::Data => from,
            _ => self.get_data(from)?,
        };
        self.node(data).rows().get(i).and_then(Entry::as_child)
    }

    // ------------------------------------------------------------------
    // Field reads and writes

    /// Scalar value of a field, including the computed keys
    /// `NUMBER_OF_FIELDS`/`NUMBER_OF_SETS` and the derived index-column
    /// semantics on samples.
    pub fn value(&self, id: NodeId, key: &str) -> Option<Value> {
        let node = self.node(id);
        if node.kind() == NodeKind::Sample && value::is_index_column(key) {
            if let Some(Entry::Scalar(stored)) = node.field(key) {
                return Some(self.derived_index(id, key, stored));
            }
            return None;
        }
        if matches!(
            node.kind(),
            NodeKind::Chart | NodeKind::Data | NodeKind::DataFormat
        ) {
            if key == "NUMBER_OF_FIELDS" {
                return self.number_of_fields(id).map(|n| Value::Int(n as i64));
            }
            if key == "NUMBER_OF_SETS" {
                return self.number_of_sets(id).map(|n| Value::Int(n as i64));
            }
        }
        match node.field(key) {
            Some(Entry::Scalar(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Derived read for `INDEX`/`SAMPLE_ID`/`SAMPLEID` on a sample.
    ///
    /// Non-numeric identifiers come back verbatim. Numeric ones are
    /// replaced by the row's own position: the position itself for
    /// `INDEX`, the position normalized to `[0, 1]` when the stored type
    /// is float (defined as `0.0` for a single-row block), and
    /// `position + 1` otherwise.
    fn derived_index(&self, id: NodeId, key: &str, stored: &Value) -> Value {
        if !stored.is_numeric() {
            return stored.clone();
        }
        let p = self.node(id).position().unwrap_or(0);
        if key.eq_ignore_ascii_case("INDEX") {
            return Value::Int(p as i64);
        }
        if matches!(stored, Value::Real(_)) {
            let rows = self
                .node(id)
                .parent()
                .map(|d| self.node(d).rows().len())
                .unwrap_or(1);
            let v = if rows <= 1 {
                0.0
            } else {
                p as f64 / (rows - 1) as f64
            };
            return Value::Real(v);
        }
        Value::Int(p as i64 + 1)
    }

    /// Set a named scalar field; new keys append in insertion order
    pub fn set_value(&mut self, id: NodeId, key: &str, v: impl Into<Value>) {
        let key = self.normalize_key(key);
        self.node_mut(id).fields.insert(key, Entry::Scalar(v.into()));
        self.mark_modified();
    }

    /// Attach a `Date:` attribute to a chart
    pub fn set_datetime(&mut self, id: NodeId, datetime: impl Into<String>) {
        self.node_mut(id).datetime = Some(datetime.into());
        self.mark_modified();
    }

    // ------------------------------------------------------------------
    // Mutation entry points

    /// Append data to a node; interpretation depends on the target kind.
    ///
    /// Rows go into `DATA` (validated against the governing columns),
    /// opaque lines into sections, markers open new charts under the
    /// root, column names extend a `DATA_FORMAT`, named entries become
    /// chart fields (with the `KEYWORD` pseudo-column routed to the
    /// keyword side-table).
    pub fn add_data(&mut self, target: NodeId, data: impl Into<Payload>) -> Result<NodeId> {
        self.insert_data_at(target, None, data.into())
    }

    /// Like [`Cgats::add_data`], inserting row-like data at `pos` and
    /// shifting existing rows up
    pub fn insert_data(
        &mut self,
        target: NodeId,
        pos: usize,
        data: impl Into<Payload>,
    ) -> Result<NodeId> {
        self.insert_data_at(target, Some(pos), data.into())
    }

    fn insert_data_at(
        &mut self,
        target: NodeId,
        pos: Option<usize>,
        payload: Payload,
    ) -> Result<NodeId> {
        match self.node(target).kind() {
            NodeKind::Data => self.insert_row(target, pos, payload),
            NodeKind::Section => self.insert_line(target, pos, payload),
            NodeKind::Root => self.insert_into_root(payload),
            NodeKind::DataFormat => self.insert_columns(target, payload),
            NodeKind::Keywords => self.insert_keyword_names(target, payload),
            NodeKind::Chart => self.insert_entries(target, payload),
            kind => Err(Error::InvalidOperation {
                kind: kind.name(),
                what: "node does not accept data".to_string(),
            }),
        }
    }

    fn insert_row(&mut self, data: NodeId, pos: Option<usize>, payload: Payload) -> Result<NodeId> {
        let values: Vec<Value> = match payload {
            Payload::Row(v) => v,
            Payload::Columns(tokens) => tokens.into_iter().map(Value::Text).collect(),
            _ => {
                return Err(Error::InvalidOperation {
                    kind: NodeKind::Data.name(),
                    what: "expected a row of values".to_string(),
                });
            }
        };
        let columns = self.columns(data);
        if columns.is_empty() {
            return Err(Error::InvalidOperation {
                kind: NodeKind::Data.name(),
                what: "no DATA_FORMAT defined yet".to_string(),
            });
        }
        if values.len() != columns.len() {
            return Err(Error::FieldCount {
                expected: columns.len(),
                actual: values.len(),
            });
        }
        let row_count = self.node(data).rows().len();
        let pos = pos.unwrap_or(row_count).min(row_count);
        let mut sample = Node::new(NodeKind::Sample, Key::Index(pos), Some(data));
        let mut width = self.node(data).numeric_width;
        for (col, raw) in columns.iter().zip(values) {
            let v = match raw {
                Value::Text(t) => value::coerce(col, &t)?,
                v => v,
            };
            width = width.max(v.digit_width());
            sample.fields.insert(col.clone(), Entry::Scalar(v));
        }
        let id = self.alloc(sample);
        let node = self.node_mut(data);
        node.rows.insert(pos, Entry::Child(id));
        node.numeric_width = width;
        self.renumber_rows(data, pos);
        self.mark_modified();
        Ok(id)
    }

    fn insert_line(&mut self, section: NodeId, pos: Option<usize>, payload: Payload) -> Result<NodeId> {
        let Payload::Line(line) = payload else {
            return Err(Error::InvalidOperation {
                kind: NodeKind::Section.name(),
                what: "expected an opaque line".to_string(),
            });
        };
        let row_count = self.node(section).rows().len();
        let pos = pos.unwrap_or(row_count).min(row_count);
        self.node_mut(section)
            .rows
            .insert(pos, Entry::Scalar(Value::Text(line)));
        self.renumber_rows(section, pos);
        self.mark_modified();
        Ok(section)
    }

    fn insert_into_root(&mut self, payload: Payload) -> Result<NodeId> {
        match payload {
            Payload::Line(marker) => {
                if marker.contains('\n') || marker.contains('\r') {
                    return Err(Error::InvalidOperation {
                        kind: NodeKind::Root.name(),
                        what: "sub-document marker must be a single line".to_string(),
                    });
                }
                Ok(self.add_chart(marker))
            }
            Payload::Entries(entries) => {
                let chart = self.ensure_chart();
                self.insert_entries(chart, Payload::Entries(entries))
            }
            _ => Err(Error::InvalidOperation {
                kind: NodeKind::Root.name(),
                what: "expected a marker or named entries".to_string(),
            }),
        }
    }

    fn insert_columns(&mut self, fmt: NodeId, payload: Payload) -> Result<NodeId> {
        let names: Vec<String> = match payload {
            Payload::Columns(n) => n,
            Payload::Line(s) => vec![s],
            Payload::Row(v) => v.iter().map(Value::to_string).collect(),
            Payload::Entries(_) => {
                return Err(Error::InvalidOperation {
                    kind: NodeKind::DataFormat.name(),
                    what: "expected column names".to_string(),
                });
            }
        };
        for name in names {
            let name = self.normalize_key(value::strip_quotes(&name));
            self.node_mut(fmt).rows.push(Entry::Scalar(Value::Text(name)));
        }
        self.mark_modified();
        Ok(fmt)
    }

    fn insert_keyword_names(&mut self, kw: NodeId, payload: Payload) -> Result<NodeId> {
        let names: Vec<String> = match payload {
            Payload::Columns(n) => n,
            Payload::Line(s) => vec![s],
            _ => {
                return Err(Error::InvalidOperation {
                    kind: NodeKind::Keywords.name(),
                    what: "expected keyword names".to_string(),
                });
            }
        };
        for name in names {
            let name = self.normalize_key(value::strip_quotes(&name));
            let exists = self
                .node(kw)
                .rows()
                .iter()
                .filter_map(Entry::as_value)
                .any(|v| v.as_str() == Some(name.as_str()));
            if !exists {
                self.node_mut(kw).rows.push(Entry::Scalar(Value::Text(name)));
            }
        }
        self.mark_modified();
        Ok(kw)
    }

    fn insert_entries(&mut self, chart: NodeId, payload: Payload) -> Result<NodeId> {
        let Payload::Entries(entries) = payload else {
            return Err(Error::InvalidOperation {
                kind: NodeKind::Chart.name(),
                what: "expected named entries".to_string(),
            });
        };
        for (key, v) in entries {
            if key.eq_ignore_ascii_case("KEYWORD") {
                let name = v.to_string();
                self.add_keyword(chart, &name, None)?;
                continue;
            }
            // computed counters are derived on output, never stored
            if key == "NUMBER_OF_FIELDS" || key == "NUMBER_OF_SETS" {
                continue;
            }
            let v = match v {
                Value::Text(t) if value::looks_numeric(&t) => value::auto_coerce(&t),
                other => other,
            };
            self.set_value(chart, &key, v);
        }
        Ok(chart)
    }

    /// Open a new sub-document chart with the given file-type tag
    pub fn add_chart(&mut self, tag: impl Into<String>) -> NodeId {
        let root = self.root();
        let pos = self.node(root).rows().len();
        let mut chart = Node::new(NodeKind::Chart, Key::Index(pos), Some(root));
        chart.tag = Some(tag.into());
        let id = self.alloc(chart);
        self.node_mut(root).rows.push(Entry::Child(id));
        self.mark_modified();
        id
    }

    pub(crate) fn ensure_chart(&mut self) -> NodeId {
        match self.charts().last() {
            Some(id) => *id,
            None => {
                let tag = self.fallback_type.clone();
                self.add_chart(tag)
            }
        }
    }

    pub(crate) fn add_named_child(&mut self, parent: NodeId, key: &str, kind: NodeKind) -> NodeId {
        if let Some(id) = self.node(parent).field(key).and_then(Entry::as_child) {
            return id;
        }
        let node = Node::new(kind, Key::Name(key.to_string()), Some(parent));
        let id = self.alloc(node);
        self.node_mut(parent)
            .fields
            .insert(key.to_string(), Entry::Child(id));
        self.mark_modified();
        id
    }

    // ------------------------------------------------------------------
    // Removal

    /// Remove a node and its subtree; following integer keys close up
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let Some(parent) = self.node(id).parent() else {
            return Err(Error::InvalidOperation {
                kind: NodeKind::Root.name(),
                what: "cannot remove the root".to_string(),
            });
        };
        match self.node(id).key().clone() {
            Key::Name(name) => {
                self.node_mut(parent).fields.shift_remove(&name);
            }
            Key::Index(i) => {
                self.node_mut(parent).rows.remove(i);
                self.renumber_rows(parent, i);
            }
        }
        self.release(id);
        self.mark_modified();
        Ok(())
    }

    /// Remove a named field (scalar or sub-tree) from a node
    pub fn remove_field(&mut self, parent: NodeId, key: &str) -> Result<()> {
        match self.node_mut(parent).fields.shift_remove(key) {
            Some(Entry::Child(id)) => self.release(id),
            Some(Entry::Scalar(_)) => {}
            None => return Err(Error::Key(key.to_string())),
        }
        self.mark_modified();
        Ok(())
    }

    /// Remove a positional row; following rows renumber down by one
    pub fn remove_row(&mut self, parent: NodeId, pos: usize) -> Result<()> {
        if pos >= self.node(parent).rows().len() {
            return Err(Error::Key(pos.to_string()));
        }
        let entry = self.node_mut(parent).rows.remove(pos);
        if let Entry::Child(id) = entry {
            self.release(id);
        }
        self.renumber_rows(parent, pos);
        self.mark_modified();
        Ok(())
    }

    fn renumber_rows(&mut self, parent: NodeId, from: usize) {
        let ids: Vec<(usize, NodeId)> = self
            .node(parent)
            .rows()
            .iter()
            .enumerate()
            .skip(from)
            .filter_map(|(i, e)| e.as_child().map(|c| (i, c)))
            .collect();
        for (i, c) in ids {
            self.node_mut(c).key = Key::Index(i);
        }
    }

    // ------------------------------------------------------------------
    // Keyword side-table

    /// Declare a keyword on the enclosing chart, optionally setting its
    /// value field. Declaring the same name twice keeps one entry.
    pub fn add_keyword(&mut self, at: NodeId, name: &str, v: Option<Value>) -> Result<()> {
        let chart = match self.enclosing_chart(at) {
            Some(chart) => chart,
            None => self.ensure_chart(),
        };
        let name = self.normalize_key(value::strip_quotes(name));
        let kw = self.add_named_child(chart, KEYWORDS_KEY, NodeKind::Keywords);
        self.insert_keyword_names(kw, Payload::Line(name.clone()))?;
        if let Some(v) = v {
            self.node_mut(chart).fields.insert(name, Entry::Scalar(v));
        }
        self.mark_modified();
        Ok(())
    }

    /// Remove a keyword declaration, and the value field if asked to
    pub fn remove_keyword(&mut self, at: NodeId, name: &str, remove_value: bool) -> Result<()> {
        let chart = self
            .enclosing_chart(at)
            .ok_or_else(|| Error::Key(name.to_string()))?;
        let name = self.normalize_key(name);
        let kw = self
            .node(chart)
            .field(KEYWORDS_KEY)
            .and_then(Entry::as_child)
            .ok_or_else(|| Error::Key(name.clone()))?;
        let pos = self
            .node(kw)
            .rows()
            .iter()
            .position(|e| e.as_value().and_then(Value::as_str) == Some(name.as_str()))
            .ok_or_else(|| Error::Key(name.clone()))?;
        self.node_mut(kw).rows.remove(pos);
        if remove_value {
            self.node_mut(chart).fields.shift_remove(&name);
        }
        self.mark_modified();
        Ok(())
    }

    /// Declared keyword names of the enclosing chart
    pub fn keywords(&self, at: NodeId) -> Vec<String> {
        let Some(chart) = self.enclosing_chart(at) else {
            return Vec::new();
        };
        let Some(kw) = self.node(chart).field(KEYWORDS_KEY).and_then(Entry::as_child) else {
            return Vec::new();
        };
        self.node(kw)
            .rows()
            .iter()
            .filter_map(Entry::as_value)
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect()
    }

    /// True if `name` is a declared keyword of the enclosing chart
    pub fn is_keyword(&self, at: NodeId, name: &str) -> bool {
        self.keywords(at).iter().any(|k| k == name)
    }

    // ------------------------------------------------------------------
    // Convenience accessors

    /// `DESCRIPTOR` field of a chart
    pub fn descriptor(&self, chart: NodeId) -> Option<String> {
        self.value(chart, "DESCRIPTOR").map(|v| v.to_string())
    }

    /// `ORIGINATOR` field of a chart
    pub fn originator(&self, chart: NodeId) -> Option<String> {
        self.value(chart, "ORIGINATOR").map(|v| v.to_string())
    }

    /// `CREATED` field of a chart
    pub fn created(&self, chart: NodeId) -> Option<String> {
        self.value(chart, "CREATED").map(|v| v.to_string())
    }

    /// `TARGET_INSTRUMENT` field of a chart
    pub fn target_instrument(&self, chart: NodeId) -> Option<String> {
        self.value(chart, "TARGET_INSTRUMENT").map(|v| v.to_string())
    }
}

impl Default for Cgats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_with_format(doc: &mut Cgats, columns: &[&str]) -> (NodeId, NodeId, NodeId) {
        let chart = doc.add_chart("CTI3");
        let fmt = doc.add_named_child(chart, DATA_FORMAT_KEY, NodeKind::DataFormat);
        doc.add_data(fmt, columns.to_vec()).unwrap();
        let data = doc.add_named_child(chart, DATA_KEY, NodeKind::Data);
        (chart, fmt, data)
    }

    #[test]
    fn test_row_arity_is_enforced() {
        let mut doc = Cgats::new();
        let (_, _, data) = chart_with_format(&mut doc, &["RGB_R", "RGB_G", "RGB_B"]);
        let err = doc.add_data(data, vec!["0", "0"]).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldCount {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(doc.number_of_sets(data), Some(0));
    }

    #[test]
    fn test_non_numeric_value_in_numeric_column_fails() {
        let mut doc = Cgats::new();
        let (_, _, data) = chart_with_format(&mut doc, &["RGB_R", "RGB_G"]);
        let err = doc.add_data(data, vec!["1.0", "oops"]).unwrap_err();
        assert!(matches!(err, Error::Value { .. }));
        assert_eq!(doc.number_of_sets(data), Some(0));
    }

    #[test]
    fn test_data_before_format_is_rejected() {
        let mut doc = Cgats::new();
        let chart = doc.add_chart("CTI3");
        let data = doc.add_named_child(chart, DATA_KEY, NodeKind::Data);
        let err = doc.add_data(data, vec!["1.0"]).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
    }

    #[test]
    fn test_insert_shifts_and_renumbers() {
        let mut doc = Cgats::new();
        let (_, _, data) = chart_with_format(&mut doc, &["SAMPLE_ID", "V"]);
        doc.add_data(data, vec!["1", "0.1"]).unwrap();
        doc.add_data(data, vec!["2", "0.2"]).unwrap();
        let inserted = doc.insert_data(data, 1, vec!["9", "0.9"]).unwrap();
        assert_eq!(doc.node(inserted).position(), Some(1));
        let last = doc.sample(data, 2).unwrap();
        assert_eq!(doc.node(last).position(), Some(2));
        assert_eq!(doc.value(last, "V"), Some(Value::Real(0.2)));
    }

    #[test]
    fn test_remove_renumbers_following_rows() {
        let mut doc = Cgats::new();
        let (_, _, data) = chart_with_format(&mut doc, &["SAMPLE_ID", "V"]);
        for i in 0..4 {
            doc.add_data(data, vec![i.to_string(), format!("0.{i}")])
                .unwrap();
        }
        let second = doc.sample(data, 1).unwrap();
        doc.remove(second).unwrap();
        assert_eq!(doc.number_of_sets(data), Some(3));
        let moved = doc.sample(data, 1).unwrap();
        assert_eq!(doc.node(moved).position(), Some(1));
        assert_eq!(doc.value(moved, "V"), Some(Value::Real(0.2)));
    }

    #[test]
    fn test_derived_index_semantics() {
        let mut doc = Cgats::new();
        let (_, _, data) = chart_with_format(&mut doc, &["SAMPLE_ID", "V"]);
        doc.add_data(data, vec!["1", "0.1"]).unwrap();
        doc.add_data(data, vec!["2", "0.2"]).unwrap();
        doc.add_data(data, vec!["3", "0.3"]).unwrap();
        // stored int -> position + 1
        let s1 = doc.sample(data, 1).unwrap();
        assert_eq!(doc.value(s1, "SAMPLE_ID"), Some(Value::Int(2)));
        // stored float -> position / (rows - 1), not the stored value
        let mut doc2 = Cgats::new();
        let (_, _, data2) = chart_with_format(&mut doc2, &["SAMPLE_ID", "V"]);
        doc2.add_data(data2, vec!["0.25", "0.1"]).unwrap();
        doc2.add_data(data2, vec!["0.25", "0.2"]).unwrap();
        doc2.add_data(data2, vec!["0.25", "0.3"]).unwrap();
        let s2 = doc2.sample(data2, 2).unwrap();
        assert_eq!(doc2.value(s2, "SAMPLE_ID"), Some(Value::Real(1.0)));
        // opaque id -> verbatim
        let mut doc3 = Cgats::new();
        let (_, _, data3) = chart_with_format(&mut doc3, &["SAMPLE_ID", "V"]);
        doc3.add_data(data3, vec!["A1", "0.1"]).unwrap();
        let s3 = doc3.sample(data3, 0).unwrap();
        assert_eq!(
            doc3.value(s3, "SAMPLE_ID"),
            Some(Value::Text("A1".to_string()))
        );
    }

    #[test]
    fn test_derived_index_single_row_does_not_divide_by_zero() {
        let mut doc = Cgats::new();
        let (_, _, data) = chart_with_format(&mut doc, &["SAMPLE_ID", "V"]);
        doc.add_data(data, vec!["0.5", "0.1"]).unwrap();
        let s = doc.sample(data, 0).unwrap();
        assert_eq!(doc.value(s, "SAMPLE_ID"), Some(Value::Real(0.0)));
    }

    #[test]
    fn test_keyword_declared_once() {
        let mut doc = Cgats::new();
        let chart = doc.add_chart("CTI1");
        doc.add_keyword(chart, "APPROX_WHITE_POINT", Some(Value::from("95 100 108")))
            .unwrap();
        doc.add_keyword(chart, "APPROX_WHITE_POINT", None).unwrap();
        assert_eq!(doc.keywords(chart), ["APPROX_WHITE_POINT"]);
        assert_eq!(
            doc.value(chart, "APPROX_WHITE_POINT"),
            Some(Value::Text("95 100 108".to_string()))
        );
    }

    #[test]
    fn test_modified_flag_follows_mutation() {
        let mut doc = Cgats::new();
        doc.clear_modified();
        assert!(!doc.modified());
        let chart = doc.add_chart("CTI1");
        assert!(doc.modified());
        doc.clear_modified();
        doc.set_value(chart, "DESCRIPTOR", "test chart");
        assert!(doc.modified());
    }

    #[test]
    fn test_computed_counters_are_not_stored() {
        let mut doc = Cgats::new();
        let (chart, _, data) = chart_with_format(&mut doc, &["RGB_R"]);
        doc.add_data(data, vec!["1.0"]).unwrap();
        doc.add_data(chart, vec![("NUMBER_OF_FIELDS", Value::Int(99))])
            .unwrap();
        assert_eq!(doc.value(chart, "NUMBER_OF_FIELDS"), Some(Value::Int(1)));
        assert!(doc.node(chart).field("NUMBER_OF_FIELDS").is_none());
    }
}
