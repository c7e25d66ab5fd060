//! Canonical text serialization
//!
//! Serialization is a pure tree-to-string transform. Derived counters
//! (`NUMBER_OF_FIELDS`, `NUMBER_OF_SETS`) are recomputed from the tree,
//! and the `DATA_FORMAT`/`DATA` envelope is always emitted last within
//! its chart regardless of where the fields sit structurally.

use std::fmt::{self, Write as _};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::document::{Cgats, DATA_FORMAT_KEY, DATA_KEY, DEFAULT_TYPE, KEYWORDS_KEY};
use crate::error::{Error, Result};
use crate::node::{Entry, NodeId, NodeKind};
use crate::value::{self, Value};

impl Cgats {
    /// Render the whole document as CGATS text
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, chart) in self.charts().into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.serialize_chart(chart, &mut out);
        }
        out
    }

    /// Write the document to any sink; I/O errors surface unchanged
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(self.serialize().as_bytes())?;
        Ok(())
    }

    /// Write to `path`, or to the originally-opened path if none given
    pub fn write(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self
                .path()
                .map(Path::to_path_buf)
                .ok_or_else(|| Error::InvalidOperation {
                    kind: NodeKind::Root.name(),
                    what: "document has no associated path".to_string(),
                })?,
        };
        self.write_to(fs::File::create(path)?)
    }

    fn serialize_chart(&self, chart: NodeId, out: &mut String) {
        let node = self.node(chart);
        if let Some(dt) = node.datetime() {
            let _ = writeln!(out, "Date: {dt}");
        }
        let tag = node.tag().unwrap_or(DEFAULT_TYPE);
        let _ = writeln!(out, "{tag:<7}");

        let keywords = self.keywords(chart);
        let mut declared: Vec<&str> = Vec::new();
        for (name, entry) in node.fields() {
            if name == DATA_FORMAT_KEY || name == DATA_KEY || name == KEYWORDS_KEY {
                continue;
            }
            match entry {
                Entry::Scalar(v) => {
                    if keywords.iter().any(|k| k == name) && !declared.contains(&name) {
                        let _ = writeln!(out, "KEYWORD \"{name}\"");
                        declared.push(name);
                    }
                    match v {
                        Value::Text(s) => {
                            let _ = writeln!(out, "{name} \"{s}\"");
                        }
                        v => {
                            let _ = writeln!(out, "{name} {v}");
                        }
                    }
                }
                Entry::Child(section) => self.serialize_section(*section, name, out),
            }
        }
        // keywords that never received a value are still declared
        for kw in &keywords {
            if !declared.contains(&kw.as_str()) {
                let _ = writeln!(out, "KEYWORD \"{kw}\"");
            }
        }

        if let Some(fmt) = node.field(DATA_FORMAT_KEY).and_then(Entry::as_child) {
            let columns = self.columns(fmt);
            let _ = writeln!(out, "NUMBER_OF_FIELDS {}", columns.len());
            let _ = writeln!(out, "BEGIN_DATA_FORMAT");
            let _ = writeln!(out, "{}", columns.join(" "));
            let _ = writeln!(out, "END_DATA_FORMAT");
            if let Some(data) = node.field(DATA_KEY).and_then(Entry::as_child) {
                let _ = writeln!(out, "NUMBER_OF_SETS {}", self.node(data).rows().len());
                let _ = writeln!(out, "BEGIN_DATA");
                self.serialize_data(data, &columns, out);
                let _ = writeln!(out, "END_DATA");
            }
        }
    }

    fn serialize_section(&self, section: NodeId, name: &str, out: &mut String) {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        let _ = writeln!(out, "BEGIN_{name}");
        for row in self.node(section).rows() {
            if let Entry::Scalar(v) = row {
                let _ = writeln!(out, "{v}");
            }
        }
        let _ = writeln!(out, "END_{name}");
        out.push('\n');
    }

    fn serialize_data(&self, data: NodeId, columns: &[String], out: &mut String) {
        let width = self.node(data).numeric_width;
        for row in self.node(data).rows() {
            let Some(sample) = row.as_child() else {
                continue;
            };
            let mut parts = Vec::with_capacity(columns.len());
            for col in columns {
                if let Some(v) = self.node(sample).field(col).and_then(Entry::as_value) {
                    parts.push(value::format_padded(v, width));
                }
            }
            let line = parts.join(" ");
            let _ = writeln!(out, "{}", line.trim_end());
        }
    }
}

impl fmt::Display for Cgats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
