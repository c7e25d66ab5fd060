//! Line parser
//!
//! CGATS input is line-oriented: a file-type marker, `KEY value` header
//! lines, paired `BEGIN_X`/`END_X` section markers and whitespace-split
//! rows inside `DATA_FORMAT`/`DATA`. The parser keeps a single "current
//! context" handle and descends into or climbs out of sections as the
//! markers come by. Tree construction itself goes through the same
//! mutation entry point programmatic callers use.
//!
//! Structural problems the reference ecosystem tolerates (stray lines
//! outside sections, unbalanced `END_X`) are tolerated here too; row
//! level problems (wrong arity, non-numeric values) are errors.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::document::{Cgats, DATA_FORMAT_KEY, DATA_KEY, DEFAULT_TYPE, Payload};
use crate::error::{Error, Result};
use crate::node::{NodeId, NodeKind};
use crate::value::{self, Value};

/// Parsing configuration
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Case-fold field and keyword names; rewrite the legacy
    /// `SampleId`/`SampleName` spellings to `SAMPLE_ID`/`SAMPLE_NAME`
    pub normalize: bool,
    /// File-type tag used when the input has no leading marker
    pub fallback_type: String,
    /// Treat short punctuation-free lines at chart level as the start of
    /// a new sub-document (legacy multi-record layout). Off means only a
    /// repeated file-type marker opens a new chart.
    pub marker_heuristic: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            normalize: false,
            fallback_type: DEFAULT_TYPE.to_string(),
            marker_heuristic: true,
        }
    }
}

fn key_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // name, then an optional quoted-or-bare value; comments are already cut
    RE.get_or_init(|| Regex::new(r#"^([\w.-]+)\s*(?:"([^"]*)"|(\S+))?\s*$"#).unwrap())
}

struct ParserState {
    ctx: NodeId,
    /// A `Date:` line seen before its chart existed
    pending_datetime: Option<String>,
}

pub(crate) fn parse_lines<I, S>(lines: I, opts: &ParseOptions) -> Result<Cgats>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut doc = Cgats::with_settings(&opts.fallback_type, opts.normalize);
    let mut st = ParserState {
        ctx: doc.root(),
        pending_datetime: None,
    };
    for raw in lines {
        let line = clean_line(raw.as_ref());
        if line.is_empty() {
            continue;
        }
        parse_line(&mut doc, &mut st, &line, opts)?;
    }
    if doc.charts().is_empty() {
        return Err(Error::InvalidDocument(
            "no recognizable CGATS content".to_string(),
        ));
    }
    // parsing itself does not count as a mutation
    doc.clear_modified();
    Ok(doc)
}

fn parse_line(doc: &mut Cgats, st: &mut ParserState, line: &str, opts: &ParseOptions) -> Result<()> {
    match line {
        "BEGIN_DATA_FORMAT" => {
            let chart = current_chart(doc, st);
            st.ctx = doc.add_named_child(chart, DATA_FORMAT_KEY, NodeKind::DataFormat);
            return Ok(());
        }
        "END_DATA_FORMAT" | "END_DATA" => {
            pop_to_chart(doc, st);
            return Ok(());
        }
        "BEGIN_DATA" => {
            let chart = current_chart(doc, st);
            st.ctx = doc.add_named_child(chart, DATA_KEY, NodeKind::Data);
            return Ok(());
        }
        _ => {}
    }
    if let Some(name) = line.strip_prefix("BEGIN_") {
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            let chart = current_chart(doc, st);
            let name = doc.normalize_key(name);
            st.ctx = doc.add_named_child(chart, &name, NodeKind::Section);
            return Ok(());
        }
    }
    if let Some(name) = line.strip_prefix("END_") {
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            // tolerate mismatched or stray END markers
            pop_to_chart(doc, st);
            return Ok(());
        }
    }
    match doc.node(st.ctx).kind() {
        NodeKind::DataFormat => {
            doc.add_data(st.ctx, Payload::Columns(split_tokens(line)))?;
        }
        NodeKind::Data => {
            doc.add_data(st.ctx, Payload::Columns(split_tokens(line)))?;
        }
        NodeKind::Section => {
            doc.add_data(st.ctx, Payload::Line(line.to_string()))?;
        }
        NodeKind::Root | NodeKind::Chart => {
            parse_header_line(doc, st, line, opts)?;
        }
        _ => {}
    }
    Ok(())
}

fn parse_header_line(
    doc: &mut Cgats,
    st: &mut ParserState,
    line: &str,
    opts: &ParseOptions,
) -> Result<()> {
    if let Some(rest) = line.strip_prefix("Date:") {
        let dt = rest.trim().to_string();
        if doc.node(st.ctx).kind() == NodeKind::Chart {
            doc.set_datetime(st.ctx, dt);
        } else {
            st.pending_datetime = Some(dt);
        }
        return Ok(());
    }
    if line.starts_with("Comment:") {
        return Ok(());
    }
    let Some(caps) = key_value_re().captures(line) else {
        // stray non-structural line, silently ignored
        return Ok(());
    };
    let key = &caps[1];
    let quoted = caps.get(2).map(|m| m.as_str());
    let bare = caps.get(3).map(|m| m.as_str());
    match (quoted, bare) {
        (Some(q), _) | (None, Some(q)) if key == "KEYWORD" => {
            let chart = current_chart(doc, st);
            doc.add_keyword(chart, q, None)?;
        }
        _ if key == "NUMBER_OF_FIELDS" || key == "NUMBER_OF_SETS" => {
            // derived counters, recomputed on output
        }
        (Some(q), _) => {
            let chart = current_chart(doc, st);
            doc.add_data(chart, vec![(key.to_string(), Value::Text(q.to_string()))])?;
        }
        (None, Some(b)) => {
            let chart = current_chart(doc, st);
            doc.add_data(chart, vec![(key.to_string(), value::auto_coerce(b))])?;
        }
        (None, None) => {
            handle_bare_marker(doc, st, key, opts);
        }
    }
    Ok(())
}

/// A value-less token at chart level: the file type of a new
/// sub-document, or a stray line.
fn handle_bare_marker(doc: &mut Cgats, st: &mut ParserState, token: &str, opts: &ParseOptions) {
    let charts = doc.charts();
    if charts.is_empty() {
        open_chart(doc, st, token);
        return;
    }
    let repeated = charts.iter().any(|&c| doc.node(c).tag() == Some(token));
    if repeated || (opts.marker_heuristic && is_marker_like(token)) {
        open_chart(doc, st, token);
    }
    // otherwise: stray line, silently ignored
}

fn is_marker_like(token: &str) -> bool {
    token.len() <= 15
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn open_chart(doc: &mut Cgats, st: &mut ParserState, tag: &str) {
    let id = doc.add_chart(tag);
    if let Some(dt) = st.pending_datetime.take() {
        doc.set_datetime(id, dt);
    }
    st.ctx = id;
}

/// Chart the current context belongs to, materializing a fallback-typed
/// chart for header lines that arrive before any marker.
fn current_chart(doc: &mut Cgats, st: &mut ParserState) -> NodeId {
    if doc.node(st.ctx).kind() == NodeKind::Chart {
        return st.ctx;
    }
    if let Some(chart) = doc.enclosing_chart(st.ctx) {
        st.ctx = chart;
        return chart;
    }
    let id = doc.ensure_chart();
    if let Some(dt) = st.pending_datetime.take() {
        doc.set_datetime(id, dt);
    }
    st.ctx = id;
    id
}

fn pop_to_chart(doc: &Cgats, st: &mut ParserState) {
    st.ctx = doc.enclosing_chart(st.ctx).unwrap_or(doc.root());
}

/// Strip control characters (tab survives), cut the line at the first
/// unescaped `#`, trim surrounding whitespace.
fn clean_line(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for c in raw.chars() {
        let printable = c == '\t' || (!c.is_control() && !('\u{7f}'..='\u{9f}').contains(&c));
        if !printable {
            continue;
        }
        if escaped {
            if c != '#' {
                out.push('\\');
            }
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '#' => break,
            c => out.push(c),
        }
    }
    if escaped {
        out.push('\\');
    }
    out.trim().to_string()
}

/// Whitespace split honoring double-quoted runs; quotes stay on the token
fn split_tokens(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => {
                cur.push('"');
                in_quotes = !in_quotes;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // not UTF-8: the format is Latin-1/ASCII-safe, decode as Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

impl Cgats {
    /// Parse a document from an in-memory string
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, &ParseOptions::default())
    }

    /// Parse a string with explicit options
    pub fn parse_with(input: &str, opts: &ParseOptions) -> Result<Self> {
        parse_lines(input.lines(), opts)
    }

    /// Parse a document from a file path; the path is remembered for
    /// [`Cgats::write`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with(path, &ParseOptions::default())
    }

    /// Parse a file with explicit options
    pub fn from_file_with(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<Self> {
        let bytes = fs::read(&path)?;
        let mut doc = parse_lines(decode_text(&bytes).lines(), opts)?;
        doc.path = Some(path.as_ref().to_path_buf());
        Ok(doc)
    }

    /// Parse a document from an open reader
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Self::from_reader_with(reader, &ParseOptions::default())
    }

    /// Parse a reader with explicit options
    pub fn from_reader_with(mut reader: impl Read, opts: &ParseOptions) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        parse_lines(decode_text(&bytes).lines(), opts)
    }

    /// Parse a document from pre-split lines
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parse_lines(lines, &ParseOptions::default())
    }

    /// Parse pre-split lines with explicit options
    pub fn from_lines_with<I, S>(lines: I, opts: &ParseOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parse_lines(lines, opts)
    }
}

impl FromStr for Cgats {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
