//! OGC WKT (the 1.0 grammar with the usual GDAL extensions).
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use log::{debug, trace};
use osr_core::node::{Node, NodeKind, OpaqueNode, SrsNode, Value};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const FORMAT: &str = "WKT";
const MAX_DEPTH: usize = 64;

/// Knobs for [`SpatialReference::to_wkt_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WktOptions {
    /// one node per line
    pub pretty: bool,
    /// spaces per level when pretty printing
    pub indent: usize,
    /// leave out AXIS, AUTHORITY and EXTENSION nodes
    pub simplify: bool,
}

impl Default for WktOptions {
    fn default() -> Self {
        WktOptions {
            pretty: false,
            indent: 4,
            simplify: false,
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse_at(FORMAT, message, self.text, self.pos)
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn keyword(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a keyword"));
        }
        Ok(&self.text[start..self.pos])
    }

    fn open(&mut self) -> Result<u8> {
        self.skip_ws();
        match self.peek() {
            Some(b'[') => {
                self.pos += 1;
                Ok(b']')
            }
            Some(b'(') => {
                self.pos += 1;
                Ok(b')')
            }
            _ => Err(self.error("expected '[' or '('")),
        }
    }

    fn node(&mut self, depth: usize) -> Result<SrsNode> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.skip_ws();
        let keyword = self.keyword()?;
        let close = self.open()?;
        let kind = match NodeKind::from_keyword(keyword) {
            Some(kind) => kind,
            None => {
                trace!("keeping unknown WKT node {}", keyword);
                let raw = self.raw_until(close)?;
                return Ok(OpaqueNode::new(keyword, raw).into());
            }
        };
        let mut node = Node::new(kind);
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(node.into());
        }
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(self.error("unexpected end of input")),
                Some(b'"') => node.attrs.push(Value::Quoted(self.quoted()?)),
                Some(c) if c.is_ascii_alphabetic() && self.starts_child() => {
                    node.children.push(self.node(depth + 1)?);
                }
                Some(_) => node.attrs.push(Value::Bare(self.bare()?)),
            }
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(node.into());
                }
                Some(_) => return Err(self.error("expected ',' or closing bracket")),
                None => return Err(self.error("unexpected end of input")),
            }
        }
    }

    /// Looks ahead for `IDENT` followed by an opening bracket.
    fn starts_child(&self) -> bool {
        let mut i = self.pos;
        while i < self.bytes.len() && (self.bytes[i].is_ascii_alphanumeric() || self.bytes[i] == b'_') {
            i += 1;
        }
        while i < self.bytes.len() && self.bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        matches!(self.bytes.get(i), Some(b'[') | Some(b'('))
    }

    fn quoted(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        match self.text[self.pos..].find('"') {
            Some(len) => {
                let s = self.text[self.pos..self.pos + len].to_owned();
                self.pos += len + 1;
                Ok(s)
            }
            None => {
                self.pos = start;
                Err(self.error("unterminated string"))
            }
        }
    }

    fn bare(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b',' || c == b']' || c == b')' || c == b'[' || c == b'(' || c == b'"' {
                break;
            }
            self.pos += 1;
        }
        let token = self.text[start..self.pos].trim();
        if token.is_empty() {
            return Err(self.error("expected a value"));
        }
        Ok(token.to_owned())
    }

    /// Everything up to the bracket closing the current node, quotes and nested
    /// brackets respected.
    fn raw_until(&mut self, close: u8) -> Result<String> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut in_quotes = false;
        while let Some(c) = self.peek() {
            match c {
                b'"' => in_quotes = !in_quotes,
                b'[' | b'(' if !in_quotes => depth += 1,
                b']' | b')' if !in_quotes => {
                    if depth == 0 {
                        if c != close {
                            return Err(self.error("mismatched brackets"));
                        }
                        let raw = self.text[start..self.pos].to_owned();
                        self.pos += 1;
                        return Ok(raw);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(self.error("unexpected end of input"))
    }
}

/// Parses a WKT string into its root node.
pub fn parse(text: &str) -> Result<Node> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let start = parser.pos;
    let node = parser.node(0)?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("trailing characters after the definition"));
    }
    match node {
        SrsNode::Known(root) if root.kind.is_crs() => Ok(root),
        other => Err(Error::parse_at(
            FORMAT,
            format!("{} is not a coordinate system keyword", other.keyword()),
            text,
            start,
        )),
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Quoted(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Value::Bare(s) => out.push_str(s),
    }
}

fn skip(node: &SrsNode, options: &WktOptions) -> bool {
    if !options.simplify {
        return false;
    }
    let kind = match node {
        SrsNode::Known(n) => Some(n.kind),
        SrsNode::Opaque(o) => NodeKind::from_keyword(&o.keyword),
    };
    matches!(
        kind,
        Some(NodeKind::Axis) | Some(NodeKind::Authority) | Some(NodeKind::Extension)
    )
}

fn write_node(out: &mut String, node: &SrsNode, depth: usize, options: &WktOptions) {
    match node {
        SrsNode::Opaque(o) => {
            out.push_str(&o.keyword);
            out.push('[');
            out.push_str(&o.raw);
            out.push(']');
        }
        SrsNode::Known(n) => write_known(out, n, depth, options),
    }
}

fn write_known(out: &mut String, node: &Node, depth: usize, options: &WktOptions) {
    out.push_str(node.kind.keyword());
    out.push('[');
    let mut first = true;
    for value in &node.attrs {
        if !first {
            out.push(',');
        }
        first = false;
        write_value(out, value);
    }
    for child in node.children.iter().filter(|c| !skip(c, options)) {
        if !first {
            out.push(',');
        }
        first = false;
        if options.pretty {
            out.push('\n');
            out.push_str(&" ".repeat(options.indent * (depth + 1)));
        }
        write_node(out, child, depth + 1, options);
    }
    out.push(']');
}

/// Serializes a node and its subtree.
pub fn write(node: &Node, options: &WktOptions) -> String {
    let mut out = String::new();
    write_known(&mut out, node, 0, options);
    out
}

impl SpatialReference {
    pub fn from_wkt(text: &str) -> Result<Self> {
        let mut srs = SpatialReference::new();
        srs.import_wkt(text)?;
        Ok(srs)
    }

    /// Replaces the definition with one parsed from WKT.
    pub fn import_wkt(&mut self, text: &str) -> Result<()> {
        let root = parse(text)?;
        debug!("imported {} from WKT", root.kind);
        self.set_root(root)
    }

    pub fn to_wkt(&self) -> Result<String> {
        self.to_wkt_with(&WktOptions::default())
    }

    pub fn to_pretty_wkt(&self, simplify: bool) -> Result<String> {
        self.to_wkt_with(&WktOptions {
            pretty: true,
            simplify,
            ..WktOptions::default()
        })
    }

    pub fn to_wkt_with(&self, options: &WktOptions) -> Result<String> {
        let root = self
            .root()
            .ok_or_else(|| Error::export(FORMAT, "the definition is empty"))?;
        Ok(write(root, options))
    }
}

impl std::fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.root() {
            Some(root) => f.write_str(&write(root, &WktOptions::default())),
            None => Ok(()),
        }
    }
}

impl std::str::FromStr for SpatialReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SpatialReference::from_wkt(s)
    }
}
