//! The tree every definition is parsed into.
//!
//! Attributes (names, numbers, axis directions) are kept apart from child nodes, so
//! `SPHEROID["WGS 84",6378137,298.257223563]` is a node with three attributes and no
//! children. Attribute text is kept as written so that an untouched tree exports the
//! same digits it was read with.
use crate::number::{format_number, is_numeric, parse_number};
use crate::result::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Geogcs,
    Datum,
    Spheroid,
    Primem,
    Unit,
    Projcs,
    Projection,
    Parameter,
    Authority,
    Axis,
    Geoccs,
    VertCs,
    CompdCs,
    LocalCs,
    Towgs84,
    VertDatum,
    LocalDatum,
    Extension,
}

const KEYWORDS: &[(NodeKind, &str)] = &[
    (NodeKind::Geogcs, "GEOGCS"),
    (NodeKind::Datum, "DATUM"),
    (NodeKind::Spheroid, "SPHEROID"),
    (NodeKind::Primem, "PRIMEM"),
    (NodeKind::Unit, "UNIT"),
    (NodeKind::Projcs, "PROJCS"),
    (NodeKind::Projection, "PROJECTION"),
    (NodeKind::Parameter, "PARAMETER"),
    (NodeKind::Authority, "AUTHORITY"),
    (NodeKind::Axis, "AXIS"),
    (NodeKind::Geoccs, "GEOCCS"),
    (NodeKind::VertCs, "VERT_CS"),
    (NodeKind::CompdCs, "COMPD_CS"),
    (NodeKind::LocalCs, "LOCAL_CS"),
    (NodeKind::Towgs84, "TOWGS84"),
    (NodeKind::VertDatum, "VERT_DATUM"),
    (NodeKind::LocalDatum, "LOCAL_DATUM"),
    (NodeKind::Extension, "EXTENSION"),
];

impl NodeKind {
    pub fn keyword(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, kw)| *kw)
            .unwrap_or("UNKNOWN")
    }

    pub fn from_keyword(keyword: &str) -> Option<NodeKind> {
        KEYWORDS
            .iter()
            .find(|(_, kw)| kw.eq_ignore_ascii_case(keyword))
            .map(|(k, _)| *k)
    }

    /// Kinds that may sit at the root of a definition.
    pub fn is_crs(self) -> bool {
        matches!(
            self,
            NodeKind::Geogcs
                | NodeKind::Projcs
                | NodeKind::Geoccs
                | NodeKind::VertCs
                | NodeKind::CompdCs
                | NodeKind::LocalCs
        )
    }

    /// Order strict WKT readers expect children of this kind in. Anything not
    /// listed goes last.
    fn child_order(self) -> &'static [&'static [NodeKind]] {
        use NodeKind::*;
        match self {
            Projcs => &[&[Geogcs], &[Projection], &[Parameter], &[Unit], &[Axis], &[Extension], &[Authority]],
            Geogcs => &[&[Datum], &[Primem], &[Unit], &[Axis], &[Authority]],
            Geoccs => &[&[Datum], &[Primem], &[Unit], &[Axis], &[Authority]],
            Datum => &[&[Spheroid], &[Towgs84], &[Extension], &[Authority]],
            VertCs => &[&[VertDatum], &[Unit], &[Axis], &[Authority]],
            VertDatum => &[&[Extension], &[Authority]],
            CompdCs => &[&[Geogcs, Projcs], &[VertCs], &[Authority]],
            LocalCs => &[&[LocalDatum], &[Unit], &[Axis], &[Authority]],
            Spheroid | Primem | Unit | Projection | LocalDatum => &[&[Authority]],
            _ => &[],
        }
    }

    /// Whether `child` has a place among the children of this kind.
    pub fn allows_child(self, child: NodeKind) -> bool {
        self.child_order().iter().any(|group| group.contains(&child))
    }

    fn rank_of(self, child: &SrsNode) -> usize {
        let order = self.child_order();
        match child {
            SrsNode::Known(n) => order
                .iter()
                .position(|group| group.contains(&n.kind))
                .unwrap_or(order.len()),
            SrsNode::Opaque(_) => order.len(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A leaf attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Quoted(String),
    /// numbers and enumerations like axis directions
    Bare(String),
}

impl Value {
    pub fn quoted(s: impl Into<String>) -> Value {
        Value::Quoted(s.into())
    }

    pub fn number(v: f64) -> Value {
        Value::Bare(format_number(v))
    }

    /// Numbers become bare tokens, everything else is quoted.
    pub fn infer(s: &str) -> Value {
        if is_numeric(s) {
            Value::Bare(s.trim().to_owned())
        } else {
            Value::Quoted(s.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Value::Quoted(s) | Value::Bare(s) => s,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        parse_number(self.as_str())
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self, Value::Quoted(_))
    }
}

/// A well-formed node whose keyword this crate doesn't model. `raw` holds what was
/// between the brackets, verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueNode {
    pub keyword: String,
    pub raw: String,
}

impl OpaqueNode {
    pub fn new(keyword: impl Into<String>, raw: impl Into<String>) -> Self {
        OpaqueNode {
            keyword: keyword.into(),
            raw: raw.into(),
        }
    }

    /// Top level comma separated items of `raw`, quotes removed.
    pub fn attrs(&self) -> Vec<String> {
        let mut items = Vec::new();
        let mut depth = 0usize;
        let mut in_quotes = false;
        let mut current = String::new();
        for c in self.raw.chars() {
            match c {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(c);
                }
                '[' | '(' if !in_quotes => {
                    depth += 1;
                    current.push(c);
                }
                ']' | ')' if !in_quotes => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if !in_quotes && depth == 0 => {
                    items.push(unquote(&current));
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        if !current.trim().is_empty() || !items.is_empty() {
            items.push(unquote(&current));
        }
        items
    }
}

fn unquote(s: &str) -> String {
    let t = s.trim();
    if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        t[1..t.len() - 1].to_owned()
    } else {
        t.to_owned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SrsNode {
    Known(Node),
    Opaque(OpaqueNode),
}

impl SrsNode {
    pub fn keyword(&self) -> &str {
        match self {
            SrsNode::Known(n) => n.kind.keyword(),
            SrsNode::Opaque(o) => &o.keyword,
        }
    }

    pub fn as_known(&self) -> Option<&Node> {
        match self {
            SrsNode::Known(n) => Some(n),
            SrsNode::Opaque(_) => None,
        }
    }

    pub fn as_known_mut(&mut self) -> Option<&mut Node> {
        match self {
            SrsNode::Known(n) => Some(n),
            SrsNode::Opaque(_) => None,
        }
    }

    /// Text of the `index`-th attribute.
    pub fn attr_text(&self, index: usize) -> Option<String> {
        match self {
            SrsNode::Known(n) => n.attr(index).map(str::to_owned),
            SrsNode::Opaque(o) => o.attrs().into_iter().nth(index),
        }
    }

    fn find_keyword(&self, keyword: &str) -> Option<&SrsNode> {
        if self.keyword().eq_ignore_ascii_case(keyword) {
            return Some(self);
        }
        match self {
            SrsNode::Known(n) => n.children.iter().find_map(|c| c.find_keyword(keyword)),
            SrsNode::Opaque(_) => None,
        }
    }
}

impl From<Node> for SrsNode {
    fn from(node: Node) -> Self {
        SrsNode::Known(node)
    }
}

impl From<OpaqueNode> for SrsNode {
    fn from(node: OpaqueNode) -> Self {
        SrsNode::Opaque(node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub attrs: Vec<Value>,
    pub children: Vec<SrsNode>,
}

fn split_path(path: &str) -> Vec<&str> {
    path.split(|c| c == '|' || c == '.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
        Node {
            kind,
            attrs: vec![Value::Quoted(name.into())],
            children: Vec::new(),
        }
    }

    pub fn unit(name: &str, factor: f64) -> Self {
        Node::named(NodeKind::Unit, name).with_attr(Value::number(factor))
    }

    pub fn authority(name: &str, code: impl ToString) -> Self {
        Node::named(NodeKind::Authority, name).with_attr(Value::quoted(code.to_string()))
    }

    pub fn parameter(name: &str, value: f64) -> Self {
        Node::named(NodeKind::Parameter, name).with_attr(Value::number(value))
    }

    pub fn with_attr(mut self, value: Value) -> Self {
        self.attrs.push(value);
        self
    }

    pub fn with_child(mut self, child: impl Into<SrsNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.attr(0)
    }

    pub fn set_name(&mut self, name: &str) {
        self.set_attr(0, Value::quoted(name));
    }

    pub fn attr(&self, index: usize) -> Option<&str> {
        self.attrs.get(index).map(Value::as_str)
    }

    pub fn attr_f64(&self, index: usize) -> Option<f64> {
        self.attrs.get(index).and_then(Value::as_f64)
    }

    /// Sets attribute `index`, padding with empty strings if the node is shorter.
    pub fn set_attr(&mut self, index: usize, value: Value) {
        while self.attrs.len() <= index {
            self.attrs.push(Value::Quoted(String::new()));
        }
        self.attrs[index] = value;
    }

    pub fn child(&self, kind: NodeKind) -> Option<&Node> {
        self.children_of(kind).next()
    }

    pub fn child_mut(&mut self, kind: NodeKind) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .filter_map(SrsNode::as_known_mut)
            .find(|n| n.kind == kind)
    }

    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children
            .iter()
            .filter_map(SrsNode::as_known)
            .filter(move |n| n.kind == kind)
    }

    pub fn known_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(SrsNode::as_known)
    }

    /// First direct child of `kind`, created in canonical position when missing.
    pub fn child_or_insert(&mut self, kind: NodeKind) -> &mut Node {
        let existing = self
            .children
            .iter()
            .position(|c| matches!(c, SrsNode::Known(n) if n.kind == kind));
        let index = match existing {
            Some(i) => i,
            None => self.insert_child(Node::new(kind)),
        };
        match &mut self.children[index] {
            SrsNode::Known(n) => n,
            SrsNode::Opaque(_) => unreachable!("child_or_insert indexed an opaque node"),
        }
    }

    /// Inserts after every sibling that sorts before or with it. Returns the index.
    pub fn insert_child(&mut self, child: impl Into<SrsNode>) -> usize {
        let child = child.into();
        let rank = self.kind.rank_of(&child);
        let index = self
            .children
            .iter()
            .position(|c| self.kind.rank_of(c) > rank)
            .unwrap_or(self.children.len());
        self.children.insert(index, child);
        index
    }

    /// Replaces the first direct child of the same kind, or inserts it.
    pub fn replace_child(&mut self, child: Node) {
        match self.child_mut(child.kind) {
            Some(existing) => *existing = child,
            None => {
                self.insert_child(child);
            }
        }
    }

    /// Removes direct children of `kind`, returning how many went.
    pub fn remove_children(&mut self, kind: NodeKind) -> usize {
        let before = self.children.len();
        self.children
            .retain(|c| !matches!(c, SrsNode::Known(n) if n.kind == kind));
        before - self.children.len()
    }

    pub fn opaque(&self, keyword: &str) -> Option<&OpaqueNode> {
        self.children.iter().find_map(|c| match c {
            SrsNode::Opaque(o) if o.keyword.eq_ignore_ascii_case(keyword) => Some(o),
            _ => None,
        })
    }

    /// Depth first search that includes `self`.
    pub fn find(&self, kind: NodeKind) -> Option<&Node> {
        if self.kind == kind {
            return Some(self);
        }
        self.known_children().find_map(|c| c.find(kind))
    }

    pub fn find_mut(&mut self, kind: NodeKind) -> Option<&mut Node> {
        if self.kind == kind {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let SrsNode::Known(n) = child {
                if let Some(found) = n.find_mut(kind) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Path lookup by kind, mutable. Unknown keywords never match.
    pub fn find_path_mut(&mut self, path: &str) -> Option<&mut Node> {
        let segments = split_path(path);
        let mut current = self;
        for segment in segments {
            let kind = NodeKind::from_keyword(segment)?;
            current = current.find_mut(kind)?;
        }
        Some(current)
    }

    /// Text of attribute `index` of the node at `path`, `None` when the path does
    /// not resolve.
    ///
    /// Segments are separated by `|` or `.`, e.g. `PROJCS|GEOGCS|DATUM`. Each one is
    /// searched for depth first below (and including) the node the previous segment
    /// matched, so `DATUM` alone also works from a PROJCS. The last segment may name
    /// an opaque node.
    pub fn attr_value(&self, path: &str, index: usize) -> Option<String> {
        let segments = split_path(path);
        let (last, init) = segments.split_last()?;
        let mut current = self;
        for segment in init {
            let kind = NodeKind::from_keyword(segment)?;
            current = current.find(kind)?;
        }
        if current.kind.keyword().eq_ignore_ascii_case(last) {
            return current.attr(index).map(str::to_owned);
        }
        current
            .children
            .iter()
            .find_map(|c| c.find_keyword(last))
            .and_then(|n| n.attr_text(index))
    }

    /// Upsert along `path`, whose first segment must name this node. Missing
    /// children are created, then attribute 0 of the last one is set.
    pub fn set_attr_value(&mut self, path: &str, value: &str) -> Result<()> {
        let segments = split_path(path);
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| Error::PathError(path.to_owned()))?;
        if !self.kind.keyword().eq_ignore_ascii_case(first) {
            return Err(Error::PathError(path.to_owned()));
        }
        let mut kinds = Vec::with_capacity(rest.len());
        for segment in rest {
            kinds.push(NodeKind::from_keyword(segment).ok_or_else(|| Error::PathError(path.to_owned()))?);
        }
        let mut current = self;
        for kind in kinds {
            current = current.child_or_insert(kind);
        }
        current.set_attr(0, Value::infer(value));
        Ok(())
    }

    /// True when the direct children already follow the canonical order.
    pub fn is_ordered(&self) -> bool {
        self.children
            .windows(2)
            .all(|w| self.kind.rank_of(&w[0]) <= self.kind.rank_of(&w[1]))
    }

    /// Reorders children, recursively, into canonical order. Stable for siblings
    /// of equal rank.
    pub fn sort_children(&mut self) -> bool {
        let kind = self.kind;
        let before: Vec<usize> = self.children.iter().map(|c| kind.rank_of(c)).collect();
        let mut changed = before.windows(2).any(|w| w[0] > w[1]);
        self.children.sort_by_key(|c| kind.rank_of(c));
        for child in self.children.iter_mut() {
            if let SrsNode::Known(n) = child {
                changed |= n.sort_children();
            }
        }
        changed
    }

    /// Removes nodes of the given kinds anywhere below this one. Opaque nodes with a
    /// matching keyword go as well.
    pub fn strip(&mut self, kinds: &[NodeKind]) {
        self.children.retain(|c| match c {
            SrsNode::Known(n) => !kinds.contains(&n.kind),
            SrsNode::Opaque(o) => NodeKind::from_keyword(&o.keyword)
                .map(|k| !kinds.contains(&k))
                .unwrap_or(true),
        });
        for child in self.children.iter_mut() {
            if let SrsNode::Known(n) = child {
                n.strip(kinds);
            }
        }
    }

    /// Calls `f` on this node and every known descendant.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in self.children.iter_mut() {
            if let SrsNode::Known(n) = child {
                n.visit_mut(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wgs84() -> Node {
        Node::named(NodeKind::Geogcs, "WGS 84")
            .with_child(
                Node::named(NodeKind::Datum, "WGS_1984").with_child(
                    Node::named(NodeKind::Spheroid, "WGS 84")
                        .with_attr(Value::Bare("6378137".into()))
                        .with_attr(Value::Bare("298.257223563".into())),
                ),
            )
            .with_child(Node::named(NodeKind::Primem, "Greenwich").with_attr(Value::number(0.0)))
            .with_child(Node::unit("degree", 0.0174532925199433))
    }

    #[test]
    fn path_lookup() {
        let root = wgs84();
        assert_eq!(root.attr_value("GEOGCS", 0).unwrap(), "WGS 84");
        assert_eq!(root.attr_value("GEOGCS|DATUM", 0).unwrap(), "WGS_1984");
        assert_eq!(root.attr_value("SPHEROID", 1).unwrap(), "6378137");
        assert_eq!(root.attr_value("GEOGCS.UNIT", 1).unwrap(), "0.0174532925199433");
        assert!(root.attr_value("TOWGS84", 0).is_none());
        assert!(root.attr_value("GEOGCS|DATUM", 5).is_none());
    }

    #[test]
    fn opaque_nodes_are_searchable() {
        let mut root = wgs84();
        root.children
            .push(OpaqueNode::new("METADATA", "\"v\",1,FOO[2]").into());
        assert_eq!(root.attr_value("METADATA", 0).unwrap(), "v");
        assert_eq!(root.attr_value("METADATA", 2).unwrap(), "FOO[2]");
    }

    #[test]
    fn set_attr_value_creates_in_order() {
        let mut root = Node::new(NodeKind::Geogcs);
        root.set_attr_value("GEOGCS|UNIT", "degree").unwrap();
        root.set_attr_value("GEOGCS|DATUM|SPHEROID", "GRS 1980").unwrap();
        root.set_attr_value("GEOGCS", "NAD83").unwrap();
        let kinds: Vec<_> = root.known_children().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Datum, NodeKind::Unit]);
        assert_eq!(root.name(), Some("NAD83"));
        assert_eq!(root.attr_value("SPHEROID", 0).unwrap(), "GRS 1980");

        assert!(root.set_attr_value("PROJCS|UNIT", "metre").is_err());
        assert!(root.set_attr_value("GEOGCS|BOGUS", "x").is_err());
    }

    #[test]
    fn set_attr_value_is_idempotent() {
        let mut a = wgs84();
        a.set_attr_value("GEOGCS|PRIMEM", "Paris").unwrap();
        let once = a.clone();
        a.set_attr_value("GEOGCS|PRIMEM", "Paris").unwrap();
        assert_eq!(a, once);
    }

    #[test]
    fn sorting_and_stripping() {
        let mut root = Node::named(NodeKind::Geogcs, "x")
            .with_child(Node::authority("EPSG", 4326))
            .with_child(Node::unit("degree", 0.0174532925199433))
            .with_child(Node::named(NodeKind::Datum, "d"));
        assert!(root.sort_children());
        let kinds: Vec<_> = root.known_children().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Datum, NodeKind::Unit, NodeKind::Authority]);
        assert!(!root.sort_children());

        root.strip(&[NodeKind::Authority]);
        assert!(root.child(NodeKind::Authority).is_none());
    }

    #[test]
    fn clones_are_independent() {
        let original = wgs84();
        let mut copy = original.clone();
        copy.find_mut(NodeKind::Spheroid)
            .unwrap()
            .set_attr(1, Value::number(6378206.4));
        assert_eq!(original.attr_value("SPHEROID", 1).unwrap(), "6378137");
    }
}
