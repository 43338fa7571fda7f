//! Structural checks and best-effort repair of a definition tree.
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use log::warn;
use osr_core::catalog;
use osr_core::config::Strictness;
use osr_core::node::{Node, NodeKind, SrsNode, Value};
use osr_core::units::DEGREE_TO_RADIAN;
use std::fmt;

const AXIS_DIRECTIONS: &[&str] = &["NORTH", "SOUTH", "EAST", "WEST", "UP", "DOWN", "OTHER"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub severity: Severity,
    /// keywords from the root down, e.g. `PROJCS|GEOGCS|DATUM`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{} at {}: {}", severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.findings.push(Finding {
            severity,
            path: path.to_owned(),
            message: message.into(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    /// Error findings always fail; in strict mode warnings do as well.
    pub fn into_result(self, strictness: impl Into<Strictness>) -> Result<()> {
        let strict = strictness.into().is_strict();
        let fatal: Vec<String> = self
            .findings
            .iter()
            .filter(|f| strict || f.severity == Severity::Error)
            .map(Finding::to_string)
            .collect();
        if fatal.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidCRSError(fatal.join("; ")))
        }
    }
}

fn require(report: &mut ValidationReport, node: &Node, path: &str, kind: NodeKind) {
    if node.child(kind).is_none() {
        report.push(Severity::Error, path, format!("{} is missing", kind));
    }
}

fn check_number(report: &mut ValidationReport, node: &Node, path: &str, index: usize, what: &str) -> Option<f64> {
    let value = node.attr_f64(index);
    if value.is_none() {
        report.push(Severity::Error, path, format!("{} is not a number", what));
    }
    value
}

fn check_node(report: &mut ValidationReport, node: &Node, path: &str) {
    use NodeKind::*;
    if node.name().map(str::is_empty).unwrap_or(true) && !matches!(node.kind, Towgs84) {
        report.push(Severity::Warning, path, "node has no name");
    }
    match node.kind {
        Geogcs | Geoccs => {
            require(report, node, path, Datum);
            require(report, node, path, Primem);
            require(report, node, path, Unit);
        }
        Projcs => {
            match node.children_of(Geogcs).count() {
                0 => report.push(Severity::Warning, path, "GEOGCS is missing"),
                1 => {}
                n => report.push(Severity::Error, path, format!("{} GEOGCS, expected one", n)),
            }
            require(report, node, path, Unit);
            check_projection(report, node, path);
        }
        VertCs => {
            require(report, node, path, VertDatum);
            require(report, node, path, Unit);
        }
        LocalCs => {
            require(report, node, path, Unit);
            if node.child(LocalDatum).is_none() {
                report.push(Severity::Warning, path, "LOCAL_DATUM is missing");
            }
        }
        CompdCs => {
            let members: Vec<NodeKind> = node.known_children().map(|c| c.kind).filter(|k| k.is_crs()).collect();
            let horizontal = members.iter().filter(|k| matches!(k, Geogcs | Projcs)).count();
            let vertical = members.iter().filter(|k| **k == VertCs).count();
            if members.len() != 2 {
                report.push(
                    Severity::Error,
                    path,
                    format!("{} coordinate systems, expected a horizontal one and a VERT_CS", members.len()),
                );
            } else if horizontal != 1 {
                report.push(Severity::Error, path, "horizontal system is missing");
            } else if vertical != 1 {
                report.push(Severity::Error, path, "second member is not a VERT_CS");
            }
        }
        Datum => require(report, node, path, Spheroid),
        Spheroid => {
            if let Some(a) = check_number(report, node, path, 1, "semi major axis") {
                if a <= 0.0 {
                    report.push(Severity::Error, path, format!("semi major axis {} is not positive", a));
                }
            }
            if let Some(rf) = check_number(report, node, path, 2, "inverse flattening") {
                if rf < 0.0 {
                    report.push(Severity::Error, path, format!("inverse flattening {} is negative", rf));
                }
            }
        }
        Primem => {
            check_number(report, node, path, 1, "longitude");
        }
        Unit => {
            if let Some(factor) = check_number(report, node, path, 1, "conversion factor") {
                if factor <= 0.0 {
                    report.push(Severity::Error, path, format!("conversion factor {} is not positive", factor));
                }
            }
        }
        Parameter => {
            check_number(report, node, path, 1, "parameter value");
        }
        Towgs84 => {
            let count = node.attrs.len();
            if count != 3 && count != 7 {
                report.push(Severity::Error, path, format!("{} values, expected 3 or 7", count));
            } else if node.attrs.iter().any(|v| v.as_f64().is_none()) {
                report.push(Severity::Error, path, "values must be numbers");
            }
        }
        Axis => {
            let direction = node.attr(1).unwrap_or("");
            if !AXIS_DIRECTIONS.iter().any(|d| d.eq_ignore_ascii_case(direction)) {
                report.push(Severity::Error, path, format!("unknown axis direction {:?}", direction));
            }
        }
        Authority => {
            if node.attr(1).map(str::is_empty).unwrap_or(true) {
                report.push(Severity::Error, path, "code is missing");
            }
        }
        _ => {}
    }
    if !node.is_ordered() {
        report.push(Severity::Warning, path, "children are out of order");
    }
    for child in &node.children {
        match child {
            SrsNode::Known(c) => {
                let child_path = format!("{}|{}", path, c.kind);
                if !node.kind.allows_child(c.kind) {
                    report.push(
                        Severity::Error,
                        &child_path,
                        format!("{} does not belong under {}", c.kind, node.kind),
                    );
                }
                check_node(report, c, &child_path);
            }
            SrsNode::Opaque(o) => {
                report.push(
                    Severity::Warning,
                    &format!("{}|{}", path, o.keyword),
                    "unknown keyword kept as is",
                );
            }
        }
    }
}

fn check_projection(report: &mut ValidationReport, projcs: &Node, path: &str) {
    let method = match projcs.child(NodeKind::Projection).and_then(Node::name) {
        Some(m) => m,
        None => {
            report.push(Severity::Error, path, "PROJECTION is missing");
            return;
        }
    };
    let descriptor = match catalog::method(method) {
        Some(d) => d,
        None => {
            report.push(Severity::Warning, path, format!("projection method {} is not known", method));
            return;
        }
    };
    for param in projcs.children_of(NodeKind::Parameter) {
        let name = param.name().unwrap_or("");
        if !descriptor.takes(name) {
            report.push(
                Severity::Warning,
                &format!("{}|PARAMETER", path),
                format!("{} is not a parameter of {}", name, descriptor.name),
            );
        }
    }
}

/// Inserts the mandatory nodes strict readers insist on.
fn repair(node: &mut Node, path: &str, findings: &mut Vec<Finding>) {
    let mut insert = |node: &mut Node, child: Node, what: &str| {
        findings.push(Finding {
            severity: Severity::Warning,
            path: path.to_owned(),
            message: format!("added missing {}", what),
        });
        node.insert_child(child);
    };
    match node.kind {
        NodeKind::Geogcs => {
            if node.child(NodeKind::Primem).is_none() {
                insert(
                    node,
                    Node::named(NodeKind::Primem, "Greenwich").with_attr(Value::number(0.0)),
                    "PRIMEM Greenwich",
                );
            }
            if node.child(NodeKind::Unit).is_none() {
                insert(node, Node::unit("degree", DEGREE_TO_RADIAN), "UNIT degree");
            }
        }
        NodeKind::Projcs | NodeKind::Geoccs | NodeKind::VertCs | NodeKind::LocalCs => {
            if node.child(NodeKind::Unit).is_none() {
                insert(node, Node::unit("metre", 1.0), "UNIT metre");
            }
        }
        _ => {}
    }
    for child in node.children.iter_mut() {
        if let SrsNode::Known(c) = child {
            let child_path = format!("{}|{}", path, c.kind);
            repair(c, &child_path, findings);
        }
    }
}

impl SpatialReference {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        match self.root() {
            Some(root) => {
                let path = root.kind.keyword();
                check_node(&mut report, root, path);
            }
            None => report.push(Severity::Error, "", "definition is empty"),
        }
        report
    }

    /// Reorders children into the order strict WKT readers expect. Returns
    /// whether anything moved.
    pub fn fixup_ordering(&mut self) -> Result<bool> {
        let root = self.root_mut().ok_or(Error::MissingNodeError("root"))?;
        Ok(root.sort_children())
    }

    /// Fixes the ordering and inserts missing UNIT and PRIMEM nodes. The repairs
    /// are returned and logged. In strict mode any repair is an error and the
    /// definition is left untouched.
    pub fn fixup(&mut self, strictness: impl Into<Strictness>) -> Result<Vec<Finding>> {
        let strict = strictness.into().is_strict();
        let mut copy = self.clone();
        let root = copy.root_mut().ok_or(Error::MissingNodeError("root"))?;
        let path = root.kind.keyword().to_owned();
        let mut findings = Vec::new();
        if root.sort_children() {
            findings.push(Finding {
                severity: Severity::Warning,
                path: path.clone(),
                message: "reordered children".to_owned(),
            });
        }
        repair(root, &path, &mut findings);
        if strict && !findings.is_empty() {
            let messages: Vec<String> = findings.iter().map(Finding::to_string).collect();
            return Err(Error::InvalidCRSError(messages.join("; ")));
        }
        for finding in &findings {
            warn!("{}", finding);
        }
        *self = copy;
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE_PROJCS: &str = r#"PROJCS["bare",PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",3],GEOGCS["g",DATUM["d",SPHEROID["s",6378137,298.257223563]]]]"#;

    #[test]
    fn builtin_definitions_are_clean() {
        for code in [4326, 32633, 3857, 27700, 4978, 5703] {
            let report = SpatialReference::from_epsg(code).unwrap().validate();
            assert!(report.is_clean(), "{}: {:?}", code, report.findings);
        }
    }

    #[test]
    fn reports_missing_and_bad_nodes() {
        let srs = SpatialReference::from_wkt(BARE_PROJCS).unwrap();
        let report = srs.validate();
        let errors: Vec<&str> = report.errors().map(|f| f.message.as_str()).collect();
        assert!(errors.contains(&"UNIT is missing"));
        assert!(errors.contains(&"PRIMEM is missing"));
        assert!(report.findings.iter().any(|f| f.message == "children are out of order"));
        assert!(matches!(report.into_result(false), Err(Error::InvalidCRSError(_))));

        let srs = SpatialReference::from_wkt(
            r#"GEOGCS["g",DATUM["d",SPHEROID["s",-1,298.3],TOWGS84[1,2]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AXIS["Lat",SIDEWAYS]]"#,
        )
        .unwrap();
        let report = srs.validate();
        assert_eq!(report.errors().count(), 3, "{:?}", report.findings);
    }

    #[test]
    fn missing_geogcs_is_only_a_warning() {
        let srs = SpatialReference::from_wkt(
            r#"PROJCS["p",PROJECTION["Mollweide"],PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],UNIT["metre",1]]"#,
        )
        .unwrap();
        let report = srs.validate();
        assert_eq!(report.errors().count(), 0);
        assert!(report.findings.iter().any(|f| f.message == "GEOGCS is missing"));
        assert!(report.findings.iter().any(|f| f.message.contains("scale_factor is not a parameter")));
        assert!(report.clone().into_result(Strictness::Lenient).is_ok());
        assert!(report.into_result(Strictness::Strict).is_err());
    }

    #[test]
    fn compound_needs_one_horizontal_and_one_vertical() {
        let horizontal = SpatialReference::from_epsg(4326).unwrap().to_wkt().unwrap();
        let vertical = SpatialReference::from_epsg(5703).unwrap().to_wkt().unwrap();
        let compound = |members: &[&str]| {
            SpatialReference::from_wkt(&format!("COMPD_CS[\"c\",{}]", members.join(","))).unwrap()
        };

        let good = compound(&[&horizontal, &vertical]);
        assert!(good.validate().is_clean(), "{:?}", good.validate().findings);

        for (members, message) in [
            (vec![horizontal.as_str()], "1 coordinate systems, expected a horizontal one and a VERT_CS"),
            (
                vec![horizontal.as_str(), vertical.as_str(), vertical.as_str()],
                "3 coordinate systems, expected a horizontal one and a VERT_CS",
            ),
            (vec![horizontal.as_str(), horizontal.as_str()], "second member is not a VERT_CS"),
            (vec![vertical.as_str(), vertical.as_str()], "horizontal system is missing"),
        ] {
            let report = compound(&members).validate();
            let errors: Vec<&str> = report.errors().map(|f| f.message.as_str()).collect();
            assert_eq!(errors, vec![message], "{:?}", report.findings);
            assert!(matches!(report.into_result(Strictness::Lenient), Err(Error::InvalidCRSError(_))));
        }
    }

    #[test]
    fn projected_takes_a_single_geogcs() {
        let mut srs = SpatialReference::from_epsg(32633).unwrap();
        let geogcs = srs.geog_cs().unwrap().clone();
        srs.root_mut().unwrap().insert_child(geogcs);
        let report = srs.validate();
        let errors: Vec<&str> = report.errors().map(|f| f.message.as_str()).collect();
        assert_eq!(errors, vec!["2 GEOGCS, expected one"]);
        assert!(matches!(report.into_result(false), Err(Error::InvalidCRSError(_))));
    }

    #[test]
    fn fixup_inserts_sentinels_in_order() {
        let mut srs = SpatialReference::from_wkt(BARE_PROJCS).unwrap();
        let findings = srs.fixup(false).unwrap();
        assert_eq!(findings.len(), 4);
        assert_eq!(
            srs.to_wkt().unwrap(),
            r#"PROJCS["bare",GEOGCS["g",DATUM["d",SPHEROID["s",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",3],UNIT["metre",1]]"#
        );
        assert!(srs.validate().errors().next().is_none());
        assert!(srs.fixup(true).unwrap().is_empty());
    }

    #[test]
    fn strict_fixup_leaves_the_tree_alone() {
        let mut srs = SpatialReference::from_wkt(BARE_PROJCS).unwrap();
        let before = srs.clone();
        assert!(matches!(srs.fixup(Strictness::Strict), Err(Error::InvalidCRSError(_))));
        assert_eq!(srs, before);
    }

    #[test]
    fn ordering_only() {
        let mut srs = SpatialReference::from_wkt(BARE_PROJCS).unwrap();
        assert!(srs.fixup_ordering().unwrap());
        assert!(srs.to_wkt().unwrap().starts_with("PROJCS[\"bare\",GEOGCS["));
        assert!(!srs.fixup_ordering().unwrap());
        assert!(SpatialReference::new().fixup_ordering().is_err());
    }
}
