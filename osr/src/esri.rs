//! ESRI flavoured WKT and the old line based `.prj` files.
//!
//! ESRI WKT is the same grammar with different names: `GCS_` and `D_` prefixes,
//! its own projection and unit spellings, capitalized parameters and no
//! AUTHORITY, AXIS, TOWGS84 or EXTENSION nodes. The morphs rename in place and
//! lose whatever ESRI has no place for.
use crate::datums::{datum_by_name, ellipsoid_by_name, GeogCs};
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use crate::wkt;
use log::{debug, trace, warn};
use osr_core::names::{param::*, proj::*};
use osr_core::node::{Node, NodeKind, SrsNode};
use osr_core::units::{self, US_FOOT_TO_METRE};

/// WKT method and the ESRI name it is written as. The first entry for an ESRI
/// name is the one it reads back as.
const PROJECTION_NAMES: &[(&str, &str)] = &[
    (ALBERS_CONIC_EQUAL_AREA, "Albers"),
    (CASSINI_SOLDNER, "Cassini"),
    (EQUIRECTANGULAR, "Equidistant_Cylindrical"),
    (HOTINE_OBLIQUE_MERCATOR, "Hotine_Oblique_Mercator_Azimuth_Natural_Origin"),
    (LAMBERT_CONFORMAL_CONIC_2SP, "Lambert_Conformal_Conic"),
    (LAMBERT_CONFORMAL_CONIC_1SP, "Lambert_Conformal_Conic"),
    (MERCATOR_1SP, "Mercator"),
    (MERCATOR_2SP, "Mercator"),
    (OBLIQUE_STEREOGRAPHIC, "Double_Stereographic"),
    (POLAR_STEREOGRAPHIC, "Stereographic_North_Pole"),
    (POLAR_STEREOGRAPHIC, "Stereographic_South_Pole"),
    (VAN_DER_GRINTEN, "Van_der_Grinten_I"),
    (IMW_POLYCONIC, "International_Map_of_the_World_Polyconic"),
];

/// Parameters ESRI calls something else, per WKT method.
const PARAMETER_NAMES: &[(&str, &str, &str)] = &[
    (ALBERS_CONIC_EQUAL_AREA, LATITUDE_OF_CENTER, "Latitude_Of_Origin"),
    (ALBERS_CONIC_EQUAL_AREA, LONGITUDE_OF_CENTER, "Central_Meridian"),
    (LAMBERT_AZIMUTHAL_EQUAL_AREA, LATITUDE_OF_CENTER, "Latitude_Of_Origin"),
    (LAMBERT_AZIMUTHAL_EQUAL_AREA, LONGITUDE_OF_CENTER, "Central_Meridian"),
    (POLAR_STEREOGRAPHIC, LATITUDE_OF_ORIGIN, "Standard_Parallel_1"),
];

/// The WKT method for an ESRI projection name. Anything else comes back as is.
pub fn wkt_projection_name(name: &str) -> String {
    PROJECTION_NAMES
        .iter()
        .find(|(_, esri)| esri.eq_ignore_ascii_case(name))
        .map(|(wkt, _)| (*wkt).to_owned())
        .unwrap_or_else(|| name.to_owned())
}

pub fn esri_projection_name(name: &str) -> &str {
    PROJECTION_NAMES
        .iter()
        .find(|(wkt, _)| wkt.eq_ignore_ascii_case(name))
        .map(|(_, esri)| *esri)
        .unwrap_or(name)
}

/// Non alphanumeric runs become one `_`.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_owned()
}

fn capitalize(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

fn parameters_mut(projcs: &mut Node) -> impl Iterator<Item = &mut Node> {
    projcs.children.iter_mut().filter_map(|c| match c {
        SrsNode::Known(n) if n.kind == NodeKind::Parameter => Some(n),
        _ => None,
    })
}

fn has_parameter(projcs: &Node, name: &str) -> bool {
    parameter_value(projcs, name).is_some()
}

fn parameter_value(projcs: &Node, name: &str) -> Option<f64> {
    projcs
        .children_of(NodeKind::Parameter)
        .find(|p| p.name().map(|n| n.eq_ignore_ascii_case(name)).unwrap_or(false))
        .and_then(|p| p.attr_f64(1))
}

fn projection_to_esri(projcs: &mut Node) {
    let method = match projcs.child(NodeKind::Projection).and_then(Node::name) {
        Some(m) => wkt_projection_name(m),
        None => return,
    };
    let esri = if method.eq_ignore_ascii_case(POLAR_STEREOGRAPHIC) {
        let lat = parameter_value(projcs, LATITUDE_OF_ORIGIN)
            .or_else(|| parameter_value(projcs, STANDARD_PARALLEL_1))
            .unwrap_or(90.0);
        if lat < 0.0 {
            "Stereographic_South_Pole".to_owned()
        } else {
            "Stereographic_North_Pole".to_owned()
        }
    } else {
        esri_projection_name(&method).to_owned()
    };
    for param in parameters_mut(projcs) {
        let name = param.name().unwrap_or("").to_owned();
        let renamed = PARAMETER_NAMES
            .iter()
            .find(|(m, wkt, _)| m.eq_ignore_ascii_case(&method) && *wkt == name)
            .map(|(_, _, esri)| (*esri).to_owned())
            .unwrap_or_else(|| capitalize(&name));
        param.set_name(&renamed);
    }
    if let Some(projection) = projcs.child_mut(NodeKind::Projection) {
        projection.set_name(&esri);
    }
}

fn projection_from_esri(projcs: &mut Node) {
    let esri = match projcs.child(NodeKind::Projection).and_then(Node::name) {
        Some(m) => m.to_owned(),
        None => return,
    };
    let method = if esri.eq_ignore_ascii_case("Lambert_Conformal_Conic") {
        if has_parameter(projcs, STANDARD_PARALLEL_2) {
            LAMBERT_CONFORMAL_CONIC_2SP.to_owned()
        } else {
            LAMBERT_CONFORMAL_CONIC_1SP.to_owned()
        }
    } else if esri.eq_ignore_ascii_case("Mercator") {
        if has_parameter(projcs, STANDARD_PARALLEL_1) {
            MERCATOR_2SP.to_owned()
        } else {
            MERCATOR_1SP.to_owned()
        }
    } else {
        wkt_projection_name(&esri)
    };
    for param in parameters_mut(projcs) {
        let name = param.name().unwrap_or("").to_owned();
        let renamed = PARAMETER_NAMES
            .iter()
            .find(|(m, _, e)| m.eq_ignore_ascii_case(&method) && e.eq_ignore_ascii_case(&name))
            .map(|(_, wkt, _)| (*wkt).to_owned())
            .unwrap_or_else(|| name.to_ascii_lowercase());
        param.set_name(&renamed);
    }
    if method == LAMBERT_CONFORMAL_CONIC_1SP && has_parameter(projcs, STANDARD_PARALLEL_1) {
        if has_parameter(projcs, LATITUDE_OF_ORIGIN) {
            projcs.children.retain(|c| match c {
                SrsNode::Known(n) => {
                    !(n.kind == NodeKind::Parameter && n.name() == Some(STANDARD_PARALLEL_1))
                }
                SrsNode::Opaque(_) => true,
            });
        } else if let Some(p) = parameters_mut(projcs).find(|p| p.name() == Some(STANDARD_PARALLEL_1)) {
            p.set_name(LATITUDE_OF_ORIGIN);
        }
    }
    if let Some(projection) = projcs.child_mut(NodeKind::Projection) {
        projection.set_name(&method);
    }
}

fn morph_node_to_esri(node: &mut Node) {
    match node.kind {
        NodeKind::Geogcs => {
            let datum = node
                .child(NodeKind::Datum)
                .and_then(Node::name)
                .and_then(datum_by_name);
            let name = node.name().unwrap_or("unknown");
            let esri = match datum {
                Some(d) => format!("GCS_{}", d.esri.trim_start_matches("D_")),
                None if name.starts_with("GCS_") => sanitize(name),
                None => format!("GCS_{}", sanitize(name)),
            };
            node.set_name(&esri);
        }
        NodeKind::Datum => {
            let name = node.name().unwrap_or("unknown");
            let esri = match datum_by_name(name) {
                Some(d) => d.esri.to_owned(),
                None if name.starts_with("D_") => sanitize(name),
                None => format!("D_{}", sanitize(name)),
            };
            node.set_name(&esri);
        }
        NodeKind::Spheroid => {
            let name = node.name().unwrap_or("unknown");
            let esri = match ellipsoid_by_name(name) {
                Some(e) => e.esri.to_owned(),
                None => sanitize(name),
            };
            node.set_name(&esri);
        }
        NodeKind::Unit => {
            if let Some(unit) = node.name().and_then(units::lookup) {
                node.set_name(unit.esri);
            }
        }
        NodeKind::Projcs | NodeKind::Primem => {
            let name = sanitize(node.name().unwrap_or("unnamed"));
            node.set_name(&name);
            if node.kind == NodeKind::Projcs {
                projection_to_esri(node);
            }
        }
        _ => {}
    }
}

fn morph_node_from_esri(node: &mut Node) {
    match node.kind {
        NodeKind::Geogcs => {
            let datum = node
                .child(NodeKind::Datum)
                .and_then(Node::name)
                .and_then(datum_by_name);
            let name = node.name().unwrap_or("unknown");
            let wkt = match datum {
                Some(d) => d.geogcs_name.to_owned(),
                None => name.strip_prefix("GCS_").unwrap_or(name).to_owned(),
            };
            node.set_name(&wkt);
        }
        NodeKind::Datum => {
            let name = node.name().unwrap_or("unknown");
            let wkt = match datum_by_name(name) {
                Some(d) => d.name.to_owned(),
                None => name.strip_prefix("D_").unwrap_or(name).to_owned(),
            };
            node.set_name(&wkt);
        }
        NodeKind::Spheroid => {
            if let Some(e) = node.name().and_then(ellipsoid_by_name) {
                node.set_name(e.name);
            }
        }
        NodeKind::Unit => {
            if let Some(unit) = node.name().and_then(units::lookup) {
                node.set_name(unit.name);
            }
        }
        NodeKind::Projcs => projection_from_esri(node),
        _ => {}
    }
}

impl SpatialReference {
    /// Rewrites the tree into ESRI's names. Applying it twice changes nothing
    /// more.
    pub fn morph_to_esri(&mut self) -> Result<()> {
        let root = self.root_mut().ok_or(Error::MissingNodeError("root"))?;
        root.strip(&[
            NodeKind::Authority,
            NodeKind::Axis,
            NodeKind::Towgs84,
            NodeKind::Extension,
        ]);
        root.visit_mut(&mut morph_node_to_esri);
        debug!("morphed to ESRI names");
        Ok(())
    }

    /// Rewrites ESRI names back into the WKT names this crate uses.
    pub fn morph_from_esri(&mut self) -> Result<()> {
        let root = self.root_mut().ok_or(Error::MissingNodeError("root"))?;
        root.visit_mut(&mut morph_node_from_esri);
        debug!("morphed from ESRI names");
        Ok(())
    }

    /// ESRI WKT of this definition. The definition itself is left alone.
    pub fn to_esri(&self) -> Result<String> {
        let mut copy = self.clone();
        copy.morph_to_esri()?;
        copy.to_wkt()
    }

    /// Reads a `.prj` file: ESRI WKT, or the older keyword per line layout.
    pub fn from_esri(text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}').trim();
        if text.is_empty() {
            return Err(Error::parse("ESRI", "empty input"));
        }
        if text.contains('[') {
            let mut srs = SpatialReference::from_root(wkt::parse(text)?)?;
            srs.morph_from_esri()?;
            return Ok(srs);
        }
        parse_lines(text)
    }

    pub fn import_esri(&mut self, text: &str) -> Result<()> {
        *self = SpatialReference::from_esri(text)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PrjFile {
    projection: Option<String>,
    zone: Option<i32>,
    datum: Option<String>,
    spheroid: Option<String>,
    units: Option<String>,
    parameters: Vec<f64>,
}

/// One `Parameters` line: decimal degrees (or a plain value), or `D M S`.
fn parse_prj_value(line: &str) -> Option<f64> {
    let values: Vec<f64> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [v] => Some(*v),
        [d, m, s] => {
            let sign = if *d < 0.0 || line.trim_start().starts_with('-') { -1.0 } else { 1.0 };
            Some(sign * (d.abs() + m / 60.0 + s / 3600.0))
        }
        _ => None,
    }
}

fn read_prj(text: &str) -> Result<PrjFile> {
    let mut prj = PrjFile::default();
    let mut in_parameters = false;
    for (number, raw) in text.lines().enumerate() {
        let line = raw.split("/*").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if in_parameters {
            if let Some(v) = parse_prj_value(line) {
                prj.parameters.push(v);
                continue;
            }
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let key = parts.next().unwrap_or("").to_ascii_uppercase();
        let value = parts.next().unwrap_or("").trim().to_owned();
        trace!("prj line {}: {} = {}", number + 1, key, value);
        match key.as_str() {
            "PROJECTION" => prj.projection = Some(value.to_ascii_uppercase()),
            "ZONE" => {
                let zone = value.parse().map_err(|_| {
                    Error::parse_at("ESRI", &format!("bad zone {:?}", value), text, offset_of(text, raw))
                })?;
                prj.zone = Some(zone);
            }
            "DATUM" => prj.datum = Some(value),
            "SPHEROID" => prj.spheroid = Some(value),
            "UNITS" => prj.units = Some(value.to_ascii_uppercase()),
            "PARAMETERS" => in_parameters = true,
            "ZUNITS" | "XSHIFT" | "YSHIFT" | "QUADRANT" => {}
            _ => warn!("ignoring prj line {:?}", line),
        }
    }
    Ok(prj)
}

fn offset_of(text: &str, line: &str) -> usize {
    (line.as_ptr() as usize).saturating_sub(text.as_ptr() as usize)
}

fn prj_ellipsoid(name: &str) -> Option<&'static str> {
    let canonical = match name.to_ascii_uppercase().replace(' ', "").as_str() {
        "CLARKE1866" => "Clarke 1866",
        "CLARKE1880" => "Clarke 1880 (RGS)",
        "GRS80" | "GRS1980" => "GRS 1980",
        "WGS84" => "WGS 84",
        "WGS72" => "WGS 72",
        "INTERNATIONAL1909" | "INTERNATIONAL1924" | "INTERNATIONAL" => "International 1924",
        "BESSEL" => "Bessel 1841",
        "AIRY" => "Airy 1830",
        "KRASOVSKY" => "Krassowsky 1940",
        _ => return ellipsoid_by_name(name).map(|e| e.name),
    };
    Some(canonical)
}

fn parse_lines(text: &str) -> Result<SpatialReference> {
    let prj = read_prj(text)?;
    let mut srs = SpatialReference::new();

    match prj.datum.as_deref().map(str::to_ascii_uppercase).as_deref() {
        Some(datum @ ("WGS84" | "WGS72" | "NAD27" | "NAD83")) => srs.set_well_known_geog_cs(datum)?,
        _ => match prj.spheroid.as_deref().and_then(prj_ellipsoid).and_then(ellipsoid_by_name) {
            Some(e) => srs.set_geog_cs(&GeogCs {
                name: "unknown",
                spheroid: e.name,
                semi_major: e.semi_major,
                inverse_flattening: e.inverse_flattening,
                ..GeogCs::default()
            })?,
            None => {
                warn!("prj file has no usable datum or spheroid, assuming WGS84");
                srs.set_well_known_geog_cs("WGS84")?;
            }
        },
    }

    let projection = prj
        .projection
        .clone()
        .ok_or_else(|| Error::parse("ESRI", "missing Projection line"))?;
    let p = &prj.parameters;
    let need = |n: usize| -> Result<()> {
        if p.len() < n {
            Err(Error::parse(
                "ESRI",
                &format!("{} needs {} parameters, found {}", projection, n, p.len()),
            ))
        } else {
            Ok(())
        }
    };
    match projection.as_str() {
        "GEOGRAPHIC" => return Ok(srs),
        "UTM" => {
            let zone = prj
                .zone
                .ok_or_else(|| Error::parse("ESRI", "UTM without a Zone line"))?;
            srs.set_utm(zone.abs(), zone > 0)?;
            if let Some((name, factor)) = prj_units(prj.units.as_deref()) {
                srs.set_linear_units_and_update_parameters(name, factor)?;
            }
            return Ok(srs);
        }
        "TRANSVERSE" => {
            need(5)?;
            srs.set_tm(p[2], p[1], p[0], p[3], p[4])?;
        }
        "ALBERS" => {
            need(6)?;
            srs.set_acea(p[0], p[1], p[3], p[2], p[4], p[5])?;
        }
        "LAMBERT" => {
            need(6)?;
            srs.set_lcc(p[0], p[1], p[3], p[2], p[4], p[5])?;
        }
        other => {
            return Err(Error::parse(
                "ESRI",
                &format!("unsupported prj projection {}", other),
            ))
        }
    }
    // false easting and northing are already in the file's units
    if let Some((name, factor)) = prj_units(prj.units.as_deref()) {
        srs.set_linear_units(name, factor)?;
    }
    Ok(srs)
}

fn prj_units(units: Option<&str>) -> Option<(&'static str, f64)> {
    match units? {
        "FEET" | "FOOT" => Some(("US survey foot", US_FOOT_TO_METRE)),
        other => units::lookup(other).map(|u| (u.name, u.factor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn utm33() -> SpatialReference {
        let mut srs = SpatialReference::from_epsg(32633).unwrap();
        srs.set_towgs84([1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        srs
    }

    #[test]
    fn morph_to_esri_names() {
        let mut srs = utm33();
        srs.morph_to_esri().unwrap();
        let wkt = srs.to_wkt().unwrap();
        assert!(wkt.starts_with("PROJCS[\"WGS_84_UTM_zone_33N\",GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\""));
        assert!(wkt.contains("PARAMETER[\"Central_Meridian\",15]"));
        assert!(wkt.contains("UNIT[\"Meter\",1]"));
        assert!(!wkt.contains("AUTHORITY"));
        assert!(!wkt.contains("TOWGS84"));
        assert!(!wkt.contains("AXIS"));
    }

    #[test]
    fn morph_to_esri_is_idempotent() {
        let mut albers = SpatialReference::new();
        albers.set_well_known_geog_cs("NAD83").unwrap();
        albers.set_acea(29.5, 45.5, 23.0, -96.0, 0.0, 0.0).unwrap();
        let mut polar = SpatialReference::new();
        polar.set_well_known_geog_cs("WGS84").unwrap();
        polar.set_ps(-71.0, 0.0, 1.0, 0.0, 0.0).unwrap();

        for mut srs in [utm33(), albers, polar] {
            srs.morph_to_esri().unwrap();
            let once = srs.clone();
            srs.morph_to_esri().unwrap();
            assert_eq!(srs, once);
        }
    }

    #[test]
    fn esri_round_trip_is_same() {
        let mut albers = SpatialReference::new();
        albers.set_well_known_geog_cs("NAD83").unwrap();
        albers.set_acea(29.5, 45.5, 23.0, -96.0, 0.0, 0.0).unwrap();
        let esri = albers.to_esri().unwrap();
        assert!(esri.contains("PROJECTION[\"Albers\"]"));
        assert!(esri.contains("PARAMETER[\"Latitude_Of_Origin\",23]"));
        let back = SpatialReference::from_esri(&esri).unwrap();
        assert_eq!(back.projection(), Some(ALBERS_CONIC_EQUAL_AREA));
        assert_eq!(back.geog_cs().unwrap().name(), Some("NAD83"));
        assert!(back.is_same(&albers));
    }

    #[test]
    fn polar_stereographic_hemisphere() {
        let mut srs = SpatialReference::new();
        srs.set_well_known_geog_cs("WGS84").unwrap();
        srs.set_ps(-71.0, 0.0, 1.0, 0.0, 0.0).unwrap();
        let esri = srs.to_esri().unwrap();
        assert!(esri.contains("Stereographic_South_Pole"));
        assert!(esri.contains("PARAMETER[\"Standard_Parallel_1\",-71]"));
        let back = SpatialReference::from_esri(&esri).unwrap();
        assert_eq!(back.projection(), Some(POLAR_STEREOGRAPHIC));
        assert_eq!(back.projection_parameter(LATITUDE_OF_ORIGIN), Some(-71.0));
    }

    #[test]
    fn ambiguous_esri_methods() {
        let lcc = "PROJCS[\"x\",GEOGCS[\"GCS_North_American_1983\",DATUM[\"D_North_American_1983\",SPHEROID[\"GRS_1980\",6378137,298.257222101]],PRIMEM[\"Greenwich\",0],UNIT[\"Degree\",0.017453292519943295]],PROJECTION[\"Lambert_Conformal_Conic\"],PARAMETER[\"False_Easting\",0],PARAMETER[\"False_Northing\",0],PARAMETER[\"Central_Meridian\",-96],PARAMETER[\"Standard_Parallel_1\",33],PARAMETER[\"Standard_Parallel_2\",45],PARAMETER[\"Latitude_Of_Origin\",39],UNIT[\"Meter\",1]]";
        let srs = SpatialReference::from_esri(lcc).unwrap();
        assert_eq!(srs.projection(), Some(LAMBERT_CONFORMAL_CONIC_2SP));
        assert_eq!(srs.projection_parameter(STANDARD_PARALLEL_2), Some(45.0));
        assert_eq!(srs.datum().unwrap().name(), Some("North_American_Datum_1983"));
        assert_eq!(srs.angular_units().0, "degree");
        assert_eq!(wkt_projection_name("Mercator"), MERCATOR_1SP);
        assert_eq!(wkt_projection_name("Transverse_Mercator"), TRANSVERSE_MERCATOR);
    }

    #[test]
    fn old_style_prj() {
        let text = "Projection    UTM\nZone          17\nDatum         NAD83\nSpheroid      GRS80\nUnits         METERS\nZunits        NO\nXshift        0.0\nYshift        0.0\nParameters\n";
        let srs = SpatialReference::from_esri(text).unwrap();
        assert_eq!(srs.utm_zone(), Some((17, true)));
        assert_eq!(srs.geog_cs().unwrap().name(), Some("NAD83"));

        let albers = "Projection ALBERS\nDatum NAD27\nUnits FEET\nParameters\n29 30 0.0 /* 1st standard parallel\n45 30 0.0 /* 2nd standard parallel\n-96 0 0.0 /* central meridian\n23 0 0.0 /* latitude of origin\n0.0 /* false easting\n0.0 /* false northing\n";
        let srs = SpatialReference::from_esri(albers).unwrap();
        assert_eq!(srs.projection(), Some(ALBERS_CONIC_EQUAL_AREA));
        assert_relative_eq!(srs.projection_parameter(STANDARD_PARALLEL_1).unwrap(), 29.5);
        assert_relative_eq!(srs.projection_parameter(LONGITUDE_OF_CENTER).unwrap(), -96.0);
        assert_relative_eq!(srs.linear_units().1, US_FOOT_TO_METRE);
    }

    #[test]
    fn bad_prj_files() {
        assert!(matches!(SpatialReference::from_esri(""), Err(Error::ParseError { .. })));
        assert!(SpatialReference::from_esri("Projection STATEPLANE\nFipszone 3301\n").is_err());
        assert!(SpatialReference::from_esri("Projection TRANSVERSE\nParameters\n0.9996\n").is_err());
    }
}
