//! GML 3.1.1 `GeographicCRS` and `ProjectedCRS` documents.
//!
//! Methods and parameters are written with EPSG urns when they have an EPSG
//! code and with `urn:ogc:def:...:OGC::<wkt name>` otherwise. Both forms are
//! accepted on import.
use crate::datums::GeogCs;
use crate::result::{BoxError, Error, Result};
use crate::srs::SpatialReference;
use log::{debug, trace};
use osr_core::catalog::{self, param_class, ParamClass};
use osr_core::names::{param::*, proj::*};
use osr_core::node::{Node, NodeKind};
use osr_core::number::{format_number, parse_number};
use osr_core::units::{self, factors_match, Unit, UnitKind, DEGREE_TO_RADIAN};

const FORMAT: &str = "XML";
/// Deepest element nesting the reader follows.
const MAX_DEPTH: usize = 64;

static METHOD_CODES: &[(&str, u32)] = &[
    (EQUIRECTANGULAR, 1028),
    (LAMBERT_CONFORMAL_CONIC_1SP, 9801),
    (LAMBERT_CONFORMAL_CONIC_2SP, 9802),
    (MERCATOR_1SP, 9804),
    (MERCATOR_2SP, 9805),
    (CASSINI_SOLDNER, 9806),
    (TRANSVERSE_MERCATOR, 9807),
    (OBLIQUE_STEREOGRAPHIC, 9809),
    (POLAR_STEREOGRAPHIC, 9810),
    (HOTINE_OBLIQUE_MERCATOR, 9812),
    (HOTINE_OBLIQUE_MERCATOR_AZIMUTH_CENTER, 9815),
    (POLYCONIC, 9818),
    (KROVAK, 9819),
    (LAMBERT_AZIMUTHAL_EQUAL_AREA, 9820),
    (ALBERS_CONIC_EQUAL_AREA, 9822),
    (ORTHOGRAPHIC, 9840),
];

/// Parameter codes used on export. Import also takes the false origin codes
/// (8821, 8822, 8826, 8827) and the method specific scale factors.
static PARAM_CODES: &[(&str, u32)] = &[
    (LATITUDE_OF_ORIGIN, 8801),
    (CENTRAL_MERIDIAN, 8802),
    (SCALE_FACTOR, 8805),
    (FALSE_EASTING, 8806),
    (FALSE_NORTHING, 8807),
    (LATITUDE_OF_CENTER, 8811),
    (LONGITUDE_OF_CENTER, 8812),
    (AZIMUTH, 8813),
    (RECTIFIED_GRID_ANGLE, 8814),
    (PSEUDO_STANDARD_PARALLEL_1, 8818),
    (STANDARD_PARALLEL_1, 8823),
    (STANDARD_PARALLEL_2, 8824),
];

static PARAM_ALIASES: &[(u32, &[&str])] = &[
    (8801, &[LATITUDE_OF_ORIGIN, LATITUDE_OF_CENTER]),
    (8802, &[CENTRAL_MERIDIAN, LONGITUDE_OF_CENTER]),
    (8815, &[SCALE_FACTOR]),
    (8819, &[SCALE_FACTOR]),
    (8821, &[LATITUDE_OF_ORIGIN, LATITUDE_OF_CENTER]),
    (8822, &[CENTRAL_MERIDIAN, LONGITUDE_OF_CENTER]),
    (8826, &[FALSE_EASTING]),
    (8827, &[FALSE_NORTHING]),
];

/// EPSG unit of measure codes.
static UOM_CODES: &[(u32, &str)] = &[
    (9001, "metre"),
    (9002, "foot"),
    (9003, "US survey foot"),
    (9036, "kilometre"),
    (9101, "radian"),
    (9102, "degree"),
    (9105, "grad"),
    (9122, "degree"),
];

const UNITY: u32 = 9201;

/// Fetches the document behind a url for [`SpatialReference::from_url`].
pub trait UrlFetcher {
    fn fetch(&self, url: &str) -> std::result::Result<String, BoxError>;
}

#[derive(Debug, Default, PartialEq)]
struct Element {
    /// local name, without the namespace prefix
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Depth first search of the descendants.
    fn find(&self, name: &str) -> Option<&Element> {
        for c in &self.children {
            if c.name == name {
                return Some(c);
            }
            if let Some(found) = c.find(name) {
                return Some(found);
            }
        }
        None
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn text_of(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim()).filter(|t| !t.is_empty())
    }
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse_at(FORMAT, message, self.text, self.pos)
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn skip_past(&mut self, end: &str) -> Result<()> {
        match self.rest().find(end) {
            Some(i) => {
                self.pos += i + end.len();
                Ok(())
            }
            None => Err(self.error(format!("unterminated markup, expected {:?}", end))),
        }
    }

    /// Skips whitespace, comments, processing instructions and doctype.
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.skip_ws();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("<!") && !rest.starts_with("<![CDATA[") {
                self.skip_past(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}", token)))
        }
    }

    fn name(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || "/>=".contains(c))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn element(&mut self, depth: usize) -> Result<Element> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.expect("<")?;
        let tag = self.name()?;
        let mut element = Element {
            name: local(tag).to_owned(),
            ..Element::default()
        };
        loop {
            self.skip_ws();
            if self.rest().starts_with("/>") {
                self.pos += 2;
                return Ok(element);
            }
            if self.rest().starts_with('>') {
                self.pos += 1;
                break;
            }
            let key = self.name()?;
            self.skip_ws();
            self.expect("=")?;
            self.skip_ws();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.error("expected a quoted attribute value")),
            };
            self.pos += 1;
            let end = self
                .rest()
                .find(quote)
                .ok_or_else(|| self.error("unterminated attribute value"))?;
            let value = unescape(&self.rest()[..end]);
            self.pos += end + 1;
            element.attrs.push((local(key).to_owned(), value));
        }
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("<{}> is never closed", tag)));
            }
            if rest.starts_with("</") {
                self.pos += 2;
                let closing = self.name()?;
                if closing != tag {
                    return Err(self.error(format!("</{}> closes <{}>", closing, tag)));
                }
                self.skip_ws();
                self.expect(">")?;
                return Ok(element);
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if let Some(cdata) = rest.strip_prefix("<![CDATA[") {
                let end = cdata
                    .find("]]>")
                    .ok_or_else(|| self.error("unterminated CDATA section"))?;
                element.text.push_str(&cdata[..end]);
                self.pos += "<![CDATA[".len() + end + 3;
            } else if rest.starts_with('<') {
                element.children.push(self.element(depth + 1)?);
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                element.text.push_str(&unescape(&rest[..end]));
                self.pos += end;
            }
        }
    }
}

fn parse_document(text: &str) -> Result<Element> {
    let mut reader = Reader { text, pos: 0 };
    reader.skip_misc()?;
    if !reader.rest().starts_with('<') {
        return Err(reader.error("expected an element"));
    }
    let root = reader.element(0)?;
    reader.skip_misc()?;
    if !reader.rest().is_empty() {
        return Err(reader.error("content after the document element"));
    }
    Ok(root)
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let end = match rest.find(';') {
            Some(end) => end,
            None => break,
        };
        let entity = &rest[1..end];
        let c = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match c {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

enum Code<'a> {
    Epsg(u32),
    Ogc(&'a str),
}

/// Splits `urn:ogc:def:<kind>:<authority>:<version>:<code>`.
fn urn_code<'a>(href: &'a str, kind: &str) -> Option<Code<'a>> {
    let parts: Vec<&str> = href.trim().split(':').collect();
    if parts.len() < 7 || !parts[3].eq_ignore_ascii_case(kind) {
        return None;
    }
    let code = parts[parts.len() - 1];
    match parts[4].to_ascii_uppercase().as_str() {
        "EPSG" => code.parse().ok().map(Code::Epsg),
        "OGC" => Some(Code::Ogc(code)),
        _ => None,
    }
}

fn method_from_href(href: &str) -> Result<&'static str> {
    let unknown = || Error::parse(FORMAT, format!("unsupported projection method {}", href));
    match urn_code(href, "method").ok_or_else(unknown)? {
        Code::Epsg(code) => METHOD_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(m, _)| *m)
            .ok_or_else(unknown),
        Code::Ogc(name) => catalog::method(name).map(|m| m.name).ok_or_else(unknown),
    }
}

fn parameter_from_href(href: &str, method: &str) -> Option<&'static str> {
    let descriptor = catalog::method(method)?;
    match urn_code(href, "parameter")? {
        Code::Epsg(code) => PARAM_ALIASES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, names)| *names)
            .or_else(|| {
                PARAM_CODES
                    .iter()
                    .find(|(_, c)| *c == code)
                    .map(|(name, _)| std::slice::from_ref(name))
            })?
            .iter()
            .copied()
            .find(|name| descriptor.takes(name)),
        Code::Ogc(name) => descriptor.params.iter().copied().find(|p| p.eq_ignore_ascii_case(name)),
    }
}

/// `None` for unity.
fn uom_unit(uom: &str) -> Result<Option<&'static Unit>> {
    let unit = match urn_code(uom, "uom") {
        Some(Code::Epsg(UNITY)) => return Ok(None),
        Some(Code::Epsg(code)) => UOM_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .and_then(|(_, name)| units::lookup(name)),
        Some(Code::Ogc(name)) => units::lookup(name),
        None => units::lookup(uom),
    };
    unit.map(Some)
        .ok_or_else(|| Error::UnitUnknownError(uom.to_owned()))
}

fn uom_code(kind: UnitKind, factor: f64) -> Option<u32> {
    UOM_CODES.iter().find_map(|(code, name)| {
        units::lookup(name)
            .filter(|u| u.kind == kind && factors_match(u.factor, factor))
            .map(|_| *code)
    })
}

/// A measure converted to radians or metres.
fn measure(element: &Element) -> Result<f64> {
    let value = parse_number(&element.text)
        .ok_or_else(|| Error::parse(FORMAT, format!("<{}> is not a number", element.name)))?;
    match element.attr("uom") {
        Some(uom) => Ok(uom_unit(uom)?.map(|u| value * u.factor).unwrap_or(value)),
        None => Ok(value),
    }
}

fn required<'a>(parent: &'a Element, name: &'static str) -> Result<&'a Element> {
    parent
        .find(name)
        .ok_or_else(|| Error::parse(FORMAT, format!("<{}> has no <{}>", parent.name, name)))
}

fn epsg_id(element: &Element, id: &str) -> Option<i64> {
    let name = element.child(id)?.child("name")?;
    let space = name.attr("codeSpace").unwrap_or("");
    if !space.to_ascii_uppercase().contains("EPSG") {
        return None;
    }
    name.text.trim().parse().ok()
}

/// Unit and axes of the first coordinate system of kind `cs` below `element`.
fn coordinate_system(element: &Element, cs: &str) -> Result<(Option<&'static Unit>, Vec<(String, String)>)> {
    let cs = match element.find(cs) {
        Some(cs) => cs,
        None => return Ok((None, Vec::new())),
    };
    let mut unit = None;
    let mut axes = Vec::new();
    for uses in cs.children_named("usesAxis") {
        if let Some(axis) = uses.child("CoordinateSystemAxis") {
            if unit.is_none() {
                if let Some(uom) = axis.attr("uom") {
                    unit = uom_unit(uom)?;
                }
            }
            let name = axis.text_of("name").unwrap_or("").to_owned();
            let direction = axis.text_of("axisDirection").unwrap_or("").to_ascii_uppercase();
            axes.push((name, direction));
        }
    }
    Ok((unit, axes))
}

fn is_default_axes(axes: &[(String, String)], defaults: &[(&str, &str)]) -> bool {
    axes.is_empty()
        || (axes.len() == defaults.len()
            && axes
                .iter()
                .zip(defaults)
                .all(|((n, d), (dn, dd))| n.eq_ignore_ascii_case(dn) && d.eq_ignore_ascii_case(dd)))
}

const GEOGRAPHIC_AXES: [(&str, &str); 2] = [("Geodetic latitude", "north"), ("Geodetic longitude", "east")];
const PROJECTED_AXES: [(&str, &str); 2] = [("Easting", "east"), ("Northing", "north")];

fn read_geographic(element: &Element) -> Result<SpatialReference> {
    let datum = required(element, "GeodeticDatum")?;
    let ellipsoid = required(datum, "Ellipsoid")?;
    let semi_major = measure(required(ellipsoid, "semiMajorAxis")?)?;
    let inverse_flattening = if let Some(rf) = ellipsoid.find("inverseFlattening") {
        measure(rf)?
    } else if let Some(b) = ellipsoid.find("semiMinorAxis") {
        let b = measure(b)?;
        if (semi_major - b).abs() < 1e-9 {
            0.0
        } else {
            semi_major / (semi_major - b)
        }
    } else if ellipsoid.find("isSphere").is_some() {
        0.0
    } else {
        return Err(Error::parse(FORMAT, "ellipsoid without a second defining parameter"));
    };
    let (unit, axes) = coordinate_system(element, "EllipsoidalCS")?;
    let (unit_name, unit_factor) = unit
        .filter(|u| u.kind == UnitKind::Angular)
        .map(|u| (u.name, u.factor))
        .unwrap_or(("degree", DEGREE_TO_RADIAN));
    let meridian = datum.find("PrimeMeridian");
    let pm_radians = match meridian.and_then(|m| m.find("angle")) {
        Some(angle) => measure(angle)?,
        None => 0.0,
    };
    let mut srs = SpatialReference::new();
    srs.set_geog_cs(&GeogCs {
        name: element.text_of("srsName").unwrap_or("unnamed"),
        datum: datum.text_of("datumName").unwrap_or("unknown"),
        spheroid: ellipsoid.text_of("ellipsoidName").unwrap_or("unnamed"),
        semi_major,
        inverse_flattening,
        prime_meridian: meridian
            .and_then(|m| m.text_of("meridianName"))
            .unwrap_or("Greenwich"),
        pm_offset: pm_radians / unit_factor,
        angular_unit: unit_name,
        angular_factor: unit_factor,
    })?;
    if let Some(code) = epsg_id(ellipsoid, "ellipsoidID") {
        srs.set_authority(Some("SPHEROID"), "EPSG", code)?;
    }
    if let Some(code) = meridian.and_then(|m| epsg_id(m, "meridianID")) {
        srs.set_authority(Some("PRIMEM"), "EPSG", code)?;
    }
    if let Some(code) = epsg_id(datum, "datumID") {
        srs.set_authority(Some("DATUM"), "EPSG", code)?;
    }
    if let Some(code) = epsg_id(element, "srsID") {
        srs.set_authority(None, "EPSG", code)?;
    }
    if !is_default_axes(&axes, &GEOGRAPHIC_AXES) {
        let axes: Vec<(&str, &str)> = axes.iter().map(|(n, d)| (n.as_str(), d.as_str())).collect();
        srs.set_axes(None, &axes)?;
    }
    Ok(srs)
}

fn read_projected(element: &Element) -> Result<SpatialReference> {
    let mut srs = read_geographic(required(element, "GeographicCRS")?)?;
    let conversion = required(element, "Conversion")?;
    let href = conversion
        .child("usesMethod")
        .and_then(|m| m.attr("href"))
        .ok_or_else(|| Error::parse(FORMAT, "Conversion without usesMethod"))?;
    let method = method_from_href(href)?;
    srs.set_projected_cs(element.text_of("srsName").unwrap_or("unnamed"))?;
    srs.set_projection(method)?;

    let (unit, axes) = coordinate_system(element, "CartesianCS")?;
    if let Some(unit) = unit.filter(|u| u.kind == UnitKind::Linear) {
        srs.set_linear_units(unit.name, unit.factor)?;
    }
    for uses in conversion.children_named("usesValue") {
        let href = match uses.child("valueOfParameter").and_then(|p| p.attr("href")) {
            Some(href) => href,
            None => continue,
        };
        let param = match parameter_from_href(href, method) {
            Some(param) => param,
            None => {
                debug!("ignoring parameter {} of {}", href, method);
                continue;
            }
        };
        let value = measure(required(uses, "value")?)?;
        let value = match param_class(param) {
            ParamClass::Angular => value.to_degrees(),
            _ => value,
        };
        srs.set_parameter_degrees_metres(param, value)?;
    }
    if let Some(descriptor) = catalog::method(method) {
        for param in descriptor.params {
            if srs.projection_parameter(param).is_none() {
                let default = catalog::default_value(method, param).unwrap_or(0.0);
                srs.set_projection_parameter(param, default)?;
            }
        }
    }
    if let Some(code) = epsg_id(element, "srsID") {
        srs.set_authority(None, "EPSG", code)?;
    }
    if !is_default_axes(&axes, &PROJECTED_AXES) {
        let axes: Vec<(&str, &str)> = axes.iter().map(|(n, d)| (n.as_str(), d.as_str())).collect();
        srs.set_axes(None, &axes)?;
    }
    Ok(srs)
}

struct Writer {
    out: String,
    depth: usize,
    next_id: usize,
}

impl Writer {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn id(&mut self) -> String {
        self.next_id += 1;
        format!("ogrcrs{}", self.next_id)
    }

    fn start(&mut self, tag: &str, attrs: &[(&str, &str)], text: Option<&str>, close: bool) {
        self.indent();
        self.out.push_str("<gml:");
        self.out.push_str(tag);
        for (k, v) in attrs {
            self.out.push_str(&format!(" {}=\"{}\"", k, escape(v)));
        }
        match (text, close) {
            (Some(text), _) => self.out.push_str(&format!(">{}</gml:{}>\n", escape(text), tag)),
            (None, true) => self.out.push_str("/>\n"),
            (None, false) => {
                self.out.push_str(">\n");
                self.depth += 1;
            }
        }
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start(tag, attrs, None, false);
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.out.push_str(&format!("</gml:{}>\n", tag));
    }

    fn leaf(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        self.start(tag, attrs, Some(text), false);
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start(tag, attrs, None, true);
    }

    fn open_with_id(&mut self, tag: &str) {
        let id = self.id();
        self.open(tag, &[("gml:id", id.as_str())]);
    }

    fn epsg_id(&mut self, tag: &str, kind: &str, node: &Node) {
        let code = node
            .child(NodeKind::Authority)
            .filter(|a| a.name().map(|n| n.eq_ignore_ascii_case("EPSG")).unwrap_or(false))
            .and_then(|a| a.attr(1));
        if let Some(code) = code {
            let space = format!("urn:ogc:def:{}:EPSG::", kind);
            self.open(tag, &[]);
            self.leaf("name", &[("gml:codeSpace", space.as_str())], code);
            self.close(tag);
        }
    }

    fn measure(&mut self, tag: &str, uom: &str, value: f64) {
        self.leaf(tag, &[("gml:uom", uom)], &format_number(value));
    }

    fn axes(&mut self, cs: &str, cs_name: &str, uom: &str, axes: &[(String, String)]) {
        self.open(&format!("uses{}", cs), &[]);
        self.open_with_id(cs);
        self.leaf("csName", &[], cs_name);
        for (name, direction) in axes {
            self.open("usesAxis", &[]);
            let id = self.id();
            self.open("CoordinateSystemAxis", &[("gml:id", id.as_str()), ("gml:uom", uom)]);
            self.leaf("name", &[], name);
            let abbrev: String = name.chars().take(3).collect();
            self.leaf("axisAbbrev", &[], &abbrev);
            self.leaf("axisDirection", &[], &direction.to_ascii_lowercase());
            self.close("CoordinateSystemAxis");
            self.close("usesAxis");
        }
        self.close(cs);
        self.close(&format!("uses{}", cs));
    }
}

fn uom_urn(code: u32) -> String {
    format!("urn:ogc:def:uom:EPSG::{}", code)
}

fn axes_or(axes: Vec<(String, String)>, defaults: &[(&str, &str)]) -> Vec<(String, String)> {
    if axes.is_empty() {
        defaults
            .iter()
            .map(|(n, d)| (n.to_string(), d.to_string()))
            .collect()
    } else {
        axes
    }
}

impl SpatialReference {
    pub fn from_xml(text: &str) -> Result<Self> {
        let document = parse_document(text)?;
        trace!("GML document element <{}>", document.name);
        let crs = if matches!(document.name.as_str(), "ProjectedCRS" | "GeographicCRS") {
            &document
        } else {
            document
                .find("ProjectedCRS")
                .or_else(|| document.find("GeographicCRS"))
                .ok_or_else(|| Error::parse(FORMAT, "no GeographicCRS or ProjectedCRS element"))?
        };
        match crs.name.as_str() {
            "ProjectedCRS" => read_projected(crs),
            _ => read_geographic(crs),
        }
    }

    pub fn import_xml(&mut self, text: &str) -> Result<()> {
        *self = SpatialReference::from_xml(text)?;
        Ok(())
    }

    /// Fetches `url` and reads the result with [`set_from_user_input`](Self::set_from_user_input).
    pub fn from_url(url: &str, fetcher: &dyn UrlFetcher) -> Result<Self> {
        let text = fetcher.fetch(url).map_err(|source| Error::FetchError {
            url: url.to_owned(),
            source,
        })?;
        let mut srs = SpatialReference::new();
        srs.set_from_user_input(&text)?;
        Ok(srs)
    }

    pub fn to_xml(&self) -> Result<String> {
        let root = self.root_or_err()?;
        let mut w = Writer {
            out: String::new(),
            depth: 0,
            next_id: 0,
        };
        match root.kind {
            NodeKind::Geogcs => self.write_geographic(&mut w, true)?,
            NodeKind::Projcs => self.write_projected(&mut w)?,
            kind => return Err(Error::export(FORMAT, format!("{} has no GML form", kind))),
        }
        Ok(w.out)
    }

    fn write_geographic(&self, w: &mut Writer, document: bool) -> Result<()> {
        let geog = self
            .geog_cs()
            .ok_or_else(|| Error::export(FORMAT, "missing GEOGCS"))?;
        let datum = geog
            .child(NodeKind::Datum)
            .ok_or_else(|| Error::export(FORMAT, "missing DATUM"))?;
        let id = w.id();
        if document {
            w.open(
                "GeographicCRS",
                &[
                    ("xmlns:gml", "http://www.opengis.net/gml"),
                    ("gml:id", id.as_str()),
                ],
            );
        } else {
            w.open("GeographicCRS", &[("gml:id", id.as_str())]);
        }
        w.leaf("srsName", &[], geog.name().unwrap_or("unnamed"));
        w.epsg_id("srsID", "crs", geog);

        let (_, angular) = self.angular_units();
        let angle_uom = uom_urn(uom_code(UnitKind::Angular, angular).unwrap_or(9102));
        let to_uom = |radians: f64| {
            if uom_code(UnitKind::Angular, angular).is_some() {
                radians / angular
            } else {
                radians.to_degrees()
            }
        };
        let axes = if self.is_geographic() {
            self.axes(None)
        } else {
            self.axes(Some("GEOGCS"))
        };
        w.axes("EllipsoidalCS", "ellipsoidal", &angle_uom, &axes_or(axes, &GEOGRAPHIC_AXES));

        w.open("usesGeodeticDatum", &[]);
        w.open_with_id("GeodeticDatum");
        w.leaf("datumName", &[], datum.name().unwrap_or("unknown"));
        w.epsg_id("datumID", "datum", datum);

        let (pm_name, _) = self.prime_meridian();
        w.open("usesPrimeMeridian", &[]);
        w.open_with_id("PrimeMeridian");
        w.leaf("meridianName", &[], &pm_name);
        if let Some(pm) = geog.child(NodeKind::Primem) {
            w.epsg_id("meridianID", "meridian", pm);
        }
        w.open("greenwichLongitude", &[]);
        w.measure("angle", &angle_uom, to_uom(self.prime_meridian_degrees().to_radians()));
        w.close("greenwichLongitude");
        w.close("PrimeMeridian");
        w.close("usesPrimeMeridian");

        let spheroid = datum
            .child(NodeKind::Spheroid)
            .ok_or_else(|| Error::export(FORMAT, "missing SPHEROID"))?;
        w.open("usesEllipsoid", &[]);
        w.open_with_id("Ellipsoid");
        w.leaf("ellipsoidName", &[], spheroid.name().unwrap_or("unnamed"));
        w.epsg_id("ellipsoidID", "ellipsoid", spheroid);
        w.measure("semiMajorAxis", &uom_urn(9001), self.semi_major()?);
        w.open("secondDefiningParameter", &[]);
        w.measure("inverseFlattening", &uom_urn(UNITY), self.inverse_flattening()?);
        w.close("secondDefiningParameter");
        w.close("Ellipsoid");
        w.close("usesEllipsoid");
        w.close("GeodeticDatum");
        w.close("usesGeodeticDatum");
        w.close("GeographicCRS");
        Ok(())
    }

    fn write_projected(&self, w: &mut Writer) -> Result<()> {
        let projcs = self
            .proj_cs()
            .ok_or_else(|| Error::export(FORMAT, "missing PROJCS"))?;
        let method = self
            .projection()
            .ok_or_else(|| Error::export(FORMAT, "PROJCS without PROJECTION"))?;
        let descriptor = catalog::method(method)
            .ok_or_else(|| Error::export(FORMAT, format!("unknown projection method {}", method)))?;
        let id = w.id();
        w.open(
            "ProjectedCRS",
            &[
                ("xmlns:gml", "http://www.opengis.net/gml"),
                ("xmlns:xlink", "http://www.w3.org/1999/xlink"),
                ("gml:id", id.as_str()),
            ],
        );
        w.leaf("srsName", &[], projcs.name().unwrap_or("unnamed"));
        w.epsg_id("srsID", "crs", projcs);

        w.open("baseCRS", &[]);
        self.write_geographic(w, false)?;
        w.close("baseCRS");

        let (_, angular) = self.angular_units();
        let (_, linear) = self.linear_units();
        let angular_code = uom_code(UnitKind::Angular, angular);
        let linear_code = uom_code(UnitKind::Linear, linear);

        w.open("definedByConversion", &[]);
        w.open_with_id("Conversion");
        w.leaf("coordinateOperationName", &[], descriptor.name);
        let method_href = match METHOD_CODES.iter().find(|(m, _)| *m == descriptor.name) {
            Some((_, code)) => format!("urn:ogc:def:method:EPSG::{}", code),
            None => format!("urn:ogc:def:method:OGC::{}", descriptor.name),
        };
        w.empty("usesMethod", &[("xlink:href", method_href.as_str())]);
        for param in descriptor.params {
            let raw = match self.projection_parameter(param) {
                Some(raw) => raw,
                None => continue,
            };
            let (value, uom) = match param_class(param) {
                ParamClass::Angular => match angular_code {
                    Some(code) => (raw, code),
                    None => ((raw * angular).to_degrees(), 9102),
                },
                ParamClass::Linear => match linear_code {
                    Some(code) => (raw, code),
                    None => (raw * linear, 9001),
                },
                ParamClass::Unitless => (raw, UNITY),
            };
            let href = match PARAM_CODES.iter().find(|(p, _)| p == param) {
                Some((_, code)) => format!("urn:ogc:def:parameter:EPSG::{}", code),
                None => format!("urn:ogc:def:parameter:OGC::{}", param),
            };
            w.open("usesValue", &[]);
            w.measure("value", &uom_urn(uom), value);
            w.empty("valueOfParameter", &[("xlink:href", href.as_str())]);
            w.close("usesValue");
        }
        w.close("Conversion");
        w.close("definedByConversion");

        let axes = axes_or(self.axes(None), &PROJECTED_AXES);
        w.axes("CartesianCS", "Cartesian", &uom_urn(linear_code.unwrap_or(9001)), &axes);
        w.close("ProjectedCRS");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_markup() {
        let doc = parse_document(
            "<?xml version=\"1.0\"?>\n<!-- c --><a:x k='1 &amp; 2'><b>t&lt;</b><c/><![CDATA[<raw>]]></a:x>",
        )
        .unwrap();
        assert_eq!(doc.name, "x");
        assert_eq!(doc.attr("k"), Some("1 & 2"));
        assert_eq!(doc.text_of("b"), Some("t<"));
        assert!(doc.child("c").is_some());
        assert_eq!(doc.text, "<raw>");
    }

    #[test]
    fn deep_nesting_is_refused() {
        let shallow = format!("{}{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert!(parse_document(&shallow).is_ok());
        assert!(matches!(
            SpatialReference::from_xml(&"<a>".repeat(200_000)),
            Err(Error::ParseError { position: Some(_), .. })
        ));
    }

    #[test]
    fn markup_errors_have_positions() {
        for bad in ["", "<a>", "<a></b>", "<a x=1/>", "<a/><b/>"] {
            match parse_document(bad) {
                Err(Error::ParseError { position: Some(_), .. }) => {}
                other => panic!("{:?} gave {:?}", bad, other),
            }
        }
    }

    #[test]
    fn geographic_both_ways() {
        let srs = SpatialReference::from_epsg(4326).unwrap();
        let xml = srs.to_xml().unwrap();
        assert!(xml.starts_with("<gml:GeographicCRS"));
        assert!(xml.contains("<gml:name gml:codeSpace=\"urn:ogc:def:crs:EPSG::\">4326</gml:name>"));
        assert!(xml.contains("<gml:inverseFlattening gml:uom=\"urn:ogc:def:uom:EPSG::9201\">298.257223563</gml:inverseFlattening>"));
        let back = SpatialReference::from_xml(&xml).unwrap();
        assert!(back.is_same(&srs));
        assert_eq!(back.authority_code(None).as_deref(), Some("4326"));
        assert_eq!(back.authority_code(Some("DATUM")).as_deref(), Some("6326"));
    }

    #[test]
    fn projected_both_ways() {
        let srs = SpatialReference::from_epsg(32633).unwrap();
        let xml = srs.to_xml().unwrap();
        assert!(xml.contains("urn:ogc:def:method:EPSG::9807"));
        assert!(xml.contains("urn:ogc:def:parameter:EPSG::8802"));
        let back = SpatialReference::from_xml(&xml).unwrap();
        assert!(back.is_same(&srs));
        assert_eq!(back.utm_zone(), Some((33, true)));
    }

    #[test]
    fn ogc_codes_and_unit_conversion() {
        let mut srs = SpatialReference::new();
        srs.set_well_known_geog_cs("WGS84").unwrap();
        srs.set_sinusoidal(15.0, 1000.0, 0.0).unwrap();
        srs.set_linear_units("US survey foot", units::US_FOOT_TO_METRE).unwrap();
        let xml = srs.to_xml().unwrap();
        assert!(xml.contains("urn:ogc:def:method:OGC::Sinusoidal"));
        assert!(xml.contains("urn:ogc:def:uom:EPSG::9003"));
        let back = SpatialReference::from_xml(&xml).unwrap();
        assert_eq!(back.linear_units().0, "US survey foot");
        assert_relative_eq!(back.projection_parameter(FALSE_EASTING).unwrap(), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(back.projection_parameter(LONGITUDE_OF_CENTER).unwrap(), 15.0, epsilon = 1e-12);
    }

    #[test]
    fn false_origin_codes_and_radians() {
        let xml = r#"<gml:ProjectedCRS xmlns:gml="http://www.opengis.net/gml" xmlns:xlink="http://www.w3.org/1999/xlink" gml:id="p">
  <gml:srsName>lcc</gml:srsName>
  <gml:baseCRS><gml:GeographicCRS gml:id="g"><gml:srsName>GRS80</gml:srsName>
    <gml:usesGeodeticDatum><gml:GeodeticDatum gml:id="d"><gml:datumName>unknown</gml:datumName>
      <gml:usesEllipsoid><gml:Ellipsoid gml:id="e"><gml:ellipsoidName>GRS 1980</gml:ellipsoidName>
        <gml:semiMajorAxis gml:uom="urn:ogc:def:uom:EPSG::9001">6378137</gml:semiMajorAxis>
        <gml:secondDefiningParameter><gml:semiMinorAxis gml:uom="urn:ogc:def:uom:EPSG::9001">6356752.314140356</gml:semiMinorAxis></gml:secondDefiningParameter>
      </gml:Ellipsoid></gml:usesEllipsoid>
    </gml:GeodeticDatum></gml:usesGeodeticDatum>
  </gml:GeographicCRS></gml:baseCRS>
  <gml:definedByConversion><gml:Conversion gml:id="c">
    <gml:usesMethod xlink:href="urn:ogc:def:method:EPSG::9802"/>
    <gml:usesValue><gml:value gml:uom="urn:ogc:def:uom:EPSG::9101">0.7853981633974483</gml:value>
      <gml:valueOfParameter xlink:href="urn:ogc:def:parameter:EPSG::8821"/></gml:usesValue>
    <gml:usesValue><gml:value gml:uom="urn:ogc:def:uom:EPSG::9001">500000</gml:value>
      <gml:valueOfParameter xlink:href="urn:ogc:def:parameter:EPSG::8826"/></gml:usesValue>
  </gml:Conversion></gml:definedByConversion>
</gml:ProjectedCRS>"#;
        let srs = SpatialReference::from_xml(xml).unwrap();
        assert_eq!(srs.projection(), Some(LAMBERT_CONFORMAL_CONIC_2SP));
        assert_relative_eq!(srs.projection_parameter(LATITUDE_OF_ORIGIN).unwrap(), 45.0, epsilon = 1e-9);
        assert_eq!(srs.projection_parameter(FALSE_EASTING), Some(500000.0));
        assert_eq!(srs.projection_parameter(STANDARD_PARALLEL_1), Some(0.0));
        assert_relative_eq!(srs.inverse_flattening().unwrap(), 298.257222101, epsilon = 1e-6);
    }

    #[test]
    fn unknown_method_is_a_parse_error() {
        let xml = SpatialReference::from_epsg(32633)
            .unwrap()
            .to_xml()
            .unwrap()
            .replace("EPSG::9807", "EPSG::1234");
        assert!(matches!(SpatialReference::from_xml(&xml), Err(Error::ParseError { .. })));
    }

    struct Fixed(Option<&'static str>);

    impl UrlFetcher for Fixed {
        fn fetch(&self, _url: &str) -> std::result::Result<String, BoxError> {
            self.0.map(str::to_owned).ok_or_else(|| "offline".into())
        }
    }

    #[test]
    fn from_url_goes_through_the_fetcher() {
        let srs = SpatialReference::from_url("http://x/4326", &Fixed(Some("EPSG:4326"))).unwrap();
        assert!(srs.is_geographic());
        match SpatialReference::from_url("http://x/4326", &Fixed(None)) {
            Err(Error::FetchError { url, .. }) => assert_eq!(url, "http://x/4326"),
            other => panic!("{:?}", other),
        }
    }
}
