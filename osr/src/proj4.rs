//! PROJ.4 `+key=value` strings.
//!
//! Keys this module doesn't understand are kept: the whole input string is
//! attached as `EXTENSION["PROJ4", ...]` and written back verbatim by
//! [`SpatialReference::to_proj4`].
use crate::datums::{datum_by_name, datum_by_proj4, ellipsoid_by_name, ellipsoid_by_params, ellipsoid_by_proj4, GeogCs};
use crate::result::{Error, Result};
use crate::srs::{is_proj4_extension, SpatialReference};
use log::{debug, trace, warn};
use osr_core::catalog;
use osr_core::names::{param::*, proj::*};
use osr_core::node::{Node, NodeKind, SrsNode, Value};
use osr_core::number::{format_number, parse_number};
use osr_core::units::{self, UnitKind};

struct Proj4Method {
    wkt: &'static str,
    proj: &'static str,
    /// PROJ.4 key and the parameter it carries. One parameter may appear under
    /// several keys, the first one present wins on import.
    keys: &'static [(&'static str, &'static str)],
    flag: Option<&'static str>,
}

macro_rules! proj4 {
    ($wkt:expr, $proj:expr, [$(($key:expr, $param:expr)),* $(,)?]) => {
        Proj4Method { wkt: $wkt, proj: $proj, keys: &[$(($key, $param)),*], flag: None }
    };
    ($wkt:expr, $proj:expr, [$(($key:expr, $param:expr)),* $(,)?], $flag:expr) => {
        Proj4Method { wkt: $wkt, proj: $proj, keys: &[$(($key, $param)),*], flag: Some($flag) }
    };
}

static METHODS: &[Proj4Method] = &[
    proj4!(TRANSVERSE_MERCATOR, "tmerc", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(MERCATOR_1SP, "merc", [("lon_0", CENTRAL_MERIDIAN), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(MERCATOR_2SP, "merc", [("lat_ts", STANDARD_PARALLEL_1), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(LAMBERT_CONFORMAL_CONIC_2SP, "lcc", [("lat_1", STANDARD_PARALLEL_1), ("lat_2", STANDARD_PARALLEL_2), ("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(LAMBERT_CONFORMAL_CONIC_1SP, "lcc", [("lat_1", LATITUDE_OF_ORIGIN), ("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("k_0", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ALBERS_CONIC_EQUAL_AREA, "aea", [("lat_1", STANDARD_PARALLEL_1), ("lat_2", STANDARD_PARALLEL_2), ("lat_0", LATITUDE_OF_CENTER), ("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(AZIMUTHAL_EQUIDISTANT, "aeqd", [("lat_0", LATITUDE_OF_CENTER), ("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(BONNE, "bonne", [("lat_1", STANDARD_PARALLEL_1), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(CASSINI_SOLDNER, "cass", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(CYLINDRICAL_EQUAL_AREA, "cea", [("lat_ts", STANDARD_PARALLEL_1), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(EQUIDISTANT_CONIC, "eqdc", [("lat_1", STANDARD_PARALLEL_1), ("lat_2", STANDARD_PARALLEL_2), ("lat_0", LATITUDE_OF_CENTER), ("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ECKERT_I, "eck1", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ECKERT_II, "eck2", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ECKERT_III, "eck3", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ECKERT_IV, "eck4", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ECKERT_V, "eck5", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ECKERT_VI, "eck6", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(EQUIRECTANGULAR, "eqc", [("lat_ts", STANDARD_PARALLEL_1), ("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(GALL_STEREOGRAPHIC, "gall", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(GEOSTATIONARY_SATELLITE, "geos", [("lon_0", CENTRAL_MERIDIAN), ("h", SATELLITE_HEIGHT), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(GOODE_HOMOLOSINE, "goode", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(INTERRUPTED_GOODE_HOMOLOSINE, "igh", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(GNOMONIC, "gnom", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(GAUSS_SCHREIBER_TM, "gstmerc", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("k_0", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(HOTINE_OBLIQUE_MERCATOR_AZIMUTH_CENTER, "omerc", [("lat_0", LATITUDE_OF_CENTER), ("lonc", LONGITUDE_OF_CENTER), ("alpha", AZIMUTH), ("gamma", RECTIFIED_GRID_ANGLE), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(HOTINE_OBLIQUE_MERCATOR, "omerc", [("lat_0", LATITUDE_OF_CENTER), ("lonc", LONGITUDE_OF_CENTER), ("alpha", AZIMUTH), ("gamma", RECTIFIED_GRID_ANGLE), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)], "no_uoff"),
    proj4!(HOTINE_OBLIQUE_MERCATOR_TWO_POINT, "omerc", [("lat_0", LATITUDE_OF_CENTER), ("lat_1", LATITUDE_OF_POINT_1), ("lon_1", LONGITUDE_OF_POINT_1), ("lat_2", LATITUDE_OF_POINT_2), ("lon_2", LONGITUDE_OF_POINT_2), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(IMW_POLYCONIC, "iwm_p", [("lat_1", LATITUDE_OF_1ST_POINT), ("lat_2", LATITUDE_OF_2ND_POINT), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(KROVAK, "krovak", [("lat_0", LATITUDE_OF_CENTER), ("lon_0", LONGITUDE_OF_CENTER), ("alpha", AZIMUTH), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(LAMBERT_AZIMUTHAL_EQUAL_AREA, "laea", [("lat_0", LATITUDE_OF_CENTER), ("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(MILLER_CYLINDRICAL, "mill", [("lat_0", LATITUDE_OF_CENTER), ("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(MOLLWEIDE, "moll", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(NEW_ZEALAND_MAP_GRID, "nzmg", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(OBLIQUE_STEREOGRAPHIC, "sterea", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ORTHOGRAPHIC, "ortho", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(POLYCONIC, "poly", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(POLAR_STEREOGRAPHIC, "stere", [("lat_ts", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(STEREOGRAPHIC, "stere", [("lat_0", LATITUDE_OF_ORIGIN), ("lon_0", CENTRAL_MERIDIAN), ("k", SCALE_FACTOR), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(ROBINSON, "robin", [("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(SINUSOIDAL, "sinu", [("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(SWISS_OBLIQUE_CYLINDRICAL, "somerc", [("lat_0", LATITUDE_OF_CENTER), ("lon_0", LONGITUDE_OF_CENTER), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(TWO_POINT_EQUIDISTANT, "tpeqd", [("lat_1", LATITUDE_OF_1ST_POINT), ("lon_1", LONGITUDE_OF_1ST_POINT), ("lat_2", LATITUDE_OF_2ND_POINT), ("lon_2", LONGITUDE_OF_2ND_POINT), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
    proj4!(VAN_DER_GRINTEN, "vandg", [("lon_0", CENTRAL_MERIDIAN), ("x_0", FALSE_EASTING), ("y_0", FALSE_NORTHING)]),
];

/// Keys read by the importer itself. Anything else is kept in the extension.
const KNOWN_KEYS: &[&str] = &[
    "proj", "zone", "south", "datum", "ellps", "a", "b", "rf", "f", "R", "towgs84", "pm",
    "units", "to_meter", "no_defs", "wktext", "type", "lat_0", "lat_1", "lat_2", "lat_ts",
    "lon_0", "lon_1", "lon_2", "lonc", "alpha", "gamma", "k", "k_0", "x_0", "y_0", "h",
    "no_uoff", "init",
];

const PRIME_MERIDIANS: &[(&str, f64)] = &[
    ("greenwich", 0.0),
    ("lisbon", -9.131906111111),
    ("paris", 2.337229166667),
    ("bogota", -74.080916666667),
    ("madrid", -3.687938888889),
    ("rome", 12.452333333333),
    ("bern", 7.439583333333),
    ("jakarta", 106.807719444444),
    ("ferro", -17.666666666667),
    ("brussels", 4.367975),
    ("stockholm", 18.058277777778),
    ("athens", 23.7163375),
    ("oslo", 10.722916666667),
];

/// Parsed `+key=value` pairs, in input order.
#[derive(Debug, Default)]
struct Args(Vec<(String, Option<String>)>);

impl Args {
    fn parse(text: &str) -> Result<Args> {
        let mut args = Vec::new();
        for token in text.split_whitespace() {
            let token = token
                .strip_prefix('+')
                .ok_or_else(|| Error::parse("PROJ.4", format!("token {:?} does not start with +", token)))?;
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((k, v)) => args.push((k.to_owned(), Some(v.to_owned()))),
                None => args.push((token.to_owned(), None)),
            }
        }
        Ok(Args(args))
    }

    fn has(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// `k` and `k_0` are the same key.
    fn number(&self, key: &str) -> Result<Option<f64>> {
        let raw = match key {
            "k" | "k_0" => self.text("k").or_else(|| self.text("k_0")),
            _ => self.text(key),
        };
        match raw {
            Some(v) => parse_number(v)
                .map(Some)
                .ok_or_else(|| Error::parse("PROJ.4", format!("+{}={} is not a number", key, v))),
            None => Ok(None),
        }
    }

    fn unknown(&self) -> Vec<&str> {
        self.0
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !KNOWN_KEYS.contains(k))
            .collect()
    }
}

fn choose_method(proj: &str, args: &Args) -> Option<&'static Proj4Method> {
    let wkt = match proj {
        "lcc" if args.has("lat_2") => LAMBERT_CONFORMAL_CONIC_2SP,
        "lcc" => LAMBERT_CONFORMAL_CONIC_1SP,
        "merc" if args.has("lat_ts") => MERCATOR_2SP,
        "omerc" if args.has("lat_1") => HOTINE_OBLIQUE_MERCATOR_TWO_POINT,
        "omerc" if args.has("no_uoff") => HOTINE_OBLIQUE_MERCATOR,
        "omerc" => HOTINE_OBLIQUE_MERCATOR_AZIMUTH_CENTER,
        "stere" => match args.number("lat_0") {
            Ok(Some(lat)) if (lat.abs() - 90.0).abs() < 1e-9 => POLAR_STEREOGRAPHIC,
            _ => STEREOGRAPHIC,
        },
        other => return METHODS.iter().find(|m| m.proj == other),
    };
    METHODS.iter().find(|m| m.wkt == wkt)
}

fn ellipsoid_from_args(args: &Args) -> Result<Option<(String, f64, f64)>> {
    if let Some(code) = args.text("ellps") {
        let e = ellipsoid_by_proj4(code)
            .ok_or_else(|| Error::parse("PROJ.4", format!("unknown ellipsoid {}", code)))?;
        return Ok(Some((e.name.to_owned(), e.semi_major, e.inverse_flattening)));
    }
    if let Some(r) = args.number("R")? {
        return Ok(Some(("Sphere".to_owned(), r, 0.0)));
    }
    let a = match args.number("a")? {
        Some(a) => a,
        None => return Ok(None),
    };
    let rf = if let Some(rf) = args.number("rf")? {
        rf
    } else if let Some(f) = args.number("f")? {
        if f == 0.0 { 0.0 } else { 1.0 / f }
    } else if let Some(b) = args.number("b")? {
        if (a - b).abs() < 1e-9 { 0.0 } else { a / (a - b) }
    } else {
        0.0
    };
    let name = ellipsoid_by_params(a, rf)
        .map(|e| e.name.to_owned())
        .unwrap_or_else(|| "unnamed".to_owned());
    Ok(Some((name, a, rf)))
}

fn prime_meridian(args: &Args) -> Result<Option<(String, f64)>> {
    let pm = match args.text("pm") {
        Some(pm) => pm,
        None => return Ok(None),
    };
    if let Some((name, lon)) = PRIME_MERIDIANS.iter().find(|(n, _)| n.eq_ignore_ascii_case(pm)) {
        let mut name = name.to_string();
        name[..1].make_ascii_uppercase();
        return Ok(Some((name, *lon)));
    }
    parse_number(pm)
        .map(|lon| Some(("unnamed".to_owned(), lon)))
        .ok_or_else(|| Error::parse("PROJ.4", format!("unknown prime meridian {}", pm)))
}

fn towgs84(args: &Args) -> Result<Option<[f64; 7]>> {
    let raw = match args.text("towgs84") {
        Some(v) => v,
        None => return Ok(None),
    };
    let values: Vec<f64> = raw
        .split(',')
        .map(|v| parse_number(v).ok_or_else(|| Error::parse("PROJ.4", format!("bad towgs84 value {:?}", v))))
        .collect::<Result<_>>()?;
    if values.len() != 3 && values.len() != 7 {
        return Err(Error::parse(
            "PROJ.4",
            format!("towgs84 takes 3 or 7 values, found {}", values.len()),
        ));
    }
    let mut out = [0.0; 7];
    out[..values.len()].copy_from_slice(&values);
    Ok(Some(out))
}

fn set_geographic(srs: &mut SpatialReference, args: &Args) -> Result<()> {
    let datum = match args.text("datum") {
        Some(code) => Some(
            datum_by_proj4(code)
                .ok_or_else(|| Error::parse("PROJ.4", format!("unknown datum {}", code)))?,
        ),
        None => None,
    };
    match (datum, ellipsoid_from_args(args)?) {
        (Some(d), _) => srs.replace_geog_cs(d.geogcs_node()?)?,
        (None, Some((spheroid, a, rf))) => srs.set_geog_cs(&GeogCs {
            name: "unknown",
            datum: "unknown",
            spheroid: &spheroid,
            semi_major: a,
            inverse_flattening: rf,
            ..GeogCs::default()
        })?,
        (None, None) => srs.set_well_known_geog_cs("WGS84")?,
    }
    if let Some(params) = towgs84(args)? {
        srs.set_towgs84(params)?;
    }
    if let Some((name, lon)) = prime_meridian(args)? {
        if let Some(geog) = srs.geog_cs_mut() {
            geog.replace_child(Node::named(NodeKind::Primem, name).with_attr(Value::number(lon)));
        }
    }
    Ok(())
}

fn linear_unit(args: &Args) -> Result<Option<(String, f64)>> {
    if let Some(code) = args.text("units") {
        let unit = units::from_proj4(code)
            .ok_or_else(|| Error::parse("PROJ.4", format!("unknown units {}", code)))?;
        return Ok(Some((unit.name.to_owned(), unit.factor)));
    }
    if let Some(factor) = args.number("to_meter")? {
        let name = units::from_factor(UnitKind::Linear, factor)
            .map(|u| u.name)
            .unwrap_or("unknown");
        return Ok(Some((name.to_owned(), factor)));
    }
    Ok(None)
}

fn set_projected(srs: &mut SpatialReference, proj: &str, args: &Args) -> Result<()> {
    if proj == "utm" {
        let zone = args
            .number("zone")?
            .ok_or_else(|| Error::parse("PROJ.4", "+proj=utm without +zone"))?;
        srs.set_utm(zone as i32, !args.has("south"))?;
        if let Some((name, factor)) = linear_unit(args)? {
            srs.set_linear_units_and_update_parameters(&name, factor)?;
        }
        return Ok(());
    }
    let method = choose_method(proj, args)
        .ok_or_else(|| Error::parse("PROJ.4", format!("unsupported projection {}", proj)))?;
    srs.set_projection(method.wkt)?;
    if let Some((name, factor)) = linear_unit(args)? {
        srs.set_linear_units(&name, factor)?;
    }
    let descriptor = catalog::method(method.wkt)
        .ok_or_else(|| Error::parse("PROJ.4", format!("unsupported projection {}", proj)))?;
    for param in descriptor.params {
        let mut value = None;
        for (key, p) in method.keys {
            if p == param {
                if let Some(v) = args.number(key)? {
                    value = Some(v);
                    break;
                }
            }
        }
        if method.wkt == POLAR_STEREOGRAPHIC && *param == LATITUDE_OF_ORIGIN && value.is_none() {
            value = args.number("lat_0")?;
        }
        let value = value
            .or_else(|| catalog::default_value(method.wkt, param))
            .unwrap_or(0.0);
        srs.set_parameter_degrees_metres(param, value)?;
    }
    Ok(())
}

impl SpatialReference {
    pub fn from_proj4(text: &str) -> Result<Self> {
        let text = text.trim();
        let args = Args::parse(text)?;
        if let Some(init) = args.text("init") {
            let code = init
                .strip_prefix("epsg:")
                .or_else(|| init.strip_prefix("EPSG:"))
                .and_then(|c| c.parse().ok())
                .ok_or_else(|| Error::parse("PROJ.4", format!("unsupported +init={}", init)))?;
            debug!("PROJ.4 string resolved through EPSG:{}", code);
            return SpatialReference::from_epsg(code);
        }
        let proj = args
            .text("proj")
            .ok_or_else(|| Error::parse("PROJ.4", "missing +proj"))?
            .to_owned();
        trace!("PROJ.4 import of {:?}", proj);

        let mut srs = SpatialReference::new();
        set_geographic(&mut srs, &args)?;
        match proj.as_str() {
            "longlat" | "latlong" | "lonlat" | "latlon" => {}
            "geocent" => {
                srs.set_geocentric_cs("Geocentric")?;
                if let Some((name, factor)) = linear_unit(&args)? {
                    srs.set_linear_units(&name, factor)?;
                }
            }
            _ => set_projected(&mut srs, &proj, &args)?,
        }

        let unknown = args.unknown();
        if !unknown.is_empty() {
            debug!("keeping PROJ.4 string for {:?}", unknown);
            if let Some(root) = srs.root_mut() {
                root.insert_child(
                    Node::named(NodeKind::Extension, "PROJ4").with_attr(Value::quoted(text)),
                );
            }
        }
        Ok(srs)
    }

    pub fn import_proj4(&mut self, text: &str) -> Result<()> {
        *self = SpatialReference::from_proj4(text)?;
        Ok(())
    }

    pub fn to_proj4(&self) -> Result<String> {
        let root = self.root_or_err()?;
        if let Some(text) = proj4_extension(root) {
            return Ok(text);
        }
        let mut out = Vec::new();
        match root.kind {
            NodeKind::Geogcs => out.push("+proj=longlat".to_owned()),
            NodeKind::Geoccs => out.push("+proj=geocent".to_owned()),
            NodeKind::Projcs => self.projection_keys(&mut out)?,
            NodeKind::CompdCs => {
                warn!("PROJ.4 export drops the vertical part of a compound system");
                let horizontal = self
                    .horizontal()
                    .ok_or_else(|| Error::export("PROJ.4", "compound system without horizontal part"))?;
                return SpatialReference::from_root(horizontal.clone())?.to_proj4();
            }
            kind => {
                return Err(Error::export(
                    "PROJ.4",
                    format!("{} has no PROJ.4 form", kind),
                ))
            }
        }
        self.datum_keys(&mut out)?;
        if root.kind != NodeKind::Geogcs {
            let (_, factor) = self.linear_units();
            match units::from_factor(UnitKind::Linear, factor).and_then(|u| u.proj4) {
                Some(code) => out.push(format!("+units={}", code)),
                None => out.push(format!("+to_meter={}", format_number(factor))),
            }
        }
        out.push("+no_defs".to_owned());
        let text = out.join(" ");
        debug!("PROJ.4 export: {}", text);
        Ok(text)
    }

    fn projection_keys(&self, out: &mut Vec<String>) -> Result<()> {
        if let Some((zone, north)) = self.utm_zone() {
            out.push("+proj=utm".to_owned());
            out.push(format!("+zone={}", zone));
            if !north {
                out.push("+south".to_owned());
            }
            return Ok(());
        }
        let projection = self
            .projection()
            .ok_or_else(|| Error::export("PROJ.4", "PROJCS without PROJECTION"))?;
        let method = METHODS
            .iter()
            .find(|m| m.wkt.eq_ignore_ascii_case(projection))
            .ok_or_else(|| Error::export("PROJ.4", format!("no PROJ.4 form for {}", projection)))?;
        out.push(format!("+proj={}", method.proj));
        let value = |param: &str| {
            self.parameter_degrees_metres(param)
                .or_else(|| catalog::default_value(method.wkt, param))
                .unwrap_or(0.0)
        };
        if method.wkt == POLAR_STEREOGRAPHIC {
            let lat = value(LATITUDE_OF_ORIGIN);
            out.push(format!("+lat_0={}", if lat < 0.0 { -90 } else { 90 }));
        }
        for (key, param) in method.keys {
            out.push(format!("+{}={}", key, format_number(value(*param))));
        }
        if let Some(flag) = method.flag {
            out.push(format!("+{}", flag));
        }
        Ok(())
    }

    fn datum_keys(&self, out: &mut Vec<String>) -> Result<()> {
        let datum = self.datum().and_then(Node::name).and_then(datum_by_name);
        let towgs84 = self.towgs84();
        match datum.and_then(|d| d.proj4) {
            Some(code) => out.push(format!("+datum={}", code)),
            None => {
                let a = self.semi_major()?;
                let rf = self.inverse_flattening()?;
                let ellipsoid = self
                    .datum()
                    .and_then(|d| d.child(NodeKind::Spheroid))
                    .and_then(Node::name)
                    .and_then(ellipsoid_by_name)
                    .filter(|e| (e.semi_major - a).abs() < 1e-3)
                    .or_else(|| ellipsoid_by_params(a, rf))
                    .and_then(|e| e.proj4);
                match ellipsoid {
                    Some(code) => out.push(format!("+ellps={}", code)),
                    None if rf == 0.0 => out.push(format!("+a={} +b={}", format_number(a), format_number(a))),
                    None => out.push(format!("+a={} +rf={}", format_number(a), format_number(rf))),
                }
                if let Some(params) = towgs84 {
                    let joined: Vec<String> = params.iter().map(|p| format_number(*p)).collect();
                    out.push(format!("+towgs84={}", joined.join(",")));
                }
            }
        }
        let pm = self.prime_meridian_degrees();
        if pm != 0.0 {
            out.push(format!("+pm={}", format_number(pm)));
        }
        Ok(())
    }
}

fn proj4_extension(root: &Node) -> Option<String> {
    let holder = match root.kind {
        NodeKind::CompdCs => root.find(NodeKind::Projcs).unwrap_or(root),
        _ => root,
    };
    holder.children.iter().find(|c| is_proj4_extension(c)).and_then(|c| match c {
        SrsNode::Known(n) => n.attr(1).map(str::to_owned),
        SrsNode::Opaque(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use osr_core::units::US_FOOT_TO_METRE;

    #[test]
    fn geographic_export() {
        let srs = SpatialReference::from_epsg(4326).unwrap();
        assert_eq!(srs.to_proj4().unwrap(), "+proj=longlat +datum=WGS84 +no_defs");
        let ed50 = SpatialReference::from_epsg(4230).unwrap();
        assert_eq!(
            ed50.to_proj4().unwrap(),
            "+proj=longlat +ellps=intl +towgs84=-87,-98,-121,0,0,0,0 +no_defs"
        );
    }

    #[test]
    fn utm_round_trip() {
        let srs = SpatialReference::from_epsg(32633).unwrap();
        let text = srs.to_proj4().unwrap();
        assert_eq!(text, "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs");
        let back = SpatialReference::from_proj4(&text).unwrap();
        assert!(back.is_same(&srs));
        let south = SpatialReference::from_proj4("+proj=utm +zone=59 +south +datum=WGS84").unwrap();
        assert_eq!(south.utm_zone(), Some((59, false)));
    }

    #[test]
    fn generic_projection() {
        let srs = SpatialReference::from_proj4(
            "+proj=lcc +lat_1=33 +lat_2=45 +lat_0=39 +lon_0=-96 +x_0=0 +y_0=0 +ellps=GRS80 +units=us-ft +no_defs",
        )
        .unwrap();
        assert_eq!(srs.projection(), Some(LAMBERT_CONFORMAL_CONIC_2SP));
        assert_eq!(srs.projection_parameter(STANDARD_PARALLEL_2), Some(45.0));
        assert_relative_eq!(srs.linear_units().1, US_FOOT_TO_METRE);
        assert_eq!(srs.datum().unwrap().child(NodeKind::Spheroid).unwrap().name(), Some("GRS 1980"));
        let text = srs.to_proj4().unwrap();
        assert!(text.starts_with("+proj=lcc +lat_1=33 +lat_2=45 +lat_0=39 +lon_0=-96"));
        assert!(text.ends_with("+ellps=GRS80 +units=us-ft +no_defs"));
    }

    #[test]
    fn false_easting_is_metres() {
        let srs = SpatialReference::from_proj4(
            "+proj=tmerc +lat_0=0 +lon_0=-81 +k=0.9996 +x_0=152400.3048006096 +y_0=0 +datum=NAD83 +units=us-ft",
        )
        .unwrap();
        assert_relative_eq!(srs.projection_parameter(FALSE_EASTING).unwrap(), 500000.0, epsilon = 1e-6);
        assert_relative_eq!(srs.normalized_projection_parameter(FALSE_EASTING).unwrap(), 152400.3048006096, epsilon = 1e-6);
    }

    #[test]
    fn polar_stereographic() {
        let srs = SpatialReference::from_proj4("+proj=stere +lat_0=-90 +lat_ts=-71 +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m").unwrap();
        assert_eq!(srs.projection(), Some(POLAR_STEREOGRAPHIC));
        assert_eq!(srs.projection_parameter(LATITUDE_OF_ORIGIN), Some(-71.0));
        assert!(srs.to_proj4().unwrap().starts_with("+proj=stere +lat_0=-90 +lat_ts=-71"));
    }

    #[test]
    fn unknown_keys_are_kept() {
        let text = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs";
        let srs = SpatialReference::from_proj4(text).unwrap();
        assert!(srs.to_wkt().unwrap().contains("EXTENSION[\"PROJ4\""));
        assert_eq!(srs.to_proj4().unwrap(), text);
    }

    #[test]
    fn other_inputs() {
        let init = SpatialReference::from_proj4("+init=epsg:4326").unwrap();
        assert!(init.is_same(&SpatialReference::from_epsg(4326).unwrap()));
        let custom = SpatialReference::from_proj4("+proj=longlat +a=6378137 +rf=298.257222101 +towgs84=1,2,3 +pm=paris").unwrap();
        assert_eq!(custom.towgs84(), Some([1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]));
        assert_relative_eq!(custom.prime_meridian_degrees(), 2.337229166667);
        assert!(custom.to_proj4().unwrap().contains("+ellps=GRS80 +towgs84=1,2,3,0,0,0,0 +pm=2.337229166667"));
        let geocent = SpatialReference::from_proj4("+proj=geocent +datum=WGS84 +units=m").unwrap();
        assert!(geocent.is_geocentric());
        assert_eq!(geocent.to_proj4().unwrap(), "+proj=geocent +datum=WGS84 +units=m +no_defs");
    }

    #[test]
    fn bad_inputs() {
        for text in ["proj=longlat", "+datum=WGS84", "+proj=utm +datum=WGS84", "+proj=longlat +ellps=nope", "+proj=foo +datum=WGS84", "+proj=longlat +towgs84=1,2"] {
            assert!(
                matches!(SpatialReference::from_proj4(text), Err(Error::ParseError { .. })),
                "{}",
                text
            );
        }
    }
}
