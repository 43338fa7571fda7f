//! MapInfo `CoordSys` clauses. Export only.
use crate::datums::{datum_by_name, ellipsoid_by_params};
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use log::warn;
use osr_core::catalog::{param_class, ParamClass};
use osr_core::names::{param::*, proj::*};
use osr_core::node::{Node, NodeKind};
use osr_core::number::format_number;
use osr_core::units::{self, UnitKind};

const FORMAT: &str = "MapInfo";

/// Datum number for "ellipsoid and datum shift given inline".
const CUSTOM_DATUM: i32 = 9999;
/// Datum number for "ellipsoid only".
const ELLIPSOID_ONLY: i32 = 999;

/// MapInfo projection number and the parameters following the unit.
static PROJECTIONS: &[(&str, u32, &[&str])] = &[
    (CYLINDRICAL_EQUAL_AREA, 2, &[CENTRAL_MERIDIAN, STANDARD_PARALLEL_1]),
    (LAMBERT_CONFORMAL_CONIC_2SP, 3, &[CENTRAL_MERIDIAN, LATITUDE_OF_ORIGIN, STANDARD_PARALLEL_1, STANDARD_PARALLEL_2, FALSE_EASTING, FALSE_NORTHING]),
    (LAMBERT_AZIMUTHAL_EQUAL_AREA, 29, &[LONGITUDE_OF_CENTER, LATITUDE_OF_CENTER, FALSE_EASTING, FALSE_NORTHING]),
    (AZIMUTHAL_EQUIDISTANT, 28, &[LONGITUDE_OF_CENTER, LATITUDE_OF_CENTER, FALSE_EASTING, FALSE_NORTHING]),
    (EQUIDISTANT_CONIC, 6, &[LONGITUDE_OF_CENTER, LATITUDE_OF_CENTER, STANDARD_PARALLEL_1, STANDARD_PARALLEL_2, FALSE_EASTING, FALSE_NORTHING]),
    (HOTINE_OBLIQUE_MERCATOR, 7, &[LONGITUDE_OF_CENTER, LATITUDE_OF_CENTER, AZIMUTH, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING]),
    (TRANSVERSE_MERCATOR, 8, &[CENTRAL_MERIDIAN, LATITUDE_OF_ORIGIN, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING]),
    (ALBERS_CONIC_EQUAL_AREA, 9, &[LONGITUDE_OF_CENTER, LATITUDE_OF_CENTER, STANDARD_PARALLEL_1, STANDARD_PARALLEL_2, FALSE_EASTING, FALSE_NORTHING]),
    (MERCATOR_1SP, 10, &[CENTRAL_MERIDIAN]),
    (MILLER_CYLINDRICAL, 11, &[LONGITUDE_OF_CENTER]),
    (ROBINSON, 12, &[LONGITUDE_OF_CENTER]),
    (MOLLWEIDE, 13, &[CENTRAL_MERIDIAN]),
    (ECKERT_IV, 14, &[CENTRAL_MERIDIAN]),
    (ECKERT_VI, 15, &[CENTRAL_MERIDIAN]),
    (SINUSOIDAL, 16, &[LONGITUDE_OF_CENTER]),
    (LAMBERT_CONFORMAL_CONIC_2SP_BELGIUM, 19, &[CENTRAL_MERIDIAN, LATITUDE_OF_ORIGIN, STANDARD_PARALLEL_1, STANDARD_PARALLEL_2, FALSE_EASTING, FALSE_NORTHING]),
    (STEREOGRAPHIC, 20, &[CENTRAL_MERIDIAN, LATITUDE_OF_ORIGIN, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING]),
    (MERCATOR_2SP, 26, &[CENTRAL_MERIDIAN, STANDARD_PARALLEL_1]),
    (POLYCONIC, 27, &[CENTRAL_MERIDIAN, LATITUDE_OF_ORIGIN, FALSE_EASTING, FALSE_NORTHING]),
    (CASSINI_SOLDNER, 30, &[CENTRAL_MERIDIAN, LATITUDE_OF_ORIGIN, FALSE_EASTING, FALSE_NORTHING]),
    (OBLIQUE_STEREOGRAPHIC, 31, &[CENTRAL_MERIDIAN, LATITUDE_OF_ORIGIN, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING]),
];

/// MapInfo ellipsoid numbers.
static ELLIPSOIDS: &[(&str, i32)] = &[
    ("GRS 1980", 0),
    ("Australian National Spheroid", 2),
    ("Krassowsky 1940", 3),
    ("International 1924", 4),
    ("Clarke 1880 (RGS)", 6),
    ("Clarke 1866", 7),
    ("Airy 1830", 9),
    ("Bessel 1841", 10),
    ("Everest 1830 (1937 Adjustment)", 11),
    ("Sphere", 12),
    ("WGS 72", 27),
    ("WGS 84", 28),
];

fn mapinfo_unit(kind: UnitKind, factor: f64) -> Result<&'static str> {
    units::from_factor(kind, factor)
        .and_then(|u| u.mapinfo)
        .ok_or_else(|| Error::export(FORMAT, format!("no MapInfo unit for factor {}", factor)))
}

impl SpatialReference {
    pub fn to_mapinfo(&self) -> Result<String> {
        let root = self.root_or_err()?;
        let out = match root.kind {
            NodeKind::LocalCs => {
                let (_, factor) = self.linear_units();
                return Ok(format!("NonEarth Units \"{}\"", mapinfo_unit(UnitKind::Linear, factor)?));
            }
            NodeKind::Geogcs => format!("Earth Projection 1, {}", self.mapinfo_datum()?),
            NodeKind::Projcs => {
                let method = self
                    .projection()
                    .ok_or_else(|| Error::export(FORMAT, "PROJCS without PROJECTION"))?;
                let (_, number, params) = PROJECTIONS
                    .iter()
                    .find(|(m, _, _)| m.eq_ignore_ascii_case(method))
                    .ok_or_else(|| Error::export(FORMAT, format!("no MapInfo projection for {}", method)))?;
                let (_, factor) = self.linear_units();
                let mut out = format!(
                    "Earth Projection {}, {}, \"{}\"",
                    number,
                    self.mapinfo_datum()?,
                    mapinfo_unit(UnitKind::Linear, factor)?
                );
                for param in *params {
                    // angles in degrees, linear values in the clause's unit
                    let value = match param_class(param) {
                        ParamClass::Angular => self.parameter_degrees_metres(param),
                        _ => self.projection_parameter(param),
                    };
                    out.push_str(", ");
                    out.push_str(&format_number(value.unwrap_or(0.0)));
                }
                out
            }
            NodeKind::CompdCs => {
                warn!("MapInfo has no vertical part, writing the horizontal system only");
                let horizontal = self
                    .horizontal()
                    .ok_or(Error::MissingNodeError("GEOGCS"))?;
                return SpatialReference::from_root(horizontal.clone())?.to_mapinfo();
            }
            kind => return Err(Error::export(FORMAT, format!("{} has no MapInfo form", kind))),
        };
        if self.prime_meridian_degrees() != 0.0 {
            warn!("MapInfo CoordSys cannot carry a prime meridian offset, dropping it");
        }
        Ok(out)
    }

    /// The datum part, which can be a number or a number followed by the
    /// ellipsoid and datum shift.
    fn mapinfo_datum(&self) -> Result<String> {
        if let Some(d) = self.datum().and_then(Node::name).and_then(datum_by_name) {
            return Ok(d.mapinfo.to_string());
        }
        let a = self.semi_major()?;
        let rf = self.inverse_flattening()?;
        let ellipsoid = ellipsoid_by_params(a, rf)
            .and_then(|e| ELLIPSOIDS.iter().find(|(name, _)| *name == e.name))
            .map(|(_, n)| *n)
            .ok_or_else(|| Error::export(FORMAT, format!("no MapInfo ellipsoid for a={} rf={}", a, rf)))?;
        Ok(match self.towgs84() {
            Some(shift) => {
                let mut out = format!("{}, {}", CUSTOM_DATUM, ellipsoid);
                for v in shift {
                    out.push_str(", ");
                    out.push_str(&format_number(v));
                }
                // prime meridian
                out.push_str(", 0");
                out
            }
            None => format!("{}, {}, 0, 0, 0", ELLIPSOID_ONLY, ellipsoid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datums::GeogCs;

    #[test]
    fn geographic() {
        let srs = SpatialReference::from_epsg(4326).unwrap();
        assert_eq!(srs.to_mapinfo().unwrap(), "Earth Projection 1, 104");
        let srs = SpatialReference::from_epsg(4267).unwrap();
        assert_eq!(srs.to_mapinfo().unwrap(), "Earth Projection 1, 62");
    }

    #[test]
    fn utm() {
        let srs = SpatialReference::from_epsg(32633).unwrap();
        assert_eq!(
            srs.to_mapinfo().unwrap(),
            "Earth Projection 8, 104, \"m\", 15, 0, 0.9996, 500000, 0"
        );
    }

    #[test]
    fn custom_ellipsoid_with_shift() {
        let mut srs = SpatialReference::new();
        srs.set_geog_cs(&GeogCs {
            name: "Local",
            datum: "Local_Datum",
            spheroid: "International 1924",
            semi_major: 6378388.0,
            inverse_flattening: 297.0,
            ..GeogCs::default()
        })
        .unwrap();
        assert_eq!(srs.to_mapinfo().unwrap(), "Earth Projection 1, 999, 4, 0, 0, 0");
        srs.set_towgs84([-87.0, -98.0, -121.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(
            srs.to_mapinfo().unwrap(),
            "Earth Projection 1, 9999, 4, -87, -98, -121, 0, 0, 0, 0, 0"
        );
    }

    #[test]
    fn local_and_unsupported() {
        let mut srs = SpatialReference::new();
        srs.set_local_cs("site").unwrap();
        srs.set_linear_units("foot", units::FOOT_TO_METRE).unwrap();
        assert_eq!(srs.to_mapinfo().unwrap(), "NonEarth Units \"ft\"");

        let mut srs = SpatialReference::from_epsg(4326).unwrap();
        srs.set_krovak(49.5, 24.83, 30.28, 78.5, 0.9999, 0.0, 0.0).unwrap();
        assert!(matches!(srs.to_mapinfo(), Err(Error::ExportError { .. })));
    }
}
