//! USGS GCTP projection codes and their fixed array of 15 parameters.
//!
//! Angles in the array are packed degrees, minutes and seconds
//! (`DDDMMMSSS.SS`), linear values are metres.
use crate::datums::{datum_by_name, ellipsoid_by_params, ellipsoid_by_usgs, GeogCs};
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use log::{debug, warn};
use osr_core::catalog::{param_class, ParamClass};
use osr_core::names::{param::*, proj::*};
use osr_core::node::{Node, NodeKind};

pub const PARAM_COUNT: usize = 15;

pub const GEO: i64 = 0;
pub const UTM: i64 = 1;
pub const SPCS: i64 = 2;
pub const ALBERS: i64 = 3;
pub const LAMCC: i64 = 4;
pub const MERCAT: i64 = 5;
pub const PS: i64 = 6;
pub const POLYC: i64 = 7;
pub const EQUIDC: i64 = 8;
pub const TM: i64 = 9;
pub const STEREO: i64 = 10;
pub const LAMAZ: i64 = 11;
pub const AZMEQD: i64 = 12;
pub const GNOMON: i64 = 13;
pub const ORTHO: i64 = 14;
pub const SNSOID: i64 = 16;
pub const EQRECT: i64 = 17;
pub const MILLER: i64 = 18;
pub const VGRINT: i64 = 19;
pub const HOM: i64 = 20;
pub const ROBIN: i64 = 21;
pub const GOOD: i64 = 24;
pub const MOLL: i64 = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct UsgsDefinition {
    pub projection: i64,
    /// UTM and State Plane zone, negative for the southern hemisphere
    pub zone: i64,
    pub params: [f64; PARAM_COUNT],
    /// GCTP spheroid code, negative when the axes are in `params[0..2]`
    pub datum: i64,
}

impl UsgsDefinition {
    /// Takes the parameters as a slice, which must hold exactly 15 values.
    pub fn from_slice(projection: i64, zone: i64, params: &[f64], datum: i64) -> Result<Self> {
        let params: [f64; PARAM_COUNT] = params.try_into().map_err(|_| Error::ArrayLengthError {
            format: "USGS",
            expected: PARAM_COUNT,
            found: params.len(),
        })?;
        Ok(UsgsDefinition {
            projection,
            zone,
            params,
            datum,
        })
    }
}

/// Packed `DDDMMMSSS.SS` to decimal degrees.
pub fn unpack_dms(packed: f64) -> f64 {
    let sign = if packed < 0.0 { -1.0 } else { 1.0 };
    let v = packed.abs();
    let degrees = (v / 1_000_000.0).floor();
    let minutes = ((v - degrees * 1_000_000.0) / 1000.0).floor();
    let seconds = v - degrees * 1_000_000.0 - minutes * 1000.0;
    sign * (degrees + minutes / 60.0 + seconds / 3600.0)
}

/// Decimal degrees to packed `DDDMMMSSS.SS`.
pub fn pack_dms(degrees: f64) -> f64 {
    let sign = if degrees < 0.0 { -1.0 } else { 1.0 };
    let v = degrees.abs();
    let mut d = v.floor();
    let mut m = ((v - d) * 60.0).floor();
    let mut s = ((v - d) * 60.0 - m) * 60.0;
    // keep 59.999... from spilling into a 60 second field
    s = (s * 100.0).round() / 100.0;
    if s >= 60.0 {
        s -= 60.0;
        m += 1.0;
    }
    if m >= 60.0 {
        m -= 60.0;
        d += 1.0;
    }
    sign * (d * 1_000_000.0 + m * 1000.0 + s)
}

/// Where a WKT method's parameters go in the array.
struct Layout {
    method: &'static str,
    code: i64,
    slots: &'static [(usize, &'static str)],
}

const FE_FN: [(usize, &str); 2] = [(6, FALSE_EASTING), (7, FALSE_NORTHING)];

static LAYOUTS: &[Layout] = &[
    Layout { method: TRANSVERSE_MERCATOR, code: TM, slots: &[(2, SCALE_FACTOR), (4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: ALBERS_CONIC_EQUAL_AREA, code: ALBERS, slots: &[(2, STANDARD_PARALLEL_1), (3, STANDARD_PARALLEL_2), (4, LONGITUDE_OF_CENTER), (5, LATITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: LAMBERT_CONFORMAL_CONIC_2SP, code: LAMCC, slots: &[(2, STANDARD_PARALLEL_1), (3, STANDARD_PARALLEL_2), (4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: MERCATOR_1SP, code: MERCAT, slots: &[(4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: MERCATOR_2SP, code: MERCAT, slots: &[(4, CENTRAL_MERIDIAN), (5, STANDARD_PARALLEL_1), FE_FN[0], FE_FN[1]] },
    Layout { method: POLAR_STEREOGRAPHIC, code: PS, slots: &[(4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: POLYCONIC, code: POLYC, slots: &[(4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: EQUIDISTANT_CONIC, code: EQUIDC, slots: &[(2, STANDARD_PARALLEL_1), (3, STANDARD_PARALLEL_2), (4, LONGITUDE_OF_CENTER), (5, LATITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: STEREOGRAPHIC, code: STEREO, slots: &[(4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: LAMBERT_AZIMUTHAL_EQUAL_AREA, code: LAMAZ, slots: &[(4, LONGITUDE_OF_CENTER), (5, LATITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: AZIMUTHAL_EQUIDISTANT, code: AZMEQD, slots: &[(4, LONGITUDE_OF_CENTER), (5, LATITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: GNOMONIC, code: GNOMON, slots: &[(4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: ORTHOGRAPHIC, code: ORTHO, slots: &[(4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: SINUSOIDAL, code: SNSOID, slots: &[(4, LONGITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: EQUIRECTANGULAR, code: EQRECT, slots: &[(4, CENTRAL_MERIDIAN), (5, LATITUDE_OF_ORIGIN), FE_FN[0], FE_FN[1]] },
    Layout { method: MILLER_CYLINDRICAL, code: MILLER, slots: &[(4, LONGITUDE_OF_CENTER), (5, LATITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: VAN_DER_GRINTEN, code: VGRINT, slots: &[(4, CENTRAL_MERIDIAN), FE_FN[0], FE_FN[1]] },
    Layout { method: HOTINE_OBLIQUE_MERCATOR, code: HOM, slots: &[(2, SCALE_FACTOR), (3, AZIMUTH), (4, LONGITUDE_OF_CENTER), (5, LATITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: HOTINE_OBLIQUE_MERCATOR_TWO_POINT, code: HOM, slots: &[(2, SCALE_FACTOR), (5, LATITUDE_OF_CENTER), (8, LONGITUDE_OF_POINT_1), (9, LATITUDE_OF_POINT_1), (10, LONGITUDE_OF_POINT_2), (11, LATITUDE_OF_POINT_2), FE_FN[0], FE_FN[1]] },
    Layout { method: ROBINSON, code: ROBIN, slots: &[(4, LONGITUDE_OF_CENTER), FE_FN[0], FE_FN[1]] },
    Layout { method: INTERRUPTED_GOODE_HOMOLOSINE, code: GOOD, slots: &[] },
    Layout { method: MOLLWEIDE, code: MOLL, slots: &[(4, CENTRAL_MERIDIAN), FE_FN[0], FE_FN[1]] },
];

fn set_usgs_datum(srs: &mut SpatialReference, def: &UsgsDefinition) -> Result<()> {
    match def.datum {
        0 => return srs.set_well_known_geog_cs("NAD27"),
        8 => return srs.set_well_known_geog_cs("NAD83"),
        12 => return srs.set_well_known_geog_cs("WGS84"),
        _ => {}
    }
    let (spheroid, a, rf) = if def.datum >= 0 {
        let code = i32::try_from(def.datum).unwrap_or(-1);
        let e = ellipsoid_by_usgs(code)
            .ok_or_else(|| Error::parse("USGS", format!("unknown spheroid code {}", def.datum)))?;
        (e.name, e.semi_major, e.inverse_flattening)
    } else {
        let a = def.params[0];
        let b = def.params[1];
        if a <= 0.0 {
            return Err(Error::parse("USGS", "no spheroid code and no semi major axis"));
        }
        // the second value is a semi minor axis, an eccentricity squared, or 0 for a sphere
        let rf = if b <= 0.0 {
            0.0
        } else if b < 1.0 {
            1.0 / (1.0 - (1.0 - b).sqrt())
        } else if (a - b).abs() < 1e-9 {
            0.0
        } else {
            a / (a - b)
        };
        let name = ellipsoid_by_params(a, rf).map(|e| e.name).unwrap_or("unnamed");
        (name, a, rf)
    };
    srs.set_geog_cs(&GeogCs {
        name: "unknown",
        datum: "unknown",
        spheroid,
        semi_major: a,
        inverse_flattening: rf,
        ..GeogCs::default()
    })
}

impl SpatialReference {
    pub fn from_usgs(def: &UsgsDefinition) -> Result<Self> {
        let mut srs = SpatialReference::new();
        set_usgs_datum(&mut srs, def)?;
        let p = &def.params;
        let dms = |i: usize| unpack_dms(p[i]);
        let (fe, fn_) = (p[6], p[7]);
        match def.projection {
            GEO => {}
            UTM => {
                let zone = i32::try_from(def.zone)
                    .ok()
                    .filter(|z| *z != 0 && (-60..=60).contains(z))
                    .ok_or_else(|| Error::parse("USGS", format!("UTM zone {} is out of range", def.zone)))?;
                srs.set_utm(zone.abs(), zone > 0)?;
            }
            SPCS => return Err(Error::parse("USGS", "State Plane zones are not supported")),
            ALBERS => srs.set_acea(dms(2), dms(3), dms(5), dms(4), fe, fn_)?,
            LAMCC => srs.set_lcc(dms(2), dms(3), dms(5), dms(4), fe, fn_)?,
            MERCAT => srs.set_mercator(dms(5), dms(4), 1.0, fe, fn_)?,
            PS => srs.set_ps(dms(5), dms(4), 1.0, fe, fn_)?,
            POLYC => srs.set_polyconic(dms(5), dms(4), fe, fn_)?,
            EQUIDC => {
                let second = if p[8] == 0.0 { dms(2) } else { dms(3) };
                srs.set_ec(dms(2), second, dms(5), dms(4), fe, fn_)?
            }
            TM => srs.set_tm(dms(5), dms(4), p[2], fe, fn_)?,
            STEREO => srs.set_stereographic(dms(5), dms(4), 1.0, fe, fn_)?,
            LAMAZ => srs.set_laea(dms(5), dms(4), fe, fn_)?,
            AZMEQD => srs.set_ae(dms(5), dms(4), fe, fn_)?,
            GNOMON => srs.set_gnomonic(dms(5), dms(4), fe, fn_)?,
            ORTHO => srs.set_orthographic(dms(5), dms(4), fe, fn_)?,
            SNSOID => srs.set_sinusoidal(dms(4), fe, fn_)?,
            EQRECT => srs.set_equirectangular(dms(5), dms(4), fe, fn_)?,
            MILLER => srs.set_mc(dms(5), dms(4), fe, fn_)?,
            VGRINT => srs.set_vdg(dms(4), fe, fn_)?,
            HOM if p[12] != 0.0 => srs.set_hom(dms(5), dms(4), dms(3), dms(3), p[2], fe, fn_)?,
            HOM => srs.set_hom_2pno(dms(5), dms(9), dms(8), dms(11), dms(10), p[2], fe, fn_)?,
            ROBIN => srs.set_robinson(dms(4), fe, fn_)?,
            GOOD => srs.set_igh()?,
            MOLL => srs.set_mollweide(dms(4), fe, fn_)?,
            other => {
                return Err(Error::parse(
                    "USGS",
                    format!("unsupported projection code {}", other),
                ))
            }
        }
        debug!("imported USGS projection {}", def.projection);
        Ok(srs)
    }

    pub fn import_usgs(&mut self, def: &UsgsDefinition) -> Result<()> {
        *self = SpatialReference::from_usgs(def)?;
        Ok(())
    }

    pub fn to_usgs(&self) -> Result<UsgsDefinition> {
        let root = self.root_or_err()?;
        let mut axes = [0.0; 2];
        let mut def = UsgsDefinition {
            projection: GEO,
            zone: 0,
            params: [0.0; PARAM_COUNT],
            datum: self.usgs_datum(&mut axes)?,
        };
        if def.datum < 0 {
            def.params[..2].copy_from_slice(&axes);
        }
        match root.kind {
            NodeKind::Geogcs => return Ok(def),
            NodeKind::Projcs => {}
            kind => {
                return Err(Error::export("USGS", format!("{} has no GCTP form", kind)));
            }
        }
        if let Some((zone, north)) = self.utm_zone() {
            def.projection = UTM;
            def.zone = i64::from(if north { zone } else { -zone });
            return Ok(def);
        }
        let method = self
            .projection()
            .ok_or_else(|| Error::export("USGS", "PROJCS without PROJECTION"))?;
        let layout = LAYOUTS
            .iter()
            .find(|l| l.method.eq_ignore_ascii_case(method))
            .ok_or_else(|| Error::export("USGS", format!("no GCTP code for {}", method)))?;
        def.projection = layout.code;
        for (slot, param) in layout.slots {
            let value = self.parameter_degrees_metres(param).unwrap_or(0.0);
            def.params[*slot] = match param_class(param) {
                ParamClass::Angular => pack_dms(value),
                _ => value,
            };
        }
        match layout.method {
            EQUIDISTANT_CONIC => def.params[8] = 1.0,
            HOTINE_OBLIQUE_MERCATOR => def.params[12] = 1.0,
            MERCATOR_1SP if self.projection_parameter_or(SCALE_FACTOR, 1.0) != 1.0 => {
                warn!("GCTP Mercator has no scale factor, dropping it");
            }
            _ => {}
        }
        Ok(def)
    }

    /// GCTP spheroid code of the datum. Unknown ones give -1 and the axes.
    fn usgs_datum(&self, axes: &mut [f64; 2]) -> Result<i64> {
        let named = self.datum().and_then(Node::name).and_then(datum_by_name);
        match named.map(|d| d.geogcs_epsg) {
            Some(4267) => return Ok(0),
            Some(4269) => return Ok(8),
            Some(4326) => return Ok(12),
            _ => {}
        }
        let a = self.semi_major()?;
        let rf = self.inverse_flattening()?;
        if let Some(e) = ellipsoid_by_params(a, rf) {
            return Ok(i64::from(e.usgs));
        }
        *axes = [a, self.semi_minor()?];
        Ok(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn packed_dms() {
        assert_relative_eq!(unpack_dms(45030000.0), 45.5);
        assert_relative_eq!(unpack_dms(-96000000.0), -96.0);
        assert_relative_eq!(pack_dms(29.5), 29030000.0);
        assert_relative_eq!(pack_dms(-71.25), -71015000.0);
        assert_relative_eq!(unpack_dms(pack_dms(12.3456789)), 12.3456789, epsilon = 1e-6);
    }

    #[test]
    fn array_length_is_checked() {
        assert!(UsgsDefinition::from_slice(UTM, 33, &[0.0; PARAM_COUNT], 12).is_ok());
        let err = UsgsDefinition::from_slice(UTM, 33, &[0.0; 14], 12).unwrap_err();
        assert!(matches!(
            err,
            Error::ArrayLengthError { expected: 15, found: 14, .. }
        ));
    }

    #[test]
    fn utm_both_ways() {
        let srs = SpatialReference::from_epsg(32633).unwrap();
        let def = srs.to_usgs().unwrap();
        assert_eq!((def.projection, def.zone, def.datum), (UTM, 33, 12));
        assert_eq!(def.params.len(), PARAM_COUNT);
        let back = SpatialReference::from_usgs(&def).unwrap();
        assert!(back.is_same(&srs));

        let south = UsgsDefinition { projection: UTM, zone: -20, params: [0.0; PARAM_COUNT], datum: 8 };
        assert_eq!(SpatialReference::from_usgs(&south).unwrap().utm_zone(), Some((20, false)));
    }

    #[test]
    fn utm_zone_out_of_range() {
        for zone in [0, 61, -61, i64::from(i32::MIN), i64::MIN] {
            let def = UsgsDefinition { projection: UTM, zone, params: [0.0; PARAM_COUNT], datum: 12 };
            assert!(
                matches!(SpatialReference::from_usgs(&def), Err(Error::ParseError { .. })),
                "zone {}",
                zone
            );
        }
    }

    #[test]
    fn albers_both_ways() {
        let mut params = [0.0; PARAM_COUNT];
        params[2] = 29030000.0;
        params[3] = 45030000.0;
        params[4] = -96000000.0;
        params[5] = 23000000.0;
        let def = UsgsDefinition { projection: ALBERS, zone: 0, params, datum: 0 };
        let srs = SpatialReference::from_usgs(&def).unwrap();
        assert_eq!(srs.projection(), Some(ALBERS_CONIC_EQUAL_AREA));
        assert_relative_eq!(srs.projection_parameter(STANDARD_PARALLEL_1).unwrap(), 29.5);
        assert_eq!(srs.geog_cs().unwrap().name(), Some("NAD27"));
        let out = srs.to_usgs().unwrap();
        assert_eq!(out.projection, ALBERS);
        assert_eq!(out.datum, 0);
        for i in 2..=5 {
            assert_relative_eq!(out.params[i], params[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn custom_spheroid() {
        let mut params = [0.0; PARAM_COUNT];
        params[0] = 6371000.0;
        params[2] = 0.9996;
        let def = UsgsDefinition { projection: TM, zone: 0, params, datum: -1 };
        let srs = SpatialReference::from_usgs(&def).unwrap();
        assert_eq!(srs.inverse_flattening().unwrap(), 0.0);
        let out = srs.to_usgs().unwrap();
        assert_eq!(out.datum, -1);
        assert_eq!(out.params[0], 6371000.0);
        assert_eq!(out.params[1], 6371000.0);
        assert_eq!(out.params[2], 0.9996);
    }

    #[test]
    fn unsupported() {
        let def = UsgsDefinition { projection: SPCS, zone: 3301, params: [0.0; PARAM_COUNT], datum: 0 };
        assert!(SpatialReference::from_usgs(&def).is_err());
        let mut krovak = SpatialReference::new();
        krovak.set_well_known_geog_cs("WGS84").unwrap();
        krovak.set_krovak(49.5, 24.83, 30.28, 78.5, 0.9999, 0.0, 0.0).unwrap();
        assert!(matches!(krovak.to_usgs(), Err(Error::ExportError { .. })));
    }
}
