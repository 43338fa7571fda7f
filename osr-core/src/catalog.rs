//! The projection methods this crate knows, and what parameters each one takes.
use crate::names::{param::*, proj::*};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Long,
    Lat,
    Angle,
    Ratio,
    Linear,
    Integer,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Long => "Long",
            ValueType::Lat => "Lat",
            ValueType::Angle => "Angle",
            ValueType::Ratio => "Ratio",
            ValueType::Linear => "m",
            ValueType::Integer => "Integer",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which unit a raw parameter value is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamClass {
    /// GEOGCS angular unit
    Angular,
    /// PROJCS linear unit
    Linear,
    Unitless,
}

#[derive(Debug)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub value_type: ValueType,
    pub default: f64,
}

#[derive(Debug)]
pub struct ProjectionMethodDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub params: &'static [&'static str],
}

impl ProjectionMethodDescriptor {
    pub fn parameters(&self) -> impl Iterator<Item = &'static ParamDescriptor> + '_ {
        self.params.iter().filter_map(|p| parameter(p))
    }

    pub fn takes(&self, param: &str) -> bool {
        self.params.iter().any(|p| p.eq_ignore_ascii_case(param))
    }
}

/// What `parameter_info` hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub label: &'static str,
    pub value_type: ValueType,
    pub default: f64,
}

macro_rules! param {
    ($name:expr, $label:expr, $ty:ident, $default:expr) => {
        ParamDescriptor {
            name: $name,
            label: $label,
            value_type: ValueType::$ty,
            default: $default,
        }
    };
}

pub static PARAMETERS: &[ParamDescriptor] = &[
    param!(CENTRAL_MERIDIAN, "Central Meridian", Long, 0.0),
    param!(SCALE_FACTOR, "Scale Factor", Ratio, 1.0),
    param!(STANDARD_PARALLEL_1, "Standard Parallel 1", Lat, 0.0),
    param!(STANDARD_PARALLEL_2, "Standard Parallel 2", Lat, 0.0),
    param!(PSEUDO_STANDARD_PARALLEL_1, "Pseudo Standard Parallel 1", Lat, 0.0),
    param!(LONGITUDE_OF_CENTER, "Center Longitude", Long, 0.0),
    param!(LATITUDE_OF_CENTER, "Center Latitude", Lat, 0.0),
    param!(LATITUDE_OF_ORIGIN, "Origin Latitude", Lat, 0.0),
    param!(FALSE_EASTING, "False Easting", Linear, 0.0),
    param!(FALSE_NORTHING, "False Northing", Linear, 0.0),
    param!(AZIMUTH, "Azimuth", Angle, 0.0),
    param!(LONGITUDE_OF_POINT_1, "Point 1 Longitude", Long, 0.0),
    param!(LATITUDE_OF_POINT_1, "Point 1 Latitude", Lat, 0.0),
    param!(LONGITUDE_OF_POINT_2, "Point 2 Longitude", Long, 0.0),
    param!(LATITUDE_OF_POINT_2, "Point 2 Latitude", Lat, 0.0),
    param!(RECTIFIED_GRID_ANGLE, "Rectified Grid Angle", Angle, 0.0),
    param!(SATELLITE_HEIGHT, "Satellite Height", Linear, 35785831.0),
    param!(LATITUDE_OF_1ST_POINT, "Latitude of 1st Point", Lat, 0.0),
    param!(LONGITUDE_OF_1ST_POINT, "Longitude of 1st Point", Long, 0.0),
    param!(LATITUDE_OF_2ND_POINT, "Latitude of 2nd Point", Lat, 0.0),
    param!(LONGITUDE_OF_2ND_POINT, "Longitude of 2nd Point", Long, 0.0),
];

macro_rules! method {
    ($name:expr, $label:expr, [$($param:expr),* $(,)?]) => {
        ProjectionMethodDescriptor {
            name: $name,
            label: $label,
            params: &[$($param),*],
        }
    };
}

const ORIGIN_CM_FE_FN: [&str; 4] = [LATITUDE_OF_ORIGIN, CENTRAL_MERIDIAN, FALSE_EASTING, FALSE_NORTHING];
const CENTER_FE_FN: [&str; 4] = [LATITUDE_OF_CENTER, LONGITUDE_OF_CENTER, FALSE_EASTING, FALSE_NORTHING];
const CM_FE_FN: [&str; 3] = [CENTRAL_MERIDIAN, FALSE_EASTING, FALSE_NORTHING];
const SCALED: [&str; 5] = [LATITUDE_OF_ORIGIN, CENTRAL_MERIDIAN, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING];
const LCC_2SP: [&str; 6] = [
    STANDARD_PARALLEL_1,
    STANDARD_PARALLEL_2,
    LATITUDE_OF_ORIGIN,
    CENTRAL_MERIDIAN,
    FALSE_EASTING,
    FALSE_NORTHING,
];
const HOTINE: [&str; 7] = [
    LATITUDE_OF_CENTER,
    LONGITUDE_OF_CENTER,
    AZIMUTH,
    RECTIFIED_GRID_ANGLE,
    SCALE_FACTOR,
    FALSE_EASTING,
    FALSE_NORTHING,
];

pub static METHODS: &[ProjectionMethodDescriptor] = &[
    method!(ALBERS_CONIC_EQUAL_AREA, "Albers Conic Equal Area", [
        STANDARD_PARALLEL_1, STANDARD_PARALLEL_2, LATITUDE_OF_CENTER, LONGITUDE_OF_CENTER,
        FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: AZIMUTHAL_EQUIDISTANT, label: "Azimuthal Equidistant", params: &CENTER_FE_FN },
    method!(BONNE, "Bonne", [STANDARD_PARALLEL_1, CENTRAL_MERIDIAN, FALSE_EASTING, FALSE_NORTHING]),
    method!(CYLINDRICAL_EQUAL_AREA, "Cylindrical Equal Area", [
        STANDARD_PARALLEL_1, CENTRAL_MERIDIAN, FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: CASSINI_SOLDNER, label: "Cassini/Soldner", params: &ORIGIN_CM_FE_FN },
    method!(EQUIDISTANT_CONIC, "Equidistant Conic", [
        STANDARD_PARALLEL_1, STANDARD_PARALLEL_2, LATITUDE_OF_CENTER, LONGITUDE_OF_CENTER,
        FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: ECKERT_I, label: "Eckert I", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: ECKERT_II, label: "Eckert II", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: ECKERT_III, label: "Eckert III", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: ECKERT_IV, label: "Eckert IV", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: ECKERT_V, label: "Eckert V", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: ECKERT_VI, label: "Eckert VI", params: &CM_FE_FN },
    method!(EQUIRECTANGULAR, "Equirectangular", [
        LATITUDE_OF_ORIGIN, CENTRAL_MERIDIAN, STANDARD_PARALLEL_1, FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: GALL_STEREOGRAPHIC, label: "Gall Stereographic", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: GAUSS_SCHREIBER_TM, label: "Gauss Schreiber Transverse Mercator", params: &SCALED },
    method!(GEOSTATIONARY_SATELLITE, "Geostationary Satellite", [
        CENTRAL_MERIDIAN, SATELLITE_HEIGHT, FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: GOODE_HOMOLOSINE, label: "Goode Homolosine", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: INTERRUPTED_GOODE_HOMOLOSINE, label: "Interrupted Goode Homolosine", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: GNOMONIC, label: "Gnomonic", params: &ORIGIN_CM_FE_FN },
    ProjectionMethodDescriptor { name: HOTINE_OBLIQUE_MERCATOR, label: "Oblique Mercator", params: &HOTINE },
    ProjectionMethodDescriptor {
        name: HOTINE_OBLIQUE_MERCATOR_AZIMUTH_CENTER,
        label: "Hotine Oblique Mercator Azimuth Center",
        params: &HOTINE,
    },
    method!(HOTINE_OBLIQUE_MERCATOR_TWO_POINT, "Hotine Oblique Mercator Two Point Natural Origin", [
        LATITUDE_OF_CENTER, LATITUDE_OF_POINT_1, LONGITUDE_OF_POINT_1, LATITUDE_OF_POINT_2,
        LONGITUDE_OF_POINT_2, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING,
    ]),
    method!(IMW_POLYCONIC, "International Map of the World Polyconic", [
        LATITUDE_OF_1ST_POINT, LATITUDE_OF_2ND_POINT, CENTRAL_MERIDIAN, FALSE_EASTING,
        FALSE_NORTHING,
    ]),
    method!(KROVAK, "Krovak", [
        LATITUDE_OF_CENTER, LONGITUDE_OF_CENTER, AZIMUTH, PSEUDO_STANDARD_PARALLEL_1,
        SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: LAMBERT_AZIMUTHAL_EQUAL_AREA, label: "Lambert Azimuthal Equal Area", params: &CENTER_FE_FN },
    ProjectionMethodDescriptor { name: LAMBERT_CONFORMAL_CONIC_1SP, label: "Lambert Conformal Conic 1SP", params: &SCALED },
    ProjectionMethodDescriptor { name: LAMBERT_CONFORMAL_CONIC_2SP, label: "Lambert Conformal Conic (2SP)", params: &LCC_2SP },
    ProjectionMethodDescriptor {
        name: LAMBERT_CONFORMAL_CONIC_2SP_BELGIUM,
        label: "Lambert Conformal Conic (2SP - Belgium)",
        params: &LCC_2SP,
    },
    ProjectionMethodDescriptor { name: MILLER_CYLINDRICAL, label: "Miller Cylindrical", params: &CENTER_FE_FN },
    ProjectionMethodDescriptor { name: MERCATOR_1SP, label: "Mercator", params: &SCALED },
    method!(MERCATOR_2SP, "Mercator (2SP)", [
        STANDARD_PARALLEL_1, LATITUDE_OF_ORIGIN, CENTRAL_MERIDIAN, FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: MOLLWEIDE, label: "Mollweide", params: &CM_FE_FN },
    ProjectionMethodDescriptor { name: NEW_ZEALAND_MAP_GRID, label: "New Zealand Map Grid", params: &ORIGIN_CM_FE_FN },
    ProjectionMethodDescriptor { name: OBLIQUE_STEREOGRAPHIC, label: "Oblique Stereographic", params: &SCALED },
    ProjectionMethodDescriptor { name: ORTHOGRAPHIC, label: "Orthographic", params: &ORIGIN_CM_FE_FN },
    ProjectionMethodDescriptor { name: POLYCONIC, label: "Polyconic", params: &ORIGIN_CM_FE_FN },
    ProjectionMethodDescriptor { name: POLAR_STEREOGRAPHIC, label: "Polar Stereographic", params: &SCALED },
    method!(ROBINSON, "Robinson", [LONGITUDE_OF_CENTER, FALSE_EASTING, FALSE_NORTHING]),
    method!(SINUSOIDAL, "Sinusoidal", [LONGITUDE_OF_CENTER, FALSE_EASTING, FALSE_NORTHING]),
    ProjectionMethodDescriptor { name: STEREOGRAPHIC, label: "Stereographic", params: &SCALED },
    ProjectionMethodDescriptor { name: SWISS_OBLIQUE_CYLINDRICAL, label: "Swiss Oblique Cylindrical", params: &CENTER_FE_FN },
    ProjectionMethodDescriptor { name: TRANSVERSE_MERCATOR, label: "Transverse Mercator", params: &SCALED },
    ProjectionMethodDescriptor {
        name: TRANSVERSE_MERCATOR_SOUTH_ORIENTED,
        label: "Transverse Mercator (South Oriented)",
        params: &SCALED,
    },
    ProjectionMethodDescriptor { name: TUNISIA_MINING_GRID, label: "Tunisia Mining Grid", params: &ORIGIN_CM_FE_FN },
    method!(TWO_POINT_EQUIDISTANT, "Two Point Equidistant", [
        LATITUDE_OF_1ST_POINT, LONGITUDE_OF_1ST_POINT, LATITUDE_OF_2ND_POINT,
        LONGITUDE_OF_2ND_POINT, FALSE_EASTING, FALSE_NORTHING,
    ]),
    ProjectionMethodDescriptor { name: VAN_DER_GRINTEN, label: "VanDerGrinten", params: &CM_FE_FN },
];

/// Iterator over the names of every known method. Clone it to start over.
#[derive(Debug, Clone)]
pub struct ProjectionMethods {
    inner: std::slice::Iter<'static, ProjectionMethodDescriptor>,
}

impl Iterator for ProjectionMethods {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|m| m.name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ProjectionMethods {}

pub fn projection_methods() -> ProjectionMethods {
    ProjectionMethods {
        inner: METHODS.iter(),
    }
}

pub fn method(name: &str) -> Option<&'static ProjectionMethodDescriptor> {
    METHODS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

pub fn parameter(name: &str) -> Option<&'static ParamDescriptor> {
    PARAMETERS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Parameter names for `method`, in WKT order, and the method's user facing label.
pub fn parameter_list(method_name: &str) -> Option<(Vec<&'static str>, &'static str)> {
    method(method_name).map(|m| (m.params.to_vec(), m.label))
}

/// `None` when either the method is unknown or it has no such parameter.
pub fn parameter_info(method_name: &str, param_name: &str) -> Option<ParameterInfo> {
    let m = method(method_name)?;
    if !m.takes(param_name) {
        return None;
    }
    parameter(param_name).map(|p| ParameterInfo {
        label: p.label,
        value_type: p.value_type,
        default: p.default,
    })
}

pub fn param_class(name: &str) -> ParamClass {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("longitude")
        || lower.starts_with("latitude")
        || lower.starts_with("standard_parallel")
        || lower == CENTRAL_MERIDIAN
        || lower == PSEUDO_STANDARD_PARALLEL_1
        || lower == AZIMUTH
        || lower == RECTIFIED_GRID_ANGLE
    {
        ParamClass::Angular
    } else if lower == FALSE_EASTING
        || lower == FALSE_NORTHING
        || lower == SATELLITE_HEIGHT
        || lower == "perspective_point_height"
    {
        ParamClass::Linear
    } else {
        ParamClass::Unitless
    }
}

/// Default to use when a parameter the method takes is absent from a definition.
pub fn default_value(method_name: &str, param_name: &str) -> Option<f64> {
    parameter_info(method_name, param_name).map(|i| i.default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_method_parameter_is_described() {
        for m in METHODS {
            for p in m.params {
                assert!(parameter(p).is_some(), "{} lists unknown {}", m.name, p);
            }
        }
    }

    #[test]
    fn methods_iterator_restarts() {
        let iter = projection_methods();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), METHODS.len());
        assert!(first.contains(&"Transverse_Mercator"));
    }

    #[test]
    fn parameter_list_for_tm() {
        let (params, label) = parameter_list("transverse_mercator").unwrap();
        assert_eq!(label, "Transverse Mercator");
        assert_eq!(
            params,
            vec![
                "latitude_of_origin",
                "central_meridian",
                "scale_factor",
                "false_easting",
                "false_northing"
            ]
        );
        assert!(parameter_list("Not_A_Projection").is_none());
    }

    #[test]
    fn parameter_info_found_flag() {
        let info = parameter_info("Transverse_Mercator", "scale_factor").unwrap();
        assert_eq!(info.value_type, ValueType::Ratio);
        assert_eq!(info.default, 1.0);
        assert!(parameter_info("Transverse_Mercator", "standard_parallel_1").is_none());
        assert!(parameter_info("Nope", "scale_factor").is_none());
    }

    #[test]
    fn classes() {
        assert_eq!(param_class("Central_Meridian"), ParamClass::Angular);
        assert_eq!(param_class("false_easting"), ParamClass::Linear);
        assert_eq!(param_class("scale_factor"), ParamClass::Unitless);
    }
}
