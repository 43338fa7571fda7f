//! PCI Geomatics projection strings with their 17 parameters.
//!
//! The projection string is the method name, a zone for UTM and the earth model:
//! `Dnnn` for a datum or `Ennn` for an ellipsoid, e.g. `UTM    33 D000`.
//! Southern UTM zones are written with a negative zone number.
use crate::datums::{datum_by_name, datum_by_pci, ellipsoid_by_params, ellipsoid_by_usgs, GeogCs};
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use log::{debug, trace};
use osr_core::catalog::{self, param_class, ParamClass};
use osr_core::names::{param::*, proj::*};
use osr_core::node::{Node, NodeKind};
use osr_core::units::{factors_match, FOOT_TO_METRE, US_FOOT_TO_METRE};

pub const PARAM_COUNT: usize = 17;

/// Earth model used for custom axes, which go in `params[0..2]`.
const CUSTOM_ELLIPSOID: &str = "E999";

#[derive(Debug, Clone, PartialEq)]
pub struct PciDefinition {
    pub projection: String,
    pub units: String,
    pub params: [f64; PARAM_COUNT],
}

impl PciDefinition {
    /// Takes the parameters as a slice, which must hold exactly 17 values.
    pub fn from_slice(projection: &str, units: &str, params: &[f64]) -> Result<Self> {
        let params: [f64; PARAM_COUNT] = params.try_into().map_err(|_| Error::ArrayLengthError {
            format: "PCI",
            expected: PARAM_COUNT,
            found: params.len(),
        })?;
        Ok(PciDefinition {
            projection: projection.to_owned(),
            units: units.to_owned(),
            params,
        })
    }
}

struct Layout {
    method: &'static str,
    pci: &'static str,
    slots: &'static [(usize, &'static str)],
}

const FE: (usize, &str) = (6, FALSE_EASTING);
const FN: (usize, &str) = (7, FALSE_NORTHING);

static LAYOUTS: &[Layout] = &[
    Layout { method: TRANSVERSE_MERCATOR, pci: "TM", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), (8, SCALE_FACTOR), FE, FN] },
    Layout { method: ALBERS_CONIC_EQUAL_AREA, pci: "ACEA", slots: &[(2, LONGITUDE_OF_CENTER), (3, LATITUDE_OF_CENTER), (4, STANDARD_PARALLEL_1), (5, STANDARD_PARALLEL_2), FE, FN] },
    Layout { method: AZIMUTHAL_EQUIDISTANT, pci: "AE", slots: &[(2, LONGITUDE_OF_CENTER), (3, LATITUDE_OF_CENTER), FE, FN] },
    Layout { method: EQUIDISTANT_CONIC, pci: "EC", slots: &[(2, LONGITUDE_OF_CENTER), (3, LATITUDE_OF_CENTER), (4, STANDARD_PARALLEL_1), (5, STANDARD_PARALLEL_2), FE, FN] },
    Layout { method: EQUIRECTANGULAR, pci: "ER", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), FE, FN] },
    Layout { method: GNOMONIC, pci: "GNO", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), FE, FN] },
    Layout { method: LAMBERT_AZIMUTHAL_EQUAL_AREA, pci: "LAEA", slots: &[(2, LONGITUDE_OF_CENTER), (3, LATITUDE_OF_CENTER), FE, FN] },
    Layout { method: LAMBERT_CONFORMAL_CONIC_2SP, pci: "LCC", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), (4, STANDARD_PARALLEL_1), (5, STANDARD_PARALLEL_2), FE, FN] },
    Layout { method: LAMBERT_CONFORMAL_CONIC_1SP, pci: "LCC_1SP", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), (8, SCALE_FACTOR), FE, FN] },
    Layout { method: MILLER_CYLINDRICAL, pci: "MC", slots: &[(2, LONGITUDE_OF_CENTER), (3, LATITUDE_OF_CENTER), FE, FN] },
    Layout { method: MERCATOR_1SP, pci: "MER", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), (8, SCALE_FACTOR), FE, FN] },
    Layout { method: ORTHOGRAPHIC, pci: "OG", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), FE, FN] },
    Layout { method: HOTINE_OBLIQUE_MERCATOR, pci: "OM", slots: &[(2, LONGITUDE_OF_CENTER), (3, LATITUDE_OF_CENTER), (14, AZIMUTH), (8, SCALE_FACTOR), FE, FN] },
    Layout { method: POLYCONIC, pci: "PC", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), FE, FN] },
    Layout { method: POLAR_STEREOGRAPHIC, pci: "PS", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), (8, SCALE_FACTOR), FE, FN] },
    Layout { method: ROBINSON, pci: "ROB", slots: &[(2, LONGITUDE_OF_CENTER), FE, FN] },
    Layout { method: STEREOGRAPHIC, pci: "SG", slots: &[(2, CENTRAL_MERIDIAN), (3, LATITUDE_OF_ORIGIN), (8, SCALE_FACTOR), FE, FN] },
    Layout { method: SINUSOIDAL, pci: "SIN", slots: &[(2, LONGITUDE_OF_CENTER), FE, FN] },
    Layout { method: VAN_DER_GRINTEN, pci: "VDG", slots: &[(2, CENTRAL_MERIDIAN), FE, FN] },
];

/// The pieces of a projection string.
#[derive(Debug, PartialEq)]
struct ProjectionString {
    name: String,
    zone: Option<i32>,
    earth: Option<String>,
}

fn split_projection(text: &str) -> Result<ProjectionString> {
    let mut tokens = text.split_whitespace();
    let name = tokens
        .next()
        .ok_or_else(|| Error::parse("PCI", "empty projection string"))?
        .to_ascii_uppercase();
    let mut out = ProjectionString { name, zone: None, earth: None };
    for token in tokens {
        let upper = token.to_ascii_uppercase();
        if let Ok(zone) = upper.parse::<i32>() {
            out.zone = Some(zone);
        } else if (upper.starts_with('D') || upper.starts_with('E')) && upper.len() == 4 {
            out.earth = Some(upper);
        } else {
            return Err(Error::parse("PCI", format!("unexpected {:?} in projection string", token)));
        }
    }
    Ok(out)
}

fn set_earth_model(srs: &mut SpatialReference, earth: Option<&str>, params: &[f64; PARAM_COUNT]) -> Result<()> {
    let earth = earth.unwrap_or("D000");
    if let Some(datum) = datum_by_pci(earth) {
        return srs.replace_geog_cs(datum.geogcs_node()?);
    }
    if earth == CUSTOM_ELLIPSOID {
        let (a, b) = (params[0], params[1]);
        if a <= 0.0 {
            return Err(Error::parse("PCI", "E999 without semi major axis"));
        }
        let rf = if b <= 0.0 || (a - b).abs() < 1e-9 { 0.0 } else { a / (a - b) };
        return srs.set_geog_cs(&GeogCs {
            name: "unknown",
            datum: "unknown",
            spheroid: ellipsoid_by_params(a, rf).map(|e| e.name).unwrap_or("unnamed"),
            semi_major: a,
            inverse_flattening: rf,
            ..GeogCs::default()
        });
    }
    let ellipsoid = earth
        .strip_prefix('E')
        .and_then(|code| code.parse::<i32>().ok())
        .and_then(ellipsoid_by_usgs)
        .ok_or_else(|| Error::parse("PCI", format!("unknown earth model {}", earth)))?;
    srs.set_geog_cs(&GeogCs {
        name: "unknown",
        datum: "unknown",
        spheroid: ellipsoid.name,
        semi_major: ellipsoid.semi_major,
        inverse_flattening: ellipsoid.inverse_flattening,
        ..GeogCs::default()
    })
}

fn pci_units(units: &str) -> Option<(&'static str, f64)> {
    match units.trim().to_ascii_uppercase().as_str() {
        "" | "METRE" | "METER" | "METRES" | "METERS" => Some(("metre", 1.0)),
        "FEET" | "FOOT" | "US FEET" => Some(("US survey foot", US_FOOT_TO_METRE)),
        "INTL FEET" | "INTERNATIONAL FEET" => Some(("foot", FOOT_TO_METRE)),
        _ => None,
    }
}

impl SpatialReference {
    pub fn from_pci(def: &PciDefinition) -> Result<Self> {
        let parts = split_projection(&def.projection)?;
        trace!("PCI projection string {:?}", parts);
        let mut srs = SpatialReference::new();
        if matches!(parts.name.as_str(), "METER" | "METRE") {
            srs.set_local_cs("Local")?;
            srs.set_linear_units("metre", 1.0)?;
            return Ok(srs);
        }
        set_earth_model(&mut srs, parts.earth.as_deref(), &def.params)?;
        let units = || {
            pci_units(&def.units)
                .ok_or_else(|| Error::parse("PCI", format!("unknown units {:?}", def.units)))
        };
        match parts.name.as_str() {
            "LONG/LAT" | "LONG" | "LAT/LONG" => return Ok(srs),
            "UTM" => {
                let zone = parts
                    .zone
                    .filter(|z| *z != 0 && (-60..=60).contains(z))
                    .ok_or_else(|| Error::parse("PCI", "UTM without a zone in -60..=60"))?;
                srs.set_utm(zone.abs(), zone > 0)?;
                let (name, factor) = units()?;
                srs.set_linear_units_and_update_parameters(name, factor)?;
                return Ok(srs);
            }
            "SPCS" | "SPIF" => return Err(Error::parse("PCI", "State Plane zones are not supported")),
            _ => {}
        }
        let layout = LAYOUTS
            .iter()
            .find(|l| l.pci == parts.name)
            .ok_or_else(|| Error::parse("PCI", format!("unsupported projection {}", parts.name)))?;
        srs.set_projection(layout.method)?;
        let (name, factor) = units()?;
        srs.set_linear_units(name, factor)?;
        let descriptor = catalog::method(layout.method)
            .ok_or_else(|| Error::parse("PCI", format!("unsupported projection {}", parts.name)))?;
        for param in descriptor.params {
            let slot = layout.slots.iter().find(|(_, p)| p == param).map(|(i, _)| *i);
            let slot = match (slot, *param) {
                (None, RECTIFIED_GRID_ANGLE) => Some(14),
                (slot, _) => slot,
            };
            let value = match slot.map(|i| def.params[i]) {
                Some(v) if *param == SCALE_FACTOR && v == 0.0 => 1.0,
                Some(v) => v,
                None => catalog::default_value(layout.method, param).unwrap_or(0.0),
            };
            // linear values are already in the definition's units
            srs.set_projection_parameter(param, value)?;
        }
        debug!("imported PCI projection {}", parts.name);
        Ok(srs)
    }

    pub fn import_pci(&mut self, def: &PciDefinition) -> Result<()> {
        *self = SpatialReference::from_pci(def)?;
        Ok(())
    }

    pub fn to_pci(&self) -> Result<PciDefinition> {
        let root = self.root_or_err()?;
        let mut params = [0.0; PARAM_COUNT];
        if root.kind == NodeKind::LocalCs {
            return Ok(PciDefinition {
                projection: pad("METRE"),
                units: "METRE".to_owned(),
                params,
            });
        }
        let earth = self.pci_earth_model(&mut params)?;
        let (name, units) = match root.kind {
            NodeKind::Geogcs => ("LONG/LAT".to_owned(), "DEGREE".to_owned()),
            NodeKind::Projcs => {
                let (_, factor) = self.linear_units();
                let units = if factors_match(factor, 1.0) {
                    "METRE"
                } else if factors_match(factor, US_FOOT_TO_METRE) {
                    "FEET"
                } else if factors_match(factor, FOOT_TO_METRE) {
                    "INTL FEET"
                } else {
                    return Err(Error::export("PCI", format!("no PCI units for factor {}", factor)));
                };
                if let Some((zone, north)) = self.utm_zone() {
                    let zone = if north { zone } else { -zone };
                    (format!("UTM    {}", zone), units.to_owned())
                } else {
                    (self.pci_projection(&mut params)?.to_owned(), units.to_owned())
                }
            }
            kind => return Err(Error::export("PCI", format!("{} has no PCI form", kind))),
        };
        Ok(PciDefinition {
            projection: pad(&format!("{} {}", name, earth)),
            units,
            params,
        })
    }

    fn pci_projection(&self, params: &mut [f64; PARAM_COUNT]) -> Result<&'static str> {
        let method = self
            .projection()
            .ok_or_else(|| Error::export("PCI", "PROJCS without PROJECTION"))?;
        let layout = LAYOUTS
            .iter()
            .find(|l| l.method.eq_ignore_ascii_case(method))
            .ok_or_else(|| Error::export("PCI", format!("no PCI form for {}", method)))?;
        for (slot, param) in layout.slots {
            let value = match param_class(param) {
                ParamClass::Angular => self.parameter_degrees_metres(param),
                _ => self.projection_parameter(param),
            };
            params[*slot] = value
                .or_else(|| catalog::default_value(layout.method, param))
                .unwrap_or(0.0);
        }
        Ok(layout.pci)
    }

    fn pci_earth_model(&self, params: &mut [f64; PARAM_COUNT]) -> Result<String> {
        if let Some(d) = self.datum().and_then(Node::name).and_then(datum_by_name) {
            return Ok(d.pci.to_owned());
        }
        let a = self.semi_major()?;
        let rf = self.inverse_flattening()?;
        if let Some(e) = ellipsoid_by_params(a, rf) {
            return Ok(format!("E{:03}", e.usgs));
        }
        params[0] = a;
        params[1] = self.semi_minor()?;
        Ok(CUSTOM_ELLIPSOID.to_owned())
    }
}

/// Projection strings are 16 characters wide.
fn pad(text: &str) -> String {
    format!("{:<16}", text)
}
