//! Angular and linear units with their factors to radians and metres.
use crate::config::Strictness;
use crate::result::{Error, Result};
use lazy_static::lazy_static;
use log::{trace, warn};
use std::collections::HashMap;

pub const DEGREE_TO_RADIAN: f64 = 0.0174532925199433;
pub const US_FOOT_TO_METRE: f64 = 0.304800609601219;
pub const FOOT_TO_METRE: f64 = 0.3048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Angular,
    Linear,
}

/// A registered unit. `name` is the spelling written into WKT.
#[derive(Debug)]
pub struct Unit {
    pub name: &'static str,
    pub kind: UnitKind,
    pub factor: f64,
    pub aliases: &'static [&'static str],
    pub proj4: Option<&'static str>,
    pub esri: &'static str,
    pub mapinfo: Option<&'static str>,
}

macro_rules! unit {
    ($name:expr, $kind:ident, $factor:expr, [$($alias:expr),*], $proj4:expr, $esri:expr, $mapinfo:expr) => {
        Unit {
            name: $name,
            kind: UnitKind::$kind,
            factor: $factor,
            aliases: &[$($alias),*],
            proj4: $proj4,
            esri: $esri,
            mapinfo: $mapinfo,
        }
    };
}

pub static UNITS: &[Unit] = &[
    unit!("radian", Angular, 1.0, ["radians", "rad"], None, "Radian", None),
    unit!("degree", Angular, DEGREE_TO_RADIAN, ["degrees", "deg", "degree (supplier to define representation)"], None, "Degree", None),
    unit!("arc-minute", Angular, 0.000290888208665721, ["arc minute", "minute"], None, "Minute", None),
    unit!("arc-second", Angular, 4.84813681109536e-06, ["arc second", "second"], None, "Second", None),
    unit!("grad", Angular, 0.0157079632679490, ["gon", "grads"], None, "Grad", None),
    unit!("microradian", Angular, 1e-6, ["urad"], None, "Microradian", None),
    unit!("mil_6400", Angular, 0.000981747704246810, ["mil"], None, "Mil_6400", None),
    unit!("metre", Linear, 1.0, ["meter", "meters", "metres", "m"], Some("m"), "Meter", Some("m")),
    unit!("kilometre", Linear, 1000.0, ["kilometer", "kilometers", "kilometres", "km"], Some("km"), "Kilometer", Some("km")),
    unit!("centimetre", Linear, 0.01, ["centimeter", "cm"], Some("cm"), "Centimeter", Some("cm")),
    unit!("millimetre", Linear, 0.001, ["millimeter", "mm"], Some("mm"), "Millimeter", Some("mm")),
    unit!("foot", Linear, FOOT_TO_METRE, ["feet", "international foot", "foot_international", "ft"], Some("ft"), "Foot", Some("ft")),
    unit!("US survey foot", Linear, US_FOOT_TO_METRE, ["foot_us", "us-ft", "u.s. foot", "foot (us survey)"], Some("us-ft"), "Foot_US", Some("survey ft")),
    unit!("British foot (Sears 1922)", Linear, 0.304799471538676, ["foot_british_1922", "british foot"], None, "Foot_British_1922", None),
    unit!("Indian foot", Linear, 0.304799510248147, ["indian foot (1937)", "foot_indian", "ind-ft"], Some("ind-ft"), "Foot_Indian", None),
    unit!("Clarke's foot", Linear, 0.3047972654, ["foot_clarke", "clarke foot"], None, "Foot_Clarke", None),
    unit!("link", Linear, 0.201168, ["links", "li"], Some("link"), "Link", Some("li")),
    unit!("chain", Linear, 20.1168, ["chains", "ch"], Some("ch"), "Chain", Some("ch")),
    unit!("yard", Linear, 0.9144, ["yards", "yd"], Some("yd"), "Yard", Some("yd")),
    unit!("fathom", Linear, 1.8288, ["fathoms", "fath"], Some("fath"), "Fathom", None),
    unit!("nautical mile", Linear, 1852.0, ["nautical miles", "nmi", "kmi"], Some("kmi"), "Nautical_Mile", Some("nmi")),
    unit!("Statute mile", Linear, 1609.344, ["mile", "miles", "mi", "statute_mile"], Some("mi"), "Mile_US", Some("mi")),
    unit!("inch", Linear, 0.0254, ["inches", "in"], Some("in"), "Inch", Some("in")),
];

lazy_static! {
    static ref BY_NAME: HashMap<String, &'static Unit> = {
        let mut m = HashMap::new();
        for unit in UNITS {
            m.insert(unit.name.to_lowercase(), unit);
            m.insert(unit.esri.to_lowercase(), unit);
            for alias in unit.aliases {
                m.insert(alias.to_lowercase(), unit);
            }
        }
        m
    };
}

/// Find a unit by its name, an alias, its ESRI spelling or its PROJ.4 code.
pub fn lookup(name: &str) -> Option<&'static Unit> {
    BY_NAME
        .get(name.trim().to_lowercase().as_str())
        .copied()
        .or_else(|| from_proj4(name.trim()))
}

/// Factor to radians or metres for a registered unit.
pub fn unit_factor(name: &str) -> Option<f64> {
    lookup(name).map(|u| u.factor)
}

pub fn from_proj4(code: &str) -> Option<&'static Unit> {
    UNITS.iter().find(|u| u.proj4 == Some(code))
}

/// Registered unit of `kind` whose factor matches within a relative 1e-9.
pub fn from_factor(kind: UnitKind, factor: f64) -> Option<&'static Unit> {
    UNITS
        .iter()
        .filter(|u| u.kind == kind)
        .find(|u| factors_match(u.factor, factor))
}

pub fn factors_match(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    ((a - b) / a.abs().max(b.abs())).abs() < 1e-9
}

/// Registry front end for callers that may hold unit names the table doesn't know.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitRegistry {
    pub strictness: Strictness,
}

impl UnitRegistry {
    pub fn new(strictness: Strictness) -> Self {
        UnitRegistry { strictness }
    }

    /// Returns the name and factor to store for a unit.
    ///
    /// A caller supplied factor always wins over the table so that files with
    /// slightly different constants keep their own value. Unknown names only fail in
    /// strict mode or when there is no factor to fall back on.
    pub fn resolve(&self, name: &str, factor: Option<f64>) -> Result<(String, f64)> {
        match (lookup(name), factor) {
            (Some(_), Some(f)) => Ok((name.to_owned(), f)),
            (Some(unit), None) => Ok((name.to_owned(), unit.factor)),
            (None, Some(f)) if !self.strictness.is_strict() => {
                trace!("accepting unregistered unit {:?} with factor {}", name, f);
                Ok((name.to_owned(), f))
            }
            (None, _) => {
                warn!("unknown unit {:?}", name);
                Err(Error::UnitUnknownError(name.to_owned()))
            }
        }
    }

    pub fn kind_of(&self, name: &str) -> Option<UnitKind> {
        lookup(name).map(|u| u.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(lookup("Meter").unwrap().name, "metre");
        assert_eq!(lookup("METRES").unwrap().name, "metre");
        assert_eq!(lookup("Foot_US").unwrap().name, "US survey foot");
        assert_eq!(lookup("us-ft").unwrap().name, "US survey foot");
        assert_eq!(lookup("Degree").unwrap().kind, UnitKind::Angular);
    }

    #[test]
    fn factors() {
        assert_relative_eq!(unit_factor("degree").unwrap(), std::f64::consts::PI / 180.0, epsilon = 1e-15);
        assert_relative_eq!(unit_factor("ft").unwrap(), 0.3048);
        assert!(unit_factor("cubit").is_none());
    }

    #[test]
    fn factor_lookup_tolerates_rounding() {
        let unit = from_factor(UnitKind::Linear, 0.3048006096012192).unwrap();
        assert_eq!(unit.proj4, Some("us-ft"));
        assert!(from_factor(UnitKind::Linear, 0.5).is_none());
    }

    #[test]
    fn unknown_units_only_fail_when_strict() {
        let lenient = UnitRegistry::default();
        assert_eq!(
            lenient.resolve("Cubit", Some(0.4572)).unwrap(),
            ("Cubit".to_owned(), 0.4572)
        );
        assert!(lenient.resolve("Cubit", None).is_err());

        let strict = UnitRegistry::new(Strictness::Strict);
        assert!(matches!(
            strict.resolve("Cubit", Some(0.4572)),
            Err(Error::UnitUnknownError(_))
        ));
        assert_eq!(strict.resolve("metre", None).unwrap().1, 1.0);
    }
}
