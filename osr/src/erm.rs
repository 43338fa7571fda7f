//! ERMapper `(projection, datum, units)` triples.
use crate::datums::datum_by_name;
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use log::debug;
use osr_core::node::{Node, NodeKind};
use osr_core::units::{factors_match, FOOT_TO_METRE, US_FOOT_TO_METRE};

const FORMAT: &str = "ERMapper";

/// ERMapper datum names and the geographic system each stands for.
static DATUMS: &[(&str, i64)] = &[
    ("WGS84", 4326),
    ("WGS72DOD", 4322),
    ("NAD27", 4267),
    ("NAD83", 4269),
    ("GDA94", 4283),
    ("ED50", 4230),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErmDefinition {
    pub projection: String,
    pub datum: String,
    pub units: String,
}

impl ErmDefinition {
    pub fn new(projection: &str, datum: &str, units: &str) -> Self {
        ErmDefinition {
            projection: projection.to_owned(),
            datum: datum.to_owned(),
            units: units.to_owned(),
        }
    }
}

fn epsg_suffix(text: &str) -> Option<i64> {
    text.strip_prefix("EPSG:")?.trim().parse().ok()
}

fn geographic_code(datum: &str) -> Result<i64> {
    DATUMS
        .iter()
        .find(|(name, _)| *name == datum)
        .map(|(_, code)| *code)
        .or_else(|| epsg_suffix(datum))
        .ok_or_else(|| Error::parse(FORMAT, format!("unknown datum {}", datum)))
}

fn erm_units(units: &str) -> Result<(&'static str, f64)> {
    match units {
        "" | "METERS" | "METRES" | "METRE" => Ok(("metre", 1.0)),
        "FEET" | "U.S. SURVEY FOOT" => Ok(("US survey foot", US_FOOT_TO_METRE)),
        "IFEET" => Ok(("foot", FOOT_TO_METRE)),
        other => Err(Error::UnitUnknownError(other.to_owned())),
    }
}

fn epsg_code(node: &Node) -> Option<i64> {
    node.child(NodeKind::Authority)
        .filter(|a| a.name().map(|n| n.eq_ignore_ascii_case("EPSG")).unwrap_or(false))
        .and_then(|a| a.attr(1))
        .and_then(|code| code.trim().parse().ok())
}

fn utm_zone(projection: &str) -> Option<(i32, bool)> {
    let north = match projection.get(..4)? {
        "NUTM" => true,
        "SUTM" => false,
        _ => return None,
    };
    let zone = projection[4..].parse::<i32>().ok().filter(|z| (1..=60).contains(z))?;
    Some((zone, north))
}

impl SpatialReference {
    /// `RAW` stands for "no coordinate system" and gives an empty definition.
    pub fn from_erm(def: &ErmDefinition) -> Result<Self> {
        let projection = def.projection.trim().to_ascii_uppercase();
        let datum = def.datum.trim().to_ascii_uppercase();
        let units = def.units.trim().to_ascii_uppercase();
        if projection == "RAW" {
            return Ok(SpatialReference::new());
        }
        if projection == "LOCAL" {
            let mut srs = SpatialReference::new();
            srs.set_local_cs("Local")?;
            let (name, factor) = erm_units(&units)?;
            srs.set_linear_units(name, factor)?;
            return Ok(srs);
        }
        if let Some(code) = epsg_suffix(&projection) {
            return SpatialReference::from_epsg(code);
        }
        let mut srs = SpatialReference::from_epsg(geographic_code(&datum)?)?;
        if projection == "GEODETIC" {
            return Ok(srs);
        }
        let (zone, north) = utm_zone(&projection)
            .ok_or_else(|| Error::parse(FORMAT, format!("unsupported projection {}", def.projection)))?;
        srs.set_utm(zone, north)?;
        let (name, factor) = erm_units(&units)?;
        srs.set_linear_units_and_update_parameters(name, factor)?;
        debug!("ERMapper {} on {} read as UTM zone {}", projection, datum, zone);
        Ok(srs)
    }

    pub fn import_erm(&mut self, def: &ErmDefinition) -> Result<()> {
        *self = SpatialReference::from_erm(def)?;
        Ok(())
    }

    pub fn to_erm(&self) -> Result<ErmDefinition> {
        let root = self.root_or_err()?;
        if root.kind == NodeKind::LocalCs {
            return Ok(ErmDefinition::new("LOCAL", "RAW", self.erm_units()?));
        }
        let datum = self.erm_datum()?;
        match root.kind {
            NodeKind::Geogcs => Ok(ErmDefinition::new("GEODETIC", &datum, "DEGREES")),
            NodeKind::Projcs => {
                let projection = match (self.utm_zone(), epsg_code(root)) {
                    (Some((zone, north)), _) => {
                        format!("{}UTM{:02}", if north { 'N' } else { 'S' }, zone)
                    }
                    (None, Some(code)) => format!("EPSG:{}", code),
                    (None, None) => {
                        return Err(Error::export(FORMAT, "only UTM and EPSG coded projections are supported"))
                    }
                };
                Ok(ErmDefinition::new(&projection, &datum, self.erm_units()?))
            }
            kind => Err(Error::export(FORMAT, format!("{} has no ERMapper form", kind))),
        }
    }

    fn erm_datum(&self) -> Result<String> {
        let geog = self
            .geog_cs()
            .ok_or_else(|| Error::export(FORMAT, "missing GEOGCS"))?;
        let code = epsg_code(geog)
            .or_else(|| geog.child(NodeKind::Datum).and_then(Node::name).and_then(datum_by_name).map(|d| d.geogcs_epsg));
        match code {
            Some(code) => Ok(DATUMS
                .iter()
                .find(|(_, c)| *c == code)
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| format!("EPSG:{}", code))),
            None => Err(Error::export(FORMAT, "datum has no ERMapper name or EPSG code")),
        }
    }

    fn erm_units(&self) -> Result<&'static str> {
        let (_, factor) = self.linear_units();
        if factors_match(factor, 1.0) {
            Ok("METERS")
        } else if factors_match(factor, US_FOOT_TO_METRE) {
            Ok("FEET")
        } else if factors_match(factor, FOOT_TO_METRE) {
            Ok("IFEET")
        } else {
            Err(Error::export(FORMAT, format!("no ERMapper unit for factor {}", factor)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utm_both_ways() {
        let def = ErmDefinition::new("SUTM23", "WGS84", "METERS");
        let srs = SpatialReference::from_erm(&def).unwrap();
        assert_eq!(srs.utm_zone(), Some((23, false)));
        assert!(srs.is_same(&SpatialReference::from_epsg(32723).unwrap()));
        assert_eq!(srs.to_erm().unwrap(), def);
        assert_eq!(
            SpatialReference::from_epsg(26915).unwrap().to_erm().unwrap(),
            ErmDefinition::new("NUTM15", "NAD83", "METERS")
        );
    }

    #[test]
    fn feet_update_false_easting() {
        let srs = SpatialReference::from_erm(&ErmDefinition::new("NUTM10", "NAD27", "FEET")).unwrap();
        assert_eq!(srs.linear_units().0, "US survey foot");
        let fe = srs.projection_parameter("false_easting").unwrap();
        assert!((fe * US_FOOT_TO_METRE - 500000.0).abs() < 1e-6);
        assert_eq!(srs.to_erm().unwrap().units, "FEET");
    }

    #[test]
    fn geodetic_local_and_epsg() {
        let srs = SpatialReference::from_erm(&ErmDefinition::new("GEODETIC", "GDA94", "DEGREES")).unwrap();
        assert!(srs.is_geographic());
        assert_eq!(srs.to_erm().unwrap(), ErmDefinition::new("GEODETIC", "GDA94", "DEGREES"));

        let srs = SpatialReference::from_erm(&ErmDefinition::new("LOCAL", "RAW", "METERS")).unwrap();
        assert!(srs.is_local());
        assert_eq!(srs.to_erm().unwrap().projection, "LOCAL");

        let srs = SpatialReference::from_erm(&ErmDefinition::new("EPSG:3857", "WGS84", "METERS")).unwrap();
        assert_eq!(srs.to_erm().unwrap().projection, "EPSG:3857");

        let geog = SpatialReference::from_erm(&ErmDefinition::new("GEODETIC", "EPSG:4258", "DEGREES")).unwrap();
        assert_eq!(geog.to_erm().unwrap().datum, "EPSG:4258");

        assert!(SpatialReference::from_erm(&ErmDefinition::new("RAW", "RAW", "")).unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_pieces() {
        assert!(SpatialReference::from_erm(&ErmDefinition::new("NUTM61", "WGS84", "METERS")).is_err());
        assert!(SpatialReference::from_erm(&ErmDefinition::new("GEODETIC", "POTSDAM", "DEGREES")).is_err());
        assert!(matches!(
            SpatialReference::from_erm(&ErmDefinition::new("NUTM10", "WGS84", "CUBITS")),
            Err(Error::UnitUnknownError(_))
        ));
        let mut srs = SpatialReference::from_epsg(4326).unwrap();
        srs.set_robinson(0.0, 0.0, 0.0).unwrap();
        assert!(matches!(srs.to_erm(), Err(Error::ExportError { .. })));
    }
}
