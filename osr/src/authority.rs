//! EPSG lookups: the [`AuthorityTable`] trait, a built in table of common systems,
//! and the `from_epsg` family on [`SpatialReference`].
use crate::datums::DATUMS;
use crate::result::{Error, Result};
use crate::srs::{is_proj4_extension, SpatialReference};
use log::{debug, trace};
use osr_core::names::{param::*, proj::*};
use osr_core::node::{Node, NodeKind, Value};

/// Represents a spatial reference system as it appears in a GeoPackage
/// [`gpkg_spatial_ref_sys`](https://www.geopackage.org/spec130/#gpkg_spatial_ref_sys_cols) row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialRefSys<'a> {
    pub name: &'a str,
    pub id: i64,
    pub organization: &'a str,
    pub organization_coordsys_id: i64,
    pub definition: &'a str,
    pub description: &'a str,
}

impl SpatialRefSys<'_> {
    /// Parses the definition column. The GeoPackage placeholders (`undefined`)
    /// give an error.
    pub fn to_srs(&self) -> Result<SpatialReference> {
        if self.definition.eq_ignore_ascii_case("undefined") {
            return Err(Error::AuthorityError(format!(
                "{} has no definition",
                self.name
            )));
        }
        SpatialReference::from_wkt(self.definition)
    }
}

pub mod defaults {
    use super::SpatialRefSys;
    pub const WGS84: SpatialRefSys = SpatialRefSys {
        name: "WGS 84 geodetic",
        id: 4326,
        organization: "EPSG",
        organization_coordsys_id: 4326,
        definition: "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4326\"]]",
        description: "longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid",
    };
    pub const GEOGRAPHIC: SpatialRefSys = SpatialRefSys {
        name: "undefined geographic SRS",
        id: 0,
        organization: "NONE",
        organization_coordsys_id: 0,
        definition: "undefined",
        description: "undefined geographic coordinate reference system",
    };
    pub const CARTESIAN: SpatialRefSys = SpatialRefSys {
        name: "undefined cartesian SRS",
        id: -1,
        organization: "NONE",
        organization_coordsys_id: -1,
        definition: "undefined",
        description: "undefined cartesian coordinate reference system",
    };
}

/// Somewhere authority codes can be resolved to definitions.
pub trait AuthorityTable {
    /// WKT for `authority:code`, `None` when the table doesn't have it.
    fn definition(&self, authority: &str, code: i64) -> Result<Option<String>>;

    /// Authority and code of the entry describing the same system as `srs`.
    fn identify(&self, srs: &SpatialReference) -> Result<Option<(String, i64)>>;
}

const PSEUDO_MERCATOR_PROJ4: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs";

/// UTM families: base code, geographic system, first and last zone, name prefix.
const UTM_FAMILIES: &[(i64, i64, i32, i32, &str)] = &[
    (32600, 4326, 1, 60, "WGS 84"),
    (32700, 4326, 1, 60, "WGS 84"),
    (26900, 4269, 1, 23, "NAD83"),
    (26700, 4267, 1, 22, "NAD27"),
    (25800, 4258, 28, 38, "ETRS89"),
];

const FIXED_PROJECTED: &[i64] = &[3857, 3395, 3035, 27700];

/// The systems this crate can build without a database: the geographic systems of
/// the datum table, the UTM zones on them, a few national grids, WGS 84
/// geocentric and NAVD88 heights. Definitions carry EPSG axis order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAuthority;

impl BuiltinAuthority {
    /// Every code in the table.
    pub fn codes(&self) -> Vec<i64> {
        let mut codes: Vec<i64> = DATUMS.iter().map(|d| d.geogcs_epsg).collect();
        codes.extend_from_slice(FIXED_PROJECTED);
        for (base, _, first, last, _) in UTM_FAMILIES {
            codes.extend((*first..=*last).map(|z| base + i64::from(z)));
        }
        codes.push(4978);
        codes.push(5703);
        codes
    }

    pub fn build(&self, code: i64) -> Result<Option<SpatialReference>> {
        if let Some(srs) = geographic(code)? {
            return Ok(Some(srs));
        }
        for (base, geog, first, last, prefix) in UTM_FAMILIES {
            let zone = code - base;
            if zone >= i64::from(*first) && zone <= i64::from(*last) {
                let zone = zone as i32;
                let north = *base != 32700;
                let name = format!("{} / UTM zone {}{}", prefix, zone, if north { 'N' } else { 'S' });
                return projected(*geog, &name, code, |srs| srs.set_utm(zone, north)).map(Some);
            }
        }
        let srs = match code {
            3857 => projected(4326, "WGS 84 / Pseudo-Mercator", code, |srs| {
                srs.set_projection(MERCATOR_1SP)?;
                for name in [CENTRAL_MERIDIAN, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING] {
                    let value = if name == SCALE_FACTOR { 1.0 } else { 0.0 };
                    srs.set_projection_parameter(name, value)?;
                }
                Ok(())
            })
            .and_then(|mut srs| {
                srs.set_axes(None, &[("X", "EAST"), ("Y", "NORTH")])?;
                if let Some(root) = srs.root_mut() {
                    root.insert_child(
                        Node::named(NodeKind::Extension, "PROJ4")
                            .with_attr(Value::quoted(PSEUDO_MERCATOR_PROJ4)),
                    );
                }
                Ok(srs)
            })?,
            3395 => projected(4326, "WGS 84 / World Mercator", code, |srs| {
                srs.set_projection(MERCATOR_1SP)?;
                for name in [CENTRAL_MERIDIAN, SCALE_FACTOR, FALSE_EASTING, FALSE_NORTHING] {
                    let value = if name == SCALE_FACTOR { 1.0 } else { 0.0 };
                    srs.set_projection_parameter(name, value)?;
                }
                Ok(())
            })?,
            3035 => projected(4258, "ETRS89 / LAEA Europe", code, |srs| {
                srs.set_laea(52.0, 10.0, 4_321_000.0, 3_210_000.0)
            })
            .and_then(|mut srs| {
                srs.set_axes(None, &[("Y", "NORTH"), ("X", "EAST")])?;
                Ok(srs)
            })?,
            27700 => projected(4277, "OSGB 1936 / British National Grid", code, |srs| {
                srs.set_tm(49.0, -2.0, 0.9996012717, 400_000.0, -100_000.0)
            })?,
            4978 => {
                let mut srs = SpatialReference::new();
                srs.set_well_known_geog_cs("WGS84")?;
                srs.set_geocentric_cs("WGS 84")?;
                tag_unit(&mut srs)?;
                srs.set_axes(None, &[("Geocentric X", "OTHER"), ("Geocentric Y", "OTHER"), ("Geocentric Z", "NORTH")])?;
                srs.set_authority(None, "EPSG", code)?;
                srs
            }
            5703 => {
                let mut srs = SpatialReference::new();
                srs.set_vertical_cs("NAVD88 height", "North American Vertical Datum 1988", 2005)?;
                srs.set_authority(Some("VERT_DATUM"), "EPSG", 5103)?;
                tag_unit(&mut srs)?;
                srs.set_axes(None, &[("Up", "UP")])?;
                srs.set_authority(None, "EPSG", code)?;
                srs
            }
            _ => return Ok(None),
        };
        Ok(Some(srs))
    }
}

fn geographic(code: i64) -> Result<Option<SpatialReference>> {
    let datum = match DATUMS.iter().find(|d| d.geogcs_epsg == code) {
        Some(d) => d,
        None => return Ok(None),
    };
    let mut srs = SpatialReference::from_root(datum.geogcs_node()?)?;
    srs.set_axes(None, &[("Latitude", "NORTH"), ("Longitude", "EAST")])?;
    Ok(Some(srs))
}

fn tag_unit(srs: &mut SpatialReference) -> Result<()> {
    if let Some(root) = srs.root_mut() {
        root.replace_child(Node::unit("metre", 1.0).with_child(Node::authority("EPSG", 9001)));
    }
    Ok(())
}

fn projected<F>(geog: i64, name: &str, code: i64, build: F) -> Result<SpatialReference>
where
    F: FnOnce(&mut SpatialReference) -> Result<()>,
{
    let mut srs = SpatialReference::new();
    srs.set_well_known_geog_cs(&format!("EPSG:{}", geog))?;
    build(&mut srs)?;
    srs.set_projected_cs(name)?;
    tag_unit(&mut srs)?;
    srs.set_axes(None, &[("Easting", "EAST"), ("Northing", "NORTH")])?;
    srs.set_authority(None, "EPSG", code)?;
    Ok(srs)
}

impl AuthorityTable for BuiltinAuthority {
    fn definition(&self, authority: &str, code: i64) -> Result<Option<String>> {
        if !authority.eq_ignore_ascii_case("EPSG") {
            return Ok(None);
        }
        match self.build(code)? {
            Some(srs) => srs.to_wkt().map(Some),
            None => Ok(None),
        }
    }

    fn identify(&self, srs: &SpatialReference) -> Result<Option<(String, i64)>> {
        let found = if srs.is_geographic() && !srs.is_compound() {
            DATUMS
                .iter()
                .map(|d| d.geogcs_epsg)
                .find(|code| matches!(geographic(*code), Ok(Some(candidate)) if candidate.is_same(srs)))
        } else if srs.is_projected() && !srs.is_compound() {
            self.identify_projected(srs)?
        } else if srs.is_geocentric() || srs.root_kind() == Some(NodeKind::VertCs) {
            [4978, 5703]
                .into_iter()
                .find(|code| matches!(self.build(*code), Ok(Some(candidate)) if candidate.is_same(srs)))
        } else {
            None
        };
        trace!("builtin identification gave {:?}", found);
        Ok(found.map(|code| ("EPSG".to_owned(), code)))
    }
}

impl BuiltinAuthority {
    fn identify_projected(&self, srs: &SpatialReference) -> Result<Option<i64>> {
        if let Some((zone, north)) = srs.utm_zone() {
            for (base, geog, first, last, _) in UTM_FAMILIES {
                if (*base == 32700) == north || zone < *first || zone > *last {
                    continue;
                }
                if let Some(base_geog) = geographic(*geog)? {
                    if base_geog.is_same_geog_cs(srs) && srs.linear_units().1 == 1.0 {
                        return Ok(Some(base + i64::from(zone)));
                    }
                }
            }
            return Ok(None);
        }
        for code in FIXED_PROJECTED {
            if let Some(candidate) = self.build(*code)? {
                // the pseudo mercator only differs by its PROJ4 extension
                if has_proj4_extension(&candidate) == has_proj4_extension(srs) && candidate.is_same(srs) {
                    return Ok(Some(*code));
                }
            }
        }
        Ok(None)
    }
}

fn has_proj4_extension(srs: &SpatialReference) -> bool {
    srs.proj_cs()
        .map(|p| p.children.iter().any(is_proj4_extension))
        .unwrap_or(false)
}

impl SpatialReference {
    /// Replaces the AXIS nodes of the node at `target` (the root when `None`).
    pub fn set_axes(&mut self, target: Option<&str>, axes: &[(&str, &str)]) -> Result<()> {
        let root = self.root_mut().ok_or(Error::MissingNodeError("root"))?;
        let node = match target {
            Some(path) => root
                .find_path_mut(path)
                .ok_or_else(|| Error::PathError(path.to_owned()))?,
            None => root,
        };
        node.remove_children(NodeKind::Axis);
        for (name, direction) in axes {
            node.insert_child(
                Node::named(NodeKind::Axis, *name).with_attr(Value::Bare(direction.to_string())),
            );
        }
        Ok(())
    }

    /// Axis names and directions of the node at `target` (the root when `None`).
    pub fn axes(&self, target: Option<&str>) -> Vec<(String, String)> {
        let root = match self.root() {
            Some(r) => r,
            None => return Vec::new(),
        };
        let node = match target {
            Some(path) => match crate::srs::find_path(root, path) {
                Some(n) => n,
                None => return Vec::new(),
            },
            None => root,
        };
        node.children_of(NodeKind::Axis)
            .map(|a| (a.name().unwrap_or("").to_owned(), a.attr(1).unwrap_or("").to_owned()))
            .collect()
    }

    /// True for EPSG projected systems whose first axis points north or south.
    pub fn epsg_treats_as_northing_easting(&self) -> bool {
        let projcs = match self.root() {
            Some(r) if r.kind == NodeKind::Projcs => r,
            _ => return false,
        };
        let is_epsg = projcs
            .child(NodeKind::Authority)
            .and_then(Node::name)
            .map(|n| n.eq_ignore_ascii_case("EPSG"))
            .unwrap_or(false);
        is_epsg
            && projcs
                .child(NodeKind::Axis)
                .and_then(|a| a.attr(1))
                .map(|d| d.eq_ignore_ascii_case("NORTH") || d.eq_ignore_ascii_case("SOUTH"))
                .unwrap_or(false)
    }

    /// EPSG definition in the traditional GIS axis order: longitude/easting first.
    /// Definitions whose EPSG order is latitude or northing first lose their AXIS
    /// nodes.
    pub fn from_epsg(code: i64) -> Result<Self> {
        Self::from_epsg_with(&BuiltinAuthority, code)
    }

    pub fn from_epsg_with(table: &dyn AuthorityTable, code: i64) -> Result<Self> {
        let mut srs = Self::from_epsga_with(table, code)?;
        if srs.epsg_treats_as_lat_long() || srs.epsg_treats_as_northing_easting() {
            srs.set_axes(None, &[])?;
        }
        Ok(srs)
    }

    /// EPSG definition with the axis order EPSG gives.
    pub fn from_epsga(code: i64) -> Result<Self> {
        Self::from_epsga_with(&BuiltinAuthority, code)
    }

    pub fn from_epsga_with(table: &dyn AuthorityTable, code: i64) -> Result<Self> {
        let wkt = table
            .definition("EPSG", code)?
            .ok_or_else(|| Error::AuthorityError(format!("EPSG:{} is not in the table", code)))?;
        debug!("resolved EPSG:{}", code);
        SpatialReference::from_wkt(&wkt)
    }

    pub fn import_epsg(&mut self, code: i64) -> Result<()> {
        *self = SpatialReference::from_epsg(code)?;
        Ok(())
    }

    pub fn import_epsga(&mut self, code: i64) -> Result<()> {
        *self = SpatialReference::from_epsga(code)?;
        Ok(())
    }

    /// Looks the definition up in the built in table and, on a match, tags the root
    /// with the EPSG authority.
    pub fn auto_identify_epsg(&mut self) -> Result<Option<i64>> {
        Ok(self
            .auto_identify_with(&BuiltinAuthority)?
            .map(|(_, code)| code))
    }

    pub fn auto_identify_with(&mut self, table: &dyn AuthorityTable) -> Result<Option<(String, i64)>> {
        let found = table.identify(self)?;
        if let Some((authority, code)) = &found {
            debug!("identified as {}:{}", authority, code);
            self.set_authority(None, authority, code)?;
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::defaults::WGS84;

    #[test]
    fn from_epsg_matches_geopackage_default() {
        let srs = SpatialReference::from_epsg(4326).unwrap();
        assert_eq!(srs.to_wkt().unwrap(), WGS84.definition);
        let strict = SpatialReference::from_epsga(4326).unwrap();
        assert!(strict.epsg_treats_as_lat_long());
        assert_eq!(strict.axes(None)[0], ("Latitude".to_owned(), "NORTH".to_owned()));
        assert!(srs.is_same(&strict));
    }

    #[test]
    fn utm_codes() {
        let srs = SpatialReference::from_epsg(32633).unwrap();
        assert_eq!(srs.name(), Some("WGS 84 / UTM zone 33N"));
        assert_eq!(srs.utm_zone(), Some((33, true)));
        let south = SpatialReference::from_epsg(32759).unwrap();
        assert_eq!(south.utm_zone(), Some((59, false)));
        assert_eq!(SpatialReference::from_epsg(26910).unwrap().geog_cs().unwrap().name(), Some("NAD83"));
        assert!(SpatialReference::from_epsg(26924).is_err());
    }

    #[test]
    fn northing_easting_axes_are_dropped() {
        let srs = SpatialReference::from_epsga(3035).unwrap();
        assert!(srs.epsg_treats_as_northing_easting());
        assert!(SpatialReference::from_epsg(3035).unwrap().axes(None).is_empty());
        let merc = SpatialReference::from_epsg(3857).unwrap();
        assert_eq!(merc.axes(None).len(), 2);
        assert!(merc.to_wkt().unwrap().contains("EXTENSION[\"PROJ4\""));
    }

    #[test]
    fn other_roots() {
        assert!(SpatialReference::from_epsg(4978).unwrap().is_geocentric());
        let navd = SpatialReference::from_epsg(5703).unwrap();
        assert!(navd.is_vertical());
        assert_eq!(navd.authority_code(Some("VERT_DATUM")).unwrap(), "5103");
        assert!(matches!(
            SpatialReference::from_epsg(999999),
            Err(Error::AuthorityError(_))
        ));
    }

    #[test]
    fn auto_identify() {
        let mut srs = SpatialReference::new();
        srs.set_well_known_geog_cs("NAD27").unwrap();
        srs.set_utm(11, true).unwrap();
        srs.root_mut().unwrap().remove_children(NodeKind::Authority);
        assert_eq!(srs.auto_identify_epsg().unwrap(), Some(26711));
        assert_eq!(srs.authority_code(None).unwrap(), "26711");

        let mut merc = SpatialReference::new();
        merc.set_well_known_geog_cs("WGS84").unwrap();
        merc.set_mercator(0.0, 0.0, 1.0, 0.0, 0.0).unwrap();
        assert_eq!(merc.auto_identify_epsg().unwrap(), Some(3395));
        let mut pseudo = SpatialReference::from_epsg(3857).unwrap();
        pseudo.root_mut().unwrap().remove_children(NodeKind::Authority);
        assert_eq!(pseudo.auto_identify_epsg().unwrap(), Some(3857));

        let mut custom = SpatialReference::new();
        custom.set_well_known_geog_cs("WGS84").unwrap();
        custom.set_robinson(0.0, 0.0, 0.0).unwrap();
        assert_eq!(custom.auto_identify_epsg().unwrap(), None);
    }

    #[test]
    fn placeholders_have_no_definition() {
        assert!(defaults::CARTESIAN.to_srs().is_err());
        assert!(defaults::WGS84.to_srs().unwrap().is_geographic());
    }
}
