//! Semantic equality. Layout, node order, AUTHORITY and AXIS nodes don't matter;
//! datum, ellipsoid, units, method and normalized parameter values do.
use crate::datums::{datum_by_name, normalize};
use crate::esri::wkt_projection_name;
use crate::srs::SpatialReference;
use osr_core::catalog::{self, param_class, ParamClass};
use osr_core::node::{Node, NodeKind};
use osr_core::units::{factors_match, DEGREE_TO_RADIAN};
use std::collections::BTreeSet;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn is_placeholder(name: &str) -> bool {
    matches!(normalize(name).as_str(), "" | "unknown" | "unnamed" | "not_specified")
}

fn same_datum_name(a: &str, b: &str) -> bool {
    if is_placeholder(a) || is_placeholder(b) {
        return true;
    }
    if normalize(a) == normalize(b) {
        return true;
    }
    match (datum_by_name(a), datum_by_name(b)) {
        (Some(x), Some(y)) => std::ptr::eq(x, y),
        _ => false,
    }
}

impl SpatialReference {
    pub fn is_same(&self, other: &SpatialReference) -> bool {
        let (a, b) = match (self.root(), other.root()) {
            (Some(a), Some(b)) => (a, b),
            (None, None) => return true,
            _ => return false,
        };
        if a.kind != b.kind {
            return false;
        }
        match a.kind {
            NodeKind::Geogcs => self.is_same_geog_cs(other),
            NodeKind::Projcs => self.is_same_geog_cs(other) && self.same_projection(other),
            NodeKind::Geoccs => {
                self.same_datum(other)
                    && factors_match(self.linear_units().1, other.linear_units().1)
            }
            NodeKind::VertCs => self.is_same_vert_cs(other),
            NodeKind::LocalCs => {
                a.name() == b.name() && factors_match(self.linear_units().1, other.linear_units().1)
            }
            NodeKind::CompdCs => {
                let horizontal = match (horizontal_of(self), horizontal_of(other)) {
                    (Some(x), Some(y)) => x.is_same(&y),
                    (None, None) => true,
                    _ => false,
                };
                horizontal && self.is_same_vert_cs(other)
            }
            _ => false,
        }
    }

    /// Compares datum, ellipsoid, prime meridian and angular units of the
    /// geographic systems.
    pub fn is_same_geog_cs(&self, other: &SpatialReference) -> bool {
        if self.geog_cs().is_none() || other.geog_cs().is_none() {
            return false;
        }
        if !self.same_datum(other) {
            return false;
        }
        if (self.prime_meridian_degrees() - other.prime_meridian_degrees()).abs() > 1e-9 {
            return false;
        }
        factors_match(self.angular_units().1, other.angular_units().1)
    }

    /// Compares the vertical datum and units. Two definitions without a vertical
    /// part are the same.
    pub fn is_same_vert_cs(&self, other: &SpatialReference) -> bool {
        let (a, b) = match (self.vert_cs(), other.vert_cs()) {
            (Some(a), Some(b)) => (a, b),
            (None, None) => return true,
            _ => return false,
        };
        let datum = |n: &Node| {
            n.child(NodeKind::VertDatum)
                .map(|d| (d.name().unwrap_or("").to_owned(), d.attr(1).unwrap_or("").to_owned()))
        };
        let (da, db) = (datum(a), datum(b));
        let same_datum = match (&da, &db) {
            (Some((na, ta)), Some((nb, tb))) => normalize(na) == normalize(nb) && ta == tb,
            (None, None) => true,
            _ => false,
        };
        let unit = |n: &Node| n.child(NodeKind::Unit).and_then(|u| u.attr_f64(1)).unwrap_or(1.0);
        same_datum && factors_match(unit(a), unit(b))
    }

    pub(crate) fn same_datum(&self, other: &SpatialReference) -> bool {
        let (a, b) = match (self.datum(), other.datum()) {
            (Some(a), Some(b)) => (a, b),
            (None, None) => return true,
            _ => return false,
        };
        if !same_datum_name(a.name().unwrap_or(""), b.name().unwrap_or("")) {
            return false;
        }
        match (
            self.semi_major(),
            other.semi_major(),
            self.inverse_flattening(),
            other.inverse_flattening(),
        ) {
            (Ok(a1), Ok(a2), Ok(rf1), Ok(rf2)) => {
                if (a1 - a2).abs() > 1e-3 || (rf1 - rf2).abs() > 1e-5 {
                    return false;
                }
            }
            _ => return false,
        }
        match (self.towgs84(), other.towgs84()) {
            (Some(x), Some(y)) => x.iter().zip(y.iter()).all(|(p, q)| (p - q).abs() < 1e-6),
            _ => true,
        }
    }

    fn same_projection(&self, other: &SpatialReference) -> bool {
        let (ma, mb) = match (self.projection(), other.projection()) {
            (Some(a), Some(b)) => (wkt_projection_name(a), wkt_projection_name(b)),
            (None, None) => return factors_match(self.linear_units().1, other.linear_units().1),
            _ => return false,
        };
        if !ma.eq_ignore_ascii_case(&mb) {
            return false;
        }
        if !factors_match(self.linear_units().1, other.linear_units().1) {
            return false;
        }
        let names: BTreeSet<String> = self
            .parameters()
            .into_iter()
            .chain(other.parameters())
            .map(|(n, _)| n.to_ascii_lowercase())
            .collect();
        names.iter().all(|name| {
            let default = catalog::default_value(&ma, name).map(|d| match param_class(name) {
                ParamClass::Angular => d * DEGREE_TO_RADIAN,
                _ => d,
            });
            let a = self.normalized_projection_parameter(name).or(default);
            let b = other.normalized_projection_parameter(name).or(default);
            match (a, b) {
                (Some(a), Some(b)) => close(a, b),
                _ => false,
            }
        })
    }
}

fn horizontal_of(srs: &SpatialReference) -> Option<SpatialReference> {
    srs.horizontal()
        .and_then(|h| SpatialReference::from_root(h.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::defaults::WGS84;

    fn utm33() -> SpatialReference {
        let mut srs = SpatialReference::new();
        srs.set_well_known_geog_cs("WGS84").unwrap();
        srs.set_utm(33, true).unwrap();
        srs
    }

    #[test]
    fn layout_and_authority_do_not_matter() {
        let a = SpatialReference::from_wkt(WGS84.definition).unwrap();
        let b = SpatialReference::from_wkt(
            "GEOGCS[\"WGS84\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],UNIT[\"Degree\",0.017453292519943295],PRIMEM[\"Greenwich\",0.0]]",
        )
        .unwrap();
        assert!(a.is_same(&b));
        assert!(a.is_same_geog_cs(&b));
    }

    #[test]
    fn differing_datums() {
        let a = SpatialReference::from_wkt(WGS84.definition).unwrap();
        let mut b = SpatialReference::new();
        b.set_well_known_geog_cs("NAD27").unwrap();
        assert!(!a.is_same(&b));
    }

    #[test]
    fn projected_parameters_compare_normalized() {
        let a = utm33();
        let mut b = utm33();
        assert!(a.is_same(&b));
        b.set_angular_units("grad", 0.0157079632679490).unwrap();
        // same raw numbers in a different unit mean a different system
        assert!(!a.is_same(&b));

        let mut c = utm33();
        c.set_linear_units_and_update_parameters("foot", 0.3048).unwrap();
        assert!(!a.is_same(&c));

        let mut d = utm33();
        d.set_projection_parameter("latitude_of_origin", 0.0).unwrap();
        d.root_mut()
            .unwrap()
            .remove_children(NodeKind::Parameter);
        d.set_normalized_projection_parameter("central_meridian", 15.0 * DEGREE_TO_RADIAN)
            .unwrap();
        d.set_projection_parameter("scale_factor", 0.9996).unwrap();
        d.set_projection_parameter("false_easting", 500000.0).unwrap();
        // latitude_of_origin and false_northing fall back to their defaults
        assert!(a.is_same(&d));
    }

    #[test]
    fn vertical_systems() {
        let mut a = SpatialReference::new();
        a.set_vertical_cs("NAVD88 height", "North American Vertical Datum 1988", 2005)
            .unwrap();
        let b = a.clone();
        assert!(a.is_same_vert_cs(&b));
        let mut c = SpatialReference::new();
        c.set_vertical_cs("EGM96 height", "EGM96 geoid", 2005).unwrap();
        assert!(!a.is_same(&c));
    }
}
