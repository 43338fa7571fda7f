//! Well known ellipsoids and datums, and the geographic system setters built on them.
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use lazy_static::lazy_static;
use osr_core::node::{Node, NodeKind, Value};
use osr_core::units::DEGREE_TO_RADIAN;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Ellipsoid {
    pub name: &'static str,
    pub semi_major: f64,
    /// 0 for a sphere
    pub inverse_flattening: f64,
    pub epsg: i64,
    pub proj4: Option<&'static str>,
    pub esri: &'static str,
    /// GCTP spheroid number, also PCI's `Ennn` ellipsoid code
    pub usgs: i32,
}

impl Ellipsoid {
    pub fn semi_minor(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            self.semi_major
        } else {
            self.semi_major * (1.0 - 1.0 / self.inverse_flattening)
        }
    }

    pub fn node(&self) -> Node {
        Node::named(NodeKind::Spheroid, self.name)
            .with_attr(Value::number(self.semi_major))
            .with_attr(Value::number(self.inverse_flattening))
            .with_child(Node::authority("EPSG", self.epsg))
    }
}

macro_rules! ellipsoid {
    ($name:expr, $a:expr, $rf:expr, $epsg:expr, $proj4:expr, $esri:expr, $usgs:expr) => {
        Ellipsoid {
            name: $name,
            semi_major: $a,
            inverse_flattening: $rf,
            epsg: $epsg,
            proj4: $proj4,
            esri: $esri,
            usgs: $usgs,
        }
    };
}

pub static ELLIPSOIDS: &[Ellipsoid] = &[
    ellipsoid!("Clarke 1866", 6378206.4, 294.978698213898, 7008, Some("clrk66"), "Clarke_1866", 0),
    ellipsoid!("Clarke 1880 (RGS)", 6378249.145, 293.465, 7012, Some("clrk80"), "Clarke_1880_RGS", 1),
    ellipsoid!("Bessel 1841", 6377397.155, 299.1528128, 7004, Some("bessel"), "Bessel_1841", 2),
    ellipsoid!("GRS 1967", 6378160.0, 298.247167427, 7036, Some("GRS67"), "GRS_1967", 3),
    ellipsoid!("International 1924", 6378388.0, 297.0, 7022, Some("intl"), "International_1924", 4),
    ellipsoid!("WGS 72", 6378135.0, 298.26, 7043, Some("WGS72"), "WGS_1972", 5),
    ellipsoid!("Everest 1830 (1937 Adjustment)", 6377276.345, 300.8017, 7015, Some("evrst30"), "Everest_Adjustment_1937", 6),
    ellipsoid!("WGS 66", 6378145.0, 298.25, 7025, Some("WGS66"), "WGS_1966", 7),
    ellipsoid!("GRS 1980", 6378137.0, 298.257222101, 7019, Some("GRS80"), "GRS_1980", 8),
    ellipsoid!("Airy 1830", 6377563.396, 299.3249646, 7001, Some("airy"), "Airy_1830", 9),
    ellipsoid!("Everest 1830 Modified", 6377304.063, 300.8017, 7018, Some("evrstSS"), "Everest_Modified", 10),
    ellipsoid!("Airy Modified 1849", 6377340.189, 299.3249646, 7002, Some("mod_airy"), "Airy_Modified", 11),
    ellipsoid!("WGS 84", 6378137.0, 298.257223563, 7030, Some("WGS84"), "WGS_1984", 12),
    ellipsoid!("Australian National Spheroid", 6378160.0, 298.25, 7003, Some("aust_SA"), "Australian", 14),
    ellipsoid!("Krassowsky 1940", 6378245.0, 298.3, 7024, Some("krass"), "Krasovsky_1940", 15),
    ellipsoid!("Hough 1960", 6378270.0, 297.0, 7053, None, "Hough_1960", 16),
    ellipsoid!("Sphere", 6370997.0, 0.0, 7047, None, "Sphere", 19),
];

pub fn ellipsoid_by_name(name: &str) -> Option<&'static Ellipsoid> {
    let key = normalize(name);
    ELLIPSOIDS
        .iter()
        .find(|e| normalize(e.name) == key || normalize(e.esri) == key)
}

pub fn ellipsoid_by_proj4(code: &str) -> Option<&'static Ellipsoid> {
    ELLIPSOIDS.iter().find(|e| e.proj4 == Some(code))
}

pub fn ellipsoid_by_usgs(code: i32) -> Option<&'static Ellipsoid> {
    ELLIPSOIDS.iter().find(|e| e.usgs == code)
}

/// Table ellipsoid with the same axes, within a millimetre and 1e-6 on 1/f.
pub fn ellipsoid_by_params(semi_major: f64, inverse_flattening: f64) -> Option<&'static Ellipsoid> {
    ELLIPSOIDS.iter().find(|e| {
        (e.semi_major - semi_major).abs() < 0.001
            && (e.inverse_flattening - inverse_flattening).abs() < 1e-6
    })
}

#[derive(Debug)]
pub struct Datum {
    /// WKT DATUM name
    pub name: &'static str,
    pub ellipsoid: &'static str,
    pub towgs84: Option<[f64; 7]>,
    pub epsg: i64,
    pub proj4: Option<&'static str>,
    pub esri: &'static str,
    pub pci: &'static str,
    pub mapinfo: i32,
    /// EPSG code and name of the geographic system on this datum
    pub geogcs_epsg: i64,
    pub geogcs_name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Datum {
    pub fn ellipsoid(&self) -> Option<&'static Ellipsoid> {
        ellipsoid_by_name(self.ellipsoid)
    }

    /// The full GEOGCS node, authorities included.
    pub fn geogcs_node(&self) -> Result<Node> {
        let ellipsoid = self
            .ellipsoid()
            .ok_or_else(|| Error::UnsupportedError(format!("ellipsoid {}", self.ellipsoid)))?;
        let mut datum = Node::named(NodeKind::Datum, self.name).with_child(ellipsoid.node());
        if let Some(params) = self.towgs84 {
            let mut towgs = Node::new(NodeKind::Towgs84);
            towgs.attrs.extend(params.iter().map(|p| Value::number(*p)));
            datum = datum.with_child(towgs);
        }
        datum = datum.with_child(Node::authority("EPSG", self.epsg));
        Ok(Node::named(NodeKind::Geogcs, self.geogcs_name)
            .with_child(datum)
            .with_child(
                Node::named(NodeKind::Primem, "Greenwich")
                    .with_attr(Value::number(0.0))
                    .with_child(Node::authority("EPSG", 8901)),
            )
            .with_child(
                Node::unit("degree", DEGREE_TO_RADIAN).with_child(Node::authority("EPSG", 9122)),
            )
            .with_child(Node::authority("EPSG", self.geogcs_epsg)))
    }
}

const ZERO_SHIFT: Option<[f64; 7]> = Some([0.0; 7]);

pub static DATUMS: &[Datum] = &[
    Datum {
        name: "WGS_1984",
        ellipsoid: "WGS 84",
        towgs84: None,
        epsg: 6326,
        proj4: Some("WGS84"),
        esri: "D_WGS_1984",
        pci: "D000",
        mapinfo: 104,
        geogcs_epsg: 4326,
        geogcs_name: "WGS 84",
        aliases: &["WGS84", "WGS 84", "World Geodetic System 1984"],
    },
    Datum {
        name: "WGS_1972",
        ellipsoid: "WGS 72",
        towgs84: Some([0.0, 0.0, 4.5, 0.0, 0.0, 0.554, 0.2263]),
        epsg: 6322,
        proj4: None,
        esri: "D_WGS_1972",
        pci: "D001",
        mapinfo: 103,
        geogcs_epsg: 4322,
        geogcs_name: "WGS 72",
        aliases: &["WGS72", "WGS 72"],
    },
    Datum {
        name: "North_American_Datum_1927",
        ellipsoid: "Clarke 1866",
        towgs84: None,
        epsg: 6267,
        proj4: Some("NAD27"),
        esri: "D_North_American_1927",
        pci: "D-01",
        mapinfo: 62,
        geogcs_epsg: 4267,
        geogcs_name: "NAD27",
        aliases: &["NAD27", "North American 1927"],
    },
    Datum {
        name: "North_American_Datum_1983",
        ellipsoid: "GRS 1980",
        towgs84: ZERO_SHIFT,
        epsg: 6269,
        proj4: Some("NAD83"),
        esri: "D_North_American_1983",
        pci: "D-02",
        mapinfo: 74,
        geogcs_epsg: 4269,
        geogcs_name: "NAD83",
        aliases: &["NAD83", "North American 1983"],
    },
    Datum {
        name: "European_Terrestrial_Reference_System_1989",
        ellipsoid: "GRS 1980",
        towgs84: ZERO_SHIFT,
        epsg: 6258,
        proj4: None,
        esri: "D_ETRS_1989",
        pci: "D-30",
        mapinfo: 115,
        geogcs_epsg: 4258,
        geogcs_name: "ETRS89",
        aliases: &["ETRS89", "ETRS_1989"],
    },
    Datum {
        name: "European_Datum_1950",
        ellipsoid: "International 1924",
        towgs84: Some([-87.0, -98.0, -121.0, 0.0, 0.0, 0.0, 0.0]),
        epsg: 6230,
        proj4: None,
        esri: "D_European_1950",
        pci: "D-20",
        mapinfo: 28,
        geogcs_epsg: 4230,
        geogcs_name: "ED50",
        aliases: &["ED50", "European 1950"],
    },
    Datum {
        name: "Geocentric_Datum_of_Australia_1994",
        ellipsoid: "GRS 1980",
        towgs84: ZERO_SHIFT,
        epsg: 6283,
        proj4: None,
        esri: "D_GDA_1994",
        pci: "D-60",
        mapinfo: 116,
        geogcs_epsg: 4283,
        geogcs_name: "GDA94",
        aliases: &["GDA94", "GDA_1994"],
    },
    Datum {
        name: "OSGB_1936",
        ellipsoid: "Airy 1830",
        towgs84: Some([446.448, -125.157, 542.06, 0.15, 0.247, 0.842, -20.489]),
        epsg: 6277,
        proj4: Some("OSGB36"),
        esri: "D_OSGB_1936",
        pci: "D-50",
        mapinfo: 79,
        geogcs_epsg: 4277,
        geogcs_name: "OSGB 1936",
        aliases: &["OSGB36", "OSGB 1936"],
    },
];

/// Lower case with every run of non alphanumerics collapsed to `_`, and without
/// the ESRI `D_` prefix.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    out.strip_prefix("d_").unwrap_or(out).to_owned()
}

lazy_static! {
    static ref DATUM_NAMES: HashMap<String, &'static Datum> = {
        let mut m = HashMap::new();
        for datum in DATUMS {
            m.insert(normalize(datum.name), datum);
            m.insert(normalize(datum.esri), datum);
            m.insert(normalize(datum.geogcs_name), datum);
            for alias in datum.aliases {
                m.insert(normalize(alias), datum);
            }
        }
        m
    };
}

/// Finds a datum by its WKT or ESRI name, the name of its geographic system or an
/// alias.
pub fn datum_by_name(name: &str) -> Option<&'static Datum> {
    DATUM_NAMES.get(&normalize(name)).copied()
}

pub fn datum_by_proj4(code: &str) -> Option<&'static Datum> {
    DATUMS
        .iter()
        .find(|d| d.proj4.map(|p| p.eq_ignore_ascii_case(code)).unwrap_or(false))
}

pub fn datum_by_geogcs_epsg(code: i64) -> Option<&'static Datum> {
    DATUMS.iter().find(|d| d.geogcs_epsg == code)
}

pub fn datum_by_pci(code: &str) -> Option<&'static Datum> {
    DATUMS.iter().find(|d| d.pci.eq_ignore_ascii_case(code))
}

pub fn datum_by_mapinfo(code: i32) -> Option<&'static Datum> {
    DATUMS.iter().find(|d| d.mapinfo == code)
}

/// Geographic system description for [`SpatialReference::set_geog_cs`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeogCs<'a> {
    pub name: &'a str,
    pub datum: &'a str,
    pub spheroid: &'a str,
    pub semi_major: f64,
    /// 0 for a sphere
    pub inverse_flattening: f64,
    pub prime_meridian: &'a str,
    /// in `angular_unit`
    pub pm_offset: f64,
    pub angular_unit: &'a str,
    pub angular_factor: f64,
}

impl Default for GeogCs<'_> {
    fn default() -> Self {
        GeogCs {
            name: "unnamed",
            datum: "unknown",
            spheroid: "unnamed",
            semi_major: 6378137.0,
            inverse_flattening: 298.257223563,
            prime_meridian: "Greenwich",
            pm_offset: 0.0,
            angular_unit: "degree",
            angular_factor: DEGREE_TO_RADIAN,
        }
    }
}

impl GeogCs<'_> {
    pub fn node(&self) -> Node {
        let spheroid = Node::named(NodeKind::Spheroid, self.spheroid)
            .with_attr(Value::number(self.semi_major))
            .with_attr(Value::number(self.inverse_flattening));
        Node::named(NodeKind::Geogcs, self.name)
            .with_child(Node::named(NodeKind::Datum, self.datum).with_child(spheroid))
            .with_child(
                Node::named(NodeKind::Primem, self.prime_meridian)
                    .with_attr(Value::number(self.pm_offset)),
            )
            .with_child(Node::unit(self.angular_unit, self.angular_factor))
    }
}

impl SpatialReference {
    /// Sets the geographic system, replacing the one inside a projected system.
    pub fn set_geog_cs(&mut self, geog: &GeogCs) -> Result<()> {
        if geog.semi_major <= 0.0 {
            return Err(Error::InvalidCRSError(format!(
                "semi major axis {} is not positive",
                geog.semi_major
            )));
        }
        self.replace_geog_cs(geog.node())
    }

    /// Accepts `WGS84`, `WGS72`, `NAD27`, `NAD83`, `CRS84` and `EPSG:n` for the
    /// geographic systems in the built in table.
    pub fn set_well_known_geog_cs(&mut self, name: &str) -> Result<()> {
        let key = name.trim();
        let datum = match key.to_ascii_uppercase().as_str() {
            "WGS84" | "CRS84" | "CRS:84" => datum_by_geogcs_epsg(4326),
            "WGS72" => datum_by_geogcs_epsg(4322),
            "NAD27" | "CRS27" | "CRS:27" => datum_by_geogcs_epsg(4267),
            "NAD83" | "CRS83" | "CRS:83" => datum_by_geogcs_epsg(4269),
            upper => upper
                .strip_prefix("EPSG:")
                .and_then(|code| code.trim().parse().ok())
                .and_then(datum_by_geogcs_epsg),
        }
        .ok_or_else(|| Error::UnsupportedError(format!("well known geographic system {}", name)))?;
        self.replace_geog_cs(datum.geogcs_node()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::defaults::WGS84;

    #[test]
    fn name_normalization() {
        assert_eq!(normalize("D_North_American_1983"), "north_american_1983");
        assert_eq!(datum_by_name("D_WGS_1984").unwrap().epsg, 6326);
        assert_eq!(datum_by_name("North American Datum 1927").unwrap().epsg, 6267);
        assert_eq!(datum_by_name("OSGB36").unwrap().name, "OSGB_1936");
        assert!(datum_by_name("Potsdam").is_none());
    }

    #[test]
    fn ellipsoid_lookup() {
        assert_eq!(ellipsoid_by_params(6378137.0, 298.257222101).unwrap().name, "GRS 1980");
        assert_eq!(ellipsoid_by_proj4("intl").unwrap().semi_major, 6378388.0);
        assert_eq!(ellipsoid_by_usgs(0).unwrap().name, "Clarke 1866");
        assert_eq!(ellipsoid_by_name("Sphere").unwrap().semi_minor(), 6370997.0);
    }

    #[test]
    fn well_known_wgs84_matches_default_definition() {
        let mut srs = SpatialReference::new();
        srs.set_well_known_geog_cs("WGS84").unwrap();
        assert_eq!(srs.to_wkt().unwrap(), WGS84.definition);
        assert!(SpatialReference::new().set_well_known_geog_cs("EPSG:9999").is_err());
    }

    #[test]
    fn set_geog_cs_inside_projcs() {
        let mut srs = SpatialReference::new();
        srs.set_projection("Mollweide").unwrap();
        srs.set_geog_cs(&GeogCs {
            name: "Mars",
            spheroid: "Mars",
            semi_major: 3396190.0,
            inverse_flattening: 169.8944472236118,
            ..GeogCs::default()
        })
        .unwrap();
        assert!(srs.is_projected());
        assert_eq!(srs.semi_major().unwrap(), 3396190.0);
        assert_eq!(srs.geog_cs().unwrap().name(), Some("Mars"));
    }
}
