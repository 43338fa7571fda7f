use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use log::debug;

const FORMAT: &str = "user input";

const WKT_KEYWORDS: &[&str] = &["PROJCS", "GEOGCS", "GEOCCS", "VERT_CS", "COMPD_CS", "LOCAL_CS"];

/// What kind of definition a user supplied string holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Epsg(i64),
    /// EPSG code with the authority's axis order kept
    EpsgAxisOrder(i64),
    WellKnown,
    Esri,
    Xml,
    Proj4,
    Wkt,
}

fn code(text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| Error::parse(FORMAT, format!("{:?} is not an EPSG code", text)))
}

/// Recognizes the syntax of `text` without building anything.
pub fn classify(text: &str) -> Result<InputKind> {
    let text = text.trim();
    let upper = text.to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix("EPSGA:") {
        return Ok(InputKind::EpsgAxisOrder(code(rest)?));
    }
    if let Some(rest) = upper.strip_prefix("EPSG:") {
        return Ok(InputKind::Epsg(code(rest)?));
    }
    if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:") {
        // the version between the colons may be empty
        let rest = rest.rsplit(':').next().unwrap_or(rest);
        return Ok(InputKind::EpsgAxisOrder(code(rest)?));
    }
    match upper.as_str() {
        "URN:OGC:DEF:CRS:OGC:1.3:CRS84" | "URN:OGC:DEF:CRS:OGC::CRS84" | "CRS84" | "CRS:84"
        | "WGS84" | "WGS72" | "NAD27" | "NAD83" => return Ok(InputKind::WellKnown),
        _ => {}
    }
    if upper.starts_with("ESRI::") {
        return Ok(InputKind::Esri);
    }
    if text.starts_with('<') {
        return Ok(InputKind::Xml);
    }
    if text.starts_with('+') || upper.contains("+PROJ=") || upper.contains("+INIT=") {
        return Ok(InputKind::Proj4);
    }
    if WKT_KEYWORDS.iter().any(|k| upper.starts_with(k)) {
        return Ok(InputKind::Wkt);
    }
    Err(Error::parse(FORMAT, format!("unrecognized definition {:?}", text)))
}

impl SpatialReference {
    /// Reads any of the forms people tend to type: `EPSG:n`, `EPSGA:n`,
    /// `urn:ogc:def:crs:EPSG::n`, `CRS84`, `WGS84` and the other well known names,
    /// PROJ.4 strings, WKT, `ESRI::<wkt>` and GML.
    ///
    /// WKT whose names carry the ESRI `GCS_`/`D_` prefixes is morphed back to the
    /// canonical names.
    pub fn set_from_user_input(&mut self, text: &str) -> Result<()> {
        let kind = classify(text)?;
        debug!("user input read as {:?}", kind);
        let text = text.trim();
        let srs = match kind {
            InputKind::Epsg(code) => SpatialReference::from_epsg(code)?,
            InputKind::EpsgAxisOrder(code) => SpatialReference::from_epsga(code)?,
            InputKind::WellKnown => {
                let name = if text.to_ascii_uppercase().starts_with("URN:") { "CRS84" } else { text };
                let mut srs = SpatialReference::new();
                srs.set_well_known_geog_cs(name)?;
                srs
            }
            InputKind::Esri => SpatialReference::from_esri(&text["ESRI::".len()..])?,
            InputKind::Xml => SpatialReference::from_xml(text)?,
            InputKind::Proj4 => SpatialReference::from_proj4(text)?,
            InputKind::Wkt => {
                let mut srs = SpatialReference::from_wkt(text)?;
                if looks_like_esri(&srs) {
                    srs.morph_from_esri()?;
                }
                srs
            }
        };
        *self = srs;
        Ok(())
    }

    pub fn from_user_input(text: &str) -> Result<Self> {
        let mut srs = SpatialReference::new();
        srs.set_from_user_input(text)?;
        Ok(srs)
    }
}

fn looks_like_esri(srs: &SpatialReference) -> bool {
    let geog = srs.geog_cs().and_then(|g| g.name()).unwrap_or("");
    let datum = srs.datum().and_then(|d| d.name()).unwrap_or("");
    geog.starts_with("GCS_") || datum.starts_with("D_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies() {
        assert_eq!(classify("EPSG:4326").unwrap(), InputKind::Epsg(4326));
        assert_eq!(classify("epsga:4326").unwrap(), InputKind::EpsgAxisOrder(4326));
        assert_eq!(classify("urn:ogc:def:crs:EPSG::32633").unwrap(), InputKind::EpsgAxisOrder(32633));
        assert_eq!(classify("urn:ogc:def:crs:EPSG:6.3:4326").unwrap(), InputKind::EpsgAxisOrder(4326));
        assert_eq!(classify("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(), InputKind::WellKnown);
        assert_eq!(classify(" nad83 ").unwrap(), InputKind::WellKnown);
        assert_eq!(classify("+proj=longlat +datum=WGS84").unwrap(), InputKind::Proj4);
        assert_eq!(classify("GEOGCS[\"x\"]").unwrap(), InputKind::Wkt);
        assert_eq!(classify("ESRI::GEOGCS[\"x\"]").unwrap(), InputKind::Esri);
        assert_eq!(classify("<gml:GeographicCRS/>").unwrap(), InputKind::Xml);
        assert!(classify("EPSG:abc").is_err());
        assert!(classify("hello").is_err());
        assert!(classify("").is_err());
    }

    #[test]
    fn every_form_reaches_wgs84() {
        let wgs84 = SpatialReference::from_epsg(4326).unwrap();
        for input in [
            "EPSG:4326",
            "EPSGA:4326",
            "urn:ogc:def:crs:EPSG::4326",
            "urn:ogc:def:crs:OGC:1.3:CRS84",
            "CRS84",
            "WGS84",
            "+proj=longlat +datum=WGS84 +no_defs",
        ] {
            let srs = SpatialReference::from_user_input(input).unwrap();
            assert!(srs.is_same(&wgs84), "{}", input);
        }
        let wkt = wgs84.to_wkt().unwrap();
        assert!(SpatialReference::from_user_input(&wkt).unwrap().is_same(&wgs84));
        let esri = format!("ESRI::{}", wgs84.to_esri().unwrap());
        assert!(SpatialReference::from_user_input(&esri).unwrap().is_same(&wgs84));
        let gml = wgs84.to_xml().unwrap();
        assert!(SpatialReference::from_user_input(&gml).unwrap().is_same(&wgs84));
    }

    #[test]
    fn esri_names_in_plain_wkt_are_morphed() {
        let esri = SpatialReference::from_epsg(4267).unwrap().to_esri().unwrap();
        let srs = SpatialReference::from_user_input(&esri).unwrap();
        assert_eq!(srs.datum().and_then(|d| d.name()), Some("North_American_Datum_1927"));
    }

    #[test]
    fn failure_leaves_the_definition_alone() {
        let mut srs = SpatialReference::from_epsg(4326).unwrap();
        assert!(srs.set_from_user_input("EPSG:123456789").is_err());
        assert!(srs.is_geographic());
    }
}
