//! One setter per projection method. Angles are in degrees and linear values in
//! metres, whatever units the definition itself uses.
use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use osr_core::catalog;
use osr_core::names::{param::*, proj::*};

impl SpatialReference {
    fn project(&mut self, method: &str, params: &[(&str, f64)]) -> Result<()> {
        self.set_projection(method)?;
        for (name, value) in params {
            self.set_parameter_degrees_metres(name, *value)?;
        }
        Ok(())
    }

    /// Albers Conic Equal Area
    pub fn set_acea(&mut self, stdp1: f64, stdp2: f64, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(ALBERS_CONIC_EQUAL_AREA, &[
            (STANDARD_PARALLEL_1, stdp1),
            (STANDARD_PARALLEL_2, stdp2),
            (LATITUDE_OF_CENTER, center_lat),
            (LONGITUDE_OF_CENTER, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Azimuthal Equidistant
    pub fn set_ae(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(AZIMUTHAL_EQUIDISTANT, &[
            (LATITUDE_OF_CENTER, center_lat),
            (LONGITUDE_OF_CENTER, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_bonne(&mut self, stdp1: f64, cm: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(BONNE, &[
            (STANDARD_PARALLEL_1, stdp1),
            (CENTRAL_MERIDIAN, cm),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Cylindrical Equal Area
    pub fn set_cea(&mut self, stdp1: f64, cm: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(CYLINDRICAL_EQUAL_AREA, &[
            (STANDARD_PARALLEL_1, stdp1),
            (CENTRAL_MERIDIAN, cm),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Cassini-Soldner
    pub fn set_cs(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(CASSINI_SOLDNER, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Equidistant Conic
    pub fn set_ec(&mut self, stdp1: f64, stdp2: f64, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(EQUIDISTANT_CONIC, &[
            (STANDARD_PARALLEL_1, stdp1),
            (STANDARD_PARALLEL_2, stdp2),
            (LATITUDE_OF_CENTER, center_lat),
            (LONGITUDE_OF_CENTER, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Eckert I to VI, picked by `variation`.
    pub fn set_eckert(&mut self, variation: u8, cm: f64, fe: f64, fn_: f64) -> Result<()> {
        let method = match variation {
            1 => ECKERT_I,
            2 => ECKERT_II,
            3 => ECKERT_III,
            4 => ECKERT_IV,
            5 => ECKERT_V,
            6 => ECKERT_VI,
            _ => return Err(Error::UnsupportedError(format!("Eckert variation {}", variation))),
        };
        self.project(method, &[(CENTRAL_MERIDIAN, cm), (FALSE_EASTING, fe), (FALSE_NORTHING, fn_)])
    }

    pub fn set_equirectangular(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(EQUIRECTANGULAR, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Equirectangular with a true scale latitude.
    pub fn set_equirectangular_generalized(
        &mut self,
        center_lat: f64,
        center_long: f64,
        pseudo_std_parallel: f64,
        fe: f64,
        fn_: f64,
    ) -> Result<()> {
        self.project(EQUIRECTANGULAR, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (STANDARD_PARALLEL_1, pseudo_std_parallel),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Gall Stereographic
    pub fn set_gs(&mut self, cm: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(GALL_STEREOGRAPHIC, &[(CENTRAL_MERIDIAN, cm), (FALSE_EASTING, fe), (FALSE_NORTHING, fn_)])
    }

    /// Goode Homolosine
    pub fn set_gh(&mut self, cm: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(GOODE_HOMOLOSINE, &[(CENTRAL_MERIDIAN, cm), (FALSE_EASTING, fe), (FALSE_NORTHING, fn_)])
    }

    /// Interrupted Goode Homolosine, which takes no parameters.
    pub fn set_igh(&mut self) -> Result<()> {
        self.project(INTERRUPTED_GOODE_HOMOLOSINE, &[])
    }

    /// Geostationary Satellite
    pub fn set_geos(&mut self, cm: f64, satellite_height: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(GEOSTATIONARY_SATELLITE, &[
            (CENTRAL_MERIDIAN, cm),
            (SATELLITE_HEIGHT, satellite_height),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Gauss-Schreiber Transverse Mercator
    pub fn set_gstm(&mut self, center_lat: f64, center_long: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(GAUSS_SCHREIBER_TM, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_gnomonic(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(GNOMONIC, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Hotine Oblique Mercator, azimuth flavour.
    #[allow(clippy::too_many_arguments)]
    pub fn set_hom(
        &mut self,
        center_lat: f64,
        center_long: f64,
        azimuth: f64,
        rect_to_skew: f64,
        scale: f64,
        fe: f64,
        fn_: f64,
    ) -> Result<()> {
        self.project(HOTINE_OBLIQUE_MERCATOR, &[
            (LATITUDE_OF_CENTER, center_lat),
            (LONGITUDE_OF_CENTER, center_long),
            (AZIMUTH, azimuth),
            (RECTIFIED_GRID_ANGLE, rect_to_skew),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Hotine Oblique Mercator defined by two points on the centre line.
    #[allow(clippy::too_many_arguments)]
    pub fn set_hom_2pno(
        &mut self,
        center_lat: f64,
        lat1: f64,
        long1: f64,
        lat2: f64,
        long2: f64,
        scale: f64,
        fe: f64,
        fn_: f64,
    ) -> Result<()> {
        self.project(HOTINE_OBLIQUE_MERCATOR_TWO_POINT, &[
            (LATITUDE_OF_CENTER, center_lat),
            (LATITUDE_OF_POINT_1, lat1),
            (LONGITUDE_OF_POINT_1, long1),
            (LATITUDE_OF_POINT_2, lat2),
            (LONGITUDE_OF_POINT_2, long2),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// International Map of the World Polyconic
    pub fn set_iwm_polyconic(&mut self, lat1: f64, lat2: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(IMW_POLYCONIC, &[
            (LATITUDE_OF_1ST_POINT, lat1),
            (LATITUDE_OF_2ND_POINT, lat2),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_krovak(
        &mut self,
        center_lat: f64,
        center_long: f64,
        azimuth: f64,
        pseudo_std_parallel: f64,
        scale: f64,
        fe: f64,
        fn_: f64,
    ) -> Result<()> {
        self.project(KROVAK, &[
            (LATITUDE_OF_CENTER, center_lat),
            (LONGITUDE_OF_CENTER, center_long),
            (AZIMUTH, azimuth),
            (PSEUDO_STANDARD_PARALLEL_1, pseudo_std_parallel),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Lambert Azimuthal Equal Area
    pub fn set_laea(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(LAMBERT_AZIMUTHAL_EQUAL_AREA, &[
            (LATITUDE_OF_CENTER, center_lat),
            (LONGITUDE_OF_CENTER, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Lambert Conformal Conic with two standard parallels.
    pub fn set_lcc(&mut self, stdp1: f64, stdp2: f64, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(LAMBERT_CONFORMAL_CONIC_2SP, &[
            (STANDARD_PARALLEL_1, stdp1),
            (STANDARD_PARALLEL_2, stdp2),
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Lambert Conformal Conic with one standard parallel.
    pub fn set_lcc_1sp(&mut self, center_lat: f64, center_long: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(LAMBERT_CONFORMAL_CONIC_1SP, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Lambert Conformal Conic, Belgian variant.
    pub fn set_lccb(&mut self, stdp1: f64, stdp2: f64, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(LAMBERT_CONFORMAL_CONIC_2SP_BELGIUM, &[
            (STANDARD_PARALLEL_1, stdp1),
            (STANDARD_PARALLEL_2, stdp2),
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Miller Cylindrical
    pub fn set_mc(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(MILLER_CYLINDRICAL, &[
            (LATITUDE_OF_CENTER, center_lat),
            (LONGITUDE_OF_CENTER, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_mercator(&mut self, center_lat: f64, center_long: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(MERCATOR_1SP, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_mercator_2sp(&mut self, stdp1: f64, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(MERCATOR_2SP, &[
            (STANDARD_PARALLEL_1, stdp1),
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_mollweide(&mut self, cm: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(MOLLWEIDE, &[(CENTRAL_MERIDIAN, cm), (FALSE_EASTING, fe), (FALSE_NORTHING, fn_)])
    }

    /// New Zealand Map Grid
    pub fn set_nzmg(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(NEW_ZEALAND_MAP_GRID, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Oblique Stereographic
    pub fn set_os(&mut self, origin_lat: f64, cm: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(OBLIQUE_STEREOGRAPHIC, &[
            (LATITUDE_OF_ORIGIN, origin_lat),
            (CENTRAL_MERIDIAN, cm),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_orthographic(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(ORTHOGRAPHIC, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_polyconic(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(POLYCONIC, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Polar Stereographic
    pub fn set_ps(&mut self, center_lat: f64, center_long: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(POLAR_STEREOGRAPHIC, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    pub fn set_robinson(&mut self, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(ROBINSON, &[(LONGITUDE_OF_CENTER, center_long), (FALSE_EASTING, fe), (FALSE_NORTHING, fn_)])
    }

    pub fn set_sinusoidal(&mut self, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(SINUSOIDAL, &[(LONGITUDE_OF_CENTER, center_long), (FALSE_EASTING, fe), (FALSE_NORTHING, fn_)])
    }

    pub fn set_stereographic(&mut self, center_lat: f64, center_long: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(STEREOGRAPHIC, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Swiss Oblique Cylindrical
    pub fn set_soc(&mut self, latitude_of_origin: f64, cm: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(SWISS_OBLIQUE_CYLINDRICAL, &[
            (LATITUDE_OF_CENTER, latitude_of_origin),
            (LONGITUDE_OF_CENTER, cm),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Transverse Mercator
    pub fn set_tm(&mut self, center_lat: f64, center_long: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.set_tm_variant(TRANSVERSE_MERCATOR, center_lat, center_long, scale, fe, fn_)
    }

    /// A Transverse Mercator flavour that takes the same parameters, such as
    /// `Transverse_Mercator_South_Orientated`.
    pub fn set_tm_variant(
        &mut self,
        variant: &str,
        center_lat: f64,
        center_long: f64,
        scale: f64,
        fe: f64,
        fn_: f64,
    ) -> Result<()> {
        let method = catalog::method(variant)
            .filter(|m| m.takes(SCALE_FACTOR) && m.takes(CENTRAL_MERIDIAN) && m.takes(LATITUDE_OF_ORIGIN))
            .ok_or_else(|| Error::UnsupportedError(format!("Transverse Mercator variant {}", variant)))?;
        self.project(method.name, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (SCALE_FACTOR, scale),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Tunisia Mining Grid
    pub fn set_tmg(&mut self, center_lat: f64, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(TUNISIA_MINING_GRID, &[
            (LATITUDE_OF_ORIGIN, center_lat),
            (CENTRAL_MERIDIAN, center_long),
            (FALSE_EASTING, fe),
            (FALSE_NORTHING, fn_),
        ])
    }

    /// Transverse Mercator, south oriented.
    pub fn set_tmso(&mut self, center_lat: f64, center_long: f64, scale: f64, fe: f64, fn_: f64) -> Result<()> {
        self.set_tm_variant(TRANSVERSE_MERCATOR_SOUTH_ORIENTED, center_lat, center_long, scale, fe, fn_)
    }

    /// Van der Grinten
    pub fn set_vdg(&mut self, center_long: f64, fe: f64, fn_: f64) -> Result<()> {
        self.project(VAN_DER_GRINTEN, &[(CENTRAL_MERIDIAN, center_long), (FALSE_EASTING, fe), (FALSE_NORTHING, fn_)])
    }

    /// Universal Transverse Mercator. An unnamed projected system is named after
    /// the zone.
    pub fn set_utm(&mut self, zone: i32, north: bool) -> Result<()> {
        if !(1..=60).contains(&zone) {
            return Err(Error::UnsupportedError(format!("UTM zone {}", zone)));
        }
        let false_northing = if north { 0.0 } else { 10_000_000.0 };
        self.set_tm(0.0, f64::from(zone * 6 - 183), 0.9996, 500_000.0, false_northing)?;
        let name = self.proj_cs().and_then(|p| p.name()).unwrap_or("");
        let renamed = if name.is_empty() || name.eq_ignore_ascii_case("unnamed") || is_generic_utm_name(name) {
            let hemisphere = if north { "Northern" } else { "Southern" };
            Some(format!("UTM Zone {}, {} Hemisphere", zone, hemisphere))
        } else {
            name.rsplit_once(" / UTM zone ")
                .filter(|(_, suffix)| is_zone_suffix(suffix))
                .map(|(prefix, _)| format!("{} / UTM zone {}{}", prefix, zone, if north { 'N' } else { 'S' }))
        };
        if let Some(name) = renamed {
            self.set_projected_cs(&name)?;
        }
        Ok(())
    }

    /// Zone and hemisphere (true for north) when the definition is a UTM zone.
    pub fn utm_zone(&self) -> Option<(i32, bool)> {
        if !self
            .projection()
            .map(|p| p.eq_ignore_ascii_case(TRANSVERSE_MERCATOR))
            .unwrap_or(false)
        {
            return None;
        }
        let lat0 = self.parameter_degrees_metres(LATITUDE_OF_ORIGIN).unwrap_or(0.0);
        let scale = self.projection_parameter_or(SCALE_FACTOR, 1.0);
        let fe = self.parameter_degrees_metres(FALSE_EASTING).unwrap_or(0.0);
        let fn_ = self.parameter_degrees_metres(FALSE_NORTHING).unwrap_or(0.0);
        let cm = self.parameter_degrees_metres(CENTRAL_MERIDIAN).unwrap_or(0.0);
        if lat0.abs() > 1e-9 || (scale - 0.9996).abs() > 1e-8 || (fe - 500_000.0).abs() > 1e-3 {
            return None;
        }
        let north = if fn_.abs() < 1e-3 {
            true
        } else if (fn_ - 10_000_000.0).abs() < 1e-3 {
            false
        } else {
            return None;
        };
        let zone = ((cm + 183.0) / 6.0).round();
        if !(1.0..=60.0).contains(&zone) || (zone * 6.0 - 183.0 - cm).abs() > 1e-5 {
            return None;
        }
        Some((zone as i32, north))
    }
}

/// `33N`, `7S` and the like.
fn is_zone_suffix(suffix: &str) -> bool {
    let digits = suffix.trim_end_matches(|c| c == 'N' || c == 'S');
    suffix.len() == digits.len() + 1 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Names `set_utm` gives an unnamed system.
fn is_generic_utm_name(name: &str) -> bool {
    name.strip_prefix("UTM Zone ")
        .and_then(|rest| rest.split_once(", "))
        .map(|(digits, hemisphere)| {
            !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit())
                && (hemisphere == "Northern Hemisphere" || hemisphere == "Southern Hemisphere")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn utm_names_follow_the_zone() {
        let mut srs = SpatialReference::from_epsg(32633).unwrap();
        assert_eq!(srs.proj_cs().and_then(|p| p.name()), Some("WGS 84 / UTM zone 33N"));
        srs.set_utm(34, false).unwrap();
        assert_eq!(srs.proj_cs().and_then(|p| p.name()), Some("WGS 84 / UTM zone 34S"));

        let mut srs = SpatialReference::from_epsg(4326).unwrap();
        srs.set_utm(5, true).unwrap();
        assert_eq!(srs.proj_cs().and_then(|p| p.name()), Some("UTM Zone 5, Northern Hemisphere"));
        srs.set_utm(6, false).unwrap();
        assert_eq!(srs.proj_cs().and_then(|p| p.name()), Some("UTM Zone 6, Southern Hemisphere"));

        let mut srs = SpatialReference::from_epsg(32633).unwrap();
        srs.set_projected_cs("Site grid").unwrap();
        srs.set_utm(35, true).unwrap();
        assert_eq!(srs.proj_cs().and_then(|p| p.name()), Some("Site grid"));
    }

    #[test]
    fn utm_round_trip() {
        let mut srs = SpatialReference::new();
        srs.set_well_known_geog_cs("WGS84").unwrap();
        srs.set_utm(33, true).unwrap();
        assert_eq!(srs.utm_zone(), Some((33, true)));
        assert_eq!(srs.name(), Some("UTM Zone 33, Northern Hemisphere"));
        assert_eq!(srs.projection_parameter(CENTRAL_MERIDIAN), Some(15.0));

        srs.set_utm(1, false).unwrap();
        assert_eq!(srs.utm_zone(), Some((1, false)));
        assert!(srs.set_utm(61, true).is_err());
    }

    #[test]
    fn setters_are_idempotent() {
        let mut a = SpatialReference::new();
        a.set_well_known_geog_cs("NAD83").unwrap();
        a.set_lcc(33.0, 45.0, 39.0, -96.0, 0.0, 0.0).unwrap();
        let once = a.clone();
        a.set_lcc(33.0, 45.0, 39.0, -96.0, 0.0, 0.0).unwrap();
        assert_eq!(a, once);
    }

    #[test]
    fn helpers_take_metres_regardless_of_units() {
        let mut srs = SpatialReference::new();
        srs.set_well_known_geog_cs("NAD83").unwrap();
        srs.set_projection(TRANSVERSE_MERCATOR).unwrap();
        srs.set_linear_units("US survey foot", 0.304800609601219).unwrap();
        srs.set_tm(31.0, -110.1666666666667, 0.9999, 213360.0, 0.0).unwrap();
        assert_relative_eq!(
            srs.projection_parameter(FALSE_EASTING).unwrap(),
            213360.0 / 0.304800609601219,
            epsilon = 1e-6
        );
        assert!(srs.utm_zone().is_none());
    }

    #[test]
    fn eckert_and_variants() {
        let mut srs = SpatialReference::new();
        srs.set_eckert(4, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(srs.projection(), Some("Eckert_IV"));
        assert!(srs.set_eckert(7, 0.0, 0.0, 0.0).is_err());
        srs.set_tmso(0.0, 25.0, 1.0, 0.0, 0.0).unwrap();
        assert_eq!(srs.projection(), Some("Transverse_Mercator_South_Orientated"));
        assert!(srs.set_tm_variant("Mollweide", 0.0, 0.0, 1.0, 0.0, 0.0).is_err());
    }
}
