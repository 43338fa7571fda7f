use approx::assert_relative_eq;
use osr::authority::defaults::WGS84;
use osr::units::US_FOOT_TO_METRE;
use osr::{
    CoordinateTransform, Error, GpkgAuthority, PciDefinition, SharedSrs, SpatialReference,
    UsgsDefinition,
};
use tempfile::tempdir;

const CODES: &[i64] = &[4326, 4267, 4269, 4258, 32633, 32759, 26915, 3857, 3035, 27700, 4978];

#[test]
fn wgs84_wkt_is_geographic() {
    let srs = SpatialReference::from_wkt(WGS84.definition).unwrap();
    assert!(srs.is_geographic());
    assert!(!srs.is_projected());
    assert_relative_eq!(srs.semi_major().unwrap(), 6378137.0);
    assert_relative_eq!(srs.inverse_flattening().unwrap(), 298.257223563);
}

#[test]
fn epsg_4326_to_proj4() {
    let proj4 = SpatialReference::from_epsg(4326).unwrap().to_proj4().unwrap();
    assert!(proj4.contains("+proj=longlat"));
    assert!(proj4.contains("+datum=WGS84"));
}

#[test]
fn transform_between_equal_codes_is_identity() {
    for code in [4326, 32633, 3857] {
        let source = SharedSrs::new(SpatialReference::from_epsg(code).unwrap());
        let target = SharedSrs::new(SpatialReference::from_epsg(code).unwrap());
        let ct = CoordinateTransform::new(&source, &target).unwrap();
        assert!(ct.is_identity(), "EPSG:{}", code);
    }
}

#[test]
fn utm_setter_reads_back() {
    let mut srs = SpatialReference::from_epsg(4326).unwrap();
    srs.set_utm(33, true).unwrap();
    assert_eq!(srs.utm_zone(), Some((33, true)));
    assert!(srs.is_same(&SpatialReference::from_epsg(32633).unwrap()));
}

#[test]
fn wkt_and_proj4_agree() {
    let pairs = [
        (32633, "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs"),
        (4326, "+proj=longlat +datum=WGS84 +no_defs"),
    ];
    for (code, proj4) in pairs {
        let from_wkt = SpatialReference::from_wkt(&SpatialReference::from_epsg(code).unwrap().to_wkt().unwrap()).unwrap();
        let from_proj4 = SpatialReference::from_proj4(proj4).unwrap();
        assert!(from_wkt.is_same(&from_proj4), "{}", proj4);
    }
}

#[test]
fn wkt_round_trips() {
    for code in CODES {
        let srs = SpatialReference::from_epsg(*code).unwrap();
        let wkt = srs.to_wkt().unwrap();
        let back = SpatialReference::from_wkt(&wkt).unwrap();
        assert!(back.is_same(&srs), "EPSG:{}", code);
        assert_eq!(back.to_wkt().unwrap(), wkt);
        let pretty = SpatialReference::from_wkt(&srs.to_pretty_wkt(false).unwrap()).unwrap();
        assert!(pretty.is_same(&srs), "EPSG:{}", code);
    }
}

#[test]
fn normalized_parameters_follow_the_unit() {
    let mut srs = SpatialReference::from_epsg(26915).unwrap();
    srs.set_linear_units_and_update_parameters("US survey foot", US_FOOT_TO_METRE)
        .unwrap();
    for (name, raw) in srs.parameters() {
        let normalized = srs.normalized_projection_parameter(&name).unwrap();
        let expected = raw * srs.parameter_factor(&name);
        assert!((normalized - expected).abs() <= 1e-9 * expected.abs().max(1.0), "{}", name);
    }
    assert_relative_eq!(
        srs.normalized_projection_parameter("false_easting").unwrap(),
        500000.0,
        max_relative = 1e-12
    );
}

#[test]
fn clones_are_independent() {
    let original = SpatialReference::from_epsg(32633).unwrap();
    let mut copy = original.clone();
    copy.set_utm(34, true).unwrap();
    copy.set_linear_units("foot", 0.3048).unwrap();
    assert_eq!(original.utm_zone(), Some((33, true)));
    assert_eq!(original.linear_units().0, "metre");
    assert!(!copy.is_same(&original));
}

#[test]
fn esri_morph_is_idempotent() {
    for code in CODES {
        let mut once = SpatialReference::from_epsg(*code).unwrap();
        once.morph_to_esri().unwrap();
        let mut twice = once.clone();
        twice.morph_to_esri().unwrap();
        assert_eq!(once.to_wkt().unwrap(), twice.to_wkt().unwrap(), "EPSG:{}", code);
    }
}

#[test]
fn fixed_length_arrays() {
    let usgs = SpatialReference::from_epsg(32633).unwrap().to_usgs().unwrap();
    assert_eq!(usgs.params.len(), 15);
    assert_eq!(usgs.zone, 33);
    let pci = SpatialReference::from_epsg(32633).unwrap().to_pci().unwrap();
    assert_eq!(pci.params.len(), 17);

    assert!(matches!(
        UsgsDefinition::from_slice(1, 33, &[0.0; 14], 12),
        Err(Error::ArrayLengthError { expected: 15, found: 14, .. })
    ));
    assert!(matches!(
        PciDefinition::from_slice("UTM 33 D000", "METRE", &[0.0; 18]),
        Err(Error::ArrayLengthError { expected: 17, found: 18, .. })
    ));
}

#[test]
fn user_input_through_a_geopackage() {
    let dir = tempdir().unwrap();
    let filename = dir.path().join("catalog.gpkg");
    let table = GpkgAuthority::create(&filename).unwrap();
    let utm = SpatialReference::from_user_input("EPSG:32633").unwrap();
    table.insert_srs(&utm, "EPSG", 32633, "WGS 84 / UTM zone 33N").unwrap();
    table.close().unwrap();

    let table = GpkgAuthority::open(&filename).unwrap();
    let back = SpatialReference::from_epsg_with(&table, 32633).unwrap();
    assert!(back.is_same(&utm));

    let source = SharedSrs::new(SpatialReference::from_epsg(4326).unwrap());
    let target = SharedSrs::new(back);
    let ct = CoordinateTransform::new(&source, &target).unwrap();
    assert!(!ct.is_identity());
    assert_eq!(target.reference_count(), 2);
}

#[test]
fn regional_datums_reach_wgs84() {
    let wgs84 = SharedSrs::new(SpatialReference::from_epsg(4326).unwrap());
    for code in [4269, 4258, 26915, 3035] {
        let source = SharedSrs::new(SpatialReference::from_epsg(code).unwrap());
        assert!(CoordinateTransform::new(&source, &wgs84).is_ok(), "EPSG:{}", code);
        assert!(CoordinateTransform::new(&wgs84, &source).is_ok(), "EPSG:{}", code);
    }
}
