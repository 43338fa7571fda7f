//! Setting up coordinate transformations between two definitions.
//!
//! [`CoordinateTransform::new`] checks that a path between the systems exists
//! and works out the chain of [`Step`]s once. Running the chain applies the axis,
//! unit and prime meridian steps directly and hands projections, geocentric
//! conversions and datum shifts to a [`ProjectionEngine`].
use crate::datums::datum_by_name;
use crate::result::{BoxError, Error, Result};
use crate::shared::SharedSrs;
use crate::srs::SpatialReference;
use geo_types::Coord;
use log::{debug, trace};
use osr_core::config::Strictness;
use osr_core::node::NodeKind;
use osr_core::units::{factors_match, DEGREE_TO_RADIAN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const FORMAT: &str = "transform";
const WGS84_GEOGCS: i64 = 4326;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ellipsoid {
    pub semi_major: f64,
    /// Zero for a sphere.
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    fn of(srs: &SpatialReference) -> Result<Self> {
        let missing = |_| Error::IncompatibleCRSError(format!("{} has no spheroid", describe(srs)));
        Ok(Ellipsoid {
            semi_major: srs.semi_major().map_err(missing)?,
            inverse_flattening: srs.inverse_flattening().map_err(missing)?,
        })
    }
}

/// What an engine needs to run a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// WKT method name.
    pub method: String,
    /// Normalized values: angles in radians, lengths in metres.
    pub parameters: Vec<(String, f64)>,
    pub ellipsoid: Ellipsoid,
    /// The same system as a PROJ.4 string, for engines built on PROJ.
    pub proj4: Option<String>,
}

impl Projection {
    fn of(srs: &SpatialReference) -> Result<Self> {
        let method = srs
            .projection()
            .ok_or_else(|| Error::InvalidCRSError(format!("{} has no PROJECTION", describe(srs))))?;
        let parameters = srs
            .parameters()
            .into_iter()
            .filter_map(|(name, _)| {
                srs.normalized_projection_parameter(&name)
                    .map(|value| (name, value))
            })
            .collect();
        Ok(Projection {
            method: method.to_owned(),
            parameters,
            ellipsoid: Ellipsoid::of(srs)?,
            proj4: srs.to_proj4().ok(),
        })
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

/// One stage of a transformation.
///
/// Geographic coordinates between the first and the last unit scaling are
/// longitude/latitude in radians relative to Greenwich, projected and geocentric
/// ones are in metres.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Exchanges x and y.
    SwapAxes,
    /// Multiplies x and y by `xy`, heights by `z`.
    Scale { xy: f64, z: f64 },
    /// Adds `radians` to every longitude.
    PrimeMeridian { radians: f64 },
    /// Projected metres to geographic radians.
    InverseProjection(Projection),
    /// Geographic radians and heights to geocentric x, y, z.
    ToGeocentric(Ellipsoid),
    /// Geocentric x, y, z to geographic radians and heights.
    FromGeocentric(Ellipsoid),
    /// Seven parameter Helmert shift in TOWGS84 convention, towards WGS 84 or
    /// away from it when `inverse`.
    DatumShift { towgs84: [f64; 7], inverse: bool },
    /// Geographic radians to projected metres.
    ForwardProjection(Projection),
}

impl Step {
    /// Steps the transform runs itself instead of passing them to the engine.
    pub fn is_local(&self) -> bool {
        matches!(self, Step::SwapAxes | Step::Scale { .. } | Step::PrimeMeridian { .. })
    }
}

/// Does the numeric work for projection, geocentric and datum shift steps.
pub trait ProjectionEngine {
    /// Runs `step` in place. `z` is either empty or as long as `coords`.
    fn apply(
        &self,
        step: &Step,
        coords: &mut [Coord<f64>],
        z: &mut [f64],
    ) -> std::result::Result<(), BoxError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransformOptions {
    /// Swap coordinates of systems whose AXIS nodes put latitude or northing
    /// first. Without it every system is taken as x/easting first.
    pub honor_axis_order: bool,
    /// Treat differing datums without TOWGS84 as the same datum instead of
    /// refusing to build.
    pub ballpark_datum: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            honor_axis_order: true,
            ballpark_datum: false,
        }
    }
}

/// A ready to run transformation from `source` to `target`.
///
/// Holds its own references to both definitions; dropping it releases them.
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    source: SharedSrs,
    target: SharedSrs,
    steps: Vec<Step>,
}

impl CoordinateTransform {
    pub fn new(source: &SharedSrs, target: &SharedSrs) -> Result<Self> {
        Self::with_options(source, target, TransformOptions::default())
    }

    pub fn with_options(
        source: &SharedSrs,
        target: &SharedSrs,
        options: TransformOptions,
    ) -> Result<Self> {
        check_valid(source, "source")?;
        check_valid(target, "target")?;
        let steps = build_steps(source, target, options)?;
        debug!(
            "transform from {} to {} built with {} steps",
            describe(source),
            describe(target),
            steps.len()
        );
        Ok(CoordinateTransform {
            source: source.reference(),
            target: target.reference(),
            steps,
        })
    }

    pub fn source(&self) -> &SharedSrs {
        &self.source
    }

    pub fn target(&self) -> &SharedSrs {
        &self.target
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Transforms `coords` in place. `z` carries heights and may be empty.
    pub fn transform(
        &self,
        engine: &dyn ProjectionEngine,
        coords: &mut [Coord<f64>],
        z: &mut [f64],
    ) -> Result<()> {
        if !z.is_empty() && z.len() != coords.len() {
            return Err(Error::ArrayLengthError {
                format: FORMAT,
                expected: coords.len(),
                found: z.len(),
            });
        }
        for step in &self.steps {
            trace!("running {:?}", step);
            match step {
                Step::SwapAxes => {
                    for c in coords.iter_mut() {
                        std::mem::swap(&mut c.x, &mut c.y);
                    }
                }
                Step::Scale { xy, z: zf } => {
                    for c in coords.iter_mut() {
                        c.x *= xy;
                        c.y *= xy;
                    }
                    for h in z.iter_mut() {
                        *h *= zf;
                    }
                }
                Step::PrimeMeridian { radians } => {
                    for c in coords.iter_mut() {
                        c.x += radians;
                    }
                }
                step => engine.apply(step, coords, z).map_err(Error::EngineError)?,
            }
        }
        Ok(())
    }
}

fn describe(srs: &SpatialReference) -> String {
    srs.name().unwrap_or("unnamed system").to_owned()
}

fn check_valid(srs: &SpatialReference, side: &str) -> Result<()> {
    if srs.is_empty() {
        return Err(Error::InvalidCRSError(format!("{} definition is empty", side)));
    }
    srs.validate().into_result(Strictness::Lenient)
}

/// The horizontal part of a compound system, the definition itself otherwise.
fn horizontal_of(srs: &SpatialReference) -> Result<SpatialReference> {
    if !srs.is_compound() {
        return Ok(srs.clone());
    }
    let horizontal = srs
        .horizontal()
        .ok_or_else(|| Error::InvalidCRSError(format!("{} has no horizontal part", describe(srs))))?;
    SpatialReference::from_root(horizontal.clone())
}

fn northing_first(srs: &SpatialReference) -> bool {
    srs.root()
        .and_then(|r| r.child(NodeKind::Axis))
        .and_then(|a| a.attr(1))
        .map(|d| d.eq_ignore_ascii_case("NORTH") || d.eq_ignore_ascii_case("SOUTH"))
        .unwrap_or(false)
}

fn height_factor(srs: &SpatialReference) -> f64 {
    if srs.vert_cs().is_some() {
        srs.target_linear_units(Some("VERT_CS")).1
    } else {
        1.0
    }
}

fn horizontal_factor(srs: &SpatialReference) -> f64 {
    if srs.is_geographic() {
        srs.angular_units().1
    } else {
        srs.linear_units().1
    }
}

/// TOWGS84 of the datum. WGS 84 itself needs none and reads as a zero shift.
fn shift_to_wgs84(srs: &SpatialReference) -> Option<[f64; 7]> {
    srs.towgs84().or_else(|| {
        srs.datum()
            .and_then(|d| d.name())
            .and_then(datum_by_name)
            .filter(|d| d.geogcs_epsg == WGS84_GEOGCS)
            .map(|_| [0.0; 7])
    })
}

fn build_steps(
    source: &SpatialReference,
    target: &SpatialReference,
    options: TransformOptions,
) -> Result<Vec<Step>> {
    for srs in [source, target] {
        if srs.is_local() || srs.root_kind() == Some(NodeKind::VertCs) {
            if source.is_same(target) {
                return Ok(Vec::new());
            }
            return Err(Error::IncompatibleCRSError(format!(
                "{} can only be transformed into itself",
                describe(srs)
            )));
        }
    }

    let src = horizontal_of(source)?;
    let dst = horizontal_of(target)?;
    for srs in [&src, &dst] {
        if srs.datum().is_none() {
            return Err(Error::IncompatibleCRSError(format!("{} has no datum", describe(srs))));
        }
        Ellipsoid::of(srs)?;
    }

    let swap_src = options.honor_axis_order && northing_first(&src);
    let swap_dst = options.honor_axis_order && northing_first(&dst);
    let (src_z, dst_z) = (height_factor(source), height_factor(target));
    if source.is_same(target) && swap_src == swap_dst && factors_match(src_z, dst_z) {
        return Ok(Vec::new());
    }

    let same_datum = src.same_datum(&dst);
    let shifts = match (shift_to_wgs84(&src), shift_to_wgs84(&dst)) {
        _ if same_datum => None,
        (Some(from), Some(to)) => Some((from, to)),
        _ if options.ballpark_datum => None,
        _ => {
            return Err(Error::IncompatibleCRSError(format!(
                "datums of {} and {} differ and TOWGS84 is missing",
                describe(&src),
                describe(&dst)
            )))
        }
    };

    let mut steps = Vec::new();
    if swap_src {
        steps.push(Step::SwapAxes);
    }
    let scale = horizontal_factor(&src);
    if !factors_match(scale, 1.0) || !factors_match(src_z, 1.0) {
        steps.push(Step::Scale { xy: scale, z: src_z });
    }
    if src.is_projected() {
        steps.push(Step::InverseProjection(Projection::of(&src)?));
    }
    let src_pm = src.prime_meridian_degrees();
    if !src.is_geocentric() && src_pm != 0.0 {
        steps.push(Step::PrimeMeridian { radians: src_pm * DEGREE_TO_RADIAN });
    }

    let needs_geocentric = shifts.is_some() || src.is_geocentric() != dst.is_geocentric();
    if needs_geocentric && !src.is_geocentric() {
        steps.push(Step::ToGeocentric(Ellipsoid::of(&src)?));
    }
    if let Some((from, to)) = shifts {
        if from.iter().any(|v| *v != 0.0) {
            steps.push(Step::DatumShift { towgs84: from, inverse: false });
        }
        if to.iter().any(|v| *v != 0.0) {
            steps.push(Step::DatumShift { towgs84: to, inverse: true });
        }
    }
    if needs_geocentric && !dst.is_geocentric() {
        steps.push(Step::FromGeocentric(Ellipsoid::of(&dst)?));
    }

    let dst_pm = dst.prime_meridian_degrees();
    if !dst.is_geocentric() && dst_pm != 0.0 {
        steps.push(Step::PrimeMeridian { radians: -dst_pm * DEGREE_TO_RADIAN });
    }
    if dst.is_projected() {
        steps.push(Step::ForwardProjection(Projection::of(&dst)?));
    }
    let scale = horizontal_factor(&dst);
    if !factors_match(scale, 1.0) || !factors_match(dst_z, 1.0) {
        steps.push(Step::Scale { xy: 1.0 / scale, z: 1.0 / dst_z });
    }
    if swap_dst {
        steps.push(Step::SwapAxes);
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::coord;
    use osr_core::node::{Node, Value};
    use std::sync::Mutex;

    /// Records the steps it is handed and leaves coordinates alone.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<Step>>);

    impl ProjectionEngine for Recorder {
        fn apply(
            &self,
            step: &Step,
            _coords: &mut [Coord<f64>],
            _z: &mut [f64],
        ) -> std::result::Result<(), BoxError> {
            self.0.lock().unwrap().push(step.clone());
            Ok(())
        }
    }

    struct Failing;

    impl ProjectionEngine for Failing {
        fn apply(&self, _: &Step, _: &mut [Coord<f64>], _: &mut [f64]) -> std::result::Result<(), BoxError> {
            Err("out of range".into())
        }
    }

    fn shared(code: i64) -> SharedSrs {
        SharedSrs::new(SpatialReference::from_epsg(code).unwrap())
    }

    #[test]
    fn same_code_is_identity() {
        let (a, b) = (shared(4326), shared(4326));
        let ct = CoordinateTransform::new(&a, &b).unwrap();
        assert!(ct.is_identity());
        let mut coords = [coord! { x: 10.0, y: 50.0 }];
        ct.transform(&Failing, &mut coords, &mut []).unwrap();
        assert_eq!(coords[0], coord! { x: 10.0, y: 50.0 });
    }

    #[test]
    fn holds_references_to_both_sides() {
        let (a, b) = (shared(4326), shared(32633));
        let ct = CoordinateTransform::new(&a, &b).unwrap();
        assert_eq!(a.reference_count(), 2);
        assert!(ct.source().ptr_eq(&a));
        drop(ct);
        assert_eq!(a.reference_count(), 1);
        assert_eq!(b.reference_count(), 1);
    }

    #[test]
    fn geographic_to_utm() {
        let ct = CoordinateTransform::new(&shared(4326), &shared(32633)).unwrap();
        let steps = ct.steps();
        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[0], Step::Scale { .. }));
        match &steps[1] {
            Step::ForwardProjection(p) => {
                assert_eq!(p.method, "Transverse_Mercator");
                assert_relative_eq!(p.parameter("central_meridian").unwrap(), 15f64.to_radians(), epsilon = 1e-12);
                assert_relative_eq!(p.parameter("false_easting").unwrap(), 500000.0);
                assert_relative_eq!(p.ellipsoid.semi_major, 6378137.0);
                assert!(p.proj4.as_deref().unwrap().contains("+proj=utm"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let engine = Recorder::default();
        let mut coords = [coord! { x: 15.0, y: 45.0 }];
        ct.transform(&engine, &mut coords, &mut []).unwrap();
        assert_relative_eq!(coords[0].x, 15f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(coords[0].y, 45f64.to_radians(), epsilon = 1e-12);
        assert_eq!(engine.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn datum_shift_goes_through_geocentric() {
        let mut nad27 = SpatialReference::from_epsg(4267).unwrap();
        nad27.set_towgs84([-8.0, 160.0, 176.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let mut wgs84 = SpatialReference::from_epsg(4326).unwrap();
        wgs84.set_towgs84([0.0; 7]).unwrap();
        let ct = CoordinateTransform::new(&nad27.into(), &wgs84.into()).unwrap();
        assert_eq!(ct.steps().len(), 5);
        match &ct.steps()[1] {
            Step::ToGeocentric(e) => assert_relative_eq!(e.inverse_flattening, 294.978698213898, epsilon = 1e-9),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            ct.steps()[2],
            Step::DatumShift { towgs84: [-8.0, 160.0, 176.0, 0.0, 0.0, 0.0, 0.0], inverse: false }
        );
        assert!(matches!(ct.steps()[3], Step::FromGeocentric(_)));
    }

    #[test]
    fn wgs84_needs_no_towgs84() {
        assert!(shared(4326).towgs84().is_none());
        for code in [4269, 4230, 4258] {
            let source = shared(code);
            assert!(source.towgs84().is_some(), "EPSG:{}", code);
            let ct = CoordinateTransform::new(&source, &shared(4326)).unwrap();
            assert!(
                !ct.steps().iter().any(|s| matches!(s, Step::DatumShift { inverse: true, .. })),
                "EPSG:{}",
                code
            );
            let back = CoordinateTransform::new(&shared(4326), &source).unwrap();
            assert!(back.steps().iter().any(|s| matches!(s, Step::FromGeocentric(_))));
        }
        let ed50 = CoordinateTransform::new(&shared(4230), &shared(32633)).unwrap();
        assert_eq!(
            ed50.steps()[2],
            Step::DatumShift { towgs84: [-87.0, -98.0, -121.0, 0.0, 0.0, 0.0, 0.0], inverse: false }
        );
    }

    #[test]
    fn differing_datums_need_towgs84() {
        let err = CoordinateTransform::new(&shared(4267), &shared(4326)).unwrap_err();
        assert!(matches!(err, Error::IncompatibleCRSError(_)));
        let ballpark = TransformOptions { ballpark_datum: true, ..TransformOptions::default() };
        let ct = CoordinateTransform::with_options(&shared(4267), &shared(4326), ballpark).unwrap();
        assert!(ct.steps().iter().all(Step::is_local));
    }

    #[test]
    fn lat_long_axes_are_swapped() {
        let epsga = SharedSrs::new(SpatialReference::from_epsga(4326).unwrap());
        let ct = CoordinateTransform::new(&epsga, &shared(4326)).unwrap();
        assert_eq!(ct.steps()[0], Step::SwapAxes);
        let mut coords = [coord! { x: 50.0, y: 10.0 }];
        ct.transform(&Failing, &mut coords, &mut []).unwrap();
        assert_relative_eq!(coords[0].x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(coords[0].y, 50.0, epsilon = 1e-9);

        let plain = TransformOptions { honor_axis_order: false, ..TransformOptions::default() };
        assert!(CoordinateTransform::with_options(&epsga, &shared(4326), plain).unwrap().is_identity());
    }

    #[test]
    fn prime_meridian_is_applied() {
        let mut paris = SpatialReference::new();
        paris.set_well_known_geog_cs("WGS84").unwrap();
        let mut geog = paris.geog_cs().unwrap().clone();
        geog.replace_child(Node::named(NodeKind::Primem, "Paris").with_attr(Value::number(2.33722917)));
        let paris = SharedSrs::new(SpatialReference::from_root(geog).unwrap());
        let ct = CoordinateTransform::new(&paris, &shared(4326)).unwrap();
        let mut coords = [coord! { x: 0.0, y: 48.0 }];
        ct.transform(&Failing, &mut coords, &mut []).unwrap();
        assert_relative_eq!(coords[0].x, 2.33722917, epsilon = 1e-9);
        assert_relative_eq!(coords[0].y, 48.0, epsilon = 1e-9);
    }

    #[test]
    fn local_and_vertical_only_map_to_themselves() {
        let mut local = SpatialReference::new();
        local.set_local_cs("site").unwrap();
        let local = SharedSrs::new(local);
        assert!(CoordinateTransform::new(&local, &local.reference()).unwrap().is_identity());
        assert!(matches!(
            CoordinateTransform::new(&local, &shared(4326)),
            Err(Error::IncompatibleCRSError(_))
        ));
        assert!(matches!(
            CoordinateTransform::new(&shared(5703), &shared(4326)),
            Err(Error::IncompatibleCRSError(_))
        ));
    }

    #[test]
    fn invalid_inputs() {
        let empty = SharedSrs::default();
        assert!(matches!(CoordinateTransform::new(&empty, &shared(4326)), Err(Error::InvalidCRSError(_))));
        let mut no_spheroid = SpatialReference::from_epsg(4326).unwrap();
        no_spheroid.root_mut().unwrap().find_mut(NodeKind::Datum).unwrap().remove_children(NodeKind::Spheroid);
        assert!(CoordinateTransform::new(&no_spheroid.into(), &shared(4326)).is_err());
    }

    #[test]
    fn engine_failures_and_bad_lengths() {
        let ct = CoordinateTransform::new(&shared(4326), &shared(32633)).unwrap();
        let mut coords = [coord! { x: 15.0, y: 45.0 }];
        assert!(matches!(
            ct.transform(&Failing, &mut coords, &mut []),
            Err(Error::EngineError(_))
        ));
        assert!(matches!(
            ct.transform(&Recorder::default(), &mut coords, &mut [1.0, 2.0]),
            Err(Error::ArrayLengthError { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoordinateTransform>();
        assert_send_sync::<SharedSrs>();
    }
}
