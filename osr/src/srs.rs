use crate::result::{Error, Result};
use log::debug;
use osr_core::catalog::{param_class, ParamClass};
use osr_core::node::{Node, NodeKind, SrsNode, Value};
use osr_core::units::{factors_match, DEGREE_TO_RADIAN};
use std::fmt;

/// A coordinate reference system definition.
///
/// Holds at most one root node (GEOGCS, PROJCS, GEOCCS, VERT_CS, COMPD_CS or
/// LOCAL_CS). `Clone` is a deep copy: the clone shares nothing with the original.
/// Wrap it in a [`SharedSrs`](crate::SharedSrs) to hand the same definition to
/// several owners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialReference {
    root: Option<Node>,
}

impl SpatialReference {
    /// An empty definition to be filled by an importer or the setters.
    pub fn new() -> Self {
        SpatialReference { root: None }
    }

    pub fn from_root(root: Node) -> Result<Self> {
        if !root.kind.is_crs() {
            return Err(Error::InvalidCRSError(format!(
                "{} cannot be the root of a coordinate system",
                root.kind
            )));
        }
        Ok(SpatialReference { root: Some(root) })
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut Node> {
        self.root.as_mut()
    }

    pub(crate) fn root_or_err(&self) -> Result<&Node> {
        self.root.as_ref().ok_or(Error::MissingNodeError("root"))
    }

    pub fn set_root(&mut self, root: Node) -> Result<()> {
        *self = SpatialReference::from_root(root)?;
        Ok(())
    }

    pub fn take_root(&mut self) -> Option<Node> {
        self.root.take()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn clear(&mut self) {
        self.root = None;
    }

    pub fn root_kind(&self) -> Option<NodeKind> {
        self.root.as_ref().map(|r| r.kind)
    }

    /// Name of the root system.
    pub fn name(&self) -> Option<&str> {
        self.root.as_ref().and_then(Node::name)
    }

    pub fn attr_value(&self, path: &str, index: usize) -> Option<String> {
        self.root.as_ref()?.attr_value(path, index)
    }

    /// Sets attribute 0 of the node at `path`, creating it and anything in between.
    /// An empty definition gets a root of the first segment's kind.
    pub fn set_attr_value(&mut self, path: &str, value: &str) -> Result<()> {
        if self.root.is_none() {
            let first = path
                .split(|c| c == '|' || c == '.')
                .next()
                .unwrap_or_default();
            let kind = NodeKind::from_keyword(first.trim())
                .filter(|k| k.is_crs())
                .ok_or_else(|| Error::PathError(path.to_owned()))?;
            self.root = Some(Node::new(kind));
        }
        match self.root.as_mut() {
            Some(root) => root.set_attr_value(path, value),
            None => Err(Error::MissingNodeError("root")),
        }
    }

    pub fn is_geographic(&self) -> bool {
        match self.root_kind() {
            Some(NodeKind::Geogcs) => true,
            Some(NodeKind::CompdCs) => self.horizontal().map(|h| h.kind) == Some(NodeKind::Geogcs),
            _ => false,
        }
    }

    pub fn is_projected(&self) -> bool {
        match self.root_kind() {
            Some(NodeKind::Projcs) => true,
            Some(NodeKind::CompdCs) => self.horizontal().map(|h| h.kind) == Some(NodeKind::Projcs),
            _ => false,
        }
    }

    pub fn is_geocentric(&self) -> bool {
        self.root_kind() == Some(NodeKind::Geoccs)
    }

    pub fn is_local(&self) -> bool {
        self.root_kind() == Some(NodeKind::LocalCs)
    }

    pub fn is_compound(&self) -> bool {
        self.root_kind() == Some(NodeKind::CompdCs)
    }

    /// A standalone VERT_CS, or a compound system with a vertical part.
    pub fn is_vertical(&self) -> bool {
        match self.root.as_ref() {
            Some(r) if r.kind == NodeKind::VertCs => true,
            Some(r) if r.kind == NodeKind::CompdCs => r.child(NodeKind::VertCs).is_some(),
            _ => false,
        }
    }

    /// The horizontal system: the root itself, or the GEOGCS/PROJCS of a COMPD_CS.
    pub fn horizontal(&self) -> Option<&Node> {
        let root = self.root.as_ref()?;
        match root.kind {
            NodeKind::Geogcs | NodeKind::Projcs => Some(root),
            NodeKind::CompdCs => root
                .known_children()
                .find(|n| matches!(n.kind, NodeKind::Geogcs | NodeKind::Projcs)),
            _ => None,
        }
    }

    pub fn geog_cs(&self) -> Option<&Node> {
        self.root.as_ref()?.find(NodeKind::Geogcs)
    }

    pub(crate) fn geog_cs_mut(&mut self) -> Option<&mut Node> {
        self.root.as_mut()?.find_mut(NodeKind::Geogcs)
    }

    pub fn proj_cs(&self) -> Option<&Node> {
        self.root.as_ref()?.find(NodeKind::Projcs)
    }

    pub(crate) fn proj_cs_mut(&mut self) -> Option<&mut Node> {
        self.root.as_mut()?.find_mut(NodeKind::Projcs)
    }

    pub fn vert_cs(&self) -> Option<&Node> {
        self.root.as_ref()?.find(NodeKind::VertCs)
    }

    /// Datum node of the horizontal or geocentric system.
    pub fn datum(&self) -> Option<&Node> {
        let root = self.root.as_ref()?;
        match root.kind {
            NodeKind::Geoccs => root.child(NodeKind::Datum),
            _ => self.geog_cs()?.child(NodeKind::Datum),
        }
    }

    /// The embedded geographic system as a new definition.
    pub fn clone_geog_cs(&self) -> Option<SpatialReference> {
        self.geog_cs().map(|g| SpatialReference {
            root: Some(g.clone()),
        })
    }

    /// Node the CS level units and parameters live on.
    fn linear_unit_holder(&self) -> Option<&Node> {
        let root = self.root.as_ref()?;
        match root.kind {
            NodeKind::CompdCs => root.find(NodeKind::Projcs),
            NodeKind::Geogcs => None,
            _ => Some(root),
        }
    }

    fn linear_unit_holder_mut(&mut self) -> Option<&mut Node> {
        let root = self.root.as_mut()?;
        match root.kind {
            NodeKind::CompdCs => root.find_mut(NodeKind::Projcs),
            NodeKind::Geogcs => None,
            _ => Some(root),
        }
    }

    /// Angular unit of the geographic system, degrees when not given.
    pub fn angular_units(&self) -> (String, f64) {
        self.geog_cs()
            .and_then(|g| g.child(NodeKind::Unit))
            .and_then(unit_of)
            .unwrap_or_else(|| ("degree".to_owned(), DEGREE_TO_RADIAN))
    }

    pub fn set_angular_units(&mut self, name: &str, factor: f64) -> Result<()> {
        let geog = self
            .geog_cs_mut()
            .ok_or(Error::MissingNodeError("GEOGCS"))?;
        geog.replace_child(Node::unit(name, factor));
        Ok(())
    }

    /// Linear unit of the projected, geocentric, local or vertical system. Metres
    /// when not given.
    pub fn linear_units(&self) -> (String, f64) {
        self.linear_unit_holder()
            .and_then(|n| n.child(NodeKind::Unit))
            .and_then(unit_of)
            .unwrap_or_else(|| ("metre".to_owned(), 1.0))
    }

    pub fn set_linear_units(&mut self, name: &str, factor: f64) -> Result<()> {
        let holder = self
            .linear_unit_holder_mut()
            .ok_or(Error::MissingNodeError("PROJCS"))?;
        holder.replace_child(Node::unit(name, factor));
        Ok(())
    }

    /// Linear units of a specific node, e.g. `VERT_CS` of a compound system. `None`
    /// targets the main system.
    pub fn target_linear_units(&self, target: Option<&str>) -> (String, f64) {
        let node = match target {
            Some(path) => self.root.as_ref().and_then(|r| find_path(r, path)),
            None => self.linear_unit_holder(),
        };
        node.and_then(|n| n.child(NodeKind::Unit))
            .and_then(unit_of)
            .unwrap_or_else(|| ("metre".to_owned(), 1.0))
    }

    pub fn set_target_linear_units(
        &mut self,
        target: Option<&str>,
        name: &str,
        factor: f64,
    ) -> Result<()> {
        let node = match target {
            Some(path) => self.root.as_mut().and_then(|r| r.find_path_mut(path)),
            None => self.linear_unit_holder_mut(),
        };
        let node = node.ok_or(Error::MissingNodeError("target"))?;
        node.replace_child(Node::unit(name, factor));
        Ok(())
    }

    /// Changes the linear unit and rescales linear projection parameters so that
    /// the definition still describes the same system.
    pub fn set_linear_units_and_update_parameters(&mut self, name: &str, factor: f64) -> Result<()> {
        if factor <= 0.0 {
            return Err(Error::UnsupportedError(format!("unit factor {}", factor)));
        }
        let (_, old) = self.linear_units();
        let linear: Vec<(String, f64)> = self
            .parameters()
            .into_iter()
            .filter(|(n, _)| param_class(n) == ParamClass::Linear)
            .collect();
        self.set_linear_units(name, factor)?;
        for (param, raw) in linear {
            self.set_projection_parameter(&param, raw * old / factor)?;
        }
        Ok(())
    }

    /// Name and value (in the geographic system's angular units) of the prime
    /// meridian. Greenwich when not given.
    pub fn prime_meridian(&self) -> (String, f64) {
        self.geog_cs()
            .or_else(|| self.root.as_ref().filter(|r| r.kind == NodeKind::Geoccs))
            .and_then(|g| g.child(NodeKind::Primem))
            .map(|pm| {
                (
                    pm.name().unwrap_or("Greenwich").to_owned(),
                    pm.attr_f64(1).unwrap_or(0.0),
                )
            })
            .unwrap_or_else(|| ("Greenwich".to_owned(), 0.0))
    }

    /// Prime meridian offset in degrees.
    pub fn prime_meridian_degrees(&self) -> f64 {
        let (_, value) = self.prime_meridian();
        let (_, factor) = self.angular_units();
        if self.geog_cs().is_none() {
            return value;
        }
        to_degrees(value, factor)
    }

    fn spheroid(&self) -> Result<&Node> {
        self.datum()
            .and_then(|d| d.child(NodeKind::Spheroid))
            .ok_or(Error::MissingNodeError("SPHEROID"))
    }

    pub fn semi_major(&self) -> Result<f64> {
        self.spheroid()?
            .attr_f64(1)
            .ok_or(Error::MissingNodeError("SPHEROID"))
    }

    pub fn inverse_flattening(&self) -> Result<f64> {
        self.spheroid()?
            .attr_f64(2)
            .ok_or(Error::MissingNodeError("SPHEROID"))
    }

    pub fn semi_minor(&self) -> Result<f64> {
        let a = self.semi_major()?;
        let rf = self.inverse_flattening()?;
        if rf.abs() < 1e-9 {
            Ok(a)
        } else {
            Ok(a * (1.0 - 1.0 / rf))
        }
    }

    /// Seven Helmert parameters (dx, dy, dz in metres, rotations in arc seconds,
    /// scale in ppm).
    pub fn set_towgs84(&mut self, params: [f64; 7]) -> Result<()> {
        let datum = self
            .root
            .as_mut()
            .and_then(|r| r.find_mut(NodeKind::Datum))
            .ok_or(Error::MissingNodeError("DATUM"))?;
        let mut node = Node::new(NodeKind::Towgs84);
        for p in params {
            node.attrs.push(Value::number(p));
        }
        datum.replace_child(node);
        Ok(())
    }

    /// `None` when the datum carries no TOWGS84. Missing trailing values read as 0.
    pub fn towgs84(&self) -> Option<[f64; 7]> {
        let node = self.datum()?.child(NodeKind::Towgs84)?;
        let mut out = [0.0; 7];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = node.attr_f64(i).unwrap_or(0.0);
        }
        Some(out)
    }

    /// Adds or replaces the AUTHORITY of the node at `target` (the root when `None`).
    pub fn set_authority(
        &mut self,
        target: Option<&str>,
        authority: &str,
        code: impl fmt::Display,
    ) -> Result<()> {
        let root = self.root.as_mut().ok_or(Error::MissingNodeError("root"))?;
        let node = match target {
            Some(path) => root
                .find_path_mut(path)
                .ok_or_else(|| Error::PathError(path.to_owned()))?,
            None => root,
        };
        node.replace_child(Node::authority(authority, code));
        Ok(())
    }

    pub fn authority_name(&self, target: Option<&str>) -> Option<String> {
        self.authority_node(target)?.name().map(str::to_owned)
    }

    pub fn authority_code(&self, target: Option<&str>) -> Option<String> {
        self.authority_node(target)?.attr(1).map(str::to_owned)
    }

    fn authority_node(&self, target: Option<&str>) -> Option<&Node> {
        let root = self.root.as_ref()?;
        let node = match target {
            Some(path) => find_path(root, path)?,
            None => root,
        };
        node.child(NodeKind::Authority)
    }

    /// True for EPSG geographic systems whose axis order is latitude first.
    pub fn epsg_treats_as_lat_long(&self) -> bool {
        if !self.is_geographic() {
            return false;
        }
        let geog = match self.geog_cs() {
            Some(g) => g,
            None => return false,
        };
        let is_epsg = geog
            .child(NodeKind::Authority)
            .and_then(Node::name)
            .map(|n| n.eq_ignore_ascii_case("EPSG"))
            .unwrap_or(false);
        if !is_epsg {
            return false;
        }
        match geog.child(NodeKind::Axis).and_then(|a| a.attr(1)) {
            Some(dir) => dir.eq_ignore_ascii_case("NORTH") || dir.eq_ignore_ascii_case("SOUTH"),
            None => true,
        }
    }

    /// WKT name of the projection method.
    pub fn projection(&self) -> Option<&str> {
        self.proj_cs()?.child(NodeKind::Projection)?.name()
    }

    /// Sets the projection method. A geographic root is wrapped into a new PROJCS
    /// first. Parameters of a different previous method are dropped.
    pub fn set_projection(&mut self, method: &str) -> Result<()> {
        self.ensure_projcs()?;
        let projcs = self
            .proj_cs_mut()
            .ok_or(Error::MissingNodeError("PROJCS"))?;
        let changed = projcs
            .child(NodeKind::Projection)
            .and_then(Node::name)
            .map(|old| !old.eq_ignore_ascii_case(method))
            .unwrap_or(false);
        if changed {
            debug!("projection changed to {}, clearing parameters", method);
            projcs.remove_children(NodeKind::Parameter);
        }
        projcs
            .children
            .retain(|c| !is_proj4_extension(c));
        projcs.replace_child(Node::named(NodeKind::Projection, method));
        Ok(())
    }

    /// Makes sure a PROJCS exists: an empty definition gets a new one, a
    /// geographic root is moved inside one.
    pub(crate) fn ensure_projcs(&mut self) -> Result<()> {
        match self.root.take() {
            None => {
                self.root = Some(
                    Node::named(NodeKind::Projcs, "unnamed").with_child(Node::unit("metre", 1.0)),
                );
            }
            Some(root) if root.kind == NodeKind::Geogcs => {
                let mut projcs = Node::named(NodeKind::Projcs, "unnamed");
                projcs.insert_child(root);
                projcs.insert_child(Node::unit("metre", 1.0));
                self.root = Some(projcs);
            }
            Some(root) => {
                let has_projcs = root.find(NodeKind::Projcs).is_some();
                let kind = root.kind;
                self.root = Some(root);
                if !has_projcs {
                    return Err(Error::InvalidCRSError(format!(
                        "cannot add a projection to a {}",
                        kind
                    )));
                }
            }
        }
        Ok(())
    }

    /// All PARAMETERs with their raw values, in tree order.
    pub fn parameters(&self) -> Vec<(String, f64)> {
        self.proj_cs()
            .map(|p| {
                p.children_of(NodeKind::Parameter)
                    .filter_map(|n| Some((n.name()?.to_owned(), n.attr_f64(1)?)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw value, in the units of the tree.
    pub fn projection_parameter(&self, name: &str) -> Option<f64> {
        self.proj_cs()?
            .children_of(NodeKind::Parameter)
            .find(|n| n.name().map(|p| p.eq_ignore_ascii_case(name)).unwrap_or(false))?
            .attr_f64(1)
    }

    pub fn projection_parameter_or(&self, name: &str, default: f64) -> f64 {
        self.projection_parameter(name).unwrap_or(default)
    }

    pub fn set_projection_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let projcs = self
            .proj_cs_mut()
            .ok_or(Error::MissingNodeError("PROJCS"))?;
        let existing = projcs.children.iter_mut().find_map(|c| match c {
            SrsNode::Known(n)
                if n.kind == NodeKind::Parameter
                    && n.name().map(|p| p.eq_ignore_ascii_case(name)).unwrap_or(false) =>
            {
                Some(n)
            }
            _ => None,
        });
        match existing {
            Some(node) => node.set_attr(1, Value::number(value)),
            None => {
                projcs.insert_child(Node::parameter(name, value));
            }
        }
        Ok(())
    }

    /// Factor that turns a raw value of `name` into radians or metres.
    pub fn parameter_factor(&self, name: &str) -> f64 {
        match param_class(name) {
            ParamClass::Angular => self.angular_units().1,
            ParamClass::Linear => self.linear_units().1,
            ParamClass::Unitless => 1.0,
        }
    }

    /// Value in radians or metres.
    pub fn normalized_projection_parameter(&self, name: &str) -> Option<f64> {
        self.projection_parameter(name)
            .map(|raw| raw * self.parameter_factor(name))
    }

    pub fn set_normalized_projection_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let factor = self.parameter_factor(name);
        self.set_projection_parameter(name, value / factor)
    }

    /// Value of an angular parameter in degrees, linear in metres.
    pub(crate) fn parameter_degrees_metres(&self, name: &str) -> Option<f64> {
        let raw = self.projection_parameter(name)?;
        Some(match param_class(name) {
            ParamClass::Angular => to_degrees(raw, self.angular_units().1),
            ParamClass::Linear => raw * self.linear_units().1,
            ParamClass::Unitless => raw,
        })
    }

    /// Sets from degrees (angular) or metres (linear).
    pub(crate) fn set_parameter_degrees_metres(&mut self, name: &str, value: f64) -> Result<()> {
        let raw = match param_class(name) {
            ParamClass::Angular => from_degrees(value, self.angular_units().1),
            ParamClass::Linear => value / self.linear_units().1,
            ParamClass::Unitless => value,
        };
        self.set_projection_parameter(name, raw)
    }

    pub fn set_local_cs(&mut self, name: &str) -> Result<()> {
        match self.root.as_mut() {
            None => {
                self.root = Some(Node::named(NodeKind::LocalCs, name));
                Ok(())
            }
            Some(root) if root.kind == NodeKind::LocalCs => {
                root.set_name(name);
                Ok(())
            }
            Some(root) => Err(Error::InvalidCRSError(format!(
                "cannot turn a {} into a LOCAL_CS",
                root.kind
            ))),
        }
    }

    /// Names the projected system, wrapping a geographic root first.
    pub fn set_projected_cs(&mut self, name: &str) -> Result<()> {
        self.ensure_projcs()?;
        self.proj_cs_mut()
            .ok_or(Error::MissingNodeError("PROJCS"))?
            .set_name(name);
        Ok(())
    }

    /// Turns a geographic (or empty) definition into a geocentric one on the same
    /// datum.
    pub fn set_geocentric_cs(&mut self, name: &str) -> Result<()> {
        let mut geoccs = Node::named(NodeKind::Geoccs, name);
        match self.root.take() {
            None => {}
            Some(root) if root.kind == NodeKind::Geoccs => {
                geoccs = root;
                geoccs.set_name(name);
            }
            Some(root) if root.kind == NodeKind::Geogcs => {
                for kind in [NodeKind::Datum, NodeKind::Primem] {
                    if let Some(n) = root.child(kind) {
                        geoccs.insert_child(n.clone());
                    }
                }
            }
            Some(root) => {
                let kind = root.kind;
                self.root = Some(root);
                return Err(Error::InvalidCRSError(format!(
                    "cannot turn a {} into a GEOCCS",
                    kind
                )));
            }
        }
        if geoccs.child(NodeKind::Unit).is_none() {
            geoccs.insert_child(Node::unit("metre", 1.0));
        }
        self.root = Some(geoccs);
        Ok(())
    }

    /// Standalone vertical system, or the vertical part of a compound system when
    /// the root is horizontal. `datum_type` is the OGC code, 2005 for geoid based.
    pub fn set_vertical_cs(&mut self, cs_name: &str, datum_name: &str, datum_type: i32) -> Result<()> {
        let vert = Node::named(NodeKind::VertCs, cs_name)
            .with_child(
                Node::named(NodeKind::VertDatum, datum_name)
                    .with_attr(Value::Bare(datum_type.to_string())),
            )
            .with_child(Node::unit("metre", 1.0));
        match self.root.take() {
            None => self.root = Some(vert),
            Some(root) if root.kind == NodeKind::VertCs => self.root = Some(vert),
            Some(root) if matches!(root.kind, NodeKind::Geogcs | NodeKind::Projcs) => {
                let name = format!("{} + {}", root.name().unwrap_or("unnamed"), cs_name);
                self.root = Some(
                    Node::named(NodeKind::CompdCs, name)
                        .with_child(root)
                        .with_child(vert),
                );
            }
            Some(mut root) if root.kind == NodeKind::CompdCs => {
                root.remove_children(NodeKind::VertCs);
                root.insert_child(vert);
                self.root = Some(root);
            }
            Some(root) => {
                let kind = root.kind;
                self.root = Some(root);
                return Err(Error::InvalidCRSError(format!(
                    "cannot add a vertical system to a {}",
                    kind
                )));
            }
        }
        Ok(())
    }

    pub fn set_compound_cs(
        &mut self,
        name: &str,
        horizontal: &SpatialReference,
        vertical: &SpatialReference,
    ) -> Result<()> {
        let horiz = horizontal
            .root()
            .filter(|r| matches!(r.kind, NodeKind::Geogcs | NodeKind::Projcs))
            .ok_or_else(|| Error::InvalidCRSError("horizontal part must be GEOGCS or PROJCS".into()))?;
        let vert = vertical
            .root()
            .filter(|r| r.kind == NodeKind::VertCs)
            .ok_or_else(|| Error::InvalidCRSError("vertical part must be a VERT_CS".into()))?;
        self.root = Some(
            Node::named(NodeKind::CompdCs, name)
                .with_child(horiz.clone())
                .with_child(vert.clone()),
        );
        Ok(())
    }

    /// Replaces this definition's geographic system with the one from `other`.
    pub fn copy_geog_cs_from(&mut self, other: &SpatialReference) -> Result<()> {
        let geog = other
            .geog_cs()
            .ok_or(Error::MissingNodeError("GEOGCS"))?
            .clone();
        self.replace_geog_cs(geog)
    }

    pub(crate) fn replace_geog_cs(&mut self, geog: Node) -> Result<()> {
        match self.root.as_mut() {
            None => self.root = Some(geog),
            Some(root) if root.kind == NodeKind::Geogcs => *root = geog,
            Some(root) => {
                let holder = if root.kind == NodeKind::CompdCs && root.find(NodeKind::Projcs).is_some() {
                    root.find_mut(NodeKind::Projcs)
                        .ok_or(Error::MissingNodeError("PROJCS"))?
                } else {
                    root
                };
                if !matches!(holder.kind, NodeKind::Projcs | NodeKind::CompdCs) {
                    return Err(Error::InvalidCRSError(format!(
                        "a {} has no geographic system",
                        holder.kind
                    )));
                }
                holder.replace_child(geog);
            }
        }
        Ok(())
    }

    /// Removes nodes a transform has no use for: AUTHORITY, TOWGS84, AXIS and
    /// EXTENSION.
    pub fn strip_ct_params(&mut self) {
        if let Some(root) = self.root.as_mut() {
            root.strip(&[
                NodeKind::Authority,
                NodeKind::Towgs84,
                NodeKind::Axis,
                NodeKind::Extension,
            ]);
        }
    }
}

/// Kind based path lookup on an immutable tree.
pub(crate) fn find_path<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    let mut current = root;
    for segment in path.split(|c| c == '|' || c == '.').filter(|s| !s.is_empty()) {
        current = current.find(NodeKind::from_keyword(segment.trim())?)?;
    }
    Some(current)
}

pub(crate) fn unit_of(node: &Node) -> Option<(String, f64)> {
    Some((node.name()?.to_owned(), node.attr_f64(1)?))
}

pub(crate) fn is_proj4_extension(node: &SrsNode) -> bool {
    match node {
        SrsNode::Known(n) => {
            n.kind == NodeKind::Extension
                && n.name().map(|s| s.eq_ignore_ascii_case("PROJ4")).unwrap_or(false)
        }
        SrsNode::Opaque(_) => false,
    }
}

pub(crate) fn to_degrees(raw: f64, factor: f64) -> f64 {
    if factors_match(factor, DEGREE_TO_RADIAN) {
        raw
    } else {
        raw * factor / DEGREE_TO_RADIAN
    }
}

pub(crate) fn from_degrees(degrees: f64, factor: f64) -> f64 {
    if factors_match(factor, DEGREE_TO_RADIAN) {
        degrees
    } else {
        degrees * DEGREE_TO_RADIAN / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wgs84() -> SpatialReference {
        SpatialReference::from_wkt(crate::authority::defaults::WGS84.definition).unwrap()
    }

    #[test]
    fn empty_reference() {
        let srs = SpatialReference::new();
        assert!(srs.is_empty());
        assert!(!srs.is_geographic());
        assert!(srs.semi_major().is_err());
        assert_eq!(srs.linear_units(), ("metre".to_owned(), 1.0));
    }

    #[test]
    fn set_attr_value_builds_root() {
        let mut srs = SpatialReference::new();
        srs.set_attr_value("LOCAL_CS", "site grid").unwrap();
        assert!(srs.is_local());
        assert_eq!(srs.name(), Some("site grid"));
        assert!(SpatialReference::new()
            .set_attr_value("UNIT", "metre")
            .is_err());
    }

    #[test]
    fn spheroid_values() {
        let srs = wgs84();
        assert_relative_eq!(srs.semi_major().unwrap(), 6378137.0);
        assert_relative_eq!(srs.inverse_flattening().unwrap(), 298.257223563);
        assert_relative_eq!(srs.semi_minor().unwrap(), 6356752.314245, epsilon = 1e-5);
    }

    #[test]
    fn normalized_matches_raw_times_factor() {
        let mut srs = wgs84();
        srs.set_projection("Transverse_Mercator").unwrap();
        srs.set_linear_units("US survey foot", 0.304800609601219).unwrap();
        srs.set_projection_parameter("central_meridian", -117.0).unwrap();
        srs.set_projection_parameter("false_easting", 1640416.667).unwrap();
        srs.set_projection_parameter("scale_factor", 0.9999).unwrap();
        for name in ["central_meridian", "false_easting", "scale_factor"] {
            let raw = srs.projection_parameter(name).unwrap();
            let norm = srs.normalized_projection_parameter(name).unwrap();
            assert!((norm - raw * srs.parameter_factor(name)).abs() < 1e-9);
        }
        srs.set_normalized_projection_parameter("false_northing", 3048.006096012192)
            .unwrap();
        assert_relative_eq!(srs.projection_parameter("false_northing").unwrap(), 10000.0, epsilon = 1e-9);
    }

    #[test]
    fn changing_projection_clears_parameters() {
        let mut srs = wgs84();
        srs.set_projection("Mercator_1SP").unwrap();
        srs.set_projection_parameter("scale_factor", 1.0).unwrap();
        srs.set_projection("mercator_1sp").unwrap();
        assert_eq!(srs.parameters().len(), 1);
        srs.set_projection("Mollweide").unwrap();
        assert!(srs.parameters().is_empty());
        assert_eq!(srs.geog_cs().unwrap().name(), Some("WGS 84"));
    }

    #[test]
    fn towgs84_and_authority() {
        let mut srs = wgs84();
        assert!(srs.towgs84().is_none());
        srs.set_towgs84([1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(srs.towgs84().unwrap()[2], 3.0);
        assert_eq!(srs.authority_code(None).unwrap(), "4326");
        assert_eq!(srs.authority_code(Some("GEOGCS|DATUM")).unwrap(), "6326");
        srs.set_authority(Some("DATUM"), "EPSG", 6000).unwrap();
        assert_eq!(srs.authority_code(Some("DATUM")).unwrap(), "6000");
    }

    #[test]
    fn clone_geog_cs_is_independent() {
        let mut srs = wgs84();
        srs.set_projection("Robinson").unwrap();
        let mut geog = srs.clone_geog_cs().unwrap();
        geog.set_angular_units("grad", 0.0157079632679490).unwrap();
        assert_eq!(srs.angular_units().0, "degree");
        assert!(geog.is_geographic());
    }

    #[test]
    fn vertical_and_compound() {
        let mut srs = wgs84();
        srs.set_vertical_cs("EGM96 geoid height", "EGM96 geoid", 2005)
            .unwrap();
        assert!(srs.is_compound());
        assert!(srs.is_vertical());
        assert!(srs.is_geographic());
        assert_eq!(
            srs.target_linear_units(Some("VERT_CS")),
            ("metre".to_owned(), 1.0)
        );
    }

    #[test]
    fn linear_unit_change_rescales() {
        let mut srs = wgs84();
        srs.set_projection("Transverse_Mercator").unwrap();
        srs.set_projection_parameter("false_easting", 500000.0).unwrap();
        srs.set_linear_units_and_update_parameters("foot", 0.3048).unwrap();
        assert_relative_eq!(
            srs.projection_parameter("false_easting").unwrap(),
            500000.0 / 0.3048,
            epsilon = 1e-6
        );
    }
}
