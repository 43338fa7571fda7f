//! Coordinate reference system definitions.
//!
//! A [`SpatialReference`] holds one definition as a node tree. It can be read from
//! and written to WKT, PROJ.4, ESRI `.prj`, USGS GCTP, PCI, GML, MapInfo and
//! ERMapper forms, compared semantically, edited through the unit and parameter
//! setters and handed to a [`CoordinateTransform`].
//!
//! ```ignore
//! use osr::SpatialReference;
//! let srs = SpatialReference::from_user_input("EPSG:32633")?;
//! assert_eq!(srs.utm_zone(), Some((33, true)));
//! println!("{}", srs.to_proj4()?);
//! ```
pub mod authority;
mod compare;
pub mod datums;
pub mod erm;
pub mod esri;
pub mod gpkg;
mod mapinfo;
pub mod pci;
mod proj4;
mod projections;
pub mod result;
pub mod shared;
pub mod srs;
pub mod transform;
pub mod user_input;
pub mod usgs;
pub mod validate;
pub mod wkt;
pub mod xml;

pub use authority::{AuthorityTable, BuiltinAuthority, SpatialRefSys};
pub use erm::ErmDefinition;
pub use gpkg::GpkgAuthority;
pub use pci::PciDefinition;
pub use result::{Error, ErrorKind, Result};
pub use shared::SharedSrs;
pub use srs::SpatialReference;
pub use transform::{CoordinateTransform, ProjectionEngine, Step, TransformOptions};
pub use usgs::UsgsDefinition;
pub use validate::{Finding, Severity, ValidationReport};
pub use wkt::WktOptions;
pub use xml::UrlFetcher;

#[doc(inline)]
pub use osr_core::{
    catalog, parameter_info, parameter_list, projection_methods, unit_factor, units, Node,
    NodeKind, Strictness, UnitKind, Value,
};
