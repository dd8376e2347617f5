//! Provides [`Operation`], the pluggable coordinate operations, and [`OperationRegistry`].
//!
//! An operation works on internal units only:
//! the dispatch of [`Pj`](crate::Pj) converts the user units in and out
//! of each side according to [`Operation::left`] and [`Operation::right`].
//!
//! # Example
//!
//! ```
//! use gridtrans::operation::{Operation, OperationRegistry, Setup};
//! use gridtrans::{Context, Coord, Errno, IoUnits, ParamList, Pj, Result};
//!
//! /// Doubles the height.
//! #[derive(Debug)]
//! struct Double;
//!
//! impl Operation for Double {
//!     fn left(&self) -> IoUnits {
//!         IoUnits::Radians
//!     }
//!     fn right(&self) -> IoUnits {
//!         IoUnits::Radians
//!     }
//!     fn forward(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
//!         coord[2] *= 2.0;
//!         Ok(coord)
//!     }
//!     fn inverse(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
//!         coord[2] /= 2.0;
//!         Ok(coord)
//!     }
//! }
//!
//! fn double(_: &mut Setup) -> Result<Box<dyn Operation>> {
//!     Ok(Box::new(Double))
//! }
//!
//! let mut registry = OperationRegistry::builtin();
//! registry.register("double", double);
//!
//! let ctx = Context::new();
//! let pj = Pj::with_registry(&ctx, &ParamList::new().set("proj", "double"), &registry)?;
//!
//! let actual = pj.forward(Coord::new(0.1, 0.2, 3.0, 0.0))?;
//! assert_eq!(actual.z(), 6.0);
//! # Ok::<(), gridtrans::Error>(())
//! ```
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::OnceLock;

use crate::{Context, Coord, Ellipsoid, Errno, IoUnits, ParamList, Result};

mod cart;
mod gridshift;
mod longlat;
mod merc;
mod pipeline;
mod tmerc;

/// A coordinate operation, the forward and inverse evaluations.
///
/// The geodetic side (left) and the projected side (right)
/// declare the internal unit system the operation works in.
pub trait Operation: Send + Sync + Debug {
    /// The unit system of the geodetic side.
    fn left(&self) -> IoUnits;

    /// The unit system of the projected side.
    fn right(&self) -> IoUnits;

    /// Evaluates from the left to the right.
    fn forward(&self, ctx: &Context, coord: Coord) -> std::result::Result<Coord, Errno>;

    /// Evaluates from the right to the left.
    fn inverse(&self, ctx: &Context, coord: Coord) -> std::result::Result<Coord, Errno>;

    /// Returns `false` if [`Operation::inverse`] is not available.
    fn has_inverse(&self) -> bool {
        true
    }

    /// Returns `true` if the operation takes the user units as is,
    /// the dispatch then skips the unit conversions.
    fn skips_unit_conversion(&self) -> bool {
        false
    }

    /// Re-associates the objects the operation holds to `ctx`,
    /// called by [`Pj::set_context`](crate::Pj::set_context).
    fn set_context(&mut self, _ctx: &Context) {}
}

/// The common definition values handed to a [`Constructor`].
///
/// A constructor may update the numeric fields,
/// e.g. `utm` sets the central meridian from the zone,
/// the transformation object uses them after construction.
#[derive(Debug)]
pub struct Setup<'a> {
    /// The context the object is made under
    pub ctx: &'a Context,
    /// The whole definition
    pub params: &'a ParamList,
    /// The registry the object is made from
    pub registry: &'a OperationRegistry,
    /// The ellipsoid
    pub ellps: Ellipsoid,
    /// The central meridian \[rad\]
    pub lam0: f64,
    /// The latitude of origin \[rad\]
    pub phi0: f64,
    /// The scale factor
    pub k0: f64,
    /// The false easting \[m\]
    pub x0: f64,
    /// The false northing \[m\]
    pub y0: f64,
}

/// Makes an [`Operation`] from a [`Setup`].
pub type Constructor = fn(&mut Setup) -> Result<Box<dyn Operation>>;

/// The map from operation names to constructors.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    constructors: HashMap<String, Constructor>,
}

impl OperationRegistry {
    /// Makes an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a registry with the built-in operations,
    /// `longlat`, `latlong`, `noop`, `tmerc`, `utm`, `merc`, `cart`,
    /// `hgridshift`, `gridshift`, `vgridshift` and `pipeline`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("longlat", longlat::longlat);
        registry.register("latlong", longlat::longlat);
        registry.register("noop", longlat::noop);
        registry.register("tmerc", tmerc::tmerc);
        registry.register("utm", tmerc::utm);
        registry.register("merc", merc::merc);
        registry.register("cart", cart::cart);
        registry.register("hgridshift", gridshift::hgridshift);
        registry.register("gridshift", gridshift::hgridshift);
        registry.register("vgridshift", gridshift::vgridshift);
        registry.register("pipeline", pipeline::pipeline);
        registry
    }

    /// Returns the shared built-in registry.
    pub(crate) fn shared() -> &'static Self {
        static BUILTIN: OnceLock<OperationRegistry> = OnceLock::new();
        BUILTIN.get_or_init(Self::builtin)
    }

    /// Adds `constructor` by `name`, returns the one replaced.
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) -> Option<Constructor> {
        self.constructors.insert(name.into(), constructor)
    }

    /// Returns the constructor of `name`.
    pub fn get(&self, name: &str) -> Option<Constructor> {
        self.constructors.get(name).copied()
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Returns an iterator over the registered names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}
