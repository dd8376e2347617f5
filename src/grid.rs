//! Provides correction grids, [`Grid`], and grid lists, [`GridList`].
//!
//! A [`Grid`] is a regular lattice of correction nodes
//! holding a horizontal shift (radians), a vertical offset (meters) or both.
//! Grids are loaded by a [`GridCache`] and shared through [`Arc`](std::sync::Arc).
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Read};
use std::path::PathBuf;

use crate::vector::{f64x2, mul_add, F64x2};
use crate::{Errno, FileApi, Lp};

pub use cache::GridCache;
pub use par::{Column, ParFormat, ParseParError, ParseParErrorKind};
pub(crate) use set::GridSet;

mod cache;
mod ctable2;
mod gtx;
pub mod par;
mod set;

/// The tolerance of the Newton iteration of the inverse shift \[rad\].
const INVERSE_TOLERANCE: f64 = 1e-12;
/// The maximum iterations of the Newton iteration of the inverse shift.
const INVERSE_MAX_ITERATION: usize = 10;
/// Points this close outside of a lattice are still taken inside, in cell units.
const EDGE_TOLERANCE: f64 = 1e-9;

/// The kind of correction a [`Grid`] carries.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum GridKind {
    /// Horizontal shift only
    Horizontal,
    /// Vertical offset only
    Vertical,
    /// Both horizontal shift and vertical offset
    Both,
}

impl GridKind {
    /// Returns `true` if the grid carries a horizontal shift.
    #[inline]
    pub const fn has_horizontal(&self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }

    /// Returns `true` if the grid carries a vertical offset.
    #[inline]
    pub const fn has_vertical(&self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }
}

/// The bounding box of a grid, in radians.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Extent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Extent {
    /// Returns `true` if `lp` is inside, boundary included.
    #[inline]
    pub fn contains(&self, lp: &Lp) -> bool {
        self.west <= lp.lam && lp.lam <= self.east && self.south <= lp.phi && lp.phi <= self.north
    }
}

/// A regular lattice, the node `(col, row)` is at
/// `(west + col * dlam, south + row * dphi)`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Lattice {
    /// The longitude of the south-west node \[rad\]
    pub west: f64,
    /// The latitude of the south-west node \[rad\]
    pub south: f64,
    /// The spacing of longitude \[rad\]
    pub dlam: f64,
    /// The spacing of latitude \[rad\]
    pub dphi: f64,
    /// The number of nodes along longitude
    pub cols: usize,
    /// The number of nodes along latitude
    pub rows: usize,
}

impl Lattice {
    /// Returns the extent.
    #[inline]
    pub fn extent(&self) -> Extent {
        Extent {
            west: self.west,
            south: self.south,
            east: mul_add!(self.dlam, (self.cols - 1) as f64, self.west),
            north: mul_add!(self.dphi, (self.rows - 1) as f64, self.south),
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.cols < 2 || self.rows < 2 {
            return Err("grid must have at least 2x2 nodes");
        }
        if !(self.dlam.is_finite() && self.dlam > 0.0 && self.dphi.is_finite() && self.dphi > 0.0)
        {
            return Err("grid spacing must be positive");
        }
        if !(self.west.is_finite() && self.south.is_finite()) {
            return Err("grid origin must be finite");
        }
        Ok(())
    }

    /// Returns the cell contains `lp`, `(col, row, x, y)`
    /// where `x` and `y` are the position in the cell, 0 to 1.
    fn locate(&self, lp: &Lp) -> Option<Cell> {
        fn axis(t: f64, n: usize) -> Option<(usize, f64)> {
            let last = (n - 1) as f64;
            if !(-EDGE_TOLERANCE..=last + EDGE_TOLERANCE).contains(&t) {
                return None;
            }
            let t = t.clamp(0.0, last);
            let i = (t.floor() as usize).min(n - 2);
            Some((i, t - i as f64))
        }

        let (col, x) = axis((lp.lam - self.west) / self.dlam, self.cols)?;
        let (row, y) = axis((lp.phi - self.south) / self.dphi, self.rows)?;
        Some(Cell { col, row, x, y })
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    col: usize,
    row: usize,
    x: f64,
    y: f64,
}

/// The correction at a node.
///
/// `lam` and `phi` are in radians, `z` in meters.
/// A component the grid does not carry is 0.0, a missing node component is NaN.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub(crate) struct Shift {
    pub(crate) lam: f64,
    pub(crate) phi: f64,
    pub(crate) z: f64,
}

impl Shift {
    pub(crate) const MISSING: Self = Self {
        lam: f64::NAN,
        phi: f64::NAN,
        z: f64::NAN,
    };

    #[inline]
    pub(crate) const fn horizontal(lam: f64, phi: f64) -> Self {
        Self { lam, phi, z: 0.0 }
    }

    #[inline]
    pub(crate) const fn vertical(z: f64) -> Self {
        Self {
            lam: 0.0,
            phi: 0.0,
            z,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Nodes {
    /// Row-major, south to north and west to east
    Dense(Vec<Shift>),
    /// Keyed by `(col, row)`
    Sparse(HashMap<(usize, usize), Shift>),
}

/// A loaded correction grid.
///
/// # Example
///
/// ```
/// # use gridtrans::grid::{Grid, GridKind, ParFormat};
/// # use gridtrans::Lp;
/// #
/// // SemiDynaEXE like parameter around 36.1°N, 140.08°E
/// let text = "\n".repeat(15)
///     + "MeshCode dB(sec)  dL(sec) dH(m)
/// 54401005  -0.00622   0.01516    0.0946
/// 54401055  -0.00620   0.01529   0.08972
/// 54401100  -0.00663   0.01492   0.10374
/// 54401150  -0.00664   0.01506   0.10087";
/// let grid = Grid::from_par(&text, ParFormat::SemiDynaEXE)?;
/// assert_eq!(grid.kind(), GridKind::Both);
///
/// let lp = Lp::from_degrees(140.087855041, 36.10377479);
/// let shift = grid.hvalue(&lp).unwrap();
/// assert!((shift.phi.to_degrees() * 3600.0 - -0.0063828).abs() < 1e-6);
/// assert!((grid.vvalue(&lp).unwrap() - 0.0963138578103).abs() < 1e-9);
///
/// // outside
/// assert_eq!(grid.hvalue(&Lp::from_degrees(135.0, 35.0)), None);
/// # Ok::<(), gridtrans::grid::ParseParError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    kind: GridKind,
    lattice: Lattice,
    nodes: Nodes,
}

impl Grid {
    pub(crate) fn new(
        kind: GridKind,
        lattice: Lattice,
        nodes: Nodes,
    ) -> Result<Self, &'static str> {
        lattice.validate()?;
        if let Nodes::Dense(ref v) = nodes {
            if v.len() != lattice.cols * lattice.rows {
                return Err("node count does not match the lattice");
            }
        }
        Ok(Self {
            kind,
            lattice,
            nodes,
        })
    }

    /// Reads a grid from `reader`, detecting its format.
    ///
    /// The format is GTX when `name` has `.gtx` extension,
    /// CTable2 when the content starts with `CTABLE V2`,
    /// otherwise the par text format detected by [`ParFormat::detect`].
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when fails to read or the content is invalid.
    pub fn from_reader(name: &str, mut reader: impl Read) -> Result<Self, LoadGridError> {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| LoadGridError::new(name, LoadGridErrorKind::Io(e)))?;

        let format = |msg: &'static str| LoadGridError::new(name, LoadGridErrorKind::Format(msg));

        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".gtx") {
            gtx::parse(&buf).map_err(format)
        } else if buf.starts_with(ctable2::MAGIC) {
            ctable2::parse(&buf).map_err(format)
        } else {
            let text = std::str::from_utf8(&buf).map_err(|_| format("par file is not UTF-8"))?;
            let par = ParFormat::detect(text).ok_or(format("unknown par file header"))?;
            Self::from_par(text, par)
                .map_err(|e| LoadGridError::new(name, LoadGridErrorKind::ParsePar(e)))
        }
    }

    /// Parses a par-formatted text with explicit `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the invalid data found.
    #[inline]
    pub fn from_par(s: &str, format: ParFormat) -> Result<Self, ParseParError> {
        par::parse(s, format)
    }

    /// Returns the kind.
    #[inline]
    pub const fn kind(&self) -> GridKind {
        self.kind
    }

    /// Returns the lattice.
    #[inline]
    pub const fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Returns the extent.
    #[inline]
    pub fn extent(&self) -> Extent {
        self.lattice.extent()
    }

    #[inline]
    fn node(&self, col: usize, row: usize) -> Option<&Shift> {
        match &self.nodes {
            Nodes::Dense(v) => v.get(row * self.lattice.cols + col),
            Nodes::Sparse(m) => m.get(&(col, row)),
        }
    }

    fn interpol(&self, lp: &Lp) -> Option<(Interpol, Cell)> {
        let cell = self.lattice.locate(lp)?;
        let interpol = Interpol {
            sw: *self.node(cell.col, cell.row)?,
            se: *self.node(cell.col + 1, cell.row)?,
            nw: *self.node(cell.col, cell.row + 1)?,
            ne: *self.node(cell.col + 1, cell.row + 1)?,
        };
        Some((interpol, cell))
    }

    /// Returns the interpolated horizontal shift at `lp`, radians.
    ///
    /// Returns [`None`] when `lp` is outside,
    /// when any corner of the cell has no data,
    /// or when the grid carries no horizontal shift.
    pub fn hvalue(&self, lp: &Lp) -> Option<Lp> {
        if !self.kind.has_horizontal() {
            return None;
        }
        let (interpol, cell) = self.interpol(lp)?;
        let v = interpol.horizontal(cell.x, cell.y);
        v.is_finite().then(|| Lp::new(v[0], v[1]))
    }

    /// Returns the interpolated vertical offset at `lp`, meters.
    ///
    /// Returns [`None`] on the same conditions as [`Grid::hvalue`].
    pub fn vvalue(&self, lp: &Lp) -> Option<f64> {
        if !self.kind.has_vertical() {
            return None;
        }
        let (interpol, cell) = self.interpol(lp)?;
        let v = interpol.vertical(cell.x, cell.y);
        v.is_finite().then_some(v)
    }

    /// Returns the position `z` satisfying `p = z + s(z)`,
    /// where `s` is the horizontal shift, by Newton's method.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] of [`Errno::PointOutsideGrid`] when the iteration leaves the grid,
    /// and of [`Errno::NonConvergent`] when it does not converge.
    pub fn hinverse(&self, p: &Lp) -> Result<Lp, Errno> {
        let target = f64x2!(p.lam, p.phi);
        let scale = f64x2!(1. / self.lattice.dlam, 1. / self.lattice.dphi);

        let start = self.hvalue(p).ok_or(Errno::PointOutsideGrid)?;
        let mut zn = target - f64x2!(start.lam, start.phi);

        for _ in 0..INVERSE_MAX_ITERATION {
            let current = Lp::new(zn[0], zn[1]);
            let (interpol, cell) = self.interpol(&current).ok_or(Errno::PointOutsideGrid)?;

            let shift = interpol.horizontal(cell.x, cell.y);
            if !shift.is_finite() {
                return Err(Errno::PointOutsideGrid);
            }
            let fz = zn + shift - target;

            // Jacobian of z + s(z), columns d/dlam and d/dphi
            let (dx, dy) = interpol.gradient(cell.x, cell.y);
            let jx = dx * f64x2!(scale[0]) + f64x2!(1., 0.);
            let jy = dy * f64x2!(scale[1]) + f64x2!(0., 1.);

            let det = mul_add!(jx[0], jy[1], -(jy[0] * jx[1]));
            if det == 0.0 || !det.is_finite() {
                return Err(Errno::NonConvergent);
            }

            let delta = f64x2!(
                mul_add!(jy[1], fz[0], -(jy[0] * fz[1])),
                mul_add!(jx[0], fz[1], -(jx[1] * fz[0]))
            ) * f64x2!(1. / det);
            zn = zn - delta;

            if delta.abs().lt(f64x2!(INVERSE_TOLERANCE)) {
                return Ok(Lp::new(zn[0], zn[1]));
            }
        }

        Err(Errno::NonConvergent)
    }
}

/// The four corners of a cell.
struct Interpol {
    sw: Shift,
    se: Shift,
    nw: Shift,
    ne: Shift,
}

impl Interpol {
    #[inline(always)]
    fn horizontal(&self, x: f64, y: f64) -> F64x2 {
        macro_rules! take {
            ($corner:ident) => {
                f64x2!(self.$corner.lam, self.$corner.phi)
            };
        }

        let (dx, dy) = (1. - x, 1. - y);
        let (xy, xdy, dxy, dxdy) = (x * y, x * dy, dx * y, dx * dy);

        let temp = take!(sw) * f64x2!(dxdy);
        let temp = take!(se).fma(f64x2!(xdy), temp);
        let temp = take!(nw).fma(f64x2!(dxy), temp);
        take!(ne).fma(f64x2!(xy), temp)
    }

    #[inline(always)]
    fn vertical(&self, x: f64, y: f64) -> f64 {
        let (dx, dy) = (1. - x, 1. - y);

        let temp = self.sw.z * dx * dy;
        let temp = mul_add!(self.se.z, x * dy, temp);
        let temp = mul_add!(self.nw.z, dx * y, temp);
        mul_add!(self.ne.z, x * y, temp)
    }

    /// Partial derivatives of the horizontal shift in cell units, `(d/dx, d/dy)`.
    #[inline(always)]
    fn gradient(&self, x: f64, y: f64) -> (F64x2, F64x2) {
        macro_rules! take {
            ($corner:ident) => {
                f64x2!(self.$corner.lam, self.$corner.phi)
            };
        }

        let dx = (take!(se) - take!(sw)).fma(f64x2!(1. - y), (take!(ne) - take!(nw)) * f64x2!(y));
        let dy = (take!(nw) - take!(sw)).fma(f64x2!(1. - x), (take!(ne) - take!(se)) * f64x2!(x));
        (dx, dy)
    }
}

/// Resolves `name` and loads the grid, returns the opened path.
pub(crate) fn load(
    name: &str,
    search_path: &[String],
    file_api: &dyn FileApi,
) -> Result<(PathBuf, Grid), LoadGridError> {
    let (path, reader) = cache::open(name, search_path, file_api)?;
    Grid::from_reader(name, reader).map(|grid| (path, grid))
}

//
// Grid list
//

/// A name of a grid list entry.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct GridName {
    /// The canonical name, trimmed and without `@`
    pub name: String,
    /// `true` if the name is prefixed by `@`
    pub optional: bool,
}

/// A comma-separated list of grid names,
/// a name prefixed by `@` is optional.
///
/// # Example
///
/// ```
/// # use gridtrans::grid::GridList;
/// #
/// let list = GridList::parse("@null.gtx, egm96_15.gtx");
/// assert_eq!(list.len(), 2);
///
/// assert_eq!(list[0].name, "null.gtx");
/// assert!(list[0].optional);
/// assert_eq!(list[1].name, "egm96_15.gtx");
/// assert!(!list[1].optional);
///
/// assert!(!list.all_optional());
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct GridList(Vec<GridName>);

impl GridList {
    /// Parses a comma-separated list, empty entries are skipped.
    pub fn parse(s: &str) -> Self {
        Self(
            s.split(',')
                .filter_map(|entry| {
                    let entry = entry.trim();
                    let (optional, name) = match entry.strip_prefix('@') {
                        Some(rest) => (true, rest.trim()),
                        None => (false, entry),
                    };
                    (!name.is_empty()).then(|| GridName {
                        name: name.to_string(),
                        optional,
                    })
                })
                .collect(),
        )
    }

    /// Returns `true` if every entry is optional, or no entry.
    #[inline]
    pub fn all_optional(&self) -> bool {
        self.0.iter().all(|g| g.optional)
    }
}

impl std::ops::Deref for GridList {
    type Target = [GridName];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

//
// Error
//

/// An error which can be returned on loading a grid.
#[derive(Debug)]
pub struct LoadGridError {
    kind: LoadGridErrorKind,
    /// The grid name
    pub name: String,
}

/// An error kind of [`LoadGridError`].
#[derive(Debug)]
pub enum LoadGridErrorKind {
    /// No candidate of the name resolution exists.
    NotFound,
    /// The load by another requester failed.
    Unavailable,
    Io(io::Error),
    ParsePar(ParseParError),
    /// Malformed binary grid.
    Format(&'static str),
}

impl LoadGridError {
    #[cold]
    pub(crate) fn new(name: &str, kind: LoadGridErrorKind) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }

    /// Returns the detailed cause.
    pub const fn kind(&self) -> &LoadGridErrorKind {
        &self.kind
    }
}

impl Error for LoadGridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            LoadGridErrorKind::Io(e) => Some(e),
            LoadGridErrorKind::ParsePar(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for LoadGridError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.kind {
            LoadGridErrorKind::NotFound => write!(f, "grid not found: {}", self.name),
            LoadGridErrorKind::Unavailable => write!(f, "grid unavailable: {}", self.name),
            LoadGridErrorKind::Io(e) => write!(f, "failed to read grid {}: {e}", self.name),
            LoadGridErrorKind::ParsePar(e) => write!(f, "invalid grid {}: {e}", self.name),
            LoadGridErrorKind::Format(msg) => write!(f, "invalid grid {}: {msg}", self.name),
        }
    }
}
