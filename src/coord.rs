//! Provides [`Coord`], [`Lp`], [`Direction`] and [`IoUnits`].
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A four-dimensional coordinate, `(c0, c1, height, time)`.
///
/// The meaning of `c0` and `c1` depends on the [`IoUnits`] of the side
/// where it is used: longitude and latitude in radians,
/// easting and northing, or geocentric X and Y.
///
/// # Example
///
/// ```
/// # use gridtrans::Coord;
/// #
/// let coord = Coord::new(1.0, 2.0, 3.0, 4.0);
/// assert_eq!(coord.v, [1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(coord[2], 3.0);
///
/// assert!(Coord::error().is_error());
/// assert!(!coord.is_error());
/// ```
#[derive(Debug, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coord {
    /// The components
    pub v: [f64; 4],
}

impl Coord {
    /// The value every component of the error sentinel takes.
    pub const ERROR_VALUE: f64 = f64::INFINITY;

    /// Makes a [`Coord`].
    #[inline]
    pub const fn new(c0: f64, c1: f64, height: f64, time: f64) -> Self {
        Self {
            v: [c0, c1, height, time],
        }
    }

    /// Makes a [`Coord`] from a horizontal pair, height and time are 0.0.
    #[inline]
    pub const fn xy(c0: f64, c1: f64) -> Self {
        Self::new(c0, c1, 0.0, 0.0)
    }

    /// Makes a [`Coord`] from longitude and latitude given in degree.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::Coord;
    /// #
    /// let coord = Coord::from_degrees(180.0, 90.0, 10.0, 0.0);
    /// assert!((coord.lon() - std::f64::consts::PI).abs() < 1e-15);
    /// assert!((coord.lat() - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
    /// assert_eq!(coord.z(), 10.0);
    /// ```
    #[inline]
    pub fn from_degrees(lon: f64, lat: f64, height: f64, time: f64) -> Self {
        Self::new(lon.to_radians(), lat.to_radians(), height, time)
    }

    /// Returns the error sentinel, every component is [`Coord::ERROR_VALUE`].
    ///
    /// Any valid coordinate in any unit system is finite, hence distinguishable.
    #[inline]
    pub const fn error() -> Self {
        Self {
            v: [Self::ERROR_VALUE; 4],
        }
    }

    /// Returns `true` if this is the error sentinel.
    ///
    /// It tests the first component only, as the dispatch does.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.v[0] == Self::ERROR_VALUE
    }

    /// The first component, longitude.
    #[inline]
    pub const fn lon(&self) -> f64 {
        self.v[0]
    }

    /// The second component, latitude.
    #[inline]
    pub const fn lat(&self) -> f64 {
        self.v[1]
    }

    /// The first component, easting or X.
    #[inline]
    pub const fn x(&self) -> f64 {
        self.v[0]
    }

    /// The second component, northing or Y.
    #[inline]
    pub const fn y(&self) -> f64 {
        self.v[1]
    }

    /// The third component, height.
    #[inline]
    pub const fn z(&self) -> f64 {
        self.v[2]
    }

    /// The fourth component, time.
    #[inline]
    pub const fn t(&self) -> f64 {
        self.v[3]
    }

    /// Returns the horizontal part.
    #[inline]
    pub const fn lp(&self) -> Lp {
        Lp::new(self.v[0], self.v[1])
    }

    /// Returns a copy whose horizontal part is replaced.
    #[inline]
    pub fn with_lp(mut self, lp: Lp) -> Self {
        self.v[0] = lp.lam;
        self.v[1] = lp.phi;
        self
    }

    /// Returns a copy whose longitude and latitude are converted to degree.
    #[inline]
    pub fn to_degrees(mut self) -> Self {
        self.v[0] = self.v[0].to_degrees();
        self.v[1] = self.v[1].to_degrees();
        self
    }
}

impl From<[f64; 4]> for Coord {
    #[inline]
    fn from(value: [f64; 4]) -> Self {
        Self { v: value }
    }
}

impl From<(f64, f64)> for Coord {
    /// see [`Coord::xy()`]
    #[inline]
    fn from(value: (f64, f64)) -> Self {
        Self::xy(value.0, value.1)
    }
}

impl From<(f64, f64, f64, f64)> for Coord {
    #[inline]
    fn from(value: (f64, f64, f64, f64)) -> Self {
        Self::new(value.0, value.1, value.2, value.3)
    }
}

impl Index<usize> for Coord {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.v[index]
    }
}

impl IndexMut<usize> for Coord {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.v[index]
    }
}

/// A geographic position, longitude `lam` and latitude `phi`, in radians.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Lp {
    /// The longitude \[rad\]
    pub lam: f64,
    /// The latitude \[rad\]
    pub phi: f64,
}

impl Lp {
    /// Makes a [`Lp`].
    #[inline]
    pub const fn new(lam: f64, phi: f64) -> Self {
        Self { lam, phi }
    }

    /// Makes a [`Lp`] from degree.
    #[inline]
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self::new(lon.to_radians(), lat.to_radians())
    }

    /// Returns the error sentinel.
    #[inline]
    pub const fn error() -> Self {
        Self::new(Coord::ERROR_VALUE, Coord::ERROR_VALUE)
    }

    /// Returns `true` if this is the error sentinel.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.lam == Coord::ERROR_VALUE
    }
}

/// The direction of a transformation call.
///
/// This is an argument of each call, not a state of a transformation object.
///
/// # Example
///
/// ```
/// # use gridtrans::Direction;
/// #
/// assert_eq!(Direction::Forward.flip(), Direction::Inverse);
/// assert_eq!(Direction::Inverse.flip(), Direction::Forward);
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    Forward,
    Inverse,
}

impl Direction {
    /// Returns the opposite direction.
    #[inline]
    pub const fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Returns the opposite direction if `inverted`.
    #[inline]
    pub const fn flip_if(self, inverted: bool) -> Self {
        if inverted {
            self.flip()
        } else {
            self
        }
    }
}

/// The unit system of one side of a transformation object.
///
/// The left side is the geodetic side, the right side is the projected side.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IoUnits {
    /// Linear user units (see `to_meter`), computed on a unit ellipsoid
    Classic,
    /// Meters
    Meters,
    /// Radians
    Radians,
}

impl IoUnits {
    /// Returns `true` if angular.
    #[inline]
    pub const fn is_angular(&self) -> bool {
        matches!(self, Self::Radians)
    }
}
