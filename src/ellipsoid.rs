//! Provides [`Ellipsoid`].
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Errno, Error, Result};

/// Reference ellipsoid parameters.
///
/// Every field is derived from the semi-major axis `a`
/// and the eccentricity squared `es`, see [`Ellipsoid::from_a_es`].
///
/// # Example
///
/// ```
/// # use gridtrans::Ellipsoid;
/// #
/// let ellps = Ellipsoid::GRS80;
/// assert_eq!(ellps.a, 6_378_137.0);
/// assert!((ellps.rf - 298.257222101).abs() < 1e-9);
/// assert!((ellps.b - 6_356_752.314140356).abs() < 1e-6);
/// ```
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ellipsoid {
    /// Semi-major axis \[m\]
    pub a: f64,
    /// Semi-minor axis \[m\]
    pub b: f64,
    /// Eccentricity squared
    pub es: f64,
    /// Eccentricity
    pub e: f64,
    /// Flattening
    pub f: f64,
    /// Reverse flattening, [`f64::INFINITY`] for a sphere
    pub rf: f64,
    /// Second eccentricity squared
    pub ep2: f64,
    /// Third flattening
    pub n: f64,
    /// 1 - `es`
    pub one_es: f64,
    /// 1 / `one_es`
    pub rone_es: f64,
    /// 1 / `a`
    pub ra: f64,
}

impl Ellipsoid {
    /// GRS 1980.
    pub const GRS80: Self = Self::from_a_rf_unchecked(6_378_137.0, 298.257_222_101);
    /// WGS 84.
    pub const WGS84: Self = Self::from_a_rf_unchecked(6_378_137.0, 298.257_223_563);
    /// Bessel 1841 (Tokyo Datum).
    pub const BESSEL: Self = Self::from_a_rf_unchecked(6_377_397.155, 299.152_812_8);
    /// Clarke 1866.
    pub const CLARKE66: Self = Self::from_a_b_unchecked(6_378_206.4, 6_356_583.8);
    /// International 1924 (Hayford).
    pub const INTL: Self = Self::from_a_rf_unchecked(6_378_388.0, 297.0);
    /// Normal sphere, r = 6370997 m.
    pub const SPHERE: Self = Self::from_a_es_unchecked(6_370_997.0, 0.0);

    const NAMED: [(&'static str, Self); 6] = [
        ("GRS80", Self::GRS80),
        ("WGS84", Self::WGS84),
        ("bessel", Self::BESSEL),
        ("clrk66", Self::CLARKE66),
        ("intl", Self::INTL),
        ("sphere", Self::SPHERE),
    ];

    /// Makes an [`Ellipsoid`] from `a` and `es`, `pj_calc_ellps_params`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when `a` is not positive
    /// or when `es` does not satisfy 0 <= `es` < 1.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::Ellipsoid;
    /// #
    /// let ellps = Ellipsoid::from_a_es(6_378_137.0, 0.006694380022900787)?;
    /// assert!((ellps.rf - 298.257222101).abs() < 1e-6);
    ///
    /// assert!(Ellipsoid::from_a_es(6_378_137.0, 1.0).is_err());
    /// assert!(Ellipsoid::from_a_es(-1.0, 0.0).is_err());
    /// # Ok::<(), gridtrans::Error>(())
    /// ```
    pub fn from_a_es(a: f64, es: f64) -> Result<Self> {
        if !(a.is_finite() && a > 0.0) {
            return Err(Error::new_invalid_parameter("a", a.to_string()));
        }
        if !(0.0..1.0).contains(&es) {
            return Err(Error::new_invalid_parameter("es", es.to_string()));
        }
        Ok(Self::from_a_es_unchecked(a, es))
    }

    /// Makes an [`Ellipsoid`] from `a` and the reverse flattening `rf`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when `rf` <= 1 or `a` is invalid.
    pub fn from_a_rf(a: f64, rf: f64) -> Result<Self> {
        if !(rf > 1.0) {
            return Err(Error::new_invalid_parameter("rf", rf.to_string()));
        }
        let f = 1.0 / rf;
        Self::from_a_es(a, 2.0 * f - f * f)
    }

    /// Makes an [`Ellipsoid`] from `a` and the flattening `f`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when `f` does not satisfy 0 <= `f` < 1 or `a` is invalid.
    pub fn from_a_f(a: f64, f: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&f) {
            return Err(Error::new_invalid_parameter("f", f.to_string()));
        }
        Self::from_a_es(a, 2.0 * f - f * f)
    }

    /// Makes an [`Ellipsoid`] from the semi-axes `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when `b` does not satisfy 0 < `b` <= `a`.
    pub fn from_a_b(a: f64, b: f64) -> Result<Self> {
        if !(b > 0.0 && b <= a) {
            return Err(Error::new_invalid_parameter("b", b.to_string()));
        }
        Self::from_a_es(a, 1.0 - (b * b) / (a * a))
    }

    /// Returns a named ellipsoid, e.g. `"GRS80"`, `"WGS84"`, `"bessel"`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] of [`Errno::UnknownEllipsoid`] if not known.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::{Ellipsoid, Errno};
    /// #
    /// assert_eq!(Ellipsoid::by_name("WGS84")?, Ellipsoid::WGS84);
    /// assert_eq!(
    ///     Ellipsoid::by_name("mars").unwrap_err().errno(),
    ///     Errno::UnknownEllipsoid
    /// );
    /// # Ok::<(), gridtrans::Error>(())
    /// ```
    pub fn by_name(name: &str) -> Result<Self> {
        Self::NAMED
            .iter()
            .find(|(n, _)| n.eq(&name))
            .map(|(_, e)| *e)
            .ok_or(Error::from(Errno::UnknownEllipsoid))
    }

    /// Returns `true` if this is a sphere.
    #[inline]
    pub fn is_sphere(&self) -> bool {
        self.es == 0.0
    }

    const fn from_a_rf_unchecked(a: f64, rf: f64) -> Self {
        let f = 1.0 / rf;
        Self::from_a_es_unchecked(a, 2.0 * f - f * f)
    }

    const fn from_a_b_unchecked(a: f64, b: f64) -> Self {
        Self::from_a_es_unchecked(a, 1.0 - (b * b) / (a * a))
    }

    const fn from_a_es_unchecked(a: f64, es: f64) -> Self {
        let one_es = 1.0 - es;
        let b = a * sqrt(one_es);
        let f = (a - b) / a;
        let rf = if es == 0.0 { f64::INFINITY } else { 1.0 / f };
        let n = f / (2.0 - f);
        Self {
            a,
            b,
            es,
            e: sqrt(es),
            f,
            rf,
            ep2: es / one_es,
            n,
            one_es,
            rone_es: 1.0 / one_es,
            ra: 1.0 / a,
        }
    }
}

impl Default for Ellipsoid {
    #[inline]
    fn default() -> Self {
        Self::GRS80
    }
}

/// Square root usable in const context, Newton's method.
const fn sqrt(v: f64) -> f64 {
    if v <= 0.0 {
        return 0.0;
    }
    let mut x = if v < 1.0 { 1.0 } else { v };
    let mut i = 0;
    while i < 128 {
        let next = 0.5 * (x + v / x);
        if next == x {
            break;
        }
        x = next;
        i += 1;
    }
    x
}
