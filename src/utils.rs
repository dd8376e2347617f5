//! Provides misc utilities.
use std::f64::consts::{PI, TAU};

/// Seconds of arc to radians.
pub(crate) const SEC_TO_RAD: f64 = PI / 180.0 / 3600.0;

/// Converts degree to radians, `PJ_TORAD`.
///
/// # Example
///
/// ```
/// # use gridtrans::utils::to_radians;
/// assert_eq!(to_radians(0.0), 0.0);
/// assert!((to_radians(180.0) - std::f64::consts::PI).abs() < 1e-15);
/// ```
#[inline]
pub fn to_radians(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Converts radians to degree, `PJ_TODEG`.
///
/// # Example
///
/// ```
/// # use gridtrans::utils::to_degrees;
/// assert_eq!(to_degrees(0.0), 0.0);
/// assert!((to_degrees(std::f64::consts::PI) - 180.0).abs() < 1e-12);
/// ```
#[inline]
pub fn to_degrees(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Returns the normalized longitude into -π <= and <= π.
///
/// # Example
///
/// ```
/// # use std::f64::consts::PI;
/// # use gridtrans::utils::normalize_longitude;
/// assert_eq!(normalize_longitude(1.0), 1.0);
/// assert_eq!(normalize_longitude(PI), PI);
/// assert!((normalize_longitude(1.5 * PI) + 0.5 * PI).abs() < 1e-15);
/// assert!((normalize_longitude(-1.5 * PI) - 0.5 * PI).abs() < 1e-15);
/// assert!(normalize_longitude(f64::NAN).is_nan());
/// assert_eq!(normalize_longitude(f64::INFINITY), f64::INFINITY);
/// ```
pub fn normalize_longitude(t: f64) -> f64 {
    if !t.is_finite() || t.abs() <= PI {
        return t;
    };

    let t = t % TAU;
    let res = if t.lt(&-PI) || t.gt(&PI) {
        t - f64::copysign(TAU, t)
    } else {
        t
    };

    debug_assert!(res.ge(&-PI) && res.le(&PI));

    res
}
