//! Small fixed-width float vectors used by the grid interpolation kernels.
use std::ops::{Add, Index, Mul, Sub};

/// `a * b + c`, fused when the feature `fma` is enabled.
macro_rules! mul_add {
    ($a:expr, $b:expr, $c:expr) => {
        if cfg!(feature = "fma") {
            f64::mul_add($a, $b, $c)
        } else {
            $a * $b + $c
        }
    };
}

/// `(longitude, latitude)` ordered pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Pair(f64, f64);

pub(crate) type F64x2 = Pair;

macro_rules! f64x2 {
    ($a:expr, $b:expr) => {{
        use crate::vector::Pair;
        Pair::new($a, $b)
    }};
    ($a:expr) => {{
        use crate::vector::Pair;
        Pair::splat($a)
    }};
}

impl Pair {
    #[inline(always)]
    pub(crate) const fn new(a: f64, b: f64) -> Self {
        Self(a, b)
    }

    #[inline(always)]
    pub(crate) const fn splat(a: f64) -> Self {
        Self(a, a)
    }

    #[inline(always)]
    pub(crate) fn fma(self, a: Self, b: Self) -> Self {
        Self(mul_add!(self.0, a.0, b.0), mul_add!(self.1, a.1, b.1))
    }

    #[inline(always)]
    pub(crate) fn abs(self) -> Self {
        Self(self.0.abs(), self.1.abs())
    }

    /// Component-wise `<`, true only if both hold.
    #[inline(always)]
    pub(crate) fn lt(self, other: Self) -> bool {
        self.0.lt(&other.0) && self.1.lt(&other.1)
    }

    #[inline(always)]
    pub(crate) fn is_finite(self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }
}

impl Index<usize> for Pair {
    type Output = f64;

    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.0,
            1 => &self.1,
            _ => unreachable!(),
        }
    }
}

macro_rules! impl_bin_ops {
    ($t:ident::$m:ident) => {
        impl $t for Pair {
            type Output = Self;

            #[inline(always)]
            fn $m(self, rhs: Self) -> Self::Output {
                Self($t::$m(self.0, rhs.0), $t::$m(self.1, rhs.1))
            }
        }
    };
}

impl_bin_ops!(Add::add);
impl_bin_ops!(Sub::sub);
impl_bin_ops!(Mul::mul);

pub(crate) use {f64x2, mul_add};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fma() {
        let actual = f64x2!(2.0, 3.0).fma(f64x2!(4.0), f64x2!(1.0, -1.0));
        assert_eq!(actual, f64x2!(9.0, 11.0));
    }

    #[test]
    fn test_pair_ops() {
        let a = f64x2!(1.0, -2.0);
        assert_eq!(a.abs(), f64x2!(1.0, 2.0));
        assert!(a.abs().lt(f64x2!(2.5)));
        assert!(!a.abs().lt(f64x2!(1.5)));
        assert_eq!(a - f64x2!(1.0), f64x2!(0.0, -3.0));
        assert_eq!(a[1], -2.0);
        assert!(!f64x2!(f64::INFINITY, 0.0).is_finite());
    }
}
