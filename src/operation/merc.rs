//! Ellipsoidal Mercator on the unit ellipsoid.
use std::f64::consts::FRAC_PI_2;

use crate::operation::{Operation, Setup};
use crate::{Context, Coord, Errno, IoUnits, Result};

const TOLERANCE: f64 = 1e-10;
const MAX_ITERATION: usize = 15;

#[derive(Debug)]
struct Mercator {
    e: f64,
    k0: f64,
}

/// Isometric colatitude function, `tan(π/4 - φ/2) / ((1 - e sinφ) / (1 + e sinφ))^(e/2)`.
#[inline]
fn tsfn(phi: f64, e: f64) -> f64 {
    let con = e * phi.sin();
    (0.5 * (FRAC_PI_2 - phi)).tan() / ((1.0 - con) / (1.0 + con)).powf(0.5 * e)
}

/// Inverse of [`tsfn`], fixed-point iteration.
fn phi_from_ts(ts: f64, e: f64) -> std::result::Result<f64, Errno> {
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..MAX_ITERATION {
        let con = e * phi.sin();
        let delta =
            FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(0.5 * e)).atan() - phi;
        phi += delta;
        if delta.abs() < TOLERANCE {
            return Ok(phi);
        }
    }
    Err(Errno::NonConvergent)
}

/// Scale factor of the parallel `phi`.
#[inline]
fn msfn(phi: f64, es: f64) -> f64 {
    let (sin_phi, cos_phi) = phi.sin_cos();
    cos_phi / (1.0 - es * sin_phi * sin_phi).sqrt()
}

impl Operation for Mercator {
    fn left(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn right(&self) -> IoUnits {
        IoUnits::Classic
    }

    fn forward(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        let phi = coord.lat();
        if (phi.abs() - FRAC_PI_2).abs() <= TOLERANCE {
            return Err(Errno::ToleranceCondition);
        }

        coord[0] *= self.k0;
        coord[1] = -self.k0 * tsfn(phi, self.e).ln();
        Ok(coord)
    }

    fn inverse(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        let phi = phi_from_ts((-coord.y() / self.k0).exp(), self.e)?;
        coord[0] /= self.k0;
        coord[1] = phi;
        Ok(coord)
    }
}

/// `lat_ts`, the latitude of true scale, overrides `k_0`.
pub(super) fn merc(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    if let Some(lat_ts) = setup.params.get_radians("lat_ts")? {
        if lat_ts.abs() >= FRAC_PI_2 {
            return Err(crate::Error::new_invalid_parameter(
                "lat_ts",
                crate::utils::to_degrees(lat_ts).to_string(),
            ));
        }
        setup.k0 = msfn(lat_ts, setup.ellps.es);
    }

    Ok(Box::new(Mercator {
        e: setup.ellps.e,
        k0: setup.k0,
    }))
}
