//! Transverse Mercator, Krüger n-series of 6th order.
//!
//! It works on the unit ellipsoid, the dispatch scales by `a`.
use std::f64::consts::FRAC_PI_2;

use crate::operation::{Operation, Setup};
use crate::{Context, Coord, Ellipsoid, Errno, Error, IoUnits, Result};

const MAX_ITERATION: usize = 15;

/// Beyond this `eta` the series has no useful accuracy.
const ETA_LIMIT: f64 = 2.623_395_162_778;

#[derive(Debug)]
struct TransverseMercator {
    e: f64,
    es: f64,
    k0: f64,
    // A / a, the rectifying radius on the unit ellipsoid
    a_hat: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    // rectifying latitude of the origin
    m0: f64,
}

impl TransverseMercator {
    fn new(ellps: &Ellipsoid, phi0: f64, k0: f64) -> Self {
        let n = ellps.n;
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
                + 7891.0 / 37800.0 * n6,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                - 1983433.0 / 1935360.0 * n6,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5
                + 167603.0 / 181440.0 * n6,
            49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5 + 6601661.0 / 7257600.0 * n6,
            34729.0 / 80640.0 * n5 - 3418889.0 / 1995840.0 * n6,
            212378941.0 / 319334400.0 * n6,
        ];
        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1118711.0 / 3870720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
            4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
            20648693.0 / 638668800.0 * n6,
        ];

        Self {
            e: ellps.e,
            es: ellps.es,
            k0,
            a_hat: (1.0 + n2 / 4.0 + n4 / 64.0) / (1.0 + n),
            alpha,
            beta,
            m0: rectifying_latitude(phi0, n),
        }
    }

    /// Geodetic tangent to conformal tangent.
    fn conformal(&self, tau: f64) -> f64 {
        let tau1 = tau.hypot(1.0);
        let sigma = (self.e * (self.e * tau / tau1).atanh()).sinh();
        tau * sigma.hypot(1.0) - sigma * tau1
    }

    /// Conformal tangent to geodetic tangent, Newton's method.
    fn geodetic(&self, tau_prime: f64) -> std::result::Result<f64, Errno> {
        let mut tau = tau_prime;
        for _ in 0..MAX_ITERATION {
            let tau1 = tau.hypot(1.0);
            let estimate = self.conformal(tau);
            let delta = (tau_prime - estimate) * (1.0 + (1.0 - self.es) * tau * tau)
                / ((1.0 - self.es) * tau1 * estimate.hypot(1.0));
            tau += delta;
            if delta.abs() < 1e-12 * tau.abs().max(1.0) {
                return Ok(tau);
            }
        }
        Err(Errno::NonConvergent)
    }
}

/// Rectifying latitude of `phi`, the meridional arc divided by the rectifying radius.
fn rectifying_latitude(phi: f64, n: f64) -> f64 {
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n3 * n;

    let a2 = -3.0 / 2.0 * n + 9.0 / 16.0 * n3;
    let a4 = 15.0 / 16.0 * n2 - 15.0 / 32.0 * n4;
    let a6 = -35.0 / 48.0 * n3;
    let a8 = 315.0 / 512.0 * n4;

    phi + a2 * (2.0 * phi).sin()
        + a4 * (4.0 * phi).sin()
        + a6 * (6.0 * phi).sin()
        + a8 * (8.0 * phi).sin()
}

impl Operation for TransverseMercator {
    fn left(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn right(&self) -> IoUnits {
        IoUnits::Classic
    }

    fn forward(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        let (lam, phi) = (coord.lon(), coord.lat());
        if lam.abs() > FRAC_PI_2 {
            return Err(Errno::LatOrLonExceedLimit);
        }

        let tau_prime = self.conformal(phi.tan());
        let (sin_lam, cos_lam) = lam.sin_cos();

        let xi_prime = tau_prime.atan2(cos_lam);
        let eta_prime = (sin_lam / tau_prime.hypot(cos_lam)).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += a * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += a * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        coord[0] = self.k0 * self.a_hat * eta;
        coord[1] = self.k0 * self.a_hat * (xi - self.m0);
        Ok(coord)
    }

    fn inverse(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        let eta = coord.x() / (self.k0 * self.a_hat);
        let xi = coord.y() / (self.k0 * self.a_hat) + self.m0;
        if eta.abs() > ETA_LIMIT {
            return Err(Errno::LatOrLonExceedLimit);
        }

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let (sin_xi, cos_xi) = xi_prime.sin_cos();
        let tau_prime = sin_xi / sinh_eta.hypot(cos_xi);

        let tau = self.geodetic(tau_prime)?;

        coord[0] = sinh_eta.atan2(cos_xi);
        coord[1] = tau.atan();
        Ok(coord)
    }
}

pub(super) fn tmerc(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    Ok(Box::new(TransverseMercator::new(
        &setup.ellps,
        setup.phi0,
        setup.k0,
    )))
}

/// `tmerc` of the UTM zone `zone`, `south` for the southern hemisphere.
pub(super) fn utm(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    let zone: u8 = setup
        .params
        .get_parsed("zone")?
        .ok_or_else(|| Error::new_missing_parameter("zone"))?;
    if !(1..=60).contains(&zone) {
        return Err(Error::new_invalid_parameter("zone", zone.to_string()));
    }

    setup.lam0 = crate::utils::to_radians(f64::from(zone - 1) * 6.0 - 180.0 + 3.0);
    setup.phi0 = 0.0;
    setup.k0 = 0.9996;
    setup.x0 = 500_000.0;
    setup.y0 = if setup.params.get_bool("south") {
        10_000_000.0
    } else {
        0.0
    };

    tmerc(setup)
}
