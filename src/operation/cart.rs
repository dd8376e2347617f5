//! Geodetic to geocentric cartesian.
use crate::operation::{Operation, Setup};
use crate::{Context, Coord, Ellipsoid, Errno, IoUnits, Result};

#[derive(Debug)]
struct Cartesian {
    ellps: Ellipsoid,
}

impl Cartesian {
    /// The radius of curvature in the prime vertical.
    #[inline]
    fn normal_radius(&self, sin_phi: f64) -> f64 {
        self.ellps.a / (1.0 - self.ellps.es * sin_phi * sin_phi).sqrt()
    }
}

impl Operation for Cartesian {
    fn left(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn right(&self) -> IoUnits {
        IoUnits::Meters
    }

    fn forward(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        let (sin_lam, cos_lam) = coord.lon().sin_cos();
        let (sin_phi, cos_phi) = coord.lat().sin_cos();
        let h = coord.z();
        let n = self.normal_radius(sin_phi);

        coord[0] = (n + h) * cos_phi * cos_lam;
        coord[1] = (n + h) * cos_phi * sin_lam;
        coord[2] = (n * self.ellps.one_es + h) * sin_phi;
        Ok(coord)
    }

    /// Bowring's method.
    fn inverse(&self, _: &Context, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        let Ellipsoid { a, b, es, ep2, .. } = self.ellps;
        let (x, y, z) = (coord.x(), coord.y(), coord.z());

        let p = x.hypot(y);
        if p == 0.0 && z == 0.0 {
            // the geocentre, taken as below the north pole
            coord[0] = 0.0;
            coord[1] = std::f64::consts::FRAC_PI_2;
            coord[2] = -b;
            return Ok(coord);
        }
        let (sin_theta, cos_theta) = (z * a).atan2(p * b).sin_cos();

        let phi = (z + ep2 * b * sin_theta.powi(3)).atan2(p - es * a * cos_theta.powi(3));
        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = self.normal_radius(sin_phi);

        let h = if cos_phi.abs() < 1e-6 {
            // near the poles
            z / sin_phi - n * self.ellps.one_es
        } else {
            p / cos_phi - n
        };

        coord[0] = y.atan2(x);
        coord[1] = phi;
        coord[2] = h;
        Ok(coord)
    }
}

pub(super) fn cart(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    // geocentric coordinates have no false origin
    setup.x0 = 0.0;
    setup.y0 = 0.0;
    Ok(Box::new(Cartesian { ellps: setup.ellps }))
}
