//! The dispatch, the unit negotiation around an operation.
use std::f64::consts::FRAC_PI_2;

use crate::utils::normalize_longitude;
use crate::{log_debug, log_trace, Coord, Direction, Errno, IoUnits, Pj, Result};

use super::GEOID_MULTIPLIER;

/// The latitude allowed beyond the poles.
const LAT_TOLERANCE: f64 = 1e-12;

impl Pj {
    /// Transforms `coord` in `direction`, `proj_trans`.
    ///
    /// The input is in the units of the geodetic side ([`Pj::left`])
    /// for [`Direction::Forward`], and of the projected side ([`Pj::right`])
    /// for [`Direction::Inverse`]; the output is in the units of the other side.
    ///
    /// It returns [`Coord::error()`] on failure,
    /// and then the error code is set on the context.
    /// The error sentinel input is returned as is.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::{Context, Coord, Direction, Errno, ParamList, Pj};
    /// #
    /// let ctx = Context::new();
    /// let pj = Pj::new(&ctx, &ParamList::new().set("proj", "merc"))?;
    ///
    /// let actual = pj.trans(Direction::Forward, Coord::from_degrees(0.0, 90.0, 0.0, 0.0));
    /// assert!(actual.is_error());
    /// assert_eq!(ctx.errno(), Some(Errno::ToleranceCondition));
    /// # Ok::<(), gridtrans::Error>(())
    /// ```
    pub fn trans(&self, direction: Direction, coord: Coord) -> Coord {
        if coord.is_error() {
            return coord;
        }

        match self.trans_raw(direction, coord) {
            Ok(coord) => coord,
            Err(errno) => {
                self.ctx.set_error(errno);
                log_debug!(self.ctx, "{}: {direction:?} failed: {errno}", self.name);
                Coord::error()
            }
        }
    }

    /// Transforms `coord` in forward, `pj_fwd4d`.
    #[inline]
    pub fn fwd4d(&self, coord: Coord) -> Coord {
        self.trans(Direction::Forward, coord)
    }

    /// Transforms `coord` in inverse, `pj_inv4d`.
    #[inline]
    pub fn inv4d(&self, coord: Coord) -> Coord {
        self.trans(Direction::Inverse, coord)
    }

    /// Transforms `coord` in forward.
    ///
    /// This does not touch the context, the failure is returned only.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the transformation fails.
    #[inline]
    pub fn forward(&self, coord: Coord) -> Result<Coord> {
        Ok(self.trans_raw(Direction::Forward, coord)?)
    }

    /// Transforms `coord` in inverse.
    ///
    /// This does not touch the context, the failure is returned only.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the transformation fails.
    #[inline]
    pub fn inverse(&self, coord: Coord) -> Result<Coord> {
        Ok(self.trans_raw(Direction::Inverse, coord)?)
    }

    pub(crate) fn trans_raw(
        &self,
        direction: Direction,
        coord: Coord,
    ) -> std::result::Result<Coord, Errno> {
        match direction.flip_if(self.inverted) {
            Direction::Forward => self.fwd(coord),
            Direction::Inverse => self.inv(coord),
        }
    }

    fn fwd(&self, coord: Coord) -> std::result::Result<Coord, Errno> {
        let operation = &*self.operation;
        let skip = operation.skips_unit_conversion();
        let geodetic = operation.left().is_angular();
        log_trace!(self.ctx, "{}: forward input {:?}", self.name, coord.v);

        let mut coord = coord;
        if geodetic {
            if !skip {
                check_geodetic(&coord)?;
            }
            coord = self.apply_grids(coord, Direction::Forward)?;
        }
        if !skip {
            coord = self.prepare(operation.left(), coord)?;
        }

        let coord = operation.forward(&self.ctx, coord)?;
        log_trace!(self.ctx, "{}: forward operation {:?}", self.name, coord.v);

        let coord = if skip {
            coord
        } else {
            self.finalize(operation.right(), coord)?
        };
        log_trace!(self.ctx, "{}: forward output {:?}", self.name, coord.v);
        Ok(coord)
    }

    fn inv(&self, coord: Coord) -> std::result::Result<Coord, Errno> {
        let operation = &*self.operation;
        if !operation.has_inverse() {
            return Err(Errno::NoInverseOperation);
        }
        let skip = operation.skips_unit_conversion();
        log_trace!(self.ctx, "{}: inverse input {:?}", self.name, coord.v);

        let coord = if skip {
            coord
        } else {
            self.prepare(operation.right(), coord)?
        };

        let coord = operation.inverse(&self.ctx, coord)?;
        log_trace!(self.ctx, "{}: inverse operation {:?}", self.name, coord.v);

        let mut coord = if skip {
            coord
        } else {
            self.finalize(operation.left(), coord)?
        };
        if operation.left().is_angular() {
            coord = self.apply_grids(coord, Direction::Inverse)?;
        }
        log_trace!(self.ctx, "{}: inverse output {:?}", self.name, coord.v);
        Ok(coord)
    }

    /// User units of `units` to the internal units.
    fn prepare(&self, units: IoUnits, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        match units {
            IoUnits::Radians => {
                check_geodetic(&coord)?;
                coord[0] -= self.lam0;
                if !self.over {
                    coord[0] = normalize_longitude(coord[0]);
                }
            }
            IoUnits::Meters => {
                coord[0] -= self.x0;
                coord[1] -= self.y0;
                check_finite(&coord)?;
            }
            IoUnits::Classic => {
                coord[0] = (coord[0] * self.to_meter - self.x0) * self.ellps.ra;
                coord[1] = (coord[1] * self.to_meter - self.y0) * self.ellps.ra;
                check_finite(&coord)?;
            }
        }
        Ok(coord)
    }

    /// The internal units to user units of `units`.
    fn finalize(&self, units: IoUnits, mut coord: Coord) -> std::result::Result<Coord, Errno> {
        check_finite(&coord)?;
        match units {
            IoUnits::Radians => {
                coord[0] += self.lam0;
                if !self.over {
                    coord[0] = normalize_longitude(coord[0]);
                }
            }
            IoUnits::Meters => {
                coord[0] += self.x0;
                coord[1] += self.y0;
            }
            IoUnits::Classic => {
                coord[0] = self.fr_meter * (self.ellps.a * coord[0] + self.x0);
                coord[1] = self.fr_meter * (self.ellps.a * coord[1] + self.y0);
            }
        }
        check_finite(&coord)?;
        Ok(coord)
    }

    /// Applies `nadgrids` and `geoidgrids` on the geodetic side.
    ///
    /// The vertical offset is looked up at the position before the horizontal shift
    /// in both directions.
    fn apply_grids(
        &self,
        mut coord: Coord,
        direction: Direction,
    ) -> std::result::Result<Coord, Errno> {
        if self.hgrids.is_empty() && self.vgrids.is_empty() {
            return Ok(coord);
        }

        match direction {
            Direction::Forward => {
                coord[2] = self.vgrids.vapply(
                    &self.ctx,
                    &coord.lp(),
                    coord.z(),
                    direction,
                    GEOID_MULTIPLIER,
                )?;
                let lp = self.hgrids.happly(&self.ctx, coord.lp(), direction)?;
                coord = coord.with_lp(lp);
            }
            Direction::Inverse => {
                let lp = self.hgrids.happly(&self.ctx, coord.lp(), direction)?;
                coord = coord.with_lp(lp);
                coord[2] = self.vgrids.vapply(
                    &self.ctx,
                    &coord.lp(),
                    coord.z(),
                    direction,
                    GEOID_MULTIPLIER,
                )?;
            }
        }
        log_trace!(self.ctx, "{}: {direction:?} grids {:?}", self.name, coord.v);
        Ok(coord)
    }
}

#[inline]
fn check_geodetic(coord: &Coord) -> std::result::Result<(), Errno> {
    if coord.lon().is_finite() && coord.lat().abs() <= FRAC_PI_2 + LAT_TOLERANCE {
        Ok(())
    } else {
        Err(Errno::LatOrLonExceedLimit)
    }
}

/// The horizontal components out of the operation or in the projected units.
#[inline]
fn check_finite(coord: &Coord) -> std::result::Result<(), Errno> {
    if coord.x().is_finite() && coord.y().is_finite() {
        Ok(())
    } else {
        Err(Errno::LatOrLonExceedLimit)
    }
}
