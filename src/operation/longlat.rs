use crate::operation::{Operation, Setup};
use crate::{Context, Coord, Errno, IoUnits, Result};

/// Identity on geodetic coordinates.
#[derive(Debug)]
struct LongLat;

impl Operation for LongLat {
    fn left(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn right(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn forward(&self, _: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        Ok(coord)
    }

    fn inverse(&self, _: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        Ok(coord)
    }
}

/// Identity on whatever coordinates.
#[derive(Debug)]
struct Noop;

impl Operation for Noop {
    fn left(&self) -> IoUnits {
        IoUnits::Meters
    }

    fn right(&self) -> IoUnits {
        IoUnits::Meters
    }

    fn forward(&self, _: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        Ok(coord)
    }

    fn inverse(&self, _: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        Ok(coord)
    }
}

pub(super) fn longlat(_: &mut Setup) -> Result<Box<dyn Operation>> {
    Ok(Box::new(LongLat))
}

pub(super) fn noop(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    // no false origin, the coordinate passes unchanged
    setup.x0 = 0.0;
    setup.y0 = 0.0;
    Ok(Box::new(Noop))
}
