//! Grid-only operations, `hgridshift` and `vgridshift`.
use crate::grid::{GridList, GridSet};
use crate::operation::{Operation, Setup};
use crate::{Context, Coord, Direction, Errno, ErrorKind, IoUnits, Result};

#[derive(Debug)]
struct HorizontalShift {
    grids: GridSet,
}

impl Operation for HorizontalShift {
    fn left(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn right(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn forward(&self, ctx: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        let lp = self.grids.happly(ctx, coord.lp(), Direction::Forward)?;
        Ok(coord.with_lp(lp))
    }

    fn inverse(&self, ctx: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        let lp = self.grids.happly(ctx, coord.lp(), Direction::Inverse)?;
        Ok(coord.with_lp(lp))
    }
}

#[derive(Debug)]
struct VerticalShift {
    grids: GridSet,
    multiplier: f64,
}

impl VerticalShift {
    fn apply(
        &self,
        ctx: &Context,
        mut coord: Coord,
        direction: Direction,
    ) -> std::result::Result<Coord, Errno> {
        coord[2] = self
            .grids
            .vapply(ctx, &coord.lp(), coord.z(), direction, self.multiplier)?;
        Ok(coord)
    }
}

impl Operation for VerticalShift {
    fn left(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn right(&self) -> IoUnits {
        IoUnits::Radians
    }

    fn forward(&self, ctx: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        self.apply(ctx, coord, Direction::Forward)
    }

    fn inverse(&self, ctx: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        self.apply(ctx, coord, Direction::Inverse)
    }
}

/// Loads `grids` now.
///
/// A missing mandatory grid fails the construction,
/// a list of which no grid is found is accepted.
fn init_grids(setup: &Setup) -> Result<GridSet> {
    let list = GridList::parse(setup.params.require("grids")?);
    let (grids, result) = GridSet::init(setup.ctx, list);
    match result {
        Err(e) if matches!(e.kind(), ErrorKind::LoadGrid(_)) => Err(e),
        _ => Ok(grids),
    }
}

pub(super) fn hgridshift(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    Ok(Box::new(HorizontalShift {
        grids: init_grids(setup)?,
    }))
}

/// `multiplier` scales the offset of the forward direction, -1 by default.
pub(super) fn vgridshift(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    Ok(Box::new(VerticalShift {
        grids: init_grids(setup)?,
        multiplier: setup.params.get_parsed_or("multiplier", -1.0)?,
    }))
}
