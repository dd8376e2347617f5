use std::sync::{Arc, OnceLock};

use crate::grid::{Grid, GridList};
use crate::{log_debug, log_error, Context, Direction, Errno, Error, Lp, Result};

/// A grid list of an object, resolved through the context.
///
/// A successful resolution is kept, a failed one is retried by the next use.
#[derive(Debug, Default)]
pub(crate) struct GridSet {
    list: GridList,
    resolved: OnceLock<Vec<Arc<Grid>>>,
}

fn load_all(ctx: &Context, list: &GridList) -> Result<Vec<Arc<Grid>>> {
    let mut grids = Vec::with_capacity(list.len());
    for entry in list.iter() {
        match ctx.load_grid(&entry.name) {
            Ok(grid) => grids.push(grid),
            Err(e) if entry.optional => {
                log_debug!(ctx, "skip optional grid: {e}");
            }
            Err(e) => {
                log_error!(ctx, "{e}");
                return Err(e.into());
            }
        }
    }
    Ok(grids)
}

impl GridSet {
    /// Makes a lazily resolved set.
    pub(crate) fn new(list: GridList) -> Self {
        Self {
            list,
            resolved: OnceLock::new(),
        }
    }

    /// Resolves `list` now, returns the set and the number of loaded grids.
    ///
    /// The set is usable even if it is [`Err`].
    pub(crate) fn init(ctx: &Context, list: GridList) -> (Self, Result<usize>) {
        let set = Self::new(list);
        let result = match load_all(ctx, &set.list) {
            Ok(grids) => {
                let count = grids.len();
                set.resolved.get_or_init(|| grids);
                if count == 0 {
                    Err(Error::from(Errno::FailedToLoadGrid))
                } else {
                    Ok(count)
                }
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            ctx.set_error(Errno::FailedToLoadGrid);
        }
        (set, result)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn grids(&self, ctx: &Context) -> std::result::Result<&[Arc<Grid>], Errno> {
        if let Some(grids) = self.resolved.get() {
            return Ok(grids);
        }
        let grids = load_all(ctx, &self.list).map_err(|e| e.errno())?;
        Ok(self.resolved.get_or_init(|| grids))
    }

    #[inline]
    fn outside<T>(&self, value: T) -> std::result::Result<T, Errno> {
        if self.list.all_optional() {
            Ok(value)
        } else {
            Err(Errno::PointOutsideGrid)
        }
    }

    pub(crate) fn hvalue(&self, ctx: &Context, lp: &Lp) -> std::result::Result<Option<Lp>, Errno> {
        Ok(self.grids(ctx)?.iter().find_map(|grid| grid.hvalue(lp)))
    }

    pub(crate) fn vvalue(&self, ctx: &Context, lp: &Lp) -> std::result::Result<Option<f64>, Errno> {
        Ok(self.grids(ctx)?.iter().find_map(|grid| grid.vvalue(lp)))
    }

    /// Applies the horizontal shift in `direction`.
    pub(crate) fn happly(
        &self,
        ctx: &Context,
        lp: Lp,
        direction: Direction,
    ) -> std::result::Result<Lp, Errno> {
        if self.is_empty() {
            return Ok(lp);
        }
        let grids = self.grids(ctx)?;

        match direction {
            Direction::Forward => match grids.iter().find_map(|grid| grid.hvalue(&lp)) {
                Some(shift) => Ok(Lp::new(lp.lam + shift.lam, lp.phi + shift.phi)),
                None => self.outside(lp),
            },
            Direction::Inverse => match grids.iter().find(|grid| grid.hvalue(&lp).is_some()) {
                Some(grid) => grid.hinverse(&lp),
                None => self.outside(lp),
            },
        }
    }

    /// Applies the vertical offset scaled by `multiplier` in `direction`.
    pub(crate) fn vapply(
        &self,
        ctx: &Context,
        lp: &Lp,
        z: f64,
        direction: Direction,
        multiplier: f64,
    ) -> std::result::Result<f64, Errno> {
        if self.is_empty() {
            return Ok(z);
        }

        match self.vvalue(ctx, lp)? {
            Some(v) => Ok(match direction {
                Direction::Forward => z + multiplier * v,
                Direction::Inverse => z - multiplier * v,
            }),
            None => self.outside(z),
        }
    }
}
