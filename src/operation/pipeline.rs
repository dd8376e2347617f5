use crate::operation::{Operation, Setup};
use crate::pj::inherit_ellipsoid;
use crate::{Context, Coord, Direction, Errno, Error, IoUnits, Pj, Result};

/// An ordered chain of transformation objects.
#[derive(Debug)]
struct Pipeline {
    steps: Vec<Pj>,
}

impl Operation for Pipeline {
    fn left(&self) -> IoUnits {
        self.steps.first().map_or(IoUnits::Radians, Pj::left)
    }

    fn right(&self) -> IoUnits {
        self.steps.last().map_or(IoUnits::Radians, Pj::right)
    }

    fn forward(&self, _: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        self.steps
            .iter()
            .try_fold(coord, |coord, step| step.trans_raw(Direction::Forward, coord))
    }

    fn inverse(&self, _: &Context, coord: Coord) -> std::result::Result<Coord, Errno> {
        self.steps
            .iter()
            .rev()
            .try_fold(coord, |coord, step| step.trans_raw(Direction::Inverse, coord))
    }

    fn has_inverse(&self) -> bool {
        self.steps.iter().all(Pj::has_inverse)
    }

    fn skips_unit_conversion(&self) -> bool {
        true
    }

    fn set_context(&mut self, ctx: &Context) {
        for step in &mut self.steps {
            step.set_context(ctx);
        }
    }
}

/// Every step is made under the pipeline context,
/// a step without an ellipsoid takes the one of the pipeline.
pub(super) fn pipeline(setup: &mut Setup) -> Result<Box<dyn Operation>> {
    let params = setup.params.steps();
    if params.is_empty() {
        return Err(Error::new_missing_parameter("step"));
    }

    let steps = params
        .iter()
        .map(|step| {
            let step = inherit_ellipsoid(&setup.ellps, step.clone());
            Pj::with_registry(setup.ctx, &step, setup.registry)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Box::new(Pipeline { steps }))
}
