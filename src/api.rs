//! Free functions named after the classic projection library interface.
//!
//! Each function delegates to a method of [`Context`] or [`Pj`].
//!
//! ```
//! use gridtrans::api::*;
//! use gridtrans::{Coord, Direction, IoUnits, LogLevel, ParamList, Pj};
//!
//! let ctx = proj_context_create();
//! assert_eq!(proj_log_level(&ctx, LogLevel::Debug), LogLevel::Error);
//!
//! let pj = Pj::new(&ctx, &ParamList::new().set("proj", "cart"))?;
//! assert_eq!(pj_left(&pj), IoUnits::Radians);
//! assert_eq!(pj_right(&pj), IoUnits::Meters);
//!
//! let coord = Coord::from_degrees(12.0, 55.0, 0.0, 0.0);
//! let geocentric = proj_trans(&pj, Direction::Forward, coord);
//! assert_eq!(pj_fwd4d(coord, &pj), geocentric);
//! # Ok::<(), gridtrans::Error>(())
//! ```
use std::fmt::Arguments;
use std::sync::Arc;

pub use crate::utils::{to_degrees, to_radians};
use crate::{
    Context, Coord, Direction, Ellipsoid, Errno, FileApi, IoUnits, LogLevel, Logger, Lp,
    ParamList, Pj, Result,
};

/// See [`Context::new`].
#[inline]
pub fn proj_context_create() -> Context {
    Context::new()
}

/// See [`Pj::trans`].
#[inline]
pub fn proj_trans(pj: &Pj, direction: Direction, coord: Coord) -> Coord {
    pj.trans(direction, coord)
}

/// See [`Pj::fwd4d`].
#[inline]
pub fn pj_fwd4d(coord: Coord, pj: &Pj) -> Coord {
    pj.fwd4d(coord)
}

/// See [`Pj::inv4d`].
#[inline]
pub fn pj_inv4d(coord: Coord, pj: &Pj) -> Coord {
    pj.inv4d(coord)
}

/// See [`Pj::left`].
#[inline]
pub fn pj_left(pj: &Pj) -> IoUnits {
    pj.left()
}

/// See [`Pj::right`].
#[inline]
pub fn pj_right(pj: &Pj) -> IoUnits {
    pj.right()
}

/// See [`Coord::error`].
#[inline]
pub const fn proj_coord_error() -> Coord {
    Coord::error()
}

/// See [`Context::set_error`].
#[inline]
pub fn proj_context_errno_set(ctx: &Context, errno: Errno) {
    ctx.set_error(errno)
}

/// See [`Context::errno`].
#[inline]
pub fn proj_context_errno(ctx: &Context) -> Option<Errno> {
    ctx.errno()
}

/// See [`Pj::set_context`].
#[inline]
pub fn proj_context_set(pj: &mut Pj, ctx: &Context) {
    pj.set_context(ctx)
}

/// See [`Pj::inherit_context`].
#[inline]
pub fn proj_context_inherit(parent: &Pj, child: &mut Pj) {
    parent.inherit_context(child)
}

/// See [`Context::set_log_level`].
#[inline]
pub fn proj_log_level(ctx: &Context, level: LogLevel) -> LogLevel {
    ctx.set_log_level(level)
}

/// See [`Context::set_logger`].
#[inline]
pub fn proj_log_func(ctx: &Context, logger: Option<Arc<dyn Logger>>) {
    ctx.set_logger(logger)
}

/// See [`log_error!`](crate::log_error).
#[inline]
pub fn proj_log_error(ctx: &Context, args: Arguments) {
    ctx.log(LogLevel::Error, args)
}

/// See [`log_debug!`](crate::log_debug).
#[inline]
pub fn proj_log_debug(ctx: &Context, args: Arguments) {
    ctx.log(LogLevel::Debug, args)
}

/// See [`log_trace!`](crate::log_trace).
#[inline]
pub fn proj_log_trace(ctx: &Context, args: Arguments) {
    ctx.log(LogLevel::Trace, args)
}

/// See [`Pj::hgrid_init`].
///
/// # Errors
///
/// Returns [`Err`] when a mandatory grid is not loaded or no grid is loaded.
#[inline]
pub fn proj_hgrid_init(pj: &mut Pj, names: &str) -> Result<usize> {
    pj.hgrid_init(names)
}

/// See [`Pj::vgrid_init`].
///
/// # Errors
///
/// Returns [`Err`] when a mandatory grid is not loaded or no grid is loaded.
#[inline]
pub fn proj_vgrid_init(pj: &mut Pj, names: &str) -> Result<usize> {
    pj.vgrid_init(names)
}

/// See [`Pj::hgrid_value`].
#[inline]
pub fn proj_hgrid_value(pj: &Pj, lp: &Lp) -> Option<Lp> {
    pj.hgrid_value(lp)
}

/// See [`Pj::vgrid_value`].
#[inline]
pub fn proj_vgrid_value(pj: &Pj, lp: &Lp) -> Option<f64> {
    pj.vgrid_value(lp)
}

/// See [`Pj::hgrid_apply`].
///
/// # Errors
///
/// Returns [`Err`] when `lp` is outside of every grid and some grid is mandatory.
#[inline]
pub fn proj_hgrid_apply(pj: &Pj, lp: Lp, direction: Direction) -> std::result::Result<Lp, Errno> {
    pj.hgrid_apply(lp, direction)
}

/// See [`Context::set_file_api`].
#[inline]
pub fn proj_fileapi_set(ctx: &Context, file_api: Arc<dyn FileApi>) {
    ctx.set_file_api(file_api)
}

/// See [`Context::search_path`].
#[inline]
pub fn proj_get_searchpath(ctx: &Context) -> Vec<String> {
    ctx.search_path()
}

/// See [`Context::path_count`].
#[inline]
pub fn proj_get_path_count(ctx: &Context) -> usize {
    ctx.path_count()
}

/// See [`Pj::inherit_ellipsoid_defs`].
#[inline]
pub fn pj_inherit_ellipsoid_defs(src: &Pj, dst: ParamList) -> ParamList {
    Pj::inherit_ellipsoid_defs(src, dst)
}

/// See [`Ellipsoid::from_a_es`].
///
/// # Errors
///
/// Returns [`Err`] when `a` or `es` is out of range.
#[inline]
pub fn pj_calc_ellps_params(a: f64, es: f64) -> Result<Ellipsoid> {
    Ellipsoid::from_a_es(a, es)
}
