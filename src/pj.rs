//! Provides [`Pj`], the transformation object.
use std::f64::consts::FRAC_PI_2;

use crate::grid::{GridList, GridSet};
use crate::operation::{Operation, OperationRegistry, Setup};
use crate::{
    log_debug, log_error, log_trace, Context, Direction, Ellipsoid, Errno, Error, IoUnits, Lp,
    ParamList, Result,
};

mod trans;

/// The keys defining an ellipsoid.
const ELLIPSOID_KEYS: [&str; 7] = ["ellps", "a", "es", "rf", "f", "b", "R"];

/// The multiplier of `geoidgrids`, the forward direction subtracts the geoid height.
const GEOID_MULTIPLIER: f64 = -1.0;

/// A transformation object, a configured operation usable in either direction.
///
/// The direction is an argument of each call, see [`Pj::trans`];
/// the object itself is immutable after construction
/// except the lazy resolution of its grids.
///
/// # Example
///
/// ```
/// # use gridtrans::{Context, Coord, Direction, IoUnits, ParamList, Pj};
/// #
/// let ctx = Context::new();
/// let params = ParamList::new()
///     .set("proj", "utm")
///     .set("zone", 32)
///     .set("ellps", "GRS80");
/// let pj = Pj::new(&ctx, &params)?;
///
/// assert_eq!(pj.left(), IoUnits::Radians);
/// assert_eq!(pj.right(), IoUnits::Classic);
///
/// let origin = Coord::from_degrees(12.0, 55.0, 0.0, 0.0);
/// let projected = pj.trans(Direction::Forward, origin);
/// assert!((projected.x() - 691_875.632).abs() < 1e-3);
/// assert!((projected.y() - 6_098_907.825).abs() < 1e-3);
///
/// let actual = pj.trans(Direction::Inverse, projected);
/// assert!((actual.lon() - origin.lon()).abs() < 1e-11);
/// assert!((actual.lat() - origin.lat()).abs() < 1e-11);
/// # Ok::<(), gridtrans::Error>(())
/// ```
#[derive(Debug)]
pub struct Pj {
    ctx: Context,
    name: String,
    ellps: Ellipsoid,
    lam0: f64,
    phi0: f64,
    k0: f64,
    x0: f64,
    y0: f64,
    to_meter: f64,
    fr_meter: f64,
    over: bool,
    inverted: bool,
    operation: Box<dyn Operation>,
    hgrids: GridSet,
    vgrids: GridSet,
}

/// Returns the ellipsoid of `params`, GRS80 by default.
///
/// `R` gives a sphere, `a` with one of `es`, `rf`, `f` or `b`
/// gives the shape, `a` alone keeps the shape of `ellps`.
fn ellipsoid(params: &ParamList) -> Result<Ellipsoid> {
    let base = match params.get("ellps") {
        Some(name) => Ellipsoid::by_name(name.trim())?,
        None => Ellipsoid::GRS80,
    };

    if let Some(r) = params.get_parsed("R")? {
        return Ellipsoid::from_a_es(r, 0.0);
    }

    let a = params.get_parsed("a")?.unwrap_or(base.a);
    if let Some(es) = params.get_parsed("es")? {
        Ellipsoid::from_a_es(a, es)
    } else if let Some(rf) = params.get_parsed("rf")? {
        Ellipsoid::from_a_rf(a, rf)
    } else if let Some(f) = params.get_parsed("f")? {
        Ellipsoid::from_a_f(a, f)
    } else if let Some(b) = params.get_parsed("b")? {
        Ellipsoid::from_a_b(a, b)
    } else if a != base.a {
        Ellipsoid::from_a_es(a, base.es)
    } else {
        Ok(base)
    }
}

/// Returns the meters of a linear unit.
fn unit_to_meter(name: &str) -> Option<f64> {
    let v = match name {
        "km" => 1000.0,
        "m" => 1.0,
        "dm" => 0.1,
        "cm" => 0.01,
        "mm" => 0.001,
        "kmi" => 1852.0,
        "mi" => 1609.344,
        "yd" => 0.9144,
        "ft" => 0.3048,
        "us-ft" => 1200.0 / 3937.0,
        "ch" => 20.1168,
        "link" => 0.201168,
        _ => return None,
    };
    Some(v)
}

fn to_meter(params: &ParamList) -> Result<f64> {
    let v = match (params.get_parsed::<f64>("to_meter")?, params.get("units")) {
        (Some(v), _) => v,
        (None, Some(units)) => unit_to_meter(units.trim())
            .ok_or_else(|| Error::new_invalid_parameter("units", units))?,
        (None, None) => 1.0,
    };

    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(Error::new_invalid_parameter("to_meter", v.to_string()))
    }
}

/// Adds the definition of `ellps` to `params` if it has none.
pub(crate) fn inherit_ellipsoid(ellps: &Ellipsoid, params: ParamList) -> ParamList {
    if ELLIPSOID_KEYS.iter().any(|key| params.has(key)) {
        params
    } else {
        params.set("a", ellps.a).set("es", ellps.es)
    }
}

impl Pj {
    /// Makes a [`Pj`] by the built-in operations.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the definition is invalid,
    /// the code is also set on `ctx`.
    #[inline]
    pub fn new(ctx: &Context, params: &ParamList) -> Result<Self> {
        Self::with_registry(ctx, params, OperationRegistry::shared())
    }

    /// Makes a [`Pj`] by the operations of `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the definition is invalid,
    /// the code is also set on `ctx`.
    pub fn with_registry(
        ctx: &Context,
        params: &ParamList,
        registry: &OperationRegistry,
    ) -> Result<Self> {
        let result = Self::build(ctx, params, registry);
        if let Err(e) = &result {
            ctx.set_error(e.errno());
            log_debug!(ctx, "failed to create an object: {e}");
        }
        result
    }

    fn build(ctx: &Context, params: &ParamList, registry: &OperationRegistry) -> Result<Self> {
        let name = params.require("proj")?.trim();
        let Some(constructor) = registry.get(name) else {
            log_error!(ctx, "unknown operation: {name}");
            return Err(Errno::UnknownOperation.into());
        };

        let phi0 = params.get_radians("lat_0")?.unwrap_or(0.0);
        if phi0.abs() > FRAC_PI_2 {
            return Err(Error::new_invalid_parameter(
                "lat_0",
                params.get("lat_0").unwrap_or_default(),
            ));
        }

        let k0 = match params.get_parsed::<f64>("k_0")? {
            Some(k0) => k0,
            None => params.get_parsed_or("k", 1.0)?,
        };
        if !(k0.is_finite() && k0 > 0.0) {
            return Err(Error::new_invalid_parameter("k_0", k0.to_string()));
        }

        let mut setup = Setup {
            ctx,
            params,
            registry,
            ellps: ellipsoid(params)?,
            lam0: params.get_radians("lon_0")?.unwrap_or(0.0),
            phi0,
            k0,
            x0: params.get_parsed_or("x_0", 0.0)?,
            y0: params.get_parsed_or("y_0", 0.0)?,
        };
        let operation = constructor(&mut setup)?;

        let inverted = params.get_bool("inv");
        if inverted && !operation.has_inverse() {
            return Err(Errno::NoInverseOperation.into());
        }

        let to_meter = to_meter(params)?;
        let grids = |key: &str| {
            params
                .get(key)
                .map(|s| GridSet::new(GridList::parse(s)))
                .unwrap_or_default()
        };

        log_trace!(
            ctx,
            "{name}: a={} es={} lon_0={} x_0={} y_0={}",
            setup.ellps.a,
            setup.ellps.es,
            setup.lam0,
            setup.x0,
            setup.y0
        );

        Ok(Self {
            ctx: ctx.clone(),
            name: name.to_string(),
            ellps: setup.ellps,
            lam0: setup.lam0,
            phi0: setup.phi0,
            k0: setup.k0,
            x0: setup.x0,
            y0: setup.y0,
            to_meter,
            fr_meter: 1.0 / to_meter,
            over: params.get_bool("over"),
            inverted,
            operation,
            hgrids: grids("nadgrids"),
            vgrids: grids("geoidgrids"),
        })
    }

    /// Returns the context, `proj_context_get`.
    #[inline]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Re-associates to `ctx`, `proj_context_set`.
    ///
    /// The steps of a pipeline follow.
    /// Grids already resolved stay in use,
    /// the others are resolved through `ctx`.
    pub fn set_context(&mut self, ctx: &Context) {
        self.ctx = ctx.clone();
        self.operation.set_context(ctx);
    }

    /// Makes `child` share the context of `self`, `proj_context_inherit`.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::{Context, LogLevel, ParamList, Pj};
    /// #
    /// let params = ParamList::new().set("proj", "longlat");
    /// let parent = Pj::new(&Context::new(), &params)?;
    /// let mut child = Pj::new(&Context::new(), &params)?;
    ///
    /// parent.inherit_context(&mut child);
    /// parent.context().set_log_level(LogLevel::Trace);
    /// assert_eq!(child.context().log_level(), LogLevel::Trace);
    /// # Ok::<(), gridtrans::Error>(())
    /// ```
    #[inline]
    pub fn inherit_context(&self, child: &mut Pj) {
        child.set_context(&self.ctx);
    }

    /// Adds the ellipsoid of `src` to `dst` if `dst` defines none,
    /// `pj_inherit_ellipsoid_defs`.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::{Context, Ellipsoid, ParamList, Pj};
    /// #
    /// let ctx = Context::new();
    /// let src = Pj::new(&ctx, &ParamList::new().set("proj", "longlat").set("ellps", "bessel"))?;
    ///
    /// let params = Pj::inherit_ellipsoid_defs(&src, ParamList::new().set("proj", "cart"));
    /// let dst = Pj::new(&ctx, &params)?;
    /// assert_eq!(dst.ellipsoid(), &Ellipsoid::BESSEL);
    /// # Ok::<(), gridtrans::Error>(())
    /// ```
    #[inline]
    pub fn inherit_ellipsoid_defs(src: &Pj, dst: ParamList) -> ParamList {
        inherit_ellipsoid(&src.ellps, dst)
    }

    /// Returns the operation name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ellipsoid.
    #[inline]
    pub const fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellps
    }

    /// Returns the central meridian \[rad\].
    #[inline]
    pub const fn lam0(&self) -> f64 {
        self.lam0
    }

    /// Returns the latitude of origin \[rad\].
    #[inline]
    pub const fn phi0(&self) -> f64 {
        self.phi0
    }

    /// Returns the scale factor.
    #[inline]
    pub const fn k0(&self) -> f64 {
        self.k0
    }

    /// Returns the false easting and northing \[m\].
    #[inline]
    pub const fn false_origin(&self) -> (f64, f64) {
        (self.x0, self.y0)
    }

    /// Returns the meters of the linear user unit.
    #[inline]
    pub const fn to_meter(&self) -> f64 {
        self.to_meter
    }

    /// Returns `true` if the object is inverted by `inv`.
    #[inline]
    pub const fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Returns `true` if [`Direction::Inverse`] is available.
    pub fn has_inverse(&self) -> bool {
        self.inverted || self.operation.has_inverse()
    }

    /// The unit system of the geodetic side, `pj_left`.
    ///
    /// An inverted object reports its right side.
    pub fn left(&self) -> IoUnits {
        if self.inverted {
            self.operation.right()
        } else {
            self.operation.left()
        }
    }

    /// The unit system of the projected side, `pj_right`.
    ///
    /// An inverted object reports its left side.
    pub fn right(&self) -> IoUnits {
        if self.inverted {
            self.operation.left()
        } else {
            self.operation.right()
        }
    }

    /// Resolves the horizontal grids `names` now, `proj_hgrid_init`.
    ///
    /// This replaces the grids of `nadgrids`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when a mandatory grid is not loaded
    /// or when no grid is loaded;
    /// the object is usable in both cases, and the code is set on the context.
    pub fn hgrid_init(&mut self, names: &str) -> Result<usize> {
        let (grids, result) = GridSet::init(&self.ctx, GridList::parse(names));
        self.hgrids = grids;
        result
    }

    /// Resolves the vertical grids `names` now, `proj_vgrid_init`.
    ///
    /// This replaces the grids of `geoidgrids`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when a mandatory grid is not loaded
    /// or when no grid is loaded;
    /// the object is usable in both cases, and the code is set on the context.
    pub fn vgrid_init(&mut self, names: &str) -> Result<usize> {
        let (grids, result) = GridSet::init(&self.ctx, GridList::parse(names));
        self.vgrids = grids;
        result
    }

    /// Returns the interpolated horizontal shift at `lp`, `proj_hgrid_value`.
    ///
    /// Returns [`None`] when `lp` is outside of every grid.
    pub fn hgrid_value(&self, lp: &Lp) -> Option<Lp> {
        self.hgrids
            .hvalue(&self.ctx, lp)
            .unwrap_or_else(|errno| {
                self.ctx.set_error(errno);
                None
            })
    }

    /// Returns the interpolated vertical offset at `lp`, `proj_vgrid_value`.
    ///
    /// Returns [`None`] when `lp` is outside of every grid.
    pub fn vgrid_value(&self, lp: &Lp) -> Option<f64> {
        self.vgrids
            .vvalue(&self.ctx, lp)
            .unwrap_or_else(|errno| {
                self.ctx.set_error(errno);
                None
            })
    }

    /// Applies the horizontal grids to `lp` in `direction`, `proj_hgrid_apply`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when `lp` is outside of every grid
    /// and some grid is mandatory, or the inverse does not converge.
    pub fn hgrid_apply(&self, lp: Lp, direction: Direction) -> std::result::Result<Lp, Errno> {
        self.hgrids.happly(&self.ctx, lp, direction)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(proj: &str) -> ParamList {
        ParamList::new().set("proj", proj)
    }

    mod tests_create {
        use super::*;

        #[test]
        fn test_defaults() {
            let ctx = Context::new();
            let pj = Pj::new(&ctx, &params("tmerc")).unwrap();

            assert_eq!(pj.name(), "tmerc");
            assert_eq!(pj.ellipsoid(), &Ellipsoid::GRS80);
            assert_eq!((pj.lam0(), pj.phi0(), pj.k0()), (0.0, 0.0, 1.0));
            assert_eq!(pj.false_origin(), (0.0, 0.0));
            assert_eq!(pj.to_meter(), 1.0);
            assert!(!pj.is_inverted());
            assert!(pj.has_inverse());
            assert!(pj.context().ptr_eq(&ctx));
        }

        #[test]
        fn test_utm_overrides() {
            let ctx = Context::new();
            let pj = Pj::new(&ctx, &params("utm").set("zone", 54).flag("south")).unwrap();

            assert!((pj.lam0().to_degrees() - 141.0).abs() < 1e-12);
            assert_eq!(pj.k0(), 0.9996);
            assert_eq!(pj.false_origin(), (500_000.0, 10_000_000.0));
        }

        #[test]
        fn test_unknown_operation() {
            let ctx = Context::new();
            let err = Pj::new(&ctx, &params("lcc")).unwrap_err();
            assert_eq!(err.errno(), Errno::UnknownOperation);
            assert_eq!(ctx.errno(), Some(Errno::UnknownOperation));

            let ctx = Context::new();
            let err = Pj::new(&ctx, &ParamList::new().set("zone", 1)).unwrap_err();
            assert_eq!(err.errno(), Errno::MissingParameter);
            assert_eq!(ctx.errno(), Some(Errno::MissingParameter));
        }

        #[test]
        fn test_invalid_parameter() {
            let ctx = Context::new();
            for params in [
                params("utm"),
                params("utm").set("zone", 61),
                params("utm").set("zone", 0),
                params("tmerc").set("k_0", 0),
                params("tmerc").set("lat_0", 91),
                params("tmerc").set("units", "furlong"),
                params("tmerc").set("to_meter", -1),
                params("tmerc").set("ellps", "mars"),
                params("tmerc").set("a", 1).set("rf", 0.5),
                params("pipeline"),
                params("hgridshift"),
            ] {
                assert!(Pj::new(&ctx, &params).is_err(), "{params:?}");
            }
        }
    }

    mod tests_ellipsoid {
        use super::*;

        #[test]
        fn test_named() {
            let actual = ellipsoid(&params("cart").set("ellps", "bessel")).unwrap();
            assert_eq!(actual, Ellipsoid::BESSEL);
            let actual = ellipsoid(&params("cart")).unwrap();
            assert_eq!(actual, Ellipsoid::GRS80);
        }

        #[test]
        fn test_shape() {
            let actual = ellipsoid(&params("cart").set("R", 6_371_000)).unwrap();
            assert!(actual.is_sphere());
            assert_eq!(actual.a, 6_371_000.0);

            let actual = ellipsoid(&params("cart").set("a", 6_378_137).set("rf", 298.257223563)).unwrap();
            assert!((actual.es - Ellipsoid::WGS84.es).abs() < 1e-15);

            // the shape of ellps is kept
            let actual = ellipsoid(&params("cart").set("ellps", "intl").set("a", 1000)).unwrap();
            assert_eq!(actual.a, 1000.0);
            assert!((actual.es - Ellipsoid::INTL.es).abs() < 1e-15);
        }

        #[test]
        fn test_inherit() {
            let actual = inherit_ellipsoid(&Ellipsoid::BESSEL, params("cart"));
            assert_eq!(ellipsoid(&actual).unwrap(), Ellipsoid::BESSEL);

            // defined one wins
            let actual = inherit_ellipsoid(&Ellipsoid::BESSEL, params("cart").set("ellps", "WGS84"));
            assert_eq!(ellipsoid(&actual).unwrap(), Ellipsoid::WGS84);
        }
    }

    mod tests_units {
        use super::*;

        #[test]
        fn test_to_meter() {
            assert_eq!(to_meter(&params("tmerc")).unwrap(), 1.0);
            assert_eq!(to_meter(&params("tmerc").set("units", "km")).unwrap(), 1000.0);
            assert_eq!(
                to_meter(&params("tmerc").set("units", "us-ft")).unwrap(),
                1200.0 / 3937.0
            );
            // to_meter wins
            assert_eq!(
                to_meter(&params("tmerc").set("units", "km").set("to_meter", 2)).unwrap(),
                2.0
            );
        }

        #[test]
        fn test_sides() {
            let ctx = Context::new();
            let pj = Pj::new(&ctx, &params("cart")).unwrap();
            assert_eq!((pj.left(), pj.right()), (IoUnits::Radians, IoUnits::Meters));

            let pj = Pj::new(&ctx, &params("cart").flag("inv")).unwrap();
            assert_eq!((pj.left(), pj.right()), (IoUnits::Meters, IoUnits::Radians));
            assert!(pj.is_inverted());
        }
    }

    mod tests_grid {
        use std::sync::{Arc, Mutex};

        use super::*;
        use crate::grid::test::{ctable2, gtx, MemoryFileApi};
        use crate::{Coord, LogLevel};

        const SHIFT_LAM: f32 = 1e-5;
        const SHIFT_PHI: f32 = 2e-5;

        /// geoid.gtx, N = 10 m on 130°E to 132°E and 30°N to 32°N;
        /// shift.ct2, a horizontal shift on the same area
        fn file_api() -> Arc<MemoryFileApi> {
            let shift: Vec<_> = (0..9)
                .map(|i| (SHIFT_LAM + 1e-6 * (i % 3) as f32, SHIFT_PHI + 1e-6 * (i / 3) as f32))
                .collect();
            let api = MemoryFileApi::default()
                .with(
                    "/grids/geoid.gtx",
                    gtx(30.0, 130.0, 1.0, 1.0, 3, 3, &[10.0; 9]),
                )
                .with(
                    "/grids/shift.ct2",
                    ctable2(
                        130f64.to_radians(),
                        30f64.to_radians(),
                        1f64.to_radians(),
                        1f64.to_radians(),
                        3,
                        3,
                        &shift,
                    ),
                );
            Arc::new(api)
        }

        fn context(api: &Arc<MemoryFileApi>) -> Context {
            let ctx = Context::new();
            ctx.set_file_api(api.clone());
            ctx.set_search_path(["/missing", "/grids"]);
            ctx
        }

        fn longlat(key: &str, value: &str) -> ParamList {
            params("longlat").set(key, value)
        }

        #[test]
        fn test_load_once() {
            let api = file_api();
            let ctx = context(&api);
            let a = Pj::new(&ctx, &longlat("geoidgrids", "geoid.gtx")).unwrap();
            let b = Pj::new(&ctx, &longlat("geoidgrids", "geoid.gtx")).unwrap();

            // lazy
            assert_eq!(api.opened(), 0);

            let coord = Coord::from_degrees(131.0, 31.0, 100.0, 0.0);
            assert!((a.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert!((b.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert!((a.inv4d(a.fwd4d(coord)).z() - 100.0).abs() < 1e-6);

            assert_eq!(api.opened(), 1);
            assert!(ctx.grid_cache().contains("geoid.gtx"));
            assert_eq!(ctx.grid_cache().len(), 1);

            // an independent context has its own cache
            let other = context(&api);
            let c = Pj::new(&other, &longlat("geoidgrids", "geoid.gtx")).unwrap();
            assert!((c.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert_eq!(api.opened(), 2);
        }

        #[test]
        fn test_fallthrough() {
            let api = file_api();
            let ctx = context(&api);
            let mut pj = Pj::new(&ctx, &params("longlat")).unwrap();

            assert_eq!(pj.hgrid_init("@missing.ct2,shift.ct2").unwrap(), 1);
            assert_eq!(ctx.errno(), None);

            let actual = pj.hgrid_value(&Lp::from_degrees(130.0, 30.0)).unwrap();
            assert!((actual.lam - f64::from(SHIFT_LAM)).abs() < 1e-12);
            assert!((actual.phi - f64::from(SHIFT_PHI)).abs() < 1e-12);
        }

        #[test]
        fn test_zero_grids() {
            let api = file_api();
            let ctx = context(&api);
            let mut pj = Pj::new(&ctx, &params("longlat")).unwrap();

            let err = pj.vgrid_init("@missing.gtx").unwrap_err();
            assert_eq!(err.errno(), Errno::FailedToLoadGrid);
            assert_eq!(ctx.errno(), Some(Errno::FailedToLoadGrid));

            // still usable, the optional grid passes through
            let coord = Coord::from_degrees(131.0, 31.0, 100.0, 0.0);
            assert_eq!(pj.fwd4d(coord), coord);
            assert_eq!(pj.vgrid_value(&coord.lp()), None);
        }

        #[test]
        fn test_mandatory_missing() {
            let api = file_api();
            let ctx = context(&api);
            let messages = Arc::new(Mutex::new(Vec::new()));
            let sink = messages.clone();
            ctx.set_logger(Some(Arc::new(move |level: LogLevel, msg: &str| {
                sink.lock().unwrap().push((level, msg.to_string()));
            })));

            let pj = Pj::new(&ctx, &longlat("nadgrids", "missing.ct2")).unwrap();
            let actual = pj.fwd4d(Coord::from_degrees(131.0, 31.0, 0.0, 0.0));
            assert!(actual.is_error());
            assert_eq!(ctx.errno(), Some(Errno::FailedToLoadGrid));

            let messages = messages.lock().unwrap();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].0, LogLevel::Error);
            assert!(messages[0].1.contains("missing.ct2"));
        }

        #[test]
        fn test_no_data() {
            let api = file_api();
            let ctx = context(&api);
            let outside = Coord::from_degrees(140.0, 40.0, 0.0, 0.0);

            let optional = Pj::new(&ctx, &longlat("nadgrids", "@shift.ct2")).unwrap();
            assert_eq!(optional.fwd4d(outside), outside);
            assert_eq!(optional.inv4d(outside), outside);
            assert_eq!(ctx.errno(), None);

            let mandatory = Pj::new(&ctx, &longlat("nadgrids", "shift.ct2")).unwrap();
            assert!(mandatory.fwd4d(outside).is_error());
            assert_eq!(ctx.errno(), Some(Errno::PointOutsideGrid));
            assert_eq!(
                mandatory.hgrid_apply(outside.lp(), Direction::Forward),
                Err(Errno::PointOutsideGrid)
            );
        }

        #[test]
        fn test_hgrid_round_trip() {
            let api = file_api();
            let ctx = context(&api);
            let pj = Pj::new(&ctx, &longlat("nadgrids", "shift.ct2")).unwrap();

            let origin = Coord::from_degrees(130.7, 31.2, 5.0, 0.0);
            let shifted = pj.fwd4d(origin);
            assert!(shifted.lon() > origin.lon());
            assert!(shifted.lat() > origin.lat());

            let actual = pj.inv4d(shifted);
            assert!((actual.lon() - origin.lon()).abs() < 1e-11);
            assert!((actual.lat() - origin.lat()).abs() < 1e-11);
            assert_eq!(actual.z(), 5.0);
        }

        #[test]
        fn test_file_api_not_retroactive() {
            let api = file_api();
            let ctx = context(&api);
            let coord = Coord::from_degrees(131.0, 31.0, 100.0, 0.0);

            let pj = Pj::new(&ctx, &longlat("geoidgrids", "geoid.gtx")).unwrap();
            assert!((pj.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert_eq!(api.opened(), 1);

            let empty = Arc::new(MemoryFileApi::default());
            ctx.set_file_api(empty.clone());

            // the loaded grid is still served
            let other = Pj::new(&ctx, &longlat("geoidgrids", "geoid.gtx")).unwrap();
            assert!((other.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert!(ctx.grid_cache().contains("geoid.gtx"));
            assert_eq!(api.opened(), 1);
            assert_eq!(empty.opened(), 0);

            // a new name goes to the new file access
            let shift = Pj::new(&ctx, &longlat("nadgrids", "shift.ct2")).unwrap();
            assert!(shift.fwd4d(coord).is_error());
            assert_eq!(ctx.errno(), Some(Errno::FailedToLoadGrid));
            assert_eq!(api.opened(), 1);
        }

        #[test]
        fn test_retry_after_failure() {
            let api = file_api();
            let ctx = context(&api);
            ctx.set_search_path(["/missing"]);
            let coord = Coord::from_degrees(131.0, 31.0, 100.0, 0.0);

            let pj = Pj::new(&ctx, &longlat("geoidgrids", "geoid.gtx")).unwrap();
            assert!(pj.fwd4d(coord).is_error());
            assert_eq!(ctx.errno(), Some(Errno::FailedToLoadGrid));

            ctx.set_search_path(["/grids"]);
            assert!((pj.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert_eq!(api.opened(), 1);
        }

        #[test]
        fn test_pipeline_set_context() {
            let api = file_api();
            let params = params("pipeline")
                .step(ParamList::new().set("proj", "longlat").set("geoidgrids", "geoid.gtx"));
            let coord = Coord::from_degrees(131.0, 31.0, 100.0, 0.0);

            let built = Context::new();
            let mut pj = Pj::new(&built, &params).unwrap();

            let ctx = context(&api);
            pj.set_context(&ctx);

            assert!((pj.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert_eq!(ctx.errno(), None);
            assert!(ctx.grid_cache().contains("geoid.gtx"));
            assert!(built.grid_cache().is_empty());
            assert_eq!(built.errno(), None);
            assert_eq!(api.opened(), 1);

            // and by inheritance
            let mut child = Pj::new(&built, &params).unwrap();
            pj.inherit_context(&mut child);
            assert!((child.fwd4d(coord).z() - 90.0).abs() < 1e-6);
            assert_eq!(api.opened(), 1);
        }

        #[test]
        fn test_gridshift_operations() {
            let api = file_api();
            let ctx = context(&api);
            let origin = Coord::from_degrees(131.5, 30.5, 100.0, 0.0);

            let hgridshift = Pj::new(&ctx, &params("hgridshift").set("grids", "shift.ct2")).unwrap();
            let nadgrids = Pj::new(&ctx, &longlat("nadgrids", "shift.ct2")).unwrap();
            assert_eq!(hgridshift.fwd4d(origin), nadgrids.fwd4d(origin));

            let vgridshift = Pj::new(&ctx, &params("vgridshift").set("grids", "geoid.gtx")).unwrap();
            assert!((vgridshift.fwd4d(origin).z() - 90.0).abs() < 1e-6);
            assert!((vgridshift.inv4d(origin).z() - 110.0).abs() < 1e-6);

            let vgridshift = Pj::new(
                &ctx,
                &params("vgridshift")
                    .set("grids", "geoid.gtx")
                    .set("multiplier", 1),
            )
            .unwrap();
            assert!((vgridshift.fwd4d(origin).z() - 110.0).abs() < 1e-6);

            // a missing mandatory grid fails the construction
            let err = Pj::new(&ctx, &params("hgridshift").set("grids", "missing.ct2")).unwrap_err();
            assert_eq!(err.errno(), Errno::FailedToLoadGrid);

            // all optional and missing is accepted
            assert!(Pj::new(&ctx, &params("hgridshift").set("grids", "@missing.ct2")).is_ok());
        }
    }

    mod tests_pipeline {
        use approx::assert_relative_eq;

        use super::*;
        use crate::Coord;

        #[test]
        fn test_round_trip() {
            let ctx = Context::new();
            let params = params("pipeline")
                .set("ellps", "bessel")
                .step(ParamList::new().set("proj", "cart"))
                .step(ParamList::new().set("proj", "cart").flag("inv"))
                .step(ParamList::new().set("proj", "utm").set("zone", 54));
            let pj = Pj::new(&ctx, &params).unwrap();
            assert_eq!((pj.left(), pj.right()), (IoUnits::Radians, IoUnits::Classic));

            let origin = Coord::from_degrees(140.0, 36.0, 10.0, 0.0);
            let utm = Pj::new(&ctx, &params_utm_bessel()).unwrap();
            let expected = utm.fwd4d(origin);

            let actual = pj.fwd4d(origin);
            assert_relative_eq!(actual.x(), expected.x(), epsilon = 1e-6);
            assert_relative_eq!(actual.y(), expected.y(), epsilon = 1e-6);
            assert_relative_eq!(actual.z(), 10.0, epsilon = 1e-6);

            let actual = pj.inv4d(actual);
            assert_relative_eq!(actual.lon(), origin.lon(), epsilon = 1e-10);
            assert_relative_eq!(actual.lat(), origin.lat(), epsilon = 1e-10);
        }

        fn params_utm_bessel() -> ParamList {
            params("utm").set("zone", 54).set("ellps", "bessel")
        }

        #[test]
        fn test_inverted() {
            let ctx = Context::new();
            let pj = Pj::new(
                &ctx,
                &params("pipeline")
                    .flag("inv")
                    .step(ParamList::new().set("proj", "cart")),
            )
            .unwrap();
            assert_eq!((pj.left(), pj.right()), (IoUnits::Meters, IoUnits::Radians));

            let cart = Pj::new(&ctx, &params("cart")).unwrap();
            let origin = Coord::from_degrees(140.0, 36.0, 10.0, 0.0);
            assert_eq!(pj.inv4d(origin), cart.fwd4d(origin));
        }

        #[test]
        fn test_step_failure() {
            let ctx = Context::new();
            let pj = Pj::new(
                &ctx,
                &params("pipeline")
                    .step(ParamList::new().set("proj", "longlat"))
                    .step(ParamList::new().set("proj", "merc")),
            )
            .unwrap();
            assert!(pj.fwd4d(Coord::xy(0.0, std::f64::consts::FRAC_PI_2)).is_error());
            assert_eq!(ctx.errno(), Some(Errno::ToleranceCondition));

            let err = Pj::new(
                &ctx,
                &params("pipeline").step(ParamList::new().set("proj", "lcc")),
            )
            .unwrap_err();
            assert_eq!(err.errno(), Errno::UnknownOperation);
        }
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pj>();
    }
}
