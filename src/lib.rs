//! # gridtrans
//!
//! Coordinate transformation context and gridded correction engine.
//!
//! A [`Context`] is an isolated execution scope,
//! it holds the error state, the log level and sink, the grid search path,
//! the file access ([`FileApi`]) and the grid cache.
//! A transformation object [`Pj`] is made under a context
//! from an already parsed definition [`ParamList`],
//! and transforms four-dimensional [`Coord`]s in either [`Direction`].
//!
//! ```
//! use gridtrans::{Context, Coord, Direction, ParamList, Pj};
//!
//! let ctx = Context::new();
//! let pj = Pj::new(
//!     &ctx,
//!     &ParamList::new()
//!         .set("proj", "utm")
//!         .set("zone", 32)
//!         .set("ellps", "GRS80"),
//! )?;
//!
//! // longitude and latitude in radians
//! let origin = Coord::from_degrees(12.0, 55.0, 0.0, 0.0);
//!
//! let projected = pj.trans(Direction::Forward, origin);
//! assert!((projected.x() - 691_875.632).abs() < 1e-3);
//! assert!((projected.y() - 6_098_907.825).abs() < 1e-3);
//!
//! let result = pj.trans(Direction::Inverse, projected);
//! assert!((result.to_degrees().lon() - 12.0).abs() < 1e-9);
//! assert!((result.to_degrees().lat() - 55.0).abs() < 1e-9);
//! # Ok::<(), gridtrans::Error>(())
//! ```
//!
//! A failed transformation returns the error sentinel [`Coord::error()`]
//! and sets the error code on the context, it never panics.
//!
//! ```
//! use gridtrans::{Context, Coord, Errno, ParamList, Pj};
//!
//! let ctx = Context::new();
//! let pj = Pj::new(&ctx, &ParamList::new().set("proj", "merc"))?;
//!
//! let result = pj.fwd4d(Coord::from_degrees(0.0, 90.0, 0.0, 0.0));
//! assert!(result.is_error());
//! assert_eq!(ctx.errno(), Some(Errno::ToleranceCondition));
//! # Ok::<(), gridtrans::Error>(())
//! ```
//!
//! Features:
//!
//! - Contexts sharing nothing, no process-wide state
//! - Per-context logging by a [`Logger`] sink, or to [`tracing`] by [`TracingLogger`]
//! - Horizontal and vertical correction grids, loaded at most once per context
//!   - The par files of GIAJ ([TKY2JGD], [PatchJGD], [PatchJGD(H)], [HyokoRev], [SemiDynaEXE]
//!     and [POS2JGD]), GTX and CTable2
//!   - The optional grid by `@` prefix, e.g. `@optional.gtx,mandatory.gtx`
//! - Built-in operations `longlat`, `noop`, `tmerc`, `utm`, `merc`, `cart`,
//!   `hgridshift`, `vgridshift` and `pipeline`,
//!   and user operations by [`OperationRegistry`]
//!
//! [TKY2JGD]: https://www.gsi.go.jp/sokuchikijun/tky2jgd.html
//! [PatchJGD]: https://vldb.gsi.go.jp/sokuchi/surveycalc/patchjgd/index.html
//! [PatchJGD(H)]: https://vldb.gsi.go.jp/sokuchi/surveycalc/patchjgd_h/index.html
//! [HyokoRev]: https://vldb.gsi.go.jp/sokuchi/surveycalc/hyokorev/hyokorev.html
//! [SemiDynaEXE]: https://vldb.gsi.go.jp/sokuchi/surveycalc/semidyna/web/index.html
//! [POS2JGD]: https://positions.gsi.go.jp/cdcs
//!
//! This package does not contain grid files.
//!
//! # Grids
//!
//! The definition keys `nadgrids` and `geoidgrids`,
//! or [`Pj::hgrid_init`] and [`Pj::vgrid_init`] give a grid list.
//! A name is looked up in each directory of [`Context::search_path`] in order,
//! then relative to the working directory.
//!
//! ```no_run
//! use gridtrans::{Context, Coord, ParamList, Pj};
//!
//! let ctx = Context::new();
//! ctx.add_search_path("/usr/share/gridtrans");
//!
//! let pj = Pj::new(
//!     &ctx,
//!     &ParamList::new()
//!         .set("proj", "longlat")
//!         .set("nadgrids", "@SemiDyna2023.par"),
//! )?;
//!
//! let result = pj.fwd4d(Coord::from_degrees(135.0, 35.0, 0.0, 0.0));
//! # Ok::<(), gridtrans::Error>(())
//! ```
//!
//! # Serialization and Deserialization
//!
//! It supports (de)serialization by [`serde` crate](https://crates.io/crates/serde)
//! for the plain data types, e.g. [`Coord`] and [`Ellipsoid`],
//! only if the feature `serde` is enabled.
//!
//! ```
//! # #[cfg(feature = "serde")]
//! # fn main() -> serde_json::Result<()> {
//! use gridtrans::Coord;
//!
//! let coord = Coord::new(1.0, 2.0, 3.0, 4.0);
//! let json = serde_json::to_string(&coord)?;
//! assert_eq!(json, r#"{"v":[1.0,2.0,3.0,4.0]}"#);
//!
//! let result: Coord = serde_json::from_str(&json)?;
//! assert_eq!(result, coord);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serde"))]
//! # fn main() {}
//! ```

#[doc(inline)]
pub use context::Context;
#[doc(inline)]
pub use coord::{Coord, Direction, IoUnits, Lp};
#[doc(inline)]
pub use ellipsoid::Ellipsoid;
#[doc(inline)]
pub use error::{Errno, Error, ErrorCategory, ErrorKind, Result};
#[doc(inline)]
pub use fileapi::{FileApi, StdFileApi};
#[doc(inline)]
pub use grid::{Grid, GridCache, LoadGridError};
#[doc(inline)]
pub use log::{LogLevel, Logger, TracingLogger};
#[doc(inline)]
pub use operation::OperationRegistry;
#[doc(inline)]
pub use param::ParamList;
#[doc(inline)]
pub use pj::Pj;

pub mod api;
pub mod context;
mod coord;
mod ellipsoid;
pub mod error;
mod fileapi;
pub mod grid;
pub mod log;
pub mod operation;
mod param;
mod pj;
pub mod utils;
mod vector;
