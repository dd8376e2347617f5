//! Provides [`Context`], the execution scope of transformations.
use std::env;
use std::ffi::OsStr;
use std::fmt::{Arguments, Debug, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::grid::{self, Grid, GridCache, LoadGridError};
use crate::{log_error, log_trace, Errno, FileApi, LogLevel, Logger, Result, StdFileApi};

/// The environment variable of the search path.
pub const ENV_DATA: &str = "GRIDTRANS_DATA";
/// The environment variable of the log level.
pub const ENV_LOG: &str = "GRIDTRANS_LOG";

struct State {
    level: LogLevel,
    logger: Option<Arc<dyn Logger>>,
    errno: Option<Errno>,
    search_path: Vec<String>,
    file_api: Arc<dyn FileApi>,
}

struct Inner {
    state: RwLock<State>,
    grids: GridCache,
}

/// An isolated execution scope,
/// holding the error state, the log level and sink, the search path,
/// the file access and the grid cache.
///
/// [`Context`] is a handle; clones share the same state,
/// and every object made under it refers to it.
/// Independent contexts share nothing.
///
/// # Example
///
/// ```
/// # use gridtrans::{Context, Errno, LogLevel};
/// #
/// let ctx = Context::new();
/// assert_eq!(ctx.errno(), None);
///
/// let other = ctx.clone();
/// other.set_error(Errno::PointOutsideGrid);
/// assert_eq!(ctx.errno(), Some(Errno::PointOutsideGrid));
///
/// // independent context
/// let independent = Context::new();
/// assert_eq!(independent.errno(), None);
///
/// assert_eq!(ctx.set_log_level(LogLevel::Debug), LogLevel::Error);
/// assert_eq!(independent.log_level(), LogLevel::Error);
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Makes a [`Context`], log level [`LogLevel::Error`], empty search path,
    /// [`StdFileApi`], empty grid cache and no error.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(State {
                    level: LogLevel::default(),
                    logger: None,
                    errno: None,
                    search_path: Vec::new(),
                    file_api: Arc::new(StdFileApi),
                }),
                grids: GridCache::new(),
            }),
        }
    }

    /// Makes a [`Context`] configured by the environment variables.
    ///
    /// The search path is read from `GRIDTRANS_DATA` in the platform path list syntax,
    /// and the log level from `GRIDTRANS_LOG`, a name or a number, see [`LogLevel`].
    /// An invalid level is ignored with an error log.
    pub fn from_env() -> Self {
        let ctx = Self::new();
        let log = env::var(ENV_LOG).ok();
        ctx.configure(env::var_os(ENV_DATA).as_deref(), log.as_deref());
        ctx
    }

    fn configure(&self, data: Option<&OsStr>, log: Option<&str>) {
        if let Some(data) = data {
            self.set_search_path(
                env::split_paths(data)
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| p.to_string_lossy().into_owned()),
            );
        }

        if let Some(log) = log {
            match log.parse::<LogLevel>() {
                Ok(level) => {
                    self.set_log_level(level);
                }
                Err(_) => log_error!(self, "invalid {ENV_LOG}: {log}"),
            }
        }
    }

    /// Returns `true` if `self` and `other` are the same context.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    //
    // Error state
    //

    /// Sets the current error, `proj_context_errno_set`.
    ///
    /// This overwrites a previous error.
    #[inline]
    pub fn set_error(&self, errno: Errno) {
        self.inner.state.write().errno = Some(errno);
    }

    /// Returns the current error.
    #[inline]
    pub fn errno(&self) -> Option<Errno> {
        self.inner.state.read().errno
    }

    /// Clears the current error.
    #[inline]
    pub fn reset_error(&self) {
        self.inner.state.write().errno = None;
    }

    //
    // Logging
    //

    /// Sets the log level and returns the previous one, `proj_log_level`.
    #[inline]
    pub fn set_log_level(&self, level: LogLevel) -> LogLevel {
        std::mem::replace(&mut self.inner.state.write().level, level)
    }

    /// Sets the log level by the integer value, 0 to 4.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] of [`Errno::InvalidArgument`] when `level` is out of range,
    /// in that case the level is unchanged and the error is set on the context.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::{Context, Errno, LogLevel};
    /// #
    /// let ctx = Context::new();
    /// assert_eq!(ctx.set_log_level_raw(3)?, LogLevel::Error);
    ///
    /// assert!(ctx.set_log_level_raw(9).is_err());
    /// assert_eq!(ctx.log_level(), LogLevel::Trace);
    /// assert_eq!(ctx.errno(), Some(Errno::InvalidArgument));
    /// # Ok::<(), gridtrans::Error>(())
    /// ```
    pub fn set_log_level_raw(&self, level: i32) -> Result<LogLevel> {
        match LogLevel::try_from(level) {
            Ok(level) => Ok(self.set_log_level(level)),
            Err(errno) => {
                self.set_error(errno);
                Err(errno.into())
            }
        }
    }

    /// Returns the log level.
    #[inline]
    pub fn log_level(&self) -> LogLevel {
        self.inner.state.read().level
    }

    /// Replaces the log sink, `proj_log_func`.
    ///
    /// [`None`] disables output without changing the level.
    #[inline]
    pub fn set_logger(&self, logger: Option<Arc<dyn Logger>>) {
        self.inner.state.write().logger = logger;
    }

    /// Delivers a message of `level` to the sink if the level passes.
    ///
    /// `args` is formatted only when delivered.
    /// Use [`log_error!`](crate::log_error), [`log_debug!`](crate::log_debug)
    /// and [`log_trace!`](crate::log_trace).
    pub fn log(&self, level: LogLevel, args: Arguments) {
        if level == LogLevel::None {
            return;
        }

        let logger = {
            let state = self.inner.state.read();
            if state.level < level {
                return;
            }
            match state.logger {
                Some(ref logger) => logger.clone(),
                None => return,
            }
        };

        let message = match args.as_str() {
            Some(s) => s.to_string(),
            None => args.to_string(),
        };
        logger.log(level, &message);
    }

    //
    // Search path and file access
    //

    /// Returns a copy of the search path, `proj_get_searchpath`.
    #[inline]
    pub fn search_path(&self) -> Vec<String> {
        self.inner.state.read().search_path.clone()
    }

    /// Returns the number of the search path entries, `proj_get_path_count`.
    #[inline]
    pub fn path_count(&self) -> usize {
        self.inner.state.read().search_path.len()
    }

    /// Replaces the search path.
    pub fn set_search_path<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.state.write().search_path = paths.into_iter().map(Into::into).collect();
    }

    /// Appends a directory to the search path.
    pub fn add_search_path(&self, path: impl Into<String>) {
        self.inner.state.write().search_path.push(path.into());
    }

    /// Replaces the file access, `proj_fileapi_set`.
    ///
    /// This affects later loads only, cached grids are kept.
    pub fn set_file_api(&self, file_api: Arc<dyn FileApi>) {
        self.inner.state.write().file_api = file_api;
    }

    /// Returns the grid cache.
    #[inline]
    pub fn grid_cache(&self) -> &GridCache {
        &self.inner.grids
    }

    /// Returns the grid of the canonical `name`, loading it at the first request.
    pub(crate) fn load_grid(&self, name: &str) -> std::result::Result<Arc<Grid>, LoadGridError> {
        let (search_path, file_api) = {
            let state = self.inner.state.read();
            (state.search_path.clone(), state.file_api.clone())
        };

        self.inner.grids.get_or_load(name, || {
            let (path, grid) = grid::load(name, &search_path, file_api.as_ref())?;
            log_trace!(self, "loaded grid {name} from {}", path.display());
            Ok(grid)
        })
    }
}

impl Default for Context {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Context")
            .field("level", &state.level)
            .field("errno", &state.errno)
            .field("search_path", &state.search_path)
            .field("file_api", &state.file_api)
            .finish_non_exhaustive()
    }
}
