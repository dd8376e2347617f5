//! Provides [`LogLevel`], [`Logger`] and the logging macros.
//!
//! Every [`Context`](crate::Context) carries its own level and sink;
//! there is no process-wide logger.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use gridtrans::{log_debug, Context, LogLevel};
//!
//! let ctx = Context::new();
//! let messages = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = messages.clone();
//! ctx.set_logger(Some(Arc::new(move |level: LogLevel, msg: &str| {
//!     sink.lock().unwrap().push((level, msg.to_string()));
//! })));
//!
//! // Gated by the default level, Error
//! log_debug!(ctx, "not delivered: {}", 1);
//! assert!(messages.lock().unwrap().is_empty());
//!
//! ctx.set_log_level(LogLevel::Debug);
//! log_debug!(ctx, "delivered: {}", 2);
//! assert_eq!(
//!     messages.lock().unwrap().as_slice(),
//!     &[(LogLevel::Debug, "delivered: 2".to_string())]
//! );
//! ```
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Errno;

/// Log severity, totally ordered.
///
/// A message is delivered when its severity is less than or equal to the current level.
///
/// # Example
///
/// ```
/// # use gridtrans::LogLevel;
/// #
/// assert!(LogLevel::None < LogLevel::Error);
/// assert!(LogLevel::Trace < LogLevel::Tell);
/// assert_eq!(LogLevel::try_from(2), Ok(LogLevel::Debug));
/// assert!(LogLevel::try_from(5).is_err());
/// ```
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LogLevel {
    None = 0,
    #[default]
    Error = 1,
    Debug = 2,
    Trace = 3,
    Tell = 4,
}

impl LogLevel {
    /// Returns the integer value, 0 to 4.
    #[inline]
    pub const fn as_i32(&self) -> i32 {
        *self as i32
    }
}

impl TryFrom<i32> for LogLevel {
    type Error = Errno;

    fn try_from(value: i32) -> Result<Self, Errno> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Error),
            2 => Ok(Self::Debug),
            3 => Ok(Self::Trace),
            4 => Ok(Self::Tell),
            _ => Err(Errno::InvalidArgument),
        }
    }
}

impl FromStr for LogLevel {
    type Err = Errno;

    /// Accepts a name (case-insensitive) or a number 0 to 4.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            "tell" => Ok(Self::Tell),
            other => other
                .parse::<i32>()
                .map_err(|_| Errno::InvalidArgument)
                .and_then(Self::try_from),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Error => "error",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Tell => "tell",
        };
        f.write_str(s)
    }
}

/// A log sink.
///
/// Any `Fn(LogLevel, &str)` closure which is `Send + Sync` is a [`Logger`].
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

impl<F> Logger for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    #[inline]
    fn log(&self, level: LogLevel, message: &str) {
        self(level, message)
    }
}

impl Debug for dyn Logger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Logger")
    }
}

/// A [`Logger`] forwarding to the [`tracing`] crate.
///
/// [`LogLevel::Error`] maps to `ERROR`, [`LogLevel::Debug`] to `DEBUG`,
/// and [`LogLevel::Trace`] and [`LogLevel::Tell`] to `TRACE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::None => {}
            LogLevel::Error => tracing::error!(target: "gridtrans", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "gridtrans", "{message}"),
            LogLevel::Trace | LogLevel::Tell => tracing::trace!(target: "gridtrans", "{message}"),
        }
    }
}

/// Logs at [`LogLevel::Error`] on a [`Context`](crate::Context).
///
/// The arguments are formatted only when the level passes.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => {
        $ctx.log($crate::LogLevel::Error, format_args!($($arg)+))
    };
}

/// Logs at [`LogLevel::Debug`] on a [`Context`](crate::Context).
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => {
        $ctx.log($crate::LogLevel::Debug, format_args!($($arg)+))
    };
}

/// Logs at [`LogLevel::Trace`] on a [`Context`](crate::Context).
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => {
        $ctx.log($crate::LogLevel::Trace, format_args!($($arg)+))
    };
}
