//! Provides [`Errno`], [`Error`] etc.
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::LoadGridError;

/// Alias for a `Result<T, gridtrans::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The error code stored on a [`Context`](crate::Context).
///
/// Codes shared with the classic projection library keep their numbers,
/// see [`Errno::code`].
///
/// # Example
///
/// ```
/// # use gridtrans::{Errno, ErrorCategory};
/// #
/// assert_eq!(Errno::PointOutsideGrid.code(), -48);
/// assert_eq!(Errno::from_code(-48), Some(Errno::PointOutsideGrid));
/// assert_eq!(Errno::PointOutsideGrid.category(), ErrorCategory::NoData);
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Errno {
    /// Latitude or longitude is out of the domain of the operation.
    LatOrLonExceedLimit,
    /// An iterative inverse did not converge.
    NonConvergent,
    /// The coordinate hits a singularity or a tolerance condition.
    ToleranceCondition,
    /// A required grid could not be located or loaded.
    FailedToLoadGrid,
    /// The point is not within any available grid.
    PointOutsideGrid,
    /// An invalid argument, e.g. a log level out of range.
    InvalidArgument,
    /// A required definition parameter is missing.
    MissingParameter,
    /// The operation name is not registered.
    UnknownOperation,
    /// The ellipsoid name is not known.
    UnknownEllipsoid,
    /// The operation has no inverse.
    NoInverseOperation,
}

/// The class of failure an [`Errno`] belongs to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorCategory {
    /// The input is outside the valid domain of the operation.
    InvalidDomain,
    /// A required grid is missing.
    GridUnavailable,
    /// The point falls outside the grids.
    NoData,
    /// The object or the context is misconfigured.
    Misconfiguration,
}

impl Errno {
    const ALL: [Self; 10] = [
        Self::LatOrLonExceedLimit,
        Self::NonConvergent,
        Self::ToleranceCondition,
        Self::FailedToLoadGrid,
        Self::PointOutsideGrid,
        Self::InvalidArgument,
        Self::MissingParameter,
        Self::UnknownOperation,
        Self::UnknownEllipsoid,
        Self::NoInverseOperation,
    ];

    /// Returns the integer code.
    #[inline]
    pub const fn code(&self) -> i32 {
        match self {
            Self::LatOrLonExceedLimit => -14,
            Self::NonConvergent => -17,
            Self::ToleranceCondition => -20,
            Self::FailedToLoadGrid => -38,
            Self::PointOutsideGrid => -48,
            Self::InvalidArgument => -1001,
            Self::MissingParameter => -1002,
            Self::UnknownOperation => -1003,
            Self::UnknownEllipsoid => -1004,
            Self::NoInverseOperation => -1005,
        }
    }

    /// Makes an [`Errno`] from the integer code, [`None`] if unknown.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Returns the category.
    #[inline]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::LatOrLonExceedLimit | Self::NonConvergent | Self::ToleranceCondition => {
                ErrorCategory::InvalidDomain
            }
            Self::FailedToLoadGrid => ErrorCategory::GridUnavailable,
            Self::PointOutsideGrid => ErrorCategory::NoData,
            Self::InvalidArgument
            | Self::MissingParameter
            | Self::UnknownOperation
            | Self::UnknownEllipsoid
            | Self::NoInverseOperation => ErrorCategory::Misconfiguration,
        }
    }

    /// Returns a short description.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::LatOrLonExceedLimit => "latitude or longitude exceeded limits",
            Self::NonConvergent => "non-convergent inverse",
            Self::ToleranceCondition => "tolerance condition error",
            Self::FailedToLoadGrid => "failed to load grid",
            Self::PointOutsideGrid => "point not within available grids",
            Self::InvalidArgument => "invalid argument",
            Self::MissingParameter => "missing parameter",
            Self::UnknownOperation => "unknown operation",
            Self::UnknownEllipsoid => "unknown ellipsoid",
            Self::NoInverseOperation => "operation has no inverse",
        }
    }
}

impl Display for Errno {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl StdError for Errno {}

/// Represents all possible errors that can occur by this crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// An error kind used by [`Error`].
#[derive(Debug)]
pub enum ErrorKind {
    /// A failure carrying only a code.
    Errno(Errno),
    /// A definition parameter has an unusable value.
    InvalidParameter {
        /// The parameter key
        key: String,
        /// The offending value
        value: String,
    },
    /// A required definition parameter is missing.
    MissingParameter {
        /// The parameter key
        key: String,
    },
    /// A grid could not be loaded.
    LoadGrid(LoadGridError),
}

impl Error {
    #[cold]
    pub(crate) fn new_invalid_parameter(key: &str, value: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidParameter {
                key: key.to_string(),
                value: value.into(),
            },
        }
    }

    #[cold]
    pub(crate) fn new_missing_parameter(key: &str) -> Self {
        Self {
            kind: ErrorKind::MissingParameter {
                key: key.to_string(),
            },
        }
    }

    /// Returns the detailed cause.
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the code corresponding to this error.
    ///
    /// # Example
    ///
    /// ```
    /// # use gridtrans::{Errno, Error};
    /// #
    /// let err = Error::from(Errno::NonConvergent);
    /// assert_eq!(err.errno(), Errno::NonConvergent);
    /// ```
    pub fn errno(&self) -> Errno {
        match &self.kind {
            ErrorKind::Errno(errno) => *errno,
            ErrorKind::InvalidParameter { .. } => Errno::InvalidArgument,
            ErrorKind::MissingParameter { .. } => Errno::MissingParameter,
            ErrorKind::LoadGrid(_) => Errno::FailedToLoadGrid,
        }
    }
}

impl From<Errno> for Error {
    #[inline]
    fn from(value: Errno) -> Self {
        Self {
            kind: ErrorKind::Errno(value),
        }
    }
}

impl From<LoadGridError> for Error {
    #[inline]
    fn from(value: LoadGridError) -> Self {
        Self {
            kind: ErrorKind::LoadGrid(value),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::LoadGrid(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Errno(errno) => write!(f, "{errno}"),
            ErrorKind::InvalidParameter { key, value } => {
                write!(f, "invalid parameter: {key}={value}")
            }
            ErrorKind::MissingParameter { key } => write!(f, "missing parameter: {key}"),
            ErrorKind::LoadGrid(e) => write!(f, "{e}"),
        }
    }
}
