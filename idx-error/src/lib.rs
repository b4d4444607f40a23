#![deny(missing_docs)]

//! Error handling for the IDX dataset crates.
//!
//! Every fallible operation returns an [`IdxResult`]. Errors carry enough detail (the offending
//! value and the bound it violated) to render a precise message, and most variants capture a
//! [`Backtrace`] at the point of construction. Use the [`idx_err!`] and [`idx_bail!`] macros
//! rather than constructing variants by hand.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{fmt, io};

/// A string type that may be either static or owned.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

// Alias so `thiserror` does not auto-detect the field as a backtrace source, which would emit a
// `provide` impl requiring the unstable `error_generic_member_access` feature.
type Trace = Backtrace;

/// The top-level error type for the IDX crates.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum IdxError {
    /// The header bytes are unreadable or inconsistent with the file they describe.
    #[error("malformed header: {0}\nBacktrace:\n{1}")]
    MalformedHeader(ErrString, Trace),
    /// The header type tag is not one of the recognized data type codes.
    #[error("unknown data type code 0x{0:02X}\nBacktrace:\n{1}")]
    UnknownTypeCode(u8, Trace),
    /// A requested record window lies outside the file.
    #[error("{0}\nBacktrace:\n{1}")]
    Range(ErrString, Trace),
    /// A record ended before it reached the declared element size.
    #[error("truncated record: expected {expected} bytes, got {actual}")]
    TruncatedRecord {
        /// The declared element size in bytes.
        expected: usize,
        /// The number of bytes actually received.
        actual: usize,
    },
    /// An argument or option value was invalid.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Trace),
    /// Additional context attached to an inner error.
    #[error("{0}: {1}")]
    Context(ErrString, Box<IdxError>),
    /// The underlying byte source failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IdxError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        IdxError::Context(msg.into(), Box::new(self))
    }

    /// Returns the innermost error, skipping any [`IdxError::Context`] wrappers.
    pub fn root(&self) -> &IdxError {
        match self {
            IdxError::Context(_, inner) => inner.root(),
            other => other,
        }
    }
}

impl Debug for IdxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for results that return [`IdxError`]s as their error type.
pub type IdxResult<T> = Result<T, IdxError>;

/// A convenient macro for creating an [`IdxError`].
#[macro_export]
macro_rules! idx_err {
    (UnknownTypeCode: $code:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use($crate::IdxError::UnknownTypeCode($code, Backtrace::capture()))
    }};
    (TruncatedRecord: $expected:expr, $actual:expr) => {{
        $crate::__private::must_use($crate::IdxError::TruncatedRecord {
            expected: $expected,
            actual: $actual,
        })
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::IdxError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($variant:ident: $err:expr $(,)?) => {
        $crate::__private::must_use($crate::IdxError::$variant($err))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::idx_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning an [`IdxError`] from the enclosing function.
#[macro_export]
macro_rules! idx_bail {
    ($($tt:tt)+) => {
        return Err($crate::idx_err!($($tt)+))
    };
}

#[doc(hidden)]
pub mod __private {
    use crate::IdxError;

    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use(error: IdxError) -> IdxError {
        error
    }
}
