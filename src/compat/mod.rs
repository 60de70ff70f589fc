//! Adapters from the error types of the Rust ecosystem.
//!
//! # Overview
//!
//! The renderer reads errors through [`Throwable`](crate::Throwable). Rust
//! errors carry a message and a chain of sources, but no location, code or
//! frames of their own, so the adapters in this module snapshot them into
//! [`CapturedError`]s:
//!
//! - [`std_error`] - any [`std::error::Error`], following its `source()`
//!   chain
//! - `anyhow1` - [`anyhow::Error`] (requires the `compat-anyhow1` feature
//!   flag)
//! - `eyre06` - [`eyre::Report`] (requires the `compat-eyre06` feature flag)
//!
//! The outermost error of a snapshot is located at the place the conversion
//! was called from. Frames can be added afterwards, for example with the
//! `debugpage-backtrace` crate.
//!
//! # Example
//!
//! ```
//! use debugpage::compat::IntoThrowable;
//!
//! fn parse_port(raw: &str) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
//!     Ok(raw.parse::<u16>()?)
//! }
//!
//! let error = parse_port("http").into_throwable().unwrap_err();
//! let page = debugpage::render(&error);
//! assert!(page.contains("invalid digit found in string"));
//! ```
//!
//! [`anyhow::Error`]: https://docs.rs/anyhow/1/anyhow/struct.Error.html
//! [`eyre::Report`]: https://docs.rs/eyre/0.6/eyre/struct.Report.html

#[cfg(feature = "compat-anyhow1")]
pub mod anyhow1;
#[cfg(feature = "compat-eyre06")]
pub mod eyre06;
pub mod std_error;

use crate::throwable::CapturedError;

/// A trait for converting external errors into [`CapturedError`]s.
///
/// The trait is implemented both for error values, producing a
/// [`CapturedError`], and for `Result`s, producing a
/// `Result<T, CapturedError>`.
///
/// # Implementations
///
/// - `Box<dyn Error + Send + Sync>` and `Box<dyn Error>` in [`std_error`]
/// - `anyhow::Error` and `anyhow::Result<T>` in `anyhow1`
/// - `eyre::Report` and `eyre::Result<T>` in `eyre06`
pub trait IntoThrowable {
    /// The type produced by the conversion.
    type Output;

    /// Converts `self`, locating the outermost error at the caller.
    #[track_caller]
    fn into_throwable(self) -> Self::Output;
}

impl<T, E: IntoThrowable<Output = CapturedError>> IntoThrowable for Result<T, E> {
    type Output = Result<T, CapturedError>;

    #[track_caller]
    fn into_throwable(self) -> Self::Output {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(error.into_throwable()),
        }
    }
}
