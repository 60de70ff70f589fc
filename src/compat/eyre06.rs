//! Conversion of [`eyre::Report`] values.
//!
//! This module specifically supports `eyre` version 0.6.x. To enable it, add
//! the `compat-eyre06` feature flag to your `Cargo.toml`.
//!
//! ```
//! use debugpage::{collect_chain, compat::IntoThrowable};
//! use eyre::WrapErr;
//!
//! fn connect() -> eyre::Result<()> {
//!     Err(std::io::Error::other("connection reset")).wrap_err("failed to reach the database")
//! }
//!
//! let error = connect().into_throwable().unwrap_err();
//! let chain = collect_chain(&error);
//! assert_eq!(chain.outermost().message, "failed to reach the database");
//! assert_eq!(chain.records()[1].message, "connection reset");
//! ```
//!
//! [`eyre::Report`]: ::eyre::Report

use super::{IntoThrowable, std_error::FALLBACK_CLASS_NAME};
use crate::throwable::CapturedError;

impl IntoThrowable for eyre::Report {
    type Output = CapturedError;

    #[track_caller]
    fn into_throwable(self) -> Self::Output {
        let mut captured = CapturedError::from_error(&*self);
        if captured.class_name == FALLBACK_CLASS_NAME {
            captured.class_name = "eyre::Report".to_owned();
        }
        captured
    }
}
