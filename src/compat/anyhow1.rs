//! Conversion of [`anyhow::Error`] values.
//!
//! This module specifically supports `anyhow` version 1.x. To enable it, add
//! the `compat-anyhow1` feature flag to your `Cargo.toml`.
//!
//! Every layer of the anyhow error, context layers included, becomes one
//! record of the rendered chain:
//!
//! ```
//! use anyhow::Context;
//! use debugpage::{collect_chain, compat::IntoThrowable};
//!
//! fn load() -> anyhow::Result<String> {
//!     std::fs::read_to_string("/no/such/config.toml").context("failed to load config")
//! }
//!
//! let error = load().into_throwable().unwrap_err();
//! let chain = collect_chain(&error);
//! assert_eq!(chain.outermost().class_name, "anyhow::Error");
//! assert_eq!(chain.outermost().message, "failed to load config");
//! assert_eq!(chain.len(), 2);
//! ```
//!
//! [`anyhow::Error`]: ::anyhow::Error

use super::{IntoThrowable, std_error::FALLBACK_CLASS_NAME};
use crate::throwable::CapturedError;

impl IntoThrowable for anyhow::Error {
    type Output = CapturedError;

    #[track_caller]
    fn into_throwable(self) -> Self::Output {
        let mut captured = CapturedError::from_error(&*self);
        if captured.class_name == FALLBACK_CLASS_NAME {
            captured.class_name = "anyhow::Error".to_owned();
        }
        captured
    }
}
