//! Snapshots of [`std::error::Error`] values and their sources.
//!
//! ```
//! use debugpage::{CapturedError, Throwable};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("could not load settings")]
//! struct SettingsError(#[source] std::io::Error);
//!
//! let error = SettingsError(std::io::Error::other("permission denied"));
//! let captured = CapturedError::capture(&error);
//!
//! assert!(captured.class_name.ends_with("SettingsError"));
//! assert_eq!(captured.previous().unwrap().message(), "permission denied");
//! ```

use std::{error::Error, io, panic::Location};

use super::IntoThrowable;
use crate::{chain::Visited, throwable::CapturedError};

pub(crate) const FALLBACK_CLASS_NAME: &str = "Error";
const IO_ERROR_CLASS_NAME: &str = "std::io::Error";

impl CapturedError {
    /// Snapshots `error` and its sources, naming the outermost error after
    /// its type and locating it at the caller.
    #[track_caller]
    pub fn capture<E: Error + 'static>(error: &E) -> Self {
        let mut captured = Self::from_error(error);
        captured.class_name = core::any::type_name::<E>().to_owned();
        captured
    }

    /// Snapshots a type-erased `error` and its sources, locating the
    /// outermost error at the caller.
    ///
    /// The concrete type of a `dyn Error` is unknown, so class names are read
    /// from the leading identifier of each error's `Debug` output, falling
    /// back to `Error`.
    #[track_caller]
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let location = Location::caller();
        let mut captured = snapshot_chain(error);
        captured.file = location.file().to_owned();
        captured.line = location.line();
        captured
    }
}

fn snapshot_chain(error: &(dyn Error + 'static)) -> CapturedError {
    let mut visited: Visited<'_, dyn Error> = Visited::default();
    let mut errors: Vec<CapturedError> = Vec::new();
    let mut current = Some(error);
    while let Some(error) = current {
        if let Some(position) = visited.get(error) {
            tracing::warn!(
                chain_length = errors.len(),
                cycle_target = position,
                "error source chain refers back to itself, truncating snapshot"
            );
            let len = errors.len();
            if let Some(last) = errors.last_mut() {
                last.repeated_cause = Some(len - 1 - position);
            }
            break;
        }
        visited.insert(error, errors.len());
        errors.push(snapshot_one(error));
        current = error.source();
    }

    let mut previous: Option<CapturedError> = None;
    while let Some(mut error) = errors.pop() {
        if let Some(previous) = previous.take() {
            error.previous = Some(Box::new(previous));
        }
        previous = Some(error);
    }
    previous.unwrap_or_default()
}

fn snapshot_one(error: &(dyn Error + 'static)) -> CapturedError {
    CapturedError::new(class_name_of(error), error.to_string())
}

/// Names a type-erased error.
///
/// `io::Error` is recognized by type, since its `Debug` output starts with
/// the variant name. Other errors are named by [`class_name_from_debug`].
pub(crate) fn class_name_of(error: &(dyn Error + 'static)) -> String {
    if error.is::<io::Error>() {
        IO_ERROR_CLASS_NAME.to_owned()
    } else {
        class_name_from_debug(error)
    }
}

/// Reads a type name from the start of the `Debug` output of `error`.
///
/// `ParseIntError { kind: InvalidDigit }` yields `ParseIntError`, while
/// outputs that do not start with an identifier yield the fallback name.
pub(crate) fn class_name_from_debug(error: &dyn Error) -> String {
    let debug = format!("{error:?}");
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    let name = name.trim_end_matches(':');
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        FALLBACK_CLASS_NAME.to_owned()
    } else {
        name.to_owned()
    }
}

impl IntoThrowable for Box<dyn Error + Send + Sync> {
    type Output = CapturedError;

    #[track_caller]
    fn into_throwable(self) -> Self::Output {
        CapturedError::from_error(&*self)
    }
}

impl IntoThrowable for Box<dyn Error> {
    type Output = CapturedError;

    #[track_caller]
    fn into_throwable(self) -> Self::Output {
        CapturedError::from_error(&*self)
    }
}
