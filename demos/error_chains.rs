//! Rendering an error together with the errors that caused it.
//!
//! Every error of the cause chain gets its own block on the page, outermost
//! first. Standard library errors are snapshotted with the adapters from
//! [`debugpage::compat`].

use std::{env, fs, io};

use debugpage::{CapturedError, compat::IntoThrowable, render};

#[derive(Debug, thiserror::Error)]
#[error("failed to load user configuration")]
struct ConfigError {
    #[source]
    source: io::Error,
}

fn read_config(path: &str) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError { source })
}

/// A std error chain, snapshotted at the call site.
fn startup() -> Result<String, CapturedError> {
    read_config("/nonexistent/config.toml").map_err(|e| CapturedError::capture(&e))
}

/// A boxed error, converted with `IntoThrowable`.
fn parse_port(raw: &str) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
    Ok(raw.parse::<u16>()?)
}

fn write_page(name: &str, page: &str) {
    let path = env::temp_dir().join(name);
    match fs::write(&path, page) {
        Ok(()) => println!("Wrote {}", path.display()),
        Err(e) => println!("Could not write {}: {e}", path.display()),
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Error Chains ===\n");

    // Example 1: two errors, the io error is the cause
    if let Err(error) = startup() {
        let wrapped = CapturedError::new("StartupError", "Application startup failed")
            .at(file!(), line!())
            .caused_by(error);
        write_page("debugpage-chain.html", &render(&wrapped));
    }

    // Example 2: a boxed error without a known type
    if let Err(error) = parse_port("http").into_throwable() {
        write_page("debugpage-boxed.html", &render(&error));
    }
}
