#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Renders unhandled errors as self-contained HTML diagnostic pages.
//!
//! ## Overview
//!
//! When an error escapes all the way to the top of a request, a developer
//! wants to see more than a status code. This crate turns such an error into
//! a single HTML document showing the error, every error that caused it, the
//! source lines around each error location and the recorded stack frames.
//! Every section of the page has a copy button, and "Copy All" puts a
//! Markdown rendition of an error on the clipboard, ready to be pasted into
//! an issue or a chat.
//!
//! The page is fully self-contained: stylesheet and script are inlined, and
//! nothing is fetched when it is opened.
//!
//! ## Quick Example
//!
//! ```
//! use debugpage::{CapturedError, RawFrame};
//!
//! let error = CapturedError::new("ArithmeticError", "Division by zero")
//!     .at("/app/src/calc.rs", 10)
//!     .with_frames(vec![RawFrame::new("divide").at("/app/src/calc.rs", 10)]);
//!
//! let page: String = debugpage::render(&error);
//! assert!(page.contains("Division by zero"));
//! ```
//!
//! ## Core Concepts
//!
//! Rendering is a pipeline of three steps:
//!
//! 1. [`collect_chain`] walks an error and its causes into a [`Chain`] of
//!    [`ErrorRecord`]s, outermost error first. Every object is visited at
//!    most once, so even a cause chain that loops back on itself terminates.
//! 2. [`code_window`] reads the lines around an error location, and
//!    [`extract_frame`] turns the raw, possibly incomplete, call-site data of
//!    a stack entry into a [`FrameRecord`].
//! 3. [`render::HtmlPage`] writes the document, one block per record. Every
//!    section is addressed by an id derived from a [`SectionId`], which only
//!    depends on the error's content, so identical errors render identical
//!    pages.
//!
//! Errors enter the pipeline through the [`Throwable`] trait. Implement it
//! for your own error types, or snapshot any [`std::error::Error`] into a
//! [`CapturedError`] with the adapters in [`compat`].
//!
//! ## Handlers
//!
//! [`DebugExceptionHandler`] wraps the pipeline for use inside a framework:
//! it tells the [`Host`] to send the response status and to log the error
//! before rendering the page. See the [`handler`] module.
//!
//! ## Ecosystem
//!
//! - **[`debugpage-backtrace`]** - Captures native Rust backtraces as stack
//!   frames for a [`CapturedError`].
//!
//! [`debugpage-backtrace`]: https://docs.rs/debugpage-backtrace
//!
//! ## Feature Flags
//!
//! - `compat-anyhow1` - Adapter for `anyhow::Error`.
//! - `compat-eyre06` - Adapter for `eyre::Report`.

pub mod chain;
pub mod compat;
pub mod config;
mod escape;
pub mod handler;
pub mod record;
pub mod render;
pub mod section_id;
pub mod throwable;
pub mod window;

pub use self::{
    chain::{Chain, collect_chain},
    config::PageConfig,
    handler::{DebugExceptionHandler, ExceptionHandler, Host, LogContext, TracingHost},
    record::{ErrorRecord, FrameKind, FrameRecord, extract_frame},
    section_id::SectionId,
    throwable::{ArgValue, CapturedError, RawFrame, Throwable},
    window::{CodeLine, CodeWindow, code_window},
};

/// Renders `error` and its causes as an HTML page with the default
/// configuration.
pub fn render(error: &dyn Throwable) -> String {
    render_with(error, &PageConfig::DEFAULT)
}

/// Renders `error` and its causes as an HTML page.
pub fn render_with(error: &dyn Throwable, config: &PageConfig) -> String {
    let chain = collect_chain(error);
    render::HtmlPage::new(&chain, config).to_string()
}
