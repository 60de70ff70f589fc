//! Exception handlers and the host they report to.
//!
//! An [`ExceptionHandler`] turns an error into a page. The
//! [`DebugExceptionHandler`] additionally drives the [`Host`] the page is
//! rendered for: it asks the host to emit the response status and to log the
//! error before rendering, the same order a web framework's debug handler
//! follows.
//!
//! ```
//! use debugpage::{CapturedError, DebugExceptionHandler, TracingHost};
//!
//! let error = CapturedError::new("NotFound", "no route for /admin").with_code(404);
//! let page = DebugExceptionHandler::default().handle(&error, &mut TracingHost::new());
//! assert!(page.contains("no route for /admin"));
//! ```

use core::fmt;

use crate::{
    chain::collect_chain,
    config::PageConfig,
    render::HtmlPage,
    throwable::Throwable,
};

/// Renders errors as documents.
pub trait ExceptionHandler {
    /// Renders `error` and its causes.
    fn render(&self, error: &dyn Throwable) -> String;
}

/// The context an error is reported in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogContext {
    /// The error ended a web request.
    Web,
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogContext::Web => "web",
        })
    }
}

/// The environment a page is rendered for.
///
/// Both calls are fire-and-forget: the handler neither waits for nor reacts
/// to their outcome.
pub trait Host {
    /// Emits the response status for `error`.
    fn send_status_headers(&mut self, error: &dyn Throwable);

    /// Records `error` in the host's log.
    fn write_log_entries(&mut self, error: &dyn Throwable, context: LogContext);
}

/// A [`Host`] that logs through [`tracing`] and has no status line to send.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingHost;

impl TracingHost {
    /// Creates the host.
    pub fn new() -> Self {
        Self
    }
}

impl Host for TracingHost {
    fn send_status_headers(&mut self, error: &dyn Throwable) {
        tracing::trace!(class = %error.class_name(), "no status line to send");
    }

    fn write_log_entries(&mut self, error: &dyn Throwable, context: LogContext) {
        tracing::error!(
            class = %error.class_name(),
            code = error.code(),
            file = %error.file(),
            line = error.line(),
            %context,
            "{}",
            error.message()
        );
    }
}

/// The handler rendering full diagnostic pages.
#[derive(Copy, Clone, Debug, Default)]
pub struct DebugExceptionHandler {
    /// Settings for every rendered page.
    pub config: PageConfig,
}

impl DebugExceptionHandler {
    /// Creates a handler with the given configuration.
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    /// Reports `error` to the host and renders its page.
    ///
    /// The host is asked to send the status headers first, then to write its
    /// log entries, and only then is the page rendered.
    pub fn handle(&self, error: &dyn Throwable, host: &mut dyn Host) -> String {
        host.send_status_headers(error);
        host.write_log_entries(error, LogContext::Web);
        self.render(error)
    }
}

impl ExceptionHandler for DebugExceptionHandler {
    fn render(&self, error: &dyn Throwable) -> String {
        let chain = collect_chain(error);
        HtmlPage::new(&chain, &self.config).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throwable::CapturedError;

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<String>,
    }

    impl Host for RecordingHost {
        fn send_status_headers(&mut self, error: &dyn Throwable) {
            self.calls.push(format!("status:{}", error.code()));
        }

        fn write_log_entries(&mut self, error: &dyn Throwable, context: LogContext) {
            self.calls.push(format!("log:{context}:{}", error.message()));
        }
    }

    #[test]
    fn test_handle_calls_host_in_order() {
        let mut host = RecordingHost::default();
        let error = CapturedError::new("E", "boom").with_code(500);
        let page = DebugExceptionHandler::default().handle(&error, &mut host);
        assert_eq!(host.calls, ["status:500", "log:web:boom"]);
        assert!(page.contains("boom"));
    }

    #[test]
    fn test_handler_is_object_safe() {
        let handler: &dyn ExceptionHandler = &DebugExceptionHandler::new(PageConfig {
            title: "Custom <title>",
            ..PageConfig::DEFAULT
        });
        let page = handler.render(&CapturedError::new("E", "m"));
        assert!(page.contains("<title>Custom &lt;title&gt;</title>"));
    }

    #[test]
    fn test_tracing_host_never_fails() {
        let mut host = TracingHost::new();
        let error = CapturedError::new("E", "m");
        host.send_status_headers(&error);
        host.write_log_entries(&error, LogContext::Web);
    }

    #[test]
    fn test_handler_send_sync() {
        static_assertions::assert_impl_all!(DebugExceptionHandler: Send, Sync, Copy);
        static_assertions::assert_obj_safe!(ExceptionHandler, Host);
    }
}
