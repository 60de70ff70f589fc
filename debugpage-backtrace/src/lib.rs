#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Native stack backtraces as frames of a debugpage error.
//!
//! A [`CapturedError`] snapshot of a Rust error has a message and a location,
//! but no call stack. This crate walks the current thread's stack and turns
//! every resolved symbol into a [`RawFrame`], so the rendered page shows a
//! stack trace with code windows for each frame.
//!
//! # Quick Start
//!
//! ```rust
//! use debugpage::CapturedError;
//! use debugpage_backtrace::BacktraceExt;
//!
//! fn lookup(id: u32) -> Result<String, CapturedError> {
//!     Err(CapturedError::new("LookupError", format!("no user {id}")).at(file!(), line!()))
//! }
//!
//! let error = lookup(7).attach_backtrace().unwrap_err();
//! let page = debugpage::render(&error);
//! assert!(page.contains("no user 7"));
//! ```
//!
//! # Symbols
//!
//! A demangled symbol such as `app::billing::Invoice::total` is split at its
//! last top-level `::`: the path before it becomes the frame's class, `::`
//! its call operator and `total` its function. Generic arguments and trait
//! qualifications stay part of the class, so
//! `<alloc::vec::Vec<T> as core::ops::Drop>::drop` becomes the function
//! `drop` in the class `<alloc::vec::Vec<T> as core::ops::Drop>`.
//!
//! # Filtering
//!
//! Stacks of real programs are dominated by frames from the standard library
//! and the runtime. A [`BacktraceFilter`] drops the frames of the capturing
//! machinery at the top, collapses runs of frames from noisy crates in the
//! middle into a single placeholder frame, and trims runtime frames at the
//! bottom.
//!
//! # Environment Variables
//!
//! - `RUST_BACKTRACE=full` - Disables all filtering
//! - `DEBUGPAGE_BACKTRACE` - Comma-separated options:
//!   - `full` - Disables all filtering, like `RUST_BACKTRACE=full`
//!   - `max=N` - Keeps at most `N` frames

use std::sync::OnceLock;

use backtrace::BytesOrWideString;
use debugpage::{CapturedError, RawFrame};

/// A captured and filtered stack backtrace.
///
/// ```rust
/// use debugpage_backtrace::{Backtrace, BacktraceFilter};
///
/// if let Some(backtrace) = Backtrace::capture(&BacktraceFilter::DEFAULT) {
///     println!("Captured {} frames", backtrace.frames.len());
/// }
/// ```
#[derive(Debug)]
pub struct Backtrace {
    /// The frames, ordered from most recent to oldest.
    pub frames: Vec<RawFrame>,
    /// Total number of frames that were omitted due to filtering.
    pub total_omitted_frames: usize,
}

#[derive(Debug)]
enum BacktraceEntry {
    Frame(Frame),
    OmittedFrames {
        count: usize,
        skipped_crate: &'static str,
    },
}

#[derive(Debug)]
struct Frame {
    sym_demangled: String,
    frame_path: FramePath,
    lineno: Option<u32>,
}

/// File path information for a stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePath {
    /// The raw file path from the debug information.
    pub raw_path: String,
    /// The crate name if detected from the path.
    pub crate_name: Option<String>,
}

/// The parts of a demangled symbol, as shown in a stack trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolParts<'a> {
    /// Everything before the last top-level `::`, if there is one.
    pub class_name: Option<&'a str>,
    /// The function itself.
    pub function_name: &'a str,
}

/// Splits a demangled symbol at its last top-level `::`.
///
/// ```rust
/// use debugpage_backtrace::split_symbol;
///
/// let parts = split_symbol("app::billing::Invoice::total");
/// assert_eq!(parts.class_name, Some("app::billing::Invoice"));
/// assert_eq!(parts.function_name, "total");
///
/// assert_eq!(split_symbol("main").class_name, None);
/// ```
pub fn split_symbol(symbol: &str) -> SymbolParts<'_> {
    let mut split_at = None;
    let mut angle_nesting_level = 0u64;
    let mut curly_nesting_level = 0u64;
    let mut potential_function_arrow = false;
    let mut previous_colon = None;

    for (i, c) in symbol.char_indices() {
        let was_potential_function_arrow = potential_function_arrow;
        potential_function_arrow = c == '-';

        if c == '<' {
            angle_nesting_level = angle_nesting_level.saturating_add(1);
        } else if c == '>' && !was_potential_function_arrow {
            angle_nesting_level = angle_nesting_level.saturating_sub(1);
        } else if c == '{' {
            curly_nesting_level = curly_nesting_level.saturating_add(1);
        } else if c == '}' {
            curly_nesting_level = curly_nesting_level.saturating_sub(1);
        }

        if c == ':' && angle_nesting_level == 0 && curly_nesting_level == 0 {
            if previous_colon == Some(i.wrapping_sub(1)) {
                split_at = Some(i - 1);
                previous_colon = None;
            } else {
                previous_colon = Some(i);
            }
        } else {
            previous_colon = None;
        }
    }

    match split_at {
        Some(at) if at > 0 && starts_function_name(&symbol[at + 2..]) => SymbolParts {
            class_name: Some(&symbol[..at]),
            function_name: &symbol[at + 2..],
        },
        _ => SymbolParts {
            class_name: None,
            function_name: symbol,
        },
    }
}

fn starts_function_name(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c == '{' || c == '_' || unicode_ident::is_xid_start(c))
}

/// Configuration for filtering frames from certain crates in a backtrace.
///
/// # Examples
///
/// ```rust
/// use debugpage_backtrace::BacktraceFilter;
///
/// let filter = BacktraceFilter {
///     skipped_initial_crates: &["backtrace"],
///     skipped_middle_crates: &["tokio"],
///     skipped_final_crates: &["std"],
///     max_entry_count: 10,
/// };
/// ```
#[derive(Copy, Clone, Debug)]
pub struct BacktraceFilter {
    /// Set of crate names whose frames should be hidden when they appear
    /// at the beginning of a backtrace.
    pub skipped_initial_crates: &'static [&'static str],
    /// Set of crate names whose runs of frames are collapsed when they
    /// appear in the middle of a backtrace.
    pub skipped_middle_crates: &'static [&'static str],
    /// Set of crate names whose frames should be hidden when they appear
    /// at the end of a backtrace.
    pub skipped_final_crates: &'static [&'static str],
    /// Maximum number of frames to include in the backtrace.
    pub max_entry_count: usize,
}

impl BacktraceFilter {
    /// Default backtrace filter settings.
    pub const DEFAULT: Self = Self {
        skipped_initial_crates: &["backtrace", OWN_CRATE_NAME, "core", "std", "alloc"],
        skipped_middle_crates: &["std", "core", "alloc", "tokio"],
        skipped_final_crates: &["std", "core", "alloc", "tokio"],
        max_entry_count: 20,
    };

    /// A filter that keeps every frame.
    pub const UNFILTERED: Self = Self {
        skipped_initial_crates: &[],
        skipped_middle_crates: &[],
        skipped_final_crates: &[],
        max_entry_count: usize::MAX,
    };

    /// Creates a filter from the `RUST_BACKTRACE` and `DEBUGPAGE_BACKTRACE`
    /// environment variables.
    ///
    /// Without either variable the [default](Self::DEFAULT) filter is used.
    /// `RUST_BACKTRACE=full` or the `full` option turn filtering off, and
    /// `max=N` limits the number of frames kept.
    pub fn new_from_env() -> Self {
        let env_options = EnvOptions::get();
        let base = if env_options.full {
            Self::UNFILTERED
        } else {
            Self::DEFAULT
        };
        Self {
            max_entry_count: env_options.max_entry_count.unwrap_or(base.max_entry_count),
            ..base
        }
    }
}

impl Default for BacktraceFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, PartialEq, Eq)]
struct EnvOptions {
    full: bool,
    max_entry_count: Option<usize>,
}

impl EnvOptions {
    fn get() -> &'static Self {
        static DEBUGPAGE_FLAGS: OnceLock<EnvOptions> = OnceLock::new();

        DEBUGPAGE_FLAGS.get_or_init(|| {
            let rust_backtrace = std::env::var_os("RUST_BACKTRACE");
            let debugpage_backtrace = std::env::var_os("DEBUGPAGE_BACKTRACE");
            Self::parse(
                rust_backtrace.as_deref().map(|v| v.to_string_lossy()).as_deref(),
                debugpage_backtrace.as_deref().map(|v| v.to_string_lossy()).as_deref(),
            )
        })
    }

    fn parse(rust_backtrace: Option<&str>, debugpage_backtrace: Option<&str>) -> Self {
        let mut options = EnvOptions {
            full: rust_backtrace == Some("full"),
            max_entry_count: None,
        };
        for v in debugpage_backtrace.into_iter().flat_map(|var| var.split(',')) {
            let v = v.trim();
            if v.eq_ignore_ascii_case("full") {
                options.full = true;
            } else if let Some(max) = v.strip_prefix("max=")
                && let Ok(max) = max.parse()
            {
                options.max_entry_count = Some(max);
            }
        }
        options
    }
}

const OWN_CRATE_NAME: &str = env!("CARGO_PKG_NAME");

impl Backtrace {
    /// Captures the current stack backtrace, applying the filter.
    ///
    /// Returns `None` if no frame could be resolved.
    pub fn capture(filter: &BacktraceFilter) -> Option<Self> {
        let mut initial_filtering = !filter.skipped_initial_crates.is_empty();
        let mut entries: Vec<BacktraceEntry> = Vec::new();
        let mut total_omitted_frames = 0;

        let mut delayed_omitted_frame: Option<Frame> = None;
        let mut currently_omitted_crate_name: Option<&'static str> = None;
        let mut currently_omitted_frames = 0;

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                // Frames without symbol names or filenames cannot be shown.
                let (Some(sym), Some(filename_raw)) = (symbol.name(), symbol.filename_raw()) else {
                    return;
                };

                if entries.len() >= filter.max_entry_count {
                    total_omitted_frames += 1;
                    return;
                }

                let frame_path = FramePath::new(filename_raw);

                if initial_filtering {
                    if let Some(cur_crate_name) = &frame_path.crate_name
                        && filter.skipped_initial_crates.contains(&cur_crate_name.as_str())
                    {
                        total_omitted_frames += 1;
                        return;
                    } else {
                        initial_filtering = false;
                    }
                }

                if let Some(cur_crate_name) = &frame_path.crate_name
                    && let Some(currently_omitted_crate_name) = &currently_omitted_crate_name
                    && cur_crate_name == currently_omitted_crate_name
                {
                    delayed_omitted_frame = None;
                    currently_omitted_frames += 1;
                    total_omitted_frames += 1;
                    return;
                }

                if let Some(currently_omitted_crate_name) = currently_omitted_crate_name.take() {
                    if let Some(delayed_frame) = delayed_omitted_frame.take() {
                        // A single frame is shown instead of its placeholder.
                        total_omitted_frames -= 1;
                        entries.push(BacktraceEntry::Frame(delayed_frame));
                    } else {
                        entries.push(BacktraceEntry::OmittedFrames {
                            count: currently_omitted_frames,
                            skipped_crate: currently_omitted_crate_name,
                        });
                    }
                    currently_omitted_frames = 0;
                }

                let frame = Frame {
                    sym_demangled: format!("{sym:#}"),
                    frame_path,
                    lineno: symbol.lineno(),
                };

                if let Some(cur_crate_name) = &frame.frame_path.crate_name
                    && let Some(skipped_crate) = filter
                        .skipped_middle_crates
                        .iter()
                        .find(|&crate_name| crate_name == cur_crate_name)
                {
                    currently_omitted_crate_name = Some(skipped_crate);
                    currently_omitted_frames = 1;
                    total_omitted_frames += 1;
                    delayed_omitted_frame = Some(frame);
                    return;
                }

                entries.push(BacktraceEntry::Frame(frame));
            });

            true
        });

        if let Some(currently_omitted_crate_name) = currently_omitted_crate_name.take() {
            if let Some(delayed_frame) = delayed_omitted_frame.take() {
                total_omitted_frames -= 1;
                entries.push(BacktraceEntry::Frame(delayed_frame));
            } else {
                entries.push(BacktraceEntry::OmittedFrames {
                    count: currently_omitted_frames,
                    skipped_crate: currently_omitted_crate_name,
                });
            }
        }

        total_omitted_frames += trim_final_entries(&mut entries, filter);

        if entries.is_empty() && total_omitted_frames == 0 {
            None
        } else {
            Some(Self {
                frames: entries.into_iter().map(BacktraceEntry::into_raw_frame).collect(),
                total_omitted_frames,
            })
        }
    }
}

/// Pops runtime frames off the end of `entries`, returning how many frames
/// were removed.
fn trim_final_entries(entries: &mut Vec<BacktraceEntry>, filter: &BacktraceFilter) -> usize {
    let mut omitted = 0;
    while let Some(last) = entries.last() {
        match last {
            BacktraceEntry::Frame(frame) => {
                let skip = frame
                    .frame_path
                    .crate_name
                    .as_deref()
                    .is_some_and(|crate_name| filter.skipped_final_crates.contains(&crate_name))
                    || (!filter.skipped_final_crates.is_empty()
                        && (frame.sym_demangled == "__libc_start_call_main"
                            || frame.sym_demangled == "__libc_start_main_impl"));
                if !skip {
                    break;
                }
                omitted += 1;
            }
            BacktraceEntry::OmittedFrames {
                skipped_crate,
                count,
            } => {
                if !filter.skipped_final_crates.contains(skipped_crate) {
                    break;
                }
                omitted += count;
            }
        }
        entries.pop();
    }
    omitted
}

impl BacktraceEntry {
    fn into_raw_frame(self) -> RawFrame {
        match self {
            BacktraceEntry::Frame(frame) => {
                let parts = split_symbol(&frame.sym_demangled);
                let mut raw = RawFrame::new(parts.function_name);
                if let Some(class_name) = parts.class_name {
                    raw = raw.in_class(class_name, "::");
                }
                raw.file = Some(frame.frame_path.raw_path);
                raw.line = frame.lineno;
                raw
            }
            BacktraceEntry::OmittedFrames {
                count,
                skipped_crate,
            } => RawFrame::new(format!("{{{count} frames from {skipped_crate}}}")),
        }
    }
}

impl FramePath {
    fn new(path: BytesOrWideString<'_>) -> Self {
        Self::from_path_str(&path.to_str_lossy())
    }

    /// Detects the crate a source file belongs to from its path.
    ///
    /// Standard library sources and crates from the Cargo registry are
    /// recognized, as are the sources of this crate.
    ///
    /// ```rust
    /// use debugpage_backtrace::FramePath;
    ///
    /// let path = FramePath::from_path_str(
    ///     "/home/me/.cargo/registry/src/index.crates.io-1949cf8c6b5b557f/tokio-1.48.0/src/runtime/park.rs",
    /// );
    /// assert_eq!(path.crate_name.as_deref(), Some("tokio"));
    /// ```
    pub fn from_path_str(path_str: &str) -> Self {
        static REGEXES: OnceLock<[regex::Regex; 2]> = OnceLock::new();
        let [std_regex, registry_regex] = REGEXES.get_or_init(|| {
            [
                // Matches Rust standard library paths:
                // - /lib/rustlib/src/rust/library/{std|core|alloc}/src/...
                // - /rustc/{40-char-hash}/library/{std|core|alloc}/src/...
                regex::Regex::new(
                    r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc)/src/.*$",
                )
                .expect("built-in regex pattern for std library paths should be valid"),
                // Matches Cargo registry paths:
                // - /.cargo/registry/src/{index}-{16-char-hash}/{crate}-{version}/src/...
                regex::Regex::new(
                    r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/.*$",
                )
                .expect("built-in regex pattern for cargo registry paths should be valid"),
            ]
        });

        let crate_name = std_regex
            .captures(path_str)
            .or_else(|| registry_regex.captures(path_str))
            .and_then(|captures| captures.get(1))
            .map(|crate_capture| crate_capture.as_str().to_owned())
            .or_else(|| is_own_source(path_str).then(|| OWN_CRATE_NAME.to_owned()));

        Self {
            raw_path: path_str.to_owned(),
            crate_name,
        }
    }
}

fn is_own_source(path_str: &str) -> bool {
    let normalized = path_str.replace('\\', "/");
    normalized.contains(concat!(env!("CARGO_PKG_NAME"), "/src/"))
}

/// Extension trait for attaching backtraces to captured errors.
///
/// The frames replace those of the outermost error; its causes keep theirs.
///
/// ```rust
/// use debugpage::{CapturedError, Throwable};
/// use debugpage_backtrace::{BacktraceExt, BacktraceFilter};
///
/// let error = CapturedError::new("IoError", "disk full").attach_backtrace_with_filter(&BacktraceFilter {
///     max_entry_count: 50,
///     ..BacktraceFilter::UNFILTERED
/// });
/// assert!(error.frames().len() <= 50);
/// ```
pub trait BacktraceExt: Sized {
    /// Attaches a captured backtrace using the filter from the environment.
    fn attach_backtrace(self) -> Self {
        self.attach_backtrace_with_filter(&BacktraceFilter::new_from_env())
    }

    /// Attaches a captured backtrace using the specified filter.
    fn attach_backtrace_with_filter(self, filter: &BacktraceFilter) -> Self;
}

impl BacktraceExt for CapturedError {
    fn attach_backtrace_with_filter(self, filter: &BacktraceFilter) -> Self {
        match Backtrace::capture(filter) {
            Some(backtrace) => self.with_frames(backtrace.frames),
            None => self,
        }
    }
}

impl<V> BacktraceExt for Result<V, CapturedError> {
    fn attach_backtrace_with_filter(self, filter: &BacktraceFilter) -> Self {
        match self {
            Ok(v) => Ok(v),
            Err(error) => Err(error.attach_backtrace_with_filter(filter)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_symbol() {
        let parts = split_symbol("app::billing::Invoice::total");
        assert_eq!(parts.class_name, Some("app::billing::Invoice"));
        assert_eq!(parts.function_name, "total");

        let parts = split_symbol("<alloc::vec::Vec<T> as core::ops::drop::Drop>::drop");
        assert_eq!(
            parts.class_name,
            Some("<alloc::vec::Vec<T> as core::ops::drop::Drop>")
        );
        assert_eq!(parts.function_name, "drop");

        let parts = split_symbol("app::main::{{closure}}");
        assert_eq!(parts.class_name, Some("app::main"));
        assert_eq!(parts.function_name, "{{closure}}");

        let parts = split_symbol("core::ops::function::FnOnce::call_once<fn() -> u8, ()>");
        assert_eq!(parts.class_name, Some("core::ops::function::FnOnce"));
        assert_eq!(parts.function_name, "call_once<fn() -> u8, ()>");
    }

    #[test]
    fn test_split_symbol_without_path() {
        for symbol in ["main", "_start", "<T as Trait>", "::leading", ""] {
            let parts = split_symbol(symbol);
            assert_eq!(parts.class_name, None, "{symbol}");
            assert_eq!(parts.function_name, symbol);
        }
    }

    #[test]
    fn test_frame_path_crate_detection() {
        let cases = [
            (
                "/rustc/ed61e7d7e242494fb7057f2657300d9e77bb4fcb/library/core/src/ops/function.rs",
                Some("core"),
            ),
            (
                "/home/me/.rustup/toolchains/stable/lib/rustlib/src/rust/library/std/src/rt.rs",
                Some("std"),
            ),
            (
                "/home/me/.cargo/registry/src/index.crates.io-1949cf8c6b5b557f/backtrace-0.3.76/src/backtrace/mod.rs",
                Some("backtrace"),
            ),
            (
                "/build/debugpage-backtrace/src/lib.rs",
                Some(OWN_CRATE_NAME),
            ),
            ("/build/app/src/main.rs", None),
        ];
        for (path, expected) in cases {
            let frame_path = FramePath::from_path_str(path);
            assert_eq!(frame_path.crate_name.as_deref(), expected, "{path}");
            assert_eq!(frame_path.raw_path, path);
        }
    }

    #[test]
    fn test_env_options() {
        assert_eq!(
            EnvOptions::parse(None, None),
            EnvOptions {
                full: false,
                max_entry_count: None
            }
        );
        assert!(EnvOptions::parse(Some("full"), None).full);
        assert!(!EnvOptions::parse(Some("1"), None).full);
        assert_eq!(
            EnvOptions::parse(None, Some("FULL, max=5")),
            EnvOptions {
                full: true,
                max_entry_count: Some(5)
            }
        );
        assert_eq!(EnvOptions::parse(None, Some("max=lots")).max_entry_count, None);
    }

    #[test]
    fn test_trim_final_entries() {
        let frame = |sym: &str, crate_name: Option<&str>| {
            BacktraceEntry::Frame(Frame {
                sym_demangled: sym.to_owned(),
                frame_path: FramePath {
                    raw_path: String::new(),
                    crate_name: crate_name.map(str::to_owned),
                },
                lineno: None,
            })
        };
        let mut entries = vec![
            frame("app::main", None),
            BacktraceEntry::OmittedFrames {
                count: 4,
                skipped_crate: "std",
            },
            frame("std::rt::lang_start", Some("std")),
            frame("__libc_start_main_impl", None),
        ];
        let omitted = trim_final_entries(&mut entries, &BacktraceFilter::DEFAULT);
        assert_eq!(omitted, 6);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_omitted_frames_placeholder() {
        let raw = BacktraceEntry::OmittedFrames {
            count: 3,
            skipped_crate: "tokio",
        }
        .into_raw_frame();
        assert_eq!(raw.function_name.as_deref(), Some("{3 frames from tokio}"));
        assert_eq!(raw.file, None);
    }

    #[test]
    fn test_capture_respects_max_entry_count() {
        let filter = BacktraceFilter {
            max_entry_count: 2,
            ..BacktraceFilter::UNFILTERED
        };
        if let Some(backtrace) = Backtrace::capture(&filter) {
            assert!(backtrace.frames.len() <= 2);
        }
    }

    #[test]
    fn test_attach_backtrace_on_result() {
        let ok: Result<u8, CapturedError> = Ok(1);
        assert_eq!(ok.attach_backtrace(), Ok(1));

        let err: Result<u8, CapturedError> = Err(CapturedError::new("E", "m"));
        let error = err
            .attach_backtrace_with_filter(&BacktraceFilter::UNFILTERED)
            .expect_err("error stays an error");
        assert_eq!(error.message, "m");
    }

    #[test]
    fn test_types_send_sync() {
        static_assertions::assert_impl_all!(Backtrace: Send, Sync);
        static_assertions::assert_impl_all!(BacktraceFilter: Send, Sync, Copy);
    }
}
