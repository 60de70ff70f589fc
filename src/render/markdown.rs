//! Plain-text Markdown rendition of an error record.
//!
//! This is what "Copy All" puts on the clipboard. It is generated from the
//! record directly, independently of the HTML markup, and contains no
//! escaping of any kind.

use core::fmt;

use crate::{
    config::PageConfig,
    record::{ErrorRecord, FrameRecord},
    window::{CodeWindow, code_window},
};

const ERROR_MARKER: &str = " // <-- ERROR HERE";

/// Displays an [`ErrorRecord`] as Markdown.
///
/// ```
/// use debugpage::{CapturedError, PageConfig, collect_chain, render::MarkdownRendition};
///
/// let chain = collect_chain(&CapturedError::new("ParseError", "bad <input>").at("/app/main.rs", 3));
/// let text = MarkdownRendition::new(chain.outermost(), &PageConfig::DEFAULT).to_string();
/// assert!(text.starts_with("## ParseError\n\n"));
/// assert!(text.contains("> bad <input>"));
/// assert!(text.contains("**Location:** `/app/main.rs:3`"));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct MarkdownRendition<'a> {
    record: &'a ErrorRecord,
    config: &'a PageConfig,
    cycle_target: Option<usize>,
}

impl<'a> MarkdownRendition<'a> {
    /// Creates the rendition of `record`.
    pub fn new(record: &'a ErrorRecord, config: &'a PageConfig) -> Self {
        Self {
            record,
            config,
            cycle_target: None,
        }
    }

    /// Notes that the cause chain was cut off after this record because its
    /// cause was the record at `position`.
    #[must_use]
    pub fn with_cycle_target(mut self, position: Option<usize>) -> Self {
        self.cycle_target = position;
        self
    }
}

impl fmt::Display for MarkdownRendition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        write!(f, "## {}\n\n", record.class_name)?;
        if record.code > 0 {
            write!(f, "**Code:** `{}`\n\n", record.code)?;
        }

        f.write_str("**Message:**\n")?;
        for line in record.message.split('\n') {
            writeln!(f, "> {}", line.strip_suffix('\r').unwrap_or(line))?;
        }
        f.write_str("\n")?;

        write!(f, "**Location:** `{}:{}`\n\n", record.file, record.line)?;

        let window = code_window(&record.file, record.line, self.config.text_snippet_radius);
        if !window.is_empty() {
            writeln!(f, "**Code Snippet:**\n```{}", self.config.snippet_language)?;
            write!(f, "{}", PlainSnippet(&window))?;
            f.write_str("```\n\n")?;
        }

        write!(f, "**Stack Trace:**\n```\n{}\n```\n", TraceText(&record.frames))?;

        if let Some(position) = self.cycle_target {
            write!(
                f,
                "\n_Cause chain truncated: the next cause is error {} again._\n",
                position + 1
            )?;
        }
        Ok(())
    }
}

/// Displays a code window as numbered plain text lines.
///
/// Each line is formatted as `"%4d | text"`, and the highlighted line is
/// followed by an error marker.
#[derive(Copy, Clone, Debug)]
pub struct PlainSnippet<'a>(pub &'a CodeWindow);

impl fmt::Display for PlainSnippet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.0.lines {
            writeln!(
                f,
                "{:>4} | {}{}",
                line.number,
                line.text,
                if line.highlighted { ERROR_MARKER } else { "" }
            )?;
        }
        Ok(())
    }
}

/// Displays frames as a classic numbered trace listing.
///
/// ```text
/// #0 /app/src/calc.rs(10): app::Calculator::divide(1, 0)
/// #1 [internal function]: main()
/// #2 {main}
/// ```
#[derive(Copy, Clone, Debug)]
pub struct TraceText<'a>(pub &'a [FrameRecord]);

impl fmt::Display for TraceText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.0 {
            write!(f, "#{} ", frame.index)?;
            match &frame.file {
                Some(file) => write!(f, "{file}({})", frame.line)?,
                None => f.write_str(frame.display_file())?,
            }
            writeln!(
                f,
                ": {}({})",
                frame.qualified_function(),
                frame.argument_preview()
            )?;
        }
        write!(f, "#{} {{main}}", self.0.len())
    }
}
