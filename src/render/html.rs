//! HTML markup of a single error block.

use core::fmt;

use super::{assets::copy_icon, markdown::MarkdownRendition};
use crate::{
    config::PageConfig,
    escape::{Html, HtmlLines, Text},
    record::{ErrorRecord, FrameRecord},
    section_id::SectionId,
    window::{CodeWindow, code_window},
};

/// Displays one [`ErrorRecord`] as a self-contained HTML block.
///
/// The block holds the header with the "Copy All" control, the message,
/// location, code snippet and stack trace sections, and the hidden Markdown
/// rendition that backs "Copy All". Sections without content are omitted.
#[derive(Copy, Clone, Debug)]
pub struct ErrorBlock<'a> {
    record: &'a ErrorRecord,
    total: usize,
    config: &'a PageConfig,
    cycle_target: Option<usize>,
}

impl<'a> ErrorBlock<'a> {
    /// Creates the block for `record`, one of `total` records on the page.
    pub fn new(record: &'a ErrorRecord, total: usize, config: &'a PageConfig) -> Self {
        Self {
            record,
            total,
            config,
            cycle_target: None,
        }
    }

    /// See [`MarkdownRendition::with_cycle_target`].
    #[must_use]
    pub fn with_cycle_target(mut self, position: Option<usize>) -> Self {
        self.cycle_target = position;
        self
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>, id: &SectionId) -> fmt::Result {
        let record = self.record;
        f.write_str(r#"<div class="exception-header"><div class="exception-title">"#)?;
        if self.total > 1 {
            write!(
                f,
                r#"<span class="exception-number">{}/{}</span>"#,
                record.position + 1,
                self.total
            )?;
        }
        write!(
            f,
            r#"<span class="exception-class">{}</span>"#,
            Html(&record.class_name)
        )?;
        if record.code > 0 {
            write!(f, r#" <span class="exception-code">(#{})</span>"#, record.code)?;
        }
        write!(
            f,
            concat!(
                "</div>",
                r#"<button type="button" class="copy-btn copy-all" onclick="copyAll('{id}', this)" title="Copy all exception details">"#,
                "{icon}<span>Copy All</span></button>",
                "</div>"
            ),
            id = id,
            icon = copy_icon(16)
        )
    }

    fn write_message(&self, f: &mut fmt::Formatter<'_>, id: &SectionId) -> fmt::Result {
        write_section_start(
            f,
            "exception-message-container",
            "Message",
            "copyElement",
            &id.message(),
            "Copy message",
        )?;
        write!(
            f,
            r#"<div id="{}" class="exception-message">{}</div></div>"#,
            id.message(),
            HtmlLines(&self.record.message)
        )
    }

    fn write_location(&self, f: &mut fmt::Formatter<'_>, id: &SectionId) -> fmt::Result {
        write_section_start(
            f,
            "exception-location-container",
            "Location",
            "copyElement",
            &id.location(),
            "Copy file path",
        )?;
        write!(
            f,
            concat!(
                r#"<div id="{}" class="exception-location">"#,
                r#"<span class="file-path">{}</span><span class="line-number">:{}</span>"#,
                "</div></div>"
            ),
            id.location(),
            Html(&self.record.file),
            self.record.line
        )
    }

    fn write_snippet(&self, f: &mut fmt::Formatter<'_>, id: &SectionId) -> fmt::Result {
        let window = code_window(
            &self.record.file,
            self.record.line,
            self.config.html_snippet_radius,
        );
        if window.is_empty() {
            return Ok(());
        }
        write_section_start(
            f,
            "code-snippet-container",
            "Code Snippet",
            "copyElement",
            &id.code(),
            "Copy code snippet",
        )?;
        write!(
            f,
            r#"<div id="{}" class="code-snippet">{}</div></div>"#,
            id.code(),
            HtmlSnippet(&window)
        )
    }

    fn write_trace(&self, f: &mut fmt::Formatter<'_>, id: &SectionId) -> fmt::Result {
        if self.record.frames.is_empty() {
            return Ok(());
        }
        write_section_start(
            f,
            "stack-trace-container",
            "Stack Trace",
            "copyStackTrace",
            &id.trace(),
            "Copy stack trace",
        )?;
        write!(
            f,
            r#"<div id="{}" class="stack-trace"><div class="trace-frames">"#,
            id.trace()
        )?;
        for frame in &self.record.frames {
            self.write_frame(f, id, frame)?;
        }
        f.write_str("</div></div></div>")
    }

    fn write_frame(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: &SectionId,
        frame: &FrameRecord,
    ) -> fmt::Result {
        let frame_id = id.frame(frame.index);
        let state = FrameState::initial(frame.index);
        write!(
            f,
            r#"<div id="{frame_id}-entry" class="trace-frame {} {}">"#,
            frame.kind(self.config.vendor_path_segments).css_class(),
            state.css_class()
        )?;

        write!(
            f,
            concat!(
                r#"<div class="frame-header" onclick="toggleFrame('{frame_id}')">"#,
                r##"<span class="frame-index">#{index}</span>"##,
                r#"<span class="frame-location">"#
            ),
            frame_id = frame_id,
            index = frame.index
        )?;
        if let Some(class_name) = &frame.class_name {
            write!(
                f,
                r#"<span class="frame-class">{}</span><span class="frame-type">{}</span>"#,
                Html(class_name),
                Html(frame.call_operator.as_deref().unwrap_or(""))
            )?;
        }
        write!(
            f,
            concat!(
                r#"<span class="frame-function">{}</span>"#,
                r#"<span class="frame-args">({})</span>"#,
                "</span>",
                r#"<span class="frame-file">{}:{}</span>"#,
                r#"<span class="frame-toggle">&#9660;</span>"#,
                "</div>"
            ),
            Html(&frame.function_name),
            Html(&frame.argument_preview()),
            Html(frame.file_basename()),
            frame.line
        )?;

        let full_path = format!("{}:{}", frame.display_file(), frame.line);
        write!(
            f,
            concat!(
                r#"<div id="{frame_id}" class="frame-details" data-frame="{frame_id}-entry">"#,
                r#"<div class="frame-full-path"><span>{path}</span>"#,
                r#"<button type="button" class="copy-btn small" data-copy="{path}" onclick="event.stopPropagation(); copyText(this.dataset.copy, this)" title="Copy path">"#,
                "{icon}</button></div>"
            ),
            frame_id = frame_id,
            path = Html(&full_path),
            icon = copy_icon(12)
        )?;
        if let Some(file) = &frame.file {
            let window = code_window(file, frame.line, self.config.html_snippet_radius);
            if !window.is_empty() {
                write!(f, r#"<div class="frame-code">{}</div>"#, HtmlSnippet(&window))?;
            }
        }
        f.write_str("</div></div>")
    }
}

impl fmt::Display for ErrorBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.record.section_id();
        write!(f, r#"<div id="{id}" class="exception-block">"#)?;
        self.write_header(f, &id)?;
        self.write_message(f, &id)?;
        self.write_location(f, &id)?;
        self.write_snippet(f, &id)?;
        self.write_trace(f, &id)?;
        write!(
            f,
            r#"<div id="{}" class="copy-source" hidden>{}</div>"#,
            id.all(),
            Text(
                &MarkdownRendition::new(self.record, self.config)
                    .with_cycle_target(self.cycle_target)
                    .to_string()
            )
        )?;
        f.write_str("</div>")
    }
}

/// Initial UI state of a stack frame entry.
///
/// The client script toggles between the two states, the first frame starts
/// out expanded and every other frame collapsed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// Only the frame header is visible.
    Collapsed,
    /// Header and details are visible.
    Expanded,
}

impl FrameState {
    /// The state a frame at `index` is rendered in.
    pub fn initial(index: usize) -> Self {
        if index == 0 {
            Self::Expanded
        } else {
            Self::Collapsed
        }
    }

    /// The opposite state.
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Collapsed => Self::Expanded,
            Self::Expanded => Self::Collapsed,
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::Expanded => "expanded",
        }
    }
}

/// Displays a code window as highlighted HTML lines.
#[derive(Copy, Clone, Debug)]
pub struct HtmlSnippet<'a>(pub &'a CodeWindow);

impl fmt::Display for HtmlSnippet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<pre>")?;
        for line in &self.0.lines {
            write!(
                f,
                r#"<div class="code-line{}"><span class="line-num">{}</span><span class="line-code">{}</span></div>"#,
                if line.highlighted { " highlight" } else { "" },
                line.number,
                if line.text.is_empty() {
                    Html(" ")
                } else {
                    Html(&line.text)
                }
            )?;
        }
        f.write_str("</pre>")
    }
}

fn write_section_start(
    f: &mut fmt::Formatter<'_>,
    container_class: &str,
    title: &str,
    copy_function: &str,
    target_id: &str,
    button_title: &str,
) -> fmt::Result {
    write!(
        f,
        concat!(
            r#"<div class="{container_class}"><div class="section-header">"#,
            r#"<span class="section-title">{title}</span>"#,
            r#"<button type="button" class="copy-btn" onclick="{copy_function}('{target_id}', this)" title="{button_title}">"#,
            "{icon}</button></div>"
        ),
        container_class = container_class,
        title = title,
        copy_function = copy_function,
        target_id = target_id,
        button_title = button_title,
        icon = copy_icon(14)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::collect_chain,
        throwable::{ArgValue, CapturedError, RawFrame},
    };

    fn block(error: &CapturedError) -> String {
        let chain = collect_chain(error);
        ErrorBlock::new(chain.outermost(), chain.len(), &PageConfig::DEFAULT).to_string()
    }

    #[test]
    fn test_frame_state_machine() {
        assert_eq!(FrameState::initial(0), FrameState::Expanded);
        assert_eq!(FrameState::initial(1), FrameState::Collapsed);
        assert_eq!(FrameState::initial(7), FrameState::Collapsed);
        assert_eq!(FrameState::Collapsed.toggle(), FrameState::Expanded);
        assert_eq!(FrameState::Expanded.toggle().toggle(), FrameState::Expanded);
    }

    #[test]
    fn test_message_is_escaped() {
        let html = block(&CapturedError::new("Xss", "<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
        // The hidden rendition keeps the text verbatim once decoded.
        assert!(html.contains("> &lt;script>alert(1)&lt;/script>\n"));
    }

    #[test]
    fn test_optional_sections_omitted() {
        let html = block(&CapturedError::new("E", "m").at("/nope/missing.rs", 3));
        assert!(!html.contains("code-snippet-container"));
        assert!(!html.contains("stack-trace-container"));
        assert!(!html.contains("exception-number"));
        assert!(!html.contains("exception-code"));
        assert!(html.contains(r#"<span class="file-path">/nope/missing.rs</span><span class="line-number">:3</span>"#));
    }

    #[test]
    fn test_frames_render_collapsible() {
        let error = CapturedError::new("E", "m").with_code(42).with_frames(vec![
            RawFrame::new("inner")
                .at("/app/src/a.rs", 1)
                .in_class("app::A", "::")
                .with_args(vec![ArgValue::from("<b>")]),
            RawFrame::new("outer").at("/home/u/.cargo/registry/src/x/y-1.0.0/src/lib.rs", 2),
            RawFrame::default(),
        ]);
        let html = block(&error);
        let id = collect_chain(&error).outermost().section_id();
        assert!(html.contains(r#"<span class="exception-code">(#42)</span>"#));
        assert!(html.contains(&format!(
            r#"<div id="{}-entry" class="trace-frame app-frame expanded">"#,
            id.frame(0)
        )));
        assert!(html.contains(&format!(
            r#"<div id="{}-entry" class="trace-frame vendor-frame collapsed">"#,
            id.frame(1)
        )));
        assert!(html.contains(&format!("toggleFrame('{}')", id.frame(2))));
        assert!(html.contains(r#"<span class="frame-args">(&lt;b&gt;)</span>"#));
        assert!(html.contains(r#"<span class="frame-class">app::A</span><span class="frame-type">::</span>"#));
        assert!(html.contains(r#"<span class="frame-file">lib.rs:2</span>"#));
        assert!(html.contains(r#"data-copy="[internal function]:0""#));
        assert_eq!(html.matches("class=\"trace-frame ").count(), 3);
    }

    #[test]
    fn test_copy_controls_wired_by_id() {
        let error = CapturedError::new("E", "m").with_frames(vec![RawFrame::new("f")]);
        let html = block(&error);
        let id = collect_chain(&error).outermost().section_id();
        assert!(html.contains(&format!("copyAll('{id}', this)")));
        assert!(html.contains(&format!("copyElement('{}', this)", id.message())));
        assert!(html.contains(&format!("copyElement('{}', this)", id.location())));
        assert!(html.contains(&format!("copyStackTrace('{}', this)", id.trace())));
        assert!(html.contains(&format!(r#"id="{}""#, id.all())));
    }
}
