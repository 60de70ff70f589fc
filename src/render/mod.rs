//! Turning a [`Chain`] into a complete HTML document.
//!
//! The page is built from three layers:
//! - [`HtmlPage`] - the document around everything: head, inline
//!   [stylesheet](assets::STYLESHEET), page header and the inline
//!   [client script](assets::SCRIPT)
//! - [`ErrorBlock`] - the markup of one error of the chain
//! - [`MarkdownRendition`] - the hidden plain-text copy of one error that
//!   backs the "Copy All" control
//!
//! All of them are [`Display`](core::fmt::Display) values, so they can be
//! written into any formatter or turned into a `String` with `to_string()`.

pub mod assets;
mod html;
mod markdown;

use core::fmt;

pub use self::{
    html::{ErrorBlock, FrameState, HtmlSnippet},
    markdown::{MarkdownRendition, PlainSnippet, TraceText},
};
use crate::{chain::Chain, config::PageConfig, escape::Html};

/// Displays a whole chain as an HTML document.
///
/// ```
/// use debugpage::{CapturedError, PageConfig, collect_chain, render::HtmlPage};
///
/// let chain = collect_chain(&CapturedError::new("E", "it broke"));
/// let page = HtmlPage::new(&chain, &PageConfig::DEFAULT).to_string();
/// assert!(page.starts_with("<!DOCTYPE html>"));
/// assert!(page.contains("it broke"));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct HtmlPage<'a> {
    chain: &'a Chain,
    config: &'a PageConfig,
}

impl<'a> HtmlPage<'a> {
    /// Creates the page for `chain`.
    pub fn new(chain: &'a Chain, config: &'a PageConfig) -> Self {
        Self { chain, config }
    }
}

impl fmt::Display for HtmlPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = Html(self.config.title);
        write!(
            f,
            concat!(
                "<!DOCTYPE html>\n",
                "<html lang=\"en\">\n",
                "<head>\n",
                "<meta charset=\"UTF-8\">\n",
                "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
                "<title>{title}</title>\n",
                "<style>\n{style}</style>\n",
                "</head>\n",
                "<body>\n",
                "<div class=\"exception-container\">\n",
                "<div class=\"header\"><div class=\"logo\">{logo}</div><h1>{title}</h1></div>\n"
            ),
            title = title,
            style = assets::STYLESHEET,
            logo = assets::LOGO_SVG
        )?;

        let total = self.chain.len();
        for record in self.chain {
            let is_last = record.cause.is_none();
            let cycle_target = self.chain.cycle_target().filter(|_| is_last);
            writeln!(
                f,
                "{}",
                ErrorBlock::new(record, total, self.config).with_cycle_target(cycle_target)
            )?;
        }
        if let Some(position) = self.chain.cycle_target() {
            writeln!(
                f,
                r#"<div class="chain-notice">Cause chain truncated: the cause of the last error is error {} of {total} again.</div>"#,
                position + 1
            )?;
        }

        write!(
            f,
            concat!(
                "</div>\n",
                "<div id=\"copy-toast\" class=\"copy-toast\">Copied to clipboard!</div>\n",
                "<script>\n{script}</script>\n",
                "</body>\n",
                "</html>\n"
            ),
            script = assets::SCRIPT
        )
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, cell::Cell};

    use super::*;
    use crate::{
        chain::collect_chain,
        section_id::SectionId,
        throwable::{CapturedError, RawFrame, Throwable},
    };

    fn page(error: &CapturedError) -> String {
        HtmlPage::new(&collect_chain(error), &PageConfig::DEFAULT).to_string()
    }

    fn division_by_zero() -> CapturedError {
        CapturedError::new("ArithmeticError", "Division by zero")
            .at("/app/calc.py", 10)
            .with_frames(vec![RawFrame::new("divide").at("/app/calc.py", 10)])
    }

    #[test]
    fn test_single_error_page() {
        let html = page(&division_by_zero());
        let id = SectionId::new(0, "Division by zero", "/app/calc.py", 10);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>\n"));
        assert_eq!(html.matches(r#"class="exception-block""#).count(), 1);
        assert!(html.contains(&format!(r#"<div id="{id}" class="exception-block">"#)));
        assert!(html.contains(r#"class="exception-message">Division by zero</div>"#));
        assert!(html.contains(
            r#"<span class="file-path">/app/calc.py</span><span class="line-number">:10</span>"#
        ));
        assert_eq!(html.matches("trace-frame app-frame expanded").count(), 1);
        assert!(!html.contains("collapsed\">"));
        // The file does not exist, so there is no snippet section.
        assert!(!html.contains("code-snippet-container"));
        assert!(!html.contains("exception-number"));

        let hidden_start = html
            .find(&format!(r#"<div id="{}" class="copy-source" hidden>"#, id.all()))
            .expect("hidden rendition");
        let hidden = &html[hidden_start..];
        assert!(hidden.contains("## ArithmeticError"));
        assert!(hidden.contains("> Division by zero"));
        assert!(hidden.contains("**Location:** `/app/calc.py:10`"));
        assert!(hidden.contains("#0 /app/calc.py(10): divide()\n#1 {main}"));
    }

    #[test]
    fn test_chain_page_lists_outermost_first() {
        let error = CapturedError::new("RuntimeException", "request failed")
            .at("/app/handler.rs", 40)
            .caused_by(division_by_zero());
        let html = page(&error);

        let outer = SectionId::new(0, "request failed", "/app/handler.rs", 40);
        let inner = SectionId::new(1, "Division by zero", "/app/calc.py", 10);
        assert_ne!(&outer.as_str()[12..], &inner.as_str()[12..]);
        assert!(outer.as_str().starts_with("exception-0-"));
        assert!(inner.as_str().starts_with("exception-1-"));

        let outer_at = html.find(&format!(r#"id="{outer}""#)).expect("outer block");
        let inner_at = html.find(&format!(r#"id="{inner}""#)).expect("inner block");
        assert!(outer_at < inner_at);
        assert_eq!(html.matches(r#"class="exception-block""#).count(), 2);
        assert!(html.contains(r#"<span class="exception-number">1/2</span>"#));
        assert!(html.contains(r#"<span class="exception-number">2/2</span>"#));
        assert!(!html.contains("chain-notice"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let error = division_by_zero().caused_by(CapturedError::new("E", "inner"));
        assert_eq!(page(&error), page(&error));
    }

    #[test]
    fn test_script_in_message_is_inert() {
        let html = page(&CapturedError::new("Xss", "<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
        assert_eq!(html.matches("<script>").count(), 1);
    }

    struct Linked<'a> {
        name: &'static str,
        previous: Cell<Option<&'a Linked<'a>>>,
    }

    impl Throwable for Linked<'_> {
        fn class_name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Linked")
        }

        fn message(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.name)
        }

        fn previous(&self) -> Option<&dyn Throwable> {
            self.previous.get().map(|previous| previous as &dyn Throwable)
        }
    }

    #[test]
    fn test_cyclic_chain_page() {
        let a = Linked {
            name: "first",
            previous: Cell::new(None),
        };
        let b = Linked {
            name: "second",
            previous: Cell::new(None),
        };
        a.previous.set(Some(&b));
        b.previous.set(Some(&a));

        let chain = collect_chain(&a);
        let html = HtmlPage::new(&chain, &PageConfig::DEFAULT).to_string();

        assert_eq!(html.matches(r#"class="exception-block""#).count(), 2);
        assert_eq!(html.matches(r#"<div class="chain-notice">"#).count(), 1);
        assert!(html.contains(
            "Cause chain truncated: the cause of the last error is error 1 of 2 again."
        ));

        let note = "_Cause chain truncated: the next cause is error 1 again._";
        assert_eq!(html.matches(note).count(), 1);
        let second = SectionId::new(1, "second", "", 0);
        let second_hidden = html
            .find(&format!(r#"<div id="{}" class="copy-source" hidden>"#, second.all()))
            .expect("hidden rendition of the last error");
        assert!(html.find(note).expect("truncation note") > second_hidden);
        assert!(html.find(note) < html.find(r#"<div class="chain-notice">"#));
    }

    #[test]
    fn test_snapshot_cycle_page() {
        let mut looping = CapturedError::new("Loop", "loops");
        looping.repeated_cause = Some(0);
        let html = page(&looping);
        assert!(html.contains(
            "Cause chain truncated: the cause of the last error is error 1 of 1 again."
        ));
        assert!(html.contains("_Cause chain truncated: the next cause is error 1 again._"));
    }

    #[test]
    fn test_page_title_from_config() {
        let config = PageConfig {
            title: "Oops & more",
            ..PageConfig::DEFAULT
        };
        let chain = collect_chain(&CapturedError::new("E", "m"));
        let html = HtmlPage::new(&chain, &config).to_string();
        assert!(html.contains("<title>Oops &amp; more</title>"));
        assert!(html.contains("<h1>Oops &amp; more</h1>"));
    }
}
