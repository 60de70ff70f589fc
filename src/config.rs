//! Page configuration.

/// Settings that control what a rendered page contains.
///
/// The configuration is a plain const-constructible struct. Start from
/// [`PageConfig::DEFAULT`] and override the fields you care about:
///
/// ```
/// use debugpage::PageConfig;
///
/// let config = PageConfig {
///     title: "Checkout service error",
///     html_snippet_radius: 12,
///     ..PageConfig::DEFAULT
/// };
/// assert_eq!(config.text_snippet_radius, 5);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageConfig {
    /// Text of the `<title>` element and the page heading.
    pub title: &'static str,

    /// Number of lines shown above and below the error line in the HTML code
    /// snippets.
    pub html_snippet_radius: u32,

    /// Number of lines shown above and below the error line in the Markdown
    /// rendition backing "Copy All".
    pub text_snippet_radius: u32,

    /// Path segments identifying third-party or library source files. A frame
    /// whose file contains any of these is displayed as a vendor frame.
    pub vendor_path_segments: &'static [&'static str],

    /// Language tag of the fenced code snippet in the Markdown rendition.
    pub snippet_language: &'static str,
}

impl PageConfig {
    /// The default configuration.
    pub const DEFAULT: Self = Self {
        title: "Unhandled Error",
        html_snippet_radius: 8,
        text_snippet_radius: 5,
        vendor_path_segments: &[
            "/vendor/",
            "/.cargo/registry/",
            "/.cargo/git/",
            "/rustc/",
            "/lib/rustlib/",
        ],
        snippet_language: "rust",
    };
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
