//! Fixed assets bundled with the renderer.

/// Inline stylesheet of every page.
pub const STYLESHEET: &str = include_str!("../../assets/debugpage.css");

/// Inline client script of every page.
pub const SCRIPT: &str = include_str!("../../assets/debugpage.js");

/// Logo shown next to the page heading.
pub const LOGO_SVG: &str = concat!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16">"##,
    r##"<path fill="#c83c3c" d="M0 0h16v16H0z"/>"##,
    r##"<path fill="#fff" d="M7 3h2v6H7zM7 11h2v2H7z"/>"##,
    "</svg>"
);

/// Clipboard icon of the given pixel size.
pub fn copy_icon(size: u32) -> String {
    format!(
        concat!(
            r#"<svg width="{size}" height="{size}" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2">"#,
            r#"<rect x="9" y="9" width="13" height="13" rx="2" ry="2"/>"#,
            r#"<path d="M5 15H4a2 2 0 0 1-2-2V4a2 2 0 0 1 2-2h9a2 2 0 0 1 2 2v1"/>"#,
            "</svg>"
        ),
        size = size
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_surface() {
        for function in [
            "function copyText(",
            "function copyElement(",
            "function copyStackTrace(",
            "function copyAll(",
            "function toggleFrame(",
            "Failed to copy",
            "textarea",
        ] {
            assert!(SCRIPT.contains(function), "script is missing {function}");
        }
    }

    #[test]
    fn test_stylesheet_covers_frame_states() {
        assert!(STYLESHEET.contains(".trace-frame.expanded .frame-details"));
        assert!(STYLESHEET.contains(".copy-toast.show"));
    }

    #[test]
    fn test_copy_icon_size() {
        assert!(copy_icon(14).starts_with(r#"<svg width="14" height="14""#));
    }
}
