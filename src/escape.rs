//! Escaping for the two text destinations of a page.
//!
//! Text that becomes markup goes through [`Html`], which escapes every
//! character with a meaning in HTML, quotes included so the result is also
//! safe inside attribute values. The Markdown rendition is generated
//! unescaped and only wrapped in [`Text`] when it is embedded into the page:
//! that escapes the two characters that can start markup in element content
//! and nothing else, so `textContent` hands the verbatim Markdown back.

use std::fmt;

/// Displays a string escaped for HTML element content and attribute values.
#[derive(Copy, Clone, Debug)]
pub struct Html<'a>(pub &'a str);

impl fmt::Display for Html<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.0, |c| match c {
            '&' => Some("&amp;"),
            '<' => Some("&lt;"),
            '>' => Some("&gt;"),
            '"' => Some("&quot;"),
            '\'' => Some("&#039;"),
            _ => None,
        })
    }
}

/// Displays a string escaped for HTML element content only.
#[derive(Copy, Clone, Debug)]
pub struct Text<'a>(pub &'a str);

impl fmt::Display for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.0, |c| match c {
            '&' => Some("&amp;"),
            '<' => Some("&lt;"),
            _ => None,
        })
    }
}

/// Displays escaped HTML with every line break turned into `<br />`.
#[derive(Copy, Clone, Debug)]
pub struct HtmlLines<'a>(pub &'a str);

impl fmt::Display for HtmlLines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.0.split('\n').enumerate() {
            if i > 0 {
                f.write_str("<br />\n")?;
            }
            write!(f, "{}", Html(line.strip_suffix('\r').unwrap_or(line)))?;
        }
        Ok(())
    }
}

fn write_escaped(
    f: &mut fmt::Formatter<'_>,
    s: &str,
    replacement: impl Fn(char) -> Option<&'static str>,
) -> fmt::Result {
    let mut last = 0;
    for (i, c) in s.char_indices() {
        if let Some(entity) = replacement(c) {
            f.write_str(&s[last..i])?;
            f.write_str(entity)?;
            last = i + c.len_utf8();
        }
    }
    f.write_str(&s[last..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escapes_markup() {
        assert_eq!(
            Html("<script>alert('x') & \"y\"</script>").to_string(),
            "&lt;script&gt;alert(&#039;x&#039;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
        assert_eq!(Html("plain ünïcode").to_string(), "plain ünïcode");
    }

    #[test]
    fn test_text_keeps_blockquote_markers() {
        assert_eq!(
            Text("> a < b && c\n> \"d\"").to_string(),
            "> a &lt; b &amp;&amp; c\n> \"d\""
        );
    }

    #[test]
    fn test_html_lines() {
        assert_eq!(HtmlLines("a<b\r\nc").to_string(), "a&lt;b<br />\nc");
        assert_eq!(HtmlLines("").to_string(), "");
    }
}
