//! Source code windows around a line of interest.

use std::{fs, io, path::Path};

/// A bounded excerpt of a source file centered on one line.
///
/// A window is either empty or satisfies
/// `1 <= start_line <= highlighted_line <= end_line`. Empty windows have all
/// bounds set to `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeWindow {
    /// First line in the window, 1-based.
    pub start_line: u32,
    /// Last line in the window, inclusive.
    pub end_line: u32,
    /// The line the window is centered on.
    pub highlighted_line: u32,
    /// The lines of the window in order.
    pub lines: Vec<CodeLine>,
}

/// One line of a [`CodeWindow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine {
    /// 1-based line number.
    pub number: u32,
    /// Line content with trailing whitespace removed.
    pub text: String,
    /// Whether this is the window's highlighted line.
    pub highlighted: bool,
}

impl CodeWindow {
    /// Returns true if the window holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Builds the window of `radius` lines around `line` from in-memory
    /// source text.
    ///
    /// ```
    /// use debugpage::CodeWindow;
    ///
    /// let window = CodeWindow::from_source("a\nb\nc\nd\ne\n", 2, 1);
    /// assert_eq!((window.start_line, window.end_line), (1, 3));
    /// assert!(window.lines[1].highlighted);
    /// ```
    pub fn from_source(source: &str, line: u32, radius: u32) -> Self {
        let total = u32::try_from(source.lines().count()).unwrap_or(u32::MAX);
        if line == 0 || line > total {
            return Self::default();
        }

        let start_line = line.saturating_sub(radius).max(1);
        let end_line = line.saturating_add(radius).min(total);
        let lines = source
            .lines()
            .zip(1u32..)
            .skip((start_line - 1) as usize)
            .take((end_line - start_line + 1) as usize)
            .map(|(text, number)| CodeLine {
                number,
                text: text.trim_end().to_owned(),
                highlighted: number == line,
            })
            .collect();

        Self {
            start_line,
            end_line,
            highlighted_line: line,
            lines,
        }
    }
}

/// Reads `file` and returns the window of `radius` lines around `line`.
///
/// The read is best effort: a missing or unreadable file, or a line outside
/// the file, yields an empty window.
pub fn code_window(file: impl AsRef<Path>, line: u32, radius: u32) -> CodeWindow {
    let path = file.as_ref();
    match read_source(path) {
        Ok(source) => CodeWindow::from_source(&source, line, radius),
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "source file unavailable for code window");
            CodeWindow::default()
        }
    }
}

fn read_source(path: &Path) -> io::Result<String> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "empty path"));
    }
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(error) => String::from_utf8_lossy(error.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn numbered_source(lines: u32) -> String {
        (1..=lines).map(|i| format!("line {i}   \n")).collect()
    }

    #[test]
    fn test_window_bounds() {
        let source = numbered_source(100);
        for (line, radius) in [(1, 8), (50, 8), (100, 5), (3, 5), (97, 8), (50, 0)] {
            let window = CodeWindow::from_source(&source, line, radius);
            assert!(window.end_line - window.start_line <= 2 * radius);
            assert!(window.start_line >= 1);
            assert!(window.start_line <= line && line <= window.end_line);
            assert_eq!(window.highlighted_line, line);
            assert_eq!(
                window.lines.len() as u32,
                window.end_line - window.start_line + 1
            );
            assert_eq!(window.lines.iter().filter(|l| l.highlighted).count(), 1);
        }
    }

    #[test]
    fn test_window_clips_to_file() {
        let window = CodeWindow::from_source(&numbered_source(4), 2, 8);
        assert_eq!((window.start_line, window.end_line), (1, 4));
        assert_eq!(window.lines[0].text, "line 1");
        assert_eq!(window.lines[3].number, 4);
    }

    #[test]
    fn test_window_out_of_range_is_empty() {
        assert!(CodeWindow::from_source(&numbered_source(4), 0, 8).is_empty());
        assert!(CodeWindow::from_source(&numbered_source(4), 5, 8).is_empty());
        assert!(CodeWindow::from_source("", 1, 8).is_empty());
    }

    #[test]
    fn test_code_window_missing_file() {
        let window = code_window("/definitely/not/here/calc.rs", 10, 8);
        assert!(window.is_empty());
        assert_eq!(window, CodeWindow::default());
        assert!(code_window("", 1, 8).is_empty());
    }

    #[test]
    fn test_code_window_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(numbered_source(30).as_bytes())
            .expect("write temp file");
        let window = code_window(file.path(), 20, 5);
        assert_eq!((window.start_line, window.end_line), (15, 25));
        assert!(window.lines[5].highlighted);
        assert_eq!(window.lines[5].text, "line 20");
    }

    #[test]
    fn test_code_window_lossy_utf8() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"ok\nbad \xff byte\n").expect("write temp file");
        let window = code_window(file.path(), 2, 1);
        assert_eq!(window.lines.len(), 2);
        assert!(window.lines[1].text.contains('\u{fffd}'));
    }
}
