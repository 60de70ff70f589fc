//! Normalized, read-only records extracted from [`Throwable`] objects.

use crate::{
    section_id::SectionId,
    throwable::{ArgValue, RawFrame, Throwable},
};

/// Display name used for frames that do not carry a source file.
pub const INTERNAL_FUNCTION: &str = "[internal function]";

const MAX_PREVIEW_ARGUMENTS: usize = 3;
const MAX_PREVIEW_CHARS: usize = 30;

/// One error of a [`Chain`](crate::Chain), with every field resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    /// Position of this record inside its chain, `0` for the raised error.
    pub position: usize,
    /// See [`Throwable::class_name`].
    pub class_name: String,
    /// See [`Throwable::code`].
    pub code: i64,
    /// See [`Throwable::message`].
    pub message: String,
    /// See [`Throwable::file`].
    pub file: String,
    /// See [`Throwable::line`].
    pub line: u32,
    /// The normalized frames, innermost first.
    pub frames: Vec<FrameRecord>,
    /// Position of the record for the error that caused this one.
    pub cause: Option<usize>,
}

impl ErrorRecord {
    /// Reads every field of `throwable` into a record at `position`.
    ///
    /// The [`cause`](ErrorRecord::cause) link is left empty and filled in by
    /// the chain walker.
    pub fn from_throwable(throwable: &dyn Throwable, position: usize) -> Self {
        Self {
            position,
            class_name: throwable.class_name().into_owned(),
            code: throwable.code(),
            message: throwable.message().into_owned(),
            file: throwable.file().into_owned(),
            line: throwable.line(),
            frames: throwable
                .frames()
                .iter()
                .enumerate()
                .map(|(index, raw)| extract_frame(raw, index))
                .collect(),
            cause: None,
        }
    }

    /// The identifier addressing this record's block in a rendered page.
    pub fn section_id(&self) -> SectionId {
        SectionId::new(self.position, &self.message, &self.file, self.line)
    }
}

/// Whether a frame belongs to the application or to a library.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Application code.
    Application,
    /// Third-party or library code.
    Vendor,
}

impl FrameKind {
    /// CSS class used for frames of this kind.
    pub fn css_class(self) -> &'static str {
        match self {
            FrameKind::Application => "app-frame",
            FrameKind::Vendor => "vendor-frame",
        }
    }
}

/// One stack frame with defaults applied to every missing field.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Position in the call stack, `0` for the innermost frame.
    pub index: usize,
    /// The source file, `None` for frames without one.
    pub file: Option<String>,
    /// The line, `0` when unknown.
    pub line: u32,
    /// The class or module of the called function.
    pub class_name: Option<String>,
    /// The marker between class and function.
    pub call_operator: Option<String>,
    /// The called function, empty when unknown.
    pub function_name: String,
    /// The call arguments.
    pub arguments: Vec<ArgValue>,
}

impl FrameRecord {
    /// The file to display, [`INTERNAL_FUNCTION`] when the frame has none.
    pub fn display_file(&self) -> &str {
        self.file.as_deref().unwrap_or(INTERNAL_FUNCTION)
    }

    /// The last path component of [`display_file`](Self::display_file).
    pub fn file_basename(&self) -> &str {
        let file = self.display_file();
        file.rsplit(['/', '\\']).next().unwrap_or(file)
    }

    /// `Class::function` or just `function` when the frame has no class.
    pub fn qualified_function(&self) -> String {
        match &self.class_name {
            Some(class_name) => format!(
                "{class_name}{}{}",
                self.call_operator.as_deref().unwrap_or(""),
                self.function_name
            ),
            None => self.function_name.clone(),
        }
    }

    /// Classifies the frame using the given vendor path segments.
    pub fn kind(&self, vendor_path_segments: &[&str]) -> FrameKind {
        match &self.file {
            Some(file)
                if vendor_path_segments
                    .iter()
                    .any(|segment| file.contains(segment)) =>
            {
                FrameKind::Vendor
            }
            _ => FrameKind::Application,
        }
    }

    /// Short preview of the call arguments, see [`argument_preview`].
    pub fn argument_preview(&self) -> String {
        argument_preview(&self.arguments)
    }
}

/// Normalizes a raw frame at position `index` of its stack.
pub fn extract_frame(raw: &RawFrame, index: usize) -> FrameRecord {
    FrameRecord {
        index,
        file: raw.file.clone().filter(|file| !file.is_empty()),
        line: raw.line.unwrap_or(0),
        class_name: raw.class_name.clone().filter(|class| !class.is_empty()),
        call_operator: raw.call_operator.clone(),
        function_name: raw.function_name.clone().unwrap_or_default(),
        arguments: raw.arguments.clone().unwrap_or_default(),
    }
}

/// Formats call arguments as a short, unescaped preview.
///
/// Lists become `array`, objects their type name, and every other value its
/// string form cut to 30 characters. At most three tokens are shown, followed
/// by `, ...` when the call had more arguments.
///
/// ```
/// use debugpage::{ArgValue, record::argument_preview};
///
/// let preview = argument_preview(&[
///     ArgValue::from(vec![1i64, 2]),
///     ArgValue::object("app::Config"),
///     ArgValue::from("hello world"),
///     ArgValue::from(42i64),
/// ]);
/// assert_eq!(preview, "array, app::Config, hello world, ...");
/// ```
pub fn argument_preview(arguments: &[ArgValue]) -> String {
    let mut preview = arguments
        .iter()
        .take(MAX_PREVIEW_ARGUMENTS)
        .map(|argument| match argument {
            ArgValue::List(_) | ArgValue::Object { .. } => argument.to_string(),
            scalar => scalar.to_string().chars().take(MAX_PREVIEW_CHARS).collect(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    if arguments.len() > MAX_PREVIEW_ARGUMENTS {
        preview.push_str(", ...");
    }
    preview
}
