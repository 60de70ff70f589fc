//! The error-like objects a diagnostic page is rendered from.
//!
//! The renderer never inspects concrete error types. Everything it needs is
//! read through the [`Throwable`] trait: the error's message, numeric code,
//! the location it was raised at, the stack frames recorded for it, and an
//! optional link to the error that caused it.
//!
//! Hosts that already keep this information around implement [`Throwable`]
//! for their own types. Everybody else can build a [`CapturedError`], either
//! by hand or from a [`std::error::Error`] through the adapters in
//! [`compat`](crate::compat).

use std::{borrow::Cow, fmt};

/// An error object that can be rendered as a diagnostic page.
///
/// Only [`class_name`](Throwable::class_name) and
/// [`message`](Throwable::message) are mandatory, the remaining accessors
/// default to "unknown".
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
///
/// use debugpage::Throwable;
///
/// struct Timeout {
///     millis: u64,
/// }
///
/// impl Throwable for Timeout {
///     fn class_name(&self) -> Cow<'_, str> {
///         Cow::Borrowed("Timeout")
///     }
///
///     fn message(&self) -> Cow<'_, str> {
///         Cow::Owned(format!("gave up after {}ms", self.millis))
///     }
/// }
///
/// let page = debugpage::render(&Timeout { millis: 250 });
/// assert!(page.contains("gave up after 250ms"));
/// ```
pub trait Throwable {
    /// The name of the error's type, shown in the block header.
    fn class_name(&self) -> Cow<'_, str>;

    /// The human readable error message.
    fn message(&self) -> Cow<'_, str>;

    /// An application specific error code. Codes `<= 0` are not displayed.
    fn code(&self) -> i64 {
        0
    }

    /// The source file the error was raised in.
    fn file(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    /// The line the error was raised at, `0` when unknown.
    fn line(&self) -> u32 {
        0
    }

    /// The call stack recorded for the error, innermost frame first.
    fn frames(&self) -> &[RawFrame] {
        &[]
    }

    /// The error that caused this one, if any.
    fn previous(&self) -> Option<&dyn Throwable> {
        None
    }

    /// Set when the cause of this error was cut off because it repeats an
    /// error closer to the outermost one: the number of links back to that
    /// error, `0` for this error itself.
    ///
    /// Owned snapshots of cyclic cause chains use this to keep the cycle
    /// visible. [`previous`](Throwable::previous) returns `None` for such an
    /// error.
    fn repeated_cause(&self) -> Option<usize> {
        None
    }
}

/// An opaque argument value recorded with a stack frame.
///
/// Arguments are only ever displayed as short previews. Lists and objects
/// keep their shape, everything else is a scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// A list-like value.
    List(Vec<ArgValue>),
    /// An object-like value, identified only by its type name.
    Object {
        /// The concrete type name of the object.
        type_name: String,
    },
}

impl ArgValue {
    /// Creates an object argument with the given type name.
    pub fn object(type_name: impl Into<String>) -> Self {
        Self::Object {
            type_name: type_name.into(),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => f.write_str("null"),
            ArgValue::Bool(value) => write!(f, "{value}"),
            ArgValue::Int(value) => write!(f, "{value}"),
            ArgValue::Float(value) => write!(f, "{value}"),
            ArgValue::Str(value) => f.write_str(value),
            ArgValue::List(_) => f.write_str("array"),
            ArgValue::Object { type_name } => f.write_str(type_name),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// One entry of a recorded call stack, as handed over by the host.
///
/// Every field is optional. [`extract_frame`](crate::record::extract_frame)
/// turns a raw frame into a [`FrameRecord`](crate::FrameRecord) with
/// well-defined defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    /// The source file of the call site.
    pub file: Option<String>,
    /// The line of the call site.
    pub line: Option<u32>,
    /// The type or module the called function belongs to.
    pub class_name: Option<String>,
    /// The marker between class and function, such as `::` or `->`.
    pub call_operator: Option<String>,
    /// The called function.
    pub function_name: Option<String>,
    /// The arguments of the call.
    pub arguments: Option<Vec<ArgValue>>,
}

impl RawFrame {
    /// Creates a frame for a call to `function_name` with no other data.
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: Some(function_name.into()),
            ..Self::default()
        }
    }

    /// Sets the call site.
    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Sets the class and the call operator.
    #[must_use]
    pub fn in_class(mut self, class_name: impl Into<String>, call_operator: &str) -> Self {
        self.class_name = Some(class_name.into());
        self.call_operator = Some(call_operator.to_owned());
        self
    }

    /// Sets the call arguments.
    #[must_use]
    pub fn with_args(mut self, arguments: Vec<ArgValue>) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// An owned snapshot of an error and its causes.
///
/// # Examples
///
/// ```
/// use debugpage::{CapturedError, RawFrame, Throwable};
///
/// let error = CapturedError::new("ArithmeticError", "Division by zero")
///     .at("/app/calc.rs", 10)
///     .with_frames(vec![RawFrame::new("divide").at("/app/calc.rs", 10)])
///     .caused_by(CapturedError::new("InputError", "empty divisor"));
///
/// assert_eq!(error.previous().map(|e| e.class_name().into_owned()).as_deref(), Some("InputError"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedError {
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
    /// See [`Throwable::frames`].
    pub frames: Vec<RawFrame>,
    /// See [`Throwable::previous`].
    pub previous: Option<Box<CapturedError>>,
    /// See [`Throwable::repeated_cause`].
    pub repeated_cause: Option<usize>,
}

impl CapturedError {
    /// Creates an error without location, frames or cause.
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Sets the error code.
    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Sets the location the error was raised at.
    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    /// Replaces the recorded frames.
    #[must_use]
    pub fn with_frames(mut self, frames: Vec<RawFrame>) -> Self {
        self.frames = frames;
        self
    }

    /// Sets the error that caused this one, replacing any previous cause.
    #[must_use]
    pub fn caused_by(mut self, previous: CapturedError) -> Self {
        self.previous = Some(Box::new(previous));
        self.repeated_cause = None;
        self
    }
}

impl Throwable for CapturedError {
    fn class_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.class_name)
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn code(&self) -> i64 {
        self.code
    }

    fn file(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.file)
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn frames(&self) -> &[RawFrame] {
        &self.frames
    }

    fn previous(&self) -> Option<&dyn Throwable> {
        self.previous.as_deref().map(|previous| previous as &dyn Throwable)
    }

    fn repeated_cause(&self) -> Option<usize> {
        self.repeated_cause
    }
}
