use crate::stack::{HasCause, HasStackTrace, StackTrace, Traceable};
use std::error::Error;
use std::fmt;

type BoxError = Box<dyn Error + Send + Sync>;

/// Error carrying a message, an optional cause and, usually, the stack of
/// the place it was created.
///
/// Displays as `message` or `message: cause`.
#[derive(Debug)]
pub struct TracedError {
    message: String,
    cause: Option<Cause>,
    stack: Option<StackTrace>,
}

#[derive(Debug)]
enum Cause {
    Traced(Box<TracedError>),
    Opaque(OpaqueError),
}

/// A foreign error in a cause chain. It exposes neither a cause nor a stack.
#[derive(Debug)]
pub struct OpaqueError(BoxError);

impl fmt::Display for OpaqueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for OpaqueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl Traceable for OpaqueError {}

impl Cause {
    fn from_error(err: impl Into<BoxError>) -> Self {
        match err.into().downcast::<TracedError>() {
            Ok(traced) => Cause::Traced(traced),
            Err(other) => Cause::Opaque(OpaqueError(other)),
        }
    }

    fn as_traceable(&self) -> &dyn Traceable {
        match self {
            Cause::Traced(e) => &**e,
            Cause::Opaque(e) => e,
        }
    }
}

impl TracedError {
    /// New root error with the caller's stack.
    #[inline(never)]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            stack: Some(StackTrace::capture_skipping(1)),
        }
    }

    /// Wrap `cause`, annotating it with `message` and the caller's stack.
    #[inline(never)]
    pub fn wrap(cause: impl Into<BoxError>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: Some(Cause::from_error(cause)),
            stack: Some(StackTrace::capture_skipping(1)),
        }
    }

    /// Wrap `cause` with a message only; no stack is recorded.
    pub fn with_message(cause: impl Into<BoxError>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: Some(Cause::from_error(cause)),
            stack: None,
        }
    }

    /// Attach an already captured stack, replacing any existing one.
    pub fn with_stack(mut self, stack: StackTrace) -> Self {
        self.stack = Some(stack);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&StackTrace> {
        self.stack.as_ref()
    }
}

impl fmt::Display for TracedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause.as_traceable()),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for TracedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.cause.as_ref()? {
            Cause::Traced(e) => Some(&**e),
            Cause::Opaque(e) => Some(e),
        }
    }
}

impl HasCause for TracedError {
    fn cause(&self) -> Option<&dyn Traceable> {
        self.cause.as_ref().map(Cause::as_traceable)
    }
}

impl HasStackTrace for TracedError {
    fn stack_trace(&self) -> &StackTrace {
        // Only reachable through `as_stack_trace`, which checks presence.
        static EMPTY: StackTrace = StackTrace::empty();
        self.stack.as_ref().unwrap_or(&EMPTY)
    }
}

impl Traceable for TracedError {
    fn as_cause(&self) -> Option<&dyn HasCause> {
        self.cause.as_ref().map(|_| self as &dyn HasCause)
    }

    fn as_stack_trace(&self) -> Option<&dyn HasStackTrace> {
        self.stack.as_ref().map(|_| self as &dyn HasStackTrace)
    }
}
