use crate::traced::TracedError;
use std::error::Error;
use std::ffi::c_void;
use std::fmt;

/// A single captured program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame(usize);

impl Frame {
    pub fn from_pc(pc: usize) -> Self {
        Frame(pc)
    }

    pub fn pc(self) -> usize {
        self.0
    }
}

/// Call stack attached to an error at the point it was created.
///
/// Only program counters are stored; symbol resolution happens when the
/// stack is rendered, so capturing stays cheap on the error path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    frames: Vec<Frame>,
}

impl StackTrace {
    /// Capture the caller's stack, outermost call last. Frames belonging to
    /// the unwinder and to this function are skipped.
    #[inline(never)]
    pub fn capture() -> Self {
        Self::capture_after((Self::capture as fn() -> StackTrace) as usize, 0)
    }

    /// Like [`capture`](Self::capture), but also drops the `skip` innermost
    /// frames above the call. Error constructors pass `1` so the stack starts
    /// where the error was created rather than inside the constructor, which
    /// must then be `#[inline(never)]`.
    #[inline(never)]
    pub fn capture_skipping(skip: usize) -> Self {
        Self::capture_after((Self::capture_skipping as fn(usize) -> StackTrace) as usize, skip)
    }

    // Inlined into both entry points so the anchor frame is the one that
    // called the unwinder.
    #[inline(always)]
    fn capture_after(anchor: usize, skip: usize) -> Self {
        let mut raw: Vec<(usize, usize)> = Vec::new();
        backtrace::trace(|frame| {
            raw.push((frame.ip() as usize, frame.symbol_address() as usize));
            true
        });

        // If inlining hid the anchor frame, keep everything.
        let start = raw
            .iter()
            .position(|&(_, sym)| sym == anchor)
            .map_or(0, |i| (i + 1 + skip).min(raw.len()));

        StackTrace {
            frames: raw[start..].iter().map(|&(ip, _)| Frame(ip)).collect(),
        }
    }

    pub const fn empty() -> Self {
        StackTrace { frames: Vec::new() }
    }

    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        StackTrace {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// An error that may expose a cause and/or an attached stack.
///
/// Both capabilities are optional and queried explicitly, so the resolver
/// can branch on them without inspecting concrete types.
pub trait Traceable: Error {
    fn as_cause(&self) -> Option<&dyn HasCause> {
        None
    }

    fn as_stack_trace(&self) -> Option<&dyn HasStackTrace> {
        None
    }
}

/// Capability: the error wraps another one.
pub trait HasCause {
    /// The wrapped error, or `None` at the end of the chain.
    fn cause(&self) -> Option<&dyn Traceable>;
}

/// Capability: the error carries the stack captured at its creation.
pub trait HasStackTrace {
    fn stack_trace(&self) -> &StackTrace;
}

/// Walk the cause chain and return the stack of the innermost error that has
/// one. Errors without a stack are walked through, not stopped at.
pub fn innermost_stack<'a>(err: &'a dyn Traceable) -> Option<&'a StackTrace> {
    let mut selected = err;
    let mut current = err;

    while let Some(causer) = current.as_cause() {
        let Some(inner) = causer.cause() else {
            break;
        };
        if inner.as_stack_trace().is_some() {
            selected = inner;
        }
        current = inner;
    }

    selected.as_stack_trace().map(|s| s.stack_trace())
}

/// A frame after symbol resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Fully-qualified function path, without the symbol hash.
    pub function: String,
    pub file: String,
    pub line: u32,
    /// Entry address of the enclosing function.
    pub entry: usize,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}()\n\t{}:{} +{:#x}",
            self.function, self.file, self.line, self.entry
        )
    }
}

/// Turns a program counter into function, file and line.
pub trait SymbolResolver {
    /// `None` when there is no symbol for `frame`; the frame is then left out
    /// of the dump.
    fn resolve(&self, frame: Frame) -> Option<StackFrame>;
}

/// Resolves symbols from the running binary's debug info.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceResolver;

impl SymbolResolver for BacktraceResolver {
    fn resolve(&self, frame: Frame) -> Option<StackFrame> {
        let mut resolved = None;

        // Inlined calls report several symbols for one pc; the first is the
        // innermost function.
        backtrace::resolve(frame.pc() as *mut c_void, |symbol| {
            if resolved.is_some() {
                return;
            }
            let Some(name) = symbol.name() else {
                return;
            };
            resolved = Some(StackFrame {
                function: format!("{:#}", name),
                file: symbol
                    .filename()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "?".to_string()),
                line: symbol.lineno().unwrap_or(0),
                entry: symbol.addr().map_or(0, |a| a as usize),
            });
        });

        resolved
    }
}

/// Header line for the calling thread, in the `goroutine <id> [<state>]:`
/// form Error Reporting expects at the top of a dump.
///
/// The thread's numeric id stands in for the goroutine id; `0` is used when
/// it cannot be read.
pub fn execution_header() -> String {
    let id = format!("{:?}", std::thread::current().id());
    let id: u64 = id
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0);
    format!("goroutine {} [running]:", id)
}

/// Renders the stack of an error chain as a runtime-style dump.
#[derive(Debug, Clone, Default)]
pub struct StackFormatter<R = BacktraceResolver> {
    resolver: R,
}

impl<R: SymbolResolver> StackFormatter<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Resolved frames of the innermost stack in `err`'s chain, in capture
    /// order. Unresolvable frames are dropped.
    pub fn resolve(&self, err: &dyn Traceable) -> Vec<StackFrame> {
        let Some(stack) = innermost_stack(err) else {
            return Vec::new();
        };

        stack
            .frames()
            .iter()
            .filter_map(|&frame| {
                let resolved = self.resolver.resolve(frame);
                if resolved.is_none() {
                    tracing::trace!(pc = frame.pc(), "dropping unresolved stack frame");
                }
                resolved
            })
            .collect()
    }

    /// [`format`](Self::format) for any error value, via [`find_traceable`].
    pub fn format_error(&self, err: Option<&(dyn Error + 'static)>) -> Vec<u8> {
        self.format(err.and_then(find_traceable))
    }

    /// Render the dump for `err`: a header line for the calling thread, then
    /// two lines per resolved frame. Empty when there is no error or no
    /// error in the chain carries a stack.
    pub fn format(&self, err: Option<&dyn Traceable>) -> Vec<u8> {
        let Some(err) = err else {
            return Vec::new();
        };
        if innermost_stack(err).is_none() {
            return Vec::new();
        }

        let lines: Vec<String> = self.resolve(err).iter().map(ToString::to_string).collect();

        let mut out = execution_header();
        out.push('\n');
        out.push_str(&lines.join("\n"));
        out.into_bytes()
    }
}

/// The first [`TracedError`] in `err`'s `source()` chain.
///
/// Lets plain `dyn Error` values such as `Box<dyn Error>` be searched for a
/// stack even though they cannot implement [`Traceable`] themselves.
pub fn find_traceable<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a dyn Traceable> {
    std::iter::successors(Some(err), |e: &&'a (dyn Error + 'static)| (*e).source())
        .find_map(|e| e.downcast_ref::<TracedError>())
        .map(|traced| traced as &dyn Traceable)
}

/// [`StackFormatter::format`] with symbols read from the running binary.
pub fn format_stack(err: Option<&dyn Traceable>) -> Vec<u8> {
    StackFormatter::new(BacktraceResolver).format(err)
}

/// [`format_stack`] for any error value. Empty unless a [`TracedError`] is
/// reachable through `source()`.
pub fn format_error_stack(err: Option<&(dyn Error + 'static)>) -> Vec<u8> {
    format_stack(err.and_then(find_traceable))
}
