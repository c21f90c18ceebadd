use regex::Regex;
use stackdriver_log_formatter::{format_error_stack, format_stack, Traceable, TracedError};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
struct Plain;

impl fmt::Display for Plain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("plain")
    }
}

impl std::error::Error for Plain {}

impl Traceable for Plain {}

#[inline(never)]
fn fails_deep_inside() -> TracedError {
    TracedError::new("synthetic failure")
}

#[inline(never)]
fn wraps_io_failure() -> TracedError {
    let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
    TracedError::wrap(io, "read header")
}

fn wrap_n(mut err: TracedError, depth: usize) -> TracedError {
    for i in 0..depth {
        err = TracedError::with_message(err, format!("layer {i}"));
    }
    err
}

fn dump(err: &dyn Traceable) -> String {
    String::from_utf8(format_stack(Some(err))).unwrap()
}

#[test]
fn nothing_to_render() {
    assert!(format_stack(None).is_empty());
    assert!(format_stack(Some(&Plain)).is_empty());

    let without_stack = TracedError::with_message(Plain, "annotated");
    assert!(format_stack(Some(&without_stack)).is_empty());
}

#[test]
fn dump_follows_runtime_layout() {
    let out = dump(&fails_deep_inside());
    let (header, frames) = out.split_once('\n').unwrap();

    let header_re = Regex::new(r"^\w+ \d+ \[\w+\]:$").unwrap();
    assert!(header_re.is_match(header), "{header}");

    let lines: Vec<&str> = frames.lines().collect();
    assert!(!lines.is_empty());
    assert_eq!(lines.len() % 2, 0, "{out}");

    let pair_re = Regex::new(r"^.+\(\)\n\t.+:\d+ \+0x[0-9a-f]+$").unwrap();
    for pair in lines.chunks(2) {
        let joined = format!("{}\n{}", pair[0], pair[1]);
        assert!(pair_re.is_match(&joined), "{joined}");
    }

    assert!(lines[0].ends_with("fails_deep_inside()"), "{out}");
}

#[test]
fn first_frame_is_where_the_error_was_created() {
    let out = dump(&wraps_io_failure());
    let first = out.lines().nth(1).unwrap();
    assert!(first.ends_with("wraps_io_failure()"), "{out}");
    assert!(!out.contains("TracedError::wrap"), "{out}");

    let out = dump(&fails_deep_inside());
    assert!(!out.contains("TracedError::new"), "{out}");
}

#[test]
fn plain_errors_are_accepted() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
    assert!(format_error_stack(Some(&io)).is_empty());
    assert!(format_error_stack(None).is_empty());

    let root = fails_deep_inside();
    let expected = dump(&root);
    let boxed: Box<dyn Error + Send + Sync> = Box::new(root);
    assert_eq!(String::from_utf8(format_error_stack(Some(&*boxed))).unwrap(), expected);
}

#[test]
fn chain_depth_does_not_change_the_dump() {
    for depth in [0usize, 1, 10, 100] {
        let root = fails_deep_inside();
        let expected = dump(&root);
        let chained = wrap_n(root, depth);
        assert_eq!(dump(&chained), expected, "depth {depth}");
    }
}

#[test]
fn innermost_stack_is_preferred_over_outer_ones() {
    let root = fails_deep_inside();
    let expected = dump(&root);
    let outer = TracedError::wrap(TracedError::with_message(root, "middle"), "outer");
    assert_eq!(dump(&outer), expected);
}
