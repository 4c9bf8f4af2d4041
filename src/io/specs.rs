/// The syntax of proposition and state names.
pub(crate) const NAME_PATTERN: &str = r"[_[:alpha:]][_[:alnum:]]*";

/// The type of callback functions to call when warnings are raised while reading an input file.
///
/// The first argument is the (1-based) index of the line which raised the warning.
pub type WarningHandler = Box<dyn Fn(usize, String)>;

pub(crate) fn dispatch_warnings(handlers: &[WarningHandler], line: usize, warnings: Vec<String>) {
    for w in warnings.iter() {
        handlers.iter().for_each(|h| (h)(line, w.to_string()));
    }
}

pub(crate) fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}
