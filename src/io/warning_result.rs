/// A value which may come with warnings.
///
/// Readers use it to report non-fatal issues without interrupting the parsing.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum WarningResult<T, W> {
    Ok(T),
    Warned(T, Vec<W>),
}

impl<T, W> WarningResult<T, W> {
    /// Builds a value with a single warning if the condition holds, and a plain value otherwise.
    pub(crate) fn warn_if<F>(t: T, condition: bool, warning: F) -> Self
    where
        F: FnOnce() -> W,
    {
        if condition {
            WarningResult::Warned(t, vec![warning()])
        } else {
            WarningResult::Ok(t)
        }
    }

    /// Consumes the warnings, returning the underlying value.
    ///
    /// The warnings are passed to the provided callback.
    pub(crate) fn consume_warnings<F>(self, f: F) -> T
    where
        F: FnOnce(Vec<W>),
    {
        match self {
            WarningResult::Ok(t) => t,
            WarningResult::Warned(t, w) => {
                f(w);
                t
            }
        }
    }

    /// Merges two values, concatenating their warnings.
    pub(crate) fn zip<U>(self, other: WarningResult<U, W>) -> WarningResult<(T, U), W> {
        match (self, other) {
            (WarningResult::Ok(t), WarningResult::Ok(u)) => WarningResult::Ok((t, u)),
            (WarningResult::Ok(t), WarningResult::Warned(u, w))
            | (WarningResult::Warned(t, w), WarningResult::Ok(u)) => {
                WarningResult::Warned((t, u), w)
            }
            (WarningResult::Warned(t, w1), WarningResult::Warned(u, w2)) => {
                WarningResult::Warned((t, u), w1.into_iter().chain(w2).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_if() {
        let r: WarningResult<i32, String> = WarningResult::warn_if(1, false, || "w".to_string());
        assert_eq!(WarningResult::Ok(1), r);
        let r: WarningResult<i32, String> = WarningResult::warn_if(1, true, || "w".to_string());
        assert_eq!(WarningResult::Warned(1, vec!["w".to_string()]), r);
    }

    #[test]
    fn test_consume_warnings() {
        let mut consumed = vec![];
        let value = WarningResult::Warned("q0", vec!["flag set twice".to_string()])
            .consume_warnings(|w| consumed = w);
        assert_eq!("q0", value);
        assert_eq!(vec!["flag set twice".to_string()], consumed);
        let mut called = false;
        assert_eq!(
            2,
            WarningResult::<i32, String>::Ok(2).consume_warnings(|_| called = true)
        );
        assert!(!called);
    }

    #[test]
    fn test_zip() {
        let r1 = WarningResult::Warned(1, vec!["w1".to_string()]);
        let r2 = WarningResult::Warned(2, vec!["w2".to_string()]);
        assert_eq!(
            WarningResult::Warned((1, 2), vec!["w1".to_string(), "w2".to_string()]),
            r1.zip(r2)
        );
        let r1: WarningResult<i32, String> = WarningResult::Ok(1);
        assert_eq!(WarningResult::Ok((1, 2)), r1.zip(WarningResult::Ok(2)));
        let r1: WarningResult<i32, String> = WarningResult::Ok(1);
        assert_eq!(
            WarningResult::Warned((1, 2), vec!["w2".to_string()]),
            r1.zip(WarningResult::Warned(2, vec!["w2".to_string()]))
        );
    }
}
