//! Error handling foundation for the SaverFox AI service.
//!
//! Only the `Result` alias lives here. Context is layered on as a failure
//! moves outward: `saverfox-ai` raises `LlmError` for a single completion
//! call, `saverfox-adventure` wraps it in `GenerationError` or
//! `EvaluationError`, and the server maps the outermost context onto an
//! HTTP status.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
///
/// `C` is the outermost context of the report, which callers read back
/// with `current_context()`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use rootcause::prelude::ResultExt;
    use std::fmt;

    #[derive(Debug, PartialEq, Eq)]
    struct Outer;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("outer layer")
        }
    }

    impl std::error::Error for Outer {}

    fn inner() -> Result<u32, std::num::ParseIntError> {
        Ok("x".parse::<u32>()?)
    }

    fn outer() -> Result<u32, Outer> {
        inner().context(Outer)
    }

    #[test]
    fn outer_context_is_readable_after_wrapping() {
        let err = outer().expect_err("inner parse fails");
        assert_eq!(*err.current_context(), Outer);
    }
}
