/// Unwraps a `Result<T, E>` inside a function returning `Option<Result<T, E>>`.
///
/// `Ok(t)` yields `t`; `Err(e)` makes the enclosing function return `Some(Err(e))`.
///
/// Meant for `Iterator::next()` implementations over fallible decoders, for example
/// a reader walking variable-length groups in a byte buffer, where a malformed group
/// must surface as an item rather than silently ending the iteration.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err));
            }
        }
    };
}
