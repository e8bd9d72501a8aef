// Shorthand macros in the teacher's style: `err!` collapses
// `return Err(crate::error::Error::Variant(...))` call sites that would
// otherwise repeat themselves across every codec.

/// `err!(Variant(args...))` -> `return Err(crate::error::Error::Variant(args...))`
macro_rules! err {
    ($variant:ident($($arg:expr),+ $(,)?)) => {
        return Err(crate::error::Error::$variant($($arg),+))
    };
    ($variant:ident { $($field:ident : $val:expr),+ $(,)? }) => {
        return Err(crate::error::Error::$variant { $($field: $val),+ })
    };
    ($variant:ident) => {
        return Err(crate::error::Error::$variant)
    };
}

pub(crate) use err;
