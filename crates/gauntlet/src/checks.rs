//! Typed check sugar over the single comparison dispatcher.
//!
//! Each macro stringifies the checked expression for the diagnostic and
//! tags the observed value with its kind; everything downstream is one
//! generic `(value, comparator, expected)` evaluation.

/// Check a signed integer expression.
#[macro_export]
macro_rules! check_sint {
    ($value:expr, $cmp:expr, $expected:expr) => {
        $crate::check(
            stringify!($value),
            $crate::Value::Sint(i64::from($value)),
            $cmp,
            stringify!($expected),
            $expected,
        )
    };
}

/// Check an unsigned integer expression.
#[macro_export]
macro_rules! check_uint {
    ($value:expr, $cmp:expr, $expected:expr) => {
        $crate::check(
            stringify!($value),
            $crate::Value::Uint(u64::from($value)),
            $cmp,
            stringify!($expected),
            $expected,
        )
    };
}

/// Check a floating-point expression.
#[macro_export]
macro_rules! check_flt {
    ($value:expr, $cmp:expr, $expected:expr) => {
        $crate::check(
            stringify!($value),
            $crate::Value::Float(f64::from($value)),
            $cmp,
            stringify!($expected),
            $expected,
        )
    };
}

/// Check a string expression.
#[macro_export]
macro_rules! check_str {
    ($value:expr, $cmp:expr, $expected:expr) => {
        $crate::check(
            stringify!($value),
            $crate::Value::Str(::std::string::String::from($value)),
            $cmp,
            stringify!($expected),
            $expected,
        )
    };
}

/// Check a byte-buffer expression by length and content.
#[macro_export]
macro_rules! check_mem {
    ($value:expr, $cmp:expr, $expected:expr) => {
        $crate::check(
            stringify!($value),
            $crate::Value::Bytes(::std::vec::Vec::from($value)),
            $cmp,
            stringify!($expected),
            $expected,
        )
    };
}

/// Check a pointer-sized address by ordering.
#[macro_export]
macro_rules! check_ptr {
    ($value:expr, $cmp:expr, $expected:expr) => {
        $crate::check(
            stringify!($value),
            $crate::Value::Ptr($value),
            $cmp,
            stringify!($expected),
            $expected,
        )
    };
}
