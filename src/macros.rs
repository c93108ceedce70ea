//! Helper macros for authoring steps and fixtures.

/// Checks a condition inside a step or fixture.
///
/// A failed check finishes the step with [`Code::Fail`] and records the
/// checked expression (or the given message), while any other panic finishes
/// it with [`Code::Abort`].
///
/// [`Code::Abort`]: crate::result::Code::Abort
/// [`Code::Fail`]: crate::result::Code::Fail
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !$cond {
            ::std::panic!(
                "{}: {}",
                $crate::CHECK_FAILED,
                ::std::stringify!($cond),
            );
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            ::std::panic!(
                "{}: {}",
                $crate::CHECK_FAILED,
                ::std::format_args!($($arg)+),
            );
        }
    };
}

/// Finishes the current step with [`Code::Fail`] and the given message.
///
/// [`Code::Fail`]: crate::result::Code::Fail
#[macro_export]
macro_rules! fail_step {
    ($($arg:tt)+) => {
        ::std::panic!(
            "{}: {}",
            $crate::CHECK_FAILED,
            ::std::format_args!($($arg)+),
        )
    };
}
