//! Assertion macros.
//!
//! Each macro captures the asserted source text, file, and line, and records
//! the result on the given [`Scope`](crate::Scope). The `require` forms
//! evaluate to an [`Outcome`](crate::Outcome) meant to be propagated with `?`.

/// Non-mandatory assertion; evaluates to `bool`.
#[macro_export]
macro_rules! check {
    ($scope:expr, $cond:expr $(,)?) => {
        $scope.check($crate::Assertion::new(
            $cond,
            stringify!($cond),
            file!(),
            line!(),
        ))
    };
}

/// Mandatory assertion; evaluates to `Outcome`.
#[macro_export]
macro_rules! require {
    ($scope:expr, $cond:expr $(,)?) => {
        $scope.require($crate::Assertion::new(
            $cond,
            stringify!($cond),
            file!(),
            line!(),
        ))
    };
}

/// Non-mandatory equality assertion recording both values on failure.
#[macro_export]
macro_rules! check_eq {
    ($scope:expr, $expected:expr, $actual:expr $(,)?) => {{
        let (expected, actual) = (&$expected, &$actual);
        $scope.check(
            $crate::Assertion::new(
                *expected == *actual,
                concat!(stringify!($expected), " == ", stringify!($actual)),
                file!(),
                line!(),
            )
            .with_values(format!("{:?}", expected), format!("{:?}", actual)),
        )
    }};
}

/// Mandatory equality assertion recording both values on failure.
#[macro_export]
macro_rules! require_eq {
    ($scope:expr, $expected:expr, $actual:expr $(,)?) => {{
        let (expected, actual) = (&$expected, &$actual);
        $scope.require(
            $crate::Assertion::new(
                *expected == *actual,
                concat!(stringify!($expected), " == ", stringify!($actual)),
                file!(),
                line!(),
            )
            .with_values(format!("{:?}", expected), format!("{:?}", actual)),
        )
    }};
}
