use serde::{Deserialize, Serialize};

// ============================================================================
// Outcome - Success-or-Failure Sum Type
// ============================================================================
//
// The universal error channel of the kernel. Business failures are values,
// not exceptions: each layer checks `is_failure()` and returns early, so the
// first failure encountered (left to right) short-circuits everything
// downstream. Calling the wrong accessor is a contract violation by the
// caller and panics.
//
// ============================================================================

/// Explicit success-or-failure outcome carrying a message on the failure arm.
///
/// Immutable once constructed. Exactly one of `value()` / `error()` is valid,
/// determined by `is_success()` / `is_failure()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok(T),
    Fail(String),
}

impl<T> Outcome<T> {
    /// Construct a success.
    pub fn ok(value: T) -> Self {
        Self::Ok(value)
    }

    /// Construct a failure carrying an error message.
    pub fn fail(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Borrow the success value.
    ///
    /// Panics when called on a failure; check `is_success()` first.
    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) => value,
            Self::Fail(error) => panic!("called `Outcome::value()` on a failure: {error}"),
        }
    }

    /// Consume the outcome and return the success value.
    ///
    /// Panics when called on a failure; check `is_success()` first.
    pub fn into_value(self) -> T {
        match self {
            Self::Ok(value) => value,
            Self::Fail(error) => panic!("called `Outcome::into_value()` on a failure: {error}"),
        }
    }

    /// Borrow the failure message.
    ///
    /// Panics when called on a success; check `is_failure()` first.
    pub fn error(&self) -> &str {
        match self {
            Self::Ok(_) => panic!("called `Outcome::error()` on a success"),
            Self::Fail(error) => error,
        }
    }

    /// Transform the success value, passing failures through untouched.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Fail(error) => Outcome::Fail(error),
        }
    }

    /// Chain a fallible transformation, short-circuiting on failure.
    pub fn and_then<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Self::Ok(value) => f(value),
            Self::Fail(error) => Outcome::Fail(error),
        }
    }

    /// Fold a sequence of outcomes into one, stopping at the first failure.
    ///
    /// Outcomes are inspected left to right; the first failure wins and later
    /// values are never looked at.
    pub fn combine<I>(outcomes: I) -> Outcome<Vec<T>>
    where
        I: IntoIterator<Item = Outcome<T>>,
    {
        let mut values = Vec::new();
        for outcome in outcomes {
            match outcome {
                Self::Ok(value) => values.push(value),
                Self::Fail(error) => return Outcome::Fail(error),
            }
        }
        Outcome::Ok(values)
    }

    /// View as a standard `Result` without consuming.
    pub fn as_result(&self) -> Result<&T, &str> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Fail(error) => Err(error),
        }
    }
}

impl<T> From<Result<T, String>> for Outcome<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Fail(error),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, String> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Ok(value) => Ok(value),
            Outcome::Fail(error) => Err(error),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_is_success() {
        let outcome = Outcome::ok(42);
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert_eq!(*outcome.value(), 42);
    }

    #[test]
    fn test_fail_is_failure() {
        let outcome: Outcome<i32> = Outcome::fail("balance too low");
        assert!(outcome.is_failure());
        assert!(!outcome.is_success());
        assert_eq!(outcome.error(), "balance too low");
    }

    #[test]
    #[should_panic(expected = "called `Outcome::value()` on a failure")]
    fn test_value_on_failure_panics() {
        let outcome: Outcome<i32> = Outcome::fail("boom");
        let _ = outcome.value();
    }

    #[test]
    #[should_panic(expected = "called `Outcome::error()` on a success")]
    fn test_error_on_success_panics() {
        let outcome = Outcome::ok(1);
        let _ = outcome.error();
    }

    #[test]
    fn test_map_transforms_success_only() {
        let doubled = Outcome::ok(21).map(|v| v * 2);
        assert_eq!(doubled, Outcome::ok(42));

        let failed: Outcome<i32> = Outcome::fail("nope");
        assert_eq!(failed.map(|v| v * 2), Outcome::fail("nope"));
    }

    #[test]
    fn test_and_then_short_circuits() {
        let outcome = Outcome::ok(2)
            .and_then(|v| Outcome::fail(format!("stopped at {v}")))
            .and_then(|v: i32| Outcome::ok(v + 1));
        assert!(outcome.is_failure());
        assert_eq!(outcome.error(), "stopped at 2");
    }

    #[test]
    fn test_combine_returns_first_failure() {
        let outcomes = vec![
            Outcome::ok(1),
            Outcome::fail("first"),
            Outcome::fail("second"),
        ];
        let combined = Outcome::combine(outcomes);
        assert_eq!(combined, Outcome::fail("first"));
    }

    #[test]
    fn test_combine_collects_all_successes() {
        let combined = Outcome::combine(vec![Outcome::ok(1), Outcome::ok(2), Outcome::ok(3)]);
        assert_eq!(combined, Outcome::ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_std_result_interop() {
        let from_ok: Outcome<i32> = Ok(7).into();
        assert_eq!(from_ok, Outcome::ok(7));

        let back: Result<i32, String> = Outcome::fail("broken").into();
        assert_eq!(back, Err("broken".to_string()));
    }
}
