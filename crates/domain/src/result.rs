//! Combinators for chaining fallible steps without early returns.
//!
//! `bind` is `and_then` under the name used throughout the handlers, `tap`
//! and `tap_err` run side effects on one track and pass the value through.

/// Extension methods on `Result`.
pub trait ResultExt<T, E>: Sized {
    /// Keeps the success value if `predicate` holds, otherwise fails with `error()`.
    fn ensure<P, F>(self, predicate: P, error: F) -> Result<T, E>
    where
        P: FnOnce(&T) -> bool,
        F: FnOnce() -> E;

    /// Chains a fallible step onto the success track.
    fn bind<U, F>(self, f: F) -> Result<U, E>
    where
        F: FnOnce(T) -> Result<U, E>;

    /// Runs `f` on the success value.
    fn tap<F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&T);

    /// Runs `f` on the success value with mutable access.
    fn tap_mut<F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut T);

    /// Runs `f` on the failure.
    fn tap_err<F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&E);
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn ensure<P, F>(self, predicate: P, error: F) -> Result<T, E>
    where
        P: FnOnce(&T) -> bool,
        F: FnOnce() -> E,
    {
        match self {
            Ok(value) if predicate(&value) => Ok(value),
            Ok(_) => Err(error()),
            Err(err) => Err(err),
        }
    }

    fn bind<U, F>(self, f: F) -> Result<U, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        self.and_then(f)
    }

    fn tap<F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&T),
    {
        self.inspect(f)
    }

    fn tap_mut<F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut T),
    {
        self.map(|mut value| {
            f(&mut value);
            value
        })
    }

    fn tap_err<F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&E),
    {
        self.inspect_err(f)
    }
}
