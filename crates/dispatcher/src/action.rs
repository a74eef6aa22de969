//! Registrable actions
//!
//! An action is chosen as nullary or unary when it is built, so dispatch never
//! needs to inspect a callable's signature.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future produced by invoking an action
pub type ActionFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type NullaryFn = Box<dyn Fn() -> ActionFuture + Send + Sync>;
type UnaryFn<T> = Box<dyn Fn(Option<T>) -> ActionFuture + Send + Sync>;

/// Work bound to a topic
pub enum Action<T> {
    /// Invoked without arguments
    Nullary(NullaryFn),
    /// Invoked with the pending message's value
    Unary(UnaryFn<T>),
}

impl<T> Action<T> {
    /// Build an action that ignores the message value
    pub fn nullary<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Nullary(Box::new(move || Box::pin(f())))
    }

    /// Build an action that receives the message value
    pub fn unary<F, Fut>(f: F) -> Self
    where
        F: Fn(Option<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Unary(Box::new(move |value| Box::pin(f(value))))
    }

    /// Number of parameters the action declares
    pub fn arity(&self) -> usize {
        match self {
            Self::Nullary(_) => 0,
            Self::Unary(_) => 1,
        }
    }

    /// Create the action's future. `value` is dropped for nullary actions.
    pub fn invoke(&self, value: Option<T>) -> ActionFuture {
        match self {
            Self::Nullary(f) => f(),
            Self::Unary(f) => f(value),
        }
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nullary(_) => f.write_str("Action::Nullary"),
            Self::Unary(_) => f.write_str("Action::Unary"),
        }
    }
}
