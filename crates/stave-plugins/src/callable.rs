//! Callables contributed by extensions.
//!
//! Everything the bridge can invoke (exported functions, file-type handlers,
//! hooks) is a [`NativeCallable`]. Script-backed callables live in
//! `stave-script`; Rust closures are wrapped with [`native`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

/// The shared context object every callable receives as its receiver.
pub type ContextObject = Map<String, Value>;

/// Single-threaded handle to the shared context.
pub type SharedContext = Rc<RefCell<ContextObject>>;

/// Reference-counted callable, cheap to clone into registries and hook
/// tables.
pub type Callable = Rc<dyn NativeCallable>;

/// Error raised by a callable. The message is preserved verbatim all the
/// way to the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CallError {
    pub message: String,
}

impl CallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A function the evaluation engine (or the host) can call.
pub trait NativeCallable {
    /// Invoke with `receiver` as the implicit `this`. Mutations to the
    /// receiver are visible to later calls.
    fn call(&self, receiver: &mut ContextObject, args: &[Value]) -> Result<Value, CallError>;

    /// Source text of the function, when it came from a script.
    fn source_text(&self) -> Option<&str> {
        None
    }

    /// Declared arity, when the runtime reports one.
    fn arity(&self) -> Option<usize> {
        None
    }
}

/// A Rust closure exposed as a [`NativeCallable`].
pub struct NativeFn<F> {
    f: F,
    arity: Option<usize>,
}

impl<F> NativeFn<F> {
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }
}

impl<F> NativeCallable for NativeFn<F>
where
    F: Fn(&mut ContextObject, &[Value]) -> Result<Value, CallError>,
{
    fn call(&self, receiver: &mut ContextObject, args: &[Value]) -> Result<Value, CallError> {
        (self.f)(receiver, args)
    }

    fn arity(&self) -> Option<usize> {
        self.arity
    }
}

impl<F> fmt::Debug for NativeFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").field("arity", &self.arity).finish()
    }
}

/// Wrap a closure as a [`Callable`].
pub fn native<F>(f: F) -> Callable
where
    F: Fn(&mut ContextObject, &[Value]) -> Result<Value, CallError> + 'static,
{
    Rc::new(NativeFn { f, arity: None })
}

/// Wrap a closure with a declared arity, for wrapper signature synthesis.
pub fn native_with_arity<F>(arity: usize, f: F) -> Callable
where
    F: Fn(&mut ContextObject, &[Value]) -> Result<Value, CallError> + 'static,
{
    Rc::new(NativeFn { f, arity: None }.with_arity(arity))
}
