//! Embedded JavaScript runtime for Stave extensions.
//!
//! [`ScriptLoader`] evaluates CommonJS-style entry modules inside a
//! `boa_engine` context and hands the host a [`LoadedModule`] whose callables
//! call back into that context. Values cross the boundary as JSON.
//!
//! [`LoadedModule`]: stave_plugins::LoadedModule

pub mod error;
pub mod function;
pub mod loader;
pub mod runtime;

pub use error::{Error, Result};
pub use function::ScriptFunction;
pub use loader::ScriptLoader;
pub use runtime::ScriptRuntime;
