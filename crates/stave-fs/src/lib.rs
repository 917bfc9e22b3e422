//! Filesystem primitives for Stave
//!
//! Normalized paths, atomic artifact writes, project layout constants and a
//! format-agnostic configuration loader.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::ProjectPath;
pub use error::{Error, Result};
pub use path::NormalizedPath;
