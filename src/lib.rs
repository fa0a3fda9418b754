//! Generates Xcode, Visual Studio and FastBuild project files from one
//! description of projects, configurations and solutions.
//!
//! The description is either loaded from a TOML manifest (see `manifest`) or
//! built in memory with the types of `ctx`. Each generator renders its files
//! through the `resolver` template engine, and `output` only rewrites the files
//! whose content changed.

pub mod ctx;
pub mod error;
pub mod gen;
pub mod manifest;
pub mod output;
pub mod platform;
pub mod resolver;
pub mod uid;

pub use error::{Error, Result};
