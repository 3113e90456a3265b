//! Shared helpers: path expansion and test scaffolding.

pub mod path;
pub mod testing;
