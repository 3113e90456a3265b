//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).
//! Callers hand in parsed JSON and an RNG; everything else lives further out.

pub mod assembler;
pub mod entities;
pub mod error;
pub mod sampler;
pub mod walker;

pub use assembler::{assemble, group_by_depth, OutputStyle};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use sampler::{bool_combinations, draw, draw_many, draw_one, DrawOptions, Method};
pub use walker::{reduce, reduce_step, reduce_to_results, Reduction, DEFAULT_MAX_DEPTH};
