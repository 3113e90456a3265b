//! Randomized vignette generation for behavioral experiments.
//!
//! A treatment tree (JSON) describes hierarchical text fragments; the
//! generator walks it order by order, samples candidate treatments and
//! assembles the picked fragments into a vignette.
//!
//! The crate follows a layered layout:
//! - [`domain`]: tree entities, sampling, walking and text assembly
//! - [`application`]: services orchestrating filesystem and domain logic
//! - [`infrastructure`]: filesystem abstraction and dependency wiring
//! - [`cli`]: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::{ApplicationError, ApplicationResult, GeneratorService, TreeReport};
pub use config::Settings;
pub use domain::{
    DrawOptions, Method, OutputStyle, ResultsObject, TreatmentNode, VignetteObject,
};
pub use infrastructure::ServiceContainer;
