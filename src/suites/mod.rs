// src/suites/mod.rs

// Lab-level pieces that sit above single experiments: scripted runs, the
// experiment catalog with its routes, and the team roster.

pub mod catalog;
pub mod roster;
pub mod sdk;

pub use catalog::{Catalog, CatalogEntry, ExperimentKind, Route};
pub use sdk::*;
