// src/lib.rs

//! Depslist generator
//!
//! Computes package dependency lists and a global install order from RPM
//! package headers or TOML package catalogs.
//!
//! # Architecture
//!
//! - Packages: metadata extraction (RPM headers, TOML catalogs)
//! - Resolver: provider index, requirement resolution, transitive closure
//! - Ordering: greedy scheduler over the closed dependency graph
//! - Encoding: unordered and ordered depslist text, HTML report

pub mod config;
pub mod encode;
mod error;
pub mod packages;
pub mod resolver;

pub use config::{DepslistConfig, SchedulePolicy};
pub use error::{Error, Result};
pub use packages::{read_batch, Capability, PackageMetadata, PackageRecord};
pub use resolver::{
    Dependency, DependencySet, InstallOrder, OrderException, PackageId, Resolution,
    ResolutionContext,
};
