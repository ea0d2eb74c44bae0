// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use depslist::packages::PackageMetadataBuilder;
use depslist::{DepslistConfig, PackageMetadata, ResolutionContext};
use std::path::PathBuf;
use tempfile::TempDir;

/// Build a package record `name-1.0-1` with the given requirements and
/// Provides entries.
pub fn pkg(name: &str, requires: &[&str], provides: &[&str]) -> PackageMetadata {
    let builder = PackageMetadataBuilder::new()
        .name(name)
        .version("1.0")
        .release("1")
        .size(100);
    let builder = requires.iter().fold(builder, |b, r| b.requires(r));
    provides.iter().fold(builder, |b, p| b.provides(p)).build()
}

/// Configuration without base-system seeding, so orders depend only on
/// the packages under test.
pub fn plain_config() -> DepslistConfig {
    DepslistConfig {
        put_first: Vec::new(),
        base_package: None,
        ..DepslistConfig::default()
    }
}

/// Context with every batch added in order
pub fn context(config: DepslistConfig, batches: &[Vec<PackageMetadata>]) -> ResolutionContext {
    let mut ctx = ResolutionContext::new(config);
    for batch in batches {
        ctx.add_batch(batch);
    }
    ctx
}

/// Write catalog files into a temporary directory.
///
/// Returns (TempDir, paths) - keep the TempDir alive to prevent cleanup.
pub fn write_catalogs(catalogs: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let temp_dir = tempfile::tempdir().unwrap();
    let paths = catalogs
        .iter()
        .map(|(name, content)| {
            let path = temp_dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        })
        .collect();
    (temp_dir, paths)
}
