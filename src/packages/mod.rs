// src/packages/mod.rs

//! Package record extraction
//!
//! Every input given on the command line forms one batch: an RPM file, a
//! directory of RPM files, or a TOML catalog. Each reader implements the
//! `PackageRecord` trait and hands back owned `PackageMetadata`.

pub mod catalog;
pub mod common;
pub mod rpm;
pub mod traits;

pub use catalog::Catalog;
pub use common::{PackageMetadata, PackageMetadataBuilder};
pub use self::rpm::RpmPackage;
pub use traits::{Capability, PackageRecord};

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// RPM lead magic
const RPM_MAGIC: [u8; 4] = [0xED, 0xAB, 0xEE, 0xDB];

/// Kind of batch input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single RPM file
    Rpm,
    /// A directory scanned for RPM files
    Directory,
    /// A TOML catalog
    Catalog,
}

/// Detect input kind from file type, extension and magic bytes
pub fn detect_input_kind(path: &Path) -> Result<InputKind> {
    if path.is_dir() {
        return Ok(InputKind::Directory);
    }

    // First try file extension
    match path.extension().and_then(|e| e.to_str()) {
        Some("rpm") => return Ok(InputKind::Rpm),
        Some("toml") => return Ok(InputKind::Catalog),
        _ => {}
    }

    // Fallback to magic bytes detection
    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && magic == RPM_MAGIC {
        return Ok(InputKind::Rpm);
    }

    Err(Error::PackageParse {
        path: path.to_path_buf(),
        reason: "unable to detect input format".to_string(),
    })
}

/// RPM files below a directory, sorted by path
fn rpm_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|e| e == "rpm"))
        .collect();
    files.sort();
    files
}

/// Read every package record of one batch input
pub fn read_batch(path: &Path) -> Result<Vec<PackageMetadata>> {
    let kind = detect_input_kind(path)?;
    debug!("Reading {} as {:?}", path.display(), kind);

    let packages = match kind {
        InputKind::Rpm => vec![RpmPackage::parse(path)?.into_metadata()],
        InputKind::Catalog => Catalog::load(path)?.into_packages(),
        InputKind::Directory => rpm_files_in(path)
            .iter()
            .map(|file| RpmPackage::parse(file).map(RpmPackage::into_metadata))
            .collect::<Result<Vec<_>>>()?,
    };

    info!("Read {} packages from {}", packages.len(), path.display());
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("main.toml");
        std::fs::write(&catalog, "").unwrap();

        assert_eq!(detect_input_kind(&catalog).unwrap(), InputKind::Catalog);
        assert_eq!(detect_input_kind(dir.path()).unwrap(), InputKind::Directory);
        assert_eq!(
            detect_input_kind(Path::new("/nonexistent/foo.rpm")).unwrap(),
            InputKind::Rpm
        );
    }

    #[test]
    fn test_detect_by_magic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xED, 0xAB, 0xEE, 0xDB, 3, 0]).unwrap();
        assert_eq!(detect_input_kind(file.path()).unwrap(), InputKind::Rpm);
    }

    #[test]
    fn test_detect_unknown() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        assert!(detect_input_kind(file.path()).is_err());
    }

    #[test]
    fn test_read_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README"), "not a package").unwrap();

        let packages = read_batch(dir.path()).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_read_catalog_batch() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("media1.toml");
        std::fs::write(
            &catalog,
            "[[package]]\nname = \"setup\"\nversion = \"2.5\"\nrelease = \"1\"\n",
        )
        .unwrap();

        let packages = read_batch(&catalog).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].full_name(), "setup-2.5-1");
    }
}
