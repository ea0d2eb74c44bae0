// src/packages/rpm.rs

//! RPM package header reader

use crate::error::{Error, Result};
use crate::packages::common::PackageMetadata;
use crate::packages::traits::{Capability, PackageRecord};
use rpm::Package;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// RPM package representation
pub struct RpmPackage {
    /// Where the package was read from
    path: PathBuf,
    /// Resolution-relevant header fields
    meta: PackageMetadata,
}

impl RpmPackage {
    /// Parse the header of an RPM file
    pub fn parse(path: &Path) -> Result<Self> {
        debug!("Parsing RPM package: {}", path.display());

        let parse_error = |reason: String| Error::PackageParse {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path)?;
        let mut buf_reader = BufReader::new(file);

        let pkg = Package::parse(&mut buf_reader)
            .map_err(|e| parse_error(format!("not an RPM package: {}", e)))?;

        let name = pkg
            .metadata
            .get_name()
            .map_err(|e| parse_error(format!("missing name: {}", e)))?
            .to_string();
        let version = pkg
            .metadata
            .get_version()
            .map_err(|e| parse_error(format!("missing version: {}", e)))?
            .to_string();
        let release = pkg
            .metadata
            .get_release()
            .map_err(|e| parse_error(format!("missing release: {}", e)))?
            .to_string();

        // Old packages may lack the size tag entirely
        let size = pkg.metadata.get_installed_size().unwrap_or_default();

        let provides = Self::extract_capabilities(pkg.metadata.get_provides());
        let requires = Self::extract_capabilities(pkg.metadata.get_requires());
        let files = Self::extract_files(&pkg);

        debug!(
            "Parsed RPM: {}-{}-{} ({} provides, {} requires, {} files)",
            name,
            version,
            release,
            provides.len(),
            requires.len(),
            files.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            meta: PackageMetadata {
                name,
                version,
                release,
                size,
                provides,
                requires,
                files,
            },
        })
    }

    /// Convert a Provides or Requires tag into capabilities
    fn extract_capabilities(
        entries: std::result::Result<Vec<rpm::Dependency>, rpm::Error>,
    ) -> Vec<Capability> {
        entries
            .unwrap_or_default()
            .into_iter()
            .map(|dep| {
                if dep.version.is_empty() {
                    Capability::new(dep.name)
                } else {
                    Capability::with_constraint(
                        dep.name,
                        format!("{}{}", flags_to_operator(dep.flags), dep.version),
                    )
                }
            })
            .collect()
    }

    /// Extract the owned file paths
    fn extract_files(pkg: &Package) -> Vec<String> {
        pkg.metadata
            .get_file_entries()
            .map(|entries| {
                entries
                    .into_iter()
                    .map(|entry| entry.path.to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Path the package was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the file path and keep the metadata
    pub fn into_metadata(self) -> PackageMetadata {
        self.meta
    }
}

/// Convert RPM DependencyFlags to constraint operator string
fn flags_to_operator(flags: rpm::DependencyFlags) -> &'static str {
    use rpm::DependencyFlags;

    // Check for combined flags first
    if flags.contains(DependencyFlags::LESS) && flags.contains(DependencyFlags::EQUAL) {
        "<= "
    } else if flags.contains(DependencyFlags::GREATER) && flags.contains(DependencyFlags::EQUAL) {
        ">= "
    } else if flags.contains(DependencyFlags::LESS) {
        "< "
    } else if flags.contains(DependencyFlags::GREATER) {
        "> "
    } else if flags.contains(DependencyFlags::EQUAL) {
        "= "
    } else {
        ""
    }
}

impl PackageRecord for RpmPackage {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn version(&self) -> &str {
        self.meta.version()
    }

    fn release(&self) -> &str {
        self.meta.release()
    }

    fn size(&self) -> u64 {
        self.meta.size()
    }

    fn provides(&self) -> &[Capability] {
        self.meta.provides()
    }

    fn requires(&self) -> &[Capability] {
        self.meta.requires()
    }

    fn files(&self) -> &[String] {
        self.meta.files()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_nonexistent_file() {
        let result = RpmPackage::parse(Path::new("/nonexistent/file.rpm"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_parse_garbage_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an rpm header").unwrap();

        let result = RpmPackage::parse(file.path());
        assert!(matches!(result, Err(Error::PackageParse { .. })));
    }

    #[test]
    fn test_flags_to_operator() {
        use rpm::DependencyFlags;

        assert_eq!(
            flags_to_operator(DependencyFlags::GREATER | DependencyFlags::EQUAL),
            ">= "
        );
        assert_eq!(flags_to_operator(DependencyFlags::EQUAL), "= ");
        assert_eq!(flags_to_operator(DependencyFlags::empty()), "");
    }
}
