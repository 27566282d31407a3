//! # APT Index Library
//!
//! Parsing for the metadata an APT archive publishes under `dists/`: the
//! `Packages` indexes listing binary packages and the `Release` file
//! describing a suite. Index bodies may be served gzip or bzip2 compressed.
//!
//! ## Example
//!
//! ```rust
//! use apt_index::PackageIndex;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = PackageIndex::from_str(
//!     "Package: zero-center\nVersion: 1.0\nArchitecture: all\nSize: 2048\n",
//! )?;
//! assert_eq!(index.len(), 1);
//! assert_eq!(index.packages()[0].size, 2048);
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod control;
pub mod error;
pub mod packages;
pub mod release;

pub use compression::Compression;
pub use error::{AptIndexError, Result};
pub use packages::{compare_versions, PackageIndex, PackageStanza};
pub use release::{parse_date, IndexEntry, Release};

/// Base name of the binary package index inside `binary-<arch>/`.
pub const PACKAGES_INDEX: &str = "Packages";

/// Base name of the suite description file inside `dists/<suite>/`.
pub const RELEASE_FILE: &str = "Release";
