//! Static files deployed to the hosting site.
//!
//! The hosting API addresses files by the SHA-256 of their gzipped bytes,
//! so each file is compressed once up front and hashed.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};

/// Files bundled into the binary: (site path, contents).
const BUNDLED: &[(&str, &str)] = &[
    ("/index.html", include_str!("../assets/index.html")),
    ("/404.html", include_str!("../assets/404.html")),
];

/// A gzipped file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    /// Path on the site, with leading slash.
    pub path: String,
    /// Gzipped contents.
    pub gzipped: Vec<u8>,
    /// Lowercase hex SHA-256 of `gzipped`.
    pub sha256: String,
}

impl StaticAsset {
    /// Compress and hash `contents` for `path`.
    pub fn new(path: &str, contents: &[u8]) -> std::io::Result<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(contents)?;
        let gzipped = encoder.finish()?;
        let sha256 = format!("{:x}", Sha256::digest(&gzipped));

        Ok(Self {
            path: path.to_string(),
            gzipped,
            sha256,
        })
    }
}

/// The landing page and 404 page shipped with the site.
pub fn bundled_assets() -> std::io::Result<Vec<StaticAsset>> {
    BUNDLED
        .iter()
        .map(|(path, contents)| StaticAsset::new(path, contents.as_bytes()))
        .collect()
}
