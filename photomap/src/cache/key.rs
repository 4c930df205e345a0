//! Cache key derivation.
//!
//! A key is the lowercase hex SHA-256 of the source URL, so every process and
//! every restart maps the same URL to the same file in the flat cache
//! directory. When the URL path ends in a recognised image extension it is
//! appended, which keeps the files openable by ordinary image viewers.

use sha2::{Digest, Sha256};

/// Extensions carried over from the URL into the file name.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "heic", "avif"];

/// Derive the cache file name for `url`.
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hash = format!("{:x}", digest);
    match image_extension(url) {
        Some(ext) => format!("{}.{}", hash, ext),
        None => hash,
    }
}

/// The URL path's image extension, lowercased, if it has a known one.
fn image_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}
