//! Shared object-key construction.
//!
//! `key = join(remote_dir segments..., relpath)` with `/`; no remote dir
//! means `relpath` unchanged. The relative path is taken byte-for-byte: no
//! normalization, trimming, or re-escaping.

/// Build the backend object key for a tenant-relative path.
pub fn remote_key(remote_dir: Option<&[String]>, relpath: &str) -> String {
    match remote_dir {
        None => relpath.to_string(),
        Some(segments) => {
            let mut parts: Vec<&str> = segments.iter().map(String::as_str).collect();
            parts.push(relpath);
            parts.join("/")
        }
    }
}
