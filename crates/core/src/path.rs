//! Helpers for `/`-separated paths relative to the upload root.

/// Directory part of `path`, or `""` when the file sits at the root.
pub(crate) fn dirname(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// Final component of `path`.
pub(crate) fn basename(path: &str) -> &str {
    path.rfind('/').map_or(path, |idx| &path[idx + 1..])
}

/// Joins a directory and a file name, treating `""` as the root.
pub(crate) fn join(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}
