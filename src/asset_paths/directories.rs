use super::filters::is_url;

/// Canonical form of a module path: forward slashes, no `~/` or leading `/`.
///
/// External URLs are returned unchanged.
pub fn normalise_module_path(path: &str) -> String {
    let path = path.trim();
    if is_url(path) {
        return path.to_string();
    }

    let path = path.replace('\\', "/");
    let path = path.strip_prefix("~/").unwrap_or(&path);
    path.trim_start_matches('/').to_string()
}

/// Top-level directory a module lives in, used for static file registration.
///
/// `~/scripts/app` and `~/scripts` both live in `scripts`. External URLs and empty paths have
/// no base directory.
pub fn module_base_directory(path: &str) -> Option<String> {
    if is_url(path.trim()) {
        return None;
    }

    let normalised = normalise_module_path(path);
    let mut segments = normalised.split('/').filter(|segment| !segment.is_empty());
    segments.next().map(str::to_string)
}
