//! Helpers for absolute, slash-separated repository paths

/// Path of the root node
pub const ROOT_PATH: &str = "/";

/// Whether `path` denotes the root node
pub fn is_root(path: &str) -> bool {
    path == ROOT_PATH
}

/// Whether `path` starts at the root
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Iterate the names along `path`, root excluded
pub fn elements(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|e| !e.is_empty())
}

/// Last element of `path` (empty for the root)
pub fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Parent of `path`, `None` for the root
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) || path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT_PATH),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Append a relative path to `parent`
pub fn concat(parent: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        parent.to_string()
    } else if parent.ends_with('/') {
        format!("{}{}", parent, relative)
    } else {
        format!("{}/{}", parent, relative)
    }
}

/// Whether `ancestor` is a strict ancestor of `path`
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor == path {
        return false;
    }
    if is_root(ancestor) {
        return path.starts_with('/');
    }
    path.starts_with(ancestor) && path[ancestor.len()..].starts_with('/')
}
