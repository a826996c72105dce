//! Slash-separated VFS path helpers.
//!
//! The VFS root is the empty string. Normalized paths never carry leading,
//! trailing, or doubled separators.

use graphfs_core::{AppError, AppResult};

/// Path separator.
pub const SEPARATOR: char = '/';

/// Collapse leading, trailing, and repeated separators.
pub fn normalize(path: &str) -> String {
    path.split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reject segments that cannot name a resource.
pub fn validate(path: &str) -> AppResult<()> {
    if path.is_empty() {
        return Err(AppError::validation("The root cannot be addressed here"));
    }
    for segment in path.split(SEPARATOR) {
        if segment.is_empty() {
            return Err(AppError::validation(format!("Empty path segment in '{path}'")));
        }
        if segment == "." || segment == ".." {
            return Err(AppError::validation(format!(
                "Relative segment '{segment}' is not allowed"
            )));
        }
        if segment.chars().any(char::is_control) {
            return Err(AppError::validation(format!(
                "Path segment contains control characters: '{}'",
                segment.escape_debug()
            )));
        }
    }
    Ok(())
}

/// Number of segments; zero for the root.
pub fn depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split(SEPARATOR).count()
    }
}

/// Parent path; the root for top-level entries.
pub fn parent(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment.
pub fn name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// First segment: the path of the owning collection.
pub fn top_level(path: &str) -> &str {
    match path.find(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Whether `path` is an immediate child of `parent_path`.
pub fn is_child(path: &str, parent_path: &str) -> bool {
    is_descendant(path, parent_path) && parent(path) == parent_path
}

/// Move `path` from below `from` to below `to`.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    format!("{}{}", to, &path[from.len()..])
}

/// Append a segment.
pub fn join(parent_path: &str, segment: &str) -> String {
    if parent_path.is_empty() {
        segment.to_string()
    } else {
        format!("{parent_path}/{segment}")
    }
}
