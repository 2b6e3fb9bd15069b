//! Validation and decomposition of the hierarchical path strings this crate treats as keys.

/// Characters that may never appear in a path segment.
const FORBIDDEN_CHARS: &[char] = &['*', '?', '<', '>', '|', '"', ':'];

/// The root path, always valid, always a directory.
pub const ROOT: &str = "/";

/// Returns true iff `path` satisfies the grammar in the data model: non-empty, begins with `/`,
/// does not end with `/` unless it is exactly the root, contains no `//`, and no segment contains
/// a character from [`FORBIDDEN_CHARS`].
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }
    if path == ROOT {
        return true;
    }
    if path.ends_with('/') || path.contains("//") {
        return false;
    }
    !path.contains(FORBIDDEN_CHARS)
}

/// Returns the parent of `path`. The parent of root is root.
///
/// Panics if `path` is not valid; callers are expected to validate first.
pub fn parent(path: &str) -> String {
    debug_assert!(is_valid_path(path), "parent() called on invalid path {path:?}");
    if path == ROOT {
        return ROOT.to_string();
    }
    match path.rfind('/') {
        Some(0) => ROOT.to_string(),
        Some(idx) => path[..idx].to_string(),
        None => ROOT.to_string(),
    }
}

/// Returns the final path segment (the "file name") of `path`.
///
/// Panics if `path` is not valid; callers are expected to validate first.
pub fn basename(path: &str) -> &str {
    debug_assert!(is_valid_path(path), "basename() called on invalid path {path:?}");
    if path == ROOT {
        return ROOT;
    }
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Joins a directory path and a basename into a child path, e.g. `join("/a", "b") == "/a/b"` and
/// `join("/", "b") == "/b"`.
pub fn join_basename(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_valid() {
        assert!(is_valid_path("/"));
    }

    #[test]
    fn rejects_known_bad_examples() {
        for bad in ["", "a/b", "/a/", "/a//b", "/a*b", "/a?b", "/a<b", "/a>b", "/a|b", "/a\"b", "/a:b"] {
            assert!(!is_valid_path(bad), "expected {bad:?} to be invalid");
        }
    }

    #[test]
    fn accepts_nested_paths() {
        for good in ["/a", "/a/b", "/a/b/c", "/a.txt", "/a-b_c"] {
            assert!(is_valid_path(good), "expected {good:?} to be valid");
        }
    }

    #[test]
    fn parent_and_basename() {
        assert_eq!(parent("/a/b/c"), "/a/b");
        assert_eq!(parent("/a"), "/");
        assert_eq!(parent("/"), "/");
        assert_eq!(basename("/a/b/c"), "c");
        assert_eq!(basename("/a"), "a");
        assert_eq!(basename("/"), "/");
    }

    #[test]
    fn join_basename_roundtrips_with_parent_and_basename() {
        for p in ["/a", "/a/b", "/a/b/c"] {
            assert_eq!(join_basename(&parent(p), basename(p)), p);
        }
    }
}
