//! JSON path normalization.

/// Normalizes a JSON path to the `$.a.b` form both engines accept.
///
/// Slash separators become dots. A path already starting with `$.` is kept,
/// a leading `.` gets a `$` prefix and anything else gets `$.`. The path is
/// not validated; a malformed path surfaces when the engine rejects the SQL.
#[must_use]
pub fn normalize_json_path(path: &str) -> String {
    let dotted = path.replace('/', ".");
    if dotted.starts_with("$.") {
        dotted
    } else if dotted.starts_with('.') {
        format!("${dotted}")
    } else {
        format!("$.{dotted}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_spellings() {
        for path in ["a.b.c", "a/b/c", ".a.b.c", "/a/b/c", "$.a.b.c"] {
            assert_eq!(normalize_json_path(path), "$.a.b.c", "{path}");
        }
    }

    #[test]
    fn test_single_segment() {
        assert_eq!(normalize_json_path("name"), "$.name");
        assert_eq!(normalize_json_path("$.name"), "$.name");
    }

    #[test]
    fn test_array_index_kept() {
        assert_eq!(normalize_json_path("tags[0]"), "$.tags[0]");
    }
}
