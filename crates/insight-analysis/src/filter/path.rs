//! Path normalization for filter checks.

use std::borrow::Cow;
use std::path::Path;

/// Normalize `path` for matching and display: `/` separators, relative to
/// `root` when it lies under it, no leading `./` or `/`.
pub fn normalize(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut s = relative.to_string_lossy().replace('\\', "/");
    while let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }
    if path.is_absolute() && relative == path {
        // Outside the root: keep it absolute.
        return s;
    }
    s.trim_start_matches('/').to_string()
}

/// Key used for matching and caching. Case-folded unless `case_sensitive`.
pub fn match_key(normalized: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(normalized)
    } else {
        Cow::Owned(normalized.to_lowercase())
    }
}

/// Lowercase extension of the last path component, if any.
pub fn extension(normalized: &str) -> Option<String> {
    let name = normalized.rsplit('/').next().unwrap_or(normalized);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn strips_root_and_dot_prefix() {
        let root = PathBuf::from("/repo");
        assert_eq!(normalize(&root, Path::new("/repo/src/a.ts")), "src/a.ts");
        assert_eq!(normalize(&root, Path::new("./src/a.ts")), "src/a.ts");
        assert_eq!(normalize(&root, Path::new("src\\win\\b.ts")), "src/win/b.ts");
    }

    #[test]
    fn case_folding_only_affects_key() {
        assert_eq!(match_key("Src/A.ts", false), "src/a.ts");
        assert_eq!(match_key("Src/A.ts", true), "Src/A.ts");
    }

    #[test]
    fn extension_of_dotfile_is_none() {
        assert_eq!(extension("dir/.gitignore"), None);
        assert_eq!(extension("dir/A.TS"), Some("ts".to_string()));
    }
}
