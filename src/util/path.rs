//! Path helpers for user-supplied file arguments.

use std::path::{Path, PathBuf};

/// Expand `~`, `$VAR` and `${VAR}` in a path.
///
/// Unresolvable variables leave the path unchanged.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_tilde_when_expanding_then_starts_with_home() {
        let home = std::env::var("HOME").expect("HOME should be set");
        let expanded = expand_path(Path::new("~/recipes.json"));
        assert!(expanded.starts_with(&home), "{}", expanded.display());
    }

    #[test]
    fn given_unknown_variable_when_expanding_then_unchanged() {
        let path = Path::new("$RECIPE_TREE_SURELY_UNSET_VAR/r.json");
        assert_eq!(expand_path(path), path);
    }

    #[test]
    fn given_plain_path_when_expanding_then_unchanged() {
        assert_eq!(expand_path(Path::new("data/brick.json")), Path::new("data/brick.json"));
    }
}
