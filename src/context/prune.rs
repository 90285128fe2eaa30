//! Allow-list pruning of the plugin and catalog directories.
//!
//! Only immediate children are considered. Anything nested inside a kept
//! entry is left exactly as it was.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Names of the immediate children of `root`, sorted.
pub(crate) fn top_level_names(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("listing '{}'", root.display()))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Remove every immediate child of `root` whose name is not in `keep`.
///
/// Returns the removed names. Running it again on the same tree removes nothing.
pub fn prune_to(root: &Path, keep: &[String]) -> Result<Vec<String>> {
    if !root.is_dir() {
        bail!("cannot prune '{}': not a directory", root.display());
    }

    let mut removed = Vec::new();
    for name in top_level_names(root)? {
        if keep.iter().any(|kept| *kept == name) {
            continue;
        }
        let path = root.join(&name);
        let file_type = fs::symlink_metadata(&path)
            .with_context(|| format!("inspecting '{}'", path.display()))?
            .file_type();
        if file_type.is_dir() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("removing directory '{}'", path.display()))?;
        } else {
            fs::remove_file(&path)
                .with_context(|| format!("removing file '{}'", path.display()))?;
        }
        removed.push(name);
    }
    Ok(removed)
}

/// Fail unless `root` holds exactly the entries in `keep`.
pub fn ensure_only(root: &Path, keep: &[String]) -> Result<()> {
    let present = top_level_names(root)?;
    let mut expected = keep.to_vec();
    expected.sort();
    if present != expected {
        bail!(
            "'{}' must contain exactly [{}] after pruning, found [{}]",
            root.display(),
            expected.join(", "),
            present.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keep() -> Vec<String> {
        vec!["tpch".to_string(), "jmx".to_string()]
    }

    fn plugin_tree(extra: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in ["tpch", "jmx"].iter().chain(extra) {
            let dir = temp.path().join(name);
            fs::create_dir_all(dir.join("nested")).unwrap();
            fs::write(dir.join("nested/plugin.jar"), b"jar").unwrap();
        }
        temp
    }

    #[test]
    fn prune_keeps_only_allowed_entries() {
        let temp = plugin_tree(&["hive", "iceberg", "kafka"]);
        fs::write(temp.path().join("README"), b"stray").unwrap();

        let removed = prune_to(temp.path(), &keep()).unwrap();
        assert_eq!(removed, vec!["README", "hive", "iceberg", "kafka"]);
        assert_eq!(top_level_names(temp.path()).unwrap(), vec!["jmx", "tpch"]);
        ensure_only(temp.path(), &keep()).unwrap();
    }

    #[test]
    fn prune_with_nothing_extra_is_a_no_op() {
        let temp = plugin_tree(&[]);
        assert!(prune_to(temp.path(), &keep()).unwrap().is_empty());
        ensure_only(temp.path(), &keep()).unwrap();
    }

    #[test]
    fn prune_is_idempotent() {
        let temp = plugin_tree(&["hive", "mysql"]);
        prune_to(temp.path(), &keep()).unwrap();
        let once = top_level_names(temp.path()).unwrap();
        assert!(prune_to(temp.path(), &keep()).unwrap().is_empty());
        assert_eq!(top_level_names(temp.path()).unwrap(), once);
    }

    #[test]
    fn prune_leaves_nested_structure_of_kept_entries() {
        let temp = plugin_tree(&["hive"]);
        fs::create_dir_all(temp.path().join("tpch/hive")).unwrap();
        prune_to(temp.path(), &keep()).unwrap();
        assert!(temp.path().join("tpch/nested/plugin.jar").is_file());
        assert!(temp.path().join("tpch/hive").is_dir());
    }

    #[test]
    fn prune_removes_symlinks_without_following_them() {
        let temp = plugin_tree(&[]);
        std::os::unix::fs::symlink(temp.path().join("tpch"), temp.path().join("alias")).unwrap();
        prune_to(temp.path(), &keep()).unwrap();
        assert!(!temp.path().join("alias").exists());
        assert!(temp.path().join("tpch/nested/plugin.jar").is_file());
    }

    #[test]
    fn ensure_only_reports_missing_allowed_entry() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("tpch")).unwrap();
        let err = ensure_only(temp.path(), &keep()).unwrap_err();
        assert!(err.to_string().contains("found [tpch]"));
    }
}
