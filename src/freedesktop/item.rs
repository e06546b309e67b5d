//! A single trashed item and the restore/erase operations over it.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use log::warn;

use crate::error::{Error, Result};
use crate::freedesktop::place::TrashRoot;
use crate::freedesktop::trashinfo;

/// One payload/metadata pair discovered by enumeration.
#[derive(Debug, Clone)]
pub struct TrashedItem {
    /// Absolute path the item should be restored to.
    pub restore_path: PathBuf,
    /// Current location of the payload under some trash root's `files/`.
    pub trashed_path: PathBuf,
    /// Location of the matching `.trashinfo` file under `info/`.
    pub info_path: PathBuf,
    /// When the item was trashed, truncated to whole seconds. `None` if the
    /// `.trashinfo`'s `DeletionDate` could not be parsed.
    pub deletion_date: Option<NaiveDateTime>,
    pub is_dir: bool,
}

/// Reads the `.trashinfo` for `leaf` under `root` and pairs it with its
/// payload, per spec.md §4.2's "Item materialization" step.
///
/// Unlike enumeration (which swallows per-item errors, spec.md §7), this is
/// the explicit single-item lookup that surfaces them: an unreadable or
/// `Path`-less `.trashinfo` is [`Error::Corrupt`]; a missing payload is
/// [`Error::NotFound`].
pub fn read(root: &TrashRoot, leaf: &str) -> Result<TrashedItem> {
    let info_path = root.info_dir().join(format!("{leaf}.trashinfo"));

    let content = fs::read_to_string(&info_path).map_err(|e| Error::io("read", e))?;
    let info = trashinfo::parse(&content).ok_or_else(|| Error::Corrupt {
        path: info_path.clone(),
        reason: "missing or empty Path key".to_string(),
    })?;

    let trashed_path = root.files_dir().join(leaf);
    let meta = fs::symlink_metadata(&trashed_path).map_err(|_| Error::NotFound { path: trashed_path.clone() })?;

    let restore_path =
        if root.using_top_dir() { root.volume_root.join(&info.path) } else { PathBuf::from(&info.path) };

    Ok(TrashedItem { restore_path, trashed_path, info_path, deletion_date: info.deletion_date, is_dir: meta.is_dir() })
}

/// Moves the item back to [`TrashedItem::restore_path`], recreating its
/// parent directory tree if necessary. Best-effort removes the companion
/// `.trashinfo` file — a failure there is logged, not propagated.
pub fn restore(item: &TrashedItem) -> Result<()> {
    if let Some(parent) = item.restore_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io("mkdir", e))?;
    }

    fs::rename(&item.trashed_path, &item.restore_path).map_err(|e| Error::io("rename", e))?;

    if let Err(e) = fs::remove_file(&item.info_path) {
        warn!("restored {} but could not remove {}: {e}", item.restore_path.display(), item.info_path.display());
    }

    Ok(())
}

/// Permanently deletes the item's payload, recursively if it is a
/// directory. Best-effort removes the companion `.trashinfo` file.
pub fn erase(item: &TrashedItem) -> Result<()> {
    let result = if item.is_dir {
        fs::remove_dir_all(&item.trashed_path)
    } else {
        fs::remove_file(&item.trashed_path)
    };
    result.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound { path: item.trashed_path.clone() }
        } else {
            Error::io("remove", e)
        }
    })?;

    if let Err(e) = fs::remove_file(&item.info_path) {
        warn!("erased {} but could not remove {}: {e}", item.trashed_path.display(), item.info_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn restore_recreates_missing_parent_and_moves_payload() {
        let trash_root = tempfile::tempdir().unwrap();
        let restore_root = tempfile::tempdir().unwrap();

        let trashed_path = trash_root.path().join("foo.txt");
        File::create(&trashed_path).unwrap();
        let info_path = trash_root.path().join("foo.txt.trashinfo");
        File::create(&info_path).unwrap();

        let restore_path = restore_root.path().join("nested").join("dir").join("foo.txt");
        let item =
            TrashedItem { restore_path: restore_path.clone(), trashed_path, info_path: info_path.clone(), deletion_date: None, is_dir: false };

        restore(&item).unwrap();
        assert!(restore_path.exists());
        assert!(!info_path.exists());
    }

    #[test]
    fn erase_twice_is_not_silent_success() {
        let trash_root = tempfile::tempdir().unwrap();
        let trashed_path = trash_root.path().join("foo.txt");
        File::create(&trashed_path).unwrap();
        let info_path = trash_root.path().join("foo.txt.trashinfo");
        File::create(&info_path).unwrap();

        let item = TrashedItem {
            restore_path: PathBuf::from("/tmp/unused-restore-path-for-test"),
            trashed_path: trashed_path.clone(),
            info_path,
            deletion_date: None,
            is_dir: false,
        };

        erase(&item).unwrap();
        let second = erase(&item);
        assert!(matches!(second, Err(Error::NotFound { .. })));
    }

    #[test]
    fn erase_removes_directory_recursively() {
        let trash_root = tempfile::tempdir().unwrap();
        let dir = trash_root.path().join("a_dir");
        fs::create_dir_all(dir.join("nested")).unwrap();
        File::create(dir.join("nested").join("f.txt")).unwrap();
        let info_path = trash_root.path().join("a_dir.trashinfo");
        File::create(&info_path).unwrap();

        let item = TrashedItem {
            restore_path: PathBuf::from("/tmp/unused-restore-path-for-test-2"),
            trashed_path: dir.clone(),
            info_path,
            deletion_date: None,
            is_dir: true,
        };

        erase(&item).unwrap();
        assert!(!dir.exists());
    }
}
