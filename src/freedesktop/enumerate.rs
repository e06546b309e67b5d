//! Trash Enumeration Engine (spec.md §4.2): lazily walks every trash root
//! reachable from the home trash plus each mounted volume's `.Trash/$uid`
//! and `.Trash-$uid`, reading `.trashinfo` files as it goes.
//!
//! State is explicit (root index, current root's `info/` read-dir, the
//! pending entry) rather than built from chained iterator combinators, so a
//! reader can see exactly what "the next root" or "the next entry" means
//! (spec.md §9's redesign note).

use std::fs::{self, ReadDir};
use std::path::PathBuf;

use log::warn;

use crate::error::{Error, Result};
use crate::freedesktop::item::{self, TrashedItem};
use crate::freedesktop::place::{self, TrashRoot, TrashRootKind};
use crate::freedesktop::volume;
use crate::options::TrashOptions;

/// Discovers every trash root this user can plausibly read from: the home
/// trash, then for each mounted volume (skipping the one the home trash
/// already lives on) whichever of `.Trash/$uid` or `.Trash-$uid` exists.
/// Roots that cannot be probed (unreadable `.Trash`, missing directories)
/// are silently skipped rather than failing the whole enumeration.
fn discover_roots(options: TrashOptions) -> Vec<TrashRoot> {
    let mut roots = Vec::new();

    let home_data = match place::home_data_dir() {
        Ok(p) => p,
        Err(e) => {
            warn!("cannot resolve home data directory: {e}");
            return roots;
        }
    };
    let home_base = home_data.join("Trash");
    let home_volume_root = volume::top_dir(&home_data).unwrap_or_else(|_| PathBuf::from("/"));
    if home_base.is_dir() {
        roots.push(TrashRoot { base: home_base, volume_root: home_volume_root.clone(), kind: TrashRootKind::Home });
    }

    if !options.use_top_dirs {
        return roots;
    }

    let uid = place::current_uid();
    let volumes = match volume::mounted_volumes() {
        Ok(v) => v,
        Err(e) => {
            warn!("cannot enumerate mounted volumes: {e}");
            return roots;
        }
    };

    for mounted in volumes {
        let topdir = mounted.mount_point;
        if topdir == home_volume_root {
            continue;
        }

        match place::validate_admin_topdir(&topdir, options.check_sticky_bit) {
            Ok(admin) => {
                let admin_base = admin.join(uid.to_string());
                if admin_base.is_dir() {
                    roots.push(TrashRoot {
                        base: admin_base,
                        volume_root: topdir.clone(),
                        kind: TrashRootKind::TopDirAdmin,
                    });
                }
            }
            Err(e) => warn!("admin topdir trash at {} unusable: {e}", topdir.display()),
        }

        let user_base = topdir.join(format!(".Trash-{uid}"));
        if user_base.is_dir() {
            roots.push(TrashRoot { base: user_base, volume_root: topdir, kind: TrashRootKind::TopDirUser });
        }
    }

    roots
}

/// Lazily yields every trashed item across every discovered root.
pub struct Enumerate {
    roots: std::vec::IntoIter<TrashRoot>,
    current: Option<(TrashRoot, ReadDir)>,
}

/// Builds an [`Enumerate`] iterator over every trash root reachable under
/// `options` (spec.md §4.2's root discovery step).
pub fn enumerate(options: TrashOptions) -> Enumerate {
    Enumerate { roots: discover_roots(options).into_iter(), current: None }
}

impl Iterator for Enumerate {
    type Item = TrashedItem;

    fn next(&mut self) -> Option<TrashedItem> {
        loop {
            if self.current.is_none() {
                let root = self.roots.next()?;
                match fs::read_dir(root.info_dir()) {
                    Ok(rd) => self.current = Some((root, rd)),
                    Err(e) => {
                        warn!("cannot read {}: {e}", root.info_dir().display());
                        continue;
                    }
                }
            }

            let (root, read_dir) = self.current.as_mut().unwrap();

            match read_dir.next() {
                Some(Ok(entry)) => {
                    let info_path = entry.path();
                    if info_path.extension().and_then(|e| e.to_str()) != Some("trashinfo") {
                        continue;
                    }
                    if let Some(item) = materialize(root, &info_path) {
                        return Some(item);
                    }
                }
                Some(Err(e)) => {
                    warn!("error reading trash info directory entry: {e}");
                }
                None => {
                    self.current = None;
                }
            }
        }
    }
}

/// Turns one `.trashinfo` file into a [`TrashedItem`], per spec.md §4.2's
/// "Item materialization" step. Returns `None` (skipping the entry) for any
/// failure: unreadable info file, unparsable content, or a payload that no
/// longer exists. Enumeration swallows per-item errors (spec.md §7); a
/// caller that wants them surfaced should use [`find_item`] instead.
fn materialize(root: &TrashRoot, info_path: &PathBuf) -> Option<TrashedItem> {
    let leaf = info_path.file_stem()?.to_str()?;
    match item::read(root, leaf) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!("skipping {}: {e}", info_path.display());
            None
        }
    }
}

/// Looks up exactly one item by its trash leaf name (the payload's and
/// `.trashinfo`'s shared file stem) across every discovered root. Unlike
/// [`enumerate`]'s lazy iteration, this propagates the failure — including
/// [`Error::Corrupt`] for an unreadable or `Path`-less `.trashinfo` — instead
/// of silently skipping it, per spec.md §7's "explicit API calls surface"
/// rule.
pub fn find_item(options: TrashOptions, leaf: &str) -> Result<TrashedItem> {
    for root in discover_roots(options) {
        if !root.info_dir().join(format!("{leaf}.trashinfo")).is_file() {
            continue;
        }
        return item::read(&root, leaf);
    }
    Err(Error::NotFound { path: PathBuf::from(leaf) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;

    fn with_home_data_dir<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_DATA_HOME", dir.path());
        let result = f(dir.path());
        std::env::remove_var("XDG_DATA_HOME");
        result
    }

    #[test]
    #[serial]
    fn enumerates_a_freshly_trashed_file() {
        with_home_data_dir(|data_dir| {
            let file = data_dir.join("foo.txt");
            fs::write(&file, b"hi").unwrap();
            crate::freedesktop::place::place(&file, TrashOptions::default()).unwrap();

            let items: Vec<_> = enumerate(TrashOptions::default()).collect();
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].restore_path, file);
            assert!(!items[0].is_dir);
        });
    }

    #[test]
    #[serial]
    fn missing_payload_is_skipped() {
        with_home_data_dir(|data_dir| {
            let file = data_dir.join("foo.txt");
            fs::write(&file, b"hi").unwrap();
            let trashed = crate::freedesktop::place::place(&file, TrashOptions::default()).unwrap();

            fs::remove_file(&trashed).unwrap();

            let items: Vec<_> = enumerate(TrashOptions::default()).collect();
            assert!(items.is_empty());
        });
    }

    #[test]
    #[serial]
    fn non_trashinfo_files_in_info_dir_are_ignored() {
        with_home_data_dir(|data_dir| {
            let info_dir = data_dir.join("Trash").join("info");
            fs::create_dir_all(&info_dir).unwrap();
            File::create(info_dir.join("stray.txt")).unwrap();
            fs::create_dir_all(data_dir.join("Trash").join("files")).unwrap();

            let items: Vec<_> = enumerate(TrashOptions::default()).collect();
            assert!(items.is_empty());
        });
    }

    #[test]
    #[serial]
    fn find_item_surfaces_corrupt_trashinfo_that_enumeration_skips() {
        with_home_data_dir(|data_dir| {
            let info_dir = data_dir.join("Trash").join("info");
            let files_dir = data_dir.join("Trash").join("files");
            fs::create_dir_all(&info_dir).unwrap();
            fs::create_dir_all(&files_dir).unwrap();
            File::create(files_dir.join("bad.txt")).unwrap();
            fs::write(info_dir.join("bad.txt.trashinfo"), "[Trash Info]\nDeletionDate=2024-01-01T00:00:00\n").unwrap();

            assert!(enumerate(TrashOptions::default()).collect::<Vec<_>>().is_empty());

            let err = find_item(TrashOptions::default(), "bad.txt").unwrap_err();
            assert!(matches!(err, Error::Corrupt { .. }));
        });
    }

    #[test]
    #[serial]
    fn find_item_returns_not_found_for_unknown_leaf() {
        with_home_data_dir(|_| {
            let err = find_item(TrashOptions::default(), "never-trashed.txt").unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }));
        });
    }
}
