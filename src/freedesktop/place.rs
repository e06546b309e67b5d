//! Trash Placement Engine: picks a trash root for a source path, creates its
//! directory structure, resolves name collisions, writes `.trashinfo`
//! atomically, then moves the payload into place.
//!
//! The selection algorithm is spelled out as an explicit decision table over
//! the four [`crate::TrashOptions`] flags rather than the nested-exception
//! fallback chain of the specification's original prose, so each row's
//! outcome (which base directory, or which error) is visible at a glance.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::freedesktop::dirsizes;
use crate::freedesktop::trashinfo;
use crate::freedesktop::volume;
use crate::options::TrashOptions;

/// Which of the four kinds of trash root (spec.md §3) a placement landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashRootKind {
    Home,
    TopDirAdmin,
    TopDirUser,
}

/// A resolved `(base, volumeRoot)` pair, with the `files`/`info`
/// subdirectories it owns.
#[derive(Debug, Clone)]
pub struct TrashRoot {
    pub base: PathBuf,
    pub volume_root: PathBuf,
    pub kind: TrashRootKind,
}

impl TrashRoot {
    pub fn files_dir(&self) -> PathBuf {
        self.base.join("files")
    }

    pub fn info_dir(&self) -> PathBuf {
        self.base.join("info")
    }

    /// `true` for any root that is not the home trash; controls whether
    /// `Path=` is written absolute or relative to `volume_root` (spec.md §9,
    /// "relative iff usingTopdir").
    pub fn using_top_dir(&self) -> bool {
        !matches!(self.kind, TrashRootKind::Home)
    }
}

/// Resolves `$XDG_DATA_HOME`, falling back to `$HOME/.local/share`. Shared
/// by placement and enumeration so the two agree on which volume is "home".
pub(crate) fn home_data_dir() -> Result<PathBuf> {
    if let Ok(v) = std::env::var("XDG_DATA_HOME") {
        if !v.is_empty() {
            return Ok(to_absolute(PathBuf::from(v)));
        }
    }

    let home = std::env::var("HOME").map_err(|_| Error::AccessDenied {
        path: PathBuf::from("$HOME"),
        source: None,
    })?;
    Ok(PathBuf::from(home).join(".local").join("share"))
}

fn to_absolute(p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir().map(|cwd| cwd.join(&p)).unwrap_or(p)
    }
}

pub(crate) fn current_uid() -> u32 {
    // SAFETY: getuid takes no arguments and cannot fail.
    unsafe { libc::getuid() }
}

fn ensure_dir(path: &Path) -> Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if path.is_dir() => {
            let _ = e;
            Ok(())
        }
        Err(e) => Err(Error::access_denied(path, e)),
    }
}

/// Validates `topdir/.Trash` itself against spec.md §4.1's checks (not a
/// symlink, is a directory, sticky bit when required) without touching
/// `topdir/.Trash/$uid`. Shared by placement (which goes on to create the
/// `$uid` subdirectory) and enumeration (which only wants to know whether an
/// existing `$uid` subdirectory may be trusted).
pub(crate) fn validate_admin_topdir(topdir: &Path, check_sticky_bit: bool) -> Result<PathBuf> {
    let admin = topdir.join(".Trash");
    let meta = fs::symlink_metadata(&admin).map_err(|e| Error::TopDirUnavailable {
        path: admin.clone(),
        reason: format!("cannot stat: {e}"),
    })?;

    if meta.file_type().is_symlink() {
        return Err(Error::TopDirUnavailable { path: admin, reason: "is a symbolic link".into() });
    }
    if !meta.is_dir() {
        return Err(Error::TopDirUnavailable { path: admin, reason: "is not a directory".into() });
    }
    if check_sticky_bit && meta.mode() & libc::S_ISVTX == 0 {
        return Err(Error::TopDirUnavailable { path: admin, reason: "sticky bit not set".into() });
    }

    Ok(admin)
}

/// Row (4) of spec.md §4.1's selection algorithm: validate and claim
/// `topdir/.Trash/$uid`.
fn try_topdir_admin(topdir: &Path, uid: u32, check_sticky_bit: bool) -> Result<TrashRoot> {
    let admin = validate_admin_topdir(topdir, check_sticky_bit)?;

    let base = admin.join(uid.to_string());
    ensure_dir(&base)?;
    trace!("admin topdir trash accepted at {}", base.display());
    Ok(TrashRoot { base, volume_root: topdir.to_path_buf(), kind: TrashRootKind::TopDirAdmin })
}

/// Row (5): `topdir/.Trash-$uid`, the user-private fallback.
fn try_topdir_user(topdir: &Path, uid: u32) -> Result<TrashRoot> {
    let base = topdir.join(format!(".Trash-{uid}"));
    ensure_dir(&base)?;
    trace!("user topdir trash accepted at {}", base.display());
    Ok(TrashRoot { base, volume_root: topdir.to_path_buf(), kind: TrashRootKind::TopDirUser })
}

fn home_trash_root(home_data: &Path) -> Result<TrashRoot> {
    let base = home_data.join("Trash");
    ensure_dir(&base)?;
    let volume_root = volume::top_dir(home_data)?;
    Ok(TrashRoot { base, volume_root, kind: TrashRootKind::Home })
}

/// Implements spec.md §4.1's selection algorithm as an explicit decision
/// table over `(use_top_dirs, check_sticky_bit, fallback_to_user_dir,
/// fallback_to_home_dir)`.
pub fn select_trash_root(source: &Path, options: TrashOptions) -> Result<TrashRoot> {
    let home_data = home_data_dir()?;

    if !options.use_top_dirs {
        debug!("use_top_dirs disabled, using home trash");
        return home_trash_root(&home_data);
    }

    let file_top_dir = volume::top_dir(source)?;
    let data_top_dir = volume::top_dir(&home_data)?;

    if file_top_dir == data_top_dir {
        debug!("source shares the home volume, using home trash");
        return home_trash_root(&home_data);
    }

    let uid = current_uid();

    let admin_err = match try_topdir_admin(&file_top_dir, uid, options.check_sticky_bit) {
        Ok(root) => return Ok(root),
        Err(e) => e,
    };
    warn!("admin topdir trash unusable: {admin_err}");

    if options.fallback_to_user_dir {
        match try_topdir_user(&file_top_dir, uid) {
            Ok(root) => return Ok(root),
            Err(e) => {
                warn!("user topdir trash unusable: {e}");
                if !options.fallback_to_home_dir {
                    return Err(e);
                }
            }
        }
    } else if !options.fallback_to_home_dir {
        return Err(admin_err);
    }

    if options.fallback_to_home_dir {
        debug!("falling back to home trash for {}", source.display());
        return home_trash_root(&home_data);
    }

    Err(admin_err)
}

/// Everything placement needs to know about the entry it is about to claim.
struct ClaimedEntry {
    payload_path: PathBuf,
    info_path: PathBuf,
    info_file: std::fs::File,
}

/// The collision loop of spec.md §4.1 step 4: find a leaf name that is free
/// in both `files/` and `info/`, claiming the `.trashinfo` side exclusively.
fn claim_entry(root: &TrashRoot, source_leaf: &str) -> Result<ClaimedEntry> {
    let files_dir = root.files_dir();
    let info_dir = root.info_dir();

    let (stem, ext) = split_stem_ext(source_leaf);

    for n in 0u64.. {
        let candidate_leaf = suffixed_name(&stem, ext, n);
        let payload_path = files_dir.join(&candidate_leaf);
        let info_path = info_dir.join(format!("{candidate_leaf}.trashinfo"));

        if payload_path.exists() {
            continue;
        }

        match OpenOptions::new().write(true).create_new(true).open(&info_path) {
            Ok(info_file) => return Ok(ClaimedEntry { payload_path, info_path, info_file }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(Error::access_denied(info_path, e)),
        }
    }

    unreachable!("u64 suffix space exhausted")
}

fn split_stem_ext(leaf: &str) -> (&str, Option<&str>) {
    match leaf.rfind('.') {
        // A leading dot (dotfile) is not an extension separator.
        Some(idx) if idx > 0 => (&leaf[..idx], Some(&leaf[idx + 1..])),
        _ => (leaf, None),
    }
}

fn suffixed_name(stem: &str, ext: Option<&str>, n: u64) -> String {
    let with_suffix = if n == 0 { stem.to_string() } else { format!("{stem} {n}") };
    match ext {
        Some(ext) => format!("{with_suffix}.{ext}"),
        None => with_suffix,
    }
}

/// Places `source` (an absolute, existing path) into the trash, per spec.md
/// §4.1. On success, `source` no longer exists.
pub fn place(source: &Path, options: TrashOptions) -> Result<PathBuf> {
    if !source.is_absolute() {
        return Err(Error::InvalidArgument { path: source.to_path_buf() });
    }
    let source_meta = fs::symlink_metadata(source).map_err(|_| Error::NotFound { path: source.to_path_buf() })?;
    let is_dir = source_meta.is_dir();

    let root = select_trash_root(source, options)?;
    ensure_dir(&root.files_dir())?;
    ensure_dir(&root.info_dir())?;

    let leaf = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidArgument { path: source.to_path_buf() })?;

    let path_key = if root.using_top_dir() {
        source
            .strip_prefix(&root.volume_root)
            .map_err(|_| Error::TopDirUnavailable {
                path: root.volume_root.clone(),
                reason: "source is not under its own volume root".into(),
            })?
            .to_string_lossy()
            .into_owned()
    } else {
        source.to_string_lossy().into_owned()
    };

    let deletion_date = trashinfo::now_truncated_to_seconds();
    let body = trashinfo::render(&path_key, deletion_date);

    let mut claimed = claim_entry(&root, leaf)?;
    if let Err(e) = claimed.info_file.write_all(body.as_bytes()) {
        let _ = fs::remove_file(&claimed.info_path);
        return Err(Error::access_denied(&claimed.info_path, e));
    }
    drop(claimed.info_file);

    if let Err(e) = fs::rename(source, &claimed.payload_path) {
        // The rename failed: repair the transient info/payload mismatch
        // rather than leaking a half-created entry to the next enumeration.
        let _ = fs::remove_file(&claimed.info_path);
        return Err(Error::io("rename", e));
    }

    debug!("trashed {} as {}", source.display(), claimed.payload_path.display());

    if is_dir {
        if let Err(e) = dirsizes::record(&root, &claimed.payload_path, &claimed.info_path) {
            warn!("could not update directorysizes cache for {}: {e}", claimed.payload_path.display());
        }
    }

    Ok(claimed.payload_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;

    fn with_home_data_dir<T>(f: impl FnOnce(&Path) -> T) -> T {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_DATA_HOME", dir.path());
        let result = f(dir.path());
        std::env::remove_var("XDG_DATA_HOME");
        result
    }

    #[test]
    #[serial]
    fn places_simple_file_into_home_trash() {
        with_home_data_dir(|data_dir| {
            let src_dir = tempfile::tempdir().unwrap();
            let _ = src_dir; // keep alive, but file must be on the home volume
            let file = data_dir.join("foo.txt");
            fs::write(&file, b"hello").unwrap();

            let trashed = place(&file, TrashOptions::default()).unwrap();
            assert!(!file.exists());
            assert_eq!(fs::read(&trashed).unwrap(), b"hello");

            let info_path = data_dir.join("Trash").join("info").join("foo.txt.trashinfo");
            assert!(info_path.exists());
            let info = trashinfo::parse(&fs::read_to_string(&info_path).unwrap()).unwrap();
            assert_eq!(info.path, file.to_string_lossy());
        });
    }

    #[test]
    #[serial]
    fn collision_law_numbers_duplicates() {
        with_home_data_dir(|data_dir| {
            for _ in 0..3 {
                let file = data_dir.join("dup.txt");
                File::create(&file).unwrap();
                place(&file, TrashOptions::default()).unwrap();
            }

            let files_dir = data_dir.join("Trash").join("files");
            assert!(files_dir.join("dup.txt").exists());
            assert!(files_dir.join("dup 1.txt").exists());
            assert!(files_dir.join("dup 2.txt").exists());
        });
    }

    #[test]
    #[serial]
    fn extensionless_collision_has_no_trailing_dot() {
        with_home_data_dir(|data_dir| {
            for _ in 0..2 {
                let file = data_dir.join("README");
                File::create(&file).unwrap();
                place(&file, TrashOptions::default()).unwrap();
            }
            let files_dir = data_dir.join("Trash").join("files");
            assert!(files_dir.join("README").exists());
            assert!(files_dir.join("README 1").exists());
            assert!(!files_dir.join("README 1.").exists());
        });
    }

    #[test]
    #[serial]
    fn relative_path_is_rejected() {
        with_home_data_dir(|_| {
            let err = place(Path::new("relative/path"), TrashOptions::default()).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument { .. }));
        });
    }

    #[test]
    #[serial]
    fn nonexistent_path_is_rejected() {
        with_home_data_dir(|data_dir| {
            let missing = data_dir.join("does-not-exist");
            let err = place(&missing, TrashOptions::default()).unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }));
        });
    }

    #[test]
    #[serial]
    fn directory_with_nested_content_is_moved_whole() {
        with_home_data_dir(|data_dir| {
            let dir = data_dir.join("a_dir");
            fs::create_dir_all(dir.join("nested")).unwrap();
            fs::write(dir.join("nested").join("f.txt"), b"x").unwrap();

            let trashed = place(&dir, TrashOptions::default()).unwrap();
            assert!(trashed.join("nested").join("f.txt").exists());
        });
    }

    #[test]
    #[serial]
    fn path_with_spaces_percent_and_unicode_round_trips() {
        with_home_data_dir(|data_dir| {
            let file = data_dir.join("100% done – café.txt");
            fs::write(&file, b"x").unwrap();

            place(&file, TrashOptions::default()).unwrap();

            let info_path = data_dir.join("Trash").join("info").join("100% done – café.txt.trashinfo");
            let info = trashinfo::parse(&fs::read_to_string(&info_path).unwrap()).unwrap();
            assert_eq!(info.path, file.to_string_lossy());
        });
    }
}
