//! Volume/Topdir Service: resolving the mount point (top directory) that
//! contains a given path, and enumerating the mounted volumes on this host.

use std::ffi::CString;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Returns the mount point of the filesystem containing `path`.
///
/// Implemented by walking up through the path's ancestors and comparing
/// device numbers (`st_dev`) from `lstat`: the moment the device number
/// changes between a child directory and its parent, the child is the mount
/// point. The walk terminates at the filesystem root, which is always a
/// mount point by construction.
pub fn top_dir(path: &Path) -> Result<PathBuf> {
    debug_assert!(path.is_absolute(), "top_dir requires an absolute path");

    let mut child = path.to_path_buf();
    let mut child_dev = lstat_dev(&child)?;

    loop {
        let parent = match child.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => return Ok(child),
        };

        let parent_dev = match lstat_dev(&parent) {
            Ok(dev) => dev,
            // An unreadable ancestor (permission, race) just stops the walk
            // where we are; the last directory we could stat is our best
            // answer for the mount point.
            Err(_) => return Ok(child),
        };

        if parent_dev != child_dev {
            return Ok(child);
        }

        child = parent;
        child_dev = parent_dev;
    }
}

fn lstat_dev(path: &Path) -> Result<u64> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| Error::io("lstat", e))?;
    Ok(meta.dev())
}

/// A single entry from the OS mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedVolume {
    pub mount_point: PathBuf,
}

/// Enumerates valid mount points from the OS mount table (`/etc/mtab`).
/// Entries that cannot be decoded are skipped rather than failing the whole
/// enumeration.
pub fn mounted_volumes() -> Result<Vec<MountedVolume>> {
    let path = CString::new("/etc/mtab").expect("no interior NUL");
    let mode = CString::new("r").expect("no interior NUL");

    // SAFETY: setmntent/getmntent/endmntent operate on a FILE* we own
    // exclusively for the duration of this function and close deterministically.
    unsafe {
        let file = libc::setmntent(path.as_ptr(), mode.as_ptr());
        if file.is_null() {
            return Err(Error::io("setmntent", std::io::Error::last_os_error()));
        }

        let mut volumes = Vec::new();
        loop {
            let entry = libc::getmntent(file);
            if entry.is_null() {
                break;
            }

            let dir_ptr = (*entry).mnt_dir;
            if dir_ptr.is_null() {
                continue;
            }
            let dir = std::ffi::CStr::from_ptr(dir_ptr);
            match dir.to_str() {
                Ok(s) => volumes.push(MountedVolume { mount_point: PathBuf::from(s) }),
                Err(_) => continue,
            }
        }

        libc::endmntent(file);
        Ok(volumes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_dir_of_root_is_root() {
        let result = top_dir(Path::new("/")).unwrap();
        assert_eq!(result, PathBuf::from("/"));
    }

    #[test]
    fn top_dir_of_tmp_subdir_stays_under_same_device_as_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let top = top_dir(&nested).unwrap();
        // The nested directories share tmp's device, so the walk should climb
        // at least up to (and not below) the tempdir's own device boundary.
        let tmp_dev = lstat_dev(dir.path()).unwrap();
        let top_dev = lstat_dev(&top).unwrap();
        assert_eq!(tmp_dev, top_dev);
    }

    #[test]
    fn mounted_volumes_includes_root() {
        let volumes = mounted_volumes().unwrap();
        assert!(volumes.iter().any(|v| v.mount_point == PathBuf::from("/")));
    }
}
