//! The optional `$trash/directorysizes` cache (spec.md §4.7 / SPEC_FULL.md
//! §4.7): one line per trashed directory so file managers can show sizes
//! without walking them. Best-effort only — failures here never fail a
//! placement.

use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use rand::Rng;
use urlencoding::{decode, encode};

use crate::error::{Error, Result};
use crate::freedesktop::place::{TrashRoot, TrashRootKind};

/// Records (or refreshes) the `directorysizes` entry for a just-trashed
/// directory. `payload_path` and `info_path` must already exist.
pub fn record(root: &TrashRoot, payload_path: &Path, info_path: &Path) -> Result<()> {
    let cache_path = root.base.join("directorysizes");

    let size = dir_size(payload_path)?;
    let mtime = fs::metadata(info_path).map_err(|e| Error::io("stat", e))?.mtime() as u64;
    let leaf = payload_path.file_name().and_then(|n| n.to_str()).ok_or_else(|| Error::InvalidArgument {
        path: payload_path.to_path_buf(),
    })?;
    let encoded_leaf = encode(leaf).into_owned();

    let mut kept_lines = Vec::new();
    if let Ok(existing) = fs::read_to_string(&cache_path) {
        for line in existing.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                continue;
            }
            let Ok(decoded) = decode(fields[2]) else { continue };
            if decoded == leaf {
                // Superseded by the fresh entry we're about to append.
                continue;
            }
            if root.files_dir().join(decoded.as_ref()).exists() {
                kept_lines.push(line.to_string());
            }
        }
    }
    kept_lines.push(format!("{size} {mtime} {encoded_leaf}"));

    let temp_dir = match root.kind {
        TrashRootKind::Home => std::env::temp_dir(),
        TrashRootKind::TopDirAdmin | TrashRootKind::TopDirUser => root.base.clone(),
    };
    let mut rng = rand::thread_rng();
    let temp_path: PathBuf = temp_dir.join(format!("directorysizes-{:09}", rng.gen_range(0..1_000_000_000u32)));

    let mut tmp = File::create(&temp_path).map_err(|e| Error::io("create", e))?;
    tmp.write_all(kept_lines.join("\n").as_bytes()).map_err(|e| Error::io("write", e))?;
    tmp.write_all(b"\n").map_err(|e| Error::io("write", e))?;
    drop(tmp);

    fs::rename(&temp_path, &cache_path).map_err(|e| Error::io("rename", e))
}

/// Disk space used by `path` and its contents, counted in 512-byte blocks
/// the way `du -B1` does, symlinks excluded.
fn dir_size(path: &Path) -> Result<u64> {
    let meta = fs::symlink_metadata(path).map_err(|e| Error::io("lstat", e))?;
    if !meta.is_dir() {
        return Ok(meta.blocks() * 512);
    }

    let mut total = meta.blocks() * 512;
    for entry in fs::read_dir(path).map_err(|e| Error::io("readdir", e))? {
        let entry = entry.map_err(|e| Error::io("readdir", e))?;
        let child = entry.path();
        let child_meta = fs::symlink_metadata(&child).map_err(|e| Error::io("lstat", e))?;
        if child_meta.is_symlink() {
            continue;
        } else if child_meta.is_dir() {
            total += dir_size(&child)?;
        } else {
            total += child_meta.blocks() * 512;
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_size_counts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), vec![0u8; 4096]).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b"), vec![0u8; 4096]).unwrap();

        let size = dir_size(dir.path()).unwrap();
        assert!(size > 0);
    }
}
