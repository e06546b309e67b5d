//! A cross-platform trash can / recycle bin library.
//!
//! On freedesktop-compliant Unix systems this implements the
//! [freedesktop.org Trash Can Specification](https://specifications.freedesktop.org/trash-spec/trashspec-1.0.html)
//! end to end: multi-volume placement with sticky-bit checks and fallbacks,
//! collision-free naming, atomic metadata, and lazy cross-volume
//! enumeration. On Windows it binds to Shell COM to drive the recycle bin.
//! On macOS it resolves the two CoreServices calls it needs at runtime.
//!
//! The only entry point common to every platform is [`move_to_trash`].
//! Enumeration, restore, erase, and the localized display name are
//! currently implemented for the freedesktop backend via [`Trashcan`].

mod error;
mod options;

pub use error::{Error, Result};
pub use options::TrashOptions;

#[cfg(target_os = "linux")]
#[path = "freedesktop/mod.rs"]
mod platform;

#[cfg(target_os = "windows")]
#[path = "windows.rs"]
mod platform;

#[cfg(target_os = "macos")]
#[path = "macos.rs"]
mod platform;

#[cfg(target_os = "linux")]
pub use platform::TrashedItem;

/// Moves `path` into the trash. `path` must be absolute and must exist.
///
/// On freedesktop systems, `options` steers which trash root is selected;
/// it is ignored on Windows and macOS, where there is exactly one trash can.
pub fn move_to_trash(path: &std::path::Path, options: TrashOptions) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        platform::move_to_trash(path, options)
    }
    #[cfg(target_os = "windows")]
    {
        let _ = options;
        platform::move_to_trash(path)
    }
    #[cfg(target_os = "macos")]
    {
        let _ = options;
        platform::move_to_trash(path)
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        let _ = (path, options);
        Err(Error::NotSupported)
    }
}

/// A process-scoped handle for enumerating, restoring, and erasing items
/// already in the trash, and for reading its localized display name.
///
/// Currently implemented for the freedesktop backend only.
#[cfg(target_os = "linux")]
pub struct Trashcan {
    inner: platform::Trashcan,
}

#[cfg(target_os = "linux")]
impl Trashcan {
    pub fn new(options: TrashOptions) -> Result<Trashcan> {
        Ok(Trashcan { inner: platform::Trashcan::new(options) })
    }

    /// Lazily yields every item across every discovered trash root.
    pub fn by_item(&self) -> impl Iterator<Item = TrashedItem> + '_ {
        self.inner.by_item()
    }

    pub fn restore(&self, item: &TrashedItem) -> Result<()> {
        self.inner.restore(item)
    }

    pub fn erase(&self, item: &TrashedItem) -> Result<()> {
        self.inner.erase(item)
    }

    pub fn display_name(&self) -> String {
        self.inner.display_name()
    }
}

#[cfg(target_os = "windows")]
pub use platform::TrashedItem;

#[cfg(target_os = "windows")]
pub struct Trashcan {
    inner: platform::Trashcan,
}

#[cfg(target_os = "windows")]
impl Trashcan {
    pub fn new(options: TrashOptions) -> Result<Trashcan> {
        let _ = options;
        Ok(Trashcan { inner: platform::Trashcan::new(options)? })
    }

    pub fn by_item(&self) -> Result<Vec<TrashedItem>> {
        platform::enumerate(&self.inner)
    }

    pub fn restore(&self, item: &TrashedItem) -> Result<()> {
        platform::restore(item)
    }

    pub fn erase(&self, item: &TrashedItem) -> Result<()> {
        platform::erase(item)
    }

    pub fn display_name(&self) -> String {
        self.inner.display_name()
    }
}
