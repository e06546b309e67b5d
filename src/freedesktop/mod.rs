//! The freedesktop.org Trash Can Specification v1.0 backend: Linux and any
//! other XDG-compliant Unix.

mod dirsizes;
mod display_name;
pub mod enumerate;
mod item;
mod place;
mod trashinfo;
mod volume;

pub use item::TrashedItem;

use std::path::Path;

use crate::error::Result;
use crate::options::TrashOptions;

/// Moves `path` into the trash, per spec.md §4.1.
pub fn move_to_trash(path: &Path, options: TrashOptions) -> Result<()> {
    place::place(path, options)?;
    Ok(())
}

/// A process-scoped handle onto the freedesktop backend. Holds no state of
/// its own (spec.md §5: "the freedesktop backend holds no process-wide
/// mutable state and is reentrant"), but exists to give callers a single,
/// stable type to carry around regardless of platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct Trashcan {
    options: TrashOptions,
}

impl Trashcan {
    pub fn new(options: TrashOptions) -> Trashcan {
        Trashcan { options }
    }

    /// Lazily yields every item across every discovered trash root.
    pub fn by_item(&self) -> enumerate::Enumerate {
        enumerate::enumerate(self.options)
    }

    /// Looks up one item by its trash leaf name, surfacing errors (including
    /// a corrupt `.trashinfo`) that [`Trashcan::by_item`] would otherwise
    /// silently skip.
    pub fn find_item(&self, leaf: &str) -> Result<TrashedItem> {
        enumerate::find_item(self.options, leaf)
    }

    pub fn restore(&self, trashed: &TrashedItem) -> Result<()> {
        item::restore(trashed)
    }

    pub fn erase(&self, trashed: &TrashedItem) -> Result<()> {
        item::erase(trashed)
    }

    pub fn display_name(&self) -> String {
        display_name::display_name()
    }
}
