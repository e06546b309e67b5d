//! Flags that steer the freedesktop placement algorithm.
//!
//! These are independent of each other; the default is "all flags on",
//! matching the freedesktop.org Trash Can Specification's own default
//! behaviour.

/// Options controlling how [`crate::move_to_trash`] picks a trash root on
/// freedesktop-compliant systems. Ignored on Windows and macOS, where there
/// is exactly one trash can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrashOptions {
    /// Consider per-volume trash roots at all. When `false`, every item
    /// lands in the home trash regardless of which volume it lives on.
    pub use_top_dirs: bool,

    /// Require the sticky bit on `$topdir/.Trash` before trusting it.
    pub check_sticky_bit: bool,

    /// If the administrator-provided `$topdir/.Trash/$uid` fails checks, try
    /// the user-private `$topdir/.Trash-$uid`.
    pub fallback_to_user_dir: bool,

    /// If both per-volume attempts fail, fall back to the home-volume trash.
    pub fallback_to_home_dir: bool,
}

impl Default for TrashOptions {
    fn default() -> Self {
        TrashOptions {
            use_top_dirs: true,
            check_sticky_bit: true,
            fallback_to_user_dir: true,
            fallback_to_home_dir: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_flags_on() {
        let opts = TrashOptions::default();
        assert!(opts.use_top_dirs);
        assert!(opts.check_sticky_bit);
        assert!(opts.fallback_to_user_dir);
        assert!(opts.fallback_to_home_dir);
    }
}
