//! macOS backend (spec.md §6): a single native call, `FSMoveObjectToTrashSync`
//! preceded by `FSPathMakeRefWithOptions`, both resolved at runtime via
//! `dlopen`/`dlsym` against CoreServices rather than linked at build time.

use std::ffi::{c_void, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

const CORE_SERVICES_PATH: &str = "/System/Library/Frameworks/CoreServices.framework/CoreServices";

const RTLD_LAZY: i32 = 1;
const K_FSPATH_MAKE_REF_DEFAULT_OPTIONS: u32 = 0;
const K_FSFILE_OPERATION_DEFAULT_OPTIONS: u32 = 0;

#[repr(C)]
struct FsRef {
    hidden: [u8; 80],
}

type FsPathMakeRefWithOptionsFn =
    unsafe extern "C" fn(*const u8, u32, *mut FsRef, *mut bool) -> i32;
type FsMoveObjectToTrashSyncFn =
    unsafe extern "C" fn(*const FsRef, *mut FsRef, u32) -> i32;

extern "C" {
    fn dlopen(path: *const i8, mode: i32) -> *mut c_void;
    fn dlsym(handle: *mut c_void, symbol: *const i8) -> *mut c_void;
}

/// Moves `path` to the Finder trash. Resolves both CoreServices entry points
/// on every call rather than caching a handle, matching the spec's
/// description of macOS support as "a single native call" with no
/// process-scoped state.
pub fn move_to_trash(path: &Path) -> Result<()> {
    let framework_path = CString::new(CORE_SERVICES_PATH).expect("no interior NUL");
    let make_ref_symbol = CString::new("FSPathMakeRefWithOptions").expect("no interior NUL");
    let move_to_trash_symbol = CString::new("FSMoveObjectToTrashSync").expect("no interior NUL");

    // SAFETY: CoreServices is a system framework always present on macOS;
    // the function pointers are cast to the documented C signatures.
    unsafe {
        let handle = dlopen(framework_path.as_ptr(), RTLD_LAZY);
        if handle.is_null() {
            return Err(Error::NotSupported);
        }

        let make_ref_ptr = dlsym(handle, make_ref_symbol.as_ptr());
        let move_ptr = dlsym(handle, move_to_trash_symbol.as_ptr());
        if make_ref_ptr.is_null() || move_ptr.is_null() {
            return Err(Error::NotSupported);
        }

        let make_ref: FsPathMakeRefWithOptionsFn = std::mem::transmute(make_ref_ptr);
        let move_to_trash_fn: FsMoveObjectToTrashSyncFn = std::mem::transmute(move_ptr);

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Error::InvalidArgument { path: path.to_path_buf() })?;
        let mut fs_ref = FsRef { hidden: [0u8; 80] };
        let mut is_directory = false;
        let status =
            make_ref(c_path.as_ptr() as *const u8, K_FSPATH_MAKE_REF_DEFAULT_OPTIONS, &mut fs_ref, &mut is_directory);
        if status != 0 {
            return Err(Error::IoError { function_name: "FSPathMakeRefWithOptions", code: status, source: None });
        }

        let mut trashed_ref = FsRef { hidden: [0u8; 80] };
        let status = move_to_trash_fn(&fs_ref, &mut trashed_ref, K_FSFILE_OPERATION_DEFAULT_OPTIONS);
        if status != 0 {
            return Err(Error::IoError { function_name: "FSMoveObjectToTrashSync", code: status, source: None });
        }
    }

    debug!("trashed {}", path.display());
    Ok(())
}
