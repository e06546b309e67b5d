//! Windows Shell backend (spec.md §4.5): `SHFileOperationW` for placement,
//! `IShellFolder2` enumeration of the recycle bin special folder, and
//! `IFileOperation` for restore/erase.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, trace, warn};
use windows::core::{Interface, PCWSTR};
use windows::Win32::Foundation::*;
use windows::Win32::Globalization::LOCALE_USER_DEFAULT;
use windows::Win32::System::Com::StructuredStorage::PropVariantToBSTR;
use windows::Win32::System::Com::*;
use windows::Win32::System::Ole::{VarDateFromStr, VariantTimeToSystemTime, VAR_DATE_FROM_STR_FLAGS};
use windows::Win32::System::SystemServices::*;
use windows::Win32::UI::Shell::Common::*;
use windows::Win32::UI::Shell::PropertiesSystem::*;
use windows::Win32::UI::Shell::*;

use crate::error::{Error, Result};

const SCID_ORIGINAL_LOCATION: PROPERTYKEY = PROPERTYKEY { fmtid: PSGUID_DISPLACED, pid: PID_DISPLACED_FROM };

impl From<windows::core::Error> for Error {
    fn from(err: windows::core::Error) -> Error {
        Error::IoError { function_name: "windows shell call", code: err.code().0, source: None }
    }
}

fn to_wide_nul(path: impl AsRef<OsStr>) -> Vec<u16> {
    path.as_ref().encode_wide().chain(std::iter::once(0)).collect()
}

/// Double-NUL-terminated, as `SHFileOperationW`'s path list argument requires.
fn to_wide_double_nul(path: impl AsRef<OsStr>) -> Vec<u16> {
    path.as_ref().encode_wide().chain([0, 0]).collect()
}

/// The process-scoped handle: a single-threaded COM apartment plus the
/// recycle bin's `IShellFolder2`, bound once at construction (spec.md §4.5
/// "Construction"). COM is uninitialized on drop.
pub struct Trashcan {
    folder: IShellFolder2,
    display_name: String,
}

impl Trashcan {
    pub fn new(_options: crate::options::TrashOptions) -> Result<Trashcan> {
        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok()?;

            let desktop: IShellFolder = SHGetDesktopFolder()?;
            let mut pidl: *mut ITEMIDLIST = std::ptr::null_mut();
            SHGetSpecialFolderLocation(HWND::default(), CSIDL_BITBUCKET as i32, &mut pidl)?;
            let folder: IShellFolder2 = desktop.BindToObject(pidl, None)?;

            let display_name = recycle_bin_name(&desktop, pidl).unwrap_or_else(|| "Recycle Bin".to_string());
            CoTaskMemFree(Some(pidl as *const core::ffi::c_void));

            Ok(Trashcan { folder, display_name })
        }
    }

    pub fn display_name(&self) -> String {
        self.display_name.clone()
    }
}

impl Drop for Trashcan {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

unsafe fn recycle_bin_name(desktop: &IShellFolder, pidl: *const ITEMIDLIST) -> Option<String> {
    let strret = desktop.GetDisplayNameOf(Some(pidl), SHGDN_NORMAL).ok()?;
    let bstr = StrRetToBSTR(&strret, Some(pidl)).ok()?;
    Some(bstr.to_string())
}

/// `moveToTrash(path)` (spec.md §4.5 "Placement").
pub fn move_to_trash(path: &Path) -> Result<()> {
    let mut wide = to_wide_double_nul(path.as_os_str());

    let mut op = SHFILEOPSTRUCTW {
        hwnd: HWND::default(),
        wFunc: FO_DELETE,
        pFrom: PCWSTR(wide.as_mut_ptr()),
        pTo: PCWSTR::null(),
        fFlags: (FOF_SILENT.0 | FOF_NOCONFIRMATION.0 | FOF_NOERRORUI.0 | FOF_NOCONFIRMMKDIR.0 | FOF_ALLOWUNDO.0) as u16,
        ..Default::default()
    };

    // SAFETY: `wide` outlives the call and is double-NUL-terminated.
    let code = unsafe { SHFileOperationW(&mut op) };
    if code != 0 {
        return Err(Error::IoError { function_name: "SHFileOperationW", code, source: None });
    }
    debug!("trashed {}", path.display());
    Ok(())
}

/// One item discovered in the recycle bin (spec.md §4.5 "Enumeration").
/// Owns its PIDL; freed via the shell's task allocator on drop.
pub struct TrashedItem {
    pidl: *mut ITEMIDLIST,
    pub display_name: String,
    pub original_location: PathBuf,
    pub deletion_date: Option<NaiveDateTime>,
    pub is_dir: bool,
}

impl Drop for TrashedItem {
    fn drop(&mut self) {
        unsafe { CoTaskMemFree(Some(self.pidl as *const core::ffi::c_void)) };
    }
}

/// Enumerates every child of the recycle bin folder (spec.md §4.5
/// "Enumeration").
pub fn enumerate(trashcan: &Trashcan) -> Result<Vec<TrashedItem>> {
    let mut items = Vec::new();

    unsafe {
        let flags = SHCONTF_FOLDERS | SHCONTF_NONFOLDERS | SHCONTF_INCLUDEHIDDEN;
        let enum_objects: IEnumIDList = trashcan.folder.EnumObjects(HWND::default(), flags)?;

        loop {
            let mut fetched = 0u32;
            let mut raw: [*mut ITEMIDLIST; 1] = [std::ptr::null_mut()];
            let hr = enum_objects.Next(&mut raw, Some(&mut fetched));
            if hr.is_err() || fetched == 0 {
                break;
            }
            let child = raw[0];
            if child.is_null() {
                continue;
            }

            let mut attrs: u32 = SFGAO_FOLDER.0;
            let _ = trashcan.folder.GetAttributesOf(&[child], &mut attrs);
            let is_dir = attrs & SFGAO_FOLDER.0 != 0;

            let mut display_name = get_details_string(&trashcan.folder, child, 0).unwrap_or_default();
            let original_location = get_original_location(&trashcan.folder, child).unwrap_or_default();

            let deletion_date = get_details_string(&trashcan.folder, child, 2).and_then(|raw| parse_deletion_date(&raw));

            if let Some(ext) = get_details_string(&trashcan.folder, child, 166) {
                if !ext.is_empty() && !display_name.to_lowercase().ends_with(&format!(".{}", ext.to_lowercase())) {
                    display_name.push('.');
                    display_name.push_str(&ext);
                }
            }

            items.push(TrashedItem { pidl: child, display_name, original_location, deletion_date, is_dir });
        }
    }

    Ok(items)
}

unsafe fn get_details_string(folder: &IShellFolder2, pidl: *const ITEMIDLIST, column: u32) -> Option<String> {
    let mut details = SHELLDETAILS::default();
    folder.GetDetailsOf(Some(pidl), column, &mut details).ok()?;
    let bstr = StrRetToBSTR(&details.str, Some(pidl)).ok()?;
    Some(bstr.to_string())
}

unsafe fn get_original_location(folder: &IShellFolder2, pidl: *const ITEMIDLIST) -> Option<PathBuf> {
    let variant = folder.GetDetailsEx(pidl, &SCID_ORIGINAL_LOCATION).ok()?;
    let bstr = PropVariantToBSTR(&variant).ok()?;
    Some(PathBuf::from(bstr.to_string()))
}

/// Parses the recycle bin's locale-formatted "Date Deleted" column (column
/// 2) into a timestamp. The shell wraps that string in U+200E/U+200F
/// directional marks, which `VarDateFromStr` rejects, so they're stripped
/// first; the remaining text is parsed as an OLE Automation date and then
/// converted to a calendar timestamp.
unsafe fn parse_deletion_date(raw: &str) -> Option<NaiveDateTime> {
    let cleaned: String = raw.chars().filter(|c| *c != '\u{200E}' && *c != '\u{200F}').collect();
    let wide = to_wide_nul(&cleaned);

    let mut var_date: f64 = 0.0;
    if let Err(e) = VarDateFromStr(PCWSTR(wide.as_ptr()), LOCALE_USER_DEFAULT.0, VAR_DATE_FROM_STR_FLAGS(0), &mut var_date)
    {
        warn!("cannot parse deletion date {cleaned:?}: {e}");
        return None;
    }

    let mut systemtime = SYSTEMTIME::default();
    if !VariantTimeToSystemTime(var_date, &mut systemtime).as_bool() {
        warn!("VariantTimeToSystemTime rejected {cleaned:?}");
        return None;
    }

    NaiveDate::from_ymd_opt(systemtime.wYear as i32, systemtime.wMonth as u32, systemtime.wDay as u32)?.and_hms_opt(
        systemtime.wHour as u32,
        systemtime.wMinute as u32,
        systemtime.wSecond as u32,
    )
}

/// `restore(item)` (spec.md §4.5 "Restore").
pub fn restore(item: &TrashedItem) -> Result<()> {
    unsafe {
        let op: IFileOperation = CoCreateInstance(&FileOperation, None, CLSCTX_ALL)?;
        op.SetOperationFlags((FOF_NOCONFIRMATION.0 | FOF_NOERRORUI.0 | FOF_SILENT.0) as u32)?;

        let source_item: IShellItem = SHCreateItemFromIDList(item.pidl)?;

        let dest_wide = to_wide_nul(item.original_location.as_os_str());
        let dest_item: IShellItem = SHCreateItemFromParsingName(PCWSTR(dest_wide.as_ptr()), None)?;
        let dest_folder: IShellFolder = dest_item.BindToHandler(None, &BHID_SFObject)?;

        op.MoveItem(&source_item, &dest_folder, None, None)?;
        op.PerformOperations()?;

        if op.GetAnyOperationsAborted()?.as_bool() {
            return Err(Error::IoError { function_name: "IFileOperation::PerformOperations", code: -1, source: None });
        }
        trace!("restored item to {}", item.original_location.display());
    }
    Ok(())
}

/// `erase(item)` (spec.md §4.5 "Erase").
pub fn erase(item: &TrashedItem) -> Result<()> {
    unsafe {
        let op: IFileOperation = CoCreateInstance(&FileOperation, None, CLSCTX_ALL)?;
        op.SetOperationFlags((FOF_NOCONFIRMATION.0 | FOF_NOERRORUI.0 | FOF_SILENT.0) as u32)?;

        let source_item: IShellItem = SHCreateItemFromIDList(item.pidl)?;

        op.DeleteItem(&source_item, None)?;
        op.PerformOperations()?;

        if op.GetAnyOperationsAborted()?.as_bool() {
            return Err(Error::IoError { function_name: "IFileOperation::PerformOperations", code: -1, source: None });
        }
    }
    Ok(())
}
