//! # OpenVR session adapter.
//!
//! [`OpenVr`] implements [`VrRuntime`] on top of the OpenVR C API, loaded at runtime from
//! the `openvr_api` shared library with `libloading`. Nothing is linked at build time, so a
//! machine without the runtime simply sees every connection attempt fail with
//! [`SessionError::Library`] until the library becomes available.
//!
//! ## Entry points
//! ```text
//! VR_InitInternal2(err*, Background, null)          → session token
//! VR_GetGenericInterface("FnTable:IVRSystem_022")   → PollNextEvent, AcknowledgeQuit_Exiting
//! VR_GetGenericInterface("FnTable:IVRApplications_007")
//!                                                   → AddApplicationManifest, IsApplicationInstalled,
//!                                                     SetApplicationAutoLaunch
//! VR_ShutdownInternal()
//! ```
//!
//! The session initialises as a *background* application: it never starts the runtime on
//! its own, so `init` fails until the runtime is up.

use std::{
    ffi::{CStr, CString, c_char, c_void},
    mem,
    path::{Path, PathBuf},
    ptr,
};

use libloading::Library;

use crate::{
    error::SessionError,
    runtime::{RuntimeEvent, VrRuntime},
};

/// `EVRApplicationType::VRApplication_Background`.
const APPLICATION_TYPE_BACKGROUND: i32 = 3;
/// `EVREventType::VREvent_Quit`.
const EVENT_QUIT: u32 = 700;

type InitFn = unsafe extern "C" fn(*mut i32, i32, *const c_char) -> isize;
type ShutdownFn = unsafe extern "C" fn();
type GetInterfaceFn = unsafe extern "C" fn(*const c_char, *mut i32) -> *mut c_void;
type DescribeInitErrorFn = unsafe extern "C" fn(i32) -> *const c_char;

type PollNextEventFn = unsafe extern "system" fn(*mut RawEvent, u32) -> bool;
type AcknowledgeQuitFn = unsafe extern "system" fn();
type AddManifestFn = unsafe extern "system" fn(*const c_char, bool) -> i32;
type IsInstalledFn = unsafe extern "system" fn(*const c_char) -> bool;
type AppErrorNameFn = unsafe extern "system" fn(i32) -> *const c_char;
type SetAutoLaunchFn = unsafe extern "system" fn(*const c_char, bool) -> i32;

/// Leading part of `VR_IVRSystem_FnTable` (interface version 022).
#[repr(C)]
struct SystemFnTable {
    _display_tracking_properties: [usize; 29],
    poll_next_event: PollNextEventFn,
    _events_controllers_firmware: [usize; 13],
    acknowledge_quit_exiting: AcknowledgeQuitFn,
}

/// Leading part of `VR_IVRApplications_FnTable` (interface version 007).
#[repr(C)]
struct ApplicationsFnTable {
    add_application_manifest: AddManifestFn,
    _remove_application_manifest: usize,
    is_application_installed: IsInstalledFn,
    _enumeration_and_launch: [usize; 10],
    applications_error_name: AppErrorNameFn,
    _application_properties: [usize; 3],
    set_application_auto_launch: SetAutoLaunchFn,
}

#[cfg(windows)]
const EVENT_DATA_LEN: usize = 52;
#[cfg(not(windows))]
const EVENT_DATA_LEN: usize = 48;

/// `VREvent_t` with the data union kept opaque.
///
/// The runtime headers pack this struct to 8 bytes on Windows and 4 elsewhere; the data
/// length is chosen so `size_of` matches the packed C layout on both.
#[repr(C)]
#[allow(dead_code)]
struct RawEvent {
    event_type: u32,
    tracked_device_index: u32,
    event_age_seconds: f32,
    data: [u8; EVENT_DATA_LEN],
}

impl RawEvent {
    fn empty() -> Self {
        Self {
            event_type: 0,
            tracked_device_index: 0,
            event_age_seconds: 0.0,
            data: [0; EVENT_DATA_LEN],
        }
    }
}

/// Function pointers resolved for one initialised session.
///
/// Valid until `shutdown` is called; the owning [`OpenVr`] keeps the library loaded.
struct Session {
    shutdown: ShutdownFn,
    poll_next_event: PollNextEventFn,
    acknowledge_quit: AcknowledgeQuitFn,
    add_manifest: AddManifestFn,
    is_installed: IsInstalledFn,
    app_error_name: AppErrorNameFn,
    set_auto_launch: SetAutoLaunchFn,
}

/// OpenVR-backed [`VrRuntime`].
pub struct OpenVr {
    library_path: PathBuf,
    library: Option<Library>,
    session: Option<Session>,
}

impl OpenVr {
    /// Creates an adapter that loads the client library from `library` or, when `None`,
    /// from the platform default name (`openvr_api.dll`, `libopenvr_api.so`, ...).
    pub fn new(library: Option<PathBuf>) -> Self {
        let library_path =
            library.unwrap_or_else(|| PathBuf::from(libloading::library_filename("openvr_api")));
        Self {
            library_path,
            library: None,
            session: None,
        }
    }

    fn load(&mut self) -> Result<&Library, SessionError> {
        if self.library.is_none() {
            // SAFETY: loading the OpenVR client runs only its standard initialisers.
            let lib = unsafe { Library::new(&self.library_path) }.map_err(|e| {
                SessionError::Library {
                    reason: format!("{}: {e}", self.library_path.display()),
                }
            })?;
            self.library = Some(lib);
        }
        self.library.as_ref().ok_or(SessionError::NotConnected)
    }

    fn session(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NotConnected)
    }

    fn app_error(&self, code: i32) -> String {
        match self.session.as_ref() {
            // SAFETY: the name table returns static strings or null.
            Some(s) => unsafe { c_string_or((s.app_error_name)(code), code) },
            None => code.to_string(),
        }
    }
}

impl Session {
    /// Initialises a background session and resolves the function tables.
    ///
    /// # Safety
    /// `lib` must be an OpenVR client library exposing the C entry points.
    unsafe fn open(lib: &Library) -> Result<Self, SessionError> {
        let init: InitFn = unsafe { symbol(lib, b"VR_InitInternal2\0")? };
        let shutdown: ShutdownFn = unsafe { symbol(lib, b"VR_ShutdownInternal\0")? };
        let get_interface: GetInterfaceFn = unsafe { symbol(lib, b"VR_GetGenericInterface\0")? };
        let describe: Option<DescribeInitErrorFn> =
            unsafe { symbol(lib, b"VR_GetVRInitErrorAsEnglishDescription\0").ok() };

        let mut code = 0i32;
        // SAFETY: `code` outlives the call; a null startup-info string is accepted.
        unsafe { init(&mut code, APPLICATION_TYPE_BACKGROUND, ptr::null()) };
        if code != 0 {
            let reason = match describe {
                // SAFETY: the description table returns static strings or null.
                Some(f) => unsafe { c_string_or(f(code), code) },
                None => code.to_string(),
            };
            return Err(SessionError::Init { code, reason });
        }

        // SAFETY: the session is initialised; tables stay valid until shutdown.
        let tables = unsafe {
            (
                table::<SystemFnTable>(get_interface, c"FnTable:IVRSystem_022", "IVRSystem_022"),
                table::<ApplicationsFnTable>(
                    get_interface,
                    c"FnTable:IVRApplications_007",
                    "IVRApplications_007",
                ),
            )
        };
        match tables {
            (Ok(system), Ok(apps)) => Ok(Self {
                shutdown,
                poll_next_event: system.poll_next_event,
                acknowledge_quit: system.acknowledge_quit_exiting,
                add_manifest: apps.add_application_manifest,
                is_installed: apps.is_application_installed,
                app_error_name: apps.applications_error_name,
                set_auto_launch: apps.set_application_auto_launch,
            }),
            (Err(e), _) | (_, Err(e)) => {
                // SAFETY: init succeeded above.
                unsafe { shutdown() };
                Err(e)
            }
        }
    }
}

impl VrRuntime for OpenVr {
    fn init(&mut self) -> Result<(), SessionError> {
        if self.session.is_some() {
            return Ok(());
        }
        let lib = self.load()?;
        // SAFETY: `lib` is the configured OpenVR client library.
        let session = unsafe { Session::open(lib)? };
        self.session = Some(session);
        Ok(())
    }

    fn is_application_installed(&mut self, app_key: &str) -> bool {
        let (Ok(s), Ok(key)) = (self.session(), CString::new(app_key)) else {
            return false;
        };
        // SAFETY: `key` is a valid C string for the duration of the call.
        unsafe { (s.is_installed)(key.as_ptr()) }
    }

    fn add_application_manifest(&mut self, path: &Path) -> Result<(), SessionError> {
        let s = self.session()?;
        let c_path = CString::new(path.display().to_string()).map_err(|e| {
            SessionError::Manifest {
                reason: e.to_string(),
            }
        })?;
        // SAFETY: `c_path` is a valid C string for the duration of the call.
        let code = unsafe { (s.add_manifest)(c_path.as_ptr(), false) };
        if code == 0 {
            Ok(())
        } else {
            Err(SessionError::Manifest {
                reason: self.app_error(code),
            })
        }
    }

    fn set_auto_launch(&mut self, app_key: &str, enabled: bool) -> Result<(), SessionError> {
        let s = self.session()?;
        let key = CString::new(app_key).map_err(|e| SessionError::AutoLaunch {
            reason: e.to_string(),
        })?;
        // SAFETY: `key` is a valid C string for the duration of the call.
        let code = unsafe { (s.set_auto_launch)(key.as_ptr(), enabled) };
        if code == 0 {
            Ok(())
        } else {
            Err(SessionError::AutoLaunch {
                reason: self.app_error(code),
            })
        }
    }

    fn poll_next_event(&mut self) -> Result<Option<RuntimeEvent>, SessionError> {
        let s = self.session()?;
        let mut raw = RawEvent::empty();
        // SAFETY: `raw` is a writable VREvent_t of the size passed alongside it.
        let got = unsafe { (s.poll_next_event)(&mut raw, mem::size_of::<RawEvent>() as u32) };
        Ok(got.then(|| match raw.event_type {
            EVENT_QUIT => RuntimeEvent::Quit,
            other => RuntimeEvent::Other(other),
        }))
    }

    fn acknowledge_quit(&mut self) {
        if let Ok(s) = self.session() {
            // SAFETY: session is live.
            unsafe { (s.acknowledge_quit)() };
        }
    }

    fn shutdown(&mut self) {
        if let Some(s) = self.session.take() {
            // SAFETY: session is live and is not used afterwards.
            unsafe { (s.shutdown)() };
        }
    }
}

impl Drop for OpenVr {
    fn drop(&mut self) {
        self.shutdown();
    }
}

unsafe fn symbol<T: Copy>(lib: &Library, name: &[u8]) -> Result<T, SessionError> {
    // SAFETY: caller picks `T` matching the exported symbol's signature.
    unsafe { lib.get::<T>(name) }
        .map(|s| *s)
        .map_err(|e| SessionError::Library {
            reason: e.to_string(),
        })
}

unsafe fn table<T>(
    get: GetInterfaceFn,
    version: &CStr,
    name: &'static str,
) -> Result<&'static T, SessionError> {
    let mut code = 0i32;
    // SAFETY: `version` is NUL-terminated and `code` outlives the call.
    let raw = unsafe { get(version.as_ptr(), &mut code) };
    if code != 0 || raw.is_null() {
        return Err(SessionError::Interface { name, code });
    }
    // SAFETY: the runtime returns a function table of the requested version.
    Ok(unsafe { &*raw.cast::<T>() })
}

unsafe fn c_string_or(p: *const c_char, code: i32) -> String {
    if p.is_null() {
        code.to_string()
    } else {
        // SAFETY: non-null pointers from the runtime are NUL-terminated static strings.
        unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
    }
}
