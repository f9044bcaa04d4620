//! # Application manifest.
//!
//! The runtime learns about applications through `.vrmanifest` JSON files. When the
//! configured manifest does not exist yet, one is generated for the running executable:
//!
//! ```json
//! {
//!   "source": "builtin",
//!   "applications": [{
//!     "app_key": "vrscripts.lifecycle",
//!     "launch_type": "binary",
//!     "binary_path_windows": "vrscripts.exe",
//!     "is_dashboard_overlay": true,
//!     "strings": { "en_us": { "name": "VR Scripts", "description": "..." } }
//!   }]
//! }
//! ```

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;

/// Serializable `.vrmanifest` document with a single application.
#[derive(Debug, Clone, Serialize)]
pub struct AppManifest {
    source: &'static str,
    applications: Vec<ManifestApp>,
}

#[derive(Debug, Clone, Serialize)]
struct ManifestApp {
    app_key: String,
    launch_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_path_windows: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_path_linux: Option<String>,
    is_dashboard_overlay: bool,
    strings: BTreeMap<&'static str, ManifestStrings>,
}

#[derive(Debug, Clone, Serialize)]
struct ManifestStrings {
    name: String,
    description: String,
}

impl AppManifest {
    /// Describes `binary` (absolute or relative to the manifest) under `app_key`.
    pub fn new(app_key: &str, name: &str, binary: &Path) -> Self {
        let binary = binary.display().to_string();
        let (windows, linux) = if cfg!(windows) {
            (Some(binary), None)
        } else {
            (None, Some(binary))
        };

        let mut strings = BTreeMap::new();
        strings.insert(
            "en_us",
            ManifestStrings {
                name: name.to_string(),
                description: "Runs boot, start and stop scripts around the VR session".to_string(),
            },
        );

        Self {
            source: "builtin",
            applications: vec![ManifestApp {
                app_key: app_key.to_string(),
                launch_type: "binary",
                binary_path_windows: windows,
                binary_path_linux: linux,
                is_dashboard_overlay: true,
                strings,
            }],
        }
    }

    /// Describes the currently running executable.
    pub fn for_current_exe(app_key: &str, name: &str) -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(app_key, name, &exe))
    }

    /// Renders the manifest as pretty JSON.
    pub fn to_json(&self) -> String {
        // Serialization of plain strings and maps cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Writes the manifest to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json())
    }
}

/// Resolves `path` to the absolute form the runtime requires.
pub(crate) fn absolute(path: &Path) -> io::Result<PathBuf> {
    fs::canonicalize(path)
}
