//! Wire-level constants and enums of the remote dialog service.
//!
//! Values cross the bus as plain integers and strings; everything typed
//! lives on this side of the connection.

pub const SERVICE: &str = "com.deepin.filemanager.filedialog";
pub const MANAGER_PATH: &str = "/com/deepin/filemanager/filedialogmanager";
pub const MANAGER_INTERFACE: &str = "com.deepin.filemanager.filedialogmanager";
pub const DIALOG_INTERFACE: &str = "com.deepin.filemanager.filedialog";

/// Signals emitted by a per-dialog remote object. All of them carry at most
/// an integer code; consumers re-query the state they care about.
pub mod signal {
    pub const FINISHED: &str = "finished";
    pub const SELECTION_FILES_CHANGED: &str = "selectionFilesChanged";
    pub const CURRENT_URL_CHANGED: &str = "currentUrlChanged";
    pub const SELECTED_NAME_FILTER_CHANGED: &str = "selectedNameFilterChanged";
}

/// Selection mode of the remote dialog, pushed through `setFileMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileMode {
    AnyFile,
    ExistingFile,
    Directory,
    ExistingFiles,
    DirectoryOnly,
}

impl FileMode {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::AnyFile => 0,
            Self::ExistingFile => 1,
            Self::Directory => 2,
            Self::ExistingFiles => 3,
            Self::DirectoryOnly => 4,
        }
    }
}

/// Open-versus-save intent, mirrored in the remote `acceptMode` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AcceptMode {
    #[default]
    Open,
    Save,
}

impl AcceptMode {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Open => 0,
            Self::Save => 1,
        }
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        if value == 1 { Self::Save } else { Self::Open }
    }
}

/// Payload of the `finished` signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogCode {
    Rejected,
    Accepted,
}

impl DialogCode {
    /// The remote reports 0 for a cancelled dialog and 1 for an accepted
    /// one; anything non-zero counts as accepted.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        if code == 0 { Self::Rejected } else { Self::Accepted }
    }
}

/// Behavior flags understood by `setOption` / `testOption`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogOption {
    ShowDirsOnly,
    DontResolveSymlinks,
    DontConfirmOverwrite,
    DontUseNativeDialog,
    ReadOnly,
    HideNameFilterDetails,
}

impl DialogOption {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::ShowDirsOnly => 0x01,
            Self::DontResolveSymlinks => 0x02,
            Self::DontConfirmOverwrite => 0x04,
            Self::DontUseNativeDialog => 0x08,
            Self::ReadOnly => 0x10,
            Self::HideNameFilterDetails => 0x20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_mode_wire_values() {
        assert_eq!(FileMode::AnyFile.as_i32(), 0);
        assert_eq!(FileMode::ExistingFiles.as_i32(), 3);
        assert_eq!(FileMode::DirectoryOnly.as_i32(), 4);
    }

    #[test]
    fn dialog_code_zero_is_rejected() {
        assert_eq!(DialogCode::from_code(0), DialogCode::Rejected);
        assert_eq!(DialogCode::from_code(1), DialogCode::Accepted);
        assert_eq!(DialogCode::from_code(7), DialogCode::Accepted);
    }

    #[test]
    fn accept_mode_round_trip() {
        assert_eq!(AcceptMode::from_i32(AcceptMode::Save.as_i32()), AcceptMode::Save);
        assert_eq!(AcceptMode::from_i32(0), AcceptMode::Open);
        assert_eq!(AcceptMode::from_i32(-3), AcceptMode::Open);
    }
}
