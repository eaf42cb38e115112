//! The manager endpoint at a fixed object path. It hands out per-dialog
//! objects and resolves MIME types to glob patterns for the filter codec.

use {
    crate::{error::Result, filters::MimeGlobResolver, protocol, rpc::RpcBridge},
    zbus::zvariant::{ObjectPath, OwnedObjectPath},
};

#[derive(Clone)]
pub struct DialogManager {
    rpc: RpcBridge,
}

impl DialogManager {
    #[must_use]
    pub const fn new(rpc: RpcBridge) -> Self {
        Self { rpc }
    }

    fn path() -> ObjectPath<'static> {
        ObjectPath::from_static_str_unchecked(protocol::MANAGER_PATH)
    }

    /// Ask the remote process for a fresh dialog object. The returned path
    /// identifies the session for its whole lifetime.
    pub fn create_dialog(&self, hint: &str) -> Result<OwnedObjectPath> {
        self.rpc.call(
            &Self::path(),
            protocol::MANAGER_INTERFACE,
            "createDialog",
            &(hint,),
        )
    }

    pub fn is_use_file_chooser_dialog(&self) -> Result<bool> {
        self.rpc.call(
            &Self::path(),
            protocol::MANAGER_INTERFACE,
            "isUseFileChooserDialog",
            &(),
        )
    }

    pub fn can_use_file_chooser_dialog(&self, toolkit_id: &str, app_name: &str) -> Result<bool> {
        self.rpc.call(
            &Self::path(),
            protocol::MANAGER_INTERFACE,
            "canUseFileChooserDialog",
            &(toolkit_id, app_name),
        )
    }

    pub fn glob_patterns_for_mime(&self, mime: &str) -> Result<Vec<String>> {
        self.rpc.call(
            &Self::path(),
            protocol::MANAGER_INTERFACE,
            "globPatternsForMime",
            &(mime,),
        )
    }
}

impl MimeGlobResolver for DialogManager {
    fn glob_patterns(&self, mime: &str) -> Option<Vec<String>> {
        self.glob_patterns_for_mime(mime).ok()
    }
}
