//! Per-dialog association with one remote dialog object.
//!
//! A session moves `Uninitialized -> Active -> Closed`. It only becomes
//! `Active` when the manager hands out an object path; if that never
//! happens every method here answers `Error::NotAvailable` and the facade
//! keeps working on its local state alone. After activation, a failed call
//! degrades just that operation and never closes the session; closing
//! happens on facade teardown or heartbeat loss.

use {
    crate::{
        error::{Error, Result},
        heartbeat::HeartbeatHandle,
        protocol::{self, AcceptMode, DialogOption, FileMode},
        rpc::RpcBridge,
    },
    std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    zbus::zvariant::{ObjectPath, OwnedObjectPath},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Closed,
}

pub struct DialogSession {
    remote: Option<Remote>,
    closed: bool,
    lost: Arc<AtomicBool>,
    heartbeat: Option<HeartbeatHandle>,
}

struct Remote {
    rpc: RpcBridge,
    path: OwnedObjectPath,
}

impl DialogSession {
    /// A session that never reached the remote side.
    pub(crate) fn inactive() -> Self {
        Self {
            remote: None,
            closed: false,
            lost: Arc::new(AtomicBool::new(false)),
            heartbeat: None,
        }
    }

    pub(crate) fn active(rpc: RpcBridge, path: OwnedObjectPath) -> Self {
        Self {
            remote: Some(Remote { rpc, path }),
            closed: false,
            lost: Arc::new(AtomicBool::new(false)),
            heartbeat: None,
        }
    }

    pub(crate) fn attach_heartbeat(&mut self, handle: HeartbeatHandle) {
        self.heartbeat = Some(handle);
    }

    /// Flag flipped by the heartbeat worker when the remote stops
    /// answering; it moves the session to `Closed`.
    pub(crate) fn lost_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.lost)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.remote.is_none() {
            SessionState::Uninitialized
        } else if self.closed || self.lost.load(Ordering::SeqCst) {
            SessionState::Closed
        } else {
            SessionState::Active
        }
    }

    #[must_use]
    pub fn object_path(&self) -> Option<&ObjectPath<'static>> {
        self.remote.as_ref().map(|remote| &*remote.path)
    }

    /// Releases the heartbeat exactly once. The remote object belongs to
    /// the remote process and is left alone.
    pub(crate) fn close(&mut self) {
        self.heartbeat.take();
        self.closed = true;
    }

    fn remote(&self) -> Result<&Remote> {
        match (&self.remote, self.state()) {
            (Some(remote), SessionState::Active) => Ok(remote),
            _ => Err(Error::NotAvailable),
        }
    }

    fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
        T: serde::de::DeserializeOwned + zbus::zvariant::Type + std::fmt::Debug,
    {
        let remote = self.remote()?;
        remote
            .rpc
            .call(&remote.path, protocol::DIALOG_INTERFACE, method, body)
    }

    pub fn show(&self) -> Result<()> {
        self.call("show", &())
    }

    pub fn hide(&self) -> Result<()> {
        self.call("hide", &())
    }

    /// Native window identifier of the remote dialog, for transient-for
    /// linkage.
    pub fn win_id(&self) -> Result<u64> {
        self.call("winId", &())
    }

    pub fn set_file_mode(&self, mode: FileMode) -> Result<()> {
        self.call("setFileMode", &(mode.as_i32(),))
    }

    pub fn set_window_title(&self, title: &str) -> Result<()> {
        self.call("setWindowTitle", &(title,))
    }

    pub fn set_current_input_name(&self, name: &str) -> Result<()> {
        self.call("setCurrentInputName", &(name,))
    }

    pub fn set_option(&self, option: DialogOption, on: bool) -> Result<()> {
        self.call("setOption", &(option.as_i32(), on))
    }

    pub fn test_option(&self, option: DialogOption) -> Result<bool> {
        self.call("testOption", &(option.as_i32(),))
    }

    pub fn add_disable_url_scheme(&self, scheme: &str) -> Result<()> {
        self.call("addDisableUrlScheme", &(scheme,))
    }

    pub fn make_heartbeat(&self) -> Result<()> {
        self.call("makeHeartbeat", &())
    }

    pub fn selected_files(&self) -> Result<Vec<String>> {
        self.call("selectedFiles", &())
    }

    pub fn selected_urls(&self) -> Result<Vec<String>> {
        self.call("selectedUrls", &())
    }

    pub fn selected_name_filter(&self) -> Result<String> {
        self.call("selectedNameFilter", &())
    }

    pub fn select_name_filter(&self, filter: &str) -> Result<()> {
        self.call("selectNameFilter", &(filter,))
    }

    fn get_property<T>(&self, name: &str) -> Result<T>
    where
        T: TryFrom<zbus::zvariant::OwnedValue, Error = zbus::zvariant::Error> + std::fmt::Debug,
    {
        let remote = self.remote()?;
        remote
            .rpc
            .get_property(&remote.path, protocol::DIALOG_INTERFACE, name)
    }

    fn set_property<'v, V>(&self, name: &str, value: V) -> Result<()>
    where
        V: Into<zbus::zvariant::Value<'v>>,
    {
        let remote = self.remote()?;
        remote
            .rpc
            .set_property(&remote.path, protocol::DIALOG_INTERFACE, name, value)
    }

    pub fn accept_mode(&self) -> Result<AcceptMode> {
        self.get_property("acceptMode").map(AcceptMode::from_i32)
    }

    pub fn set_accept_mode(&self, mode: AcceptMode) -> Result<()> {
        self.set_property("acceptMode", mode.as_i32())
    }

    pub fn directory_url(&self) -> Result<String> {
        self.get_property("directoryUrl")
    }

    pub fn set_directory_url(&self, url: &str) -> Result<()> {
        self.set_property("directoryUrl", url)
    }

    pub fn name_filters(&self) -> Result<Vec<String>> {
        self.get_property("nameFilters")
    }

    pub fn set_name_filters(&self, filters: Vec<String>) -> Result<()> {
        self.set_property("nameFilters", filters)
    }

    pub fn heartbeat_interval(&self) -> Result<i32> {
        self.get_property("heartbeatInterval")
    }

    pub fn hide_on_accept(&self) -> Result<bool> {
        self.get_property("hideOnAccept")
    }

    pub fn set_hide_on_accept(&self, on: bool) -> Result<()> {
        self.set_property("hideOnAccept", on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_session_is_uninitialized() {
        let session = DialogSession::inactive();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(session.object_path().is_none());
    }

    #[test]
    fn methods_on_inactive_session_report_not_available() {
        let session = DialogSession::inactive();
        assert!(matches!(
            session.set_file_mode(FileMode::ExistingFile),
            Err(Error::NotAvailable)
        ));
        assert!(matches!(session.selected_urls(), Err(Error::NotAvailable)));
        assert!(matches!(session.win_id(), Err(Error::NotAvailable)));
        assert!(matches!(
            session.set_accept_mode(AcceptMode::Save),
            Err(Error::NotAvailable)
        ));
        assert!(matches!(session.heartbeat_interval(), Err(Error::NotAvailable)));
    }

    #[test]
    fn close_is_idempotent_for_the_heartbeat() {
        let mut session = DialogSession::inactive();
        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Uninitialized);
    }
}
