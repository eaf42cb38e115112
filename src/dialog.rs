//! The facade dialog callers drive, and the builder that wires a session.
//!
//! The facade always works: when the remote service cannot be reached the
//! session stays uninitialized and every mutator simply settles into the
//! local mirror. State flows one way per direction, caller to remote
//! through the session, remote to caller through the signal handlers.

use {
    crate::{
        bus::Bus,
        error::{Error, Result},
        events::{self, SessionContext},
        filters::{self, FileFilter},
        heartbeat,
        manager::DialogManager,
        options::Options,
        protocol::{self, AcceptMode, DialogCode, DialogOption, FileMode},
        response::{ResponseId, ResponseMap},
        rpc::RpcBridge,
        session::{DialogSession, SessionState},
    },
    parking_lot::Mutex,
    std::sync::{Arc, atomic::Ordering},
};

/// What the caller intends to pick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileChooserAction {
    #[default]
    Open,
    Save,
    SelectFolder,
    CreateFolder,
}

/// Window-system interop the facade cannot do itself. The implementation
/// wraps whatever toolkit window hosts the facade.
pub trait WindowBridge: Send {
    /// Link the remote dialog window as transient for the facade's window.
    fn link_transient(&self, remote_window: u64);
    /// Show or hide the facade's own window.
    fn set_visible(&self, visible: bool);
}

/// Local mirror of everything the caller can observe. Shared with the
/// signal drain thread and the heartbeat worker.
#[derive(Default)]
pub(crate) struct DialogState {
    pub(crate) action: FileChooserAction,
    pub(crate) select_multiple: bool,
    pub(crate) title: String,
    pub(crate) current_name: String,
    pub(crate) current_folder: String,
    pub(crate) selection: Vec<String>,
    pub(crate) filters: Vec<FileFilter>,
    pub(crate) current_filter: Option<usize>,
    pub(crate) outcome: Option<ResponseId>,
}

impl DialogState {
    pub(crate) fn accept_mode(&self) -> AcceptMode {
        match self.action {
            FileChooserAction::Save | FileChooserAction::CreateFolder => AcceptMode::Save,
            FileChooserAction::Open | FileChooserAction::SelectFolder => AcceptMode::Open,
        }
    }

    pub(crate) fn file_mode(&self) -> FileMode {
        match self.action {
            FileChooserAction::Open if self.select_multiple => FileMode::ExistingFiles,
            FileChooserAction::Open => FileMode::ExistingFile,
            FileChooserAction::Save => FileMode::AnyFile,
            FileChooserAction::SelectFolder | FileChooserAction::CreateFolder => {
                FileMode::DirectoryOnly
            }
        }
    }
}

/// Fires the caller's terminal callback at most once, from whichever
/// dispatch context reaches the end first.
#[derive(Clone, Default)]
pub(crate) struct Finisher {
    inner: Arc<Mutex<FinisherInner>>,
}

#[derive(Default)]
struct FinisherInner {
    callback: Option<Box<dyn FnMut(ResponseId) + Send>>,
    fired: bool,
}

impl Finisher {
    pub(crate) fn set(&self, callback: Box<dyn FnMut(ResponseId) + Send>) {
        self.inner.lock().callback = Some(callback);
    }

    pub(crate) fn fire(&self, id: ResponseId) {
        let mut inner = self.inner.lock();
        if inner.fired {
            return;
        }
        inner.fired = true;
        if let Some(callback) = inner.callback.as_mut() {
            callback(id);
        }
    }
}

pub struct FileDialogBuilder {
    title: String,
    action: FileChooserAction,
    select_multiple: bool,
    toolkit_id: String,
    responses: Vec<ResponseId>,
    filters: Vec<FileFilter>,
    folder: Option<String>,
    name: Option<String>,
    window: Option<Box<dyn WindowBridge>>,
    options: Option<Options>,
}

impl Default for FileDialogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDialogBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: String::new(),
            action: FileChooserAction::Open,
            select_multiple: false,
            toolkit_id: "gtk3".to_owned(),
            responses: Vec::new(),
            filters: Vec::new(),
            folder: None,
            name: None,
            window: None,
            options: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub const fn action(mut self, action: FileChooserAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub const fn select_multiple(mut self, multiple: bool) -> Self {
        self.select_multiple = multiple;
        self
    }

    /// Identifier the manager matches against its toolkit whitelist.
    #[must_use]
    pub fn toolkit_id(mut self, id: impl Into<String>) -> Self {
        self.toolkit_id = id.into();
        self
    }

    /// Register a response button; precedence among the registered ids
    /// decides which one each outcome reports.
    #[must_use]
    pub fn response(mut self, id: ResponseId) -> Self {
        self.responses.push(id);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FileFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn folder(mut self, url: impl Into<String>) -> Self {
        self.folder = Some(url.into());
        self
    }

    /// Suggested input name for save-style dialogs.
    #[must_use]
    pub fn current_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn window(mut self, window: Box<dyn WindowBridge>) -> Self {
        self.window = Some(window);
        self
    }

    #[must_use]
    pub const fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Build the facade and try to activate a remote session. Activation
    /// failure is not an error; the dialog comes back working locally.
    #[must_use]
    pub fn build(self, bus: &Bus) -> FileDialog {
        let options = self.options.unwrap_or_else(Options::load);
        let map = ResponseMap::resolve(&self.responses);
        let state = Arc::new(Mutex::new(DialogState {
            action: self.action,
            select_multiple: self.select_multiple,
            title: self.title,
            current_name: self.name.unwrap_or_default(),
            current_folder: self.folder.unwrap_or_default(),
            filters: self.filters,
            current_filter: None,
            selection: Vec::new(),
            outcome: None,
        }));
        let finisher = Finisher::default();
        let mut dialog = FileDialog {
            state,
            session: DialogSession::inactive(),
            manager: None,
            map,
            finisher,
            window: self.window,
            options,
        };
        if options.disable {
            tracing::debug!("remote file dialog disabled by configuration");
            return dialog;
        }
        match activate(bus, &self.toolkit_id) {
            Ok((conn, rpc, manager, path)) => {
                dialog.session = DialogSession::active(rpc.clone(), path.clone());
                dialog.start_heartbeat(&rpc, &path);
                let subscribed = events::subscribe(
                    &conn,
                    SessionContext {
                        rpc,
                        path,
                        state: Arc::downgrade(&dialog.state),
                        manager: manager.clone(),
                        map,
                        finisher: dialog.finisher.clone(),
                    },
                );
                if let Err(e) = subscribed {
                    tracing::warn!("signal subscription failed, running blind: {e}");
                }
                dialog.manager = Some(manager);
                dialog.push_initial_state();
            }
            Err(e) => tracing::debug!("remote session not activated: {e}"),
        }
        dialog
    }

    /// A facade with no remote side at all, for embedding and tests.
    #[must_use]
    pub fn build_local(self) -> FileDialog {
        let options = self.options.unwrap_or_default();
        FileDialog {
            state: Arc::new(Mutex::new(DialogState {
                action: self.action,
                select_multiple: self.select_multiple,
                title: self.title,
                current_name: self.name.unwrap_or_default(),
                current_folder: self.folder.unwrap_or_default(),
                filters: self.filters,
                current_filter: None,
                selection: Vec::new(),
                outcome: None,
            })),
            session: DialogSession::inactive(),
            manager: None,
            map: ResponseMap::resolve(&self.responses),
            finisher: Finisher::default(),
            window: self.window,
            options,
        }
    }
}

type Activated = (
    zbus::Connection,
    RpcBridge,
    DialogManager,
    zbus::zvariant::OwnedObjectPath,
);

fn activate(bus: &Bus, toolkit_id: &str) -> Result<Activated> {
    let conn = bus.acquire().ok_or(Error::BusUnavailable)?;
    let rpc = RpcBridge::new(conn.clone());
    let manager = DialogManager::new(rpc.clone());
    if !manager.is_use_file_chooser_dialog()? {
        return Err(Error::Declined);
    }
    if !manager.can_use_file_chooser_dialog(toolkit_id, &app_name())? {
        return Err(Error::Declined);
    }
    let path = manager.create_dialog("")?;
    Ok((conn, rpc, manager, path))
}

fn app_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default()
}

pub struct FileDialog {
    state: Arc<Mutex<DialogState>>,
    session: DialogSession,
    manager: Option<DialogManager>,
    map: ResponseMap,
    finisher: Finisher,
    window: Option<Box<dyn WindowBridge>>,
    options: Options,
}

impl FileDialog {
    #[must_use]
    pub fn builder() -> FileDialogBuilder {
        FileDialogBuilder::new()
    }

    fn start_heartbeat(&mut self, rpc: &RpcBridge, path: &zbus::zvariant::OwnedObjectPath) {
        let Ok(interval) = self.session.heartbeat_interval() else {
            return;
        };
        let Some(period) = heartbeat::period(interval) else {
            tracing::debug!(interval, "heartbeat disabled for this session");
            return;
        };
        let beat = {
            let rpc = rpc.clone();
            let path = path.clone();
            move || {
                rpc.call::<_, ()>(&path, protocol::DIALOG_INTERFACE, "makeHeartbeat", &())
                    .is_ok()
            }
        };
        let on_lost = {
            let lost = self.session.lost_flag();
            let state = Arc::clone(&self.state);
            let map = self.map;
            let finisher = self.finisher.clone();
            move || {
                lost.store(true, Ordering::SeqCst);
                events::finish(&state, map, &finisher, DialogCode::Rejected, || None);
            }
        };
        self.session
            .attach_heartbeat(heartbeat::spawn(period, beat, on_lost));
    }

    fn push_initial_state(&self) {
        let (file_mode, accept_mode, title, folder, name) = {
            let state = self.state.lock();
            (
                state.file_mode(),
                state.accept_mode(),
                state.title.clone(),
                state.current_folder.clone(),
                state.current_name.clone(),
            )
        };
        self.degraded("file mode", self.session.set_file_mode(file_mode));
        self.degraded("accept mode", self.session.set_accept_mode(accept_mode));
        if !title.is_empty() {
            self.degraded("title", self.session.set_window_title(&title));
        }
        if !folder.is_empty() {
            self.degraded("folder", self.session.set_directory_url(&folder));
        }
        if !name.is_empty() {
            self.degraded("input name", self.session.set_current_input_name(&name));
        }
        self.publish_filters();
    }

    /// Log a failed push; `NotAvailable` is the expected silence of a
    /// session that never activated.
    fn degraded(&self, what: &str, result: Result<()>) {
        if let Err(e) = result {
            if !e.is_not_available() {
                tracing::debug!("{what} not applied remotely: {e}");
            }
        }
    }

    /// Callback invoked exactly once when the dialog reaches its terminal
    /// accept or reject outcome.
    pub fn on_response(&self, callback: impl FnMut(ResponseId) + Send + 'static) {
        self.finisher.set(Box::new(callback));
    }

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<ResponseId> {
        self.state.lock().outcome
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.state.lock().title = title.clone();
        self.degraded("title", self.session.set_window_title(&title));
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    pub fn set_action(&self, action: FileChooserAction) {
        let (file_mode, accept_mode) = {
            let mut state = self.state.lock();
            state.action = action;
            (state.file_mode(), state.accept_mode())
        };
        self.degraded("file mode", self.session.set_file_mode(file_mode));
        self.degraded("accept mode", self.session.set_accept_mode(accept_mode));
    }

    #[must_use]
    pub fn action(&self) -> FileChooserAction {
        self.state.lock().action
    }

    pub fn set_select_multiple(&self, multiple: bool) {
        let file_mode = {
            let mut state = self.state.lock();
            state.select_multiple = multiple;
            state.file_mode()
        };
        self.degraded("file mode", self.session.set_file_mode(file_mode));
    }

    pub fn set_current_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.state.lock().current_name = name.clone();
        self.degraded("input name", self.session.set_current_input_name(&name));
    }

    /// The suggested input name, settled to the chosen file's base name
    /// once a save-style dialog is accepted.
    #[must_use]
    pub fn current_name(&self) -> String {
        self.state.lock().current_name.clone()
    }

    pub fn set_current_folder(&self, url: impl Into<String>) {
        let url = url.into();
        self.state.lock().current_folder = url.clone();
        self.degraded("folder", self.session.set_directory_url(&url));
    }

    #[must_use]
    pub fn current_folder(&self) -> String {
        self.state.lock().current_folder.clone()
    }

    pub fn add_filter(&self, filter: FileFilter) {
        self.state.lock().filters.push(filter);
        self.publish_filters();
    }

    pub fn set_filters(&self, filters: Vec<FileFilter>) {
        {
            let mut state = self.state.lock();
            state.filters = filters;
            state.current_filter = None;
        }
        self.publish_filters();
    }

    #[must_use]
    pub fn filters(&self) -> Vec<FileFilter> {
        self.state.lock().filters.clone()
    }

    pub fn set_current_filter(&self, index: usize) {
        let filter = {
            let mut state = self.state.lock();
            let Some(filter) = state.filters.get(index).cloned() else {
                return;
            };
            state.current_filter = Some(index);
            filter
        };
        let encoded = self
            .manager
            .as_ref()
            .and_then(|manager| filters::encode(&filter, manager));
        if let Some(encoded) = encoded {
            self.degraded("filter selection", self.session.select_name_filter(&encoded));
        }
    }

    #[must_use]
    pub fn current_filter(&self) -> Option<usize> {
        self.state.lock().current_filter
    }

    /// Push the whole filter collection as one property write, then
    /// re-apply the selected filter so the remote highlight survives the
    /// replacement. Encoding works on a snapshot; MIME resolution can cost
    /// a bus round trip per rule and must not run under the state lock.
    fn publish_filters(&self) {
        let Some(manager) = self.manager.as_ref() else {
            return;
        };
        let (snapshot, current) = {
            let state = self.state.lock();
            (state.filters.clone(), state.current_filter)
        };
        let encoded = filters::encode_filters(&snapshot, manager);
        let selected = current
            .and_then(|index| snapshot.get(index))
            .and_then(|filter| filters::encode(filter, manager));
        self.degraded("filters", self.session.set_name_filters(encoded));
        if let Some(selected) = selected {
            self.degraded("filter selection", self.session.select_name_filter(&selected));
        }
    }

    /// The current selection: queried fresh from the remote when the
    /// session is active, otherwise the last mirrored value.
    #[must_use]
    pub fn selected_uris(&self) -> Vec<String> {
        match self.session.selected_urls() {
            Ok(urls) => {
                self.state.lock().selection = urls.clone();
                urls
            }
            Err(Error::NotAvailable) => self.state.lock().selection.clone(),
            Err(e) => {
                tracing::debug!("selection query failed, using mirror: {e}");
                self.state.lock().selection.clone()
            }
        }
    }

    pub fn set_option(&self, option: DialogOption, on: bool) -> Result<()> {
        self.session.set_option(option, on)
    }

    pub fn test_option(&self, option: DialogOption) -> Result<bool> {
        self.session.test_option(option)
    }

    pub fn add_disable_url_scheme(&self, scheme: &str) -> Result<()> {
        self.session.add_disable_url_scheme(scheme)
    }

    pub fn set_hide_on_accept(&self, on: bool) {
        self.degraded("hide on accept", self.session.set_hide_on_accept(on));
    }

    /// Show the dialog. With an active session the remote window appears
    /// and is linked transient for the facade's window; the facade's own
    /// window only shows when configured to, or as the local fallback.
    pub fn show(&self) {
        self.degraded("show", self.session.show());
        let active = self.session.state() == SessionState::Active;
        if active {
            if let Some(window) = self.window.as_ref() {
                match self.session.win_id() {
                    Ok(id) => window.link_transient(id),
                    Err(e) => tracing::debug!("no remote window id: {e}"),
                }
            }
        }
        if let Some(window) = self.window.as_ref() {
            window.set_visible(!active || self.options.show_facade_window);
        }
    }

    pub fn hide(&self) {
        self.degraded("hide", self.session.hide());
        if let Some(window) = self.window.as_ref() {
            window.set_visible(false);
        }
    }
}

impl Drop for FileDialog {
    fn drop(&mut self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingWindow {
        visible: Arc<Mutex<Option<bool>>>,
        linked: Arc<Mutex<Option<u64>>>,
    }

    impl WindowBridge for RecordingWindow {
        fn link_transient(&self, remote_window: u64) {
            *self.linked.lock() = Some(remote_window);
        }

        fn set_visible(&self, visible: bool) {
            *self.visible.lock() = Some(visible);
        }
    }

    #[test]
    fn local_dialog_mutators_settle_into_the_mirror() {
        let dialog = FileDialog::builder()
            .title("Open file")
            .action(FileChooserAction::Open)
            .build_local();
        assert_eq!(dialog.session_state(), SessionState::Uninitialized);
        dialog.set_title("Pick one");
        dialog.set_current_folder("file:///home/me");
        dialog.set_current_name("draft.txt");
        assert_eq!(dialog.title(), "Pick one");
        assert_eq!(dialog.current_folder(), "file:///home/me");
        assert_eq!(dialog.current_name(), "draft.txt");
    }

    #[test]
    fn selection_falls_back_to_the_mirror_without_a_session() {
        let dialog = FileDialog::builder().build_local();
        assert!(dialog.selected_uris().is_empty());
        dialog.state.lock().selection = vec!["file:///tmp/a".to_owned()];
        assert_eq!(dialog.selected_uris(), vec!["file:///tmp/a".to_owned()]);
    }

    #[test]
    fn action_drives_the_derived_modes() {
        let dialog = FileDialog::builder()
            .action(FileChooserAction::Save)
            .build_local();
        assert_eq!(dialog.state.lock().accept_mode(), AcceptMode::Save);
        assert_eq!(dialog.state.lock().file_mode(), FileMode::AnyFile);
        dialog.set_action(FileChooserAction::Open);
        dialog.set_select_multiple(true);
        assert_eq!(dialog.state.lock().accept_mode(), AcceptMode::Open);
        assert_eq!(dialog.state.lock().file_mode(), FileMode::ExistingFiles);
        dialog.set_action(FileChooserAction::SelectFolder);
        assert_eq!(dialog.state.lock().file_mode(), FileMode::DirectoryOnly);
    }

    #[test]
    fn current_filter_ignores_out_of_range_indices() {
        let dialog = FileDialog::builder()
            .filter(FileFilter::new("Text").pattern("*.txt"))
            .build_local();
        dialog.set_current_filter(3);
        assert_eq!(dialog.current_filter(), None);
        dialog.set_current_filter(0);
        assert_eq!(dialog.current_filter(), Some(0));
    }

    #[test]
    fn remote_options_report_not_available_locally() {
        let dialog = FileDialog::builder().build_local();
        assert!(matches!(
            dialog.test_option(DialogOption::ReadOnly),
            Err(Error::NotAvailable)
        ));
        assert!(matches!(
            dialog.add_disable_url_scheme("ftp"),
            Err(Error::NotAvailable)
        ));
    }

    #[test]
    fn show_without_a_session_shows_the_facade_window() {
        let visible = Arc::new(Mutex::new(None));
        let linked = Arc::new(Mutex::new(None));
        let dialog = FileDialog::builder()
            .window(Box::new(RecordingWindow {
                visible: Arc::clone(&visible),
                linked: Arc::clone(&linked),
            }))
            .build_local();
        dialog.show();
        assert_eq!(*visible.lock(), Some(true));
        assert_eq!(*linked.lock(), None);
        dialog.hide();
        assert_eq!(*visible.lock(), Some(false));
    }

    #[test]
    fn terminal_callback_reports_the_resolved_response() {
        let dialog = FileDialog::builder()
            .response(ResponseId::Ok)
            .response(ResponseId::Cancel)
            .build_local();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            dialog.on_response(move |id| *seen.lock() = Some(id));
        }
        events::finish(
            &dialog.state,
            dialog.map,
            &dialog.finisher,
            DialogCode::Accepted,
            || None,
        );
        assert_eq!(*seen.lock(), Some(ResponseId::Ok));
        assert_eq!(dialog.outcome(), Some(ResponseId::Ok));
    }
}
