//! Bridge between a local file-selection dialog facade and the deepin file
//! manager's out-of-process dialog service on the D-Bus session bus.
//!
//! A [`FileDialog`] looks like an ordinary modal file chooser to the caller
//! while the actual picking UI runs in the file manager process. The crate
//! handles session setup and teardown, bounded synchronous remote calls,
//! signal-driven state mirroring, name-filter translation, a liveness
//! heartbeat, and the mapping of the remote accept/reject outcome onto the
//! caller's registered response buttons.
//!
//! When the bus or the remote service is unavailable the facade degrades to
//! a purely local dialog model instead of failing: mutators settle into the
//! local mirror and [`FileDialog::session_state`] reports it.
//!
//! ```no_run
//! use dde_filedialog::{Bus, FileChooserAction, FileDialog, FileFilter, ResponseId};
//!
//! let bus = Bus::new();
//! let dialog = FileDialog::builder()
//!     .title("Open document")
//!     .action(FileChooserAction::Open)
//!     .response(ResponseId::Ok)
//!     .response(ResponseId::Cancel)
//!     .filter(FileFilter::new("Text").pattern("*.txt"))
//!     .build(&bus);
//! dialog.on_response(|id| println!("dialog finished: {id:?}"));
//! dialog.show();
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]

mod bus;
mod dialog;
mod error;
mod events;
mod filters;
mod heartbeat;
mod manager;
mod options;
mod protocol;
mod response;
mod rpc;
mod session;

pub use {
    bus::Bus,
    dialog::{FileChooserAction, FileDialog, FileDialogBuilder, WindowBridge},
    error::{Error, Result},
    filters::{FileFilter, FilterRule, MimeGlobResolver, encode as encode_filter, encode_filters},
    manager::DialogManager,
    options::{DISABLE_ENV, Options, SHOW_WINDOW_ENV},
    protocol::{AcceptMode, DialogCode, DialogOption, FileMode},
    response::{ResponseId, ResponseMap},
    rpc::RpcBridge,
    session::{DialogSession, SessionState},
};
