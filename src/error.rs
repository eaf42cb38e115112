use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for the remote dialog bridge.
///
/// Nothing in this crate raises an unrecoverable fault: `BusUnavailable` and
/// `Declined` degrade the whole dialog to pure local behavior, `NotAvailable`
/// marks a session method called without an active remote session, and the
/// call-level errors degrade the single operation that hit them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("session bus is not available")]
    BusUnavailable,
    #[error("remote call {method:?} failed: {source}")]
    CallFailed {
        method: String,
        #[source]
        source: zbus::Error,
    },
    #[error("remote call {0:?} timed out")]
    Timeout(String),
    #[error("remote dialog session is not available")]
    NotAvailable,
    #[error("dialog manager declined to create a dialog")]
    Declined,
    #[error("unexpected reply payload: {0}")]
    BadReply(#[from] zbus::zvariant::Error),
}

impl Error {
    /// True for the "session never activated" case, which callers treat as a
    /// silent no-op rather than a degraded operation.
    #[must_use]
    pub const fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable)
    }
}
