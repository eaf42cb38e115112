use std::sync::{Arc, OnceLock};

/// Shared handle to the session bus.
///
/// The handle is constructed explicitly and passed to the components that
/// need it; nothing in the crate reaches for ambient global state. The
/// first `acquire` performs the blocking handshake; the outcome, success or
/// failure, is cached for the lifetime of the handle. A failed handshake is
/// permanent: the bridge degrades to pure local fallback and does not retry
/// on later calls.
#[derive(Clone, Default)]
pub struct Bus {
    conn: Arc<OnceLock<Option<zbus::Connection>>>,
}

impl Bus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached connection, or `None` when the bus is unavailable.
    #[must_use]
    pub fn acquire(&self) -> Option<zbus::Connection> {
        self.conn
            .get_or_init(|| match zbus::block_on(zbus::Connection::session()) {
                Ok(conn) => Some(conn),
                Err(e) => {
                    tracing::warn!("could not connect to the session bus: {e}");
                    None
                }
            })
            .clone()
    }
}
