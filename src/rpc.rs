//! Bounded synchronous call and property primitives against the remote
//! dialog service.
//!
//! Every operation blocks the caller for at most [`CALL_TIMEOUT`]; bus
//! errors and timeouts surface as `Err`, never as panics. Properties go
//! through the standard `org.freedesktop.DBus.Properties` sub-protocol with
//! the variant wrapper peeled off transparently on `Get`.

use {
    crate::{
        error::{Error, Result},
        protocol,
    },
    async_io::Timer,
    futures_util::future::{self, Either},
    std::{future::Future, pin::pin, time::Duration},
    zbus::zvariant::{self, ObjectPath, OwnedValue},
};

pub const CALL_TIMEOUT: Duration = Duration::from_millis(5000);

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

#[derive(Clone)]
pub struct RpcBridge {
    conn: zbus::Connection,
}

impl RpcBridge {
    #[must_use]
    pub const fn new(conn: zbus::Connection) -> Self {
        Self { conn }
    }

    /// Call `method` on the given remote object and decode the reply body.
    pub fn call<B, T>(
        &self,
        path: &ObjectPath<'_>,
        interface: &str,
        method: &str,
        body: &B,
    ) -> Result<T>
    where
        B: serde::Serialize + zvariant::DynamicType,
        T: serde::de::DeserializeOwned + zvariant::Type + std::fmt::Debug,
    {
        let reply = self.bounded(
            method,
            self.conn
                .call_method(Some(protocol::SERVICE), path, Some(interface), method, body),
        )?;
        let decoded: T = reply
            .body()
            .deserialize()
            .map_err(|source| call_failed(method, source))?;
        tracing::debug!(method, reply = ?decoded, "remote call");
        Ok(decoded)
    }

    /// `Get` a property, unwrapping the variant container.
    pub fn get_property<T>(&self, path: &ObjectPath<'_>, interface: &str, name: &str) -> Result<T>
    where
        T: TryFrom<OwnedValue, Error = zvariant::Error> + std::fmt::Debug,
    {
        let reply = self.bounded(
            name,
            self.conn.call_method(
                Some(protocol::SERVICE),
                path,
                Some(PROPERTIES_INTERFACE),
                "Get",
                &(interface, name),
            ),
        )?;
        let wrapped: OwnedValue = reply
            .body()
            .deserialize()
            .map_err(|source| call_failed(name, source))?;
        let value = T::try_from(wrapped)?;
        tracing::debug!(property = name, value = ?value, "remote property get");
        Ok(value)
    }

    /// `Set` a property, wrapping the value in a variant container.
    pub fn set_property<'v, V>(
        &self,
        path: &ObjectPath<'_>,
        interface: &str,
        name: &str,
        value: V,
    ) -> Result<()>
    where
        V: Into<zvariant::Value<'v>>,
    {
        self.bounded(
            name,
            self.conn.call_method(
                Some(protocol::SERVICE),
                path,
                Some(PROPERTIES_INTERFACE),
                "Set",
                &(interface, name, value.into()),
            ),
        )?;
        tracing::debug!(property = name, "remote property set");
        Ok(())
    }

    fn bounded<F>(&self, method: &str, call: F) -> Result<zbus::Message>
    where
        F: Future<Output = zbus::Result<zbus::Message>>,
    {
        zbus::block_on(async {
            let call = pin!(call);
            let deadline = pin!(Timer::after(CALL_TIMEOUT));
            match future::select(call, deadline).await {
                Either::Left((reply, _)) => reply.map_err(|source| call_failed(method, source)),
                Either::Right(_) => Err(Error::Timeout(method.to_owned())),
            }
        })
    }
}

/// A reply that failed to arrive or to decode; either way the operation
/// named here is the one that degrades.
fn call_failed(method: &str, source: zbus::Error) -> Error {
    Error::CallFailed {
        method: method.to_owned(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_carry_the_operation_name() {
        let source = zbus::Error::from(zvariant::Error::Message("mismatched body".into()));
        let error = call_failed("selectedUrls", source);
        assert!(matches!(
            &error,
            Error::CallFailed { method, .. } if method == "selectedUrls"
        ));
        assert!(error.to_string().contains("selectedUrls"));
    }
}
