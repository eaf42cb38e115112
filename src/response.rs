//! Translation of the remote's binary accept/reject outcome into whichever
//! response identifiers this dialog instance was built with.

use crate::protocol::DialogCode;

/// Canonical response identifiers a dialog can register for its buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseId {
    Accept,
    Ok,
    Yes,
    Apply,
    Reject,
    No,
    Cancel,
}

/// The accept and reject ids resolved once at session activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseMap {
    pub accept: ResponseId,
    pub reject: ResponseId,
}

impl ResponseMap {
    const ACCEPT_PRECEDENCE: [ResponseId; 4] = [
        ResponseId::Ok,
        ResponseId::Yes,
        ResponseId::Apply,
        ResponseId::Accept,
    ];
    const REJECT_PRECEDENCE: [ResponseId; 2] = [ResponseId::Reject, ResponseId::No];

    /// Pick the first registered id of each category, falling back to the
    /// generic accept and cancel ids.
    #[must_use]
    pub fn resolve(registered: &[ResponseId]) -> Self {
        let accept = Self::ACCEPT_PRECEDENCE
            .into_iter()
            .find(|id| registered.contains(id))
            .unwrap_or(ResponseId::Accept);
        let reject = Self::REJECT_PRECEDENCE
            .into_iter()
            .find(|id| registered.contains(id))
            .unwrap_or(ResponseId::Cancel);
        Self { accept, reject }
    }

    #[must_use]
    pub const fn outcome(&self, code: DialogCode) -> ResponseId {
        match code {
            DialogCode::Accepted => self.accept,
            DialogCode::Rejected => self.reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_registered() {
        let map = ResponseMap::resolve(&[]);
        assert_eq!(map.accept, ResponseId::Accept);
        assert_eq!(map.reject, ResponseId::Cancel);
    }

    #[test]
    fn accept_precedence_order() {
        let map = ResponseMap::resolve(&[ResponseId::Apply, ResponseId::Yes, ResponseId::Ok]);
        assert_eq!(map.accept, ResponseId::Ok);
        let map = ResponseMap::resolve(&[ResponseId::Apply, ResponseId::Yes]);
        assert_eq!(map.accept, ResponseId::Yes);
        let map = ResponseMap::resolve(&[ResponseId::Apply]);
        assert_eq!(map.accept, ResponseId::Apply);
    }

    #[test]
    fn reject_precedence_order() {
        let map = ResponseMap::resolve(&[ResponseId::No, ResponseId::Reject]);
        assert_eq!(map.reject, ResponseId::Reject);
        let map = ResponseMap::resolve(&[ResponseId::No, ResponseId::Ok]);
        assert_eq!(map.reject, ResponseId::No);
    }

    #[test]
    fn outcome_follows_the_map() {
        let map = ResponseMap::resolve(&[ResponseId::Yes, ResponseId::No]);
        assert_eq!(map.outcome(DialogCode::Accepted), ResponseId::Yes);
        assert_eq!(map.outcome(DialogCode::Rejected), ResponseId::No);
    }

    #[test]
    fn cancel_registration_does_not_shadow_reject_default() {
        // Cancel is the fallback, not part of the precedence chain.
        let map = ResponseMap::resolve(&[ResponseId::Cancel]);
        assert_eq!(map.reject, ResponseId::Cancel);
    }
}
