use adsmarket_core::PartnerIdentity;

/// Partner resolved from the request's bearer token.
///
/// Only present when an identity provider is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerContext {
    identity: PartnerIdentity,
}

impl PartnerContext {
    pub fn new(identity: PartnerIdentity) -> Self {
        Self { identity }
    }

    pub fn into_identity(self) -> PartnerIdentity {
        self.identity
    }
}
