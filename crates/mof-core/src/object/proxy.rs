//! Deferred references
//!
//! A proxy stands in for an object that lives in another resource. It holds
//! an opaque path and the resource handle until something forces
//! resolution; from then on it forwards to its target for good. Backward
//! edges registered against the proxy while unresolved are merged into the
//! target when resolution succeeds.

use crate::object::inverse::InverseRelations;
use mof_types::{ObjectId, ResourceId};

/// External capability turning a proxy path into a concrete object
///
/// Implemented by the serialization layer. Called synchronously; a resolver
/// that blocks stalls the caller.
pub trait Resolver {
    /// Resolve `path` in the context of `resource`
    fn resolve(&self, path: &str, resource: ResourceId) -> Result<ObjectId, String>;
}

impl<F> Resolver for F
where
    F: Fn(&str, ResourceId) -> Result<ObjectId, String>,
{
    fn resolve(&self, path: &str, resource: ResourceId) -> Result<ObjectId, String> {
        self(path, resource)
    }
}

/// Resolution state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyState {
    /// Not yet resolved
    Unresolved,
    /// Bound to a target for good
    Resolved(ObjectId),
}

#[derive(Debug, Clone)]
pub(crate) struct ProxyData {
    pub(crate) path: String,
    pub(crate) resource: ResourceId,
    pub(crate) state: ProxyState,
    pub(crate) inverse: InverseRelations,
}

impl ProxyData {
    pub(crate) fn new(path: String, resource: ResourceId) -> Self {
        Self {
            path,
            resource,
            state: ProxyState::Unresolved,
            inverse: InverseRelations::default(),
        }
    }

    pub(crate) fn target(&self) -> Option<ObjectId> {
        match self.state {
            ProxyState::Resolved(target) => Some(target),
            ProxyState::Unresolved => None,
        }
    }
}
