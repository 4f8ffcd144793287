//! Proxies and their resolution
//!
//! Unresolved proxies answer identity queries (`exists`, `is_proxy`,
//! `is_resolved`, `proxy_path`, `proxy_resource`) without calling the
//! resolver. Every other access goes through `force_resolve`. A failed
//! resolution is not remembered: the next access asks the resolver again.

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::object::{Entry, ProxyData, ProxyState, Resolver};
use mof_types::{ObjectId, ResourceId};
use std::rc::Rc;
use tracing::{debug, warn};

impl Kernel {
    /// Install the resolver used for proxies
    pub fn set_resolver(&mut self, resolver: Rc<dyn Resolver>) {
        self.resolver = Some(resolver);
    }

    /// Create an unresolved proxy
    pub fn create_proxy(&mut self, path: impl Into<String>, resource: ResourceId) -> ObjectId {
        self.objects
            .alloc(Entry::Proxy(ProxyData::new(path.into(), resource)))
    }

    /// Whether a handle names a live object or proxy
    pub fn exists(&self, id: ObjectId) -> bool {
        self.objects.contains(id)
    }

    /// Whether a handle names a proxy, resolved or not
    pub fn is_proxy(&self, id: ObjectId) -> bool {
        self.objects.proxy(id).is_some()
    }

    /// Whether a handle can be used without calling the resolver
    pub fn is_resolved(&self, id: ObjectId) -> bool {
        match self.objects.entry(id) {
            Some(Entry::Object(_)) => true,
            Some(Entry::Proxy(proxy)) => proxy.target().is_some(),
            None => false,
        }
    }

    /// Resolution state of a proxy
    pub fn proxy_state(&self, id: ObjectId) -> Option<&ProxyState> {
        self.objects.proxy(id).map(|proxy| &proxy.state)
    }

    /// Path of a proxy
    pub fn proxy_path(&self, id: ObjectId) -> Option<&str> {
        self.objects.proxy(id).map(|proxy| proxy.path.as_str())
    }

    /// Hosting resource of a proxy
    pub fn proxy_resource(&self, id: ObjectId) -> Option<ResourceId> {
        self.objects.proxy(id).map(|proxy| proxy.resource)
    }

    /// Concrete object behind a handle
    ///
    /// Objects resolve to themselves. A proxy is resolved on first call and
    /// bound for good; its inverse relations are merged into the target.
    /// Later calls return the same target without asking the resolver.
    pub fn force_resolve(&mut self, id: ObjectId) -> KernelResult<ObjectId> {
        let (path, resource) = match self.objects.entry(id) {
            Some(Entry::Object(_)) => return Ok(id),
            Some(Entry::Proxy(proxy)) => match proxy.target() {
                Some(target) if self.objects.object(target).is_some() => return Ok(target),
                Some(_) => return Err(KernelError::UnknownObject { id }),
                None => (proxy.path.clone(), proxy.resource),
            },
            None => return Err(KernelError::UnknownObject { id }),
        };

        let outcome = match &self.resolver {
            Some(resolver) => match resolver.resolve(&path, resource) {
                Ok(target) if self.objects.object(target).is_some() => Ok(target),
                Ok(target) => Err(format!("{} is not a live object", target)),
                Err(reason) => Err(reason),
            },
            None => Err("no resolver installed".to_string()),
        };
        let target = match outcome {
            Ok(target) => target,
            Err(reason) => {
                warn!(proxy = %id, %path, %resource, %reason, "proxy resolution failed");
                return Err(KernelError::Resolution { path, reason });
            }
        };

        let inverse = match self.objects.proxy_mut(id) {
            Some(proxy) => {
                proxy.state = ProxyState::Resolved(target);
                std::mem::take(&mut proxy.inverse)
            }
            None => Default::default(),
        };
        if let Some(data) = self.objects.object_mut(target) {
            data.inverse.merge(inverse);
        }
        debug!(proxy = %id, %target, %path, "proxy resolved");
        Ok(target)
    }
}
