//! Deferred batch of URIs waiting to be fetched together.

use std::collections::HashSet;

/// URIs registered for a later batch, in enqueue order, each at most once.
///
/// The queue only knows about its own members. Keeping queued URIs disjoint
/// from in-flight and resolved ones is up to the coordinator that owns it.
#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    order: Vec<String>,
    members: HashSet<String>,
}

impl DeferredQueue {
    /// Add `uri` to the back of the queue. Returns `false` if already queued.
    pub(crate) fn push(&mut self, uri: &str) -> bool {
        if !self.members.insert(uri.to_string()) {
            return false;
        }
        self.order.push(uri.to_string());
        true
    }

    /// Remove `uri` from the queue. Returns `false` if it was not queued.
    pub(crate) fn remove(&mut self, uri: &str) -> bool {
        if !self.members.remove(uri) {
            return false;
        }
        self.order.retain(|queued| queued != uri);
        true
    }

    pub(crate) fn contains(&self, uri: &str) -> bool {
        self.members.contains(uri)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Take every queued URI, oldest first, leaving the queue empty.
    pub(crate) fn drain(&mut self) -> Vec<String> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }
}
