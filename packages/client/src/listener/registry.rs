//! Per-kind listener registries.
//!
//! Each registry is a copy-on-write list: readers take a point-in-time
//! snapshot, writers swap in a new list. Iterating a snapshot is therefore
//! safe while another thread (or the callback itself) adds or removes.

use std::{fmt, sync::Arc};

use arc_swap::ArcSwap;

use crate::domain::{ChatMessage, FriendRequestRecord, GroupRecord, ListenerKind, PresenceRecord};

/// A registered callback.
///
/// Identity is the callback allocation: clones of one `Listener` compare
/// equal, two `Listener::new` calls with the same closure do not.
pub struct Listener<T>(Arc<dyn Fn(&T) + Send + Sync>);

impl<T> Listener<T> {
    pub fn new(callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    pub fn call(&self, value: &T) {
        (self.0)(value)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl<T> Eq for Listener<T> {}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Ordered collection of listeners for one event kind.
///
/// Duplicates are allowed; each `add` is one invocation per event.
pub struct ListenerRegistry<T> {
    kind: ListenerKind,
    listeners: ArcSwap<Vec<Listener<T>>>,
}

impl<T> ListenerRegistry<T> {
    pub fn new(kind: ListenerKind) -> Self {
        Self {
            kind,
            listeners: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Append `listener`, returning it for later removal.
    pub fn add(&self, listener: Listener<T>) -> Listener<T> {
        self.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(listener.clone());
            next
        });
        tracing::debug!("Added {} listener ({} registered)", self.kind, self.len());
        listener
    }

    /// Register a closure; shorthand for `add(Listener::new(callback))`.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Listener<T> {
        self.add(Listener::new(callback))
    }

    /// Remove the first occurrence of `listener`. No-op if absent.
    pub fn remove(&self, listener: &Listener<T>) -> bool {
        let mut removed = false;
        self.listeners.rcu(|current| {
            removed = false;
            match current.iter().position(|l| l == listener) {
                Some(index) => {
                    removed = true;
                    let mut next = Vec::clone(current);
                    next.remove(index);
                    Arc::new(next)
                }
                None => Arc::clone(current),
            }
        });
        if removed {
            tracing::debug!("Removed {} listener ({} registered)", self.kind, self.len());
        }
        removed
    }

    pub fn clear(&self) {
        self.listeners.store(Arc::new(Vec::new()));
        tracing::debug!("Cleared {} listeners", self.kind);
    }

    /// Point-in-time copy of the registered listeners, in registration order.
    pub fn snapshot(&self) -> Arc<Vec<Listener<T>>> {
        self.listeners.load_full()
    }

    pub fn len(&self) -> usize {
        self.listeners.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.load().is_empty()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}

/// The seven listener registries of a connection.
#[derive(Debug)]
pub struct Listeners {
    messages: ListenerRegistry<ChatMessage>,
    presence: ListenerRegistry<Vec<PresenceRecord>>,
    errors: ListenerRegistry<String>,
    friend_requests_received: ListenerRegistry<FriendRequestRecord>,
    friend_requests_sent: ListenerRegistry<FriendRequestRecord>,
    friend_request_results: ListenerRegistry<FriendRequestRecord>,
    groups_created: ListenerRegistry<GroupRecord>,
}

impl Default for Listeners {
    fn default() -> Self {
        Self::new()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self {
            messages: ListenerRegistry::new(ListenerKind::Message),
            presence: ListenerRegistry::new(ListenerKind::PresenceList),
            errors: ListenerRegistry::new(ListenerKind::Error),
            friend_requests_received: ListenerRegistry::new(ListenerKind::FriendRequestReceived),
            friend_requests_sent: ListenerRegistry::new(ListenerKind::FriendRequestSent),
            friend_request_results: ListenerRegistry::new(ListenerKind::FriendRequestResult),
            groups_created: ListenerRegistry::new(ListenerKind::GroupCreated),
        }
    }

    pub fn messages(&self) -> &ListenerRegistry<ChatMessage> {
        &self.messages
    }

    pub fn presence(&self) -> &ListenerRegistry<Vec<PresenceRecord>> {
        &self.presence
    }

    pub fn errors(&self) -> &ListenerRegistry<String> {
        &self.errors
    }

    pub fn friend_requests_received(&self) -> &ListenerRegistry<FriendRequestRecord> {
        &self.friend_requests_received
    }

    pub fn friend_requests_sent(&self) -> &ListenerRegistry<FriendRequestRecord> {
        &self.friend_requests_sent
    }

    pub fn friend_request_results(&self) -> &ListenerRegistry<FriendRequestRecord> {
        &self.friend_request_results
    }

    pub fn groups_created(&self) -> &ListenerRegistry<GroupRecord> {
        &self.groups_created
    }

    /// Number of listeners registered for `kind`.
    pub fn count(&self, kind: ListenerKind) -> usize {
        match kind {
            ListenerKind::Message => self.messages.len(),
            ListenerKind::PresenceList => self.presence.len(),
            ListenerKind::Error => self.errors.len(),
            ListenerKind::FriendRequestReceived => self.friend_requests_received.len(),
            ListenerKind::FriendRequestSent => self.friend_requests_sent.len(),
            ListenerKind::FriendRequestResult => self.friend_request_results.len(),
            ListenerKind::GroupCreated => self.groups_created.len(),
        }
    }

    /// Empty every registry.
    pub fn clear_all(&self) {
        self.messages.clear();
        self.presence.clear();
        self.errors.clear();
        self.friend_requests_received.clear();
        self.friend_requests_sent.clear();
        self.friend_request_results.clear();
        self.groups_created.clear();
    }
}
