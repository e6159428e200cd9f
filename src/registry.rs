//! Connection registry
//!
//! A capacity-bounded slot table tracking active clients, kept outside
//! the protocol core. The server registers a connection after a
//! successful handshake and releases the slot when the handler
//! returns; a full registry is an explicit rejection path (close
//! frame, drop) rather than an error inside the codec.

use std::net::SocketAddr;

use parking_lot::Mutex;

/// Handle to a registered client slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(usize);

impl ClientId {
    /// Slot index inside the registry
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    peer: SocketAddr,
}

/// Fixed-capacity table of active client connections.
///
/// Thread safe; the server shares it across connection tasks behind an
/// `Arc`. Slots are reused after release.
#[derive(Debug)]
pub struct ClientRegistry {
    slots: Mutex<Vec<Option<Entry>>>,
}

impl ClientRegistry {
    /// Create a registry with `capacity` client slots.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity, || None);
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Claim a free slot for `peer`. Returns `None` when the registry
    /// is full; the caller decides the rejection policy.
    pub fn register(&self, peer: SocketAddr) -> Option<ClientId> {
        let mut slots = self.slots.lock();
        let index = slots.iter().position(|slot| slot.is_none())?;
        slots[index] = Some(Entry { peer });
        Some(ClientId(index))
    }

    /// Release a previously claimed slot.
    pub fn release(&self, id: ClientId) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Peer address of a registered client, if the slot is occupied.
    pub fn peer(&self, id: ClientId) -> Option<SocketAddr> {
        self.slots.lock().get(id.0)?.as_ref().map(|e| e.peer)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.lock().iter().filter(|slot| slot.is_some()).count()
    }

    /// True when no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }

    /// True when every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.slots.lock().iter().all(|slot| slot.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn register_until_full() {
        let registry = ClientRegistry::new(2);

        let a = registry.register(addr(1000)).unwrap();
        let b = registry.register(addr(1001)).unwrap();
        assert_ne!(a, b);
        assert!(registry.is_full());
        assert!(registry.register(addr(1002)).is_none());
    }

    #[test]
    fn release_reuses_slot() {
        let registry = ClientRegistry::new(1);

        let id = registry.register(addr(2000)).unwrap();
        assert!(registry.register(addr(2001)).is_none());

        registry.release(id);
        assert!(registry.is_empty());

        let id = registry.register(addr(2001)).unwrap();
        assert_eq!(registry.peer(id), Some(addr(2001)));
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let registry = ClientRegistry::new(0);
        assert!(registry.register(addr(3000)).is_none());
        assert!(registry.is_full());
        assert_eq!(registry.capacity(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let registry = ClientRegistry::new(2);
        let id = registry.register(addr(4000)).unwrap();
        registry.release(id);
        registry.release(id);
        assert_eq!(registry.len(), 0);
    }
}
