//! Presence tracker: live connection counts per user.

use std::collections::HashMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

/// Counts live connections per user.
///
/// A user is online exactly while the map holds an entry for them; entries
/// are removed when their count drops to zero, never kept at zero. Each
/// mutation runs under the owning shard's lock, so the returned edge flags
/// are exact under concurrent callers.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    /// User ID → live connection count (always > 0)
    connections: DashMap<Uuid, usize>,
}

impl PresenceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns `true` on the offline → online edge.
    pub fn connect(&self, user_id: Uuid) -> bool {
        let mut count = self.connections.entry(user_id).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Drop a connection. Returns `true` on the online → offline edge.
    ///
    /// Disconnecting a user with no live connections is a no-op.
    pub fn disconnect(&self, user_id: Uuid) -> bool {
        match self.connections.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let count = entry.get_mut();
                *count = count.saturating_sub(1);
                if *count == 0 {
                    entry.remove();
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Check if a user has at least one live connection
    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.connections.contains_key(&user_id)
    }

    /// Online flags for a set of users
    pub fn batch_is_online(&self, user_ids: &[Uuid]) -> HashMap<Uuid, bool> {
        user_ids
            .iter()
            .map(|id| (*id, self.is_online(*id)))
            .collect()
    }

    /// Live connection count for a user
    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.connections.get(&user_id).map(|c| *c).unwrap_or(0)
    }

    /// Number of users currently online
    pub fn online_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn first_connect_and_last_disconnect_are_edges() {
        let tracker = PresenceTracker::new();
        let user = Uuid::new_v4();

        assert!(tracker.connect(user));
        assert!(!tracker.connect(user));
        assert_eq!(tracker.connection_count(user), 2);

        assert!(!tracker.disconnect(user));
        assert!(tracker.is_online(user));
        assert!(tracker.disconnect(user));
        assert!(!tracker.is_online(user));
        assert_eq!(tracker.online_count(), 0);
    }

    #[test]
    fn disconnect_of_absent_user_is_noop() {
        let tracker = PresenceTracker::new();
        let user = Uuid::new_v4();

        assert!(!tracker.disconnect(user));
        assert!(!tracker.is_online(user));
        assert!(tracker.connect(user));
    }

    #[test]
    fn batch_reports_each_user() {
        let tracker = PresenceTracker::new();
        let online = Uuid::new_v4();
        let offline = Uuid::new_v4();
        tracker.connect(online);

        let flags = tracker.batch_is_online(&[online, offline]);
        assert_eq!(flags.len(), 2);
        assert!(flags[&online]);
        assert!(!flags[&offline]);
    }

    #[test]
    fn concurrent_connects_produce_single_edges() {
        let tracker = Arc::new(PresenceTracker::new());
        let user = Uuid::new_v4();
        let edges = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                let edges = edges.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        if tracker.connect(user) {
                            edges.fetch_add(1, Ordering::SeqCst);
                        }
                        if tracker.disconnect(user) {
                            edges.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every up edge is matched by exactly one down edge.
        assert!(!tracker.is_online(user));
        assert_eq!(edges.load(Ordering::SeqCst) % 2, 0);
        assert!(edges.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn online_matches_connects_minus_disconnects() {
        let tracker = PresenceTracker::new();
        let user = Uuid::new_v4();
        let ops = [true, true, false, true, false, false, false, true];
        let mut live: usize = 0;
        let mut ups = 0;
        let mut downs = 0;

        for connect in ops {
            if connect {
                live += 1;
                if tracker.connect(user) {
                    ups += 1;
                }
            } else {
                let before = live;
                live = live.saturating_sub(1);
                if tracker.disconnect(user) {
                    downs += 1;
                }
                assert!(before > 0 || !tracker.is_online(user));
            }
            assert_eq!(tracker.is_online(user), live > 0);
        }

        assert_eq!(ups, 2);
        assert_eq!(downs, 1);
    }
}
