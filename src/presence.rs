use std::collections::HashMap;

use uuid::Uuid;

/// Who is online right now: user id -> the connection currently speaking for
/// them. At most one entry per user; a later connection for the same user
/// replaces the earlier one. Nothing here survives a restart, presence is
/// ephemeral by design.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    online: HashMap<Uuid, Uuid>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `user_id`.
    pub fn set_online(&mut self, user_id: Uuid, conn_id: Uuid) {
        self.online.insert(user_id, conn_id);
    }

    /// Remove the entry whose connection matches, returning the user it
    /// belonged to. A connection that was replaced by a newer one for the
    /// same user finds no entry and removes nothing.
    pub fn remove_by_connection(&mut self, conn_id: Uuid) -> Option<Uuid> {
        let user_id = self
            .online
            .iter()
            .find(|(_, conn)| **conn == conn_id)
            .map(|(user, _)| *user)?;

        self.online.remove(&user_id);
        Some(user_id)
    }

    pub fn list_online(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.online.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::now_v7()).collect()
    }

    #[test]
    fn one_entry_per_user() {
        let [user, conn_a, conn_b] = [Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7()];
        let mut registry = PresenceRegistry::new();

        registry.set_online(user, conn_a);
        registry.set_online(user, conn_b);

        assert_eq!(registry.list_online().collect::<Vec<_>>(), vec![user]);
    }

    #[test]
    fn disconnect_removes_matching_connection() {
        let v = ids(4);
        let (alice, bob, conn_a, conn_b) = (v[0], v[1], v[2], v[3]);
        let mut registry = PresenceRegistry::new();

        registry.set_online(alice, conn_a);
        registry.set_online(bob, conn_b);

        assert_eq!(registry.remove_by_connection(conn_a), Some(alice));
        assert_eq!(registry.list_online().collect::<Vec<_>>(), vec![bob]);
    }

    #[test]
    fn disconnect_of_unknown_connection_is_noop() {
        let v = ids(3);
        let (alice, conn, stray) = (v[0], v[1], v[2]);
        let mut registry = PresenceRegistry::new();

        registry.set_online(alice, conn);

        assert_eq!(registry.remove_by_connection(stray), None);
        assert_eq!(registry.list_online().count(), 1);
    }

    #[test]
    fn stale_connection_cannot_evict_replacement() {
        let v = ids(3);
        let (alice, old_conn, new_conn) = (v[0], v[1], v[2]);
        let mut registry = PresenceRegistry::new();

        registry.set_online(alice, old_conn);
        registry.set_online(alice, new_conn);

        // The old tab closing must not knock the new one offline.
        assert_eq!(registry.remove_by_connection(old_conn), None);
        assert_eq!(registry.list_online().collect::<Vec<_>>(), vec![alice]);

        assert_eq!(registry.remove_by_connection(new_conn), Some(alice));
        assert_eq!(registry.list_online().count(), 0);
    }

    #[test]
    fn list_matches_join_disconnect_history() {
        let v = ids(6);
        let (a, b, c) = (v[0], v[1], v[2]);
        let (conn_a, conn_b, conn_c) = (v[3], v[4], v[5]);
        let mut registry = PresenceRegistry::new();

        registry.set_online(a, conn_a);
        registry.set_online(b, conn_b);
        registry.set_online(c, conn_c);
        registry.remove_by_connection(conn_b);

        let mut online: Vec<_> = registry.list_online().collect();
        online.sort();
        let mut expected = vec![a, c];
        expected.sort();
        assert_eq!(online, expected);
    }
}
