//! In-process session store.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt};
use uuid::Uuid;

use crate::permissions::PermissionSet;
use crate::session::gate::SessionStore;

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    client: IpAddr,
    expires_at: Instant,
}

/// A thread-safe session and role store kept in memory.
///
/// Sessions are bound to the address that created them and expire after a
/// fixed TTL. Nothing is persisted.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    permissions: DashMap<String, PermissionSet>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            permissions: DashMap::new(),
            ttl,
        }
    }

    /// Open a session for `username` at `client`; returns the session id.
    pub fn create_session(&self, username: impl Into<String>, client: IpAddr) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let username = username.into();
        tracing::debug!(username = %username, client = %client, "Session created");
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                username,
                client,
                expires_at: Instant::now() + self.ttl,
            },
        );
        id
    }

    /// Close a session. Returns whether it existed.
    pub fn end_session(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Store the permission set of a user.
    pub fn set_permissions(&self, username: impl Into<String>, permissions: PermissionSet) {
        self.permissions.insert(username.into(), permissions);
    }

    /// Drop expired sessions; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        let now = Instant::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    /// Number of stored sessions (including not yet purged expired ones).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn lookup(&self, session_id: &str, client: IpAddr) -> Option<String> {
        // Copy out so no shard guard is held while removing.
        let entry = self.sessions.get(session_id).map(|e| e.value().clone())?;

        if entry.expires_at <= Instant::now() {
            self.sessions.remove(session_id);
            tracing::debug!(username = %entry.username, "Session expired");
            return None;
        }

        if entry.client != client {
            tracing::warn!(
                username = %entry.username,
                expected = %entry.client,
                presented = %client,
                "Session presented from a foreign address"
            );
            return None;
        }

        Some(entry.username)
    }
}

impl SessionStore for MemorySessionStore {
    fn check_session<'a>(&'a self, session_id: &'a str, client: IpAddr) -> BoxFuture<'a, Option<String>> {
        future::ready(self.lookup(session_id, client)).boxed()
    }

    fn permissions<'a>(&'a self, username: &'a str) -> BoxFuture<'a, Option<PermissionSet>> {
        let permissions = self.permissions.get(username).map(|p| p.value().clone());
        future::ready(permissions).boxed()
    }
}
