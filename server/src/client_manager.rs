//! Registry of joined player sessions.
//!
//! A session exists from the moment a player's handshake has been queued
//! until the transport reports a failure or the connection closes. The game
//! loop owns all writes to the registry; network tasks only talk to it
//! through the command channel.

use crate::network::Outbound;
use log::info;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// One connected, joined player.
#[derive(Debug)]
pub struct Session {
    /// Same id as the player's snake
    pub id: u32,
    pub name: String,
    pub addr: SocketAddr,
    /// Outbound records, drained by the connection's writer task
    pub sender: mpsc::UnboundedSender<Outbound>,
}

impl Session {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            addr,
            sender,
        }
    }

    /// Queues text for the client. Fails once the connection is gone.
    pub fn send(&self, text: &Outbound) -> bool {
        self.sender.send(Outbound::clone(text)).is_ok()
    }
}

/// Tracks every live session and enforces the server's capacity.
pub struct ClientManager {
    sessions: BTreeMap<u32, Session>,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            sessions: BTreeMap::new(),
            max_clients,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.sessions.len() < self.max_clients
    }

    /// Registers a session. Gives it back if the server is full or the id
    /// is already taken.
    pub fn add(&mut self, session: Session) -> Result<(), Session> {
        if !self.has_capacity() || self.sessions.contains_key(&session.id) {
            return Err(session);
        }

        info!(
            "Session {} ({}) registered from {}",
            session.id, session.name, session.addr
        );
        self.sessions.insert(session.id, session);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        info!("Session {} ({}) removed", session.id, session.name);
        Some(session)
    }

    pub fn get(&self, id: u32) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Sends to one session. Returns false if it is unknown or gone.
    pub fn send(&self, id: u32, text: &Outbound) -> bool {
        self.sessions
            .get(&id)
            .map(|session| session.send(text))
            .unwrap_or(false)
    }

    /// Sends the same text to every session and returns the ids whose
    /// connection has gone away. The text is shared, not copied.
    pub fn broadcast(&self, text: &Outbound) -> Vec<u32> {
        self.sessions
            .values()
            .filter(|session| !session.send(text))
            .map(|session| session.id)
            .collect()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:11000".parse().unwrap()
    }

    fn session(id: u32) -> (Session, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(id, format!("p{}", id), test_addr(), tx), rx)
    }

    #[test]
    fn test_manager_creation() {
        let manager = ClientManager::new(5);
        assert_eq!(manager.max_clients, 5);
        assert!(manager.is_empty());
        assert!(manager.has_capacity());
    }

    #[test]
    fn test_add_and_remove() {
        let mut manager = ClientManager::new(2);
        let (s1, _rx1) = session(1);
        let (s2, _rx2) = session(2);

        assert!(manager.add(s1).is_ok());
        assert!(manager.add(s2).is_ok());
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.ids(), vec![1, 2]);
        assert_eq!(manager.get(1).map(|s| s.name.as_str()), Some("p1"));

        assert!(manager.remove(1).is_some());
        assert!(manager.remove(1).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut manager = ClientManager::new(1);
        let (s1, _rx1) = session(1);
        let (s2, _rx2) = session(2);

        assert!(manager.add(s1).is_ok());
        let rejected = manager.add(s2).unwrap_err();
        assert_eq!(rejected.id, 2);
        assert_eq!(manager.len(), 1);
        assert!(!manager.has_capacity());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut manager = ClientManager::new(4);
        let (s1, _rx1) = session(1);
        let (again, _rx2) = session(1);
        assert!(manager.add(s1).is_ok());
        assert!(manager.add(again).is_err());
    }

    #[test]
    fn test_broadcast_reports_closed_sessions() {
        let mut manager = ClientManager::new(4);
        let (s1, mut rx1) = session(1);
        let (s2, rx2) = session(2);
        manager.add(s1).unwrap();
        manager.add(s2).unwrap();
        drop(rx2);

        let hello: Outbound = Outbound::from("hello\n");
        let failed = manager.broadcast(&hello);
        assert_eq!(failed, vec![2]);
        assert_eq!(&*rx1.try_recv().unwrap(), "hello\n");

        let again: Outbound = Outbound::from("again\n");
        assert!(manager.send(1, &again));
        assert!(!manager.send(2, &again));
        assert!(!manager.send(9, &again));
    }

    #[test]
    fn test_broadcast_shares_one_buffer() {
        let mut manager = ClientManager::new(4);
        let (s1, mut rx1) = session(1);
        let (s2, mut rx2) = session(2);
        manager.add(s1).unwrap();
        manager.add(s2).unwrap();

        let snapshot: Outbound = Outbound::from("{\"power\":1}\n");
        assert!(manager.broadcast(&snapshot).is_empty());

        let first = rx1.try_recv().unwrap();
        let second = rx2.try_recv().unwrap();
        assert!(Outbound::ptr_eq(&first, &snapshot));
        assert!(Outbound::ptr_eq(&second, &snapshot));
    }
}
