//! In-memory registry of sessions and lobbies.
//!
//! The registry is the single source of truth for lobby membership: each
//! lobby keeps its member ids in join order, and that order drives both
//! broadcast enumeration and authority election (the first member is the
//! "main"). Session-side fields (`lobby`, `is_main`) are back-references
//! the router keeps in lock-step; they never diverge from the sequence.

use std::collections::HashMap;

use tokio::sync::mpsc;

use relay_shared::ServerMsg;

/// Process-unique session identifier, stable for the connection lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Send half of a session's outbound queue. Pushes never block; the ws
/// task drains the other end into the socket.
pub type OutboundSink = mpsc::UnboundedSender<ServerMsg>;

/// Routing state for one live connection.
pub struct Session {
    pub id: SessionId,
    /// None until the first `join` is accepted.
    pub lobby: Option<String>,
    pub player_name: String,
    pub is_main: bool,
    pub sink: OutboundSink,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("lobby '{0}' already exists")]
    DuplicateLobby(String),
}

/// Outcome of removing a session from its lobby.
pub struct Departure {
    pub lobby_id: String,
    pub was_main: bool,
    /// Surviving member ids in original join order.
    pub remaining: Vec<SessionId>,
    pub lobby_deleted: bool,
}

#[derive(Default)]
pub struct Registry {
    next_id: u64,
    sessions: HashMap<SessionId, Session>,
    /// Lobby id -> member session ids in join order.
    lobbies: HashMap<String, Vec<SessionId>>,
}

impl Registry {
    /// Register a freshly accepted connection in the pre-join state.
    pub fn connect(&mut self, sink: OutboundSink) -> SessionId {
        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.sessions.insert(
            id,
            Session {
                id,
                lobby: None,
                player_name: String::new(),
                is_main: false,
                sink,
            },
        );
        id
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Explicit creation used by the HTTP pre-check endpoint.
    pub fn create_lobby(&mut self, id: &str) -> Result<(), RegistryError> {
        if self.lobbies.contains_key(id) {
            return Err(RegistryError::DuplicateLobby(id.to_string()));
        }
        self.lobbies.insert(id.to_string(), Vec::new());
        Ok(())
    }

    pub fn lobby_exists(&self, id: &str) -> bool {
        self.lobbies.contains_key(id)
    }

    /// Return the existing lobby's member sequence or create an empty one.
    /// Implicit creation path used by `join`.
    pub fn ensure_lobby(&mut self, id: &str) -> &mut Vec<SessionId> {
        self.lobbies.entry(id.to_string()).or_default()
    }

    /// Append a session to a lobby's member sequence, creating the lobby
    /// if absent. Returns the member's 1-based position.
    pub fn add_member(&mut self, lobby_id: &str, session_id: SessionId) -> usize {
        let members = self.ensure_lobby(lobby_id);
        members.push(session_id);
        members.len()
    }

    /// Ordered member ids, or empty if the lobby is absent.
    pub fn members_of(&self, lobby_id: &str) -> Vec<SessionId> {
        self.lobbies.get(lobby_id).cloned().unwrap_or_default()
    }

    /// Display names of a lobby's members, in join order.
    pub fn member_names(&self, lobby_id: &str) -> Vec<String> {
        self.members_of(lobby_id)
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|s| s.player_name.clone())
            .collect()
    }

    /// The lobby's current main, if the lobby has one.
    pub fn main_of(&self, lobby_id: &str) -> Option<SessionId> {
        self.members_of(lobby_id)
            .into_iter()
            .find(|id| self.sessions.get(id).map(|s| s.is_main).unwrap_or(false))
    }

    /// Remove a session from its lobby by identity, deleting the lobby if
    /// it becomes empty. Returns None for sessions that never joined.
    pub fn remove_member(&mut self, session_id: SessionId) -> Option<Departure> {
        let (lobby_id, was_main) = {
            let session = self.sessions.get(&session_id)?;
            (session.lobby.clone()?, session.is_main)
        };

        let members = self.lobbies.get_mut(&lobby_id)?;
        members.retain(|id| *id != session_id);
        let remaining = members.clone();
        let lobby_deleted = remaining.is_empty();
        if lobby_deleted {
            self.lobbies.remove(&lobby_id);
        }

        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.lobby = None;
            session.is_main = false;
        }

        Some(Departure {
            lobby_id,
            was_main,
            remaining,
            lobby_deleted,
        })
    }

    /// Drop the session record itself. Called after the transport closed.
    pub fn disconnect(&mut self, session_id: SessionId) {
        self.sessions.remove(&session_id);
    }

    /// Snapshot the outbound sinks for a set of recipients. Taken under
    /// the registry lock so delivery never iterates a mutating sequence.
    pub fn sinks_for(&self, ids: &[SessionId]) -> Vec<OutboundSink> {
        ids.iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|s| s.sink.clone())
            .collect()
    }
}
