use std::collections::HashMap;

use lorechat_types::error::{ChatError, ChatResult};
use lorechat_types::models::{AuthContext, Character, ConnectionId, Member};

use crate::outbox::Outbox;

/// Registry entry for one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub user: AuthContext,
    pub character: Option<Character>,
    pub outbox: Outbox,
}

/// What is left of a connection once it has been unregistered.
#[derive(Debug, Clone)]
pub struct Unregistered {
    pub user: AuthContext,
    pub character: Option<Character>,
}

/// Live connections by id: owning user, bound character, outbound queue.
///
/// Not synchronized on its own; the [`Dispatcher`](crate::Dispatcher) holds
/// it behind the shared table lock.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: ConnectionId, user: AuthContext, outbox: Outbox) -> ChatResult<()> {
        if self.connections.contains_key(&id) {
            return Err(ChatError::AlreadyRegistered(id));
        }

        self.connections.insert(
            id,
            ConnectionEntry {
                user,
                character: None,
                outbox,
            },
        );
        Ok(())
    }

    /// Bind a character, replacing any earlier one. Returns the previous binding.
    pub fn set_character(&mut self, id: ConnectionId, character: Character) -> ChatResult<Option<Character>> {
        let entry = self
            .connections
            .get_mut(&id)
            .ok_or(ChatError::UnknownConnection(id))?;
        Ok(entry.character.replace(character))
    }

    pub fn character(&self, id: ConnectionId) -> Option<&Character> {
        self.connections.get(&id)?.character.as_ref()
    }

    pub fn user_name(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id).map(|e| e.user.user_name.as_str())
    }

    pub fn outbox(&self, id: ConnectionId) -> Option<&Outbox> {
        self.connections.get(&id).map(|e| &e.outbox)
    }

    /// Presence snapshot of a connection.
    pub fn member(&self, id: ConnectionId) -> Option<Member> {
        self.connections.get(&id).map(|e| Member {
            connection_id: id,
            user_name: e.user.user_name.clone(),
            character: e.character.clone(),
        })
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Remove a connection. A second call for the same id returns `None`
    /// and changes nothing.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Unregistered> {
        self.connections.remove(&id).map(|e| Unregistered {
            user: e.user,
            character: e.character,
        })
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
