//! Collaborator interfaces the chat core reads from. They are implemented
//! outside the core (see `lorechat-db`) and are synchronous; the gateway
//! calls them from the blocking thread pool.

use anyhow::Result;
use uuid::Uuid;

use crate::models::{ChannelInfo, Character};

/// Resolves a character only if it belongs to the given user.
pub trait CharacterOwnershipLookup: Send + Sync {
    /// `Ok(None)` covers both "no such character" and "owned by someone else".
    fn find_owned_character(&self, character_id: Uuid, user_id: Uuid) -> Result<Option<Character>>;
}

/// Lists the public channels used to prime a client's channel list.
pub trait ChannelDirectoryLookup: Send + Sync {
    fn list_channels(&self) -> Result<Vec<ChannelInfo>>;
}
