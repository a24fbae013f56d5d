use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one live transport session.
pub type ConnectionId = Uuid;

/// Verified identity handed to the gateway before any command is processed.
/// The chat core trusts it completely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub user_name: String,
}

impl AuthContext {
    pub fn new(user_id: Uuid, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

/// Snapshot of an in-fiction identity. Copied into connection state on
/// selection; the chat core never writes characters back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
    pub css_class: Option<String>,
}

/// Presence entry for one channel member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub user_name: String,
    pub character: Option<Character>,
}

/// A chat line as delivered to channel members. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Character,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Public channel entry from the directory, optionally annotated with the
/// number of live members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub member_count: usize,
}

impl ChannelInfo {
    pub fn new(name: impl Into<String>, title: Option<String>) -> Self {
        Self {
            name: name.into(),
            title,
            member_count: 0,
        }
    }
}
