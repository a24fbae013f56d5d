use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ChatError, ErrorKind};
use crate::models::{ChannelInfo, Character, ChatMessage, ConnectionId, Member};

/// Events pushed from the server to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// Connection registered; carries the public channel directory
    Ready {
        connection_id: ConnectionId,
        user_id: Uuid,
        user_name: String,
        channels: Vec<ChannelInfo>,
    },

    /// Ack for SelectCharacter
    CharacterSelected { character: Character },

    /// Full member list, sent only to a joining connection
    MemberList {
        channel: String,
        members: Vec<Member>,
    },

    /// Someone else joined a channel this connection is in
    UserJoined { channel: String, member: Member },

    /// Someone left a channel this connection is in
    UserLeft { channel: String, user_name: String },

    /// Ack for LeaveChannel
    ChannelLeft { channel: String },

    /// A chat line in a joined channel, including our own
    ReceiveMessage {
        channel: String,
        message: ChatMessage,
    },

    ChannelList { channels: Vec<ChannelInfo> },

    /// A command failed; only the caller sees this
    ReceiveError {
        code: String,
        kind: ErrorKind,
        reason: String,
    },

    Pong,
}

impl ServerEvent {
    pub fn error(err: &ChatError) -> Self {
        Self::ReceiveError {
            code: err.code().to_string(),
            kind: err.kind(),
            reason: err.reason(),
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientCommand {
    /// Speak as one of the user's characters
    SelectCharacter { character_id: Uuid },

    JoinChannel { channel: String },

    LeaveChannel { channel: String },

    SendMessage { channel: String, text: String },

    /// Ask for the channel directory with live member counts
    ListChannels,

    Ping,
}

impl ClientCommand {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectCharacter { .. } => "SelectCharacter",
            Self::JoinChannel { .. } => "JoinChannel",
            Self::LeaveChannel { .. } => "LeaveChannel",
            Self::SendMessage { .. } => "SendMessage",
            Self::ListChannels => "ListChannels",
            Self::Ping => "Ping",
        }
    }
}
