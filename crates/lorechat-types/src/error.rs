use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ConnectionId;

/// Coarse classification of a [`ChatError`], sent to clients alongside the
/// specific error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Validation,
    Authorization,
    NotFound,
    Internal,
}

/// Every logical failure the chat core can report to a caller.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("no character selected")]
    NoCharacterSelected,

    #[error("not a member of channel '{0}'")]
    NotInChannel(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("message exceeds {max} characters")]
    MessageTooLong { max: usize },

    #[error("invalid channel name '{0}'")]
    InvalidChannelName(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("character {0} is not available to this user")]
    CharacterNotOwned(Uuid),

    #[error("channel '{0}' does not exist")]
    ChannelNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownConnection(_) | Self::NotAuthenticated => ErrorKind::Authentication,
            Self::EmptyMessage
            | Self::MessageTooLong { .. }
            | Self::InvalidChannelName(_)
            | Self::InvalidCommand(_) => ErrorKind::Validation,
            Self::NoCharacterSelected | Self::NotInChannel(_) | Self::CharacterNotOwned(_) => {
                ErrorKind::Authorization
            }
            Self::ChannelNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyRegistered(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable snake_case identifier used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered(_) => "already_registered",
            Self::UnknownConnection(_) => "unknown_connection",
            Self::NotAuthenticated => "not_authenticated",
            Self::NoCharacterSelected => "no_character_selected",
            Self::NotInChannel(_) => "not_in_channel",
            Self::EmptyMessage => "empty_message",
            Self::MessageTooLong { .. } => "message_too_long",
            Self::InvalidChannelName(_) => "invalid_channel_name",
            Self::InvalidCommand(_) => "invalid_command",
            Self::CharacterNotOwned(_) => "character_not_owned",
            Self::ChannelNotFound(_) => "channel_not_found",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Human readable reason for the client. Internal details stay in the log.
    pub fn reason(&self) -> String {
        match self {
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for ChatError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", err))
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
