//! Shared types for the lorechat workspace: domain models, the WebSocket
//! wire protocol, the error taxonomy and the traits the chat core consumes
//! from its external collaborators.

pub mod api;
pub mod error;
pub mod events;
pub mod lookup;
pub mod models;

pub use error::{ChatError, ErrorKind};
pub use models::{AuthContext, Character, ChannelInfo, ChatMessage, ConnectionId, Member};
