use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use lorechat_types::error::{ChatError, ChatResult};
use lorechat_types::models::{AuthContext, Character, ChatMessage, ConnectionId, Member};

use crate::channels::{ChannelManager, Left, validate_channel_name};
use crate::config::GatewayConfig;
use crate::outbox::Outbox;
use crate::presence::PresenceBroadcaster;
use crate::registry::ConnectionRegistry;
use crate::router::MessageRouter;

/// Everything a connection leaves behind when it disconnects.
#[derive(Debug, Clone)]
pub struct Departure {
    pub connection_id: ConnectionId,
    pub user_name: String,
    pub character: Option<Character>,
    /// Channels it was in; each got exactly one `UserLeft`.
    pub channels: Vec<String>,
}

/// Registry and membership tables, always locked together.
#[derive(Debug, Default)]
pub struct Tables {
    pub registry: ConnectionRegistry,
    pub channels: ChannelManager,
}

/// Shared chat state for all connections. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    tables: Mutex<Tables>,
    config: GatewayConfig,
}

impl Dispatcher {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                tables: Mutex::new(Tables::default()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Register a connection and the queue its events go to.
    pub fn register(&self, id: ConnectionId, user: AuthContext, outbox: Outbox) -> ChatResult<()> {
        let mut tables = self.inner.tables.lock();
        tables.registry.register(id, user, outbox)
    }

    /// Bind an already ownership-checked character to a connection.
    pub fn select_character(&self, id: ConnectionId, character: Character) -> ChatResult<()> {
        let mut tables = self.inner.tables.lock();
        tables.registry.set_character(id, character)?;
        Ok(())
    }

    /// Join a channel and run join presence. Returns the member list the
    /// joiner was sent.
    pub fn join(&self, id: ConnectionId, channel: &str) -> ChatResult<Vec<Member>> {
        self.join_if(id, channel, || true)
    }

    /// Like [`join`](Self::join), but a well-formed name for which `exists`
    /// returns false fails with `ChannelNotFound`.
    pub fn join_if<F>(&self, id: ConnectionId, channel: &str, exists: F) -> ChatResult<Vec<Member>>
    where
        F: FnOnce() -> bool,
    {
        let mut tables = self.inner.tables.lock();
        let Tables { registry, channels } = &mut *tables;
        if !registry.contains(id) {
            return Err(ChatError::NotAuthenticated);
        }
        validate_channel_name(channel)?;
        if !exists() {
            return Err(ChatError::ChannelNotFound(channel.to_string()));
        }

        let joined = channels.join(id, channel);
        if joined.newly_joined {
            info!(
                "{} ({}) joined {} [{} members]",
                registry.user_name(id).unwrap_or_default(),
                id,
                channel,
                joined.members.len()
            );
        }

        Ok(PresenceBroadcaster::new(registry, channels).on_joined(id, channel, joined.newly_joined))
    }

    /// Leave a channel. Not being a member is fine. Returns whether the
    /// channel emptied and was reaped.
    pub fn leave(&self, id: ConnectionId, channel: &str) -> bool {
        let mut tables = self.inner.tables.lock();
        let Tables { registry, channels } = &mut *tables;

        match channels.leave(id, channel) {
            Left::NotAMember => false,
            Left::Left { became_empty } => {
                let user_name = registry.user_name(id).unwrap_or_default();
                info!("{} ({}) left {}", user_name, id, channel);
                PresenceBroadcaster::new(registry, channels).on_left(id, channel, user_name);
                became_empty
            }
        }
    }

    pub fn send_message(&self, id: ConnectionId, channel: &str, text: &str) -> ChatResult<ChatMessage> {
        let tables = self.inner.tables.lock();
        MessageRouter::new(&tables.registry, &tables.channels, self.inner.config.max_message_len)
            .send_message(id, channel, text)
    }

    /// Tear down a connection: unregister it, drop it from every channel
    /// and tell each channel's remaining members. Runs at most once per
    /// registration; later calls return `None` and emit nothing.
    pub fn disconnect(&self, id: ConnectionId) -> Option<Departure> {
        let mut tables = self.inner.tables.lock();
        let Tables { registry, channels } = &mut *tables;

        let Some(gone) = registry.unregister(id) else {
            debug!("Disconnect for {} ignored, already gone", id);
            return None;
        };
        let left = channels.remove_connection(id);

        let presence = PresenceBroadcaster::new(registry, channels);
        for channel in &left {
            presence.on_left(id, channel, &gone.user.user_name);
        }

        info!(
            "{} ({}) disconnected, left {} channels",
            gone.user.user_name,
            id,
            left.len()
        );

        Some(Departure {
            connection_id: id,
            user_name: gone.user.user_name,
            character: gone.character,
            channels: left.into_iter().collect(),
        })
    }

    pub fn character_of(&self, id: ConnectionId) -> Option<Character> {
        self.inner.tables.lock().registry.character(id).cloned()
    }

    pub fn members_of(&self, channel: &str) -> Vec<Member> {
        let tables = self.inner.tables.lock();
        PresenceBroadcaster::new(&tables.registry, &tables.channels).member_list(channel)
    }

    pub fn channels_of(&self, id: ConnectionId) -> Vec<String> {
        self.inner.tables.lock().channels.channels_of(id).into_iter().collect()
    }

    /// Live channels and their member counts.
    pub fn member_counts(&self) -> HashMap<String, usize> {
        self.inner.tables.lock().channels.member_counts()
    }

    pub fn channel_count(&self) -> usize {
        self.inner.tables.lock().channels.channel_count()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.tables.lock().registry.len()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}
