use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use lorechat_types::error::{ChatError, ChatResult};
use lorechat_types::events::{ClientCommand, ServerEvent};
use lorechat_types::lookup::{ChannelDirectoryLookup, CharacterOwnershipLookup};
use lorechat_types::models::{AuthContext, ChannelInfo, Character, ConnectionId};

use crate::dispatcher::{Departure, Dispatcher};
use crate::outbox::{Delivery, Outbox};

/// External collaborators the gateway reads from.
#[derive(Clone)]
pub struct Services {
    pub characters: Arc<dyn CharacterOwnershipLookup>,
    pub directory: Arc<dyn ChannelDirectoryLookup>,
}

impl Services {
    pub fn new(
        characters: Arc<dyn CharacterOwnershipLookup>,
        directory: Arc<dyn ChannelDirectoryLookup>,
    ) -> Self {
        Self {
            characters,
            directory,
        }
    }

    /// Directory listing, read on the blocking pool.
    pub async fn list_channels(&self) -> ChatResult<Vec<ChannelInfo>> {
        let directory = self.directory.clone();
        tokio::task::spawn_blocking(move || directory.list_channels())
            .await
            .map_err(|e| ChatError::Internal(format!("directory lookup task failed: {}", e)))?
            .map_err(ChatError::from)
    }

    /// Directory merged with live member counts.
    pub async fn channel_directory(&self, dispatcher: &Dispatcher) -> ChatResult<Vec<ChannelInfo>> {
        let mut channels = self.list_channels().await?;
        let counts = dispatcher.member_counts();
        for channel in &mut channels {
            channel.member_count = counts.get(&channel.name).copied().unwrap_or(0);
        }
        Ok(channels)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    CharacterSelected,
    Disconnected,
}

/// Protocol state machine for one connection. Commands are handled one at
/// a time in arrival order by whoever owns this value.
pub struct ChatGateway {
    id: ConnectionId,
    auth: AuthContext,
    state: SessionState,
    dispatcher: Dispatcher,
    services: Services,
    outbox: Outbox,
}

impl ChatGateway {
    /// Register a new connection and greet it with `Ready`.
    pub async fn connect(
        dispatcher: Dispatcher,
        services: Services,
        auth: AuthContext,
        outbox: Outbox,
    ) -> ChatResult<Self> {
        let id = Uuid::new_v4();
        dispatcher.register(id, auth.clone(), outbox.clone())?;
        info!("{} ({}) connected as {}", auth.user_name, auth.user_id, id);

        let gateway = Self {
            id,
            auth,
            state: SessionState::Connected,
            dispatcher,
            services,
            outbox,
        };

        let channels = match gateway.directory().await {
            Ok(channels) => channels,
            Err(e) => {
                error!("Channel directory unavailable for {}: {}", id, e);
                Vec::new()
            }
        };
        gateway.reply(ServerEvent::Ready {
            connection_id: id,
            user_id: gateway.auth.user_id,
            user_name: gateway.auth.user_name.clone(),
            channels,
        });

        Ok(gateway)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Run one command and report any failure to this connection only.
    /// Commands arriving after disconnect are dropped.
    pub async fn handle(&mut self, cmd: ClientCommand) {
        if self.state == SessionState::Disconnected {
            debug!("{} ignoring {} after disconnect", self.id, cmd.name());
            return;
        }

        let name = cmd.name();
        if let Err(err) = self.dispatch(cmd).await {
            debug!("{} ({}) {} failed: {}", self.auth.user_name, self.id, name, err);
            self.report_error(&err);
        }
    }

    /// Execute one command. Errors are returned, not sent.
    pub async fn dispatch(&mut self, cmd: ClientCommand) -> ChatResult<()> {
        if self.state == SessionState::Disconnected {
            return Ok(());
        }

        match cmd {
            ClientCommand::SelectCharacter { character_id } => self.select_character(character_id).await,
            ClientCommand::JoinChannel { channel } => self.join_channel(&channel).await,
            ClientCommand::LeaveChannel { channel } => {
                self.dispatcher.leave(self.id, &channel);
                self.reply(ServerEvent::ChannelLeft { channel });
                Ok(())
            }
            ClientCommand::SendMessage { channel, text } => {
                self.dispatcher.send_message(self.id, &channel, &text)?;
                Ok(())
            }
            ClientCommand::ListChannels => {
                let channels = self.directory().await?;
                self.reply(ServerEvent::ChannelList { channels });
                Ok(())
            }
            ClientCommand::Ping => {
                self.reply(ServerEvent::Pong);
                Ok(())
            }
        }
    }

    /// Send an error event to this connection. Internal errors are logged
    /// in full and reported generically.
    pub fn report_error(&self, err: &ChatError) {
        if let ChatError::Internal(detail) = err {
            error!("{} ({}) internal error: {}", self.auth.user_name, self.id, detail);
        }
        self.reply(ServerEvent::error(err));
    }

    /// Leave every channel and unregister. Safe to call more than once.
    pub fn disconnect(&mut self) -> Option<Departure> {
        if self.state == SessionState::Disconnected {
            return None;
        }
        self.state = SessionState::Disconnected;
        self.dispatcher.disconnect(self.id)
    }

    async fn select_character(&mut self, character_id: Uuid) -> ChatResult<()> {
        let character = self
            .lookup_character(character_id)
            .await?
            .ok_or(ChatError::CharacterNotOwned(character_id))?;

        self.dispatcher.select_character(self.id, character.clone())?;
        self.state = SessionState::CharacterSelected;
        info!(
            "{} ({}) now speaking as {}",
            self.auth.user_name, self.id, character.name
        );
        self.reply(ServerEvent::CharacterSelected { character });
        Ok(())
    }

    async fn join_channel(&mut self, channel: &str) -> ChatResult<()> {
        if self.dispatcher.config().open_channels {
            self.dispatcher.join(self.id, channel)?;
            return Ok(());
        }

        let listed = self
            .directory_listing()
            .await?
            .iter()
            .any(|c| c.name == channel);
        self.dispatcher.join_if(self.id, channel, || listed)?;
        Ok(())
    }

    async fn lookup_character(&self, character_id: Uuid) -> ChatResult<Option<Character>> {
        let characters = self.services.characters.clone();
        let user_id = self.auth.user_id;
        tokio::task::spawn_blocking(move || characters.find_owned_character(character_id, user_id))
            .await
            .map_err(|e| ChatError::Internal(format!("ownership lookup task failed: {}", e)))?
            .map_err(ChatError::from)
    }

    async fn directory_listing(&self) -> ChatResult<Vec<ChannelInfo>> {
        self.services.list_channels().await
    }

    async fn directory(&self) -> ChatResult<Vec<ChannelInfo>> {
        self.services.channel_directory(&self.dispatcher).await
    }

    fn reply(&self, event: ServerEvent) {
        if self.outbox.offer(event) == Delivery::Kicked {
            warn!("Outbox for connection {} is full, disconnecting it", self.id);
        }
    }
}
