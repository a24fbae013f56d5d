use chrono::Utc;
use tracing::debug;

use lorechat_types::error::{ChatError, ChatResult};
use lorechat_types::events::ServerEvent;
use lorechat_types::models::{ChatMessage, ConnectionId};

use crate::channels::ChannelManager;
use crate::presence::deliver;
use crate::registry::ConnectionRegistry;

/// Validates a chat line and fans it out to every member of the channel,
/// sender included. All checks run before the first enqueue, so a failed
/// send never reaches anyone.
pub struct MessageRouter<'a> {
    registry: &'a ConnectionRegistry,
    channels: &'a ChannelManager,
    max_message_len: usize,
}

impl<'a> MessageRouter<'a> {
    pub fn new(registry: &'a ConnectionRegistry, channels: &'a ChannelManager, max_message_len: usize) -> Self {
        Self {
            registry,
            channels,
            max_message_len,
        }
    }

    pub fn send_message(&self, sender: ConnectionId, channel: &str, text: &str) -> ChatResult<ChatMessage> {
        if !self.registry.contains(sender) {
            return Err(ChatError::NotAuthenticated);
        }
        let character = self
            .registry
            .character(sender)
            .ok_or(ChatError::NoCharacterSelected)?;
        if !self.channels.is_member(sender, channel) {
            return Err(ChatError::NotInChannel(channel.to_string()));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_len {
            return Err(ChatError::MessageTooLong {
                max: self.max_message_len,
            });
        }

        let message = ChatMessage {
            sender: character.clone(),
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        let event = ServerEvent::ReceiveMessage {
            channel: channel.to_string(),
            message: message.clone(),
        };

        let recipients = self.channels.members_of(channel);
        for &member in recipients {
            deliver(self.registry, member, event.clone());
        }
        debug!(
            "{} ({}) -> {} [{} recipients]",
            message.sender.name,
            sender,
            channel,
            recipients.len()
        );

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorechat_types::models::{AuthContext, Character};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use crate::outbox::Outbox;

    struct Fixture {
        registry: ConnectionRegistry,
        channels: ChannelManager,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: ConnectionRegistry::new(),
                channels: ChannelManager::new(),
            }
        }

        fn connect(&mut self, name: &str, character: Option<&str>) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
            let id = Uuid::new_v4();
            let user = AuthContext::new(Uuid::new_v4(), name);
            let (outbox, rx) = Outbox::channel(16);
            self.registry.register(id, user.clone(), outbox).unwrap();
            if let Some(character) = character {
                self.registry
                    .set_character(
                        id,
                        Character {
                            id: Uuid::new_v4(),
                            owner_id: user.user_id,
                            name: character.to_string(),
                            avatar: None,
                            css_class: None,
                        },
                    )
                    .unwrap();
            }
            (id, rx)
        }

        fn send(&self, from: ConnectionId, channel: &str, text: &str) -> ChatResult<ChatMessage> {
            MessageRouter::new(&self.registry, &self.channels, 20).send_message(from, channel, text)
        }
    }

    #[test]
    fn unregistered_sender_is_rejected() {
        let fx = Fixture::new();
        let err = fx.send(Uuid::new_v4(), "Tavern", "hi").unwrap_err();
        assert!(matches!(err, ChatError::NotAuthenticated));
    }

    #[test]
    fn no_character_means_no_broadcast() {
        let mut fx = Fixture::new();
        let (a, mut rx_a) = fx.connect("alice", None);
        let (b, mut rx_b) = fx.connect("bob", Some("Brom"));
        fx.channels.join(a, "Tavern");
        fx.channels.join(b, "Tavern");

        let err = fx.send(a, "Tavern", "hello").unwrap_err();
        assert!(matches!(err, ChatError::NoCharacterSelected));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn check_order_is_character_then_membership_then_text() {
        let mut fx = Fixture::new();
        let (a, _rx) = fx.connect("alice", Some("Aria"));

        assert!(matches!(fx.send(a, "Tavern", "   ").unwrap_err(), ChatError::NotInChannel(_)));

        fx.channels.join(a, "Tavern");
        assert!(matches!(fx.send(a, "Tavern", " \t ").unwrap_err(), ChatError::EmptyMessage));
        assert!(matches!(
            fx.send(a, "Tavern", &"x".repeat(21)).unwrap_err(),
            ChatError::MessageTooLong { max: 20 }
        ));
    }

    #[test]
    fn message_reaches_every_member_including_sender() {
        let mut fx = Fixture::new();
        let (a, mut rx_a) = fx.connect("alice", Some("Aria"));
        let (b, mut rx_b) = fx.connect("bob", None);
        let (c, mut rx_c) = fx.connect("carol", None);
        fx.channels.join(a, "Tavern");
        fx.channels.join(b, "Tavern");
        fx.channels.join(c, "Tavern");
        fx.channels.leave(c, "Tavern");

        let message = fx.send(a, "Tavern", "  Hello  ").unwrap();
        assert_eq!(message.text, "Hello");
        assert_eq!(message.sender.name, "Aria");

        for rx in [&mut rx_a, &mut rx_b] {
            match rx.try_recv().unwrap() {
                ServerEvent::ReceiveMessage { channel, message } => {
                    assert_eq!(channel, "Tavern");
                    assert_eq!(message.sender.name, "Aria");
                    assert_eq!(message.text, "Hello");
                }
                other => panic!("Expected ReceiveMessage, got {:?}", other),
            }
        }
        assert!(rx_c.try_recv().is_err());
    }
}
