use tracing::warn;

use lorechat_types::events::ServerEvent;
use lorechat_types::models::{ConnectionId, Member};

use crate::channels::ChannelManager;
use crate::outbox::Delivery;
use crate::registry::ConnectionRegistry;

/// Turns membership changes into join/leave events. Borrows the tables
/// while the dispatcher lock is held; every send is a non-blocking enqueue.
pub struct PresenceBroadcaster<'a> {
    registry: &'a ConnectionRegistry,
    channels: &'a ChannelManager,
}

impl<'a> PresenceBroadcaster<'a> {
    pub fn new(registry: &'a ConnectionRegistry, channels: &'a ChannelManager) -> Self {
        Self { registry, channels }
    }

    /// Send the joiner the full member list and announce the joiner to
    /// everyone else. A repeated join only resyncs the joiner.
    pub fn on_joined(&self, joiner: ConnectionId, channel: &str, newly_joined: bool) -> Vec<Member> {
        let members = self.member_list(channel);

        deliver(
            self.registry,
            joiner,
            ServerEvent::MemberList {
                channel: channel.to_string(),
                members: members.clone(),
            },
        );

        if newly_joined {
            if let Some(member) = self.registry.member(joiner) {
                let event = ServerEvent::UserJoined {
                    channel: channel.to_string(),
                    member,
                };
                for &other in self.channels.members_of(channel) {
                    if other != joiner {
                        deliver(self.registry, other, event.clone());
                    }
                }
            }
        }

        members
    }

    /// Tell the remaining members of `channel` that `user_name` left.
    pub fn on_left(&self, leaver: ConnectionId, channel: &str, user_name: &str) {
        let event = ServerEvent::UserLeft {
            channel: channel.to_string(),
            user_name: user_name.to_string(),
        };
        for &other in self.channels.members_of(channel) {
            if other != leaver {
                deliver(self.registry, other, event.clone());
            }
        }
    }

    pub fn member_list(&self, channel: &str) -> Vec<Member> {
        self.channels
            .members_of(channel)
            .iter()
            .filter_map(|id| self.registry.member(*id))
            .collect()
    }
}

/// Enqueue `event` for one connection, logging a kick.
pub(crate) fn deliver(registry: &ConnectionRegistry, to: ConnectionId, event: ServerEvent) -> Delivery {
    let Some(outbox) = registry.outbox(to) else {
        return Delivery::Dropped;
    };

    let delivery = outbox.offer(event);
    if delivery == Delivery::Kicked {
        warn!("Outbox for connection {} is full, disconnecting it", to);
    }
    delivery
}
