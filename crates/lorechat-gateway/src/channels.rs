use std::collections::{BTreeSet, HashMap};

use lorechat_types::error::{ChatError, ChatResult};
use lorechat_types::models::ConnectionId;

/// Longest accepted channel name, in characters.
pub const MAX_CHANNEL_NAME_LEN: usize = 64;

/// Result of [`ChannelManager::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    /// False when the connection was already a member.
    pub newly_joined: bool,
    /// Every member after the join, in join order.
    pub members: Vec<ConnectionId>,
}

/// Result of [`ChannelManager::leave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Left {
    NotAMember,
    Left { became_empty: bool },
}

/// Channel membership, kept in both directions so that
/// `member of channel` and `channel in joined set` can never disagree.
/// Channels exist while they have members and are reaped when the last
/// one leaves.
#[derive(Debug, Default)]
pub struct ChannelManager {
    members: HashMap<String, Vec<ConnectionId>>,
    joined: HashMap<ConnectionId, BTreeSet<String>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Joining a channel twice is a no-op.
    pub fn join(&mut self, id: ConnectionId, channel: &str) -> Joined {
        let members = self.members.entry(channel.to_string()).or_default();
        let newly_joined = !members.contains(&id);
        if newly_joined {
            members.push(id);
            self.joined.entry(id).or_default().insert(channel.to_string());
        }

        Joined {
            newly_joined,
            members: members.clone(),
        }
    }

    /// Remove a member. Leaving a channel you are not in is a no-op.
    pub fn leave(&mut self, id: ConnectionId, channel: &str) -> Left {
        let Some(members) = self.members.get_mut(channel) else {
            return Left::NotAMember;
        };
        let Some(pos) = members.iter().position(|m| *m == id) else {
            return Left::NotAMember;
        };

        members.remove(pos);
        let became_empty = members.is_empty();
        if became_empty {
            self.members.remove(channel);
        }

        if let Some(channels) = self.joined.get_mut(&id) {
            channels.remove(channel);
            if channels.is_empty() {
                self.joined.remove(&id);
            }
        }

        Left::Left { became_empty }
    }

    /// Drop a connection from every channel it is in, returning those channels.
    pub fn remove_connection(&mut self, id: ConnectionId) -> BTreeSet<String> {
        let channels = self.joined.remove(&id).unwrap_or_default();
        for channel in &channels {
            if let Some(members) = self.members.get_mut(channel) {
                members.retain(|m| *m != id);
                if members.is_empty() {
                    self.members.remove(channel);
                }
            }
        }
        channels
    }

    pub fn members_of(&self, channel: &str) -> &[ConnectionId] {
        self.members.get(channel).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn channels_of(&self, id: ConnectionId) -> BTreeSet<String> {
        self.joined.get(&id).cloned().unwrap_or_default()
    }

    pub fn is_member(&self, id: ConnectionId, channel: &str) -> bool {
        self.joined.get(&id).is_some_and(|c| c.contains(channel))
    }

    /// Live channels and their member counts.
    pub fn member_counts(&self) -> HashMap<String, usize> {
        self.members
            .iter()
            .map(|(name, members)| (name.clone(), members.len()))
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.members.len()
    }
}

/// Check a channel name: 1..=64 characters, no control characters, no
/// surrounding whitespace.
pub fn validate_channel_name(name: &str) -> ChatResult<()> {
    let len = name.chars().count();
    let valid = len > 0
        && len <= MAX_CHANNEL_NAME_LEN
        && name.trim() == name
        && !name.chars().any(char::is_control);

    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidChannelName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn duplicate_join_collapses() {
        let mut channels = ChannelManager::new();
        let id = Uuid::new_v4();

        assert!(channels.join(id, "Tavern").newly_joined);
        let again = channels.join(id, "Tavern");
        assert!(!again.newly_joined);
        assert_eq!(again.members, vec![id]);
        assert_eq!(channels.members_of("Tavern"), &[id]);
    }

    #[test]
    fn net_effect_of_join_leave_sequence() {
        let mut channels = ChannelManager::new();
        let id = Uuid::new_v4();

        channels.join(id, "Tavern");
        channels.join(id, "Tavern");
        channels.leave(id, "Tavern");
        assert!(!channels.is_member(id, "Tavern"));
        assert_eq!(channels.leave(id, "Tavern"), Left::NotAMember);

        channels.join(id, "Tavern");
        channels.leave(id, "Tavern");
        channels.join(id, "Tavern");
        channels.join(id, "Tavern");
        assert!(channels.is_member(id, "Tavern"));
        assert_eq!(channels.members_of("Tavern").len(), 1);
    }

    #[test]
    fn last_leave_reaps_channel() {
        let mut channels = ChannelManager::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        channels.join(a, "Tavern");
        channels.join(b, "Tavern");

        assert_eq!(channels.leave(a, "Tavern"), Left::Left { became_empty: false });
        assert_eq!(channels.leave(b, "Tavern"), Left::Left { became_empty: true });
        assert_eq!(channels.channel_count(), 0);
        assert!(channels.members_of("Tavern").is_empty());
    }

    #[test]
    fn leave_unknown_channel_is_noop() {
        let mut channels = ChannelManager::new();
        assert_eq!(channels.leave(Uuid::new_v4(), "Nowhere"), Left::NotAMember);
    }

    #[test]
    fn membership_stays_symmetric() {
        let mut channels = ChannelManager::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        channels.join(a, "Tavern");
        channels.join(a, "Docks");
        channels.join(b, "Docks");
        channels.leave(a, "Docks");

        for (name, _) in channels.member_counts() {
            for member in channels.members_of(&name) {
                assert!(channels.channels_of(*member).contains(&name));
            }
        }
        for id in [a, b] {
            for name in channels.channels_of(id) {
                assert!(channels.members_of(&name).contains(&id));
            }
        }
    }

    #[test]
    fn remove_connection_leaves_other_channels_alone() {
        let mut channels = ChannelManager::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        channels.join(a, "Tavern");
        channels.join(a, "Docks");
        channels.join(b, "Docks");
        channels.join(b, "Market");

        let left = channels.remove_connection(a);
        assert_eq!(left.into_iter().collect::<Vec<_>>(), vec!["Docks", "Tavern"]);
        assert_eq!(channels.members_of("Docks"), &[b]);
        assert_eq!(channels.members_of("Market"), &[b]);
        assert!(channels.members_of("Tavern").is_empty());

        assert!(channels.remove_connection(a).is_empty());
    }

    #[test]
    fn members_keep_join_order() {
        let mut channels = ChannelManager::new();
        let ids: Vec<_> = (0..4).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            channels.join(*id, "Tavern");
        }
        assert_eq!(channels.members_of("Tavern"), ids.as_slice());
    }

    #[test]
    fn channel_name_rules() {
        assert!(validate_channel_name("Tavern").is_ok());
        assert!(validate_channel_name("The Prancing Pony").is_ok());
        assert!(validate_channel_name(&"x".repeat(MAX_CHANNEL_NAME_LEN)).is_ok());

        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name("   ").is_err());
        assert!(validate_channel_name(" Tavern").is_err());
        assert!(validate_channel_name("Tav\nern").is_err());
        assert!(validate_channel_name(&"x".repeat(MAX_CHANNEL_NAME_LEN + 1)).is_err());
    }
}
