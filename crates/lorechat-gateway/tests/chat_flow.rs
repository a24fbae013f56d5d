use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use lorechat_gateway::{ChatGateway, Dispatcher, Outbox, Services, SessionState};
use lorechat_types::events::{ClientCommand, ServerEvent};
use lorechat_types::lookup::{ChannelDirectoryLookup, CharacterOwnershipLookup};
use lorechat_types::models::{AuthContext, ChannelInfo, Character};

struct Roster(Vec<Character>);

impl CharacterOwnershipLookup for Roster {
    fn find_owned_character(&self, character_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Character>> {
        Ok(self
            .0
            .iter()
            .find(|c| c.id == character_id && c.owner_id == user_id)
            .cloned())
    }
}

impl ChannelDirectoryLookup for Roster {
    fn list_channels(&self) -> anyhow::Result<Vec<ChannelInfo>> {
        Ok(vec![ChannelInfo::new("Tavern", Some("Common room".into()))])
    }
}

fn character(owner_id: Uuid, name: &str) -> Character {
    Character {
        id: Uuid::new_v4(),
        owner_id,
        name: name.into(),
        avatar: None,
        css_class: Some("bard".into()),
    }
}

async fn open(
    dispatcher: &Dispatcher,
    services: &Services,
    user_id: Uuid,
    name: &str,
) -> (ChatGateway, mpsc::Receiver<ServerEvent>) {
    let (outbox, mut rx) = Outbox::channel(64);
    let gateway = ChatGateway::connect(
        dispatcher.clone(),
        services.clone(),
        AuthContext::new(user_id, name),
        outbox,
    )
    .await
    .unwrap();
    assert!(matches!(rx.try_recv().unwrap(), ServerEvent::Ready { .. }));
    (gateway, rx)
}

fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn two_tabs_of_one_user_speak_as_different_characters() {
    let user_id = Uuid::new_v4();
    let aria = character(user_id, "Aria");
    let brom = character(user_id, "Brom");
    let roster = Arc::new(Roster(vec![aria.clone(), brom.clone()]));
    let services = Services::new(roster.clone(), roster);
    let dispatcher = Dispatcher::default();

    let (mut tab1, mut rx1) = open(&dispatcher, &services, user_id, "alice").await;
    let (mut tab2, mut rx2) = open(&dispatcher, &services, user_id, "alice").await;

    tab1.handle(ClientCommand::SelectCharacter { character_id: aria.id }).await;
    tab2.handle(ClientCommand::SelectCharacter { character_id: brom.id }).await;
    assert_eq!(tab1.state(), SessionState::CharacterSelected);
    assert_eq!(dispatcher.character_of(tab1.id()).map(|c| c.name), Some("Aria".into()));
    assert_eq!(dispatcher.character_of(tab2.id()).map(|c| c.name), Some("Brom".into()));

    tab1.handle(ClientCommand::JoinChannel { channel: "Tavern".into() }).await;
    tab2.handle(ClientCommand::JoinChannel { channel: "Tavern".into() }).await;
    drain(&mut rx1);
    drain(&mut rx2);

    tab1.handle(ClientCommand::SendMessage {
        channel: "Tavern".into(),
        text: "one".into(),
    })
    .await;
    tab2.handle(ClientCommand::SendMessage {
        channel: "Tavern".into(),
        text: "two".into(),
    })
    .await;

    // Both tabs see both lines, in the same order, each with its own sender.
    for rx in [&mut rx1, &mut rx2] {
        let lines: Vec<(String, String)> = drain(rx)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::ReceiveMessage { message, .. } => Some((message.sender.name, message.text)),
                _ => None,
            })
            .collect();
        assert_eq!(
            lines,
            vec![("Aria".into(), "one".into()), ("Brom".into(), "two".into())]
        );
    }
}

#[tokio::test]
async fn repeated_join_leave_keeps_net_membership() {
    let user_id = Uuid::new_v4();
    let roster = Arc::new(Roster(Vec::new()));
    let services = Services::new(roster.clone(), roster);
    let dispatcher = Dispatcher::default();
    let (mut gw, _rx) = open(&dispatcher, &services, user_id, "alice").await;

    for cmd in [
        ClientCommand::JoinChannel { channel: "Tavern".into() },
        ClientCommand::JoinChannel { channel: "Tavern".into() },
        ClientCommand::LeaveChannel { channel: "Tavern".into() },
        ClientCommand::LeaveChannel { channel: "Tavern".into() },
        ClientCommand::JoinChannel { channel: "Tavern".into() },
    ] {
        gw.handle(cmd).await;
    }

    assert_eq!(dispatcher.channels_of(gw.id()), vec!["Tavern".to_string()]);
    assert_eq!(dispatcher.members_of("Tavern").len(), 1);

    let departure = gw.disconnect().unwrap();
    assert_eq!(departure.channels, vec!["Tavern".to_string()]);
    assert_eq!(gw.state(), SessionState::Disconnected);
    assert!(gw.disconnect().is_none());
    assert_eq!(dispatcher.channel_count(), 0);
    assert_eq!(dispatcher.connection_count(), 0);
}
