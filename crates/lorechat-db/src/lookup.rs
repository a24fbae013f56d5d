use anyhow::{Context, Result};
use tracing::warn;
use uuid::Uuid;

use lorechat_types::lookup::{ChannelDirectoryLookup, CharacterOwnershipLookup};
use lorechat_types::models::{ChannelInfo, Character};

use crate::Database;
use crate::models::CharacterRow;

impl CharacterOwnershipLookup for Database {
    fn find_owned_character(&self, character_id: Uuid, user_id: Uuid) -> Result<Option<Character>> {
        let row = self.get_owned_character(&character_id.to_string(), &user_id.to_string())?;
        row.map(character_from_row).transpose()
    }
}

impl ChannelDirectoryLookup for Database {
    fn list_channels(&self) -> Result<Vec<ChannelInfo>> {
        let rows = self.get_channels()?;
        Ok(rows
            .into_iter()
            .map(|row| ChannelInfo::new(row.name, row.title))
            .collect())
    }
}

fn character_from_row(row: CharacterRow) -> Result<Character> {
    let id = row
        .id
        .parse::<Uuid>()
        .with_context(|| format!("corrupt character id '{}'", row.id))?;
    let owner_id = row.owner_id.parse::<Uuid>().map_err(|e| {
        warn!("Corrupt owner_id '{}' on character '{}': {}", row.owner_id, row.id, e);
        anyhow::anyhow!("corrupt owner_id on character {}", row.id)
    })?;

    Ok(Character {
        id,
        owner_id,
        name: row.name,
        avatar: row.avatar,
        css_class: row.css_class,
    })
}
