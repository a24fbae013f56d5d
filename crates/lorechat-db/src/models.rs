//! Raw SQLite rows. Conversion to `lorechat_types` models happens in
//! `lookup`, where ids are parsed.

pub struct CharacterRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub css_class: Option<String>,
}

pub struct ChannelRow {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
}
