use crate::Database;
use crate::models::{ChannelRow, CharacterRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username) VALUES (?1, ?2)",
                (id, username),
            )?;
            Ok(())
        })
    }

    // -- Characters --

    pub fn create_character(
        &self,
        id: &str,
        owner_id: &str,
        name: &str,
        avatar: Option<&str>,
        css_class: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO characters (id, owner_id, name, avatar, css_class) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, owner_id, name, avatar, css_class],
            )?;
            Ok(())
        })
    }

    /// Fetch a character only if `owner_id` owns it.
    pub fn get_owned_character(&self, id: &str, owner_id: &str) -> Result<Option<CharacterRow>> {
        self.with_conn(|conn| query_owned_character(conn, id, owner_id))
    }

    // -- Channels --

    pub fn create_channel(&self, id: &str, name: &str, title: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (id, name, title) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, name, title],
            )?;
            Ok(())
        })
    }

    pub fn get_channels(&self) -> Result<Vec<ChannelRow>> {
        self.with_conn(query_channels)
    }
}

fn query_owned_character(
    conn: &Connection,
    id: &str,
    owner_id: &str,
) -> Result<Option<CharacterRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, avatar, css_class
         FROM characters
         WHERE id = ?1 AND owner_id = ?2",
    )?;

    let row = stmt
        .query_row([id, owner_id], |row| {
            Ok(CharacterRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                name: row.get(2)?,
                avatar: row.get(3)?,
                css_class: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_channels(conn: &Connection) -> Result<Vec<ChannelRow>> {
    let mut stmt = conn.prepare("SELECT id, name, title FROM channels ORDER BY name")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ChannelRow {
                id: row.get(0)?,
                name: row.get(1)?,
                title: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
