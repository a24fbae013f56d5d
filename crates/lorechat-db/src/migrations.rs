use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS characters (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            name        TEXT NOT NULL,
            avatar      TEXT,
            css_class   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_characters_owner
            ON characters(owner_id);

        CREATE TABLE IF NOT EXISTS channels (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            title       TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Seed the default general channel
        INSERT OR IGNORE INTO channels (id, name, title)
            VALUES ('00000000-0000-0000-0000-000000000001', 'general', 'General');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
