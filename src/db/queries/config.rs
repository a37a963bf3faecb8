use std::{any::type_name, str::FromStr};

use poise::{serenity_prelude::Timestamp, ChoiceParameter};
use rusqlite::{params, types::ToSqlOutput, Connection, OptionalExtension, ToSql};
use tracing::debug;

use crate::{Error, ErrorContext};

#[derive(Debug, Clone, Copy, PartialEq, ChoiceParameter)]
pub enum ConfigKey {
    #[name = "bot.prefix"]
    BotPrefix,
    #[name = "bot.status_message"]
    BotStatusMessage,
    #[name = "ui.embed_color"]
    UiEmbedColor,
    #[name = "api.henrik_key"]
    ApiHenrikKey,
    #[name = "api.imgflip_user"]
    ApiImgflipUser,
    #[name = "api.imgflip_pass"]
    ApiImgflipPass,
}

impl ConfigKey {
    pub fn description(&self) -> &'static str {
        match self {
            ConfigKey::BotPrefix => "Prefix for text commands",
            ConfigKey::BotStatusMessage => "Activity shown in the bot's presence",
            ConfigKey::UiEmbedColor => "Hex colour used for list and info embeds (e.g. 0x3498db)",
            ConfigKey::ApiHenrikKey => "HenrikDev API key for the Valorant lookups",
            ConfigKey::ApiImgflipUser => "imgflip account used for meme captioning",
            ConfigKey::ApiImgflipPass => "imgflip password used for meme captioning",
        }
    }

    /// Values that shouldn't be echoed back in full in the settings menu
    pub fn secret(&self) -> bool {
        matches!(
            self,
            ConfigKey::ApiHenrikKey | ConfigKey::ApiImgflipUser | ConfigKey::ApiImgflipPass
        )
    }
}

impl ToSql for ConfigKey {
    fn to_sql(&self) -> Result<ToSqlOutput, rusqlite::Error> {
        self.name().to_sql()
    }
}

pub fn update(
    db: &Connection,
    key: ConfigKey,
    value: &str,
    timestamp: Timestamp,
) -> Result<(), Error> {
    let mut stmt = db.prepare_cached(
        "INSERT INTO config (key, value, last_updated)
                         VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                last_updated = excluded.last_updated
            WHERE excluded.last_updated > last_updated",
    )?;

    match stmt.execute(params![key, value, &timestamp.to_rfc3339()]) {
        Ok(1) => {
            debug!("Config value for {} updated successfully", key);
            Ok(())
        }
        Ok(_) => {
            let msg = format!("Config value for {} not updated because database version is newer", key);
            debug!(msg);
            Err(anyhow::anyhow!(msg))?
        }
        Err(e) => {
            debug!("Error updating config value for {}: {:}", key, e);
            Err(e)?
        }
    }
}

pub fn delete(db: &Connection, key: ConfigKey, timestamp: Timestamp) -> Result<(), Error> {
    let mut stmt = db.prepare_cached(
        "DELETE FROM config
             WHERE key=?1 AND last_updated<?2",
    )?;

    match stmt.execute(params![key, &timestamp.to_rfc3339()]) {
        Ok(1) => {
            debug!("Config value for {} deleted successfully", key);
            Ok(())
        }
        Ok(_) => {
            let mut stmt = db.prepare("SELECT last_updated FROM config WHERE key=?1")?;
            if let Ok(last_updated) = stmt.query_row(params![key], |r| r.get::<_, String>(0)) {
                let err = format!(
                    "Config value for {} not deleted because it was updated after delete command was issued ({})",
                    key,
                    last_updated,
                );
                debug!("{}", err);
                Err(anyhow::anyhow!("{}", err))?
            } else {
                // There was nothing to delete
                Ok(())
            }
        }
        Err(e) => {
            debug!("Error deleting config value for {}: {}", key, e);
            Err(e)?
        }
    }
}

pub fn get<T>(db: &Connection, key: ConfigKey) -> Result<Option<T>, Error>
where
    T: FromStr,
    <T as FromStr>::Err: Into<Error>,
{
    let mut stmt = db.prepare_cached(
        "SELECT value FROM config WHERE
            key = ?1",
    )?;

    let value = stmt
        .query_row(params![key], |r| r.get::<_, String>(0))
        .optional()
        .with_context(|| format!("Failed to get config value for {}", key))?
        .map(|v| {
            v.parse().with_context(|| {
                format!(
                    "Failed to parse config value for {} as {}",
                    key,
                    type_name::<T>()
                )
            })
        })
        .transpose()?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::get_migrations;

    fn test_db() -> Connection {
        let mut con = Connection::open_in_memory().unwrap();
        get_migrations().unwrap().to_latest(&mut con).unwrap();
        con
    }

    // Timestamps strictly after one another, the upsert guard compares them
    fn later(timestamp: Timestamp, seconds: i64) -> Timestamp {
        Timestamp::from_unix_timestamp(timestamp.unix_timestamp() + seconds).unwrap()
    }

    #[test]
    fn get_returns_none_when_unset() {
        let db = test_db();
        let value: Option<String> = get(&db, ConfigKey::BotPrefix).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn update_then_get_round_trips() {
        let db = test_db();
        update(&db, ConfigKey::BotPrefix, "!", Timestamp::now()).unwrap();

        let value: Option<String> = get(&db, ConfigKey::BotPrefix).unwrap();
        assert_eq!(value.as_deref(), Some("!"));
    }

    #[test]
    fn newer_update_wins() {
        let db = test_db();
        let now = Timestamp::now();
        update(&db, ConfigKey::UiEmbedColor, "0x3498db", now).unwrap();
        update(&db, ConfigKey::UiEmbedColor, "0xff3333", later(now, 1)).unwrap();

        let value: Option<String> = get(&db, ConfigKey::UiEmbedColor).unwrap();
        assert_eq!(value.as_deref(), Some("0xff3333"));
    }

    #[test]
    fn stale_update_is_rejected() {
        let db = test_db();
        let now = Timestamp::now();
        update(&db, ConfigKey::UiEmbedColor, "0x3498db", later(now, 1)).unwrap();

        assert!(update(&db, ConfigKey::UiEmbedColor, "0xff3333", now).is_err());
        let value: Option<String> = get(&db, ConfigKey::UiEmbedColor).unwrap();
        assert_eq!(value.as_deref(), Some("0x3498db"));
    }

    #[test]
    fn delete_removes_the_value() {
        let db = test_db();
        let now = Timestamp::now();
        update(&db, ConfigKey::BotStatusMessage, "Serving", now).unwrap();
        delete(&db, ConfigKey::BotStatusMessage, later(now, 1)).unwrap();

        let value: Option<String> = get(&db, ConfigKey::BotStatusMessage).unwrap();
        assert_eq!(value, None);
    }
}
