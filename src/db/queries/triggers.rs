use poise::serenity_prelude::Timestamp;
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::{trigger::Trigger, Error, GuildId};

fn from_row(row: &Row) -> Result<Trigger, rusqlite::Error> {
    Ok(Trigger {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        name: row.get(2)?,
        response: row.get(3)?,
    })
}

pub fn add(
    db: &Connection,
    guild_id: GuildId,
    name: &str,
    response: &str,
    timestamp: Timestamp,
) -> Result<(), Error> {
    let mut stmt = db.prepare_cached(
        "INSERT INTO triggers (guild_id, name, response, created_at)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    let trigger_id = stmt.insert(params![guild_id, name, response, &timestamp.to_rfc3339()])?;
    debug!(trigger_id, "trigger inserted");

    Ok(())
}

/// The full candidate set for a scope, in the order the engine iterates it
pub fn for_guild(db: &Connection, guild_id: GuildId) -> Result<Vec<Trigger>, Error> {
    let mut stmt = db.prepare_cached(
        "SELECT id, guild_id, name, response FROM triggers
         WHERE guild_id=?1
         ORDER BY id ASC",
    )?;

    let triggers = stmt
        .query_map(params![guild_id], |row| from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(triggers)
}

pub fn page(
    db: &Connection,
    guild_id: GuildId,
    offset: usize,
    limit: usize,
) -> Result<(Vec<Trigger>, usize), Error> {
    let mut stmt = db.prepare_cached(
        "SELECT id, guild_id, name, response FROM triggers
         WHERE guild_id=?1
         ORDER BY id ASC
         LIMIT ?2 OFFSET ?3",
    )?;

    let triggers = stmt
        .query_map(params![guild_id, limit, offset], |row| from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    let total = db
        .prepare_cached("SELECT COUNT(1) FROM triggers WHERE guild_id=?1")?
        .query_row(params![guild_id], |row| row.get::<_, usize>(0))?;

    Ok((triggers, total))
}

pub fn update(
    db: &Connection,
    trigger_id: i64,
    name: &str,
    response: &str,
) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached("UPDATE triggers SET name=?2, response=?3 WHERE id=?1")?;

    Ok(stmt.execute(params![trigger_id, name, response])? == 1)
}

pub fn delete(db: &Connection, trigger_id: i64) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached("DELETE FROM triggers WHERE id=?1")?;

    Ok(stmt.execute(params![trigger_id])? == 1)
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

    #[test]
    fn triggers_are_scoped_to_their_guild() {
        let db = test_db();
        let now = Timestamp::now();
        add(&db, 1.into(), "hi", "hello {user}", now).unwrap();
        add(&db, 1.into(), "@bob", "bob was pinged", now).unwrap();
        add(&db, 2.into(), "hi", "other guild", now).unwrap();

        let guild_one = for_guild(&db, 1.into()).unwrap();
        assert_eq!(guild_one.len(), 2);
        // Repository iteration order: insertion order
        assert_eq!(guild_one[0].name, "hi");
        assert_eq!(guild_one[1].name, "@bob");

        let (page_items, total) = page(&db, 2.into(), 0, 5).unwrap();
        assert_eq!(total, 1);
        assert_eq!(page_items[0].response, "other guild");
    }

    #[test]
    fn update_and_delete_report_whether_the_row_existed() {
        let db = test_db();
        add(&db, 1.into(), "hi", "hello", Timestamp::now()).unwrap();
        let id = for_guild(&db, 1.into()).unwrap()[0].id;

        assert!(update(&db, id, "hey", "hello there").unwrap());
        let updated = &for_guild(&db, 1.into()).unwrap()[0];
        assert_eq!(updated.name, "hey");
        assert_eq!(updated.response, "hello there");

        assert!(delete(&db, id).unwrap());
        assert!(!delete(&db, id).unwrap());
        assert!(for_guild(&db, 1.into()).unwrap().is_empty());
    }
}
