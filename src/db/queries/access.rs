use poise::serenity_prelude::Timestamp;
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::{Error, UserId};

/// One recorded attempt by a non allow-listed user to run a command
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub id: i64,
    pub user_id: UserId,
    pub username: String,
    pub server: String,
    pub access_time: String,
}

impl AccessRecord {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(AccessRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            username: row.get(2)?,
            server: row.get(3)?,
            access_time: row.get(4)?,
        })
    }

    pub fn time_display(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.access_time)
            .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| self.access_time.clone())
    }
}

pub fn allow(db: &Connection, user_id: UserId, timestamp: Timestamp) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached(
        "INSERT INTO allowed_users (user_id, added_at)
         VALUES (?1, ?2)
         ON CONFLICT(user_id) DO NOTHING",
    )?;

    match stmt.execute(params![user_id, &timestamp.to_rfc3339()])? {
        1 => {
            debug!(user_id = (*user_id).0, "user allow-listed");
            Ok(true)
        }
        _ => Ok(false),
    }
}

pub fn disallow(db: &Connection, user_id: UserId) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached("DELETE FROM allowed_users WHERE user_id=?1")?;

    Ok(stmt.execute(params![user_id])? == 1)
}

pub fn allowed_users(db: &Connection) -> Result<Vec<UserId>, Error> {
    let mut stmt = db.prepare_cached("SELECT user_id FROM allowed_users ORDER BY added_at ASC")?;

    let users = stmt
        .query_map([], |row| row.get::<_, UserId>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

pub fn is_allowed(db: &Connection, user_id: UserId) -> Result<bool, Error> {
    Ok(db
        .prepare_cached("SELECT 1 FROM allowed_users WHERE user_id=?1 LIMIT 1")?
        .exists(params![user_id])?)
}

pub fn blacklist_add(
    db: &Connection,
    user_id: UserId,
    reason: &str,
    timestamp: Timestamp,
) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached(
        "INSERT INTO blacklist (user_id, reason, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO NOTHING",
    )?;

    Ok(stmt.execute(params![user_id, reason, &timestamp.to_rfc3339()])? == 1)
}

pub fn blacklist_remove(db: &Connection, user_id: UserId) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached("DELETE FROM blacklist WHERE user_id=?1")?;

    Ok(stmt.execute(params![user_id])? == 1)
}

pub fn is_blacklisted(db: &Connection, user_id: UserId) -> Result<bool, Error> {
    Ok(db
        .prepare_cached("SELECT 1 FROM blacklist WHERE user_id=?1 LIMIT 1")?
        .exists(params![user_id])?)
}

pub fn log_access(
    db: &Connection,
    user_id: UserId,
    username: &str,
    server: &str,
    timestamp: Timestamp,
) -> Result<(), Error> {
    let mut stmt = db.prepare_cached(
        "INSERT INTO unauthorized_access (user_id, username, server, access_time)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![user_id, username, server, &timestamp.to_rfc3339()])?;

    Ok(())
}

/// Newest first, with the fresh total alongside the page
pub fn page(
    db: &Connection,
    offset: usize,
    limit: usize,
) -> Result<(Vec<AccessRecord>, usize), Error> {
    let mut stmt = db.prepare_cached(
        "SELECT id, user_id, username, server, access_time FROM unauthorized_access
         ORDER BY access_time DESC, id DESC
         LIMIT ?1 OFFSET ?2",
    )?;

    let records = stmt
        .query_map(params![limit, offset], |row| AccessRecord::from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    let total = db
        .prepare_cached("SELECT COUNT(1) FROM unauthorized_access")?
        .query_row([], |row| row.get::<_, usize>(0))?;

    Ok((records, total))
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
    fn allow_is_idempotent_and_disallow_reports_membership() {
        let db = test_db();
        let user = UserId::from(42u64);

        assert!(allow(&db, user, Timestamp::now()).unwrap());
        assert!(!allow(&db, user, Timestamp::now()).unwrap());
        assert!(is_allowed(&db, user).unwrap());

        assert!(disallow(&db, user).unwrap());
        assert!(!disallow(&db, user).unwrap());
        assert!(!is_allowed(&db, user).unwrap());
    }

    #[test]
    fn allowed_users_lists_everyone_in_added_order() {
        let db = test_db();
        let now = Timestamp::now();
        allow(&db, UserId::from(1u64), now).unwrap();
        allow(&db, UserId::from(2u64), now).unwrap();

        let users = allowed_users(&db).unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.contains(&UserId::from(1u64)));
        assert!(users.contains(&UserId::from(2u64)));
    }

    #[test]
    fn blacklist_round_trips() {
        let db = test_db();
        let user = UserId::from(7u64);

        assert!(!is_blacklisted(&db, user).unwrap());
        assert!(blacklist_add(&db, user, "Unauthorized action", Timestamp::now()).unwrap());
        assert!(is_blacklisted(&db, user).unwrap());
        assert!(blacklist_remove(&db, user).unwrap());
        assert!(!is_blacklisted(&db, user).unwrap());
    }

    #[test]
    fn access_times_render_without_the_rfc3339_noise() {
        let record = AccessRecord {
            id: 1,
            user_id: UserId::from(1u64),
            username: "user".to_string(),
            server: "DM".to_string(),
            access_time: "2024-01-31T18:30:00.000000+00:00".to_string(),
        };
        assert_eq!(record.time_display(), "2024-01-31 18:30:00");
    }

    #[test]
    fn access_log_pages_newest_first() {
        let db = test_db();
        for i in 1..=6i64 {
            let timestamp = Timestamp::from_unix_timestamp(1_700_000_000 + i).unwrap();
            log_access(&db, UserId::from(i as u64), &format!("user{}", i), "DM", timestamp)
                .unwrap();
        }

        let (records, total) = page(&db, 0, 5).unwrap();
        assert_eq!(total, 6);
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].username, "user6");

        let (records, _) = page(&db, 5, 5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "user1");
    }
}
