use poise::serenity_prelude::Timestamp;
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

impl Note {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    /// "2024-01-31 18:30:00" from the stored rfc3339 timestamp
    pub fn created_display(&self) -> String {
        let mut display = self.created_at.clone();
        display.truncate(19);
        display.replace('T', " ")
    }
}

pub fn add(
    db: &Connection,
    title: &str,
    content: &str,
    timestamp: Timestamp,
) -> Result<(), Error> {
    let mut stmt = db.prepare_cached(
        "INSERT INTO notes (title, content, created_at)
         VALUES (?1, ?2, ?3)",
    )?;

    let note_id = stmt.insert(params![title, content, &timestamp.to_rfc3339()])?;
    debug!(note_id, "note inserted");

    Ok(())
}

/// Newest first, with the fresh total alongside the page
pub fn page(db: &Connection, offset: usize, limit: usize) -> Result<(Vec<Note>, usize), Error> {
    let mut stmt = db.prepare_cached(
        "SELECT id, title, content, created_at FROM notes
         ORDER BY created_at DESC, id DESC
         LIMIT ?1 OFFSET ?2",
    )?;

    let notes = stmt
        .query_map(params![limit, offset], |row| Note::from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    let total = db
        .prepare_cached("SELECT COUNT(1) FROM notes")?
        .query_row([], |row| row.get::<_, usize>(0))?;

    Ok((notes, total))
}

pub fn update_content(db: &Connection, note_id: i64, content: &str) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached("UPDATE notes SET content=?2 WHERE id=?1")?;

    Ok(stmt.execute(params![note_id, content])? == 1)
}

pub fn delete(db: &Connection, note_id: i64) -> Result<bool, Error> {
    let mut stmt = db.prepare_cached("DELETE FROM notes WHERE id=?1")?;

    Ok(stmt.execute(params![note_id])? == 1)
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

    fn add_n(db: &Connection, count: usize) {
        for i in 1..=count {
            let timestamp =
                Timestamp::from_unix_timestamp(1_700_000_000 + i as i64).unwrap();
            add(db, &format!("title {}", i), &format!("content {}", i), timestamp).unwrap();
        }
    }

    #[test]
    fn pages_are_newest_first_with_fresh_totals() {
        let db = test_db();
        add_n(&db, 7);

        let (first, total) = page(&db, 0, 5).unwrap();
        assert_eq!(total, 7);
        assert_eq!(first.len(), 5);
        assert_eq!(first[0].title, "title 7");

        let (second, total) = page(&db, 5, 5).unwrap();
        assert_eq!(total, 7);
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].title, "title 1");
    }

    #[test]
    fn update_and_delete_report_whether_the_row_existed() {
        let db = test_db();
        add_n(&db, 1);
        let (notes, _) = page(&db, 0, 5).unwrap();
        let id = notes[0].id;

        assert!(update_content(&db, id, "new content").unwrap());
        let (notes, _) = page(&db, 0, 5).unwrap();
        assert_eq!(notes[0].content, "new content");

        assert!(delete(&db, id).unwrap());
        assert!(!delete(&db, id).unwrap());
        assert!(!update_content(&db, id, "gone").unwrap());

        let (notes, total) = page(&db, 0, 5).unwrap();
        assert!(notes.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn created_display_trims_the_rfc3339_timestamp() {
        let note = Note {
            id: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            created_at: "2024-01-31T18:30:00.000Z".to_string(),
        };
        assert_eq!(note.created_display(), "2024-01-31 18:30:00");
    }
}
