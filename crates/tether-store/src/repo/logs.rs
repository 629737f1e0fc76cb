use crate::error::{Result, StoreError};
use crate::repo::contacts::parse_stored_date;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use tether_core::domain::{ContactId, LogEntry, LogId};
use tether_core::CoreError;

/// Partial update for one log entry: text, date, or both.
#[derive(Debug, Clone, Default)]
pub struct LogUpdate {
    pub text: Option<String>,
    pub date: Option<NaiveDate>,
}

pub struct LogsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> LogsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Appends a log entry. The per-contact sequence number is assigned
    /// inside the same transaction as the insert, so concurrent appends to
    /// one contact cannot collide.
    pub fn add(
        &self,
        now_utc: i64,
        contact_id: ContactId,
        date: NaiveDate,
        text: &str,
    ) -> Result<LogEntry> {
        if text.trim().is_empty() {
            return Err(StoreError::Core(CoreError::EmptyLogText));
        }
        self.add_raw(now_utc, contact_id, date, text)
    }

    /// The explicit "met, nothing to record" marker: the one path that may
    /// store empty text.
    pub fn add_empty(
        &self,
        now_utc: i64,
        contact_id: ContactId,
        date: NaiveDate,
    ) -> Result<LogEntry> {
        self.add_raw(now_utc, contact_id, date, "")
    }

    fn add_raw(
        &self,
        now_utc: i64,
        contact_id: ContactId,
        date: NaiveDate,
        text: &str,
    ) -> Result<LogEntry> {
        let tx = self.conn.unchecked_transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM contacts WHERE id = ?1;",
                [contact_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound(contact_id.to_string()));
        }

        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM logs WHERE contact_id = ?1;",
            [contact_id.to_string()],
            |row| row.get(0),
        )?;

        let entry = LogEntry {
            id: LogId::new(),
            contact_id,
            date,
            text: text.to_string(),
            seq,
            created_at: now_utc,
        };

        tx.execute(
            "INSERT INTO logs (id, contact_id, date, text, seq, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.id.to_string(),
                entry.contact_id.to_string(),
                entry.date.to_string(),
                entry.text,
                entry.seq,
                entry.created_at,
            ],
        )?;

        tx.commit()?;
        Ok(entry)
    }

    pub fn get(&self, id: LogId) -> Result<Option<LogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, date, text, seq, created_at FROM logs WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(log_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Resolves a user-facing "log #n" reference for one contact.
    pub fn get_by_seq(&self, contact_id: ContactId, seq: i64) -> Result<Option<LogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, date, text, seq, created_at
             FROM logs WHERE contact_id = ?1 AND seq = ?2;",
        )?;
        let mut rows = stmt.query(params![contact_id.to_string(), seq])?;
        if let Some(row) = rows.next()? {
            Ok(Some(log_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Full history for one contact, oldest first. This is the order the
    /// windowing algorithm expects.
    pub fn list_for_contact(&self, contact_id: ContactId) -> Result<Vec<LogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, date, text, seq, created_at
             FROM logs WHERE contact_id = ?1
             ORDER BY date ASC, seq ASC;",
        )?;
        let mut rows = stmt.query([contact_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(log_from_row(row)?);
        }
        Ok(entries)
    }

    /// Entries dated on or after `since`, joined with their contact's name,
    /// grouped by name order then date.
    pub fn list_since(&self, since: NaiveDate) -> Result<Vec<(String, LogEntry)>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, l.id, l.contact_id, l.date, l.text, l.seq, l.created_at
             FROM logs l
             INNER JOIN contacts c ON c.id = l.contact_id
             WHERE l.date >= ?1
             ORDER BY c.name COLLATE NOCASE ASC, l.date ASC, l.seq ASC;",
        )?;
        let mut rows = stmt.query([since.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let id_str: String = row.get(1)?;
            let id = LogId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
            let contact_id_str: String = row.get(2)?;
            let contact_id = ContactId::from_str(&contact_id_str)
                .map_err(|_| StoreError::InvalidId(contact_id_str.clone()))?;
            let date_raw: String = row.get(3)?;
            entries.push((
                name,
                LogEntry {
                    id,
                    contact_id,
                    date: parse_stored_date(&date_raw)?,
                    text: row.get(4)?,
                    seq: row.get(5)?,
                    created_at: row.get(6)?,
                },
            ));
        }
        Ok(entries)
    }

    pub fn update(&self, id: LogId, update: LogUpdate) -> Result<LogEntry> {
        if let Some(text) = &update.text {
            if text.trim().is_empty() {
                return Err(StoreError::Core(CoreError::EmptyLogText));
            }
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut entry = match get_in_tx(&tx, id)? {
            Some(entry) => entry,
            None => return Err(StoreError::NotFound(id.to_string())),
        };

        if let Some(text) = update.text {
            entry.text = text;
        }
        if let Some(date) = update.date {
            entry.date = date;
        }

        tx.execute(
            "UPDATE logs SET date = ?2, text = ?3 WHERE id = ?1;",
            params![entry.id.to_string(), entry.date.to_string(), entry.text],
        )?;
        tx.commit()?;
        Ok(entry)
    }

    pub fn delete(&self, id: LogId) -> Result<Option<LogEntry>> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = get_in_tx(&tx, id)?;
        if existing.is_some() {
            tx.execute("DELETE FROM logs WHERE id = ?1;", [id.to_string()])?;
        }
        tx.commit()?;
        Ok(existing)
    }
}

fn get_in_tx(conn: &Connection, id: LogId) -> Result<Option<LogEntry>> {
    let mut stmt = conn
        .prepare("SELECT id, contact_id, date, text, seq, created_at FROM logs WHERE id = ?1;")?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(log_from_row(row)?))
    } else {
        Ok(None)
    }
}

fn log_from_row(row: &rusqlite::Row<'_>) -> Result<LogEntry> {
    let id_str: String = row.get(0)?;
    let id = LogId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
    let contact_id_str: String = row.get(1)?;
    let contact_id = ContactId::from_str(&contact_id_str)
        .map_err(|_| StoreError::InvalidId(contact_id_str.clone()))?;
    let date_raw: String = row.get(2)?;
    Ok(LogEntry {
        id,
        contact_id,
        date: parse_stored_date(&date_raw)?,
        text: row.get(3)?,
        seq: row.get(4)?,
        created_at: row.get(5)?,
    })
}
