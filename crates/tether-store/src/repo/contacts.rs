use crate::error::{Result, StoreError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use tether_core::domain::{Contact, ContactId};

#[derive(Debug, Clone)]
pub struct ContactNew {
    pub name: String,
    pub telegram: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Partial update: `None` leaves a field alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub telegram: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub birthday: Option<Option<NaiveDate>>,
}

impl ContactUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.telegram.is_none()
            && self.phone.is_none()
            && self.birthday.is_none()
    }
}

pub struct ContactsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ContactsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts a new contact. The UNIQUE constraint on `name` is checked by
    /// the insert itself, inside the transaction, so a losing racer gets
    /// `AlreadyExists` and leaves no row behind.
    pub fn create(&self, now_utc: i64, input: ContactNew) -> Result<Contact> {
        let tx = self.conn.unchecked_transaction()?;
        let contact = create_inner(&tx, now_utc, input)?;
        tx.commit()?;
        Ok(contact)
    }

    pub fn get(&self, id: ContactId) -> Result<Option<Contact>> {
        get_inner(self.conn, id)
    }

    /// Exact, case-sensitive name lookup.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Contact>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, telegram, phone, birthday, created_at, updated_at
             FROM contacts WHERE name = ?1;",
        )?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(contact_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn update(&self, now_utc: i64, id: ContactId, update: ContactUpdate) -> Result<Contact> {
        if self.conn.is_autocommit() {
            let tx = self.conn.unchecked_transaction()?;
            let contact = update_inner(&tx, now_utc, id, update)?;
            tx.commit()?;
            Ok(contact)
        } else {
            update_inner(self.conn, now_utc, id, update)
        }
    }

    /// Removes the contact and, through the FK cascade, its logs. Deleting
    /// an absent id is not an error: the result says what was removed.
    pub fn delete(&self, id: ContactId) -> Result<Option<Contact>> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = get_inner(&tx, id)?;
        if existing.is_some() {
            tx.execute("DELETE FROM contacts WHERE id = ?1;", [id.to_string()])?;
        }
        tx.commit()?;
        Ok(existing)
    }

    pub fn list_all(&self) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, telegram, phone, birthday, created_at, updated_at
             FROM contacts ORDER BY name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(contact_from_row(row)?);
        }
        Ok(contacts)
    }

    /// All names, in roster order. Feed for the fuzzy resolver.
    pub fn list_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM contacts ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }
}

fn create_inner(conn: &Connection, now_utc: i64, input: ContactNew) -> Result<Contact> {
    let contact = Contact {
        id: ContactId::new(),
        name: input.name,
        telegram: input.telegram,
        phone: input.phone,
        birthday: input.birthday,
        created_at: now_utc,
        updated_at: now_utc,
    };

    contact.validate()?;

    conn.execute(
        "INSERT INTO contacts (id, name, telegram, phone, birthday, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            contact.id.to_string(),
            contact.name,
            contact.telegram,
            contact.phone,
            contact.birthday.map(|date| date.to_string()),
            contact.created_at,
            contact.updated_at,
        ],
    )
    .map_err(|err| name_conflict(err, &contact.name))?;

    Ok(contact)
}

fn update_inner(
    conn: &Connection,
    now_utc: i64,
    id: ContactId,
    update: ContactUpdate,
) -> Result<Contact> {
    let mut contact = get_inner(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    if let Some(name) = update.name {
        if name != contact.name {
            // Friendly pre-check against a different contact; the UNIQUE
            // constraint below remains the source of truth under races.
            let taken: Option<String> = conn
                .query_row(
                    "SELECT id FROM contacts WHERE name = ?1 AND id <> ?2;",
                    params![name, id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::AlreadyExists(name));
            }
        }
        contact.name = name;
    }
    if let Some(value) = update.telegram {
        contact.telegram = value;
    }
    if let Some(value) = update.phone {
        contact.phone = value;
    }
    if let Some(value) = update.birthday {
        contact.birthday = value;
    }

    contact.updated_at = now_utc;
    contact.validate()?;

    conn.execute(
        "UPDATE contacts SET name = ?2, telegram = ?3, phone = ?4, birthday = ?5, updated_at = ?6
         WHERE id = ?1;",
        params![
            contact.id.to_string(),
            contact.name,
            contact.telegram,
            contact.phone,
            contact.birthday.map(|date| date.to_string()),
            contact.updated_at,
        ],
    )
    .map_err(|err| name_conflict(err, &contact.name))?;

    Ok(contact)
}

fn get_inner(conn: &Connection, id: ContactId) -> Result<Option<Contact>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, telegram, phone, birthday, created_at, updated_at
         FROM contacts WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(contact_from_row(row)?))
    } else {
        Ok(None)
    }
}

/// The only constraint on `contacts` writes is the unique name.
fn name_conflict(err: rusqlite::Error, name: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::AlreadyExists(name.to_string())
        }
        other => StoreError::Sql(other),
    }
}

pub(crate) fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::from_str(raw).map_err(|_| StoreError::InvalidDate(raw.to_string()))
}

fn contact_from_row(row: &rusqlite::Row<'_>) -> Result<Contact> {
    let id_str: String = row.get(0)?;
    let id = ContactId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
    let birthday: Option<String> = row.get(4)?;
    let birthday = birthday.map(|raw| parse_stored_date(&raw)).transpose()?;
    Ok(Contact {
        id,
        name: row.get(1)?,
        telegram: row.get(2)?,
        phone: row.get(3)?,
        birthday,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
