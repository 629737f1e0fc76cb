use crate::error::Result;
use crate::repo::contacts::parse_stored_date;
use chrono::NaiveDate;
use rusqlite::Connection;
use tether_core::rules::ActivityRecord;

pub struct StatsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> StatsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Days since each contact's most recent log, relative to `today`.
    /// Contacts with no logs at all are not reported. A log dated in the
    /// future yields a negative count and lands in the Recent tier.
    pub fn days_since_last_log(&self, today: NaiveDate) -> Result<Vec<ActivityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, MAX(l.date)
             FROM contacts c
             INNER JOIN logs l ON l.contact_id = c.id
             GROUP BY c.id
             ORDER BY c.name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let last_raw: String = row.get(1)?;
            let last = parse_stored_date(&last_raw)?;
            records.push(ActivityRecord {
                name,
                day_count: (today - last).num_days(),
            });
        }
        Ok(records)
    }
}
