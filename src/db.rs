//! SQLite persistence for cookies.
//!
//! One row per persistent cookie. The store keeps a `Cookie -> row id` map (by
//! full value, not identity) so the repository can point a later update or
//! delete at the durable row backing a specific in-memory cookie. Session
//! cookies never reach this layer; the repository filters them out.
//!
//! Write failures and map inconsistencies are logged and absorbed: the
//! in-memory map stays the source of truth for the rest of the process
//! lifetime, and a persistence glitch must not break an HTTP exchange.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection, Row};

use crate::cookie::Cookie;
use crate::error::CookieStoreError;
use crate::set::CookieSet;

const TABLE_COOKIE: &str = "cookie";

/// Declarative schema: column name and SQLite type, in row order.
/// There is exactly one schema version.
const COOKIE_COLUMNS: &[(&str, &str)] = &[
    ("name", "TEXT NOT NULL"),
    ("value", "TEXT NOT NULL"),
    ("expires_at", "INTEGER NOT NULL"),
    ("domain", "TEXT NOT NULL"),
    ("path", "TEXT NOT NULL"),
    ("secure", "INTEGER NOT NULL"),
    ("http_only", "INTEGER NOT NULL"),
    ("persistent", "INTEGER NOT NULL"),
    ("host_only", "INTEGER NOT NULL"),
];

/// The durable backing table for persistent cookies.
pub struct CookieDatabase {
    conn: Connection,
    row_ids: HashMap<Cookie, i64>,
    loaded: bool,
}

impl CookieDatabase {
    /// Open (creating if needed) the cookie database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CookieStoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database. Mostly useful in tests; nothing
    /// survives `close`.
    pub fn open_in_memory() -> Result<Self, CookieStoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CookieStoreError> {
        conn.execute(&create_table_sql(), [])?;
        Ok(Self {
            conn,
            row_ids: HashMap::new(),
            loaded: false,
        })
    }

    /// Read every row once and build the domain-keyed in-memory indexes.
    ///
    /// Rows that are malformed, non-persistent, or already expired at `now`
    /// are batch-deleted in one transaction and skipped. Calling this a second
    /// time is a contract violation ([`CookieStoreError::AlreadyLoaded`]): the
    /// row-id map would be rebuilt inconsistently.
    pub fn load_all(&mut self, now: i64) -> Result<HashMap<String, CookieSet>, CookieStoreError> {
        if self.loaded {
            return Err(CookieStoreError::AlreadyLoaded);
        }
        self.loaded = true;

        let mut map: HashMap<String, CookieSet> = HashMap::new();
        let mut to_delete: Vec<i64> = Vec::new();
        {
            let mut stmt = self.conn.prepare(&select_all_sql())?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let id: i64 = row.get(0)?;
                match parse_row(row, now) {
                    Some(cookie) => {
                        self.row_ids.insert(cookie.clone(), id);
                        map.entry(cookie.domain.clone()).or_default().add(cookie);
                    }
                    None => to_delete.push(id),
                }
            }
        }

        if !to_delete.is_empty() {
            let tx = self.conn.transaction()?;
            {
                let mut stmt =
                    tx.prepare(&format!("DELETE FROM {TABLE_COOKIE} WHERE id = ?1"))?;
                for id in &to_delete {
                    stmt.execute([id])?;
                }
            }
            tx.commit()?;
            tracing::debug!(count = to_delete.len(), "purged invalid or expired cookie rows");
        }

        Ok(map)
    }

    /// Insert a durable row for a persistent cookie.
    pub fn add(&mut self, cookie: &Cookie) {
        let result = self.conn.execute(
            &insert_sql(),
            params![
                cookie.name,
                cookie.value,
                cookie.expires_at,
                cookie.domain,
                cookie.path,
                cookie.secure,
                cookie.http_only,
                cookie.persistent,
                cookie.host_only,
            ],
        );
        match result {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                if self.row_ids.insert(cookie.clone(), id).is_some() {
                    tracing::error!(
                        name = %cookie.name,
                        domain = %cookie.domain,
                        "added a duplicate cookie"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, "an error occurred when inserting a cookie"),
        }
    }

    /// Overwrite the row backing `from` with the values of `to`, re-keying the
    /// row-id map. A missing row is logged and leaves durable state untouched.
    pub fn update(&mut self, from: &Cookie, to: &Cookie) {
        let Some(id) = self.row_ids.remove(from) else {
            tracing::error!(
                name = %from.name,
                domain = %from.domain,
                "can't get the row id when updating a cookie"
            );
            return;
        };

        let result = self.conn.execute(
            &update_sql(),
            params![
                to.name,
                to.value,
                to.expires_at,
                to.domain,
                to.path,
                to.secure,
                to.http_only,
                to.persistent,
                to.host_only,
                id,
            ],
        );
        match result {
            Ok(1) => {}
            Ok(count) => tracing::error!(count, "bad row count when updating a cookie"),
            Err(e) => tracing::error!(error = %e, "an error occurred when updating a cookie"),
        }

        self.row_ids.insert(to.clone(), id);
    }

    /// Delete the row backing `cookie`. A missing row is logged and ignored.
    pub fn remove(&mut self, cookie: &Cookie) {
        let Some(id) = self.row_ids.remove(cookie) else {
            tracing::error!(
                name = %cookie.name,
                domain = %cookie.domain,
                "can't get the row id when removing a cookie"
            );
            return;
        };

        let result = self
            .conn
            .execute(&format!("DELETE FROM {TABLE_COOKIE} WHERE id = ?1"), [id]);
        match result {
            Ok(1) => {}
            Ok(count) => tracing::error!(count, "bad row count when removing a cookie"),
            Err(e) => tracing::error!(error = %e, "an error occurred when removing a cookie"),
        }
    }

    /// Delete every row and empty the row-id map.
    pub fn clear(&mut self) {
        if let Err(e) = self.conn.execute(&format!("DELETE FROM {TABLE_COOKIE}"), []) {
            tracing::error!(error = %e, "an error occurred when clearing the cookie table");
        }
        self.row_ids.clear();
    }

    /// Number of durable rows currently in the table.
    pub fn row_count(&self) -> Result<i64, CookieStoreError> {
        Ok(self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE_COOKIE}"), [], |r| {
                r.get(0)
            })?)
    }

    /// Release the storage handle. Consuming `self` makes any further call a
    /// compile error.
    pub fn close(self) {
        if let Err((_, e)) = self.conn.close() {
            tracing::error!(error = %e, "an error occurred when closing the cookie database");
        }
    }
}

fn column_names() -> String {
    COOKIE_COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_table_sql() -> String {
    let columns = COOKIE_COLUMNS
        .iter()
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {TABLE_COOKIE} (id INTEGER PRIMARY KEY AUTOINCREMENT, {columns})")
}

fn select_all_sql() -> String {
    format!("SELECT id, {} FROM {TABLE_COOKIE}", column_names())
}

fn insert_sql() -> String {
    let placeholders = (1..=COOKIE_COLUMNS.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {TABLE_COOKIE} ({}) VALUES ({placeholders})",
        column_names()
    )
}

fn update_sql() -> String {
    let assignments = COOKIE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {TABLE_COOKIE} SET {assignments} WHERE id = ?{}",
        COOKIE_COLUMNS.len() + 1
    )
}

/// Parse one row into a live persistent cookie, or None for anything that
/// should be purged: malformed columns, a stray session row, or an expiry at
/// or before `now`.
fn parse_row(row: &Row<'_>, now: i64) -> Option<Cookie> {
    let cookie = match read_row(row) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, "can't parse a cookie row, dropping it");
            return None;
        }
    };
    if !cookie.persistent || cookie.is_expired(now) {
        return None;
    }
    Some(cookie)
}

// Column indexes follow COOKIE_COLUMNS order, offset by one for the id.
fn read_row(row: &Row<'_>) -> rusqlite::Result<Cookie> {
    Ok(Cookie {
        name: row.get(1)?,
        value: row.get(2)?,
        expires_at: row.get(3)?,
        domain: row.get(4)?,
        path: row.get(5)?,
        secure: row.get(6)?,
        http_only: row.get(7)?,
        persistent: row.get(8)?,
        host_only: row.get(9)?,
    })
}
