//! Ordered key-value collections on top of SQLite.
//!
//! A bucket is a named collection of `(key, value)` byte pairs iterated in
//! bytewise key order. Top-level buckets are addressed by a root name alone;
//! nested buckets add a byte name under their root (for example the task
//! collection of one group). Each bucket carries its own auto-increment
//! sequence.

use rusqlite::{Connection, OptionalExtension, params};

pub const STATE: &str = "state";
pub const GROUPS: &str = "groups";
pub const TASKS: &str = "tasks";
pub const SLICES: &str = "slices";
pub const HISTORY: &str = "history";

/// Top-level buckets created when a store is opened.
pub const ROOTS: [&str; 5] = [STATE, GROUPS, TASKS, SLICES, HISTORY];

pub type Entry = (Vec<u8>, Vec<u8>);

pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS buckets (
        root TEXT NOT NULL,
        name BLOB NOT NULL,
        sequence INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (root, name)
    ) WITHOUT ROWID;

    -- key/value are compared bytewise (BLOB collation)
    CREATE TABLE IF NOT EXISTS entries (
        root TEXT NOT NULL,
        bucket BLOB NOT NULL,
        key BLOB NOT NULL,
        value BLOB NOT NULL,
        PRIMARY KEY (root, bucket, key),
        FOREIGN KEY (root, bucket) REFERENCES buckets(root, name) ON DELETE CASCADE
    ) WITHOUT ROWID;
";

/// Handle to one bucket, bound to a connection or open transaction.
pub struct Bucket<'c> {
    conn: &'c Connection,
    root: &'static str,
    name: Vec<u8>,
}

impl<'c> Bucket<'c> {
    /// A top-level bucket. These always exist once the schema is initialized.
    pub const fn top(conn: &'c Connection, root: &'static str) -> Self {
        Self {
            conn,
            root,
            name: Vec::new(),
        }
    }

    /// Opens a nested bucket, returning `None` if it has not been created.
    pub fn nested(
        conn: &'c Connection,
        root: &'static str,
        name: &[u8],
    ) -> rusqlite::Result<Option<Self>> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM buckets WHERE root = ? AND name = ?",
                params![root, name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists.then(|| Self {
            conn,
            root,
            name: name.to_vec(),
        }))
    }

    /// Creates a bucket unless it already exists.
    pub fn create_if_not_exists(
        conn: &'c Connection,
        root: &'static str,
        name: &[u8],
    ) -> rusqlite::Result<Self> {
        conn.execute(
            "INSERT OR IGNORE INTO buckets (root, name) VALUES (?, ?)",
            params![root, name],
        )?;
        Ok(Self {
            conn,
            root,
            name: name.to_vec(),
        })
    }

    pub fn get(&self, key: &[u8]) -> rusqlite::Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT value FROM entries WHERE root = ? AND bucket = ? AND key = ?",
                params![self.root, self.name, key],
                |row| row.get(0),
            )
            .optional()
    }

    /// Inserts or replaces the value stored at `key`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> rusqlite::Result<()> {
        self.conn.execute(
            "
            INSERT INTO entries (root, bucket, key, value) VALUES (?, ?, ?, ?)
            ON CONFLICT(root, bucket, key) DO UPDATE SET value = excluded.value
            ",
            params![self.root, self.name, key, value],
        )?;
        Ok(())
    }

    /// Deletes `key`, returning whether it existed.
    pub fn delete(&self, key: &[u8]) -> rusqlite::Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM entries WHERE root = ? AND bucket = ? AND key = ?",
            params![self.root, self.name, key],
        )?;
        Ok(deleted > 0)
    }

    /// The entry with the highest key.
    pub fn last(&self) -> rusqlite::Result<Option<Entry>> {
        self.conn
            .query_row(
                "
                SELECT key, value FROM entries
                WHERE root = ? AND bucket = ?
                ORDER BY key DESC
                LIMIT 1
                ",
                params![self.root, self.name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
    }

    /// All entries in key order.
    pub fn entries(&self) -> rusqlite::Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "
            SELECT key, value FROM entries
            WHERE root = ? AND bucket = ?
            ORDER BY key ASC
            ",
        )?;
        let rows = stmt.query_map(params![self.root, self.name], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Entries with `min <= key < max`, in key order.
    pub fn range(&self, min: &[u8], max: &[u8]) -> rusqlite::Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "
            SELECT key, value FROM entries
            WHERE root = ? AND bucket = ? AND key >= ? AND key < ?
            ORDER BY key ASC
            ",
        )?;
        let rows = stmt.query_map(params![self.root, self.name, min, max], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Advances and returns the bucket's sequence. The first call returns 1.
    pub fn next_sequence(&self) -> rusqlite::Result<i64> {
        self.conn.query_row(
            "
            UPDATE buckets SET sequence = sequence + 1
            WHERE root = ? AND name = ?
            RETURNING sequence
            ",
            params![self.root, self.name],
            |row| row.get(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        for root in ROOTS {
            Bucket::create_if_not_exists(&conn, root, &[]).unwrap();
        }
        conn
    }

    #[test]
    fn put_get_and_overwrite() {
        let conn = conn();
        let bucket = Bucket::top(&conn, STATE);
        assert_eq!(bucket.get(b"k").unwrap(), None);

        bucket.put(b"k", b"one").unwrap();
        bucket.put(b"k", b"two").unwrap();
        assert_eq!(bucket.get(b"k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(bucket.entries().unwrap().len(), 1);
    }

    #[test]
    fn empty_values_are_kept() {
        let conn = conn();
        let bucket = Bucket::top(&conn, STATE);
        bucket.put(b"open", &[]).unwrap();
        assert_eq!(bucket.get(b"open").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn nested_buckets_are_isolated() {
        let conn = conn();
        assert!(Bucket::nested(&conn, TASKS, b"a").unwrap().is_none());

        let a = Bucket::create_if_not_exists(&conn, TASKS, b"a").unwrap();
        let b = Bucket::create_if_not_exists(&conn, TASKS, b"b").unwrap();
        a.put(b"1", b"in a").unwrap();

        assert!(Bucket::nested(&conn, TASKS, b"a").unwrap().is_some());
        assert_eq!(b.get(b"1").unwrap(), None);
        assert_eq!(Bucket::top(&conn, TASKS).entries().unwrap(), Vec::new());
    }

    #[test]
    fn iteration_is_bytewise_ordered() {
        let conn = conn();
        let bucket = Bucket::top(&conn, GROUPS);
        for key in [[0u8, 2], [0, 10], [1, 0], [0, 1]] {
            bucket.put(&key, b"v").unwrap();
        }
        let keys: Vec<Vec<u8>> = bucket.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![vec![0, 1], vec![0, 2], vec![0, 10], vec![1, 0]]);
        assert_eq!(bucket.last().unwrap().map(|(k, _)| k), Some(vec![1, 0]));
    }

    #[test]
    fn range_excludes_upper_bound() {
        let conn = conn();
        let bucket = Bucket::top(&conn, SLICES);
        for key in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            bucket.put(key.as_bytes(), b"").unwrap();
        }
        let keys: Vec<Vec<u8>> = bucket
            .range(b"2024-01-01", b"2024-01-03")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"2024-01-01".to_vec(), b"2024-01-02".to_vec()]);
    }

    #[test]
    fn sequences_are_per_bucket() {
        let conn = conn();
        let groups = Bucket::top(&conn, GROUPS);
        let tasks = Bucket::create_if_not_exists(&conn, TASKS, b"g1").unwrap();
        assert_eq!(groups.next_sequence().unwrap(), 1);
        assert_eq!(groups.next_sequence().unwrap(), 2);
        assert_eq!(tasks.next_sequence().unwrap(), 1);
    }

    #[test]
    fn delete_reports_presence() {
        let conn = conn();
        let bucket = Bucket::top(&conn, HISTORY);
        bucket.put(b"k", b"v").unwrap();
        assert!(bucket.delete(b"k").unwrap());
        assert!(!bucket.delete(b"k").unwrap());
    }
}
