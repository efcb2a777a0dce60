//! Staged SQL writes: statements accumulate in an ordered queue and are
//! applied as one transactional batch per `commit`.

use std::mem;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params_from_iter, types::Value};
use tracing::debug;

use crate::error::Result;

/// One pending write operation: SQL text plus positional parameters.
/// Statement syntax is not validated here; execution surfaces any problem.
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Unit-of-work writer for one SQLite database file.
///
/// `push` only grows the in-memory queue; `commit` opens a connection, runs
/// the whole queue in enqueue order inside a single transaction, and returns
/// the id of the last row inserted by the batch. A failure rolls the entire
/// batch back; nothing of a failed commit reaches the database.
#[derive(Debug)]
pub struct StagedWriter {
    db_path: PathBuf,
    pending: Vec<Statement>,
}

impl StagedWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            pending: Vec::new(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Appends one operation to the pending queue. No I/O.
    pub fn push(&mut self, statement: Statement) {
        self.pending.push(statement);
    }

    /// Appends several operations in call order. No I/O.
    pub fn push_all(&mut self, statements: impl IntoIterator<Item = Statement>) {
        self.pending.extend(statements);
    }

    /// Number of operations staged since the last commit.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Executes every pending operation inside one transaction and returns
    /// the last inserted row id (0 when the batch inserted nothing).
    ///
    /// The queue is drained up front, so it is empty after this call returns
    /// whether the batch succeeded or failed; a failed batch is rolled back
    /// by the transaction dropping, and the connection closes on every exit
    /// path.
    pub fn commit(&mut self) -> Result<i64> {
        let batch = mem::take(&mut self.pending);

        if let Some(parent) = self.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(&self.db_path)?;
        let tx = conn.transaction()?;
        for statement in &batch {
            tx.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
        }
        let last_row_id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(
            statements = batch.len(),
            last_row_id,
            db = %self.db_path.display(),
            "committed batch"
        );
        Ok(last_row_id)
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use tempfile::tempdir;

    use super::*;
    use crate::error::ReportDbError;

    fn writer_in(dir: &tempfile::TempDir) -> StagedWriter {
        StagedWriter::new(dir.path().join("results.db"))
    }

    #[test]
    fn queue_executes_in_push_order_and_drains() {
        let dir = tempdir().expect("tempdir");
        let mut writer = writer_in(&dir);

        writer.push(Statement::new(
            "CREATE TABLE IF NOT EXISTS entries (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT NOT NULL)",
        ));
        writer.push_all([
            Statement::with_params(
                "INSERT INTO entries(label) VALUES (?1)",
                vec![Value::from("b".to_string())],
            ),
            Statement::with_params(
                "INSERT INTO entries(label) VALUES (?1)",
                vec![Value::from("c".to_string())],
            ),
        ]);
        assert_eq!(writer.pending(), 3);

        let last = writer.commit().expect("commit");
        assert_eq!(last, 2);
        assert_eq!(writer.pending(), 0);

        let conn = Connection::open(writer.db_path()).expect("open");
        let labels: Vec<String> = conn
            .prepare("SELECT label FROM entries ORDER BY id")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<rusqlite::Result<_>>()
            .expect("rows");
        assert_eq!(labels, ["b", "c"]);
    }

    #[test]
    fn commit_with_empty_queue_is_a_no_op_and_does_not_error() {
        let dir = tempdir().expect("tempdir");
        let mut writer = writer_in(&dir);

        writer.push(Statement::new(
            "CREATE TABLE IF NOT EXISTS entries (id INTEGER PRIMARY KEY AUTOINCREMENT)",
        ));
        writer.commit().expect("first commit");

        let last = writer.commit().expect("second commit");
        assert_eq!(last, 0);
        assert_eq!(writer.pending(), 0);
        // The database file still exists: the empty commit opened and closed
        // a connection against it.
        assert!(writer.db_path().exists());
    }

    #[test]
    fn failed_batch_rolls_back_entirely() {
        let dir = tempdir().expect("tempdir");
        let mut writer = writer_in(&dir);

        writer.push(Statement::new(
            "CREATE TABLE entries (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT NOT NULL)",
        ));
        writer.commit().expect("schema commit");

        writer.push_all([
            Statement::with_params(
                "INSERT INTO entries(label) VALUES (?1)",
                vec![Value::from("kept?".to_string())],
            ),
            Statement::new("INSERT INTO no_such_table(label) VALUES ('boom')"),
        ]);
        let err = writer.commit().expect_err("must fail");
        assert!(matches!(err, ReportDbError::Sqlite(_)));
        assert_eq!(writer.pending(), 0);

        // The first insert of the failed batch must not be visible.
        let conn = Connection::open(writer.db_path()).expect("open");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn pushes_between_commits_only_affect_their_own_batch() {
        let dir = tempdir().expect("tempdir");
        let mut writer = writer_in(&dir);

        writer.push(Statement::new(
            "CREATE TABLE entries (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT NOT NULL)",
        ));
        writer.push(Statement::with_params(
            "INSERT INTO entries(label) VALUES (?1)",
            vec![Value::from("first".to_string())],
        ));
        let first = writer.commit().expect("first commit");
        assert_eq!(first, 1);

        writer.push(Statement::with_params(
            "INSERT INTO entries(label) VALUES (?1)",
            vec![Value::from("second".to_string())],
        ));
        let second = writer.commit().expect("second commit");
        assert_eq!(second, 2);
    }
}
