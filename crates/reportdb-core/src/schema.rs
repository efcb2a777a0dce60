//! Relational schema for persisted test runs.
//!
//! Issued once through the staged writer before any row insert. Statements
//! are idempotent, so initializing against an existing database is safe.

use crate::error::Result;
use crate::writer::{StagedWriter, Statement};

const SCHEMA_SQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS test_runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_file TEXT NOT NULL,
        generator TEXT NOT NULL,
        imported_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS total_stats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id INTEGER NOT NULL,
        category TEXT NOT NULL CHECK(category IN ('all', 'critical')),
        name TEXT NOT NULL,
        elapsed INTEGER NOT NULL,
        passed INTEGER NOT NULL,
        failed INTEGER NOT NULL,
        FOREIGN KEY (run_id) REFERENCES test_runs(id)
    )",
    "CREATE TABLE IF NOT EXISTS tag_stats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        links TEXT NOT NULL,
        doc TEXT NOT NULL,
        non_critical INTEGER NOT NULL,
        elapsed INTEGER NOT NULL,
        failed INTEGER NOT NULL,
        critical INTEGER NOT NULL,
        combined TEXT,
        passed INTEGER NOT NULL,
        FOREIGN KEY (run_id) REFERENCES test_runs(id)
    )",
    "CREATE TABLE IF NOT EXISTS suite_stats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id INTEGER NOT NULL,
        suite_id TEXT NOT NULL,
        name TEXT NOT NULL,
        elapsed INTEGER NOT NULL,
        failed INTEGER NOT NULL,
        passed INTEGER NOT NULL,
        FOREIGN KEY (run_id) REFERENCES test_runs(id)
    )",
    "CREATE TABLE IF NOT EXISTS suites (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id INTEGER NOT NULL,
        parent_id INTEGER,
        suite_id TEXT NOT NULL,
        name TEXT NOT NULL,
        source TEXT NOT NULL,
        doc TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        FOREIGN KEY (run_id) REFERENCES test_runs(id),
        FOREIGN KEY (parent_id) REFERENCES suites(id)
    )",
    "CREATE TABLE IF NOT EXISTS tests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        suite_id INTEGER NOT NULL,
        test_id TEXT NOT NULL,
        name TEXT NOT NULL,
        timeout TEXT NOT NULL,
        doc TEXT NOT NULL,
        status TEXT NOT NULL,
        FOREIGN KEY (suite_id) REFERENCES suites(id)
    )",
    "CREATE TABLE IF NOT EXISTS keywords (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        suite_id INTEGER,
        test_id INTEGER,
        parent_id INTEGER,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        timeout TEXT NOT NULL,
        doc TEXT NOT NULL,
        status TEXT NOT NULL,
        FOREIGN KEY (suite_id) REFERENCES suites(id),
        FOREIGN KEY (test_id) REFERENCES tests(id),
        FOREIGN KEY (parent_id) REFERENCES keywords(id)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id INTEGER,
        keyword_id INTEGER,
        level TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        content TEXT NOT NULL,
        FOREIGN KEY (run_id) REFERENCES test_runs(id),
        FOREIGN KEY (keyword_id) REFERENCES keywords(id)
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        test_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        FOREIGN KEY (test_id) REFERENCES tests(id)
    )",
    "CREATE TABLE IF NOT EXISTS args (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        keyword_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        FOREIGN KEY (keyword_id) REFERENCES keywords(id)
    )",
];

/// Stages and commits the table-creation batch.
pub fn initialize(writer: &mut StagedWriter) -> Result<()> {
    writer.push_all(SCHEMA_SQL.iter().map(|sql| Statement::new(*sql)));
    writer.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn initialize_creates_all_tables_and_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let mut writer = StagedWriter::new(dir.path().join("results.db"));

        initialize(&mut writer).expect("first init");
        initialize(&mut writer).expect("second init");

        let conn = Connection::open(writer.db_path()).expect("open");
        let names: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<rusqlite::Result<_>>()
            .expect("rows");

        for table in [
            "args",
            "keywords",
            "messages",
            "suite_stats",
            "suites",
            "tag_stats",
            "tags",
            "test_runs",
            "tests",
            "total_stats",
        ] {
            assert!(names.iter().any(|n| n == table), "missing table {table}");
        }
    }
}
