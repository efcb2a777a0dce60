//! Translation of a normalized report mapping into staged INSERTs.
//!
//! This consumes the mapping produced by `normalize`, not the typed tree:
//! the mapping is the boundary between the two halves of the pipeline.
//! Foreign keys are chained through the row id each `commit` returns, so
//! identity-bearing rows (run, suite, test, keyword) commit one by one while
//! their dependent leaf rows (stats, tags, args, messages) go in as one
//! batch per parent.
//!
//! A key that is absent or mis-typed means the normalizer and this module
//! disagree about the mapping shape; that is a compatibility error and the
//! run stops.

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{ReportDbError, Result};
use crate::writer::{StagedWriter, Statement};

/// Which row a keyword hangs off. Exactly one foreign key column is set.
#[derive(Debug, Clone, Copy)]
enum KeywordOwner {
    Suite(i64),
    Test(i64),
    Keyword(i64),
}

impl KeywordOwner {
    fn columns(self) -> (SqlValue, SqlValue, SqlValue) {
        match self {
            Self::Suite(id) => (SqlValue::Integer(id), SqlValue::Null, SqlValue::Null),
            Self::Test(id) => (SqlValue::Null, SqlValue::Integer(id), SqlValue::Null),
            Self::Keyword(id) => (SqlValue::Null, SqlValue::Null, SqlValue::Integer(id)),
        }
    }
}

/// Inserts one normalized run, returning the `test_runs` row id.
pub fn store_run(writer: &mut StagedWriter, normalized: &Value) -> Result<i64> {
    let run = object(normalized, "run")?;

    writer.push(Statement::with_params(
        "INSERT INTO test_runs(source_file, generator, imported_at) VALUES (?1, ?2, ?3)",
        vec![
            text(run, "source_file", "run")?.into(),
            text(run, "generator", "run")?.into(),
            SqlValue::Text(Utc::now().to_rfc3339()),
        ],
    ));
    let run_id = writer.commit()?;

    store_statistics(writer, run_id, field(run, "statistics", "run")?)?;
    store_run_messages(writer, run_id, sequence(run, "messages", "run")?)?;

    for suite in sequence(run, "suites", "run")? {
        store_suite(writer, run_id, None, suite)?;
    }

    info!(run_id, "stored normalized run");
    Ok(run_id)
}

fn store_statistics(writer: &mut StagedWriter, run_id: i64, statistics: &Value) -> Result<i64> {
    let statistics = object(statistics, "statistics")?;
    let total = object(field(statistics, "total", "statistics")?, "total")?;

    for category in ["all", "critical"] {
        let stat = object(field(total, category, "total")?, category)?;
        writer.push(Statement::with_params(
            "INSERT INTO total_stats(run_id, category, name, elapsed, passed, failed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            vec![
                SqlValue::Integer(run_id),
                SqlValue::Text(category.to_string()),
                text(stat, "name", "total stat")?.into(),
                integer(stat, "elapsed", "total stat")?.into(),
                integer(stat, "passed", "total stat")?.into(),
                integer(stat, "failed", "total stat")?.into(),
            ],
        ));
    }

    for stat_value in sequence(statistics, "tag", "statistics")? {
        let stat = object(stat_value, "tag stat")?;
        writer.push(Statement::with_params(
            "INSERT INTO tag_stats(run_id, name, links, doc, non_critical, elapsed, failed,
                                   critical, combined, passed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            vec![
                SqlValue::Integer(run_id),
                text(stat, "name", "tag stat")?.into(),
                SqlValue::Text(field(stat, "links", "tag stat")?.to_string()),
                text(stat, "doc", "tag stat")?.into(),
                boolean(stat, "non_critical", "tag stat")?.into(),
                integer(stat, "elapsed", "tag stat")?.into(),
                integer(stat, "failed", "tag stat")?.into(),
                boolean(stat, "critical", "tag stat")?.into(),
                optional_text(stat, "combined", "tag stat")?,
                integer(stat, "passed", "tag stat")?.into(),
            ],
        ));
    }

    for stat_value in sequence(statistics, "suite", "statistics")? {
        let stat = object(stat_value, "suite stat")?;
        writer.push(Statement::with_params(
            "INSERT INTO suite_stats(run_id, suite_id, name, elapsed, failed, passed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            vec![
                SqlValue::Integer(run_id),
                text(stat, "id", "suite stat")?.into(),
                text(stat, "name", "suite stat")?.into(),
                integer(stat, "elapsed", "suite stat")?.into(),
                integer(stat, "failed", "suite stat")?.into(),
                integer(stat, "passed", "suite stat")?.into(),
            ],
        ));
    }

    writer.commit()
}

fn store_run_messages(writer: &mut StagedWriter, run_id: i64, messages: &[Value]) -> Result<i64> {
    for message in messages {
        push_message(writer, Some(run_id), None, message)?;
    }
    writer.commit()
}

fn store_suite(
    writer: &mut StagedWriter,
    run_id: i64,
    parent_id: Option<i64>,
    suite: &Value,
) -> Result<i64> {
    let suite = object(suite, "suite")?;

    writer.push(Statement::with_params(
        "INSERT INTO suites(run_id, parent_id, suite_id, name, source, doc, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        vec![
            SqlValue::Integer(run_id),
            parent_id.map_or(SqlValue::Null, SqlValue::Integer),
            text(suite, "id", "suite")?.into(),
            text(suite, "name", "suite")?.into(),
            text(suite, "source", "suite")?.into(),
            text(suite, "doc", "suite")?.into(),
            text(suite, "start_time", "suite")?.into(),
            text(suite, "end_time", "suite")?.into(),
        ],
    ));
    let suite_row = writer.commit()?;

    for keyword in sequence(suite, "keywords", "suite")? {
        store_keyword(writer, KeywordOwner::Suite(suite_row), keyword)?;
    }
    for test in sequence(suite, "tests", "suite")? {
        store_test(writer, suite_row, test)?;
    }
    for child in sequence(suite, "suites", "suite")? {
        store_suite(writer, run_id, Some(suite_row), child)?;
    }

    Ok(suite_row)
}

fn store_test(writer: &mut StagedWriter, suite_row: i64, test: &Value) -> Result<i64> {
    let test = object(test, "test")?;

    writer.push(Statement::with_params(
        "INSERT INTO tests(suite_id, test_id, name, timeout, doc, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
            SqlValue::Integer(suite_row),
            text(test, "id", "test")?.into(),
            text(test, "name", "test")?.into(),
            text(test, "timeout", "test")?.into(),
            text(test, "doc", "test")?.into(),
            text(test, "status", "test")?.into(),
        ],
    ));
    let test_row = writer.commit()?;

    let tags = sequence(test, "tags", "test")?;
    if !tags.is_empty() {
        for tag in tags {
            let tag = object(tag, "tag")?;
            writer.push(Statement::with_params(
                "INSERT INTO tags(test_id, content) VALUES (?1, ?2)",
                vec![
                    SqlValue::Integer(test_row),
                    text(tag, "content", "tag")?.into(),
                ],
            ));
        }
        writer.commit()?;
    }

    for keyword in sequence(test, "keywords", "test")? {
        store_keyword(writer, KeywordOwner::Test(test_row), keyword)?;
    }

    Ok(test_row)
}

fn store_keyword(writer: &mut StagedWriter, owner: KeywordOwner, keyword: &Value) -> Result<i64> {
    let keyword = object(keyword, "keyword")?;
    let (suite_id, test_id, parent_id) = owner.columns();

    writer.push(Statement::with_params(
        "INSERT INTO keywords(suite_id, test_id, parent_id, name, type, timeout, doc, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        vec![
            suite_id,
            test_id,
            parent_id,
            text(keyword, "name", "keyword")?.into(),
            text(keyword, "type", "keyword")?.into(),
            text(keyword, "timeout", "keyword")?.into(),
            text(keyword, "doc", "keyword")?.into(),
            text(keyword, "status", "keyword")?.into(),
        ],
    ));
    let keyword_row = writer.commit()?;

    let messages = sequence(keyword, "messages", "keyword")?;
    let args = sequence(keyword, "args", "keyword")?;
    if !messages.is_empty() || !args.is_empty() {
        for message in messages {
            push_message(writer, None, Some(keyword_row), message)?;
        }
        for arg in args {
            let arg = object(arg, "arg")?;
            writer.push(Statement::with_params(
                "INSERT INTO args(keyword_id, content) VALUES (?1, ?2)",
                vec![
                    SqlValue::Integer(keyword_row),
                    text(arg, "content", "arg")?.into(),
                ],
            ));
        }
        writer.commit()?;
    }

    for child in sequence(keyword, "keywords", "keyword")? {
        store_keyword(writer, KeywordOwner::Keyword(keyword_row), child)?;
    }

    Ok(keyword_row)
}

fn push_message(
    writer: &mut StagedWriter,
    run_id: Option<i64>,
    keyword_id: Option<i64>,
    message: &Value,
) -> Result<()> {
    let message = object(message, "message")?;
    writer.push(Statement::with_params(
        "INSERT INTO messages(run_id, keyword_id, level, timestamp, content)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
            run_id.map_or(SqlValue::Null, SqlValue::Integer),
            keyword_id.map_or(SqlValue::Null, SqlValue::Integer),
            text(message, "level", "message")?.into(),
            text(message, "timestamp", "message")?.into(),
            text(message, "content", "message")?.into(),
        ],
    ));
    Ok(())
}

fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ReportDbError::mapping(format!("{what} is not a mapping")))
}

fn field<'a>(map: &'a Map<String, Value>, key: &str, what: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| ReportDbError::mapping(format!("{what} lacks key '{key}'")))
}

fn text(map: &Map<String, Value>, key: &str, what: &str) -> Result<String> {
    field(map, key, what)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| ReportDbError::mapping(format!("{what}.{key} is not a string")))
}

fn optional_text(map: &Map<String, Value>, key: &str, what: &str) -> Result<SqlValue> {
    match field(map, key, what)? {
        Value::Null => Ok(SqlValue::Null),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        _ => Err(ReportDbError::mapping(format!(
            "{what}.{key} is neither a string nor null"
        ))),
    }
}

fn integer(map: &Map<String, Value>, key: &str, what: &str) -> Result<i64> {
    field(map, key, what)?
        .as_i64()
        .ok_or_else(|| ReportDbError::mapping(format!("{what}.{key} is not an integer")))
}

fn boolean(map: &Map<String, Value>, key: &str, what: &str) -> Result<bool> {
    field(map, key, what)?
        .as_bool()
        .ok_or_else(|| ReportDbError::mapping(format!("{what}.{key} is not a boolean")))
}

fn sequence<'a>(map: &'a Map<String, Value>, key: &str, what: &str) -> Result<&'a [Value]> {
    field(map, key, what)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ReportDbError::mapping(format!("{what}.{key} is not a sequence")))
}
