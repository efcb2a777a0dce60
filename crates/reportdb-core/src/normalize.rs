//! Tree normalization: lossless conversion of the typed report tree into a
//! plain nested mapping/sequence value (`serde_json::Value`).
//!
//! Every function here is pure. The output is a fully owned snapshot with no
//! references back into the source tree, every attribute of an entity is
//! always present as a key (empty string / empty sequence included), and all
//! sequences preserve the source iteration order.

use serde_json::{Value, json};

use crate::models::{
    Keyword, Message, Statistics, Suite, SuiteStat, TagStat, Test, TestRun, TotalStat,
};

/// Root conversion: source path, generator, statistics, runner-level
/// messages, and the root suite with its entire descendant tree.
pub fn run(run: &TestRun) -> Value {
    json!({
        "source_file": run.source,
        "generator": run.generator,
        "statistics": statistics(&run.statistics),
        "messages": messages(&run.errors),
        "suites": [suite(&run.suite)],
    })
}

pub fn statistics(statistics: &Statistics) -> Value {
    json!({
        "total": {
            "all": total_stat(&statistics.total.all),
            "critical": total_stat(&statistics.total.critical),
        },
        "tag": statistics.tags.iter().map(tag_stat).collect::<Vec<_>>(),
        "suite": statistics.suites.iter().map(suite_stat).collect::<Vec<_>>(),
    })
}

pub fn total_stat(stat: &TotalStat) -> Value {
    json!({
        "name": stat.name,
        "elapsed": stat.elapsed,
        "passed": stat.passed,
        "failed": stat.failed,
    })
}

pub fn tag_stat(stat: &TagStat) -> Value {
    json!({
        "name": stat.name,
        "links": stat.links,
        "doc": stat.doc,
        "non_critical": stat.non_critical,
        "elapsed": stat.elapsed,
        "failed": stat.failed,
        "critical": stat.critical,
        "combined": stat.combined,
        "passed": stat.passed,
    })
}

pub fn suite_stat(stat: &SuiteStat) -> Value {
    json!({
        "id": stat.id,
        "name": stat.name,
        "elapsed": stat.elapsed,
        "failed": stat.failed,
        "passed": stat.passed,
    })
}

/// Recurses into child suites; terminates on an empty `suites` vector, which
/// is emitted as `[]`, never omitted.
pub fn suite(suite_node: &Suite) -> Value {
    json!({
        "name": suite_node.name,
        "id": suite_node.id,
        "source": suite_node.source,
        "doc": suite_node.doc,
        "start_time": suite_node.start_time,
        "end_time": suite_node.end_time,
        "keywords": keywords(&suite_node.keywords),
        "tests": suite_node.tests.iter().map(test).collect::<Vec<_>>(),
        "suites": suite_node.suites.iter().map(suite).collect::<Vec<_>>(),
    })
}

pub fn test(test_node: &Test) -> Value {
    json!({
        "id": test_node.id,
        "name": test_node.name,
        "timeout": test_node.timeout,
        "doc": test_node.doc,
        "status": test_node.status,
        "tags": test_node.tags.iter().map(|t| tag(t)).collect::<Vec<_>>(),
        "keywords": keywords(&test_node.keywords),
    })
}

/// Recurses into nested keywords; depth is unbounded.
pub fn keyword(keyword_node: &Keyword) -> Value {
    json!({
        "name": keyword_node.name,
        "type": keyword_node.kind,
        "timeout": keyword_node.timeout,
        "doc": keyword_node.doc,
        "status": keyword_node.status,
        "messages": messages(&keyword_node.messages),
        "args": keyword_node.args.iter().map(|a| arg(a)).collect::<Vec<_>>(),
        "keywords": keywords(&keyword_node.keywords),
    })
}

pub fn message(message_node: &Message) -> Value {
    json!({
        "level": message_node.level,
        "timestamp": message_node.timestamp,
        "content": message_node.content,
    })
}

pub fn tag(content: &str) -> Value {
    json!({ "content": content })
}

pub fn arg(content: &str) -> Value {
    json!({ "content": content })
}

fn keywords(nodes: &[Keyword]) -> Vec<Value> {
    nodes.iter().map(keyword).collect()
}

fn messages(nodes: &[Message]) -> Vec<Value> {
    nodes.iter().map(message).collect()
}
