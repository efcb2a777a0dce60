//! Typed view of one parsed execution report.
//!
//! The report file itself is JSON produced by the test runner; deserializing
//! it is delegated entirely to serde. Everything downstream (normalization,
//! persistence) depends on these owned structs, never on the wire format.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One parsed report: where it came from, who generated it, aggregate
/// statistics, runner-level error messages, and the root suite tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub source: String,
    pub generator: String,
    pub statistics: Statistics,
    #[serde(default)]
    pub errors: Vec<Message>,
    pub suite: Suite,
}

impl TestRun {
    /// Loads a report from a JSON file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let run = serde_json::from_reader(BufReader::new(file))?;
        Ok(run)
    }
}

/// Aggregate pass/fail counts, computed by the runner. Independent of the
/// suite tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    #[serde(default)]
    pub tags: Vec<TagStat>,
    #[serde(default)]
    pub suites: Vec<SuiteStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalStatistics {
    pub all: TotalStat,
    pub critical: TotalStat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalStat {
    pub name: String,
    /// Elapsed time in milliseconds.
    pub elapsed: i64,
    pub passed: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagStat {
    pub name: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub non_critical: bool,
    pub elapsed: i64,
    pub failed: i64,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub combined: Option<String>,
    pub passed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteStat {
    pub id: String,
    pub name: String,
    pub elapsed: i64,
    pub failed: i64,
    pub passed: i64,
}

/// A suite node. `suites` nests arbitrarily deep.
///
/// `id` is the runner-assigned identifier (e.g. "s1-s2"); it is carried as an
/// opaque string and never parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub suites: Vec<Suite>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub doc: String,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

/// One executed step. `keywords` nests arbitrarily deep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub doc: String,
    pub status: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub level: String,
    pub timestamp: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_deserializes_with_defaults_for_absent_collections() {
        let raw = r#"{
            "source": "output.json",
            "generator": "runner 7.0",
            "statistics": {
                "total": {
                    "all": {"name": "All Tests", "elapsed": 12, "passed": 1, "failed": 0},
                    "critical": {"name": "Critical Tests", "elapsed": 12, "passed": 1, "failed": 0}
                }
            },
            "suite": {
                "name": "Smoke",
                "id": "s1",
                "tests": [
                    {"id": "s1-t1", "name": "Login", "status": "PASS"}
                ]
            }
        }"#;

        let run: TestRun = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(run.generator, "runner 7.0");
        assert!(run.errors.is_empty());
        assert!(run.statistics.tags.is_empty());
        assert_eq!(run.suite.tests[0].name, "Login");
        assert!(run.suite.tests[0].tags.is_empty());
        assert!(run.suite.suites.is_empty());
    }

    #[test]
    fn keyword_type_field_maps_to_kind() {
        let raw = r#"{
            "name": "Open Browser",
            "type": "setup",
            "status": "PASS"
        }"#;

        let keyword: Keyword = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(keyword.kind, "setup");
        assert!(keyword.args.is_empty());
        assert!(keyword.keywords.is_empty());
    }
}
