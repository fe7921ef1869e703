//! The suite result returned by the in-page test entry point
//!
//! The value crosses the WebDriver boundary as untyped JSON; it is
//! validated here once and read as a fixed-field record afterwards.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::common::{Error, Result};

/// Aggregate result of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Captured test output
    pub log: String,
    /// Number of tests attempted
    #[serde(deserialize_with = "count")]
    pub num_tests: u64,
    /// Number of failing tests
    #[serde(deserialize_with = "count")]
    pub failed: u64,
    /// Number of skipped tests
    #[serde(deserialize_with = "count")]
    pub skipped: u64,
    /// Whether the suite as a whole passed
    pub success: bool,
}

impl TestResult {
    /// Validate a value returned by the entry point
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::malformed(format!(
                "expected an object, got {}",
                kind_of(&value)
            )));
        }

        let result: TestResult = serde_json::from_value(value).map_err(Error::malformed)?;

        if result.failed > result.num_tests {
            return Err(Error::malformed(format!(
                "failed ({}) exceeds numTests ({})",
                result.failed, result.num_tests
            )));
        }
        if result.skipped > result.num_tests {
            return Err(Error::malformed(format!(
                "skipped ({}) exceeds numTests ({})",
                result.skipped, result.num_tests
            )));
        }

        Ok(result)
    }
}

/// A validated result together with how long the run took
#[derive(Debug, Clone)]
pub struct SuiteRun {
    pub result: TestResult,
    /// From just before session start to just after teardown
    pub elapsed: Duration,
}

/// Accept non-negative integers, including integral doubles such as `3.0`
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    use serde::de::Error as _;

    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(D::Error::custom(format!(
            "expected a non-negative integer count, got {}",
            number
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
