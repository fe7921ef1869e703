//! jstest-runner - Run an in-browser JavaScript test suite
//!
//! This library drives a browser through the W3C WebDriver protocol,
//! executes a page's test entry point and reports the suite result.

pub mod cli;
pub mod common;
pub mod testing;
pub mod webdriver;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{SuiteRun, TestResult};
