//! In-browser test suite execution
//!
//! Runs the page's JavaScript test entry point through a browser session
//! and turns its result into a console report.

pub mod report;
mod result;
mod runner;

pub use result::{SuiteRun, TestResult};
pub use runner::{entry_script, run_suite, RunOptions};
