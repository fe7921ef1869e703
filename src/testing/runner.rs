//! Suite runner
//!
//! One forward pass: start a session, load the page, call the entry point,
//! close the session. Once a session exists it is closed on every exit path.

use std::time::Instant;

use crate::common::Result;
use crate::webdriver::{BrowserSession, Launcher};

use super::result::{SuiteRun, TestResult};

/// What to run and how to treat the browser afterwards
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// `file://` URL of the test page
    pub page_url: String,
    /// Dotted path of the global test-entry object
    pub entry_point: String,
    /// Leave the browser open when loading or running the suite fails
    pub keep_browser_on_error: bool,
}

/// Script that runs the suite through its entry point
pub fn entry_script(entry_point: &str) -> String {
    format!("return {}.run()", entry_point)
}

/// Run the suite once
pub async fn run_suite(launcher: &dyn Launcher, options: &RunOptions) -> Result<SuiteRun> {
    let start = Instant::now();

    let mut session = launcher.launch().await?;
    let outcome = drive(
        session.as_mut(),
        &options.page_url,
        &entry_script(&options.entry_point),
    )
    .await;

    match &outcome {
        Err(e) if options.keep_browser_on_error && e.is_session_step() => {
            tracing::warn!("Leaving browser running after error: {}", e);
            session.detach();
        }
        _ => {
            if let Err(e) = session.quit().await {
                tracing::warn!("{}", e);
            }
        }
    }

    let elapsed = start.elapsed();
    outcome.map(|result| SuiteRun { result, elapsed })
}

async fn drive(session: &mut dyn BrowserSession, page_url: &str, script: &str) -> Result<TestResult> {
    tracing::info!("Loading {}", page_url);
    session.navigate(page_url).await?;

    tracing::info!("Executing `{}`", script);
    let value = session.execute_script(script).await?;

    TestResult::from_value(value)
}
