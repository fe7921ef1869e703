//! Browser sessions
//!
//! `Launcher` and `BrowserSession` are the seam between the runner and the
//! automation layer. The ChromeDriver implementation owns both the driver
//! process and the WebDriver session opened through it.

use async_trait::async_trait;
use serde_json::Value;

use crate::common::config::{BrowserConfig, DriverSettings, Settings, Timeouts};
use crate::common::Result;

use super::client::WebDriverClient;
use super::driver::DriverProcess;
use super::types::{Capabilities, ChromeOptions, SessionTimeouts};

/// Chrome flag selecting the headless mode
const HEADLESS_ARG: &str = "--headless=new";

/// WebDriver timeouts are integers no larger than 2^53 - 1 milliseconds
const MAX_TIMEOUT_MS: u64 = (1 << 53) - 1;

/// One browser instance with one page
#[async_trait]
pub trait BrowserSession: Send {
    /// Load a URL and wait for it to finish loading
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Run a script in the page's global context and return its value
    async fn execute_script(&mut self, script: &str) -> Result<Value>;

    /// Close the browser and release every resource the session holds
    async fn quit(&mut self) -> Result<()>;

    /// Give up ownership, leaving the browser running
    fn detach(&mut self);
}

/// Starts browser sessions
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// Launches Chrome through a chromedriver process
pub struct ChromeLauncher {
    driver: DriverSettings,
    browser: BrowserConfig,
    timeouts: Timeouts,
}

impl ChromeLauncher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            driver: settings.driver.clone(),
            browser: settings.browser.clone(),
            timeouts: settings.timeouts,
        }
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let mut driver = DriverProcess::spawn(&self.driver).await?;
        let mut client = WebDriverClient::new(driver.endpoint())?;

        let started = async {
            driver
                .wait_ready(&client, self.driver.startup_timeout)
                .await?;
            client
                .new_session(capabilities(&self.browser, &self.timeouts))
                .await
        }
        .await;

        if let Err(e) = started {
            if let Err(kill_err) = driver.terminate().await {
                tracing::warn!("Failed to stop driver after startup error: {}", kill_err);
            }
            return Err(e);
        }

        Ok(Box::new(ChromeSession { client, driver }))
    }
}

/// Build the capabilities requested for a new session
pub fn capabilities(browser: &BrowserConfig, timeouts: &Timeouts) -> Capabilities {
    let mut args = browser.args.clone();
    if browser.headless && !args.iter().any(|a| a.starts_with("--headless")) {
        args.push(HEADLESS_ARG.to_string());
    }

    Capabilities {
        browser_name: "chrome".to_string(),
        chrome_options: ChromeOptions {
            binary: browser
                .binary
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            args,
        },
        timeouts: SessionTimeouts {
            script: timeouts.script_secs.map(secs_to_millis),
            page_load: timeouts.page_load_secs.map(secs_to_millis),
        },
    }
}

/// Convert a configured timeout, clamped to the largest one WebDriver accepts
fn secs_to_millis(secs: u64) -> u64 {
    secs.saturating_mul(1000).min(MAX_TIMEOUT_MS)
}

/// A Chrome session driven through chromedriver
pub struct ChromeSession {
    client: WebDriverClient,
    driver: DriverProcess,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.client.navigate(url).await
    }

    async fn execute_script(&mut self, script: &str) -> Result<Value> {
        self.client.execute_sync(script, Vec::new()).await
    }

    async fn quit(&mut self) -> Result<()> {
        // Stop the driver even when the session could not be deleted
        let deleted = self.client.delete_session().await;
        self.driver.terminate().await?;
        deleted
    }

    fn detach(&mut self) {
        if let Some(id) = self.client.session_id() {
            tracing::info!(
                "Leaving session {} open at {}",
                id,
                self.client.base()
            );
        }
        self.driver.detach();
    }
}
