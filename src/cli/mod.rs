//! Command-line entry point
//!
//! Parses flags, checks the driver is installed, runs the suite and turns
//! the outcome into an exit code.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::common::config::{Config, Overrides, DEFAULT_DRIVER};
use crate::common::{paths, Result};
use crate::testing::{self, report, RunOptions};
use crate::webdriver::ChromeLauncher;

/// Remediation printed when the driver cannot be found
pub const INSTALL_HINT: &str = "Please run `sudo ./install-build-deps.sh`.";

#[derive(Parser, Debug, Default)]
#[command(name = "run-jstests", about = "Run the in-browser JavaScript test suite")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Path to the chromedriver executable (default: chromedriver on PATH)
    #[arg(long, env = "JSTESTS_DRIVER")]
    pub driver: Option<PathBuf>,

    /// Path to the browser binary (default: chosen by the driver)
    #[arg(long, env = "JSTESTS_BROWSER")]
    pub browser: Option<PathBuf>,

    /// Install root the test page is resolved against (default: this executable's directory)
    #[arg(long, env = "JSTESTS_ROOT")]
    pub root: Option<PathBuf>,

    /// Test page relative to the install root (default: war/test.html)
    #[arg(long)]
    pub page: Option<PathBuf>,

    /// Global object whose run() method executes the suite
    #[arg(long, env = "JSTESTS_ENTRY_POINT")]
    pub entry_point: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Leave the browser open if the page fails to load or the suite cannot run
    #[arg(long)]
    pub keep_browser_on_error: bool,

    /// Configuration file (default: <config dir>/jstests/config.toml)
    #[arg(long, env = "JSTESTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log progress and WebDriver traffic to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            browser: self.browser.clone(),
            root: self.root.clone(),
            page: self.page.clone(),
            entry_point: self.entry_point.clone(),
            headless: self.headless,
            keep_browser_on_error: self.keep_browser_on_error,
        }
    }
}

/// Run the suite and report it on stdout
///
/// A missing driver is reported here and yields a failing exit code; every
/// other failure is returned to the caller.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;

    let driver = match config.locate_driver(cli.driver.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("{}", e);
            print_dependency_missing(&mut std::io::stdout().lock())?;
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::debug!("Using driver {}", driver.display());

    let settings = config.resolve(driver, cli.overrides(), &paths::install_dir()?)?;
    if !settings.test_page.exists() {
        tracing::warn!("Test page {} does not exist", settings.test_page.display());
    }

    let options = RunOptions {
        page_url: paths::file_url(&settings.test_page)?.to_string(),
        entry_point: settings.entry_point.clone(),
        keep_browser_on_error: settings.keep_browser_on_error,
    };
    let launcher = ChromeLauncher::new(&settings);

    let run = match testing::run_suite(&launcher, &options).await {
        Ok(run) => run,
        Err(e) => {
            if options.keep_browser_on_error && e.is_session_step() {
                eprintln!("Browser left running for inspection.");
            }
            return Err(e);
        }
    };

    report::write_report(&mut std::io::stdout().lock(), &run)?;

    Ok(if run.result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print the two-line missing driver diagnostic
pub fn print_dependency_missing<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "ERROR:")?;
    writeln!(out, "Couldn't find {}. {}", DEFAULT_DRIVER, INSTALL_HINT)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "run-jstests",
            "--driver",
            "/opt/chromedriver",
            "--entry-point",
            "my.Suite",
            "--headless",
            "--keep-browser-on-error",
        ])
        .unwrap();

        assert_eq!(cli.driver, Some(PathBuf::from("/opt/chromedriver")));

        let overrides = cli.overrides();
        assert_eq!(overrides.entry_point.as_deref(), Some("my.Suite"));
        assert!(overrides.headless);
        assert!(overrides.keep_browser_on_error);
        assert!(overrides.root.is_none());
    }

    #[test]
    fn test_dependency_missing_message() {
        let mut out = Vec::new();
        print_dependency_missing(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ERROR:\nCouldn't find chromedriver. Please run `sudo ./install-build-deps.sh`.\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_without_driver_fails() {
        let cli = Cli {
            driver: Some(PathBuf::from("/no/such/chromedriver")),
            config: Some(PathBuf::from("/dev/null")),
            ..Default::default()
        };

        let code = run(cli).await.unwrap();
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::FAILURE));
    }
}
