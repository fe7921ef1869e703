//! Configuration file handling
//!
//! Settings come from, in order of precedence: command-line flags (which
//! also read their `JSTESTS_*` environment variables), the config file,
//! and built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::{self, config_path};
use super::{Error, Result};

/// Driver executable looked up on PATH when no explicit path is given
pub const DEFAULT_DRIVER: &str = "chromedriver";

/// Global object whose `run()` method executes the in-page suite
pub const DEFAULT_ENTRY_POINT: &str = "com.dom_distiller.client.JsTestEntry";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Browser driver settings
    #[serde(default)]
    pub driver: DriverConfig,

    /// Browser settings passed through the driver
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Test suite location
    #[serde(default)]
    pub suite: SuiteConfig,

    /// WebDriver session timeouts
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Configuration for the driver executable
#[derive(Debug, Deserialize, Clone)]
pub struct DriverConfig {
    /// Path to the driver executable (default: `chromedriver` on PATH)
    pub path: Option<PathBuf>,

    /// Additional arguments to pass to the driver
    #[serde(default)]
    pub args: Vec<String>,

    /// Port for the driver to listen on, 0 picks a free one
    #[serde(default)]
    pub port: u16,

    /// How long to wait for the driver to report ready
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            port: 0,
            startup_timeout_secs: default_startup_timeout(),
        }
    }
}

fn default_startup_timeout() -> u64 {
    10
}

/// Browser settings
///
/// With no `binary` the driver uses its platform default
/// (`/usr/bin/google-chrome` on Linux).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BrowserConfig {
    /// Path to the browser binary
    pub binary: Option<PathBuf>,

    /// Run without a visible window
    #[serde(default)]
    pub headless: bool,

    /// Extra browser command-line arguments
    #[serde(default)]
    pub args: Vec<String>,
}

/// Test suite location and entry point
#[derive(Debug, Deserialize, Clone)]
pub struct SuiteConfig {
    /// Install root the page is resolved against (default: executable's directory)
    pub root: Option<PathBuf>,

    /// Test page, relative to the root
    #[serde(default = "default_page")]
    pub page: PathBuf,

    /// Dotted path of the global test-entry object
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            root: None,
            page: default_page(),
            entry_point: default_entry_point(),
        }
    }
}

fn default_page() -> PathBuf {
    PathBuf::from(paths::DEFAULT_TEST_PAGE)
}

fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.to_string()
}

/// Session timeouts in seconds, unset means the driver's default
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    /// Script execution timeout
    pub script_secs: Option<u64>,

    /// Page load timeout
    pub page_load_secs: Option<u64>,
}

/// Values given on the command line or through the environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub browser: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub page: Option<PathBuf>,
    pub entry_point: Option<String>,
    pub headless: bool,
    pub keep_browser_on_error: bool,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub driver: DriverSettings,
    pub browser: BrowserConfig,
    /// Absolute path of the test page
    pub test_page: PathBuf,
    pub entry_point: String,
    pub timeouts: Timeouts,
    pub keep_browser_on_error: bool,
}

/// Resolved driver settings
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub port: u16,
    pub startup_timeout: Duration,
}

impl Config {
    /// Load configuration from an explicit file, or the default config file
    ///
    /// Returns default configuration if the default file doesn't exist.
    /// An explicit file that doesn't exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Locate the driver executable
    ///
    /// An explicitly configured path must exist; otherwise the default
    /// driver is searched for on PATH.
    pub fn locate_driver(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit.or(self.driver.path.as_deref()) {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(Error::dependency_missing(
                DEFAULT_DRIVER,
                &[path.display().to_string()],
            ));
        }

        which::which(DEFAULT_DRIVER).map_err(|_| Error::dependency_missing(DEFAULT_DRIVER, &["PATH"]))
    }

    /// Merge overrides into this configuration and resolve all paths
    ///
    /// `install_dir` is the root used when neither the overrides nor the
    /// file name one.
    pub fn resolve(
        self,
        driver_path: PathBuf,
        overrides: Overrides,
        install_dir: &Path,
    ) -> Result<Settings> {
        let root = overrides
            .root
            .or(self.suite.root)
            .unwrap_or_else(|| install_dir.to_path_buf());
        let page = overrides.page.unwrap_or(self.suite.page);
        let test_page = paths::resolve_test_page(&root, &page)?;

        let entry_point = overrides.entry_point.unwrap_or(self.suite.entry_point);
        validate_entry_point(&entry_point)?;

        let mut browser = self.browser;
        if overrides.browser.is_some() {
            browser.binary = overrides.browser;
        }
        browser.headless |= overrides.headless;

        Ok(Settings {
            driver: DriverSettings {
                path: driver_path,
                args: self.driver.args,
                port: self.driver.port,
                startup_timeout: Duration::from_secs(self.driver.startup_timeout_secs),
            },
            browser,
            test_page,
            entry_point,
            timeouts: self.timeouts,
            keep_browser_on_error: overrides.keep_browser_on_error,
        })
    }
}

/// Check that an entry point is a dotted JavaScript identifier path
///
/// The entry point is spliced into the executed script, so anything else
/// is refused.
pub fn validate_entry_point(entry_point: &str) -> Result<()> {
    let valid = !entry_point.is_empty()
        && entry_point.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
                }
                _ => false,
            }
        });

    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid entry point '{}': expected a dotted JavaScript identifier path",
            entry_point
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.driver.path.is_none());
        assert_eq!(config.driver.port, 0);
        assert_eq!(config.driver.startup_timeout_secs, 10);
        assert_eq!(config.suite.page, PathBuf::from("war/test.html"));
        assert_eq!(config.suite.entry_point, DEFAULT_ENTRY_POINT);
        assert_eq!(config.timeouts, Timeouts::default());
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::parse(
            r#"
[driver]
path = "/opt/chromedriver"
args = ["--verbose"]
port = 9515
startup_timeout_secs = 3

[browser]
binary = "/usr/bin/chromium"
headless = true
args = ["--no-sandbox"]

[suite]
root = "/srv/distiller"
page = "out/test.html"
entry_point = "my.Suite"

[timeouts]
script_secs = 60
"#,
        )
        .unwrap();

        assert_eq!(config.driver.path, Some(PathBuf::from("/opt/chromedriver")));
        assert_eq!(config.driver.args, vec!["--verbose"]);
        assert_eq!(config.driver.port, 9515);
        assert_eq!(config.browser.binary, Some(PathBuf::from("/usr/bin/chromium")));
        assert!(config.browser.headless);
        assert_eq!(config.suite.root, Some(PathBuf::from("/srv/distiller")));
        assert_eq!(config.suite.entry_point, "my.Suite");
        assert_eq!(config.timeouts.script_secs, Some(60));
        assert_eq!(config.timeouts.page_load_secs, None);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse("[driver]\nport = \"nope\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let err = Config::load(Some(Path::new("/no/such/config.toml"))).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_locate_missing_explicit_driver() {
        let config = Config::default();
        let err = config
            .locate_driver(Some(Path::new("/no/such/chromedriver")))
            .unwrap_err();
        match err {
            Error::DependencyMissing { name, searched } => {
                assert_eq!(name, "chromedriver");
                assert_eq!(searched, "/no/such/chromedriver");
            }
            other => panic!("Expected DependencyMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_locate_explicit_driver() {
        let dir = tempfile::tempdir().unwrap();
        let driver = dir.path().join("chromedriver");
        std::fs::write(&driver, "").unwrap();

        let config = Config::default();
        assert_eq!(config.locate_driver(Some(driver.as_path())).unwrap(), driver);
    }

    #[test]
    fn test_resolve_precedence() {
        let config = Config::parse(
            r#"
[browser]
binary = "/from/config/chrome"

[suite]
root = "/from/config"
entry_point = "config.Entry"
"#,
        )
        .unwrap();

        let overrides = Overrides {
            root: Some(PathBuf::from("/from/flag")),
            entry_point: Some("flag.Entry".to_string()),
            headless: true,
            ..Default::default()
        };

        let settings = config
            .resolve(PathBuf::from("/bin/chromedriver"), overrides, Path::new("/install"))
            .unwrap();

        assert_eq!(settings.test_page, PathBuf::from("/from/flag/war/test.html"));
        assert_eq!(settings.entry_point, "flag.Entry");
        assert_eq!(settings.browser.binary, Some(PathBuf::from("/from/config/chrome")));
        assert!(settings.browser.headless);
        assert_eq!(settings.driver.startup_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_resolve_defaults_to_install_dir() {
        let settings = Config::default()
            .resolve(
                PathBuf::from("/bin/chromedriver"),
                Overrides::default(),
                Path::new("/opt/jstests/bin"),
            )
            .unwrap();

        assert_eq!(
            settings.test_page,
            PathBuf::from("/opt/jstests/bin/war/test.html")
        );
        assert_eq!(settings.entry_point, DEFAULT_ENTRY_POINT);
        assert!(!settings.keep_browser_on_error);
    }

    #[test]
    fn test_validate_entry_point() {
        assert!(validate_entry_point("com.dom_distiller.client.JsTestEntry").is_ok());
        assert!(validate_entry_point("$suite._runner2").is_ok());
        assert!(validate_entry_point("").is_err());
        assert!(validate_entry_point("a..b").is_err());
        assert!(validate_entry_point("1abc").is_err());
        assert!(validate_entry_point("a.run(); evil()").is_err());
    }
}
