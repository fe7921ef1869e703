//! WebDriver implementation
//!
//! This module implements the client side of the W3C WebDriver protocol
//! for driving a browser through chromedriver.

pub mod client;
pub mod driver;
pub mod session;
pub mod types;

pub use client::WebDriverClient;
pub use session::{BrowserSession, ChromeLauncher, Launcher};
