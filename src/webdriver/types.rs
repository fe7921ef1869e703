//! WebDriver message types
//!
//! These types represent the subset of W3C WebDriver messages the runner uses.
//! See: https://www.w3.org/TR/webdriver2/

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// === Envelopes ===

/// Every WebDriver response wraps its payload in a `value` field
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub value: T,
}

/// Error payload of a failed command
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WebDriverError {
    /// Error code, e.g. `javascript error` or `no such window`
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stacktrace: String,
}

impl fmt::Display for WebDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{}: {}", self.error, self.message)
        }
    }
}

// === Status ===

/// Body of `GET /status`
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

// === Session ===

/// Body of `POST /session`
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRequest {
    pub capabilities: CapabilitiesRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRequest {
    pub always_match: Capabilities,
}

/// Requested session capabilities
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub browser_name: String,
    #[serde(rename = "goog:chromeOptions")]
    pub chrome_options: ChromeOptions,
    #[serde(skip_serializing_if = "SessionTimeouts::is_empty")]
    pub timeouts: SessionTimeouts,
}

/// Vendor options understood by chromedriver
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChromeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Session timeouts in milliseconds
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimeouts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_load: Option<u64>,
}

impl SessionTimeouts {
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.page_load.is_none()
    }
}

/// Body of a successful `POST /session`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: String,
}

// === Commands ===

/// Body of `POST /session/{id}/url`
#[derive(Debug, Clone, Serialize)]
pub struct NavigateRequest {
    pub url: String,
}

/// Body of `POST /session/{id}/execute/sync`
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteScriptRequest {
    pub script: String,
    pub args: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_session_serialization() {
        let request = NewSessionRequest {
            capabilities: CapabilitiesRequest {
                always_match: Capabilities {
                    browser_name: "chrome".to_string(),
                    chrome_options: ChromeOptions {
                        binary: Some("/usr/bin/google-chrome".to_string()),
                        args: vec!["--headless=new".to_string()],
                    },
                    timeouts: SessionTimeouts::default(),
                },
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "capabilities": {
                    "alwaysMatch": {
                        "browserName": "chrome",
                        "goog:chromeOptions": {
                            "binary": "/usr/bin/google-chrome",
                            "args": ["--headless=new"]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_timeouts_serialization() {
        let timeouts = SessionTimeouts {
            script: Some(60_000),
            page_load: None,
        };
        assert_eq!(serde_json::to_value(timeouts).unwrap(), json!({"script": 60000}));
    }

    #[test]
    fn test_new_session_response_ignores_capabilities() {
        let envelope: Envelope<NewSessionResponse> = serde_json::from_value(json!({
            "value": {
                "sessionId": "abc123",
                "capabilities": {"browserName": "chrome", "browserVersion": "126.0"}
            }
        }))
        .unwrap();

        assert_eq!(envelope.value.session_id, "abc123");
    }

    #[test]
    fn test_error_envelope() {
        let envelope: Envelope<WebDriverError> = serde_json::from_value(json!({
            "value": {
                "error": "javascript error",
                "message": "com is not defined",
                "stacktrace": ""
            }
        }))
        .unwrap();

        assert_eq!(envelope.value.to_string(), "javascript error: com is not defined");
    }
}
