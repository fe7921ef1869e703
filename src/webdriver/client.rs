//! WebDriver client for communicating with a browser driver
//!
//! Speaks the W3C WebDriver HTTP protocol. Every command maps its failure
//! onto the error kind of the runner step it belongs to.

use std::fmt;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::common::{Error, Result};

use super::types::*;

/// Failure of a single WebDriver command, before it is mapped to a step
#[derive(Debug)]
pub enum CommandError {
    /// The request never produced a response
    Transport(reqwest::Error),
    /// The driver answered with a WebDriver error payload
    Remote(WebDriverError),
    /// The driver answered with something that is not a WebDriver message
    Protocol { status: StatusCode, detail: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{}", e),
            Self::Remote(e) => write!(f, "{}", e),
            Self::Protocol { status, detail } => write!(f, "HTTP {}: {}", status, detail),
        }
    }
}

/// WebDriver client bound to one driver endpoint
pub struct WebDriverClient {
    http: reqwest::Client,
    /// Endpoint root, e.g. `http://127.0.0.1:9515`
    base: String,
    /// Session id (populated after `new_session`)
    session_id: Option<String>,
}

impl WebDriverClient {
    /// Create a client for a driver listening at `base`
    ///
    /// The driver is always local, so proxy settings from the environment
    /// are ignored.
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| Error::SessionStartFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            session_id: None,
        })
    }

    /// Endpoint root this client talks to
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Current session id, if a session is open
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Send a command and unwrap its `value`
    async fn command<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<Value, CommandError> {
        let url = format!("{}{}", self.base, path);
        let mut request = self.http.request(method.clone(), &url);

        if let Some(body) = body {
            let json = serde_json::to_string(body).map_err(|e| CommandError::Protocol {
                status: StatusCode::BAD_REQUEST,
                detail: format!("Failed to encode request: {}", e),
            })?;
            tracing::debug!("WebDriver >>> {} {} {}", method, path, json);
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(json);
        } else {
            tracing::debug!("WebDriver >>> {} {}", method, path);
        }

        let response = request.send().await.map_err(CommandError::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(CommandError::Transport)?;
        tracing::debug!("WebDriver <<< {} ({} bytes)", status, text.len());

        if status.is_success() {
            let envelope: Envelope<Value> =
                serde_json::from_str(&text).map_err(|e| CommandError::Protocol {
                    status,
                    detail: format!("Invalid JSON: {}", e),
                })?;
            return Ok(envelope.value);
        }

        match serde_json::from_str::<Envelope<WebDriverError>>(&text) {
            Ok(envelope) => Err(CommandError::Remote(envelope.value)),
            Err(_) => Err(CommandError::Protocol {
                status,
                detail: text,
            }),
        }
    }

    fn session_path(&self, suffix: &str) -> std::result::Result<String, String> {
        self.session_id
            .as_ref()
            .map(|id| format!("/session/{}{}", id, suffix))
            .ok_or_else(|| "No session open".to_string())
    }

    /// Query driver readiness
    ///
    /// Transport errors are returned as-is so callers can keep polling
    /// while the driver is still binding its port.
    pub async fn status(&self) -> std::result::Result<Status, CommandError> {
        let value = self.command::<Value>(Method::GET, "/status", None).await?;
        serde_json::from_value(value).map_err(|e| CommandError::Protocol {
            status: StatusCode::OK,
            detail: format!("Failed to parse status: {}", e),
        })
    }

    /// Open a new browser session
    pub async fn new_session(&mut self, capabilities: Capabilities) -> Result<NewSessionResponse> {
        let request = NewSessionRequest {
            capabilities: CapabilitiesRequest {
                always_match: capabilities,
            },
        };

        let value = self
            .command(Method::POST, "/session", Some(&request))
            .await
            .map_err(|e| Error::SessionStartFailed(e.to_string()))?;

        let response: NewSessionResponse = serde_json::from_value(value).map_err(|e| {
            Error::SessionStartFailed(format!("Failed to parse new session response: {}", e))
        })?;

        tracing::info!("Opened WebDriver session {}", response.session_id);
        self.session_id = Some(response.session_id.clone());
        Ok(response)
    }

    /// Navigate the session to a URL, returning once the page has loaded
    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        let path = self.session_path("/url").map_err(Error::NavigationFailed)?;
        let request = NavigateRequest {
            url: url.to_string(),
        };

        self.command(Method::POST, &path, Some(&request))
            .await
            .map_err(|e| Error::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    /// Execute a synchronous script in the page and return its value
    pub async fn execute_sync(&mut self, script: &str, args: Vec<Value>) -> Result<Value> {
        let path = self
            .session_path("/execute/sync")
            .map_err(Error::ScriptExecutionFailed)?;
        let request = ExecuteScriptRequest {
            script: script.to_string(),
            args,
        };

        self.command(Method::POST, &path, Some(&request))
            .await
            .map_err(|e| Error::ScriptExecutionFailed(e.to_string()))
    }

    /// Close the session, closing every window it owns
    ///
    /// Does nothing when no session is open.
    pub async fn delete_session(&mut self) -> Result<()> {
        let Ok(path) = self.session_path("") else {
            return Ok(());
        };

        // The session is gone from our side whatever the driver answers
        let id = self.session_id.take();

        self.command::<Value>(Method::DELETE, &path, None)
            .await
            .map_err(|e| Error::TeardownFailed(e.to_string()))?;

        tracing::info!("Closed WebDriver session {}", id.unwrap_or_default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_trailing_slash_is_trimmed() {
        let client = WebDriverClient::new("http://127.0.0.1:9515/").unwrap();
        assert_eq!(client.base(), "http://127.0.0.1:9515");
        assert!(client.session_id().is_none());
    }

    #[tokio::test]
    async fn test_commands_require_session() {
        let mut client = WebDriverClient::new("http://127.0.0.1:1").unwrap();

        let err = client.navigate("file:///tmp/test.html").await.unwrap_err();
        assert!(matches!(err, Error::NavigationFailed(_)));

        let err = client.execute_sync("return 1", Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::ScriptExecutionFailed(_)));

        assert!(client.delete_session().await.is_ok());
    }

    #[test]
    fn test_command_error_display() {
        let err = CommandError::Remote(WebDriverError {
            error: "no such window".to_string(),
            message: String::new(),
            stacktrace: String::new(),
        });
        assert_eq!(err.to_string(), "no such window");

        let err = CommandError::Protocol {
            status: StatusCode::NOT_FOUND,
            detail: "unknown command".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 Not Found: unknown command");
    }
}
