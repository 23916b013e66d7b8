//! # presence-adapter-http-ureq
//!
//! HTTP transport adapter — implements the `ActionTransport` port with ureq.
//!
//! Each action is sent as `POST {url}{action}` with a JSON body and an
//! `Authorization: Bearer {api_key}` header. Any 2xx answer is a success;
//! everything else (status, connection, timeout) is a failure. ureq is
//! blocking, so requests run on tokio's blocking pool.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `presence-app` and `presence-domain`.

mod config;
mod error;

pub use config::ApiConfig;
pub use error::HttpError;

use presence_app::ports::ActionTransport;
use presence_domain::error::PresenceError;

/// Upstream API client.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
}

impl UreqTransport {
    /// Create a transport with its own agent, honouring proxy environment
    /// variables.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.request_timeout()))
            .build()
            .into();
        Self::with_agent(agent, config)
    }

    /// Create a transport over an existing agent.
    #[must_use]
    pub fn with_agent(agent: ureq::Agent, config: &ApiConfig) -> Self {
        Self {
            agent,
            base_url: config.url.clone(),
            authorization: format!("Bearer {}", config.api_key),
        }
    }

    /// Full URL of an API method: the base URL with `endpoint` appended verbatim.
    #[must_use]
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }
}

impl ActionTransport for UreqTransport {
    async fn post(&self, endpoint: &str, payload: &serde_json::Value) -> Result<(), PresenceError> {
        let agent = self.agent.clone();
        let url = self.url_for(endpoint);
        let authorization = self.authorization.clone();
        let body = payload.clone();

        tracing::debug!(%url, "sending request");
        tokio::task::spawn_blocking(move || send(&agent, &url, &authorization, &body))
            .await
            .map_err(HttpError::from)??;
        Ok(())
    }
}

fn send(
    agent: &ureq::Agent,
    url: &str,
    authorization: &str,
    body: &serde_json::Value,
) -> Result<(), HttpError> {
    let response = agent
        .post(url)
        .header("Authorization", authorization)
        .send_json(body)?;

    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status(status.as_u16()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;
    use std::time::Duration;

    fn test_config(url: String) -> ApiConfig {
        ApiConfig {
            url,
            api_key: "xoxp-test".to_string(),
            request_timeout_secs: 5,
        }
    }

    fn transport(url: String) -> UreqTransport {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(5)))
            .proxy(None)
            .build()
            .into();
        UreqTransport::with_agent(agent, &test_config(url))
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Read one HTTP request (head and body) from `stream`.
    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = find(&buf, b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            if head.contains("transfer-encoding: chunked") {
                if buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
                continue;
            }
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve a single request with `status_line`, returning the base URL and
    /// a handle yielding the raw request.
    fn serve_once(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{{\"ok\":true}}"
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (format!("http://{addr}/api/"), handle)
    }

    #[test]
    fn should_append_endpoint_to_base_url() {
        let transport = transport("https://slack.com/api/".to_string());
        assert_eq!(
            transport.url_for("chat.postMessage"),
            "https://slack.com/api/chat.postMessage"
        );
    }

    #[tokio::test]
    async fn should_post_json_with_bearer_token() {
        let (url, server) = serve_once("200 OK");
        let payload =
            serde_json::json!({"channel": "#team", "as_user": true, "text": "Back :wave:"});

        transport(url)
            .post("chat.postMessage", &payload)
            .await
            .unwrap();

        let request = server.join().unwrap();
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("POST /api/chat.postMessage HTTP/1.1"));
        let head = head.to_ascii_lowercase();
        assert!(head.contains("authorization: bearer xoxp-test"));
        assert!(head.contains("content-type: application/json"));
        let sent: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(sent, payload);
    }

    #[tokio::test]
    async fn should_fail_on_server_error() {
        let (url, server) = serve_once("500 Internal Server Error");

        let result = transport(url)
            .post("users.profile.set", &serde_json::json!({}))
            .await;

        server.join().unwrap();
        assert!(matches!(result, Err(PresenceError::Transport(_))));
    }

    #[tokio::test]
    async fn should_fail_when_connection_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let result = transport(format!("http://{addr}/api/"))
            .post("chat.postMessage", &serde_json::json!({}))
            .await;

        assert!(matches!(result, Err(PresenceError::Transport(_))));
    }
}
