use std::thread;
use std::time::Duration;

use serde_json::Value;

/// Longest response body echoed back in an error message.
const ERROR_BODY_CHARS: usize = 240;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) attempts: usize,
    pub(crate) retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(6),
            attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

enum AttemptError {
    Retryable(String),
    Fatal(String),
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// POSTs `body` as JSON, retrying timeouts, throttling and server errors.
pub(crate) fn post_json_with_retries(
    url: &str,
    body: &Value,
    policy: RetryPolicy,
) -> Result<String, String> {
    let attempts = policy.attempts.max(1);
    let payload = body.to_string();
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(policy.connect_timeout)
        .timeout_read(policy.read_timeout)
        .timeout_write(policy.read_timeout)
        .build();

    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match post_once(&agent, url, &payload) {
            Ok(response) => return Ok(response),
            Err(AttemptError::Fatal(err)) => return Err(format!("request failed: {err}")),
            Err(AttemptError::Retryable(err)) => {
                tracing::debug!(url, attempt, error = %err, "post attempt failed");
                last_error = err;
                if attempt < attempts {
                    thread::sleep(policy.retry_delay);
                }
            }
        }
    }

    Err(format!(
        "request failed after {attempts} attempt(s): {last_error}"
    ))
}

fn post_once(agent: &ureq::Agent, url: &str, payload: &str) -> Result<String, AttemptError> {
    let result = agent
        .post(url)
        .set("Content-Type", "application/json")
        .set("Accept", "application/json")
        .send_string(payload);

    match result {
        Ok(response) => response
            .into_string()
            .map_err(|err| AttemptError::Fatal(format!("response decode failed: {err}"))),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            let body = body.trim();
            let message = if body.is_empty() {
                format!("HTTP status {status}")
            } else {
                let excerpt: String = body.chars().take(ERROR_BODY_CHARS).collect();
                format!("HTTP status {status} ({excerpt})")
            };
            if is_retryable_status(status) {
                Err(AttemptError::Retryable(message))
            } else {
                Err(AttemptError::Fatal(message))
            }
        }
        Err(ureq::Error::Transport(err)) => {
            Err(AttemptError::Retryable(format!("transport error: {err}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};

    struct Reply {
        status: u16,
        body: &'static str,
        delay: Duration,
    }

    fn reply(status: u16, body: &'static str) -> Reply {
        Reply {
            status,
            body,
            delay: Duration::ZERO,
        }
    }

    /// Serves one scripted reply per connection, then stops accepting.
    struct ScriptedServer {
        base_url: String,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedServer {
        fn start(script: Vec<Reply>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
            let seen = Arc::new(Mutex::new(Vec::new()));
            let log = Arc::clone(&seen);

            thread::spawn(move || {
                for step in script {
                    let Ok((stream, _)) = listener.accept() else {
                        return;
                    };
                    let log = Arc::clone(&log);
                    // A delayed reply must not hold up the next accept.
                    thread::spawn(move || answer(stream, step, &log));
                }
            });

            Self { base_url, seen }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().expect("lock seen requests").clone()
        }
    }

    fn answer(stream: TcpStream, step: Reply, log: &Mutex<Vec<String>>) {
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().unwrap_or(0);
            }
            let done = line == "\r\n";
            head.push_str(&line);
            if done {
                break;
            }
        }
        let mut body = vec![0_u8; content_length];
        if reader.read_exact(&mut body).is_err() {
            return;
        }
        head.push_str(&String::from_utf8_lossy(&body));
        log.lock().expect("lock seen requests").push(head);

        thread::sleep(step.delay);
        let mut stream = reader.into_inner();
        let _ = write!(
            stream,
            "HTTP/1.1 {} Scripted\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            step.status,
            step.body.len(),
            step.body
        );
        let _ = stream.flush();
    }

    fn policy(read_timeout: Duration, attempts: usize) -> RetryPolicy {
        RetryPolicy {
            connect_timeout: Duration::from_millis(200),
            read_timeout,
            attempts,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn posts_json_body() {
        let server = ScriptedServer::start(vec![reply(200, "{}")]);
        let body = json!({ "approvalRequestedMsg": "watched" });

        let result = post_json_with_retries(
            &format!("{}/api/projects/p1/skills/s1", server.base_url),
            &body,
            policy(Duration::from_millis(500), 1),
        );

        assert_eq!(result.expect("post should succeed"), "{}");
        let seen = server.seen();
        assert_eq!(seen.len(), 1);
        assert!(
            seen[0].starts_with("POST /api/projects/p1/skills/s1 "),
            "unexpected request line: {}",
            seen[0]
        );
        assert!(
            seen[0].contains("\"approvalRequestedMsg\":\"watched\""),
            "body missing from request: {}",
            seen[0]
        );
    }

    #[test]
    fn retries_retryable_statuses_until_success() {
        let server = ScriptedServer::start(vec![
            reply(500, "server-error"),
            reply(429, "throttled"),
            reply(200, "ok"),
        ]);

        let result = post_json_with_retries(
            &server.base_url,
            &json!({}),
            policy(Duration::from_millis(500), 3),
        );

        assert_eq!(result.expect("should eventually succeed"), "ok");
        assert_eq!(server.seen().len(), 3);
    }

    #[test]
    fn does_not_retry_hard_client_errors() {
        let server = ScriptedServer::start(vec![reply(404, "not-found"), reply(200, "ok")]);

        let result = post_json_with_retries(
            &server.base_url,
            &json!({}),
            policy(Duration::from_millis(500), 5),
        );

        let err = result.expect_err("404 should not be retried");
        assert!(
            err.contains("HTTP status 404 (not-found)"),
            "unexpected error message: {err}"
        );
        assert_eq!(server.seen().len(), 1);
    }

    #[test]
    fn retries_read_timeout_and_recovers() {
        let server = ScriptedServer::start(vec![
            Reply {
                status: 200,
                body: "slow",
                delay: Duration::from_millis(300),
            },
            reply(200, "ok"),
        ]);

        let result = post_json_with_retries(
            &server.base_url,
            &json!({}),
            policy(Duration::from_millis(50), 2),
        );

        assert_eq!(result.expect("timeout should be retried"), "ok");
    }

    #[test]
    fn reports_exhausted_retries_with_last_status() {
        let server = ScriptedServer::start(vec![reply(503, "down"), reply(503, "still-down")]);

        let result = post_json_with_retries(
            &server.base_url,
            &json!({}),
            policy(Duration::from_millis(500), 2),
        );

        let err = result.expect_err("retryable failures should eventually error");
        assert!(
            err.contains("after 2 attempt(s)") && err.contains("HTTP status 503 (still-down)"),
            "unexpected error message: {err}"
        );
        assert_eq!(server.seen().len(), 2);
    }

    #[test]
    fn unreachable_service_fails_after_all_attempts() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));
        drop(listener);

        let err = post_json_with_retries(&url, &json!({}), policy(Duration::from_millis(100), 2))
            .expect_err("closed port should fail");
        assert!(
            err.contains("after 2 attempt(s)") && err.contains("transport error"),
            "unexpected error message: {err}"
        );
    }
}
