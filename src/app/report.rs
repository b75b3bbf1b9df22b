use std::env;

use serde_json::json;

use crate::http::{RetryPolicy, post_json_with_retries};

pub(crate) const SERVICE_URL_ENV: &str = "WATCHTRACK_SERVICE_URL";

/// True once `threshold` is reached until a report has gone through.
pub(crate) fn should_report(current_percent: i64, threshold: i64, already_reported: bool) -> bool {
    !already_reported && current_percent >= threshold
}

pub(crate) fn resolve_service_url(flag: Option<&str>) -> Option<String> {
    resolve_service_url_from_env(flag, env::var(SERVICE_URL_ENV).ok())
}

pub(crate) fn resolve_service_url_from_env(
    flag: Option<&str>,
    env_value: Option<String>,
) -> Option<String> {
    flag.map(str::to_string)
        .or(env_value)
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
}

pub(crate) fn report_url(service_url: &str, project_id: &str, skill_id: &str) -> String {
    format!(
        "{}/api/projects/{}/skills/{}",
        service_url.trim_end_matches('/'),
        encode_path_segment(project_id),
        encode_path_segment(skill_id)
    )
}

fn encode_path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

pub(crate) fn send_self_report(
    service_url: &str,
    project_id: &str,
    skill_id: &str,
    percent_watched: i64,
) -> Result<(), String> {
    let url = report_url(service_url, project_id, skill_id);
    let body = json!({
        "approvalRequestedMsg": format!("Watched {percent_watched}% of the video"),
    });
    tracing::info!(%url, percent_watched, "reporting skill");
    post_json_with_retries(&url, &body, RetryPolicy::default()).map(|_| ())
}
