//! JSON bodies returned by the proxy, kept free of worker types so they can be
//! tested natively.

use serde_json::{Value, json};

pub const WEBHOOK_VAR: &str = "N8N_WEBHOOK_URL";
pub const FETCH_FAILED: &str = "Failed to fetch data from n8n";

/// Set on every response from the proxy route, preflight included
pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Content-Type", "application/json"),
];

pub const PREFLIGHT_STATUS: u16 = 200;

/// How the proxy route answers a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Empty body with the CORS set
    Preflight,
    /// Fetch the webhook and relay its JSON
    Proxy,
}

pub fn route_for(method: &str) -> Route {
    if method.eq_ignore_ascii_case("OPTIONS") {
        Route::Preflight
    } else {
        Route::Proxy
    }
}

/// Body for a request that arrives before the webhook URL is configured
pub fn config_missing() -> Value {
    json!({ "error": format!("{WEBHOOK_VAR} environment variable not configured") })
}

/// Body for any upstream, network or parse failure
pub fn fetch_failed(message: &str) -> Value {
    json!({
        "error": FETCH_FAILED,
        "message": message,
    })
}

pub fn upstream_status_message(status: u16) -> String {
    format!("n8n responded with status: {status}")
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Short description of what came back, for the log line
pub fn describe_records(data: &Value) -> String {
    match data.as_array() {
        Some(items) => items.len().to_string(),
        None => "not an array".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_names_the_variable() {
        let body = config_missing();
        assert_eq!(
            body["error"],
            "N8N_WEBHOOK_URL environment variable not configured"
        );
        assert!(body.get("message").is_none());
    }

    #[test]
    fn fetch_failed_carries_message() {
        let body = fetch_failed(&upstream_status_message(502));
        assert_eq!(body["error"], "Failed to fetch data from n8n");
        assert_eq!(body["message"], "n8n responded with status: 502");
    }

    #[test]
    fn success_range() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(199));
        assert!(!is_success(301));
        assert!(!is_success(500));
    }

    #[test]
    fn describe_array_and_object() {
        assert_eq!(describe_records(&json!([1, 2, 3])), "3");
        assert_eq!(describe_records(&json!({"records": []})), "not an array");
    }

    #[test]
    fn cors_set_allows_any_origin_and_json() {
        let header = |name: &str| {
            CORS_HEADERS
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        };
        assert_eq!(header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(header("Access-Control-Allow-Headers"), Some("Content-Type"));
        assert_eq!(
            header("Access-Control-Allow-Methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn only_options_is_a_preflight() {
        assert_eq!(route_for("OPTIONS"), Route::Preflight);
        assert_eq!(PREFLIGHT_STATUS, 200);
        for method in ["GET", "POST", "PUT", "DELETE", "HEAD"] {
            assert_eq!(route_for(method), Route::Proxy, "{method}");
        }
    }
}
