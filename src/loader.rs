//! Fetching records from the gateway.

use serde_json::Value;
use tracing::debug;

use crate::records::{MessageRecord, parse_response_data};

pub const PROXY_PATH: &str = "/api/proxy";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
    #[error("invalid JSON: {0}")]
    Parse(String),
}

/// Status and body of one gateway call, before any interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Where records come from. The gateway in production, a stub in tests.
pub trait DataSource {
    fn fetch(&self) -> Result<RawResponse, FetchError>;
}

/// Proxy endpoint for a gateway base URL
pub fn gateway_endpoint(gateway_url: &str) -> String {
    format!("{}{PROXY_PATH}", gateway_url.trim_end_matches('/'))
}

/// Blocking client for `GET /api/proxy`
#[derive(Debug, Clone)]
pub struct GatewaySource {
    endpoint: String,
}

impl GatewaySource {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            endpoint: gateway_endpoint(gateway_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DataSource for GatewaySource {
    fn fetch(&self) -> Result<RawResponse, FetchError> {
        debug!(endpoint = %self.endpoint, "fetching records");
        let result = ureq::get(&self.endpoint)
            .set("Accept", "application/json")
            .call();

        // ureq reports 4xx/5xx as errors; keep their bodies for the caller.
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = read_body(response).unwrap_or_default();
                return Ok(RawResponse { status, body });
            }
            Err(ureq::Error::Transport(err)) => return Err(FetchError::Transport(err.to_string())),
        };

        let status = response.status();
        let body = read_body(response).map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "gateway responded");
        Ok(RawResponse { status, body })
    }
}

/// Whole body as text. `into_string` stops at 10 MB; the gateway relays
/// payloads of any size.
fn read_body(response: ureq::Response) -> std::io::Result<String> {
    std::io::read_to_string(response.into_reader())
}

/// Fetch, check the status, parse and normalize
pub fn load_data(source: &dyn DataSource) -> Result<Vec<MessageRecord>, FetchError> {
    let response = source.fetch()?;
    if !(200..300).contains(&response.status) {
        return Err(FetchError::Status {
            status: response.status,
            body: response.body,
        });
    }

    let json: Value =
        serde_json::from_str(&response.body).map_err(|e| FetchError::Parse(e.to_string()))?;
    match json.as_array() {
        Some(items) => debug!(records = items.len(), "received array payload"),
        None => debug!("received wrapped payload"),
    }

    let records = parse_response_data(json);
    debug!(count = records.len(), "processed records");
    Ok(records)
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Replays canned responses and counts calls
    #[derive(Default)]
    pub struct StubSource {
        responses: RefCell<VecDeque<Result<RawResponse, FetchError>>>,
        calls: Cell<usize>,
    }

    impl StubSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(self, body: &str) -> Self {
            self.respond(200, body)
        }

        pub fn respond(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(Ok(RawResponse {
                status,
                body: body.to_string(),
            }));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Err(FetchError::Transport(message.to_string())));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl DataSource for StubSource {
        fn fetch(&self) -> Result<RawResponse, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("no canned response".to_string())))
        }
    }
}
