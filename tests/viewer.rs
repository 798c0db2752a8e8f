//! Load → group → render pipeline against a stubbed gateway.

use std::cell::Cell;

use rumie_reader::{
    DataSource,
    DeepLink,
    FetchError,
    PageOptions,
    RawResponse,
    RefreshControl,
    TimeFilter,
    ViewState,
    Viewer,
    render_page,
    share,
};
use time::macros::datetime;

struct Stub {
    status: u16,
    body: String,
    calls: Cell<usize>,
}

impl Stub {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            calls: Cell::new(0),
        }
    }
}

impl DataSource for Stub {
    fn fetch(&self) -> Result<RawResponse, FetchError> {
        self.calls.set(self.calls.get() + 1);
        Ok(RawResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

const PAGE: &str = "https://reader.example.com/";

#[test]
fn records_wrapper_renders_one_conversation() {
    let body = r#"{"records":[{"CHAT ID":"1","F Name":"A","USER MESSAGE":"hi","CREATED DATE":"2024-01-09T10:00:00Z","R-ID":"r1"}]}"#;
    let link = DeepLink::conversation("1");
    let mut viewer = Viewer::new(Stub::new(200, body), ViewState::from_link(&link, TimeFilter::All));

    assert_eq!(viewer.load().unwrap(), 1);
    assert_eq!(viewer.dataset().conversations().len(), 1);
    assert_eq!(viewer.status(), "1 conversations • 1 total messages");

    let conv = viewer.active_conversation().unwrap();
    assert_eq!(conv.sender_name(), "A");
    assert_eq!(conv.preview(), "hi");

    let page = render_page(
        viewer.dataset(),
        viewer.state(),
        &PageOptions {
            page_url: PAGE,
            status: viewer.status(),
            notices: viewer.notices(),
            now: datetime!(2024-01-10 00:00 UTC),
        },
    )
    .unwrap()
    .into_string();

    assert!(page.contains(r#"class="conv active" data-chat="1""#));
    assert!(page.contains(r#"id="msg-r1""#));
    assert!(page.contains(">hi<"));
    assert!(!page.contains("Select a conversation"));
}

#[test]
fn server_error_keeps_dataset_empty() {
    let mut viewer = Viewer::new(Stub::new(500, "boom"), ViewState::default());

    let err = viewer.load().unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            status: 500,
            body: "boom".to_string()
        }
    );
    assert!(viewer.dataset().is_empty());
    assert_eq!(viewer.status(), "Error: HTTP 500: boom");

    let notices = viewer.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].is_error);
    assert_eq!(notices[0].message, "Error loading data: HTTP 500: boom");
}

#[test]
fn refresh_reports_and_releases_control() {
    let body = r#"[{"CHAT ID":7,"F Name":"Kim","USER MESSAGE":"hello"}]"#;
    let mut viewer = Viewer::new(Stub::new(200, body), ViewState::default());
    let mut control = RefreshControl::new();

    assert_eq!(viewer.refresh(&mut control).unwrap(), 1);
    assert!(!control.is_disabled());
    assert!(viewer.dataset().conversation("7").is_some());

    let notices = viewer.take_notices();
    assert_eq!(notices.last().unwrap().message, "Data refreshed successfully! ✓");
}

#[test]
fn shared_message_link_round_trip() {
    let url = share::message_url(PAGE, "42", "r1").unwrap();
    assert_eq!(url, "https://reader.example.com/?chat=42&msg=r1");

    let link = DeepLink::from_url(&url).unwrap();
    let state = ViewState::from_link(&link, TimeFilter::Recent);
    assert_eq!(state.active_chat.as_deref(), Some("42"));
    assert_eq!(state.focus_message.as_deref(), Some("r1"));
}

#[test]
fn shared_message_is_focused_in_page() {
    let body = r#"[
        {"CHAT ID":"42","F Name":"Lee","USER MESSAGE":"first","CREATED DATE":"2024-01-08","R-ID":"r0"},
        {"CHAT ID":"42","F Name":"Lee","USER MESSAGE":"second","CREATED DATE":"2024-01-09","R-ID":"r1"}
    ]"#;
    let link = DeepLink::from_query("chat=42&msg=r1");
    let mut viewer = Viewer::new(Stub::new(200, body), ViewState::from_link(&link, TimeFilter::Recent));
    viewer.load().unwrap();

    let page = render_page(
        viewer.dataset(),
        viewer.state(),
        &PageOptions {
            page_url: PAGE,
            status: viewer.status(),
            notices: viewer.notices(),
            now: datetime!(2024-01-10 00:00 UTC),
        },
    )
    .unwrap()
    .into_string();

    assert!(page.contains(r#"class="msg-group focus" id="msg-r1""#));
    assert!(page.contains(r#"class="msg-group" id="msg-r0""#));
}
