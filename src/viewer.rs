//! Viewer state: the fetched dataset, what is on screen, and the refresh flow.

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::conversation::{Conversation, find_conversation, group_conversations};
use crate::filter::TimeFilter;
use crate::loader::{DataSource, FetchError, load_data};
use crate::records::MessageRecord;
use crate::share::DeepLink;

pub const REFRESH_LABEL: &str = "🔄 Refresh";
pub const LOADING_LABEL: &str = "⏳ Loading...";

/// Records from one successful load, grouped once
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<MessageRecord>,
    conversations: Vec<Conversation>,
}

impl Dataset {
    pub fn new(records: Vec<MessageRecord>) -> Self {
        let conversations = group_conversations(&records);
        Self {
            records,
            conversations,
        }
    }

    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, chat_id: &str) -> Option<&Conversation> {
        find_conversation(&self.conversations, chat_id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `3 conversations • 12 total messages`
    pub fn summary(&self) -> String {
        format!(
            "{} conversations • {} total messages",
            self.conversations.len(),
            self.records.len()
        )
    }
}

/// What the user is looking at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: TimeFilter,
    pub active_chat: Option<String>,
    /// Message to scroll to and highlight once the thread is shown
    pub focus_message: Option<String>,
}

impl ViewState {
    pub fn from_link(link: &DeepLink, filter: TimeFilter) -> Self {
        Self {
            filter,
            active_chat: link.chat.clone(),
            focus_message: link.msg.clone(),
        }
    }
}

/// A transient message for the user; shown as a toast in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("a refresh is already in progress")]
    Busy,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// The button that triggers a refresh. Disabled while a refresh runs.
#[derive(Debug, Clone)]
pub struct RefreshControl {
    disabled: bool,
    label: String,
}

impl Default for RefreshControl {
    fn default() -> Self {
        Self {
            disabled: false,
            label: REFRESH_LABEL.to_string(),
        }
    }
}

impl RefreshControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn begin(&mut self) -> Result<BusyGuard<'_>, RefreshError> {
        if self.disabled {
            return Err(RefreshError::Busy);
        }
        self.disabled = true;
        self.label = LOADING_LABEL.to_string();
        Ok(BusyGuard { control: self })
    }
}

/// Re-enables the control however the refresh ends
struct BusyGuard<'a> {
    control: &'a mut RefreshControl,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.control.disabled = false;
        self.control.label = REFRESH_LABEL.to_string();
    }
}

pub struct Viewer<S: DataSource> {
    source: S,
    dataset: Dataset,
    state: ViewState,
    status: String,
    notices: Vec<Notice>,
}

impl<S: DataSource> Viewer<S> {
    pub fn new(source: S, state: ViewState) -> Self {
        Self {
            source,
            dataset: Dataset::default(),
            state,
            status: String::new(),
            notices: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Status line shown above the conversation list
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Fetch a fresh dataset. Errors are reported through the status line
    /// and a notice; the previous dataset stays in place.
    pub fn load(&mut self) -> Result<usize, FetchError> {
        self.status = "Fetching data...".to_string();

        let records = match load_data(&self.source) {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "load failed");
                self.notices
                    .push(Notice::error(format!("Error loading data: {err}")));
                self.status = format!("Error: {err}");
                return Err(err);
            }
        };

        let count = records.len();
        self.dataset = Dataset::new(records);
        if self.dataset.is_empty() {
            self.status = "No conversations found".to_string();
            self.notices
                .push(Notice::error("No data received from server"));
            return Ok(0);
        }

        self.status = self.dataset.summary();
        info!(records = count, "loaded records");

        if let Some(chat_id) = self.state.active_chat.clone() {
            if self.dataset.conversation(&chat_id).is_none() {
                warn!(%chat_id, "shared conversation not found");
            }
        }
        Ok(count)
    }

    /// Reload on behalf of `control`, which is disabled for the duration and
    /// rejected if it is already busy.
    pub fn refresh(&mut self, control: &mut RefreshControl) -> Result<usize, RefreshError> {
        let _busy = control.begin()?;
        match self.load() {
            Ok(count) => {
                self.notices
                    .push(Notice::info("Data refreshed successfully! ✓"));
                Ok(count)
            }
            Err(err) => {
                self.notices.push(Notice::error("Failed to refresh data"));
                Err(err.into())
            }
        }
    }

    /// Open a conversation; unknown ids leave the current one open
    pub fn open_chat(&mut self, chat_id: &str) -> Option<&Conversation> {
        if self.dataset.conversation(chat_id).is_none() {
            return None;
        }
        if self.state.active_chat.as_deref() != Some(chat_id) {
            self.state.focus_message = None;
        }
        self.state.active_chat = Some(chat_id.to_string());
        self.dataset.conversation(chat_id)
    }

    /// Switch the time filter. The open thread is re-derived from the held
    /// dataset; nothing is fetched.
    pub fn set_filter(&mut self, filter: TimeFilter) {
        self.state.filter = filter;
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.state
            .active_chat
            .as_deref()
            .and_then(|id| self.dataset.conversation(id))
    }

    /// Messages of the open thread under the current filter, oldest first
    pub fn thread(&self, now: OffsetDateTime) -> Option<Vec<&MessageRecord>> {
        self.active_conversation()
            .map(|conv| conv.thread(self.state.filter, now))
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
